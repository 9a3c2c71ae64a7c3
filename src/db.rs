use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::config::DbConfig;

/// Builds the shared Postgres pool with the configured caps. Every query in
/// the codebase borrows a connection from here and must return it; long-lived
/// work (the persistence worker) runs under its own deadline so it cannot pin
/// connections past the worker ceiling.
pub async fn create_pool(config: &DbConfig) -> PgPool {
	let pool = PgPoolOptions::new()
		.max_connections(config.max_connections)
		.min_connections(config.min_connections)
		.idle_timeout(config.idle_timeout)
		.max_lifetime(config.max_lifetime)
		.connect(&config.url)
		.await
		.expect("Could not connect to database");

	info!(
		max_connections = config.max_connections,
		"database pool ready"
	);

	pool
}
