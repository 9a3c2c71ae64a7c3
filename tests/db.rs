use {tracing::info, wayfarer::config::AppConfig, wayfarer::db};

/// Verifies that `AppConfig::from_env` panics when `DATABASE_URL` is not set.
#[test]
#[serial_test::serial]
fn test_config_panics_without_database_url() {
	// Save and clear the required vars
	let prev_db = std::env::var("DATABASE_URL").ok();
	unsafe {
		std::env::remove_var("DATABASE_URL");
		std::env::set_var("BIND_ADDRESS", "127.0.0.1:0");
		std::env::set_var("AUTH_COOKIE_SECRET", "x".repeat(64));
	}

	let result = std::panic::catch_unwind(AppConfig::from_env);

	// Restore DATABASE_URL
	match prev_db {
		Some(val) => unsafe { std::env::set_var("DATABASE_URL", val) },
		None => unsafe { std::env::remove_var("DATABASE_URL") },
	}

	assert!(result.is_err());
}

/// Optional integration test requiring a real database in `DATABASE_URL`.
/// Run with: `cargo test -- --ignored`
#[tokio::test]
#[ignore]
async fn test_db_pool_connects_and_selects() {
	if std::env::var("DATABASE_URL").is_err() {
		// Not set in most environments; mark as success skip
		info!("DATABASE_URL not set; skipping real DB test");
		return;
	}

	let mut config = AppConfig::for_tests();
	config.db.url = std::env::var("DATABASE_URL").unwrap();
	let pool = db::create_pool(&config.db).await;

	// Simple liveness query
	let row: (i32,) = sqlx::query_as("SELECT 1")
		.fetch_one(&pool)
		.await
		.expect("SELECT 1 should succeed");
	assert_eq!(row.0, 1);
}
