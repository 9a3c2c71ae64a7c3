#![allow(unexpected_cfgs)]

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::Extension;
use http::{Method, header::HeaderValue};
use tokio_util::sync::CancellationToken;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;

use wayfarer::cache::{TtlCache, spawn_sweeper};
use wayfarer::config::AppConfig;
use wayfarer::controllers::{self, AxumRouter};
use wayfarer::llm::LlmGateway;
use wayfarer::middleware::cookie_key;
use wayfarer::orchestrator::{Orchestrator, PersistenceWorker};
use wayfarer::{db, log};

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
	// Load our environment variables
	dotenvy::dotenv().ok();
	log::init_panic_handler();
	log::init_logger();

	// All configuration is read once here and passed down explicitly.
	let config = AppConfig::from_env();

	// Initialize the database pool connection
	let pool = db::create_pool(&config.db).await;

	// Process-wide kill switch: stops the cache sweeper and lets in-flight
	// persistence workers wind down on shutdown.
	let shutdown = CancellationToken::new();

	let gateway = Arc::new(LlmGateway::from_config(
		&config.llm,
		config.deadlines.embedding,
	));
	let worker = Arc::new(PersistenceWorker::new(
		pool.clone(),
		Arc::clone(&gateway),
		config.worker_concurrency,
		config.deadlines.persistence_worker,
		shutdown.clone(),
	));
	let rec_cache = Arc::new(TtlCache::new(config.cache.ttl));
	let poi_cache = Arc::new(TtlCache::new(config.cache.ttl));
	spawn_sweeper(
		Arc::clone(&rec_cache),
		config.cache.sweep_interval,
		shutdown.clone(),
	);
	spawn_sweeper(
		Arc::clone(&poi_cache),
		config.cache.sweep_interval,
		shutdown.clone(),
	);
	let orchestrator = Arc::new(Orchestrator::new(
		pool.clone(),
		gateway,
		worker,
		rec_cache,
		poi_cache,
		config.deadlines.clone(),
	));

	/*
	/ Configure CORS
	/ Needed when the frontend runs on another origin. Credentials must be
	/ allowed for the auth cookie to travel.
	*/
	let cors = match &config.frontend_url {
		Some(frontend_url) => CorsLayer::new()
			.allow_origin(
				frontend_url
					.parse::<HeaderValue>()
					.expect("Invalid FRONTEND_URL format"),
			)
			.allow_credentials(true)
			.allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
			.allow_headers([
				http::header::CONTENT_TYPE,
				http::header::ACCEPT,
				http::header::AUTHORIZATION,
			]),
		None => CorsLayer::new(),
	};

	// Private-cookie key derived from explicit configuration.
	let key = cookie_key(&config.auth.cookie_secret);

	// API routes
	let api_routes = AxumRouter::new()
		.nest(
			"/recommendations",
			controllers::recommendation::recommendation_routes(),
		)
		.nest("/pois", controllers::poi::poi_routes())
		.nest("/hotels", controllers::poi::hotel_routes())
		.nest("/restaurants", controllers::poi::restaurant_routes())
		.nest("/itineraries", controllers::itinerary::itinerary_routes())
		.nest("/favorites", controllers::itinerary::favorite_routes());

	let api_routes = AxumRouter::new().nest("/api", api_routes);

	// In debug builds AxumRouter is the OpenApiRouter; merging swagger also
	// converts it back into a plain axum Router.
	#[cfg(debug_assertions)]
	let api_routes = wayfarer::swagger::merge_swagger(api_routes);

	// Build the main router
	let app = axum::Router::new()
		.merge(api_routes)
		.layer(Extension(pool.clone()))
		.layer(Extension(key.clone()))
		.layer(Extension(orchestrator))
		.layer(CookieManagerLayer::new())
		.layer(cors);

	let addr = SocketAddr::from_str(&config.bind_address).expect("Invalid BIND_ADDRESS format");
	println!("Server starting on {addr}");

	let listener = tokio::net::TcpListener::bind(addr).await?;
	axum::serve(listener, app.into_make_service())
		.with_graceful_shutdown({
			let shutdown = shutdown.clone();
			async move {
				_ = tokio::signal::ctrl_c().await;
				shutdown.cancel();
			}
		})
		.await?;

	Ok(())
}
