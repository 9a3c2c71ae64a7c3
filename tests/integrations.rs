/*
 * tests/integrations.rs
 *
 * Integration tests for the orchestration core
 *
 * Purpose:
 *   Exercises the full pipeline against a real Postgres (with PostGIS and
 *   pgvector) using the offline model backend. Every test here is `#[ignore]`d
 *   and needs `DATABASE_URL`; run with: `cargo test -- --ignored`
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use wayfarer::cache::TtlCache;
use wayfarer::config::AppConfig;
use wayfarer::geo::Coordinates;
use wayfarer::llm::gateway::{BackendReply, CannedBackend, DeltaStream};
use wayfarer::llm::prompts::PromptKind;
use wayfarer::llm::{LlmBackend, LlmError, LlmGateway, RenderedPrompt};
use wayfarer::models::poi::{Poi, PoiFilters};
use wayfarer::orchestrator::{
	Orchestrator, PersistenceWorker, RecommendationRequest, StreamSession,
};
use wayfarer::store::poi::{self as poi_store, PoiTable};

const BARCELONA: Coordinates = Coordinates {
	latitude: 41.3851,
	longitude: 2.1734,
};

/// A canned backend that fails exactly one stage, for the degradation tests.
struct FailingStage {
	inner: CannedBackend,
	failing: PromptKind,
}

#[async_trait]
impl LlmBackend for FailingStage {
	async fn generate(&self, prompt: &RenderedPrompt) -> Result<BackendReply, LlmError> {
		if prompt.kind == self.failing {
			return Err(LlmError::Unavailable(String::from("injected failure")));
		}
		self.inner.generate(prompt).await
	}

	async fn stream(&self, prompt: &RenderedPrompt) -> Result<DeltaStream, LlmError> {
		if prompt.kind == self.failing {
			return Err(LlmError::Unavailable(String::from("injected failure")));
		}
		self.inner.stream(prompt).await
	}

	async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
		self.inner.embed(text).await
	}

	fn model_tag(&self) -> &str {
		"canned-failing"
	}
}

struct TestEnv {
	pool: PgPool,
	orchestrator: Arc<Orchestrator>,
	account_id: i32,
	profile_id: i32,
}

async fn env_with_backend(backend: Arc<dyn LlmBackend>) -> Option<TestEnv> {
	if std::env::var("DATABASE_URL").is_err() {
		eprintln!("DATABASE_URL not set; skipping integration test");
		return None;
	}
	let mut config = AppConfig::for_tests();
	config.db.url = std::env::var("DATABASE_URL").unwrap();
	let pool = wayfarer::db::create_pool(&config.db).await;
	match sqlx::migrate!("./migrations").run(&pool).await {
		Ok(_) => (),
		Err(sqlx::migrate::MigrateError::VersionMismatch(_)) => {
			eprintln!("migrations version mismatch; assuming DB already prepared. Skipping.");
		}
		Err(e) => panic!("migrations run: {e}"),
	}

	// Seed a unique account and default profile per run.
	let unique = Utc::now().timestamp_nanos_opt().unwrap();
	let (account_id,): (i32,) =
		sqlx::query_as("INSERT INTO accounts (email) VALUES ($1) RETURNING id")
			.bind(format!("roc+{unique}@example.com"))
			.fetch_one(&pool)
			.await
			.unwrap();
	let (profile_id,): (i32,) = sqlx::query_as(
		"INSERT INTO preference_profiles
		   (account_id, profile_name, is_default, search_radius_meters, preferred_time, pace, budget)
		 VALUES ($1, 'default', TRUE, 5000, 'evening', 'relaxed', 'moderate')
		 RETURNING id",
	)
	.bind(account_id)
	.fetch_one(&pool)
	.await
	.unwrap();
	for (i, interest) in ["architecture", "food"].iter().enumerate() {
		sqlx::query("INSERT INTO profile_interests (profile_id, name, position) VALUES ($1, $2, $3)")
			.bind(profile_id)
			.bind(interest)
			.bind(i as i32)
			.execute(&pool)
			.await
			.unwrap();
	}

	let gateway = Arc::new(LlmGateway::new(backend, config.deadlines.embedding));
	let shutdown = CancellationToken::new();
	let worker = Arc::new(PersistenceWorker::new(
		pool.clone(),
		Arc::clone(&gateway),
		config.worker_concurrency,
		config.deadlines.persistence_worker,
		shutdown,
	));
	let orchestrator = Arc::new(Orchestrator::new(
		pool.clone(),
		gateway,
		worker,
		Arc::new(TtlCache::new(Duration::from_secs(60))),
		Arc::new(TtlCache::new(Duration::from_secs(60))),
		config.deadlines.clone(),
	));

	Some(TestEnv {
		pool,
		orchestrator,
		account_id,
		profile_id,
	})
}

async fn test_env() -> Option<TestEnv> {
	env_with_backend(Arc::new(CannedBackend::new())).await
}

/// Model round-trips only; the detached worker's summary rows land at their
/// own pace and would make the counts racy.
async fn journal_count(pool: &PgPool, account_id: i32) -> i64 {
	let (count,): (i64,) = sqlx::query_as(
		"SELECT COUNT(*) FROM llm_interactions
		 WHERE account_id = $1 AND kind <> 'worker_summary'",
	)
	.bind(account_id)
	.fetch_one(pool)
	.await
	.unwrap();
	count
}

/// A fresh city request creates the city, returns all three sections, and
/// sorts the itinerary by distance from the caller.
#[tokio::test]
#[ignore]
async fn bundle_for_unknown_city_creates_it_and_sorts() {
	let Some(env) = test_env().await else { return };
	let unique = Utc::now().timestamp_nanos_opt().unwrap();
	let city_name = format!("Barcelona-{unique}");

	let request = RecommendationRequest {
		account_id: env.account_id,
		profile_id: env.profile_id,
		city_name: city_name.clone(),
		user_location: Some(BARCELONA),
	};
	let cancel = CancellationToken::new();
	let response = env
		.orchestrator
		.recommend(&request, None, &cancel)
		.await
		.unwrap();

	let facts = response.general_city_data.as_ref().unwrap();
	assert_eq!(facts.city, city_name);
	assert!(response.points_of_interest.len() <= 5);
	assert!(!response.itinerary_response.points_of_interest.is_empty());

	// Ascending distance from the user position.
	let distances: Vec<f64> = response
		.itinerary_response
		.points_of_interest
		.iter()
		.filter_map(|p| p.distance_meters)
		.collect();
	assert!(distances.windows(2).all(|w| w[0] <= w[1]));

	// The city row exists now.
	let (count,): (i64,) =
		sqlx::query_as("SELECT COUNT(*) FROM cities WHERE normalized_name = $1")
			.bind(city_name.to_lowercase())
			.fetch_one(&env.pool)
			.await
			.unwrap();
	assert_eq!(count, 1);

	// One journal row per stage.
	assert_eq!(journal_count(&env.pool, env.account_id).await, 3);

	// Bundle is bookmarkable.
	assert!(response.interaction_ids.itinerary.is_some());
}

/// Within TTL the identical request is served from cache: identical bytes,
/// no new model calls.
#[tokio::test]
#[ignore]
async fn repeat_request_hits_cache_with_identical_bytes() {
	let Some(env) = test_env().await else { return };
	let unique = Utc::now().timestamp_nanos_opt().unwrap();
	let request = RecommendationRequest {
		account_id: env.account_id,
		profile_id: env.profile_id,
		city_name: format!("Cachetown-{unique}"),
		user_location: Some(BARCELONA),
	};
	let cancel = CancellationToken::new();

	let first = env
		.orchestrator
		.recommend(&request, None, &cancel)
		.await
		.unwrap();
	let journal_after_first = journal_count(&env.pool, env.account_id).await;

	let second = env
		.orchestrator
		.recommend(&request, None, &cancel)
		.await
		.unwrap();
	assert_eq!(
		serde_json::to_vec(&first).unwrap(),
		serde_json::to_vec(&second).unwrap()
	);
	assert_eq!(
		journal_count(&env.pool, env.account_id).await,
		journal_after_first
	);
}

/// Upsert is idempotent per (city, name) and never erases persisted fields.
#[tokio::test]
#[ignore]
async fn upsert_twice_keeps_one_row_and_full_fields() {
	let Some(env) = test_env().await else { return };
	let unique = Utc::now().timestamp_nanos_opt().unwrap();
	let name = format!("Idempotent Museum {unique}");

	let mut rich = Poi {
		id: 0,
		city_id: None,
		name: name.clone(),
		description: Some(String::from("A fine museum")),
		category: Some(String::from("Museum")),
		coordinates: Some(BARCELONA),
		address: Some(String::from("1 Museum Way")),
		phone: None,
		website: None,
		opening_hours: None,
		price_range: None,
		rating: Some(4.2),
		tags: vec![String::from("art")],
		images: vec![],
		source_interaction_id: None,
		created_at: None,
		updated_at: None,
	};
	let saved = poi_store::upsert(&env.pool, PoiTable::PointsOfInterest, &rich)
		.await
		.unwrap();
	assert!(saved.id > 0);

	// Second upsert with empty optional fields.
	rich.description = None;
	rich.address = None;
	rich.tags = vec![];
	let again = poi_store::upsert(&env.pool, PoiTable::PointsOfInterest, &rich)
		.await
		.unwrap();

	assert_eq!(saved.id, again.id);
	assert_eq!(again.description.as_deref(), Some("A fine museum"));
	assert_eq!(again.address.as_deref(), Some("1 Museum Way"));
	assert_eq!(again.tags, vec![String::from("art")]);
}

/// Stored POIs in radius answer without any model call, ascending.
#[tokio::test]
#[ignore]
async fn by_distance_serves_from_store_without_model() {
	let Some(env) = test_env().await else { return };
	let unique = Utc::now().timestamp_nanos_opt().unwrap();
	// A synthetic neighborhood far from other test data.
	let center = Coordinates {
		latitude: -44.5,
		longitude: 168.3,
	};

	for (i, meters_north) in [300.0, 600.0, 900.0].iter().enumerate() {
		let poi = Poi {
			id: 0,
			city_id: None,
			name: format!("Stored Museum {unique}-{i}"),
			description: None,
			category: Some(String::from("Museum")),
			coordinates: Some(Coordinates {
				latitude: center.latitude + meters_north / 111_320.0,
				longitude: center.longitude,
			}),
			address: None,
			phone: None,
			website: None,
			opening_hours: None,
			price_range: None,
			rating: Some(4.0),
			tags: vec![],
			images: vec![],
			source_interaction_id: None,
			created_at: None,
			updated_at: None,
		};
		poi_store::upsert(&env.pool, PoiTable::PointsOfInterest, &poi)
			.await
			.unwrap();
	}

	let journal_before = journal_count(&env.pool, env.account_id).await;
	let filters = PoiFilters::from_parts(Some("Museum"), None, None);
	let response = env
		.orchestrator
		.pois_by_distance(env.account_id, center, 1_000.0, filters)
		.await
		.unwrap();

	assert_eq!(response.points_of_interest.len(), 3);
	let distances: Vec<f64> = response
		.points_of_interest
		.iter()
		.map(|p| p.distance_meters.unwrap())
		.collect();
	assert!(distances.windows(2).all(|w| w[0] <= w[1]));
	assert!(distances.iter().all(|d| *d <= 1_000.0));
	// No model involvement.
	assert_eq!(journal_count(&env.pool, env.account_id).await, journal_before);
}

/// An empty store triggers model fallback; finds stay within radius and the
/// background worker persists them as city-less rows.
#[tokio::test]
#[ignore]
async fn by_distance_falls_back_to_model_and_persists() {
	let Some(env) = test_env().await else { return };
	// Mid-ocean: nothing stored, no city to reverse-resolve.
	let center = Coordinates {
		latitude: 0.0,
		longitude: -30.0,
	};

	let response = env
		.orchestrator
		.pois_by_distance(env.account_id, center, 1_000.0, PoiFilters::default())
		.await
		.unwrap();
	assert!(!response.points_of_interest.is_empty());
	for poi in &response.points_of_interest {
		assert!(poi.distance_meters.unwrap() <= 1_000.0);
	}

	// The worker runs detached; poll for its upserts.
	let mut persisted = 0i64;
	for _ in 0..20 {
		tokio::time::sleep(Duration::from_millis(100)).await;
		let (count,): (i64,) = sqlx::query_as(
			"SELECT COUNT(*) FROM points_of_interest
			 WHERE city_id IS NULL
			   AND ST_DWithin(geom::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, 1000)",
		)
		.bind(center.longitude)
		.bind(center.latitude)
		.fetch_one(&env.pool)
		.await
		.unwrap();
		persisted = count;
		if persisted >= response.points_of_interest.len() as i64 {
			break;
		}
	}
	assert!(persisted >= response.points_of_interest.len() as i64);
}

/// Degradation: a failed city stage omits that section with status success;
/// a failed itinerary stage fails the whole request.
#[tokio::test]
#[ignore]
async fn degradation_rules() {
	let Some(env) = env_with_backend(Arc::new(FailingStage {
		inner: CannedBackend::new(),
		failing: PromptKind::GeneralCity,
	}))
	.await
	else {
		return;
	};
	let unique = Utc::now().timestamp_nanos_opt().unwrap();
	let cancel = CancellationToken::new();

	let request = RecommendationRequest {
		account_id: env.account_id,
		profile_id: env.profile_id,
		city_name: format!("Degraded-{unique}"),
		user_location: Some(BARCELONA),
	};
	let response = env
		.orchestrator
		.recommend(&request, None, &cancel)
		.await
		.unwrap();
	assert!(response.general_city_data.is_none());
	assert!(!response.itinerary_response.points_of_interest.is_empty());

	let Some(env) = env_with_backend(Arc::new(FailingStage {
		inner: CannedBackend::new(),
		failing: PromptKind::PersonalizedItinerary,
	}))
	.await
	else {
		return;
	};
	let request = RecommendationRequest {
		account_id: env.account_id,
		profile_id: env.profile_id,
		city_name: format!("Degraded2-{unique}"),
		user_location: Some(BARCELONA),
	};
	let err = env
		.orchestrator
		.recommend(&request, None, &cancel)
		.await
		.unwrap_err();
	assert!(err.status().is_server_error());
	// G1/G2 were still journaled.
	assert!(journal_count(&env.pool, env.account_id).await >= 2);
}

/// Streaming: start first, stage events in arrival order, one complete.
#[tokio::test]
#[ignore]
async fn streaming_bundle_event_order() {
	let Some(env) = test_env().await else { return };
	let unique = Utc::now().timestamp_nanos_opt().unwrap();

	let cancel = CancellationToken::new();
	let (mut session, publisher) = StreamSession::open(cancel.clone());
	let orchestrator = Arc::clone(&env.orchestrator);
	let request = RecommendationRequest {
		account_id: env.account_id,
		profile_id: env.profile_id,
		city_name: format!("Paris-{unique}"),
		user_location: None,
	};
	tokio::spawn(async move {
		let _ = orchestrator.recommend(&request, Some(&publisher), &cancel).await;
	});

	let mut kinds = Vec::new();
	while let Some(envelope) = session.events.recv().await {
		kinds.push(envelope.event.kind().to_string());
	}

	assert_eq!(kinds.first().map(String::as_str), Some("start"));
	assert_eq!(kinds.last().map(String::as_str), Some("complete"));
	assert_eq!(kinds.iter().filter(|k| *k == "complete").count(), 1);
	assert!(kinds.iter().any(|k| k == "city_data"));
	assert!(kinds.iter().any(|k| k == "general_poi"));
	assert!(kinds.iter().any(|k| k == "itinerary_poi"));
}

/// Cancelling before any stage lands leaves no cache entry and no POIs.
#[tokio::test]
#[ignore]
async fn cancellation_skips_cache_and_worker() {
	let Some(env) = test_env().await else { return };
	let unique = Utc::now().timestamp_nanos_opt().unwrap();
	let request = RecommendationRequest {
		account_id: env.account_id,
		profile_id: env.profile_id,
		city_name: format!("Cancelled-{unique}"),
		user_location: Some(BARCELONA),
	};

	let cancel = CancellationToken::new();
	cancel.cancel();
	let err = env
		.orchestrator
		.recommend(&request, None, &cancel)
		.await
		.unwrap_err();
	assert!(err.status().is_server_error());

	// Re-running must do the full pipeline: nothing was cached.
	let journal_before = journal_count(&env.pool, env.account_id).await;
	let cancel = CancellationToken::new();
	env.orchestrator
		.recommend(&request, None, &cancel)
		.await
		.unwrap();
	assert!(journal_count(&env.pool, env.account_id).await > journal_before);
}
