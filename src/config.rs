/*
 * src/config.rs
 *
 * File for process configuration
 *
 * Purpose:
 *   One struct holding every tunable, read from the environment at startup
 *   and passed down explicitly. Nothing below this file touches env vars.
 */

use std::env;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
	env::var(key)
		.ok()
		.and_then(|v| v.parse().ok())
		.unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
	/// Model tag sent to the vendor and recorded in the journal.
	pub model: String,
	pub api_key: Option<String>,
	pub default_temperature: f32,
	pub max_output_tokens: u32,
	/// When false the canned offline backend is wired instead of the vendor
	/// client, mirroring the `DEPLOY_LLM` switch.
	pub deploy: bool,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
	pub url: String,
	pub max_connections: u32,
	pub min_connections: u32,
	pub idle_timeout: Duration,
	pub max_lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Secret for the private `auth-token` cookie key. Explicit so that no
	/// signing state lives in a process-wide static.
	pub cookie_secret: String,
	pub token_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
	pub ttl: Duration,
	pub sweep_interval: Duration,
}

/// Per-stage deadlines for the fan-out pipeline (spec'd headroom under the
/// overall request deadline).
#[derive(Debug, Clone)]
pub struct DeadlineConfig {
	pub city_stage: Duration,
	pub general_poi_stage: Duration,
	pub itinerary_stage: Duration,
	pub overall: Duration,
	pub embedding: Duration,
	pub persistence_worker: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
	pub bind_address: String,
	pub frontend_url: Option<String>,
	pub llm: LlmConfig,
	pub db: DbConfig,
	pub auth: AuthConfig,
	pub cache: CacheConfig,
	pub deadlines: DeadlineConfig,
	/// Ceiling on concurrently running persistence worker tasks across all
	/// requests, so a burst of cache misses cannot drain the pool.
	pub worker_concurrency: usize,
}

impl AppConfig {
	/// Reads the full configuration from the environment. `DATABASE_URL`,
	/// `BIND_ADDRESS` and `AUTH_COOKIE_SECRET` are required; everything else
	/// has a sensible default.
	pub fn from_env() -> Self {
		Self {
			bind_address: env::var("BIND_ADDRESS").expect("BIND_ADDRESS must be set"),
			frontend_url: env::var("FRONTEND_URL").ok(),
			llm: LlmConfig {
				model: env::var("LLM_MODEL").unwrap_or_else(|_| String::from("gpt-4o-mini")),
				api_key: env::var("OPENAI_API_KEY").ok(),
				default_temperature: env_or("LLM_TEMPERATURE", 0.7),
				max_output_tokens: env_or("LLM_MAX_OUTPUT_TOKENS", 2048),
				deploy: env::var("DEPLOY_LLM").map(|s| s == "1").unwrap_or(false),
			},
			db: DbConfig {
				url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
				max_connections: env_or("DB_MAX_CONNECTIONS", 10),
				min_connections: env_or("DB_MIN_CONNECTIONS", 1),
				idle_timeout: Duration::from_secs(env_or("DB_IDLE_TIMEOUT_SECONDS", 300)),
				max_lifetime: Duration::from_secs(env_or("DB_MAX_LIFETIME_SECONDS", 1800)),
			},
			auth: AuthConfig {
				cookie_secret: env::var("AUTH_COOKIE_SECRET")
					.expect("AUTH_COOKIE_SECRET must be set"),
				token_ttl: Duration::from_secs(env_or("AUTH_TOKEN_TTL_SECONDS", 259_200)),
			},
			cache: CacheConfig {
				ttl: Duration::from_secs(env_or("CACHE_TTL_SECONDS", 300)),
				sweep_interval: Duration::from_secs(env_or("CACHE_SWEEP_SECONDS", 600)),
			},
			deadlines: DeadlineConfig {
				city_stage: Duration::from_secs(env_or("DEADLINE_CITY_SECONDS", 10)),
				general_poi_stage: Duration::from_secs(env_or("DEADLINE_POI_SECONDS", 10)),
				itinerary_stage: Duration::from_secs(env_or("DEADLINE_ITINERARY_SECONDS", 20)),
				overall: Duration::from_secs(env_or("DEADLINE_OVERALL_SECONDS", 30)),
				embedding: Duration::from_secs(env_or("DEADLINE_EMBEDDING_SECONDS", 5)),
				persistence_worker: Duration::from_secs(env_or("DEADLINE_WORKER_SECONDS", 300)),
			},
			worker_concurrency: env_or("WORKER_CONCURRENCY", 4),
		}
	}

	/// Offline configuration for tests: canned LLM backend, short deadlines,
	/// throwaway secrets. No environment reads.
	pub fn for_tests() -> Self {
		Self {
			bind_address: String::from("127.0.0.1:0"),
			frontend_url: None,
			llm: LlmConfig {
				model: String::from("test-model"),
				api_key: None,
				default_temperature: 0.0,
				max_output_tokens: 256,
				deploy: false,
			},
			db: DbConfig {
				url: String::from("postgres://localhost/wayfarer_test"),
				max_connections: 2,
				min_connections: 0,
				idle_timeout: Duration::from_secs(30),
				max_lifetime: Duration::from_secs(60),
			},
			auth: AuthConfig {
				cookie_secret: String::from(
					"test-secret-test-secret-test-secret-test-secret-test-secret-1234",
				),
				token_ttl: Duration::from_secs(60),
			},
			cache: CacheConfig {
				ttl: Duration::from_millis(200),
				sweep_interval: Duration::from_millis(100),
			},
			deadlines: DeadlineConfig {
				city_stage: Duration::from_secs(2),
				general_poi_stage: Duration::from_secs(2),
				itinerary_stage: Duration::from_secs(2),
				overall: Duration::from_secs(5),
				embedding: Duration::from_secs(1),
				persistence_worker: Duration::from_secs(5),
			},
			worker_concurrency: 2,
		}
	}
}
