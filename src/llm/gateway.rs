/*
 * src/llm/gateway.rs
 *
 * File for the LLM backend trait and gateway
 *
 * Purpose:
 *   The rest of the service only sees LlmGateway. Behind it sits either the
 *   langchain OpenAI client (DEPLOY_LLM=1) or a canned backend that answers
 *   every template with schema-valid fixtures, so the whole pipeline runs
 *   offline in tests and dev.
 */

use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use langchain_rust::{
	embedding::{Embedder, openai::OpenAiEmbedder},
	language_models::{llm::LLM, options::CallOptions},
	llm::openai::{OpenAI, OpenAIConfig},
	schemas::Message,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::prompts::{PromptKind, RenderedPrompt};
use crate::llm::repair::parse_typed;
use crate::llm::LlmError;

pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// One raw vendor reply with whatever usage data came back.
#[derive(Debug, Clone)]
pub struct BackendReply {
	pub text: String,
	pub prompt_tokens: Option<i32>,
	pub completion_tokens: Option<i32>,
}

/// The three vendor capabilities the core consumes. No retries here.
#[async_trait]
pub trait LlmBackend: Send + Sync {
	async fn generate(&self, prompt: &RenderedPrompt) -> Result<BackendReply, LlmError>;
	/// Ordered, finite, not restartable.
	async fn stream(&self, prompt: &RenderedPrompt) -> Result<DeltaStream, LlmError>;
	async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
	fn model_tag(&self) -> &str;
}

/// A successful, parsed round-trip plus the audit data the journal wants.
#[derive(Debug)]
pub struct RoundTrip<T> {
	pub value: T,
	pub raw: String,
	pub latency_ms: i64,
	pub prompt_tokens: Option<i32>,
	pub completion_tokens: Option<i32>,
}

/// A failed round-trip. Raw text is kept when any came back, so the journal
/// can record what the model actually said.
#[derive(Debug)]
pub struct FailedCall {
	pub error: LlmError,
	pub raw: Option<String>,
	pub latency_ms: i64,
}

pub struct LlmGateway {
	backend: Arc<dyn LlmBackend>,
	embed_deadline: Duration,
}

impl LlmGateway {
	pub fn new(backend: Arc<dyn LlmBackend>, embed_deadline: Duration) -> Self {
		Self {
			backend,
			embed_deadline,
		}
	}

	/// Picks the vendor client or the canned backend from config.
	pub fn from_config(config: &LlmConfig, embed_deadline: Duration) -> Self {
		let backend: Arc<dyn LlmBackend> = if config.deploy {
			Arc::new(OpenAiBackend::new(config))
		} else {
			Arc::new(CannedBackend::new())
		};
		Self::new(backend, embed_deadline)
	}

	pub fn model_tag(&self) -> String {
		self.backend.model_tag().to_string()
	}

	/// One synchronous round-trip: generate, repair, parse into `T`.
	pub async fn generate_typed<T: DeserializeOwned>(
		&self,
		prompt: &RenderedPrompt,
		deadline: Duration,
	) -> Result<RoundTrip<T>, FailedCall> {
		let started = Instant::now();
		let reply = match tokio::time::timeout(deadline, self.backend.generate(prompt)).await {
			Err(_) => {
				return Err(FailedCall {
					error: LlmError::Timeout,
					raw: None,
					latency_ms: started.elapsed().as_millis() as i64,
				});
			}
			Ok(Err(e)) => {
				return Err(FailedCall {
					error: e,
					raw: None,
					latency_ms: started.elapsed().as_millis() as i64,
				});
			}
			Ok(Ok(reply)) => reply,
		};
		let latency_ms = started.elapsed().as_millis() as i64;
		match parse_typed::<T>(&reply.text) {
			Ok(value) => Ok(RoundTrip {
				value,
				raw: reply.text,
				latency_ms,
				prompt_tokens: reply.prompt_tokens,
				completion_tokens: reply.completion_tokens,
			}),
			Err(error) => Err(FailedCall {
				error,
				raw: Some(reply.text),
				latency_ms,
			}),
		}
	}

	/// Streaming round-trip: stitches the delta sequence into one document,
	/// then repairs and parses it like the synchronous path. The fan-out
	/// stages use this so a hung vendor stream still honors the deadline.
	pub async fn generate_stitched<T: DeserializeOwned>(
		&self,
		prompt: &RenderedPrompt,
		deadline: Duration,
	) -> Result<RoundTrip<T>, FailedCall> {
		let started = Instant::now();
		let stitched = tokio::time::timeout(deadline, async {
			let mut deltas = self.backend.stream(prompt).await?;
			let mut full = String::new();
			while let Some(delta) = deltas.next().await {
				full.push_str(&delta?);
			}
			Ok::<String, LlmError>(full)
		})
		.await;

		let latency_ms = started.elapsed().as_millis() as i64;
		let text = match stitched {
			Err(_) => {
				return Err(FailedCall {
					error: LlmError::Timeout,
					raw: None,
					latency_ms,
				});
			}
			Ok(Err(e)) => {
				return Err(FailedCall {
					error: e,
					raw: None,
					latency_ms,
				});
			}
			Ok(Ok(text)) => text,
		};
		debug!(kind = ?prompt.kind, bytes = text.len(), "stitched stream into document");
		match parse_typed::<T>(&text) {
			Ok(value) => Ok(RoundTrip {
				value,
				raw: text,
				latency_ms,
				prompt_tokens: None,
				completion_tokens: None,
			}),
			Err(error) => Err(FailedCall {
				error,
				raw: Some(text),
				latency_ms,
			}),
		}
	}

	pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
		tokio::time::timeout(self.embed_deadline, self.backend.embed(text))
			.await
			.map_err(|_| LlmError::Timeout)?
	}
}

/// Production backend over the langchain OpenAI client.
pub struct OpenAiBackend {
	client: OpenAI<OpenAIConfig>,
	embedder: OpenAiEmbedder<OpenAIConfig>,
	model: String,
}

impl OpenAiBackend {
	pub fn new(config: &LlmConfig) -> Self {
		let mut oa_config = OpenAIConfig::default();
		if let Some(key) = &config.api_key {
			oa_config = oa_config.with_api_key(key.clone());
		}
		let client = OpenAI::default()
			.with_config(oa_config.clone())
			.with_model(config.model.clone());
		let embedder = OpenAiEmbedder::default().with_config(oa_config);
		Self {
			client,
			embedder,
			model: config.model.clone(),
		}
	}

	fn messages(prompt: &RenderedPrompt) -> Vec<Message> {
		vec![
			Message::new_system_message(&prompt.system),
			Message::new_human_message(&prompt.user),
		]
	}

	fn client_for(&self, prompt: &RenderedPrompt) -> OpenAI<OpenAIConfig> {
		self.client.clone().with_options(
			CallOptions::new()
				.with_temperature(prompt.config.temperature)
				.with_max_tokens(prompt.config.max_tokens),
		)
	}
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
	async fn generate(&self, prompt: &RenderedPrompt) -> Result<BackendReply, LlmError> {
		let result = self
			.client_for(prompt)
			.generate(&Self::messages(prompt))
			.await
			.map_err(|e| LlmError::Unavailable(e.to_string()))?;
		let (prompt_tokens, completion_tokens) = result
			.tokens
			.map(|t| {
				(
					Some(t.prompt_tokens as i32),
					Some(t.completion_tokens as i32),
				)
			})
			.unwrap_or((None, None));
		Ok(BackendReply {
			text: result.generation,
			prompt_tokens,
			completion_tokens,
		})
	}

	async fn stream(&self, prompt: &RenderedPrompt) -> Result<DeltaStream, LlmError> {
		let stream = self
			.client_for(prompt)
			.stream(&Self::messages(prompt))
			.await
			.map_err(|e| LlmError::Unavailable(e.to_string()))?;
		Ok(Box::pin(stream.map(|item| {
			item.map(|data| data.content)
				.map_err(|e| LlmError::Unavailable(e.to_string()))
		})))
	}

	async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
		let vector = self
			.embedder
			.embed_query(text)
			.await
			.map_err(|e| LlmError::Unavailable(e.to_string()))?;
		Ok(vector.into_iter().map(|v| v as f32).collect())
	}

	fn model_tag(&self) -> &str {
		&self.model
	}
}

static QUOTED_CITY: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static COORD_PAIR: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\((-?\d+\.?\d*), (-?\d+\.?\d*)\)").unwrap());

/// Offline backend answering every template with deterministic fixtures.
/// It echoes the city name and coordinates found in the prompt so the full
/// enrich/sort pipeline behaves sensibly without a vendor key.
pub struct CannedBackend;

impl CannedBackend {
	pub fn new() -> Self {
		Self
	}

	fn city_of(prompt: &RenderedPrompt) -> String {
		QUOTED_CITY
			.captures(&prompt.user)
			.map(|c| c[1].to_string())
			.unwrap_or_else(|| String::from("Barcelona"))
	}

	fn center_of(prompt: &RenderedPrompt) -> (f64, f64) {
		COORD_PAIR
			.captures(&prompt.user)
			.and_then(|c| Some((c[1].parse().ok()?, c[2].parse().ok()?)))
			.unwrap_or((41.3851, 2.1734))
	}

	fn poi(name: &str, lat: f64, lon: f64, category: &str, reason: &str) -> serde_json::Value {
		json!({
			"name": name,
			"latitude": lat,
			"longitude": lon,
			"category": category,
			"description": format!("{name} is a well-known stop in this part of town."),
			"price_range": "$$",
			"rating": 4.4,
			"tags": ["canned"],
			"reason": reason,
		})
	}

	fn document(prompt: &RenderedPrompt) -> String {
		let city = Self::city_of(prompt);
		let (lat, lon) = Self::center_of(prompt);
		let body = match prompt.kind {
			PromptKind::GeneralCity => json!({
				"city": city,
				"country": "Spain",
				"description": format!("{city} rewards walking: markets, seafront, and late dinners."),
				"latitude": lat,
				"longitude": lon,
				"language": "Catalan and Spanish",
				"best_time_to_visit": "May to June",
			}),
			PromptKind::GeneralPoi => json!({
				"points_of_interest": [
					Self::poi("Old Cathedral", lat + 0.002, lon + 0.001, "Landmark", ""),
					Self::poi("Central Market", lat + 0.004, lon - 0.002, "Shopping", ""),
					Self::poi("City Museum", lat - 0.003, lon + 0.003, "Museum", ""),
					Self::poi("Harbor Walk", lat - 0.005, lon - 0.004, "Outdoors", ""),
					Self::poi("Opera House", lat + 0.006, lon + 0.005, "Entertainment", ""),
				]
			}),
			PromptKind::PersonalizedItinerary => json!({
				"itinerary_name": format!("An afternoon in {city}"),
				"overall_description": "A short loop matched to the stated pace and budget.",
				"estimated_duration_minutes": 240,
				"estimated_cost": 60.0,
				"points_of_interest": [
					Self::poi("Old Cathedral", lat + 0.002, lon + 0.001, "Landmark",
						"Anchors the old town and matches the historic vibe."),
					Self::poi("Quiet Cloister Cafe", lat + 0.001, lon + 0.002, "Cafe",
						"A calm stop that fits a relaxed pace."),
					Self::poi("City Museum", lat - 0.003, lon + 0.003, "Museum",
						"Closest match for the stated interests."),
				]
			}),
			PromptKind::PoiDetailByCoord => json!({
				"points_of_interest": [
					Self::poi("Pinned Landmark", lat, lon, "Landmark", ""),
				]
			}),
			PromptKind::HotelByPreference => json!({
				"points_of_interest": [
					Self::poi("Hotel Migdia", lat + 0.001, lon, "Hotel", ""),
					Self::poi("Pension Aurora", lat - 0.001, lon + 0.001, "Hotel", ""),
				]
			}),
			PromptKind::RestaurantByPreference => json!({
				"points_of_interest": [
					Self::poi("Casa Roig", lat, lon + 0.001, "Restaurant", ""),
					Self::poi("Bar del Port", lat - 0.002, lon, "Restaurant", ""),
				]
			}),
			PromptKind::NearbyPoiByRadius => json!({
				"points_of_interest": [
					Self::poi("Corner Gallery", lat + 0.001, lon + 0.001, "Gallery", ""),
					Self::poi("Riverside Park", lat - 0.001, lon - 0.001, "Park", ""),
					Self::poi("Little Museum", lat + 0.002, lon - 0.001, "Museum", ""),
				]
			}),
		};
		body.to_string()
	}
}

#[async_trait]
impl LlmBackend for CannedBackend {
	async fn generate(&self, prompt: &RenderedPrompt) -> Result<BackendReply, LlmError> {
		Ok(BackendReply {
			text: Self::document(prompt),
			prompt_tokens: Some(0),
			completion_tokens: Some(0),
		})
	}

	async fn stream(&self, prompt: &RenderedPrompt) -> Result<DeltaStream, LlmError> {
		// Chunk the canned document so stitching is actually exercised.
		let text = Self::document(prompt);
		let chunks: Vec<Result<String, LlmError>> = text
			.as_bytes()
			.chunks(64)
			.map(|c| Ok(String::from_utf8_lossy(c).into_owned()))
			.collect();
		Ok(Box::pin(futures::stream::iter(chunks)))
	}

	async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
		// Deterministic pseudo-embedding, sized to the schema's vector column
		// so the persistence plumbing can be tested end to end.
		const DIM: usize = 1536;
		let mut acc: u32 = 2166136261;
		for b in text.bytes() {
			acc = acc.wrapping_mul(16777619) ^ b as u32;
		}
		let mut out = Vec::with_capacity(DIM);
		for _ in 0..DIM {
			acc = acc.wrapping_mul(16777619) ^ 0x9e;
			out.push((acc % 1000) as f32 / 1000.0);
		}
		Ok(out)
	}

	fn model_tag(&self) -> &str {
		"canned-offline"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::llm::prompts;
	use crate::llm::schema::{CityFacts, ItinerarySketch, PoiList};

	fn gateway() -> LlmGateway {
		LlmGateway::new(Arc::new(CannedBackend::new()), Duration::from_secs(1))
	}

	#[tokio::test]
	async fn canned_city_facts_parse_and_echo_the_city() {
		let prompt = prompts::general_city("Lisbon");
		let trip = gateway()
			.generate_typed::<CityFacts>(&prompt, Duration::from_secs(1))
			.await
			.unwrap();
		assert_eq!(trip.value.city, "Lisbon");
		assert!(trip.value.center().is_some());
	}

	#[tokio::test]
	async fn stitched_stream_equals_synchronous_document() {
		let prompt = prompts::general_pois("Lisbon", 5);
		let gw = gateway();
		let sync = gw
			.generate_typed::<PoiList>(&prompt, Duration::from_secs(1))
			.await
			.unwrap();
		let stitched = gw
			.generate_stitched::<PoiList>(&prompt, Duration::from_secs(1))
			.await
			.unwrap();
		assert_eq!(sync.raw, stitched.raw);
		assert_eq!(sync.value.points_of_interest.len(), 5);
	}

	#[tokio::test]
	async fn itinerary_fixture_carries_reasons() {
		let ctx_prompt = prompts::general_city("Porto");
		// Reuse the rendered prompt shape; only the kind matters to the canned backend.
		let mut prompt = ctx_prompt;
		prompt.kind = prompts::PromptKind::PersonalizedItinerary;
		let trip = gateway()
			.generate_stitched::<ItinerarySketch>(&prompt, Duration::from_secs(1))
			.await
			.unwrap();
		assert!(!trip.value.points_of_interest.is_empty());
		assert!(trip.value.points_of_interest[0].reason.is_some());
	}

	#[tokio::test]
	async fn embed_is_deterministic() {
		let gw = gateway();
		let a = gw.embed("Old Cathedral").await.unwrap();
		let b = gw.embed("Old Cathedral").await.unwrap();
		let c = gw.embed("New Cathedral").await.unwrap();
		assert_eq!(a, b);
		assert_eq!(a.len(), 1536);
		assert_ne!(a, c);
	}
}
