use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wayfarer::llm::gateway::{BackendReply, CannedBackend, DeltaStream};
use wayfarer::llm::repair::extract_json_object;
use wayfarer::llm::schema::{CityFacts, PoiList};
use wayfarer::llm::{LlmBackend, LlmError, LlmGateway, RenderedPrompt, prompts};

/// JSON repair returns the byte-equal inner object for fenced, noisy, and
/// bare inputs, and a parse error when there are no braces.
#[test]
fn repair_property_over_known_inputs() {
	let inner = r#"{"city": "Barcelona", "country": "Spain"}"#;

	let fenced = format!("```json\n{inner}\n```");
	assert_eq!(extract_json_object(&fenced).unwrap(), inner);

	let noisy = format!("Sure! Here you go: {inner} hope that helps");
	assert_eq!(extract_json_object(&noisy).unwrap(), inner);

	assert_eq!(extract_json_object(inner).unwrap(), inner);

	match extract_json_object("no braces here") {
		Err(LlmError::Parse { raw }) => assert_eq!(raw, "no braces here"),
		other => panic!("expected parse error, got {other:?}"),
	}
}

/// The offline backend answers every template with schema-valid fixtures.
#[tokio::test]
async fn canned_backend_covers_all_templates() {
	let gateway = LlmGateway::new(Arc::new(CannedBackend::new()), Duration::from_secs(1));
	let deadline = Duration::from_secs(1);

	let facts = gateway
		.generate_typed::<CityFacts>(&prompts::general_city("Barcelona"), deadline)
		.await
		.unwrap();
	assert_eq!(facts.value.city, "Barcelona");

	let pois = gateway
		.generate_typed::<PoiList>(&prompts::general_pois("Barcelona", 5), deadline)
		.await
		.unwrap();
	assert_eq!(pois.value.points_of_interest.len(), 5);

	let center = wayfarer::geo::Coordinates {
		latitude: 48.8566,
		longitude: 2.3522,
	};
	let nearby = gateway
		.generate_typed::<PoiList>(
			&prompts::nearby_poi_by_radius(center, 1_000.0, &Default::default()),
			deadline,
		)
		.await
		.unwrap();
	// Fixtures echo the prompt's center, so every find stays nearby.
	for sketch in &nearby.value.points_of_interest {
		let c = sketch.coordinates().unwrap();
		assert!(wayfarer::geo::haversine_meters(center, c) < 1_000.0);
	}
}

struct StalledBackend;

#[async_trait]
impl LlmBackend for StalledBackend {
	async fn generate(&self, _prompt: &RenderedPrompt) -> Result<BackendReply, LlmError> {
		tokio::time::sleep(Duration::from_secs(60)).await;
		unreachable!("the deadline fires first")
	}

	async fn stream(&self, _prompt: &RenderedPrompt) -> Result<DeltaStream, LlmError> {
		tokio::time::sleep(Duration::from_secs(60)).await;
		unreachable!("the deadline fires first")
	}

	async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
		tokio::time::sleep(Duration::from_secs(60)).await;
		unreachable!("the deadline fires first")
	}

	fn model_tag(&self) -> &str {
		"stalled"
	}
}

/// A hung vendor surfaces as Timeout at the stage deadline, not a hang.
#[tokio::test]
async fn stalled_backend_times_out() {
	let gateway = LlmGateway::new(Arc::new(StalledBackend), Duration::from_millis(50));

	let failed = gateway
		.generate_typed::<CityFacts>(
			&prompts::general_city("Nowhere"),
			Duration::from_millis(100),
		)
		.await
		.unwrap_err();
	assert!(matches!(failed.error, LlmError::Timeout));
	assert!(failed.raw.is_none());

	let embed_err = gateway.embed("anything").await.unwrap_err();
	assert!(matches!(embed_err, LlmError::Timeout));
}

/// Garbage from the vendor keeps the raw text for the journal.
struct GarbageBackend;

#[async_trait]
impl LlmBackend for GarbageBackend {
	async fn generate(&self, _prompt: &RenderedPrompt) -> Result<BackendReply, LlmError> {
		Ok(BackendReply {
			text: String::from("I cannot answer that."),
			prompt_tokens: None,
			completion_tokens: None,
		})
	}

	async fn stream(&self, _prompt: &RenderedPrompt) -> Result<DeltaStream, LlmError> {
		Ok(Box::pin(futures::stream::iter(vec![Ok(String::from(
			"I cannot answer that.",
		))])))
	}

	async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
		Ok(vec![0.0])
	}

	fn model_tag(&self) -> &str {
		"garbage"
	}
}

#[tokio::test]
async fn unparseable_reply_keeps_raw_text_for_the_journal() {
	let gateway = LlmGateway::new(Arc::new(GarbageBackend), Duration::from_secs(1));
	let failed = gateway
		.generate_typed::<CityFacts>(&prompts::general_city("Nowhere"), Duration::from_secs(1))
		.await
		.unwrap_err();
	assert!(matches!(failed.error, LlmError::Parse { .. }));
	assert_eq!(failed.raw.as_deref(), Some("I cannot answer that."));
}
