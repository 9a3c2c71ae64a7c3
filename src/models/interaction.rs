/*
 * src/models/interaction.rs
 *
 * File for the LLM interaction journal record
 *
 * Purpose:
 *   One append-only row per LLM round-trip, successful or failed. Rows are
 *   never mutated and anchor itinerary bookmarks.
 */

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which pipeline stage (or auxiliary path) produced a round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
	GeneralCity,
	GeneralPoi,
	PersonalizedItinerary,
	PoiDetail,
	HotelSearch,
	RestaurantSearch,
	NearbyDiscovery,
	Embedding,
	/// Persistence worker outcome summary, journaled for audit.
	WorkerSummary,
}

impl InteractionKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			InteractionKind::GeneralCity => "general_city",
			InteractionKind::GeneralPoi => "general_poi",
			InteractionKind::PersonalizedItinerary => "personalized_itinerary",
			InteractionKind::PoiDetail => "poi_detail",
			InteractionKind::HotelSearch => "hotel_search",
			InteractionKind::RestaurantSearch => "restaurant_search",
			InteractionKind::NearbyDiscovery => "nearby_discovery",
			InteractionKind::Embedding => "embedding",
			InteractionKind::WorkerSummary => "worker_summary",
		}
	}
}

/// A journal record ready to be written. `error_tag` is set on failed
/// round-trips, with whatever raw response was salvaged in `response_text`.
#[derive(Debug, Clone)]
pub struct NewInteraction {
	pub account_id: Option<i32>,
	pub profile_id: Option<i32>,
	pub kind: InteractionKind,
	pub city_name: Option<String>,
	pub prompt_text: String,
	pub response_text: Option<String>,
	pub model_tag: String,
	pub prompt_tokens: Option<i32>,
	pub completion_tokens: Option<i32>,
	pub latency_ms: i64,
	pub error_tag: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
	pub id: i64,
	pub account_id: Option<i32>,
	pub profile_id: Option<i32>,
	pub kind: String,
	pub city_name: Option<String>,
	pub prompt_hash: String,
	pub prompt_text: String,
	pub response_text: Option<String>,
	pub model_tag: String,
	pub prompt_tokens: Option<i32>,
	pub completion_tokens: Option<i32>,
	pub latency_ms: i64,
	pub error_tag: Option<String>,
	pub created_at: NaiveDateTime,
}
