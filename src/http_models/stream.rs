/*
 * src/http_models/stream.rs
 *
 * File for stream event payloads
 *
 * Purpose:
 *   Tagged event variants for the recommendation stream and the envelope
 *   that carries them. The wire format is SSE-style: `id` is the monotonic
 *   event id, `event` the discriminator, `data` the serialized envelope.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::http_models::recommendation::PoiOut;
use crate::llm::schema::CityFacts;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StreamRequest {
	pub city_name: String,
	pub lat: Option<f64>,
	pub lon: Option<f64>,
}

/// What can happen on a recommendation stream. `Complete` and `Error` are
/// terminal; exactly one of them ends every session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecEvent {
	Start,
	CityData { city_data: CityFacts },
	GeneralPoi { poi: PoiOut },
	ItineraryPoi { poi: PoiOut },
	Heartbeat,
	Complete,
	Error { message: String },
}

impl RecEvent {
	pub fn kind(&self) -> &'static str {
		match self {
			RecEvent::Start => "start",
			RecEvent::CityData { .. } => "city_data",
			RecEvent::GeneralPoi { .. } => "general_poi",
			RecEvent::ItineraryPoi { .. } => "itinerary_poi",
			RecEvent::Heartbeat => "heartbeat",
			RecEvent::Complete => "complete",
			RecEvent::Error { .. } => "error",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, RecEvent::Complete | RecEvent::Error { .. })
	}
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventEnvelope {
	/// Monotonic within a session, starting at 0 for `start`.
	pub event_id: u64,
	#[schema(value_type = String)]
	pub session_id: Uuid,
	#[schema(value_type = String)]
	pub timestamp: DateTime<Utc>,
	#[serde(flatten)]
	pub event: RecEvent,
}
