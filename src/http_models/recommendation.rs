/*
 * src/http_models/recommendation.rs
 *
 * File for recommendation bundle payloads
 *
 * Purpose:
 *   The wire shape of the three-part bundle: general city data, general
 *   POIs, and the personalized itinerary, plus the journal ids that make
 *   the bundle bookmarkable.
 */

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::llm::schema::CityFacts;
use crate::models::PriceRange;
use crate::models::poi::Poi;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecommendationQuery {
	pub city: String,
	pub lat: Option<f64>,
	pub lon: Option<f64>,
}

/// A POI as it leaves the service: persisted id when resolved, distance from
/// the user when known, per-item reasoning on itinerary entries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoiOut {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<i32>,
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub latitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub longitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub website: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub opening_hours: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub price_range: Option<PriceRange>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rating: Option<f64>,
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub tags: Vec<String>,
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub images: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance_meters: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

impl PoiOut {
	pub fn from_poi(poi: &Poi, distance_meters: Option<f64>, reason: Option<String>) -> Self {
		Self {
			id: (poi.id != 0).then_some(poi.id),
			name: poi.name.clone(),
			description: poi.description.clone(),
			category: poi.category.clone(),
			latitude: poi.coordinates.map(|c| c.latitude),
			longitude: poi.coordinates.map(|c| c.longitude),
			address: poi.address.clone(),
			phone: poi.phone.clone(),
			website: poi.website.clone(),
			opening_hours: poi.opening_hours.clone(),
			price_range: poi.price_range,
			rating: poi.rating,
			tags: poi.tags.clone(),
			images: poi.images.clone(),
			distance_meters,
			reason,
		}
	}
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItineraryResponse {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_duration_minutes: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_cost: Option<f64>,
	pub points_of_interest: Vec<PoiOut>,
}

/// Journal anchors for each stage that actually dispatched, so the client
/// can bookmark the bundle.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct InteractionIds {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub general_city: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub general_poi: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub itinerary: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecommendationResponse {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub general_city_data: Option<CityFacts>,
	pub points_of_interest: Vec<PoiOut>,
	pub itinerary_response: ItineraryResponse,
	pub interaction_ids: InteractionIds,
}

/// Success wrapper for the bundle endpoint (`201 + {data}`).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecommendationEnvelope {
	pub data: RecommendationResponse,
}
