/*
 * src/http_models/itinerary.rs
 *
 * File for saved itinerary payloads
 */

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::http_models::recommendation::PoiOut;
use crate::models::Visibility;
use crate::models::itinerary::SavedItinerary;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItineraryItemIn {
	pub poi_id: Option<i32>,
	pub name: String,
	pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SaveItineraryRequest {
	pub title: String,
	pub description: Option<String>,
	pub items: Vec<ItineraryItemIn>,
	#[serde(default)]
	pub tags: Vec<String>,
	pub estimated_duration_minutes: Option<i32>,
	pub estimated_cost: Option<f64>,
	#[serde(default = "default_visibility")]
	pub visibility: Visibility,
	/// Journal anchor of the generation being bookmarked.
	pub source_interaction_id: Option<i64>,
}

fn default_visibility() -> Visibility {
	Visibility::Private
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateItineraryRequest {
	pub title: Option<String>,
	pub description: Option<String>,
	pub tags: Option<Vec<String>>,
	pub visibility: Option<Visibility>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItinerariesResponse {
	pub itineraries: Vec<SavedItinerary>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FavoriteRequest {
	pub poi_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesResponse {
	pub points_of_interest: Vec<PoiOut>,
}
