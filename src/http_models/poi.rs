/*
 * src/http_models/poi.rs
 *
 * File for POI search payloads
 *
 * Purpose:
 *   Query and body shapes for the nearby / details / hotels / restaurants
 *   routes. Hotel preference options are a closed set; unknown names are
 *   rejected at this boundary, never forwarded into a prompt.
 */

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, PublicError};
use crate::http_models::recommendation::PoiOut;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ByDistanceQuery {
	pub lat: f64,
	pub lon: f64,
	/// Radius in meters.
	pub distance: f64,
	pub category: Option<String>,
	pub price_range: Option<String>,
	pub min_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoiListResponse {
	pub points_of_interest: Vec<PoiOut>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PoiDetailsRequest {
	pub city: String,
	pub lat: f64,
	pub lon: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PoiDetailsResponse {
	pub pois: Vec<PoiOut>,
}

/// Hotel preference options the prompt understands.
const HOTEL_PREFERENCES: &[&str] = &[
	"pool",
	"spa",
	"gym",
	"parking",
	"breakfast",
	"pet_friendly",
	"family",
	"business",
	"budget",
	"luxury",
];

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct HotelsRequest {
	pub city: String,
	pub lat: f64,
	pub lon: f64,
	#[serde(default)]
	pub preferences: Vec<String>,
	/// Radius in meters; defaults to a city-scale search.
	pub distance: Option<f64>,
}

impl HotelsRequest {
	pub fn validate(&self) -> Result<(), AppError> {
		for pref in &self.preferences {
			if !HOTEL_PREFERENCES.contains(&pref.as_str()) {
				return Err(PublicError::Validation(format!(
					"unknown hotel preference '{pref}'"
				))
				.into());
			}
		}
		Ok(())
	}
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RestaurantsQuery {
	pub city: String,
	pub lat: f64,
	pub lon: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_hotel_preference_is_rejected() {
		let req = HotelsRequest {
			city: String::from("Barcelona"),
			lat: 41.38,
			lon: 2.17,
			preferences: vec![String::from("pool"), String::from("heliport")],
			distance: None,
		};
		assert!(req.validate().is_err());
	}

	#[test]
	fn known_hotel_preferences_pass() {
		let req = HotelsRequest {
			city: String::from("Barcelona"),
			lat: 41.38,
			lon: 2.17,
			preferences: vec![String::from("pool"), String::from("pet_friendly")],
			distance: Some(2_000.0),
		};
		assert!(req.validate().is_ok());
	}

	#[test]
	fn unknown_body_fields_are_rejected() {
		let raw = r#"{"city": "x", "lat": 1.0, "lon": 2.0, "stars": 5}"#;
		assert!(serde_json::from_str::<HotelsRequest>(raw).is_err());
	}
}
