/*
 * src/llm/schema.rs
 *
 * File for LLM response shapes
 *
 * Purpose:
 *   The JSON documents each prompt template expects back, and the
 *   conversions into domain types. Model output is never trusted: empty
 *   names drop the POI, out-of-bounds coordinates are discarded.
 */

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::Coordinates;
use crate::models::poi::Poi;

/// G1: general facts about a city.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CityFacts {
	pub city: String,
	pub country: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
	#[serde(default)]
	pub language: Option<String>,
	#[serde(default)]
	pub best_time_to_visit: Option<String>,
}

impl CityFacts {
	pub fn center(&self) -> Option<Coordinates> {
		match (self.latitude, self.longitude) {
			(Some(latitude), Some(longitude)) => {
				Coordinates::checked(latitude, longitude).ok()
			}
			_ => None,
		}
	}
}

/// A POI as the model sketches it, before enrichment against the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PoiSketch {
	pub name: String,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub website: Option<String>,
	#[serde(default)]
	pub opening_hours: Option<String>,
	#[serde(default)]
	pub price_range: Option<String>,
	#[serde(default)]
	pub rating: Option<f64>,
	#[serde(default)]
	pub tags: Vec<String>,
	/// Why this POI fits the user, on personalized itineraries only.
	#[serde(default)]
	pub reason: Option<String>,
}

impl PoiSketch {
	pub fn coordinates(&self) -> Option<Coordinates> {
		match (self.latitude, self.longitude) {
			(Some(latitude), Some(longitude)) => {
				Coordinates::checked(latitude, longitude).ok()
			}
			_ => None,
		}
	}

	/// Lifts the sketch into an unpersisted domain POI. Returns None when
	/// the sketch is unusable (blank name).
	pub fn into_poi(self, city_id: Option<i32>, source_interaction_id: Option<i64>) -> Option<Poi> {
		if self.name.trim().is_empty() {
			return None;
		}
		let coordinates = self.coordinates();
		Some(Poi {
			id: 0,
			city_id,
			name: self.name,
			description: self.description,
			category: self.category,
			coordinates,
			address: self.address,
			phone: self.phone,
			website: self.website,
			opening_hours: self.opening_hours,
			price_range: self.price_range.and_then(|p| p.parse().ok()),
			rating: self.rating.filter(|r| (0.0..=5.0).contains(r)),
			tags: self.tags,
			images: Vec::new(),
			source_interaction_id,
			created_at: None,
			updated_at: None,
		})
	}
}

/// G2 and the nearby/hotel/restaurant templates: a flat POI list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiList {
	#[serde(default)]
	pub points_of_interest: Vec<PoiSketch>,
}

/// G3: the personalized itinerary document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItinerarySketch {
	pub itinerary_name: String,
	#[serde(default)]
	pub overall_description: Option<String>,
	#[serde(default)]
	pub points_of_interest: Vec<PoiSketch>,
	#[serde(default)]
	pub estimated_duration_minutes: Option<i32>,
	#[serde(default)]
	pub estimated_cost: Option<f64>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::llm::repair::parse_typed;

	#[test]
	fn sketch_with_blank_name_is_dropped() {
		let sketch = PoiSketch {
			name: String::from("  "),
			latitude: None,
			longitude: None,
			category: None,
			description: None,
			address: None,
			phone: None,
			website: None,
			opening_hours: None,
			price_range: None,
			rating: None,
			tags: vec![],
			reason: None,
		};
		assert!(sketch.into_poi(None, None).is_none());
	}

	#[test]
	fn out_of_bounds_coordinates_are_discarded_not_fatal() {
		let raw = r#"{
			"name": "Phantom Island",
			"latitude": 123.0,
			"longitude": 456.0,
			"rating": 7.5
		}"#;
		let sketch: PoiSketch = serde_json::from_str(raw).unwrap();
		let poi = sketch.into_poi(None, None).unwrap();
		assert!(poi.coordinates.is_none());
		assert!(poi.rating.is_none());
	}

	#[test]
	fn itinerary_parses_from_fenced_response() {
		let raw = "```json\n{\"itinerary_name\": \"Old Town Evening\", \"points_of_interest\": [{\"name\": \"Cathedral\", \"latitude\": 41.4, \"longitude\": 2.18, \"reason\": \"gothic quarter anchor\"}]}\n```";
		let doc: ItinerarySketch = parse_typed(raw).unwrap();
		assert_eq!(doc.itinerary_name, "Old Town Evening");
		assert_eq!(doc.points_of_interest.len(), 1);
		assert_eq!(
			doc.points_of_interest[0].reason.as_deref(),
			Some("gothic quarter anchor")
		);
	}

	#[test]
	fn price_range_string_maps_into_enum() {
		let sketch: PoiSketch =
			serde_json::from_str(r#"{"name": "Bar Brutal", "price_range": "$$"}"#).unwrap();
		let poi = sketch.into_poi(Some(3), None).unwrap();
		assert_eq!(poi.price_range, Some(crate::models::PriceRange::Moderate));
	}
}
