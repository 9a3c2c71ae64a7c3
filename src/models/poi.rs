/*
 * src/models/poi.rs
 *
 * File for the POI domain model
 *
 * Purpose:
 *   Points of interest as the store and the orchestrator see them, plus the
 *   enumerated search filters. POIs are unique per (city, normalized name);
 *   a POI with no city is a wide-radius discovery row.
 */

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, PublicError};
use crate::geo::{Coordinates, Locatable};
use crate::models::{PoiCategory, PriceRange};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Poi {
	pub id: i32,
	pub city_id: Option<i32>,
	pub name: String,
	pub description: Option<String>,
	pub category: Option<String>,
	pub coordinates: Option<Coordinates>,
	pub address: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub opening_hours: Option<String>,
	pub price_range: Option<PriceRange>,
	pub rating: Option<f64>,
	pub tags: Vec<String>,
	pub images: Vec<String>,
	/// Journal row that first produced this POI, when LLM-sourced.
	pub source_interaction_id: Option<i64>,
	#[schema(value_type = Option<String>)]
	pub created_at: Option<NaiveDateTime>,
	#[schema(value_type = Option<String>)]
	pub updated_at: Option<NaiveDateTime>,
}

impl Poi {
	/// Upsert precondition: non-empty name and in-bounds coordinates.
	pub fn validate(&self) -> Result<(), AppError> {
		if self.name.trim().is_empty() {
			return Err(PublicError::Validation(String::from("POI name must not be empty")).into());
		}
		if let Some(c) = self.coordinates {
			if !c.in_bounds() {
				return Err(PublicError::Validation(format!(
					"POI '{}' has out-of-bounds coordinates",
					self.name
				))
				.into());
			}
		}
		if let Some(r) = self.rating {
			if !(0.0..=5.0).contains(&r) {
				return Err(PublicError::Validation(format!(
					"POI '{}' rating {} outside [0,5]",
					self.name, r
				))
				.into());
			}
		}
		Ok(())
	}

	/// Enrichment merge: fills attributes this record is missing from an
	/// LLM-produced sketch of the same place. Persisted non-empty values
	/// always win, including coordinates.
	pub fn fill_missing_from(&mut self, other: &Poi) {
		if self.description.is_none() {
			self.description = other.description.clone();
		}
		if self.category.is_none() {
			self.category = other.category.clone();
		}
		if self.coordinates.is_none() {
			self.coordinates = other.coordinates.filter(Coordinates::in_bounds);
		}
		if self.address.is_none() {
			self.address = other.address.clone();
		}
		if self.phone.is_none() {
			self.phone = other.phone.clone();
		}
		if self.website.is_none() {
			self.website = other.website.clone();
		}
		if self.opening_hours.is_none() {
			self.opening_hours = other.opening_hours.clone();
		}
		if self.price_range.is_none() {
			self.price_range = other.price_range;
		}
		if self.rating.is_none() {
			self.rating = other.rating;
		}
		if self.tags.is_empty() {
			self.tags = other.tags.clone();
		}
		if self.images.is_empty() {
			self.images = other.images.clone();
		}
	}

	/// Comparison key for POI uniqueness within a city.
	pub fn normalized_name(&self) -> String {
		self.name.trim().to_lowercase()
	}
}

impl Locatable for Poi {
	fn coordinates(&self) -> Option<Coordinates> {
		self.coordinates
	}

	fn sort_name(&self) -> &str {
		&self.name
	}
}

/// Enumerated search filters for radius queries. Every field defaults to
/// "any"; unknown filter keys and unparseable values are ignored at the
/// boundary rather than failing the request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoiFilters {
	pub category: Option<PoiCategory>,
	pub price_range: Option<PriceRange>,
	pub min_rating: Option<f64>,
}

impl PoiFilters {
	pub fn from_parts(
		category: Option<&str>,
		price_range: Option<&str>,
		min_rating: Option<f64>,
	) -> Self {
		Self {
			category: category.and_then(|s| s.parse().ok()),
			price_range: price_range.and_then(|s| s.parse().ok()),
			min_rating: min_rating.filter(|r| (0.0..=5.0).contains(r)),
		}
	}

	pub fn matches(&self, poi: &Poi) -> bool {
		if let Some(cat) = self.category {
			let hit = poi
				.category
				.as_deref()
				.map(|c| c.eq_ignore_ascii_case(cat.as_str()))
				.unwrap_or(false);
			if !hit {
				return false;
			}
		}
		if let Some(price) = self.price_range {
			if poi.price_range != Some(price) {
				return false;
			}
		}
		if let Some(min) = self.min_rating {
			if poi.rating.map(|r| r < min).unwrap_or(true) {
				return false;
			}
		}
		true
	}
}
