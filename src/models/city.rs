/*
 * src/models/city.rs
 *
 * File for the City domain model
 *
 * Purpose:
 *   Cities are created lazily by the resolver and unique under
 *   (normalized name, country). Effectively immutable once created.
 */

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct City {
	pub id: i32,
	pub name: String,
	pub country: String,
	pub summary: Option<String>,
	pub center: Option<Coordinates>,
	#[schema(value_type = String)]
	pub created_at: NaiveDateTime,
	#[schema(value_type = String)]
	pub updated_at: NaiveDateTime,
}

/// Comparison key for city uniqueness: case-insensitive, trimmed.
pub fn normalize_name(name: &str) -> String {
	name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalization_trims_and_lowercases() {
		assert_eq!(normalize_name("  Barcelona "), "barcelona");
		assert_eq!(normalize_name("SÃO PAULO"), "são paulo");
	}
}
