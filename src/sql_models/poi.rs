use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::geo::Coordinates;
use crate::models::poi::Poi;

/// Shared row shape for `points_of_interest` and its `hotels` /
/// `restaurants` siblings; the three tables mirror each other.
#[derive(Debug, FromRow)]
pub struct PoiRow {
	pub id: i32,
	pub city_id: Option<i32>,
	pub name: String,
	pub description: Option<String>,
	pub category: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub address: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub opening_hours: Option<String>,
	pub price_range: Option<String>,
	pub rating: Option<f64>,
	pub tags: Vec<String>,
	pub images: Vec<String>,
	pub source_interaction_id: Option<i64>,
	pub created_at: NaiveDateTime,
	pub updated_at: NaiveDateTime,
}

/// Radius queries also select the geodesic distance to the search center.
#[derive(Debug, FromRow)]
pub struct PoiDistanceRow {
	#[sqlx(flatten)]
	pub poi: PoiRow,
	pub distance_meters: f64,
}

impl From<PoiRow> for Poi {
	fn from(row: PoiRow) -> Self {
		let coordinates = match (row.latitude, row.longitude) {
			(Some(latitude), Some(longitude)) => Some(Coordinates {
				latitude,
				longitude,
			}),
			_ => None,
		};
		Poi {
			id: row.id,
			city_id: row.city_id,
			name: row.name,
			description: row.description,
			category: row.category,
			coordinates,
			address: row.address,
			phone: row.phone,
			website: row.website,
			opening_hours: row.opening_hours,
			price_range: row.price_range.as_deref().and_then(|p| p.parse().ok()),
			rating: row.rating,
			tags: row.tags,
			images: row.images,
			source_interaction_id: row.source_interaction_id,
			created_at: Some(row.created_at),
			updated_at: Some(row.updated_at),
		}
	}
}
