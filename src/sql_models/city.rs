use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::geo::Coordinates;
use crate::models::city::City;

#[derive(Debug, FromRow)]
pub struct CityRow {
	pub id: i32,
	pub name: String,
	pub country: String,
	pub summary: Option<String>,
	pub center_lat: Option<f64>,
	pub center_lon: Option<f64>,
	pub created_at: NaiveDateTime,
	pub updated_at: NaiveDateTime,
}

impl From<CityRow> for City {
	fn from(row: CityRow) -> Self {
		let center = match (row.center_lat, row.center_lon) {
			(Some(latitude), Some(longitude)) => Some(Coordinates {
				latitude,
				longitude,
			}),
			_ => None,
		};
		City {
			id: row.id,
			name: row.name,
			country: row.country,
			summary: row.summary,
			center,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}
