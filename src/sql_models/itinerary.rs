use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::models::Visibility;
use crate::models::itinerary::{ItineraryItem, SavedItinerary};

#[derive(Debug, FromRow)]
pub struct SavedItineraryRow {
	pub id: i32,
	pub account_id: i32,
	pub title: String,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub estimated_duration_minutes: Option<i32>,
	pub estimated_cost: Option<f64>,
	pub visibility: String,
	pub source_interaction_id: Option<i64>,
	pub created_at: NaiveDateTime,
	pub updated_at: NaiveDateTime,
}

#[derive(Debug, FromRow)]
pub struct ItineraryItemRow {
	pub poi_id: Option<i32>,
	pub name: String,
	pub reason: Option<String>,
	pub position: i32,
}

impl SavedItineraryRow {
	pub fn into_model(self, items: Vec<ItineraryItemRow>) -> SavedItinerary {
		SavedItinerary {
			id: self.id,
			account_id: self.account_id,
			title: self.title,
			description: self.description,
			items: items
				.into_iter()
				.map(|i| ItineraryItem {
					poi_id: i.poi_id,
					name: i.name,
					reason: i.reason,
					position: i.position,
				})
				.collect(),
			tags: self.tags,
			estimated_duration_minutes: self.estimated_duration_minutes,
			estimated_cost: self.estimated_cost,
			visibility: self.visibility.parse().unwrap_or(Visibility::Private),
			source_interaction_id: self.source_interaction_id,
			created_at: self.created_at,
			updated_at: self.updated_at,
		}
	}
}
