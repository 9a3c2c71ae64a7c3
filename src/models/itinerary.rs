/*
 * src/models/itinerary.rs
 *
 * File for saved itinerary models
 *
 * Purpose:
 *   A saved itinerary is a user-owned snapshot of one personalized response.
 *   Deleting it never deletes its POIs; the bookmark anchor is the journal
 *   interaction id of the generation that produced it.
 */

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Visibility;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItineraryItem {
	pub poi_id: Option<i32>,
	pub name: String,
	/// Per-item reasoning from the personalized generation.
	pub reason: Option<String>,
	pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedItinerary {
	pub id: i32,
	pub account_id: i32,
	pub title: String,
	pub description: Option<String>,
	pub items: Vec<ItineraryItem>,
	pub tags: Vec<String>,
	pub estimated_duration_minutes: Option<i32>,
	pub estimated_cost: Option<f64>,
	pub visibility: Visibility,
	pub source_interaction_id: Option<i64>,
	#[schema(value_type = String)]
	pub created_at: NaiveDateTime,
	#[schema(value_type = String)]
	pub updated_at: NaiveDateTime,
}
