/*
 * src/llm/prompts.rs
 *
 * File for prompt templates
 *
 * Purpose:
 *   One constructor per template. Each declares its required inputs in its
 *   signature, documents the JSON document it expects back, and carries its
 *   own generation defaults.
 */

use crate::geo::Coordinates;
use crate::llm::GenerationConfig;
use crate::models::poi::PoiFilters;
use crate::models::preferences::UserContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
	GeneralCity,
	GeneralPoi,
	PersonalizedItinerary,
	PoiDetailByCoord,
	HotelByPreference,
	RestaurantByPreference,
	NearbyPoiByRadius,
}

/// A fully rendered prompt ready for the backend, plus its config.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
	pub kind: PromptKind,
	pub system: String,
	pub user: String,
	pub config: GenerationConfig,
}

const SYSTEM_PROMPT: &str = "You are a city exploration assistant. \
	You answer with exactly one JSON object and nothing else: no prose, \
	no Markdown fences. All coordinates are WGS84 decimal degrees. \
	Omit fields you are not confident about rather than guessing.";

fn base(kind: PromptKind, user: String, temperature: f32, max_tokens: u32) -> RenderedPrompt {
	RenderedPrompt {
		kind,
		system: String::from(SYSTEM_PROMPT),
		user,
		config: GenerationConfig {
			temperature,
			max_tokens,
		},
	}
}

/// G1: general facts about a city.
///
/// Inputs: city name. Expects a [`crate::llm::schema::CityFacts`] object.
/// Runs cold (0.3) with a small output ceiling; facts should not be creative.
pub fn general_city(city_name: &str) -> RenderedPrompt {
	base(
		PromptKind::GeneralCity,
		format!(
			"Give general visitor facts for the city \"{city_name}\".\n\
			Respond with a JSON object with fields: city, country, description, \
			latitude, longitude, language, best_time_to_visit."
		),
		0.3,
		512,
	)
}

/// G2: the broadly appealing POI list.
///
/// Inputs: city name and the list cap. Expects a
/// [`crate::llm::schema::PoiList`] of at most `limit` entries.
pub fn general_pois(city_name: &str, limit: usize) -> RenderedPrompt {
	base(
		PromptKind::GeneralPoi,
		format!(
			"List the {limit} points of interest in \"{city_name}\" that most \
			visitors would not want to miss.\n\
			Respond with a JSON object: {{\"points_of_interest\": [...]}} where each \
			entry has fields: name, latitude, longitude, category, description, \
			address, website, price_range (one of \"$\",\"$$\",\"$$$\",\"$$$$\"), \
			rating (0-5), tags."
		),
		0.5,
		1536,
	)
}

/// G3: the personalized itinerary.
///
/// Inputs: city name, the assembled [`UserContext`], and optionally the
/// caller's position. Expects an [`crate::llm::schema::ItinerarySketch`]
/// whose entries each carry a one-sentence `reason`. The warmest template
/// (0.7) with the largest output budget of the pipeline.
pub fn personalized_itinerary(
	city_name: &str,
	ctx: &UserContext,
	user_location: Option<Coordinates>,
) -> RenderedPrompt {
	let location_line = match user_location {
		Some(c) => format!(
			"The user is currently at ({:.4}, {:.4}); favor places reachable from there.\n",
			c.latitude, c.longitude
		),
		None => String::new(),
	};
	base(
		PromptKind::PersonalizedItinerary,
		format!(
			"Build a personalized exploration itinerary for \"{city_name}\".\n\
			{location_line}\
			User preferences:\n{preferences}\n\n\
			Respond with a JSON object with fields: itinerary_name, \
			overall_description, estimated_duration_minutes, estimated_cost, and \
			points_of_interest: an ordered array where each entry has fields: name, \
			latitude, longitude, category, description, address, website, \
			price_range, rating, tags, and reason (one sentence on why this fits \
			this user).",
			preferences = ctx.to_prompt_block(),
		),
		0.7,
		3072,
	)
}

/// Detail lookup for a place the client pinned by coordinates. Expects a
/// `PoiList` (usually one entry).
pub fn poi_detail_by_coord(city: &str, coords: Coordinates) -> RenderedPrompt {
	base(
		PromptKind::PoiDetailByCoord,
		format!(
			"Identify the notable point of interest at or immediately around \
			({:.5}, {:.5}) in \"{city}\" and describe it.\n\
			Respond with a JSON object: {{\"points_of_interest\": [...]}} with the \
			usual POI fields (name, latitude, longitude, category, description, \
			address, phone, website, opening_hours, price_range, rating, tags).",
			coords.latitude, coords.longitude
		),
		0.2,
		768,
	)
}

/// Hotel search biased by enumerated preference options.
pub fn hotel_by_preference(
	city: &str,
	coords: Coordinates,
	preferences: &[String],
	distance_meters: f64,
) -> RenderedPrompt {
	let prefs = if preferences.is_empty() {
		String::from("none stated")
	} else {
		preferences.join(", ")
	};
	base(
		PromptKind::HotelByPreference,
		format!(
			"Suggest hotels in \"{city}\" within {distance_meters:.0} meters of \
			({:.4}, {:.4}). Guest preferences: {prefs}.\n\
			Respond with a JSON object: {{\"points_of_interest\": [...]}} where each \
			entry has the usual POI fields; category must be \"Hotel\".",
			coords.latitude, coords.longitude
		),
		0.4,
		1536,
	)
}

/// Restaurant search near a point.
pub fn restaurant_by_preference(city: &str, coords: Coordinates) -> RenderedPrompt {
	base(
		PromptKind::RestaurantByPreference,
		format!(
			"Suggest restaurants near ({:.4}, {:.4}) in \"{city}\".\n\
			Respond with a JSON object: {{\"points_of_interest\": [...]}} where each \
			entry has the usual POI fields; category must be \"Restaurant\".",
			coords.latitude, coords.longitude
		),
		0.5,
		1536,
	)
}

/// Wide discovery fallback when the store has nothing in radius.
pub fn nearby_poi_by_radius(
	center: Coordinates,
	radius_meters: f64,
	filters: &PoiFilters,
) -> RenderedPrompt {
	let mut constraints = Vec::new();
	if let Some(cat) = filters.category {
		constraints.push(format!("category {cat}"));
	}
	if let Some(price) = filters.price_range {
		constraints.push(format!("price range {price}"));
	}
	if let Some(min) = filters.min_rating {
		constraints.push(format!("rating at least {min}"));
	}
	let constraint_line = if constraints.is_empty() {
		String::new()
	} else {
		format!("Only include places matching: {}.\n", constraints.join("; "))
	};
	base(
		PromptKind::NearbyPoiByRadius,
		format!(
			"List real points of interest within {radius_meters:.0} meters of \
			({:.5}, {:.5}).\n{constraint_line}\
			Respond with a JSON object: {{\"points_of_interest\": [...]}} with the \
			usual POI fields including accurate latitude and longitude.",
			center.latitude, center.longitude
		),
		0.4,
		2048,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::{BudgetLevel, Pace, TimeOfDay, TransportMode};
	use crate::models::preferences::PreferenceProfile;

	#[test]
	fn itinerary_prompt_inlines_preferences_and_location() {
		let ctx = UserContext {
			account_id: 1,
			profile: PreferenceProfile {
				id: 1,
				account_id: 1,
				profile_name: String::from("default"),
				is_default: true,
				search_radius_meters: 3000.0,
				preferred_time: TimeOfDay::Evening,
				pace: Pace::Relaxed,
				budget: BudgetLevel::Moderate,
				accessible: false,
				outdoor_seating: false,
				dog_friendly: true,
				transport: TransportMode::Walk,
				vibes: vec![],
				dietary_needs: vec![],
			},
			interests: vec![String::from("architecture")],
			tags: vec![],
		};
		let p = personalized_itinerary(
			"Barcelona",
			&ctx,
			Some(Coordinates {
				latitude: 41.3851,
				longitude: 2.1734,
			}),
		);
		assert_eq!(p.kind, PromptKind::PersonalizedItinerary);
		assert!(p.user.contains("Barcelona"));
		assert!(p.user.contains("41.3851"));
		assert!(p.user.contains("Interests: architecture"));
	}

	#[test]
	fn nearby_prompt_mentions_active_filters_only() {
		let filters = PoiFilters::from_parts(Some("Museum"), None, None);
		let p = nearby_poi_by_radius(
			Coordinates {
				latitude: 48.8566,
				longitude: 2.3522,
			},
			1000.0,
			&filters,
		);
		assert!(p.user.contains("category Museum"));
		assert!(!p.user.contains("price range"));
	}

	#[test]
	fn templates_cap_output_tokens() {
		assert!(general_city("Paris").config.max_tokens <= 1024);
		assert!(general_pois("Paris", 5).user.contains("5 points of interest"));
	}
}
