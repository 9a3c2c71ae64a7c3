/*
 * src/models/preferences.rs
 *
 * File for preference profiles and the assembled prompt context
 *
 * Purpose:
 *   The per-user preference profile is a closed record: every option is an
 *   enumerated type, and payloads carrying one deny unknown fields so that
 *   nothing un-modeled leaks into a prompt.
 */

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{BudgetLevel, Pace, TimeOfDay, TransportMode};

/// A user tag in its `name[:detail]` wire form, e.g. `cuisine:thai`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProfileTag {
	pub name: String,
	pub detail: Option<String>,
}

impl ProfileTag {
	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();
		if raw.is_empty() {
			return None;
		}
		match raw.split_once(':') {
			Some((name, detail)) => Some(Self {
				name: name.trim().to_string(),
				detail: Some(detail.trim().to_string()).filter(|d| !d.is_empty()),
			}),
			None => Some(Self {
				name: raw.to_string(),
				detail: None,
			}),
		}
	}

	pub fn to_prompt_string(&self) -> String {
		match &self.detail {
			Some(detail) => format!("{}:{detail}", self.name),
			None => self.name.clone(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PreferenceProfile {
	pub id: i32,
	pub account_id: i32,
	pub profile_name: String,
	pub is_default: bool,
	pub search_radius_meters: f64,
	pub preferred_time: TimeOfDay,
	pub pace: Pace,
	pub budget: BudgetLevel,
	pub accessible: bool,
	pub outdoor_seating: bool,
	pub dog_friendly: bool,
	pub transport: TransportMode,
	pub vibes: Vec<String>,
	pub dietary_needs: Vec<String>,
}

/// Everything the personalized-itinerary prompt needs about one user,
/// assembled once per request. Opaque to the templates beyond rendering.
#[derive(Debug, Clone)]
pub struct UserContext {
	pub account_id: i32,
	pub profile: PreferenceProfile,
	/// Interest names in the user's chosen order.
	pub interests: Vec<String>,
	pub tags: Vec<ProfileTag>,
}

impl UserContext {
	/// Flat one-line-per-item rendering that the prompt templates inline.
	pub fn to_prompt_block(&self) -> String {
		let p = &self.profile;
		let mut lines = vec![
			format!("Search radius: {} m", p.search_radius_meters),
			format!("Preferred time of day: {}", p.preferred_time),
			format!("Pace: {}", p.pace),
			format!("Budget: {}", p.budget),
			format!("Transport: {}", p.transport),
			format!("Accessibility required: {}", p.accessible),
			format!("Outdoor seating: {}", p.outdoor_seating),
			format!("Dog friendly: {}", p.dog_friendly),
		];
		if !p.vibes.is_empty() {
			lines.push(format!("Vibes: {}", p.vibes.join(", ")));
		}
		if !p.dietary_needs.is_empty() {
			lines.push(format!("Dietary needs: {}", p.dietary_needs.join(", ")));
		}
		if !self.interests.is_empty() {
			lines.push(format!("Interests: {}", self.interests.join(", ")));
		}
		if !self.tags.is_empty() {
			let tags: Vec<String> = self.tags.iter().map(ProfileTag::to_prompt_string).collect();
			lines.push(format!("Tags: {}", tags.join(", ")));
		}
		lines.join("\n")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn profile() -> PreferenceProfile {
		PreferenceProfile {
			id: 1,
			account_id: 9,
			profile_name: String::from("default"),
			is_default: true,
			search_radius_meters: 5_000.0,
			preferred_time: TimeOfDay::Evening,
			pace: Pace::Relaxed,
			budget: BudgetLevel::Moderate,
			accessible: false,
			outdoor_seating: true,
			dog_friendly: false,
			transport: TransportMode::Walk,
			vibes: vec![String::from("historic")],
			dietary_needs: vec![],
		}
	}

	#[test]
	fn tag_parsing_splits_name_and_detail() {
		assert_eq!(
			ProfileTag::parse("cuisine:thai"),
			Some(ProfileTag {
				name: String::from("cuisine"),
				detail: Some(String::from("thai")),
			})
		);
		assert_eq!(
			ProfileTag::parse("vegan"),
			Some(ProfileTag {
				name: String::from("vegan"),
				detail: None,
			})
		);
		assert_eq!(ProfileTag::parse("  "), None);
	}

	#[test]
	fn unknown_profile_fields_are_rejected() {
		let raw = r#"{
			"id": 1, "account_id": 9, "profile_name": "x", "is_default": true,
			"search_radius_meters": 1000.0, "preferred_time": "evening",
			"pace": "relaxed", "budget": "moderate", "accessible": false,
			"outdoor_seating": false, "dog_friendly": false, "transport": "walk",
			"vibes": [], "dietary_needs": [],
			"favorite_color": "octarine"
		}"#;
		assert!(serde_json::from_str::<PreferenceProfile>(raw).is_err());
	}

	#[test]
	fn prompt_block_lists_interests_in_order() {
		let ctx = UserContext {
			account_id: 9,
			profile: profile(),
			interests: vec![String::from("architecture"), String::from("food")],
			tags: vec![ProfileTag::parse("cuisine:catalan").unwrap()],
		};
		let block = ctx.to_prompt_block();
		assert!(block.contains("Interests: architecture, food"));
		assert!(block.contains("Tags: cuisine:catalan"));
		assert!(block.contains("Pace: relaxed"));
	}
}
