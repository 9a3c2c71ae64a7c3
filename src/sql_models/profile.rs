use sqlx::FromRow;

use crate::models::preferences::{PreferenceProfile, ProfileTag};
use crate::models::{BudgetLevel, Pace, TimeOfDay, TransportMode};

#[derive(Debug, FromRow)]
pub struct ProfileRow {
	pub id: i32,
	pub account_id: i32,
	pub profile_name: String,
	pub is_default: bool,
	pub search_radius_meters: f64,
	pub preferred_time: String,
	pub pace: String,
	pub budget: String,
	pub accessible: bool,
	pub outdoor_seating: bool,
	pub dog_friendly: bool,
	pub transport: String,
	pub vibes: Vec<String>,
	pub dietary_needs: Vec<String>,
}

impl From<ProfileRow> for PreferenceProfile {
	fn from(row: ProfileRow) -> Self {
		// Option columns are constrained by CHECKs in the schema; anything
		// unparseable degrades to the neutral variant instead of failing the
		// whole request.
		PreferenceProfile {
			id: row.id,
			account_id: row.account_id,
			profile_name: row.profile_name,
			is_default: row.is_default,
			search_radius_meters: row.search_radius_meters,
			preferred_time: row.preferred_time.parse().unwrap_or(TimeOfDay::Any),
			pace: row.pace.parse().unwrap_or(Pace::Moderate),
			budget: row.budget.parse().unwrap_or(BudgetLevel::Moderate),
			accessible: row.accessible,
			outdoor_seating: row.outdoor_seating,
			dog_friendly: row.dog_friendly,
			transport: row.transport.parse().unwrap_or(TransportMode::Walk),
			vibes: row.vibes,
			dietary_needs: row.dietary_needs,
		}
	}
}

#[derive(Debug, FromRow)]
pub struct InterestRow {
	pub name: String,
	pub position: i32,
}

#[derive(Debug, FromRow)]
pub struct TagRow {
	pub name: String,
	pub detail: Option<String>,
}

impl From<TagRow> for ProfileTag {
	fn from(row: TagRow) -> Self {
		ProfileTag {
			name: row.name,
			detail: row.detail,
		}
	}
}
