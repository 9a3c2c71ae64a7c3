/*
 * src/store/profile.rs
 *
 * File for the preference assembler's data access
 *
 * Purpose:
 *   Gathers profile, ordered interests, and tags for (account, profile)
 *   into one UserContext. Missing profile is NotFound; missing interests
 *   are just an empty list.
 */

use sqlx::PgPool;

use crate::error::{ApiResult, AppError, PublicError};
use crate::models::preferences::{PreferenceProfile, ProfileTag, UserContext};
use crate::sql_models::profile::{InterestRow, ProfileRow, TagRow};

pub async fn user_context(
	pool: &PgPool,
	account_id: i32,
	profile_id: i32,
) -> ApiResult<UserContext> {
	let profile = sqlx::query_as::<_, ProfileRow>(
		"SELECT id, account_id, profile_name, is_default, search_radius_meters,
		        preferred_time, pace, budget, accessible, outdoor_seating,
		        dog_friendly, transport, vibes, dietary_needs
		 FROM preference_profiles
		 WHERE id = $1 AND account_id = $2",
	)
	.bind(profile_id)
	.bind(account_id)
	.fetch_optional(pool)
	.await?
	.ok_or(AppError::Public(PublicError::NotFound))?;

	let interests = sqlx::query_as::<_, InterestRow>(
		"SELECT name, position FROM profile_interests
		 WHERE profile_id = $1
		 ORDER BY position ASC",
	)
	.bind(profile_id)
	.fetch_all(pool)
	.await?;

	let tags = sqlx::query_as::<_, TagRow>(
		"SELECT name, detail FROM profile_tags WHERE profile_id = $1 ORDER BY name ASC",
	)
	.bind(profile_id)
	.fetch_all(pool)
	.await?;

	Ok(UserContext {
		account_id,
		profile: PreferenceProfile::from(profile),
		interests: interests.into_iter().map(|i| i.name).collect(),
		tags: tags.into_iter().map(ProfileTag::from).collect(),
	})
}
