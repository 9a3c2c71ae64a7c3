/*
 * src/store/city.rs
 *
 * File for the city resolver
 *
 * Purpose:
 *   Maps (name, country) or a raw coordinate to a stable city id, creating
 *   rows lazily. Idempotent under concurrent callers: uniqueness lives on
 *   (normalized_name, country_key) and insert races collapse to the winner.
 */

use sqlx::PgPool;
use tracing::debug;

use crate::error::ApiResult;
use crate::geo::Coordinates;
use crate::models::city::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCity {
	pub id: i32,
	pub created: bool,
}

/// Resolves a city id, inserting on first use. Case-insensitive, trimmed
/// comparison on both name and country.
pub async fn resolve(
	pool: &PgPool,
	name: &str,
	country: &str,
	summary: Option<&str>,
	center: Option<Coordinates>,
) -> ApiResult<ResolvedCity> {
	let normalized = normalize_name(name);
	let country_key = normalize_name(country);

	if let Some((id,)) = sqlx::query_as::<_, (i32,)>(
		"SELECT id FROM cities WHERE normalized_name = $1 AND country_key = $2",
	)
	.bind(&normalized)
	.bind(&country_key)
	.fetch_optional(pool)
	.await?
	{
		return Ok(ResolvedCity { id, created: false });
	}

	// Insert racing against identical callers: DO NOTHING plus a re-select
	// keeps the operation idempotent.
	let inserted = sqlx::query_as::<_, (i32,)>(
		"INSERT INTO cities (name, normalized_name, country, country_key, summary, center_lat, center_lon)
		 VALUES ($1, $2, $3, $4, $5, $6, $7)
		 ON CONFLICT (normalized_name, country_key) DO NOTHING
		 RETURNING id",
	)
	.bind(name.trim())
	.bind(&normalized)
	.bind(country.trim())
	.bind(&country_key)
	.bind(summary)
	.bind(center.map(|c| c.latitude))
	.bind(center.map(|c| c.longitude))
	.fetch_optional(pool)
	.await?;

	match inserted {
		Some((id,)) => {
			debug!(city = name, country, id, "created city");
			Ok(ResolvedCity { id, created: true })
		}
		None => {
			// Lost the race; the row exists now.
			let (id,) = sqlx::query_as::<_, (i32,)>(
				"SELECT id FROM cities WHERE normalized_name = $1 AND country_key = $2",
			)
			.bind(&normalized)
			.bind(&country_key)
			.fetch_one(pool)
			.await?;
			Ok(ResolvedCity { id, created: false })
		}
	}
}

/// Best-effort reverse lookup: the nearest known city center within
/// `max_distance_meters`. `None` means unassigned, which wide-radius
/// discovery treats as a legitimate answer.
pub async fn resolve_by_point(
	pool: &PgPool,
	point: Coordinates,
	max_distance_meters: f64,
) -> ApiResult<Option<(i32, String)>> {
	let row = sqlx::query_as::<_, (i32, String)>(
		"SELECT id, name FROM cities
		 WHERE center_lat IS NOT NULL AND center_lon IS NOT NULL
		   AND ST_DWithin(
		     ST_SetSRID(ST_MakePoint(center_lon, center_lat), 4326)::geography,
		     ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
		     $3)
		 ORDER BY ST_Distance(
		     ST_SetSRID(ST_MakePoint(center_lon, center_lat), 4326)::geography,
		     ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography)
		 LIMIT 1",
	)
	.bind(point.longitude)
	.bind(point.latitude)
	.bind(max_distance_meters)
	.fetch_optional(pool)
	.await?;
	Ok(row)
}
