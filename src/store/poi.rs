/*
 * src/store/poi.rs
 *
 * File for the POI store gateway
 *
 * Purpose:
 *   Persistence and geodesic queries for points of interest and the hotel /
 *   restaurant sibling tables. Uniqueness is (city_id, normalized_name)
 *   with NULLS NOT DISTINCT, so concurrent inserts of the same place
 *   collapse into one row instead of erroring.
 */

use pgvector::Vector;
use sqlx::PgPool;
use tracing::debug;

use crate::error::ApiResult;
use crate::geo::Coordinates;
use crate::models::poi::{Poi, PoiFilters};
use crate::sql_models::poi::{PoiDistanceRow, PoiRow};

/// The three mirror tables sharing the POI shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiTable {
	PointsOfInterest,
	Hotels,
	Restaurants,
}

impl PoiTable {
	fn name(&self) -> &'static str {
		match self {
			PoiTable::PointsOfInterest => "points_of_interest",
			PoiTable::Hotels => "hotels",
			PoiTable::Restaurants => "restaurants",
		}
	}
}

const COLUMNS: &str = "id, city_id, name, description, category, latitude, longitude, \
	address, phone, website, opening_hours, price_range, rating, tags, images, \
	source_interaction_id, created_at, updated_at";

/// Exact lookup under case-insensitive, trimmed comparison. Index-backed via
/// the stored `normalized_name` column.
pub async fn find_by_name_in_city(
	pool: &PgPool,
	table: PoiTable,
	city_id: i32,
	name: &str,
) -> ApiResult<Option<Poi>> {
	let sql = format!(
		"SELECT {COLUMNS} FROM {table} WHERE city_id = $1 AND normalized_name = $2",
		table = table.name()
	);
	let row = sqlx::query_as::<_, PoiRow>(&sql)
		.bind(city_id)
		.bind(name.trim().to_lowercase())
		.fetch_optional(pool)
		.await?;
	Ok(row.map(Poi::from))
}

/// Geodesic radius search, ascending distance, ties by name. Filters are
/// optional; a `None` means "any".
pub async fn find_by_radius(
	pool: &PgPool,
	table: PoiTable,
	center: Coordinates,
	radius_meters: f64,
	filters: &PoiFilters,
) -> ApiResult<Vec<(Poi, f64)>> {
	let sql = format!(
		"SELECT {COLUMNS},
		   ST_Distance(geom::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography)
		     AS distance_meters
		 FROM {table}
		 WHERE geom IS NOT NULL
		   AND ST_DWithin(geom::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)
		   AND ($4::text IS NULL OR category ILIKE $4)
		   AND ($5::text IS NULL OR price_range = $5)
		   AND ($6::float8 IS NULL OR rating >= $6)
		 ORDER BY distance_meters ASC, name ASC",
		table = table.name()
	);
	let rows = sqlx::query_as::<_, PoiDistanceRow>(&sql)
		.bind(center.longitude)
		.bind(center.latitude)
		.bind(radius_meters)
		.bind(filters.category.map(|c| c.as_str().to_string()))
		.bind(filters.price_range.map(|p| p.as_str().to_string()))
		.bind(filters.min_rating)
		.fetch_all(pool)
		.await?;
	Ok(rows
		.into_iter()
		.map(|r| (Poi::from(r.poi), r.distance_meters))
		.collect())
}

/// Coordinate lookup used when the model hands back a position instead of a
/// name we know. `city_id` narrows the match when present.
pub async fn find_by_point_within_tolerance(
	pool: &PgPool,
	table: PoiTable,
	city_id: Option<i32>,
	point: Coordinates,
	tolerance_meters: f64,
) -> ApiResult<Option<Poi>> {
	let sql = format!(
		"SELECT {COLUMNS} FROM {table}
		 WHERE geom IS NOT NULL
		   AND ($4::int IS NULL OR city_id = $4)
		   AND ST_DWithin(geom::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)
		 ORDER BY ST_Distance(geom::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography)
		 LIMIT 1",
		table = table.name()
	);
	let row = sqlx::query_as::<_, PoiRow>(&sql)
		.bind(point.longitude)
		.bind(point.latitude)
		.bind(tolerance_meters)
		.bind(city_id)
		.fetch_optional(pool)
		.await?;
	Ok(row.map(Poi::from))
}

/// Insert-or-merge on (city_id, normalized_name). Existing non-null columns
/// win over the incoming row, so re-upserting with sparser data never
/// erases anything. Coordinate bounds and the non-empty name are enforced
/// before any SQL runs.
pub async fn upsert(pool: &PgPool, table: PoiTable, poi: &Poi) -> ApiResult<Poi> {
	poi.validate()?;
	let sql = format!(
		"INSERT INTO {table}
		   (city_id, name, normalized_name, description, category, latitude, longitude,
		    geom, address, phone, website, opening_hours, price_range, rating, tags,
		    images, source_interaction_id)
		 VALUES ($1, $2, $3, $4, $5, $6, $7,
		         CASE WHEN $6::float8 IS NULL OR $7::float8 IS NULL THEN NULL
		              ELSE ST_SetSRID(ST_MakePoint($7, $6), 4326) END,
		         $8, $9, $10, $11, $12, $13, $14, $15, $16)
		 ON CONFLICT (city_id, normalized_name) DO UPDATE SET
		   description = COALESCE({table}.description, EXCLUDED.description),
		   category = COALESCE({table}.category, EXCLUDED.category),
		   latitude = COALESCE({table}.latitude, EXCLUDED.latitude),
		   longitude = COALESCE({table}.longitude, EXCLUDED.longitude),
		   geom = COALESCE({table}.geom, EXCLUDED.geom),
		   address = COALESCE({table}.address, EXCLUDED.address),
		   phone = COALESCE({table}.phone, EXCLUDED.phone),
		   website = COALESCE({table}.website, EXCLUDED.website),
		   opening_hours = COALESCE({table}.opening_hours, EXCLUDED.opening_hours),
		   price_range = COALESCE({table}.price_range, EXCLUDED.price_range),
		   rating = COALESCE({table}.rating, EXCLUDED.rating),
		   tags = CASE WHEN cardinality({table}.tags) = 0 THEN EXCLUDED.tags ELSE {table}.tags END,
		   images = CASE WHEN cardinality({table}.images) = 0 THEN EXCLUDED.images ELSE {table}.images END
		 RETURNING {COLUMNS}",
		table = table.name()
	);
	let row = sqlx::query_as::<_, PoiRow>(&sql)
		.bind(poi.city_id)
		.bind(poi.name.trim())
		.bind(poi.normalized_name())
		.bind(&poi.description)
		.bind(&poi.category)
		.bind(poi.coordinates.map(|c| c.latitude))
		.bind(poi.coordinates.map(|c| c.longitude))
		.bind(&poi.address)
		.bind(&poi.phone)
		.bind(&poi.website)
		.bind(&poi.opening_hours)
		.bind(poi.price_range.map(|p| p.as_str().to_string()))
		.bind(poi.rating)
		.bind(&poi.tags)
		.bind(&poi.images)
		.bind(poi.source_interaction_id)
		.fetch_one(pool)
		.await?;
	debug!(table = table.name(), name = %poi.name, "upserted poi");
	Ok(Poi::from(row))
}

/// Overwrites the embedding column.
pub async fn update_embedding(
	pool: &PgPool,
	table: PoiTable,
	poi_id: i32,
	vector: Vec<f32>,
) -> ApiResult<()> {
	let sql = format!(
		"UPDATE {table} SET embedding = $1 WHERE id = $2",
		table = table.name()
	);
	sqlx::query(&sql)
		.bind(Vector::from(vector))
		.bind(poi_id)
		.execute(pool)
		.await?;
	Ok(())
}

/// Hotels mirror the POI shape in their own table.
pub async fn find_hotels(
	pool: &PgPool,
	center: Coordinates,
	radius_meters: f64,
	filters: &PoiFilters,
) -> ApiResult<Vec<(Poi, f64)>> {
	find_by_radius(pool, PoiTable::Hotels, center, radius_meters, filters).await
}

/// Restaurants mirror the POI shape in their own table.
pub async fn find_restaurants(
	pool: &PgPool,
	center: Coordinates,
	radius_meters: f64,
	filters: &PoiFilters,
) -> ApiResult<Vec<(Poi, f64)>> {
	find_by_radius(pool, PoiTable::Restaurants, center, radius_meters, filters).await
}
