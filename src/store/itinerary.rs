/*
 * src/store/itinerary.rs
 *
 * File for saved itineraries and favorites
 *
 * Purpose:
 *   Owner-scoped CRUD for bookmarked itineraries and the set-like favorite
 *   POIs. Titles are unique per account; deleting an itinerary leaves its
 *   POIs alone.
 */

use sqlx::PgPool;

use crate::error::{ApiResult, AppError, PublicError};
use crate::http_models::itinerary::{SaveItineraryRequest, UpdateItineraryRequest};
use crate::models::itinerary::SavedItinerary;
use crate::models::poi::Poi;
use crate::sql_models::itinerary::{ItineraryItemRow, SavedItineraryRow};
use crate::sql_models::poi::PoiRow;

const ROW_COLUMNS: &str = "id, account_id, title, description, tags, \
	estimated_duration_minutes, estimated_cost, visibility, source_interaction_id, \
	created_at, updated_at";

async fn items_for(pool: &PgPool, itinerary_id: i32) -> ApiResult<Vec<ItineraryItemRow>> {
	let items = sqlx::query_as::<_, ItineraryItemRow>(
		"SELECT poi_id, name, reason, position FROM user_saved_itinerary_items
		 WHERE itinerary_id = $1 ORDER BY position ASC",
	)
	.bind(itinerary_id)
	.fetch_all(pool)
	.await?;
	Ok(items)
}

pub async fn list_for_account(pool: &PgPool, account_id: i32) -> ApiResult<Vec<SavedItinerary>> {
	let sql = format!(
		"SELECT {ROW_COLUMNS} FROM user_saved_itineraries
		 WHERE account_id = $1 ORDER BY updated_at DESC"
	);
	let rows = sqlx::query_as::<_, SavedItineraryRow>(&sql)
		.bind(account_id)
		.fetch_all(pool)
		.await?;
	let mut out = Vec::with_capacity(rows.len());
	for row in rows {
		let items = items_for(pool, row.id).await?;
		out.push(row.into_model(items));
	}
	Ok(out)
}

pub async fn get(pool: &PgPool, account_id: i32, id: i32) -> ApiResult<SavedItinerary> {
	let sql = format!(
		"SELECT {ROW_COLUMNS} FROM user_saved_itineraries WHERE id = $1 AND account_id = $2"
	);
	let row = sqlx::query_as::<_, SavedItineraryRow>(&sql)
		.bind(id)
		.bind(account_id)
		.fetch_optional(pool)
		.await?
		.ok_or(AppError::Public(PublicError::NotFound))?;
	let items = items_for(pool, row.id).await?;
	Ok(row.into_model(items))
}

/// Saves a bookmark snapshot. A duplicate title for the same account
/// surfaces as Conflict rather than being silently merged.
pub async fn insert(
	pool: &PgPool,
	account_id: i32,
	req: &SaveItineraryRequest,
) -> ApiResult<i32> {
	if req.title.trim().is_empty() {
		return Err(PublicError::Validation(String::from("title must not be empty")).into());
	}

	let mut tx = pool.begin().await?;
	let inserted = sqlx::query_as::<_, (i32,)>(
		"INSERT INTO user_saved_itineraries
		   (account_id, title, description, tags, estimated_duration_minutes,
		    estimated_cost, visibility, source_interaction_id)
		 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
		 ON CONFLICT (account_id, title) DO NOTHING
		 RETURNING id",
	)
	.bind(account_id)
	.bind(req.title.trim())
	.bind(&req.description)
	.bind(&req.tags)
	.bind(req.estimated_duration_minutes)
	.bind(req.estimated_cost)
	.bind(req.visibility.as_str())
	.bind(req.source_interaction_id)
	.fetch_optional(&mut *tx)
	.await?;

	let id = match inserted {
		Some((id,)) => id,
		None => {
			return Err(AppError::Public(PublicError::Conflict(format!(
				"an itinerary titled '{}' already exists",
				req.title.trim()
			))));
		}
	};

	for (position, item) in req.items.iter().enumerate() {
		sqlx::query(
			"INSERT INTO user_saved_itinerary_items (itinerary_id, poi_id, name, reason, position)
			 VALUES ($1, $2, $3, $4, $5)",
		)
		.bind(id)
		.bind(item.poi_id)
		.bind(&item.name)
		.bind(&item.reason)
		.bind(position as i32)
		.execute(&mut *tx)
		.await?;
	}
	tx.commit().await?;
	Ok(id)
}

pub async fn update(
	pool: &PgPool,
	account_id: i32,
	id: i32,
	req: &UpdateItineraryRequest,
) -> ApiResult<()> {
	if let Some(title) = &req.title {
		if title.trim().is_empty() {
			return Err(PublicError::Validation(String::from("title must not be empty")).into());
		}
	}
	let result = sqlx::query(
		"UPDATE user_saved_itineraries SET
		   title = COALESCE($3, title),
		   description = COALESCE($4, description),
		   tags = COALESCE($5, tags),
		   visibility = COALESCE($6, visibility)
		 WHERE id = $1 AND account_id = $2",
	)
	.bind(id)
	.bind(account_id)
	.bind(req.title.as_ref().map(|t| t.trim().to_string()))
	.bind(&req.description)
	.bind(&req.tags)
	.bind(req.visibility.map(|v| v.as_str().to_string()))
	.execute(pool)
	.await
	.map_err(|e| {
		let unique = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
		if unique {
			AppError::Public(PublicError::Conflict(String::from(
				"itinerary title already exists",
			)))
		} else {
			AppError::from(e)
		}
	})?;
	if result.rows_affected() == 0 {
		return Err(AppError::Public(PublicError::NotFound));
	}
	Ok(())
}

/// Deletes the snapshot and its item rows. POIs are untouched.
pub async fn delete(pool: &PgPool, account_id: i32, id: i32) -> ApiResult<()> {
	let result = sqlx::query(
		"DELETE FROM user_saved_itineraries WHERE id = $1 AND account_id = $2",
	)
	.bind(id)
	.bind(account_id)
	.execute(pool)
	.await?;
	if result.rows_affected() == 0 {
		return Err(AppError::Public(PublicError::NotFound));
	}
	Ok(())
}

pub async fn add_favorite(pool: &PgPool, account_id: i32, poi_id: i32) -> ApiResult<()> {
	sqlx::query(
		"INSERT INTO user_favorite_pois (account_id, poi_id)
		 VALUES ($1, $2) ON CONFLICT DO NOTHING",
	)
	.bind(account_id)
	.bind(poi_id)
	.execute(pool)
	.await?;
	Ok(())
}

pub async fn remove_favorite(pool: &PgPool, account_id: i32, poi_id: i32) -> ApiResult<()> {
	sqlx::query("DELETE FROM user_favorite_pois WHERE account_id = $1 AND poi_id = $2")
		.bind(account_id)
		.bind(poi_id)
		.execute(pool)
		.await?;
	Ok(())
}

pub async fn list_favorites(pool: &PgPool, account_id: i32) -> ApiResult<Vec<Poi>> {
	let rows = sqlx::query_as::<_, PoiRow>(
		"SELECT p.id, p.city_id, p.name, p.description, p.category, p.latitude,
		        p.longitude, p.address, p.phone, p.website, p.opening_hours,
		        p.price_range, p.rating, p.tags, p.images, p.source_interaction_id,
		        p.created_at, p.updated_at
		 FROM user_favorite_pois f
		 JOIN points_of_interest p ON p.id = f.poi_id
		 WHERE f.account_id = $1
		 ORDER BY f.created_at DESC",
	)
	.bind(account_id)
	.fetch_all(pool)
	.await?;
	Ok(rows.into_iter().map(Poi::from).collect())
}
