/*
 * src/controllers/itinerary.rs
 *
 * File for Itinerary Controller API Endpoints
 *
 * Purpose:
 *   Owner-scoped CRUD for bookmarked itineraries plus favorite POIs.
 *
 * Include:
 *   api_list_itineraries  - GET    /api/itineraries       -> list bookmarks
 *   api_get_itinerary     - GET    /api/itineraries/{id}  -> one bookmark
 *   api_save_itinerary    - POST   /api/itineraries       -> save a bookmark
 *   api_update_itinerary  - PUT    /api/itineraries/{id}  -> rename/retag
 *   api_delete_itinerary  - DELETE /api/itineraries/{id}  -> delete
 *   api_add_favorite      - POST   /api/favorites         -> favorite a POI
 *   api_remove_favorite   - DELETE /api/favorites/{poi_id}-> unfavorite
 *   api_list_favorites    - GET    /api/favorites         -> favorite POIs
 */

use axum::{
	Extension, Json,
	extract::Path,
	http::StatusCode,
	routing::{delete, get},
};
use sqlx::PgPool;
use tracing::info;
use utoipa::OpenApi;

use crate::{
	controllers::AxumRouter,
	error::ApiResult,
	http_models::{
		itinerary::{
			FavoriteRequest, FavoritesResponse, ItinerariesResponse, SaveItineraryRequest,
			UpdateItineraryRequest,
		},
		recommendation::PoiOut,
	},
	middleware::{AuthUser, middleware_auth},
	models::itinerary::SavedItinerary,
	store,
	swagger::SecurityAddon,
};

#[derive(OpenApi)]
#[openapi(
	paths(
		api_list_itineraries,
		api_get_itinerary,
		api_save_itinerary,
		api_update_itinerary,
		api_delete_itinerary
	),
	modifiers(&SecurityAddon),
	security(("set-cookie"=[])),
	info(
		title="Itinerary Routes",
		description = "API endpoints for saved itineraries."
	),
	tags((name="Itineraries"))
)]
pub struct ItineraryApiDoc;

#[derive(OpenApi)]
#[openapi(
	paths(api_add_favorite, api_remove_favorite, api_list_favorites),
	modifiers(&SecurityAddon),
	security(("set-cookie"=[])),
	info(
		title="Favorite Routes",
		description = "API endpoints for favorite POIs."
	),
	tags((name="Favorites"))
)]
pub struct FavoriteApiDoc;

/// List this user's saved itineraries, most recently updated first.
#[utoipa::path(
	get,
	path="/",
	summary="List saved itineraries",
	responses(
		(status=200, description="Saved itineraries", body=ItinerariesResponse, content_type="application/json"),
		(status=401, description="User has an invalid cookie/no cookie")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_list_itineraries(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
) -> ApiResult<Json<ItinerariesResponse>> {
	Ok(Json(ItinerariesResponse {
		itineraries: store::itinerary::list_for_account(&pool, user.id).await?,
	}))
}

/// Fetch one saved itinerary by id.
#[utoipa::path(
	get,
	path="/{id}",
	summary="Fetch a saved itinerary",
	params(("id" = i32, Path, description = "Itinerary id")),
	responses(
		(status=200, description="The itinerary", body=SavedItinerary, content_type="application/json"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Not found for this user")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_get_itinerary(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Path(id): Path<i32>,
) -> ApiResult<Json<SavedItinerary>> {
	Ok(Json(store::itinerary::get(&pool, user.id, id).await?))
}

/// Save (bookmark) a generated itinerary.
///
/// # Method
/// `POST /api/itineraries`
///
/// # Responses
/// - `201 CREATED` - `{ "id": <new id> }`
/// - `400 BAD_REQUEST` - Empty title or unknown field (public error)
/// - `409 CONFLICT` - Duplicate title for this user (public error)
///
/// # Examples
/// ```bash
/// curl -X POST http://localhost:3001/api/itineraries
///   -H "Content-Type: application/json"
///   -d '{
///         "title": "An afternoon in Barcelona",
///         "items": [{"poi_id": 12, "name": "Old Cathedral", "reason": "anchors the old town"}],
///         "source_interaction_id": 87
///       }'
/// ```
#[utoipa::path(
	post,
	path="/",
	summary="Save an itinerary bookmark",
	request_body(content=SaveItineraryRequest, content_type="application/json"),
	responses(
		(status=201, description="Created"),
		(status=400, description="Validation failure"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=409, description="Title already in use")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_save_itinerary(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Json(request): Json<SaveItineraryRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
	let id = store::itinerary::insert(&pool, user.id, &request).await?;
	info!(user = user.id, id, "itinerary saved");
	Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Update title, description, tags, or visibility of a bookmark.
#[utoipa::path(
	put,
	path="/{id}",
	summary="Update a saved itinerary",
	params(("id" = i32, Path, description = "Itinerary id")),
	request_body(content=UpdateItineraryRequest, content_type="application/json"),
	responses(
		(status=200, description="Updated"),
		(status=400, description="Validation failure"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Not found for this user"),
		(status=409, description="Title already in use")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_update_itinerary(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Path(id): Path<i32>,
	Json(request): Json<UpdateItineraryRequest>,
) -> ApiResult<()> {
	store::itinerary::update(&pool, user.id, id, &request).await
}

/// Delete a bookmark. The POIs it references stay.
#[utoipa::path(
	delete,
	path="/{id}",
	summary="Delete a saved itinerary",
	params(("id" = i32, Path, description = "Itinerary id")),
	responses(
		(status=200, description="Deleted"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Not found for this user")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_delete_itinerary(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Path(id): Path<i32>,
) -> ApiResult<()> {
	store::itinerary::delete(&pool, user.id, id).await
}

/// Favorite a POI (idempotent).
#[utoipa::path(
	post,
	path="/",
	summary="Favorite a POI",
	request_body(content=FavoriteRequest, content_type="application/json"),
	responses(
		(status=200, description="Favorited"),
		(status=401, description="User has an invalid cookie/no cookie")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_add_favorite(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Json(FavoriteRequest { poi_id }): Json<FavoriteRequest>,
) -> ApiResult<()> {
	store::itinerary::add_favorite(&pool, user.id, poi_id).await
}

/// Remove a favorite (idempotent).
#[utoipa::path(
	delete,
	path="/{poi_id}",
	summary="Unfavorite a POI",
	params(("poi_id" = i32, Path, description = "POI id")),
	responses(
		(status=200, description="Removed"),
		(status=401, description="User has an invalid cookie/no cookie")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_remove_favorite(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Path(poi_id): Path<i32>,
) -> ApiResult<()> {
	store::itinerary::remove_favorite(&pool, user.id, poi_id).await
}

/// List this user's favorite POIs, newest first.
#[utoipa::path(
	get,
	path="/",
	summary="List favorite POIs",
	responses(
		(status=200, description="Favorites", body=FavoritesResponse, content_type="application/json"),
		(status=401, description="User has an invalid cookie/no cookie")
	),
	security(("set-cookie"=[])),
	tag="Itineraries"
)]
pub async fn api_list_favorites(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
) -> ApiResult<Json<FavoritesResponse>> {
	let favorites = store::itinerary::list_favorites(&pool, user.id).await?;
	Ok(Json(FavoritesResponse {
		points_of_interest: favorites
			.iter()
			.map(|p| PoiOut::from_poi(p, None, None))
			.collect(),
	}))
}

/// Create the itinerary routes with authentication middleware.
///
/// # Routes
/// - `GET /` + `POST /` + `GET /{id}` + `PUT /{id}` + `DELETE /{id}` (protected)
///
/// # Middleware
/// All routes are protected by `middleware_auth` which validates the `auth-token` cookie.
pub fn itinerary_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/", get(api_list_itineraries).post(api_save_itinerary))
		.route(
			"/{id}",
			get(api_get_itinerary)
				.put(api_update_itinerary)
				.delete(api_delete_itinerary),
		)
		.route_layer(axum::middleware::from_fn(middleware_auth))
}

/// Create the favorites routes (nested under `/favorites`).
pub fn favorite_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/", get(api_list_favorites).post(api_add_favorite))
		.route("/{poi_id}", delete(api_remove_favorite))
		.route_layer(axum::middleware::from_fn(middleware_auth))
}
