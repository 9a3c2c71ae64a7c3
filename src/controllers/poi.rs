/*
 * src/controllers/poi.rs
 *
 * File for POI Controller API Endpoints
 *
 * Purpose:
 *   Serve nearby / detail / hotel / restaurant searches. The store answers
 *   first; the model fills in only when the store is empty.
 *
 * Include:
 *   api_pois_by_distance  - GET  /api/pois/by-distance      -> nearby POIs
 *   api_poi_details       - POST /api/pois/details          -> enriched POI by coordinate
 *   api_hotels            - POST /api/hotels/by-preference  -> hotel search
 *   api_restaurants       - GET  /api/restaurants/nearby    -> restaurant search
 */

use std::sync::Arc;

use axum::{
	Extension, Json,
	extract::Query,
	routing::{get, post},
};
use tracing::info;
use utoipa::OpenApi;

use crate::{
	controllers::AxumRouter,
	error::ApiResult,
	geo::Coordinates,
	global::WIDE_RADIUS_METERS,
	http_models::poi::{
		ByDistanceQuery, HotelsRequest, PoiDetailsRequest, PoiDetailsResponse, PoiListResponse,
		RestaurantsQuery,
	},
	middleware::{AuthUser, middleware_auth},
	models::poi::PoiFilters,
	orchestrator::Orchestrator,
	swagger::SecurityAddon,
};

#[derive(OpenApi)]
#[openapi(
	paths(api_pois_by_distance, api_poi_details, api_hotels, api_restaurants),
	modifiers(&SecurityAddon),
	security(("set-cookie"=[])),
	info(
		title="POI Routes",
		description = "API endpoints for store-first point-of-interest search."
	),
	tags((name="POIs"))
)]
pub struct PoiApiDoc;

/// Find POIs near a coordinate, ascending by distance.
///
/// # Method
/// `GET /api/pois/by-distance?lat=48.8566&lon=2.3522&distance=1000&category=Museum`
///
/// # Responses
/// - `200 OK` - [PoiListResponse]; entries carry `distance_meters`
/// - `400 BAD_REQUEST` - Out-of-bounds coordinates or non-positive distance
/// - `401 UNAUTHORIZED` - Authentication failed (handled in middleware)
/// - `502 BAD_GATEWAY` - Store was empty and the model fallback failed
///
/// # Examples
/// ```bash
/// curl -X GET "http://localhost:3001/api/pois/by-distance?lat=48.8566&lon=2.3522&distance=1000&category=Museum"
/// ```
#[utoipa::path(
	get,
	path="/by-distance",
	summary="Nearby POIs ascending by distance",
	description="Serves from the geospatial store when it has matches in radius; otherwise falls back to model discovery, re-checks every distance, and persists the finds in the background. Unknown filter values are ignored.",
	params(ByDistanceQuery),
	responses(
		(
			status=200,
			description="POIs in radius, ascending by distance",
			body=PoiListResponse,
			content_type="application/json",
			example=json!({
				"points_of_interest": [
					{"id": 31, "name": "Musee des Arts", "category": "Museum", "latitude": 48.8575, "longitude": 2.3530, "rating": 4.6, "distance_meters": 120.4},
					{"id": 9, "name": "Petit Musee", "category": "Museum", "latitude": 48.8590, "longitude": 2.3511, "rating": 4.1, "distance_meters": 287.9}
				]
			})
		),
		(status=400, description="Bad coordinates or distance"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=502, description="Model fallback failed")
	),
	security(("set-cookie"=[])),
	tag="POIs"
)]
pub async fn api_pois_by_distance(
	Extension(user): Extension<AuthUser>,
	Extension(orchestrator): Extension<Arc<Orchestrator>>,
	Query(query): Query<ByDistanceQuery>,
) -> ApiResult<Json<PoiListResponse>> {
	let center = Coordinates::checked(query.lat, query.lon)?;
	if !query.distance.is_finite() || query.distance <= 0.0 {
		return Err(crate::error::AppError::validation("distance must be positive"));
	}
	let filters = PoiFilters::from_parts(
		query.category.as_deref(),
		query.price_range.as_deref(),
		query.min_rating,
	);
	let response = orchestrator
		.pois_by_distance(user.id, center, query.distance, filters)
		.await?;
	Ok(Json(response))
}

/// Identify and enrich the POI at a pinned coordinate.
///
/// # Method
/// `POST /api/pois/details`
///
/// # Request Body
/// - [PoiDetailsRequest] - `{ "city": "Paris", "lat": 48.8606, "lon": 2.3376 }`
///
/// # Responses
/// - `200 OK` - [PoiDetailsResponse]
/// - `400 BAD_REQUEST` / `401 UNAUTHORIZED` / `502 BAD_GATEWAY`
///
/// # Examples
/// ```bash
/// curl -X POST http://localhost:3001/api/pois/details
///   -H "Content-Type: application/json"
///   -d '{ "city": "Paris", "lat": 48.8606, "lon": 2.3376 }'
/// ```
#[utoipa::path(
	post,
	path="/details",
	summary="Enriched POI by coordinate",
	description="Matches the coordinate against stored POIs within tolerance; on a miss the model identifies the place and the result is persisted in the background.",
	request_body(content=PoiDetailsRequest, content_type="application/json"),
	responses(
		(status=200, description="POI details", body=PoiDetailsResponse, content_type="application/json"),
		(status=400, description="Bad coordinates"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=502, description="Model lookup failed")
	),
	security(("set-cookie"=[])),
	tag="POIs"
)]
pub async fn api_poi_details(
	Extension(user): Extension<AuthUser>,
	Extension(orchestrator): Extension<Arc<Orchestrator>>,
	Json(PoiDetailsRequest { city, lat, lon }): Json<PoiDetailsRequest>,
) -> ApiResult<Json<PoiDetailsResponse>> {
	let point = Coordinates::checked(lat, lon)?;
	let pois = orchestrator.poi_details(user.id, &city, point).await?;
	Ok(Json(PoiDetailsResponse { pois }))
}

/// Hotel search biased by enumerated guest preferences.
///
/// # Method
/// `POST /api/hotels/by-preference`
///
/// # Request Body
/// - [HotelsRequest]; unknown preference names are rejected with 400
///
/// # Responses
/// - `200 OK` - [PoiListResponse]
/// - `400 BAD_REQUEST` / `401 UNAUTHORIZED` / `502 BAD_GATEWAY`
///
/// # Examples
/// ```bash
/// curl -X POST http://localhost:3001/api/hotels/by-preference
///   -H "Content-Type: application/json"
///   -d '{ "city": "Barcelona", "lat": 41.3851, "lon": 2.1734, "preferences": ["pool"], "distance": 2000 }'
/// ```
#[utoipa::path(
	post,
	path="/by-preference",
	summary="Hotels matching guest preferences",
	description="Sibling-table search with model fallback. Preference names come from a closed option set.",
	request_body(content=HotelsRequest, content_type="application/json"),
	responses(
		(status=200, description="Hotels found", body=PoiListResponse, content_type="application/json"),
		(status=400, description="Unknown preference or bad coordinates"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=502, description="Model fallback failed")
	),
	security(("set-cookie"=[])),
	tag="POIs"
)]
pub async fn api_hotels(
	Extension(user): Extension<AuthUser>,
	Extension(orchestrator): Extension<Arc<Orchestrator>>,
	Json(request): Json<HotelsRequest>,
) -> ApiResult<Json<PoiListResponse>> {
	request.validate()?;
	let center = Coordinates::checked(request.lat, request.lon)?;
	let radius = request.distance.unwrap_or(WIDE_RADIUS_METERS / 10.0);
	info!(user = user.id, city = %request.city, "hotel search");
	let points_of_interest = orchestrator
		.hotels_by_preference(user.id, &request.city, center, &request.preferences, radius)
		.await?;
	Ok(Json(PoiListResponse { points_of_interest }))
}

/// Restaurants near a coordinate.
///
/// # Method
/// `GET /api/restaurants/nearby?city=Barcelona&lat=41.3851&lon=2.1734`
///
/// # Responses
/// - `200 OK` - [PoiListResponse]
/// - `400 BAD_REQUEST` / `401 UNAUTHORIZED` / `502 BAD_GATEWAY`
///
/// # Examples
/// ```bash
/// curl -X GET "http://localhost:3001/api/restaurants/nearby?city=Barcelona&lat=41.3851&lon=2.1734"
/// ```
#[utoipa::path(
	get,
	path="/nearby",
	summary="Restaurants near a coordinate",
	description="Sibling-table search with model fallback.",
	params(RestaurantsQuery),
	responses(
		(status=200, description="Restaurants found", body=PoiListResponse, content_type="application/json"),
		(status=400, description="Bad coordinates"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=502, description="Model fallback failed")
	),
	security(("set-cookie"=[])),
	tag="POIs"
)]
pub async fn api_restaurants(
	Extension(user): Extension<AuthUser>,
	Extension(orchestrator): Extension<Arc<Orchestrator>>,
	Query(RestaurantsQuery { city, lat, lon }): Query<RestaurantsQuery>,
) -> ApiResult<Json<PoiListResponse>> {
	let center = Coordinates::checked(lat, lon)?;
	let points_of_interest = orchestrator.restaurants_nearby(user.id, &city, center).await?;
	Ok(Json(PoiListResponse { points_of_interest }))
}

/// Create the POI routes with authentication middleware.
///
/// # Routes
/// - `GET /by-distance` - Nearby POIs (protected), nested under `/pois`
/// - `POST /details` - Enriched POI by coordinate (protected), nested under `/pois`
///
/// # Middleware
/// All routes are protected by `middleware_auth` which validates the `auth-token` cookie.
pub fn poi_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/by-distance", get(api_pois_by_distance))
		.route("/details", post(api_poi_details))
		.route_layer(axum::middleware::from_fn(middleware_auth))
}

/// Create the hotel routes (nested under `/hotels`).
pub fn hotel_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/by-preference", post(api_hotels))
		.route_layer(axum::middleware::from_fn(middleware_auth))
}

/// Create the restaurant routes (nested under `/restaurants`).
pub fn restaurant_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/nearby", get(api_restaurants))
		.route_layer(axum::middleware::from_fn(middleware_auth))
}
