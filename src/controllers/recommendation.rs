/*
 * src/controllers/recommendation.rs
 *
 * File for Recommendation Controller API Endpoints
 *
 * Purpose:
 *   Serve the personalized city-exploration bundle, blocking or streamed.
 *
 * Include:
 *   api_recommendations        - GET  /api/recommendations/{profile_id}        -> full bundle
 *   api_recommendations_stream - POST /api/recommendations/{profile_id}/stream -> SSE event stream
 */

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
	Extension, Json,
	extract::{Path, Query},
	http::StatusCode,
	response::sse::{Event, KeepAlive, Sse},
	routing::{get, post},
};
use futures::Stream;
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use utoipa::OpenApi;

use crate::{
	controllers::AxumRouter,
	error::ApiResult,
	geo::Coordinates,
	http_models::{
		recommendation::{RecommendationEnvelope, RecommendationQuery},
		stream::StreamRequest,
	},
	middleware::{AuthUser, middleware_auth},
	orchestrator::{Orchestrator, RecommendationRequest, StreamSession},
	swagger::SecurityAddon,
};

#[derive(OpenApi)]
#[openapi(
	paths(api_recommendations, api_recommendations_stream),
	modifiers(&SecurityAddon),
	security(("set-cookie"=[])),
	info(
		title="Recommendation Routes",
		description = "API endpoints producing the personalized exploration bundle."
	),
	tags((name="Recommendations"))
)]
pub struct RecommendationApiDoc;

fn location_from(lat: Option<f64>, lon: Option<f64>) -> ApiResult<Option<Coordinates>> {
	match (lat, lon) {
		(Some(lat), Some(lon)) => Ok(Some(Coordinates::checked(lat, lon)?)),
		_ => Ok(None),
	}
}

/// Produce the full recommendation bundle for one profile.
///
/// # Method
/// `GET /api/recommendations/{profile_id}?city=Barcelona&lat=41.3851&lon=2.1734`
///
/// # Responses
/// - `201 CREATED` - `{ "data": { general_city_data, points_of_interest, itinerary_response, interaction_ids } }`
/// - `400 BAD_REQUEST` - Out-of-bounds coordinates (public error)
/// - `401 UNAUTHORIZED` - Authentication failed (handled in middleware)
/// - `404 NOT_FOUND` - Profile does not exist for this user
/// - `502 BAD_GATEWAY` - The personalized stage failed upstream
/// - `504 GATEWAY_TIMEOUT` - Overall deadline exceeded
///
/// # Examples
/// ```bash
/// curl -X GET "http://localhost:3001/api/recommendations/4?city=Barcelona&lat=41.3851&lon=2.1734"
///   -H "Content-Type: application/json"
/// ```
#[utoipa::path(
	get,
	path="/{profile_id}",
	summary="Produce the personalized exploration bundle",
	description="Runs the three model stages, reconciles the result with stored POIs, and returns the merged bundle sorted by distance from the caller.",
	params(
		("profile_id" = i32, Path, description = "Preference profile id"),
		RecommendationQuery
	),
	responses(
		(
			status=201,
			description="Bundle produced",
			body=RecommendationEnvelope,
			content_type="application/json",
			example=json!({
				"data": {
					"general_city_data": {
						"city": "Barcelona",
						"country": "Spain",
						"description": "Barcelona rewards walking: markets, seafront, and late dinners.",
						"latitude": 41.3851,
						"longitude": 2.1734,
						"language": "Catalan and Spanish",
						"best_time_to_visit": "May to June"
					},
					"points_of_interest": [
						{"id": 12, "name": "Old Cathedral", "category": "Landmark", "latitude": 41.3871, "longitude": 2.1744, "distance_meters": 240.1}
					],
					"itinerary_response": {
						"name": "An afternoon in Barcelona",
						"description": "A short loop matched to the stated pace and budget.",
						"estimated_duration_minutes": 240,
						"estimated_cost": 60.0,
						"points_of_interest": [
							{"id": 12, "name": "Old Cathedral", "distance_meters": 240.1, "reason": "Anchors the old town and matches the historic vibe."}
						]
					},
					"interaction_ids": {"general_city": 101, "general_poi": 102, "itinerary": 103}
				}
			})
		),
		(status=400, description="Bad coordinates or missing city"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Profile not found for this user"),
		(status=502, description="Upstream model failure"),
		(status=504, description="Deadline exceeded")
	),
	security(("set-cookie"=[])),
	tag="Recommendations"
)]
pub async fn api_recommendations(
	Extension(user): Extension<AuthUser>,
	Extension(orchestrator): Extension<Arc<Orchestrator>>,
	Path(profile_id): Path<i32>,
	Query(RecommendationQuery { city, lat, lon }): Query<RecommendationQuery>,
) -> ApiResult<(StatusCode, Json<RecommendationEnvelope>)> {
	if city.trim().is_empty() {
		return Err(crate::error::AppError::validation("city must not be empty"));
	}
	let request = RecommendationRequest {
		account_id: user.id,
		profile_id,
		city_name: city,
		user_location: location_from(lat, lon)?,
	};

	info!(user = user.id, profile_id, city = %request.city_name, "recommendation request");
	let cancel = CancellationToken::new();
	let data = orchestrator.recommend(&request, None, &cancel).await?;
	Ok((StatusCode::CREATED, Json(RecommendationEnvelope { data })))
}

/// Produce the bundle as an incremental event stream.
///
/// # Method
/// `POST /api/recommendations/{profile_id}/stream`
///
/// # Request Body
/// - [StreamRequest] - `{ "city_name": "Paris" }` with optional `lat`/`lon`
///
/// # Responses
/// - `200 OK` - SSE stream: `start`, then `city_data` / `general_poi` /
///   `itinerary_poi` in arrival order, then exactly one of `complete` or `error`
/// - `400 BAD_REQUEST` / `401 UNAUTHORIZED` - as above
///
/// # Examples
/// ```bash
/// curl -N -X POST http://localhost:3001/api/recommendations/4/stream
///   -H "Content-Type: application/json"
///   -d '{ "city_name": "Paris" }'
/// ```
#[utoipa::path(
	post,
	path="/{profile_id}/stream",
	summary="Stream the bundle as server-sent events",
	description="Emits each pipeline stage as it resolves. The terminal event is exactly one of `complete` or `error`; client disconnect cancels the in-flight stages.",
	params(("profile_id" = i32, Path, description = "Preference profile id")),
	request_body(content=StreamRequest, content_type="application/json"),
	responses(
		(status=200, description="Ordered event stream", content_type="text/event-stream"),
		(status=400, description="Bad coordinates or missing city"),
		(status=401, description="User has an invalid cookie/no cookie")
	),
	security(("set-cookie"=[])),
	tag="Recommendations"
)]
pub async fn api_recommendations_stream(
	Extension(user): Extension<AuthUser>,
	Extension(orchestrator): Extension<Arc<Orchestrator>>,
	Path(profile_id): Path<i32>,
	Json(StreamRequest { city_name, lat, lon }): Json<StreamRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
	if city_name.trim().is_empty() {
		return Err(crate::error::AppError::validation("city_name must not be empty"));
	}
	let request = RecommendationRequest {
		account_id: user.id,
		profile_id,
		city_name,
		user_location: location_from(lat, lon)?,
	};

	let cancel = CancellationToken::new();
	let (session, publisher) = StreamSession::open(cancel.clone());
	info!(user = user.id, profile_id, session = %session.id, "stream session opened");

	tokio::spawn(async move {
		if let Err(e) = orchestrator.recommend(&request, Some(&publisher), &cancel).await {
			// Terminal error event was already emitted where possible; this
			// is only the server-side record.
			error!(session = %publisher.session_id(), "streamed recommendation failed: {e}");
			let _ = publisher.fail(e.public_message()).await;
		}
	});

	let stream = ReceiverStream::new(session.events).map(|envelope| {
		let event = Event::default()
			.id(envelope.event_id.to_string())
			.event(envelope.event.kind());
		Ok(match event.json_data(&envelope) {
			Ok(event) => event,
			Err(_) => Event::default().event("error").data("serialization failure"),
		})
	});
	Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Create the recommendation routes with authentication middleware.
///
/// # Routes
/// - `GET /{profile_id}` - Full bundle, blocking (protected)
/// - `POST /{profile_id}/stream` - Incremental SSE stream (protected)
///
/// # Middleware
/// All routes are protected by `middleware_auth` which validates the `auth-token` cookie.
pub fn recommendation_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/{profile_id}", get(api_recommendations))
		.route("/{profile_id}/stream", post(api_recommendations_stream))
		.route_layer(axum::middleware::from_fn(middleware_auth))
}
