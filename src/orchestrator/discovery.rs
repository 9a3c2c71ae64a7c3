/*
 * src/orchestrator/discovery.rs
 *
 * File for the store-first discovery paths
 *
 * Purpose:
 *   Nearby / detail / hotel / restaurant lookups: the authoritative store
 *   answers when it can, the model fills in when the store is empty, and
 *   anything the model invented goes to the persistence worker afterwards.
 */

use tracing::{debug, info};

use crate::cache::fingerprint;
use crate::error::ApiResult;
use crate::geo::{Coordinates, haversine_meters, within_radius};
use crate::global::WIDE_RADIUS_METERS;
use crate::http_models::poi::PoiListResponse;
use crate::http_models::recommendation::PoiOut;
use crate::llm::prompts;
use crate::llm::schema::{PoiList, PoiSketch};
use crate::llm::RenderedPrompt;
use crate::models::interaction::{InteractionKind, NewInteraction};
use crate::models::poi::{Poi, PoiFilters};
use crate::orchestrator::fanout::Orchestrator;
use crate::orchestrator::worker::WorkerBatch;
use crate::store::poi::{self as poi_store, PoiTable};
use crate::store::{city, journal};

/// Default search radius for the restaurant route, which takes no distance.
const RESTAURANT_RADIUS_METERS: f64 = 3_000.0;

impl Orchestrator {
	/// `GET /pois/by-distance`: store first, model fallback when the store
	/// has nothing in radius. Fallback results are Haversine-filtered to the
	/// requested radius and handed to the worker as city-less rows unless a
	/// reverse lookup finds a city. Successful responses are cached.
	pub async fn pois_by_distance(
		&self,
		account_id: i32,
		center: Coordinates,
		radius_meters: f64,
		filters: PoiFilters,
	) -> ApiResult<PoiListResponse> {
		let filter_pairs = filter_pairs(&filters);
		let key = fingerprint(
			"pois/by-distance",
			None,
			Some(account_id),
			Some(center),
			Some(radius_meters),
			&filter_pairs,
		);
		if let Some(hit) = self.poi_cache.get(&key) {
			return Ok(hit);
		}

		let stored = poi_store::find_by_radius(
			&self.pool,
			PoiTable::PointsOfInterest,
			center,
			radius_meters,
			&filters,
		)
		.await?;
		if !stored.is_empty() {
			let response = PoiListResponse {
				points_of_interest: stored
					.iter()
					.map(|(poi, d)| PoiOut::from_poi(poi, Some(*d), None))
					.collect(),
			};
			self.poi_cache.put(key, response.clone());
			return Ok(response);
		}

		info!(radius_meters, "store empty in radius; falling back to model discovery");
		let pois = self
			.discover(
				prompts::nearby_poi_by_radius(center, radius_meters, &filters),
				InteractionKind::NearbyDiscovery,
				account_id,
				None,
			)
			.await?;

		// The model is not trusted on distance: re-check every coordinate.
		let mut kept: Vec<Poi> = within_radius(center, radius_meters, pois)
			.into_iter()
			.filter(|p| filters.matches(p))
			.collect();
		let response = PoiListResponse {
			points_of_interest: kept
				.iter()
				.map(|p| {
					let d = p.coordinates.map(|c| haversine_meters(center, c));
					PoiOut::from_poi(p, d, None)
				})
				.collect(),
		};

		// Reverse lookup is best-effort; unassigned stays city-less.
		let city_id = match city::resolve_by_point(&self.pool, center, WIDE_RADIUS_METERS).await {
			Ok(Some((id, _))) => Some(id),
			_ => None,
		};
		for poi in &mut kept {
			poi.city_id = city_id;
		}
		self.worker.schedule(WorkerBatch {
			table: PoiTable::PointsOfInterest,
			pois: kept,
			account_id: Some(account_id),
			city_name: None,
		});

		self.poi_cache.put(key, response.clone());
		Ok(response)
	}

	/// `POST /pois/details`: resolve the pinned coordinate against the store
	/// within tolerance, otherwise ask the model to identify the place.
	pub async fn poi_details(
		&self,
		account_id: i32,
		city_name: &str,
		point: Coordinates,
	) -> ApiResult<Vec<PoiOut>> {
		let mut city_id = None;
		self.ensure_city_id(&mut city_id, Some(point)).await;

		if let Some(hit) = poi_store::find_by_point_within_tolerance(
			&self.pool,
			PoiTable::PointsOfInterest,
			city_id,
			point,
			crate::global::POI_COORD_TOLERANCE_METERS,
		)
		.await?
		{
			debug!(name = %hit.name, "poi details served from store");
			return Ok(vec![PoiOut::from_poi(&hit, None, None)]);
		}

		let (sketches, interaction_id) = self
			.discover_sketches(
				prompts::poi_detail_by_coord(city_name, point),
				InteractionKind::PoiDetail,
				account_id,
				Some(city_name.to_string()),
			)
			.await?;
		let (enriched, misses) = self
			.enrich(PoiTable::PointsOfInterest, sketches, city_id, interaction_id)
			.await;
		self.worker.schedule(WorkerBatch {
			table: PoiTable::PointsOfInterest,
			pois: misses,
			account_id: Some(account_id),
			city_name: Some(city_name.to_string()),
		});
		Ok(enriched.iter().map(|e| e.to_out()).collect())
	}

	/// `POST /hotels/by-preference`: sibling-table search with model
	/// fallback biased by the enumerated preference options.
	pub async fn hotels_by_preference(
		&self,
		account_id: i32,
		city_name: &str,
		center: Coordinates,
		preferences: &[String],
		radius_meters: f64,
	) -> ApiResult<Vec<PoiOut>> {
		let stored =
			poi_store::find_hotels(&self.pool, center, radius_meters, &PoiFilters::default())
				.await?;
		if !stored.is_empty() {
			return Ok(stored
				.iter()
				.map(|(poi, d)| PoiOut::from_poi(poi, Some(*d), None))
				.collect());
		}

		let (sketches, interaction_id) = self
			.discover_sketches(
				prompts::hotel_by_preference(city_name, center, preferences, radius_meters),
				InteractionKind::HotelSearch,
				account_id,
				Some(city_name.to_string()),
			)
			.await?;
		let mut city_id = None;
		self.ensure_city_id(&mut city_id, Some(center)).await;
		let (enriched, misses) = self
			.enrich(PoiTable::Hotels, sketches, city_id, interaction_id)
			.await;
		self.worker.schedule(WorkerBatch {
			table: PoiTable::Hotels,
			pois: misses,
			account_id: Some(account_id),
			city_name: Some(city_name.to_string()),
		});
		Ok(enriched
			.iter()
			.map(|e| {
				let d = e.poi.coordinates.map(|c| haversine_meters(center, c));
				PoiOut::from_poi(&e.poi, d, None)
			})
			.collect())
	}

	/// `GET /restaurants/nearby`.
	pub async fn restaurants_nearby(
		&self,
		account_id: i32,
		city_name: &str,
		center: Coordinates,
	) -> ApiResult<Vec<PoiOut>> {
		let stored = poi_store::find_restaurants(
			&self.pool,
			center,
			RESTAURANT_RADIUS_METERS,
			&PoiFilters::default(),
		)
		.await?;
		if !stored.is_empty() {
			return Ok(stored
				.iter()
				.map(|(poi, d)| PoiOut::from_poi(poi, Some(*d), None))
				.collect());
		}

		let (sketches, interaction_id) = self
			.discover_sketches(
				prompts::restaurant_by_preference(city_name, center),
				InteractionKind::RestaurantSearch,
				account_id,
				Some(city_name.to_string()),
			)
			.await?;
		let mut city_id = None;
		self.ensure_city_id(&mut city_id, Some(center)).await;
		let (enriched, misses) = self
			.enrich(PoiTable::Restaurants, sketches, city_id, interaction_id)
			.await;
		self.worker.schedule(WorkerBatch {
			table: PoiTable::Restaurants,
			pois: misses,
			account_id: Some(account_id),
			city_name: Some(city_name.to_string()),
		});
		Ok(enriched
			.iter()
			.map(|e| {
				let d = e.poi.coordinates.map(|c| haversine_meters(center, c));
				PoiOut::from_poi(&e.poi, d, None)
			})
			.collect())
	}

	/// One journaled fallback round-trip returning raw sketches.
	async fn discover_sketches(
		&self,
		prompt: RenderedPrompt,
		kind: InteractionKind,
		account_id: i32,
		city_name: Option<String>,
	) -> ApiResult<(Vec<PoiSketch>, Option<i64>)> {
		let model_tag = self.gateway.model_tag();
		match self
			.gateway
			.generate_typed::<PoiList>(&prompt, self.deadlines.general_poi_stage)
			.await
		{
			Ok(trip) => {
				let interaction_id = journal::record_best_effort(
					&self.pool,
					&NewInteraction {
						account_id: Some(account_id),
						profile_id: None,
						kind,
						city_name,
						prompt_text: prompt.user,
						response_text: Some(trip.raw),
						model_tag,
						prompt_tokens: trip.prompt_tokens,
						completion_tokens: trip.completion_tokens,
						latency_ms: trip.latency_ms,
						error_tag: None,
					},
				)
				.await;
				Ok((trip.value.points_of_interest, interaction_id))
			}
			Err(failed) => {
				let _ = journal::record_best_effort(
					&self.pool,
					&NewInteraction {
						account_id: Some(account_id),
						profile_id: None,
						kind,
						city_name,
						prompt_text: prompt.user,
						response_text: failed.raw,
						model_tag,
						prompt_tokens: None,
						completion_tokens: None,
						latency_ms: failed.latency_ms,
						error_tag: Some(failed.error.tag().to_string()),
					},
				)
				.await;
				Err(failed.error.into())
			}
		}
	}

	/// Fallback discovery that keeps only usable, bounds-checked POIs.
	async fn discover(
		&self,
		prompt: RenderedPrompt,
		kind: InteractionKind,
		account_id: i32,
		city_name: Option<String>,
	) -> ApiResult<Vec<Poi>> {
		let (sketches, interaction_id) = self
			.discover_sketches(prompt, kind, account_id, city_name)
			.await?;
		Ok(sketches
			.into_iter()
			.filter_map(|s| s.into_poi(None, interaction_id))
			.collect())
	}
}

fn filter_pairs(filters: &PoiFilters) -> Vec<(&'static str, String)> {
	let mut pairs = Vec::new();
	if let Some(c) = filters.category {
		pairs.push(("category", c.as_str().to_string()));
	}
	if let Some(p) = filters.price_range {
		pairs.push(("price_range", p.as_str().to_string()));
	}
	if let Some(r) = filters.min_rating {
		pairs.push(("min_rating", format!("{r}")));
	}
	pairs
}

