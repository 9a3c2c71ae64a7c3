/*
 * src/orchestrator/fanout.rs
 *
 * File for the fan-out orchestrator
 *
 * Purpose:
 *   Runs the three LLM stages concurrently (G1 city facts, G2 general
 *   POIs, G3 personalized itinerary), enriches model output against the
 *   store, sorts spatially, and merges the bundle. Streaming mode publishes
 *   each stage as it resolves; either mode journals every round-trip.
 */

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{TtlCache, fingerprint};
use crate::config::DeadlineConfig;
use crate::error::{ApiResult, AppError, PublicError};
use crate::geo::{Coordinates, Locatable, haversine_meters, sort_by_distance, within_radius};
use crate::global::{GENERAL_POI_LIMIT, POI_COORD_TOLERANCE_METERS, WIDE_RADIUS_METERS};
use crate::http_models::poi::PoiListResponse;
use crate::http_models::recommendation::{
	InteractionIds, ItineraryResponse, PoiOut, RecommendationResponse,
};
use crate::http_models::stream::RecEvent;
use crate::llm::schema::{CityFacts, ItinerarySketch, PoiList, PoiSketch};
use crate::llm::{LlmError, LlmGateway, RenderedPrompt, prompts};
use crate::models::interaction::{InteractionKind, NewInteraction};
use crate::models::poi::Poi;
use crate::orchestrator::session::EventPublisher;
use crate::orchestrator::worker::{PersistenceWorker, WorkerBatch};
use crate::store::poi::{self as poi_store, PoiTable};
use crate::store::{city, journal, profile};

#[derive(Debug, Clone)]
pub struct RecommendationRequest {
	pub account_id: i32,
	pub profile_id: i32,
	pub city_name: String,
	pub user_location: Option<Coordinates>,
}

/// Per-request pipeline state, logged at each transition. The stage-done
/// flags form the partial order between `Dispatched` and `Enriched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
	New,
	Dispatched,
	Enriched,
	Sorted,
	Merged,
	Completed,
	Failed,
}

fn transition(state: &mut RequestState, to: RequestState) {
	debug!(target: "orchestrator_pipeline", from = ?*state, to = ?to, "request state");
	*state = to;
}

/// A POI after the store reconciliation step, still carrying the model's
/// per-item reasoning and its distance from the sort center once known.
#[derive(Debug, Clone)]
pub(crate) struct EnrichedPoi {
	pub poi: Poi,
	pub reason: Option<String>,
	pub distance_meters: Option<f64>,
}

impl Locatable for EnrichedPoi {
	fn coordinates(&self) -> Option<Coordinates> {
		self.poi.coordinates
	}

	fn sort_name(&self) -> &str {
		&self.poi.name
	}
}

impl EnrichedPoi {
	pub(crate) fn to_out(&self) -> PoiOut {
		PoiOut::from_poi(&self.poi, self.distance_meters, self.reason.clone())
	}
}

struct StageOutcome<T> {
	journal_id: Option<i64>,
	result: Result<T, LlmError>,
}

/// One LLM stage: call, then journal the round-trip whether it succeeded or
/// not. Runs as its own task under the parent deadline.
async fn run_stage<T: DeserializeOwned + Send + 'static>(
	pool: PgPool,
	gateway: Arc<LlmGateway>,
	prompt: RenderedPrompt,
	deadline: Duration,
	kind: InteractionKind,
	account_id: i32,
	profile_id: i32,
	city_name: String,
) -> StageOutcome<T> {
	info!(target: "orchestrator_pipeline", stage = kind.as_str(), "stage dispatched");
	let model_tag = gateway.model_tag();
	match gateway.generate_stitched::<T>(&prompt, deadline).await {
		Ok(trip) => {
			let journal_id = journal::record_best_effort(
				&pool,
				&NewInteraction {
					account_id: Some(account_id),
					profile_id: Some(profile_id),
					kind,
					city_name: Some(city_name),
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
			info!(
				target: "orchestrator_pipeline",
				stage = kind.as_str(),
				latency_ms = trip.latency_ms,
				"stage completed"
			);
			StageOutcome {
				journal_id,
				result: Ok(trip.value),
			}
		}
		Err(failed) => {
			let journal_id = journal::record_best_effort(
				&pool,
				&NewInteraction {
					account_id: Some(account_id),
					profile_id: Some(profile_id),
					kind,
					city_name: Some(city_name),
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
			info!(
				target: "orchestrator_pipeline",
				stage = kind.as_str(),
				error = failed.error.tag(),
				"stage failed"
			);
			StageOutcome {
				journal_id,
				result: Err(failed.error),
			}
		}
	}
}

struct AbortGuard(Vec<tokio::task::AbortHandle>);

impl Drop for AbortGuard {
	fn drop(&mut self) {
		for handle in &self.0 {
			handle.abort();
		}
	}
}

pub struct Orchestrator {
	pub(crate) pool: PgPool,
	pub(crate) gateway: Arc<LlmGateway>,
	pub(crate) worker: Arc<PersistenceWorker>,
	pub(crate) rec_cache: Arc<TtlCache<RecommendationResponse>>,
	pub(crate) poi_cache: Arc<TtlCache<PoiListResponse>>,
	pub(crate) deadlines: DeadlineConfig,
}

impl Orchestrator {
	pub fn new(
		pool: PgPool,
		gateway: Arc<LlmGateway>,
		worker: Arc<PersistenceWorker>,
		rec_cache: Arc<TtlCache<RecommendationResponse>>,
		poi_cache: Arc<TtlCache<PoiListResponse>>,
		deadlines: DeadlineConfig,
	) -> Self {
		Self {
			pool,
			gateway,
			worker,
			rec_cache,
			poi_cache,
			deadlines,
		}
	}

	fn cache_key(req: &RecommendationRequest, radius_meters: f64) -> String {
		fingerprint(
			"recommendations",
			Some(&req.city_name),
			Some(req.account_id),
			req.user_location,
			Some(radius_meters),
			&[],
		)
	}

	/// The full bundle pipeline. With a publisher this is streaming mode:
	/// stage results are published as they resolve and exactly one terminal
	/// event ends the session. Without one it blocks until the merge.
	///
	/// Failure semantics: G1/G2 failures degrade to omitted sections; a G3
	/// failure fails the request. The cache is populated only on success.
	pub async fn recommend(
		&self,
		req: &RecommendationRequest,
		publisher: Option<&EventPublisher>,
		cancel: &CancellationToken,
	) -> ApiResult<RecommendationResponse> {
		let mut state = RequestState::New;

		// C4: gather interests, tags, and the profile into prompt context.
		let ctx = profile::user_context(&self.pool, req.account_id, req.profile_id).await?;
		let radius_meters = ctx.profile.search_radius_meters;

		let key = Self::cache_key(req, radius_meters);
		if publisher.is_none() {
			if let Some(hit) = self.rec_cache.get(&key) {
				debug!(target: "orchestrator_pipeline", city = %req.city_name, "served from cache");
				return Ok(hit);
			}
		}

		if let Some(p) = publisher {
			p.emit(RecEvent::Start).await?;
		}

		transition(&mut state, RequestState::Dispatched);
		let mut g1 = tokio::spawn(run_stage::<CityFacts>(
			self.pool.clone(),
			Arc::clone(&self.gateway),
			prompts::general_city(&req.city_name),
			self.deadlines.city_stage,
			InteractionKind::GeneralCity,
			req.account_id,
			req.profile_id,
			req.city_name.clone(),
		));
		let mut g2 = tokio::spawn(run_stage::<PoiList>(
			self.pool.clone(),
			Arc::clone(&self.gateway),
			prompts::general_pois(&req.city_name, GENERAL_POI_LIMIT),
			self.deadlines.general_poi_stage,
			InteractionKind::GeneralPoi,
			req.account_id,
			req.profile_id,
			req.city_name.clone(),
		));
		let mut g3 = tokio::spawn(run_stage::<ItinerarySketch>(
			self.pool.clone(),
			Arc::clone(&self.gateway),
			prompts::personalized_itinerary(&req.city_name, &ctx, req.user_location),
			self.deadlines.itinerary_stage,
			InteractionKind::PersonalizedItinerary,
			req.account_id,
			req.profile_id,
			req.city_name.clone(),
		));
		let _abort = AbortGuard(vec![g1.abort_handle(), g2.abort_handle(), g3.abort_handle()]);

		let overall = tokio::time::sleep(self.deadlines.overall);
		tokio::pin!(overall);

		let mut ids = InteractionIds::default();
		let mut city_facts: Option<CityFacts> = None;
		let mut city_id: Option<i32> = None;
		let mut general: Vec<EnrichedPoi> = Vec::new();
		let mut itinerary_meta: Option<ItinerarySketch> = None;
		let mut itinerary_pois: Vec<EnrichedPoi> = Vec::new();
		let mut g3_error: Option<LlmError> = None;
		let mut misses: Vec<Poi> = Vec::new();

		let (mut d1, mut d2, mut d3) = (false, false, false);
		while !(d1 && d2 && d3) {
			tokio::select! {
				joined = &mut g1, if !d1 => {
					d1 = true;
					let outcome = flatten_join(joined);
					ids.general_city = outcome.journal_id;
					match outcome.result {
						Ok(facts) => {
							match city::resolve(
								&self.pool,
								&facts.city,
								&facts.country,
								facts.description.as_deref(),
								facts.center(),
							)
							.await
							{
								Ok(resolved) => city_id = Some(resolved.id),
								Err(e) => warn!("city resolution failed: {e}"),
							}
							if let Some(p) = publisher {
								p.emit(RecEvent::CityData { city_data: facts.clone() }).await?;
							}
							city_facts = Some(facts);
						}
						Err(e) => {
							warn!(target: "orchestrator_pipeline", "general city stage degraded: {e}");
						}
					}
				}
				joined = &mut g2, if !d2 => {
					d2 = true;
					let outcome = flatten_join(joined);
					ids.general_poi = outcome.journal_id;
					match outcome.result {
						Ok(list) => {
							let mut sketches = list.points_of_interest;
							sketches.truncate(GENERAL_POI_LIMIT);
							let probe = sketches.iter().find_map(PoiSketch::coordinates);
							let cid = self.ensure_city_id(&mut city_id, probe).await;
							let (mut enriched, batch) = self
								.enrich(PoiTable::PointsOfInterest, sketches, cid, ids.general_poi)
								.await;
							misses.extend(batch);
							let center = req
								.user_location
								.or_else(|| city_facts.as_ref().and_then(CityFacts::center));
							if let Some(center) = center {
								enriched = within_radius(center, radius_meters, enriched);
								for e in &mut enriched {
									e.distance_meters =
										e.poi.coordinates.map(|c| haversine_meters(center, c));
								}
							}
							if let Some(p) = publisher {
								for e in &enriched {
									p.emit(RecEvent::GeneralPoi { poi: e.to_out() }).await?;
								}
							}
							general = enriched;
						}
						Err(e) => {
							warn!(target: "orchestrator_pipeline", "general poi stage degraded: {e}");
						}
					}
				}
				joined = &mut g3, if !d3 => {
					d3 = true;
					let outcome = flatten_join(joined);
					ids.itinerary = outcome.journal_id;
					match outcome.result {
						Ok(mut sketch) => {
							let sketches = std::mem::take(&mut sketch.points_of_interest);
							let probe = sketches.iter().find_map(PoiSketch::coordinates);
							let cid = self.ensure_city_id(&mut city_id, probe).await;
							let (mut enriched, batch) = self
								.enrich(PoiTable::PointsOfInterest, sketches, cid, ids.itinerary)
								.await;
							misses.extend(batch);
							if let Some(center) = req.user_location {
								sort_by_distance(center, &mut enriched);
								for e in &mut enriched {
									e.distance_meters =
										e.poi.coordinates.map(|c| haversine_meters(center, c));
								}
							}
							if let Some(p) = publisher {
								for e in &enriched {
									p.emit(RecEvent::ItineraryPoi { poi: e.to_out() }).await?;
								}
							}
							itinerary_meta = Some(sketch);
							itinerary_pois = enriched;
						}
						Err(e) => g3_error = Some(e),
					}
				}
				_ = cancel.cancelled() => {
					transition(&mut state, RequestState::Failed);
					if let Some(p) = publisher {
						let _ = p.fail(String::from("request cancelled")).await;
					}
					return Err(AppError::Public(PublicError::Timeout));
				}
				_ = &mut overall => {
					transition(&mut state, RequestState::Failed);
					if let Some(p) = publisher {
						let _ = p.fail(String::from("request deadline exceeded")).await;
					}
					return Err(AppError::Public(PublicError::Timeout));
				}
			}
		}

		transition(&mut state, RequestState::Enriched);

		// G3 is the one stage the bundle cannot live without.
		if let Some(e) = g3_error {
			transition(&mut state, RequestState::Failed);
			if let Some(p) = publisher {
				let _ = p.fail(e.to_string()).await;
			}
			return Err(AppError::from(e));
		}
		let meta = itinerary_meta
			.ok_or_else(|| AppError::internal("itinerary stage yielded neither value nor error"))?;

		transition(&mut state, RequestState::Sorted);

		let response = RecommendationResponse {
			general_city_data: city_facts,
			points_of_interest: general.iter().map(EnrichedPoi::to_out).collect(),
			itinerary_response: ItineraryResponse {
				name: meta.itinerary_name,
				description: meta.overall_description,
				estimated_duration_minutes: meta.estimated_duration_minutes,
				estimated_cost: meta.estimated_cost,
				points_of_interest: itinerary_pois.iter().map(EnrichedPoi::to_out).collect(),
			},
			interaction_ids: ids,
		};
		transition(&mut state, RequestState::Merged);

		// Terminal event first: a consumer that is already gone means a
		// cancelled request, which must not populate the cache or schedule
		// the worker.
		if let Some(p) = publisher {
			p.finish().await?;
		}

		self.rec_cache.put(key, response.clone());
		self.worker.schedule(WorkerBatch {
			table: PoiTable::PointsOfInterest,
			pois: misses,
			account_id: Some(req.account_id),
			city_name: Some(req.city_name.clone()),
		});

		transition(&mut state, RequestState::Completed);
		Ok(response)
	}

	/// Coordinate-only fallback city resolution when G1 has not landed (or
	/// failed). A remaining `None` is a legitimate city-less answer for wide
	/// discovery.
	pub(crate) async fn ensure_city_id(
		&self,
		city_id: &mut Option<i32>,
		probe: Option<Coordinates>,
	) -> Option<i32> {
		if city_id.is_none() {
			if let Some(point) = probe {
				match city::resolve_by_point(&self.pool, point, WIDE_RADIUS_METERS).await {
					Ok(Some((id, name))) => {
						debug!(city = %name, "resolved city by coordinates");
						*city_id = Some(id);
					}
					Ok(None) => {}
					Err(e) => warn!("coordinate city lookup failed: {e}"),
				}
			}
		}
		*city_id
	}

	/// C5 enrichment: reconcile each sketch with the authoritative store.
	/// Name match first, then coordinate tolerance; on a hit the persisted
	/// record wins field-by-field. Misses come back separately for the
	/// persistence worker.
	pub(crate) async fn enrich(
		&self,
		table: PoiTable,
		sketches: Vec<PoiSketch>,
		city_id: Option<i32>,
		interaction_id: Option<i64>,
	) -> (Vec<EnrichedPoi>, Vec<Poi>) {
		let mut enriched = Vec::with_capacity(sketches.len());
		let mut misses = Vec::new();
		for sketch in sketches {
			let reason = sketch.reason.clone();
			let Some(llm_poi) = sketch.into_poi(city_id, interaction_id) else {
				continue;
			};

			let mut persisted = None;
			if let Some(cid) = city_id {
				persisted = match poi_store::find_by_name_in_city(
					&self.pool,
					table,
					cid,
					&llm_poi.name,
				)
				.await
				{
					Ok(found) => found,
					Err(e) => {
						warn!(name = %llm_poi.name, "name lookup failed: {e}");
						None
					}
				};
			}
			if persisted.is_none() {
				if let Some(coords) = llm_poi.coordinates {
					persisted = match poi_store::find_by_point_within_tolerance(
						&self.pool,
						table,
						city_id,
						coords,
						POI_COORD_TOLERANCE_METERS,
					)
					.await
					{
						Ok(found) => found,
						Err(e) => {
							warn!(name = %llm_poi.name, "tolerance lookup failed: {e}");
							None
						}
					};
				}
			}

			match persisted {
				Some(mut row) => {
					row.fill_missing_from(&llm_poi);
					enriched.push(EnrichedPoi {
						poi: row,
						reason,
						distance_meters: None,
					});
				}
				None => {
					misses.push(llm_poi.clone());
					enriched.push(EnrichedPoi {
						poi: llm_poi,
						reason,
						distance_meters: None,
					});
				}
			}
		}
		(enriched, misses)
	}
}

fn flatten_join<T>(joined: Result<StageOutcome<T>, tokio::task::JoinError>) -> StageOutcome<T> {
	joined.unwrap_or_else(|e| StageOutcome {
		journal_id: None,
		result: Err(LlmError::Unavailable(format!("stage task failed: {e}"))),
	})
}
