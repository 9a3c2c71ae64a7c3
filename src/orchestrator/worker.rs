/*
 * src/orchestrator/worker.rs
 *
 * File for the background persistence worker
 *
 * Purpose:
 *   Writes enriched LLM POIs after the response has gone out, under its own
 *   deadline and a process-wide concurrency ceiling so a burst of misses
 *   cannot drain the connection pool. Worker errors never reach a client;
 *   they are counted, logged, and journaled.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::llm::LlmGateway;
use crate::models::interaction::{InteractionKind, NewInteraction};
use crate::models::poi::Poi;
use crate::store::journal;
use crate::store::poi::{self as poi_store, PoiTable};

/// One scheduled batch: the misses of a single request.
#[derive(Debug)]
pub struct WorkerBatch {
	pub table: PoiTable,
	pub pois: Vec<Poi>,
	pub account_id: Option<i32>,
	pub city_name: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
	pub saved: u32,
	pub failed: u32,
	pub cancelled: u32,
}

pub struct PersistenceWorker {
	pool: PgPool,
	gateway: Arc<LlmGateway>,
	permits: Arc<Semaphore>,
	deadline: Duration,
	shutdown: CancellationToken,
}

impl PersistenceWorker {
	pub fn new(
		pool: PgPool,
		gateway: Arc<LlmGateway>,
		concurrency: usize,
		deadline: Duration,
		shutdown: CancellationToken,
	) -> Self {
		Self {
			pool,
			gateway,
			permits: Arc::new(Semaphore::new(concurrency)),
			deadline,
			shutdown,
		}
	}

	/// Detaches a save task for the batch and returns immediately; the
	/// request path never waits on this. The task queues behind the permit
	/// ceiling and aborts cleanly on process shutdown.
	pub fn schedule(&self, batch: WorkerBatch) {
		if batch.pois.is_empty() {
			return;
		}
		let pool = self.pool.clone();
		let gateway = Arc::clone(&self.gateway);
		let permits = Arc::clone(&self.permits);
		let deadline = self.deadline;
		let shutdown = self.shutdown.clone();

		tokio::spawn(async move {
			let _permit = tokio::select! {
				permit = permits.acquire_owned() => match permit {
					Ok(p) => p,
					Err(_) => return,
				},
				_ = shutdown.cancelled() => return,
			};

			let started = Instant::now();
			let total = batch.pois.len() as u32;
			let mut summary = WorkerSummary::default();

			let run = tokio::time::timeout(
				deadline,
				persist_batch(&pool, &gateway, &shutdown, &batch, &mut summary),
			);
			if run.await.is_err() {
				warn!(table = ?batch.table, "persistence worker hit its deadline");
			}
			summary.cancelled = total - summary.saved - summary.failed;

			info!(
				saved = summary.saved,
				failed = summary.failed,
				cancelled = summary.cancelled,
				elapsed_ms = started.elapsed().as_millis() as i64,
				"persistence worker finished batch"
			);

			let _ = journal::record_best_effort(
				&pool,
				&NewInteraction {
					account_id: batch.account_id,
					profile_id: None,
					kind: InteractionKind::WorkerSummary,
					city_name: batch.city_name.clone(),
					prompt_text: format!("persist {total} pois"),
					response_text: Some(
						serde_json::json!({
							"saved": summary.saved,
							"failed": summary.failed,
							"cancelled": summary.cancelled,
						})
						.to_string(),
					),
					model_tag: String::from("persistence-worker"),
					prompt_tokens: None,
					completion_tokens: None,
					latency_ms: started.elapsed().as_millis() as i64,
					error_tag: (summary.failed > 0).then(|| String::from("partial_failure")),
				},
			)
			.await;
		});
	}
}

async fn persist_batch(
	pool: &PgPool,
	gateway: &LlmGateway,
	shutdown: &CancellationToken,
	batch: &WorkerBatch,
	summary: &mut WorkerSummary,
) {
	for poi in &batch.pois {
		if shutdown.is_cancelled() {
			break;
		}
		if poi.validate().is_err() {
			summary.failed += 1;
			continue;
		}
		match poi_store::upsert(pool, batch.table, poi).await {
			Ok(saved) => {
				summary.saved += 1;
				embed_poi(pool, gateway, batch.table, &saved).await;
			}
			Err(e) => {
				summary.failed += 1;
				warn!(name = %poi.name, "worker upsert failed: {e}");
			}
		}
	}
}

/// Best-effort semantic indexing; an embedding failure never fails the save.
async fn embed_poi(pool: &PgPool, gateway: &LlmGateway, table: PoiTable, poi: &Poi) {
	let text = match &poi.description {
		Some(d) => format!("{}\n{d}", poi.name),
		None => poi.name.clone(),
	};
	match gateway.embed(&text).await {
		Ok(vector) => {
			if let Err(e) = poi_store::update_embedding(pool, table, poi.id, vector).await {
				warn!(poi = poi.id, "embedding update failed: {e}");
			}
		}
		Err(e) => warn!(poi = poi.id, "embedding call failed: {e}"),
	}
}
