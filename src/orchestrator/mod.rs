/*
 * src/orchestrator/mod.rs
 *
 * File for the recommendation orchestration core
 *
 * Purpose:
 *   The fan-out pipeline (general city facts, general POIs, personalized
 *   itinerary), enrichment against the store, the streaming session
 *   manager, and the detached persistence worker.
 */

pub mod discovery;
pub mod fanout;
pub mod session;
pub mod worker;

pub use fanout::{Orchestrator, RecommendationRequest};
pub use session::{EventPublisher, StreamSession};
pub use worker::{PersistenceWorker, WorkerBatch};
