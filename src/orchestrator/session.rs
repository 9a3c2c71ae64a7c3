/*
 * src/orchestrator/session.rs
 *
 * File for the streaming session manager
 *
 * Purpose:
 *   One bounded, ordered event channel per streaming request. The producer
 *   never drops events (it may block briefly on a full buffer); exactly one
 *   terminal event ends the session; a gone consumer cancels the request
 *   context upstream.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiResult, PrivateError};
use crate::global::{HEARTBEAT_INTERVAL_SECONDS, STREAM_BUFFER};
use crate::http_models::stream::{EventEnvelope, RecEvent};

/// Producer half handed to the orchestrator. Cloneable so stage tasks can
/// publish as they resolve; ids stay monotonic across clones.
#[derive(Clone)]
pub struct EventPublisher {
	session_id: Uuid,
	tx: mpsc::Sender<EventEnvelope>,
	next_id: Arc<AtomicU64>,
	terminal_sent: Arc<AtomicBool>,
	/// Request context; cancelled when the consumer goes away.
	cancel: CancellationToken,
	/// Session-internal: flips when the session is over for any reason so
	/// the heartbeat task releases its sender promptly.
	done: CancellationToken,
	last_emit: Arc<Mutex<Instant>>,
}

impl EventPublisher {
	pub fn session_id(&self) -> Uuid {
		self.session_id
	}

	/// Sends one event in emission order. After a terminal event the session
	/// is closed and further emits are silently ignored. A dropped consumer
	/// cancels the request context and surfaces as a channel error.
	pub async fn emit(&self, event: RecEvent) -> ApiResult<()> {
		if self.terminal_sent.load(Ordering::SeqCst) {
			debug!(session = %self.session_id, kind = event.kind(), "emit after terminal ignored");
			return Ok(());
		}
		let terminal = event.is_terminal();
		if terminal && self.terminal_sent.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		let envelope = EventEnvelope {
			event_id: self.next_id.fetch_add(1, Ordering::SeqCst),
			session_id: self.session_id,
			timestamp: Utc::now(),
			event,
		};
		*self.last_emit.lock().await = Instant::now();
		let sent = self.tx.send(envelope).await;
		if terminal {
			self.done.cancel();
		}
		if sent.is_err() {
			// Consumer went away: propagate cancellation upstream so in-flight
			// LLM and DB calls stop.
			self.done.cancel();
			self.cancel.cancel();
			return Err(PrivateError::Channel(String::from("stream consumer disconnected")).into());
		}
		Ok(())
	}

	/// Terminal success. Exactly one of finish/fail lands per session.
	pub async fn finish(&self) -> ApiResult<()> {
		self.emit(RecEvent::Complete).await
	}

	/// Terminal failure with a client-safe message.
	pub async fn fail(&self, message: String) -> ApiResult<()> {
		self.emit(RecEvent::Error { message }).await
	}
}

/// A request-scoped stream session: the consumer half plus the cancel handle
/// that ties the session to the request context.
pub struct StreamSession {
	pub id: Uuid,
	pub events: mpsc::Receiver<EventEnvelope>,
	pub cancel: CancellationToken,
}

impl StreamSession {
	/// Opens a session under the given request context. The returned
	/// publisher is for the orchestrator; the receiver feeds the transport.
	/// An idle-heartbeat task runs until the session terminates.
	pub fn open(cancel: CancellationToken) -> (Self, EventPublisher) {
		let id = Uuid::new_v4();
		let (tx, rx) = mpsc::channel(STREAM_BUFFER);
		let publisher = EventPublisher {
			session_id: id,
			tx,
			next_id: Arc::new(AtomicU64::new(0)),
			terminal_sent: Arc::new(AtomicBool::new(false)),
			cancel: cancel.clone(),
			done: CancellationToken::new(),
			last_emit: Arc::new(Mutex::new(Instant::now())),
		};

		// Idle sessions get heartbeats so the consumer can tell a slow stage
		// from a dead one. The task owns a sender clone, so it must exit as
		// soon as the session is done or the channel would never close.
		{
			let publisher = publisher.clone();
			let cancel = cancel.clone();
			let done = publisher.done.clone();
			tokio::spawn(async move {
				let interval = std::time::Duration::from_secs(HEARTBEAT_INTERVAL_SECONDS);
				loop {
					tokio::select! {
						_ = tokio::time::sleep(interval) => {}
						_ = cancel.cancelled() => break,
						_ = done.cancelled() => break,
					}
					if publisher.terminal_sent.load(Ordering::SeqCst) {
						break;
					}
					let idle_for = publisher.last_emit.lock().await.elapsed();
					if idle_for >= interval && publisher.emit(RecEvent::Heartbeat).await.is_err() {
						break;
					}
				}
			});
		}

		(
			Self {
				id,
				events: rx,
				cancel,
			},
			publisher,
		)
	}
}
