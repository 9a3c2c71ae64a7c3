use tokio_util::sync::CancellationToken;
use wayfarer::http_models::stream::RecEvent;
use wayfarer::llm::schema::CityFacts;
use wayfarer::orchestrator::StreamSession;

fn city_event() -> RecEvent {
	RecEvent::CityData {
		city_data: CityFacts {
			city: String::from("Paris"),
			country: String::from("France"),
			description: None,
			latitude: Some(48.8566),
			longitude: Some(2.3522),
			language: None,
			best_time_to_visit: None,
		},
	}
}

/// Stream ordering property: `start` first, content in emission order, one
/// terminal event, ids monotonic - including across publisher clones.
#[tokio::test]
async fn ordering_across_publisher_clones() {
	let (mut session, publisher) = StreamSession::open(CancellationToken::new());
	let clone_a = publisher.clone();
	let clone_b = publisher.clone();

	publisher.emit(RecEvent::Start).await.unwrap();
	clone_a.emit(city_event()).await.unwrap();
	clone_b.emit(city_event()).await.unwrap();
	publisher.finish().await.unwrap();
	drop((publisher, clone_a, clone_b));

	let mut kinds = Vec::new();
	let mut ids = Vec::new();
	while let Some(envelope) = session.events.recv().await {
		kinds.push(envelope.event.kind());
		ids.push(envelope.event_id);
	}

	assert_eq!(kinds, vec!["start", "city_data", "city_data", "complete"]);
	assert!(ids.windows(2).all(|w| w[0] < w[1]));
	assert_eq!(ids[0], 0);
}

/// The session id is stable across every envelope.
#[tokio::test]
async fn session_id_is_stable() {
	let (mut session, publisher) = StreamSession::open(CancellationToken::new());
	publisher.emit(RecEvent::Start).await.unwrap();
	publisher.finish().await.unwrap();
	drop(publisher);

	while let Some(envelope) = session.events.recv().await {
		assert_eq!(envelope.session_id, session.id);
	}
}

/// After the terminal event nothing else is delivered, whatever producers try.
#[tokio::test]
async fn no_content_after_terminal() {
	let (mut session, publisher) = StreamSession::open(CancellationToken::new());
	publisher.emit(RecEvent::Start).await.unwrap();
	publisher
		.fail(String::from("upstream model failure"))
		.await
		.unwrap();
	publisher.emit(city_event()).await.unwrap();
	publisher.finish().await.unwrap();
	drop(publisher);

	let mut kinds = Vec::new();
	while let Some(envelope) = session.events.recv().await {
		kinds.push(envelope.event.kind().to_string());
	}
	assert_eq!(kinds, vec!["start", "error"]);
}

/// Dropping the consumer cancels the request context upstream.
#[tokio::test]
async fn consumer_gone_propagates_cancellation() {
	let cancel = CancellationToken::new();
	let (session, publisher) = StreamSession::open(cancel.clone());
	drop(session);

	assert!(publisher.emit(RecEvent::Start).await.is_err());
	assert!(cancel.is_cancelled());
}
