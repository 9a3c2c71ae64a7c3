/*
 * src/cache.rs
 *
 * File for the in-process response cache
 *
 * Purpose:
 *   A keyed TTL map in front of the fan-out pipeline. Writes happen only on
 *   successful, complete runs; failures and cancellations never populate an
 *   entry. Reads on the hot path are lock-free via the sharded map.
 */

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::geo::Coordinates;

/// Stable cache key for one request shape. Coordinates are rounded to 1e-4
/// degrees and radii to the meter, so jittery clients still hit.
pub fn fingerprint(
	endpoint: &str,
	city: Option<&str>,
	account_id: Option<i32>,
	coords: Option<Coordinates>,
	radius_meters: Option<f64>,
	filters: &[(&str, String)],
) -> String {
	let mut parts = vec![format!("endpoint={endpoint}")];
	if let Some(city) = city {
		parts.push(format!("city={}", city.trim().to_lowercase()));
	}
	if let Some(id) = account_id {
		parts.push(format!("user={id}"));
	}
	if let Some(c) = coords {
		parts.push(format!("lat={}", (c.latitude * 10_000.0).round() as i64));
		parts.push(format!("lon={}", (c.longitude * 10_000.0).round() as i64));
	}
	if let Some(r) = radius_meters {
		parts.push(format!("radius={}", r.round() as i64));
	}
	let mut filter_parts: Vec<String> = filters
		.iter()
		.map(|(k, v)| format!("f:{k}={v}"))
		.collect();
	filter_parts.sort();
	parts.extend(filter_parts);
	parts.join("|")
}

struct Entry<T> {
	value: T,
	expires_at: Instant,
}

pub struct TtlCache<T> {
	entries: DashMap<String, Entry<T>>,
	ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> TtlCache<T> {
	pub fn new(ttl: Duration) -> Self {
		Self {
			entries: DashMap::new(),
			ttl,
		}
	}

	pub fn get(&self, key: &str) -> Option<T> {
		let entry = self.entries.get(key)?;
		if entry.expires_at <= Instant::now() {
			drop(entry);
			self.entries.remove(key);
			return None;
		}
		Some(entry.value.clone())
	}

	/// Only call on a successful, complete result.
	pub fn put(&self, key: String, value: T) {
		self.entries.insert(
			key,
			Entry {
				value,
				expires_at: Instant::now() + self.ttl,
			},
		);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn sweep(&self) {
		let now = Instant::now();
		let before = self.entries.len();
		self.entries.retain(|_, entry| entry.expires_at > now);
		let evicted = before - self.entries.len();
		if evicted > 0 {
			debug!(evicted, "cache sweep");
		}
	}
}

/// Periodic eviction so expired entries do not pile up between reads. Stops
/// with the process-wide kill switch.
pub fn spawn_sweeper<T: Clone + Send + Sync + 'static>(
	cache: std::sync::Arc<TtlCache<T>>,
	interval: Duration,
	shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
		loop {
			tokio::select! {
				_ = ticker.tick() => cache.sweep(),
				_ = shutdown.cancelled() => break,
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	#[test]
	fn fingerprint_rounds_coordinates_and_radius() {
		let a = fingerprint(
			"recommendations",
			Some("Barcelona"),
			Some(7),
			Some(Coordinates {
				latitude: 41.38511,
				longitude: 2.17339,
			}),
			Some(1000.2),
			&[],
		);
		let b = fingerprint(
			"recommendations",
			Some("barcelona "),
			Some(7),
			Some(Coordinates {
				latitude: 41.38508,
				longitude: 2.17341,
			}),
			Some(999.8),
			&[],
		);
		assert_eq!(a, b);
	}

	#[test]
	fn fingerprint_is_filter_order_independent() {
		let a = fingerprint(
			"pois/by-distance",
			None,
			None,
			None,
			None,
			&[("category", String::from("Museum")), ("min_rating", String::from("4"))],
		);
		let b = fingerprint(
			"pois/by-distance",
			None,
			None,
			None,
			None,
			&[("min_rating", String::from("4")), ("category", String::from("Museum"))],
		);
		assert_eq!(a, b);
	}

	#[test]
	fn fingerprint_separates_users_and_endpoints() {
		let a = fingerprint("recommendations", Some("x"), Some(1), None, None, &[]);
		let b = fingerprint("recommendations", Some("x"), Some(2), None, None, &[]);
		let c = fingerprint("pois/by-distance", Some("x"), Some(1), None, None, &[]);
		assert_ne!(a, b);
		assert_ne!(a, c);
	}

	#[tokio::test]
	async fn entries_expire_after_ttl() {
		let cache = TtlCache::new(Duration::from_millis(30));
		cache.put(String::from("k"), 42u32);
		assert_eq!(cache.get("k"), Some(42));
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(cache.get("k"), None);
	}

	#[tokio::test]
	async fn sweeper_evicts_and_stops_on_shutdown() {
		let cache = Arc::new(TtlCache::new(Duration::from_millis(10)));
		cache.put(String::from("k"), 1u32);
		let shutdown = CancellationToken::new();
		let handle = spawn_sweeper(cache.clone(), Duration::from_millis(20), shutdown.clone());
		tokio::time::sleep(Duration::from_millis(60)).await;
		assert!(cache.is_empty());
		shutdown.cancel();
		handle.await.unwrap();
	}
}
