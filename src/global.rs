pub const LOG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/logs");
pub const CRASH_LOG: &str = "crash.log";
pub const LATEST_LOG: &str = "latest.log";

/// Two coordinates closer than this are treated as the same POI during lookup.
pub const POI_COORD_TOLERANCE_METERS: f64 = 100.0;

/// Mean Earth radius for the in-process Haversine path. Good to ~0.5% for
/// radii under ~500 km; wider searches go through the PostGIS geography predicate.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A search radius at or above this is wide discovery; POIs found there may
/// legitimately stay city-less.
pub const WIDE_RADIUS_METERS: f64 = 50_000.0;

/// General POI list length cap handed to the LLM prompt.
pub const GENERAL_POI_LIMIT: usize = 5;

/// Stream channel capacity. The producer may block briefly, never drops.
pub const STREAM_BUFFER: usize = 16;

pub const HEARTBEAT_INTERVAL_SECONDS: u64 = 15;
