/*
 * src/geo.rs
 *
 * File for in-process geodesic math
 *
 * Purpose:
 *   Haversine distance, radius filtering, and distance ordering for POI
 *   lists that are already in memory. Anything wider than ~500 km belongs
 *   to the PostGIS geography predicate in the store instead.
 */

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, PublicError};
use crate::global::EARTH_RADIUS_METERS;

/// WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
	pub latitude: f64,
	pub longitude: f64,
}

impl Coordinates {
	/// Bounds-checked constructor. Model-produced coordinates must pass
	/// through here before they are trusted anywhere.
	pub fn checked(latitude: f64, longitude: f64) -> Result<Self, AppError> {
		let c = Self {
			latitude,
			longitude,
		};
		if c.in_bounds() {
			Ok(c)
		} else {
			Err(PublicError::Validation(format!(
				"coordinates out of bounds: ({latitude}, {longitude})"
			))
			.into())
		}
	}

	pub fn in_bounds(&self) -> bool {
		self.latitude.is_finite()
			&& self.longitude.is_finite()
			&& (-90.0..=90.0).contains(&self.latitude)
			&& (-180.0..=180.0).contains(&self.longitude)
	}
}

/// Anything that can sit in a spatially ordered list.
pub trait Locatable {
	/// None when the item never resolved to a trustworthy position.
	fn coordinates(&self) -> Option<Coordinates>;
	/// Tie-break key for equal distances, ascending.
	fn sort_name(&self) -> &str;
}

/// Great-circle distance in meters, mean Earth radius.
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
	let phi1 = a.latitude.to_radians();
	let phi2 = b.latitude.to_radians();
	let d_phi = (b.latitude - a.latitude).to_radians();
	let d_lambda = (b.longitude - a.longitude).to_radians();

	let h = (d_phi / 2.0).sin().powi(2)
		+ phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
	2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Orders items by ascending distance from `center`, ties broken by name.
/// Items with no (or non-finite) coordinates sink to the end, keeping their
/// relative order.
pub fn sort_by_distance<T: Locatable>(center: Coordinates, items: &mut [T]) {
	items.sort_by(|a, b| {
		let da = a
			.coordinates()
			.filter(Coordinates::in_bounds)
			.map(|c| haversine_meters(center, c));
		let db = b
			.coordinates()
			.filter(Coordinates::in_bounds)
			.map(|c| haversine_meters(center, c));
		match (da, db) {
			(Some(da), Some(db)) => da
				.total_cmp(&db)
				.then_with(|| a.sort_name().cmp(b.sort_name())),
			(Some(_), None) => std::cmp::Ordering::Less,
			(None, Some(_)) => std::cmp::Ordering::Greater,
			(None, None) => std::cmp::Ordering::Equal,
		}
	});
}

/// Keeps only items within `radius_meters` of `center`, sorted ascending by
/// distance (ties by name). Items with undefined coordinates are dropped.
pub fn within_radius<T: Locatable>(
	center: Coordinates,
	radius_meters: f64,
	items: Vec<T>,
) -> Vec<T> {
	let mut kept: Vec<T> = items
		.into_iter()
		.filter(|item| {
			item.coordinates()
				.filter(Coordinates::in_bounds)
				.map(|c| haversine_meters(center, c) <= radius_meters)
				.unwrap_or(false)
		})
		.collect();
	sort_by_distance(center, &mut kept);
	kept
}
