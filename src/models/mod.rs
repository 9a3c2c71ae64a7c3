/*
 * src/models/mod.rs
 *
 * File for shared domain enums
 *
 * Purpose:
 *   Closed option sets used across POIs, preference profiles, and filters.
 *   Every enum round-trips through a stable text form; unknown option names
 *   are rejected where client input enters, ignored where filters allow
 *   "any".
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod city;
pub mod interaction;
pub mod itinerary;
pub mod poi;
pub mod preferences;

/// POI category filter values. The LLM is free to produce richer category
/// text on a POI; filtering only understands this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PoiCategory {
	Museum,
	Gallery,
	Park,
	Landmark,
	Restaurant,
	Cafe,
	Bar,
	Shopping,
	Entertainment,
	Nightlife,
	Outdoors,
}

impl PoiCategory {
	pub fn as_str(&self) -> &'static str {
		match self {
			PoiCategory::Museum => "Museum",
			PoiCategory::Gallery => "Gallery",
			PoiCategory::Park => "Park",
			PoiCategory::Landmark => "Landmark",
			PoiCategory::Restaurant => "Restaurant",
			PoiCategory::Cafe => "Cafe",
			PoiCategory::Bar => "Bar",
			PoiCategory::Shopping => "Shopping",
			PoiCategory::Entertainment => "Entertainment",
			PoiCategory::Nightlife => "Nightlife",
			PoiCategory::Outdoors => "Outdoors",
		}
	}
}

impl FromStr for PoiCategory {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"museum" => Ok(PoiCategory::Museum),
			"gallery" => Ok(PoiCategory::Gallery),
			"park" => Ok(PoiCategory::Park),
			"landmark" => Ok(PoiCategory::Landmark),
			"restaurant" => Ok(PoiCategory::Restaurant),
			"cafe" => Ok(PoiCategory::Cafe),
			"bar" => Ok(PoiCategory::Bar),
			"shopping" => Ok(PoiCategory::Shopping),
			"entertainment" => Ok(PoiCategory::Entertainment),
			"nightlife" => Ok(PoiCategory::Nightlife),
			"outdoors" => Ok(PoiCategory::Outdoors),
			_ => Err(()),
		}
	}
}

impl fmt::Display for PoiCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Price band in the `$`..`$$$$` convention used on the wire and in the DB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum PriceRange {
	#[serde(rename = "$")]
	Cheap,
	#[serde(rename = "$$")]
	Moderate,
	#[serde(rename = "$$$")]
	Expensive,
	#[serde(rename = "$$$$")]
	Luxury,
}

impl PriceRange {
	pub fn as_str(&self) -> &'static str {
		match self {
			PriceRange::Cheap => "$",
			PriceRange::Moderate => "$$",
			PriceRange::Expensive => "$$$",
			PriceRange::Luxury => "$$$$",
		}
	}
}

impl FromStr for PriceRange {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"$" => Ok(PriceRange::Cheap),
			"$$" => Ok(PriceRange::Moderate),
			"$$$" => Ok(PriceRange::Expensive),
			"$$$$" => Ok(PriceRange::Luxury),
			_ => Err(()),
		}
	}
}

impl fmt::Display for PriceRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The part of the day the user prefers to be out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
	Morning,
	Afternoon,
	Evening,
	Night,
	Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
	Relaxed,
	Moderate,
	Packed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLevel {
	Frugal,
	Moderate,
	Comfortable,
	Luxury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
	Walk,
	PublicTransit,
	Car,
	Bike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
	Private,
	Public,
}

/// Text round-trip helper for enums persisted as TEXT columns.
macro_rules! text_enum {
	($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
		impl $ty {
			pub fn as_str(&self) -> &'static str {
				match self {
					$(Self::$variant => $text),+
				}
			}
		}

		impl FromStr for $ty {
			type Err = ();

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s.trim() {
					$($text => Ok(Self::$variant)),+,
					_ => Err(()),
				}
			}
		}

		impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}
	};
}

text_enum!(TimeOfDay {
	Morning => "morning",
	Afternoon => "afternoon",
	Evening => "evening",
	Night => "night",
	Any => "any",
});

text_enum!(Pace {
	Relaxed => "relaxed",
	Moderate => "moderate",
	Packed => "packed",
});

text_enum!(BudgetLevel {
	Frugal => "frugal",
	Moderate => "moderate",
	Comfortable => "comfortable",
	Luxury => "luxury",
});

text_enum!(TransportMode {
	Walk => "walk",
	PublicTransit => "public_transit",
	Car => "car",
	Bike => "bike",
});

text_enum!(Visibility {
	Private => "private",
	Public => "public",
});
