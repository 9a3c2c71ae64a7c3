use wayfarer::geo::{Coordinates, within_radius};
use wayfarer::http_models::recommendation::PoiOut;
use wayfarer::models::poi::{Poi, PoiFilters};
use wayfarer::models::PriceRange;

fn poi(name: &str, lat: f64, lon: f64) -> Poi {
	Poi {
		id: 0,
		city_id: None,
		name: String::from(name),
		description: None,
		category: Some(String::from("Museum")),
		coordinates: Some(Coordinates {
			latitude: lat,
			longitude: lon,
		}),
		address: None,
		phone: None,
		website: None,
		opening_hours: None,
		price_range: Some(PriceRange::Moderate),
		rating: Some(4.5),
		tags: vec![],
		images: vec![],
		source_interaction_id: None,
		created_at: None,
		updated_at: None,
	}
}

/// Radius filtering over domain POIs: membership iff within distance,
/// result ordered ascending.
#[test]
fn poi_radius_filter_membership_and_order() {
	let paris = Coordinates {
		latitude: 48.8566,
		longitude: 2.3522,
	};
	let pois = vec![
		poi("Far Museum", 48.9566, 2.3522),   // ~11 km north
		poi("Close Museum", 48.8600, 2.3522), // ~380 m
		poi("Mid Museum", 48.8700, 2.3522),   // ~1.5 km
	];
	let kept = within_radius(paris, 2_000.0, pois);
	let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
	assert_eq!(names, vec!["Close Museum", "Mid Museum"]);
}

/// The enrichment overlay never clobbers persisted data.
#[test]
fn overlay_preserves_persisted_fields() {
	let mut persisted = poi("Louvre", 48.8606, 2.3376);
	persisted.id = 42;
	persisted.description = Some(String::from("The canonical description"));

	let mut from_model = poi("Louvre", 48.86, 2.33);
	from_model.description = Some(String::from("A hallucinated description"));
	from_model.website = Some(String::from("https://louvre.fr"));

	persisted.fill_missing_from(&from_model);
	assert_eq!(
		persisted.description.as_deref(),
		Some("The canonical description")
	);
	assert_eq!(persisted.coordinates.unwrap().latitude, 48.8606);
	assert_eq!(persisted.website.as_deref(), Some("https://louvre.fr"));
}

/// Wire shape: §-names, dollar-sign price bands, empty collections omitted.
#[test]
fn poi_out_serializes_wire_field_names() {
	let p = poi("Louvre", 48.8606, 2.3376);
	let out = PoiOut::from_poi(&p, Some(1234.5), Some(String::from("fits the vibe")));
	let v = serde_json::to_value(&out).unwrap();

	assert_eq!(v["name"], "Louvre");
	assert_eq!(v["price_range"], "$$");
	assert_eq!(v["latitude"], 48.8606);
	assert_eq!(v["distance_meters"], 1234.5);
	assert_eq!(v["reason"], "fits the vibe");
	// Unpersisted POIs carry no id; empty tag/image lists are omitted.
	assert!(v.get("id").is_none());
	assert!(v.get("tags").is_none());
	assert!(v.get("images").is_none());
}

/// Filter parsing is forgiving (unknown values mean "any"), matching is not.
#[test]
fn filters_parse_and_match() {
	let f = PoiFilters::from_parts(Some("museum"), Some("$$"), Some(4.0));
	assert!(f.matches(&poi("Louvre", 48.86, 2.33)));

	let f = PoiFilters::from_parts(Some("museum"), Some("$$$$"), None);
	assert!(!f.matches(&poi("Louvre", 48.86, 2.33)));

	let forgiving = PoiFilters::from_parts(Some("not-a-category"), Some("not-a-price"), Some(42.0));
	assert_eq!(forgiving, PoiFilters::default());
	assert!(forgiving.matches(&poi("Louvre", 48.86, 2.33)));
}
