use std::collections::BTreeSet;

use camino::Utf8Path;
use serde_json::{Value, json};

use imagery_catalog::config::CatalogConfig;
use imagery_catalog::domain::ImagerySourceDescriptor;
use imagery_catalog::filter::{EligibilityFilter, SkipReason};

fn source(properties: Value) -> ImagerySourceDescriptor {
    ImagerySourceDescriptor::from_value(
        Utf8Path::new("fixture.geojson"),
        json!({"type": "Feature", "properties": properties, "geometry": null}),
    )
    .unwrap()
}

#[test]
fn denylisted_id_is_always_dropped() {
    let config = CatalogConfig::default();
    let filter = EligibilityFilter::new(&config, 2024);

    let osmbe = source(json!({
        "id": "osmbe",
        "type": "tms",
        "name": "OpenStreetMap (Belgian Style)",
        "url": "https://tile.openstreetmap.be/osmbe/{zoom}/{x}/{y}.png",
        "best": true
    }));
    assert_eq!(filter.evaluate(&osmbe), Err(SkipReason::Denylisted));
}

#[test]
fn unknown_types_are_dropped() {
    let config = CatalogConfig::default();
    let filter = EligibilityFilter::new(&config, 2024);

    for kind in ["scanex", "wms_endpoint", "TMS"] {
        let candidate = source(json!({"id": "x", "type": kind}));
        assert_eq!(
            filter.evaluate(&candidate),
            Err(SkipReason::UnsupportedType {
                kind: kind.to_string()
            })
        );
    }
    for kind in ["tms", "wms", "bing"] {
        let candidate = source(json!({
            "id": "x",
            "type": kind,
            "available_projections": ["EPSG:4326"]
        }));
        assert_eq!(filter.evaluate(&candidate), Ok(()));
    }
}

#[test]
fn wms_needs_projections() {
    let config = CatalogConfig::default();
    let filter = EligibilityFilter::new(&config, 2024);

    let missing = source(json!({"id": "w", "type": "wms"}));
    assert_eq!(filter.evaluate(&missing), Err(SkipReason::MissingProjections));

    let empty = source(json!({"id": "w", "type": "wms", "available_projections": []}));
    assert_eq!(filter.evaluate(&empty), Err(SkipReason::MissingProjections));
}

#[test]
fn wms_needs_a_supported_projection() {
    let config = CatalogConfig::default();
    let filter = EligibilityFilter::new(&config, 2024);

    let utm = source(json!({
        "id": "w",
        "type": "wms",
        "available_projections": ["EPSG:25832"]
    }));
    assert_eq!(filter.evaluate(&utm), Err(SkipReason::NoSupportedProjection));

    let mercator = source(json!({
        "id": "w",
        "type": "wms",
        "available_projections": ["EPSG:3857"]
    }));
    assert_eq!(filter.evaluate(&mercator), Ok(()));

    let lowercase = source(json!({
        "id": "w",
        "type": "wms",
        "available_projections": ["epsg:3857"]
    }));
    assert_eq!(
        filter.evaluate(&lowercase),
        Err(SkipReason::NoSupportedProjection)
    );
}

#[test]
fn tms_ignores_projections() {
    let config = CatalogConfig::default();
    let filter = EligibilityFilter::new(&config, 2024);
    let tms = source(json!({"id": "t", "type": "tms", "available_projections": ["EPSG:25832"]}));
    assert_eq!(filter.evaluate(&tms), Ok(()));
}

#[test]
fn old_imagery_is_dropped() {
    let config = CatalogConfig::default();
    let filter = EligibilityFilter::new(&config, 2024);

    let old = source(json!({"id": "o", "type": "tms", "end_date": "1990-06-01"}));
    assert_eq!(
        filter.evaluate(&old),
        Err(SkipReason::Outdated { end_year: 1990 })
    );

    let recent = source(json!({"id": "r", "type": "tms", "end_date": "2010-01-01"}));
    assert_eq!(filter.evaluate(&recent), Ok(()));

    let undated = source(json!({"id": "u", "type": "tms"}));
    assert_eq!(filter.evaluate(&undated), Ok(()));
}

#[test]
fn configuration_is_injected() {
    let config = CatalogConfig {
        denylist: BTreeSet::from(["custom".to_string()]),
        supported_projections: BTreeSet::from(["EPSG:25832".to_string()]),
        max_age_years: 40,
        ..CatalogConfig::default()
    };
    let filter = EligibilityFilter::new(&config, 2024);

    let osmbe = source(json!({"id": "osmbe", "type": "tms", "end_date": "1990"}));
    assert_eq!(filter.evaluate(&osmbe), Ok(()));

    let custom = source(json!({"id": "custom", "type": "tms"}));
    assert_eq!(filter.evaluate(&custom), Err(SkipReason::Denylisted));

    let utm = source(json!({
        "id": "w",
        "type": "wms",
        "available_projections": ["EPSG:25832"]
    }));
    assert_eq!(filter.evaluate(&utm), Ok(()));
}
