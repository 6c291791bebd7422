//! Map export of scored suppliers as GeoJSON

use crate::gazetteer;
use crate::{RiskLevel, Supplier};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

/// Marker colour for a risk level
pub fn level_color(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "#ef4444",
        RiskLevel::Medium => "#f59e0b",
        RiskLevel::Low => "#22c55e",
    }
}

/// Marker radius in pixels
pub fn marker_size(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::High => 18,
        RiskLevel::Medium => 12,
        RiskLevel::Low => 9,
    }
}

fn supplier_feature(supplier: &Supplier) -> Option<Feature> {
    let coords = supplier
        .coordinates()
        .filter(|c| c.is_valid())
        .or_else(|| gazetteer::lookup(&supplier.city))?;

    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), json!(supplier.name));
    properties.insert("category".to_string(), json!(supplier.category));
    properties.insert("city".to_string(), json!(supplier.city));
    properties.insert("country".to_string(), json!(supplier.country));
    properties.insert("tier".to_string(), json!(supplier.tier));
    properties.insert("risk_score".to_string(), json!(supplier.risk_score));
    properties.insert("risk_level".to_string(), json!(supplier.risk_level.as_str()));
    properties.insert("event_summary".to_string(), json!(supplier.event_summary));
    properties.insert("color".to_string(), json!(level_color(supplier.risk_level)));
    properties.insert("marker_size".to_string(), json!(marker_size(supplier.risk_level)));

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![coords.longitude, coords.latitude]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Point features for every supplier with a known position.
/// Suppliers that could not be placed are left out.
pub fn to_geojson(suppliers: &[Supplier]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: suppliers.iter().filter_map(supplier_feature).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_places_suppliers() {
        let mut high = Supplier::new("Acme", "Electronics", "Nowhere Town", "China", "1")
            .with_coordinates(22.5, 114.0);
        high.apply_score(72.0, RiskLevel::High, "[HIGH] Port strike");
        let from_gazetteer = Supplier::new("Nord", "Logistics", "Rotterdam", "Netherlands", "1");
        let unplaced = Supplier::new("Ghost", "Apparel", "Nowhere Town", "Atlantis", "3");

        let collection = to_geojson(&[high, from_gazetteer, unplaced]);
        assert_eq!(collection.features.len(), 2);

        let first = &collection.features[0];
        match &first.geometry.as_ref().unwrap().value {
            Value::Point(p) => assert_eq!(p, &vec![114.0, 22.5]),
            other => panic!("unexpected geometry {:?}", other),
        }
        let props = first.properties.as_ref().unwrap();
        assert_eq!(props["color"], "#ef4444");
        assert_eq!(props["marker_size"], 18);
        assert_eq!(props["risk_level"], "High");

        let second = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(second["color"], "#22c55e");
        assert_eq!(second["marker_size"], 9);
    }

    #[test]
    fn test_serialises_as_feature_collection() {
        let supplier = Supplier::new("Acme", "Electronics", "Shenzhen", "China", "1");
        let json = serde_json::to_value(to_geojson(&[supplier])).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["geometry"]["type"], "Point");
    }
}
