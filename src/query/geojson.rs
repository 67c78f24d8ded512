//! GeoJSON response shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON `Feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Value,
    pub properties: Map<String, Value>,
    pub id: Value,
}

impl Feature {
    pub fn new(geometry: Value, properties: Map<String, Value>, id: Value) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry,
            properties,
            id,
        }
    }
}

/// A GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }

    /// Returned when the aggregate over zero rows is null.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_collection_shape() {
        assert_eq!(
            FeatureCollection::empty().to_value(),
            json!({"type": "FeatureCollection", "features": []})
        );
    }

    #[test]
    fn test_feature_serialization() {
        let mut properties = Map::new();
        properties.insert("state".to_string(), json!("Assam"));
        let feature = Feature::new(json!({"type": "Point", "coordinates": [91.7, 26.1]}), properties, json!(7));

        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["id"], 7);
        assert_eq!(value["properties"]["state"], "Assam");
        assert_eq!(value["geometry"]["type"], "Point");
    }
}
