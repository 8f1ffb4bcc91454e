//! Minimal GeoJSON (RFC 7946) model: point features only, WGS84 lon/lat.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Builds a point feature, flattening `properties` into a JSON object.
    pub fn point<P: Serialize>(
        id: Option<String>,
        longitude: f64,
        latitude: f64,
        properties: &P,
    ) -> Result<Feature, Error> {
        let properties = match serde_json::to_value(properties).map_err(Error::Serialize)? {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert(String::from("value"), other);
                map
            }
        };
        Ok(Feature {
            id,
            geometry: Geometry::Point {
                coordinates: [longitude, latitude],
            },
            properties,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
