use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use camino::Utf8Path;
use geo::Geometry;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageryType {
    Tms,
    Wms,
    Bing,
}

impl fmt::Display for ImageryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageryType::Tms => write!(f, "tms"),
            ImageryType::Wms => write!(f, "wms"),
            ImageryType::Bing => write!(f, "bing"),
        }
    }
}

impl FromStr for ImageryType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "tms" => Ok(ImageryType::Tms),
            "wms" => Ok(ImageryType::Wms),
            "bing" => Ok(ImageryType::Bing),
            other => Err(other.to_string()),
        }
    }
}

/// One imagery source as found in the upstream index.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagerySourceDescriptor {
    pub id: String,
    /// Raw `type` value; see [`ImagerySourceDescriptor::imagery_type`].
    pub kind: String,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
    /// Keys of the top-level JSON record (`type`, `properties`, `geometry`, ...).
    pub record_keys: BTreeSet<String>,
}

impl ImagerySourceDescriptor {
    pub fn from_json(path: &Utf8Path, content: &str) -> Result<Self, CatalogError> {
        let value: Value =
            serde_json::from_str(content).map_err(|err| CatalogError::parse(path, err.to_string()))?;
        Self::from_value(path, value)
    }

    pub fn from_value(path: &Utf8Path, value: Value) -> Result<Self, CatalogError> {
        let Value::Object(mut record) = value else {
            return Err(CatalogError::parse(path, "descriptor is not a JSON object"));
        };
        let record_keys = record.keys().cloned().collect();

        let properties = match record.remove("properties") {
            Some(Value::Object(properties)) => properties,
            Some(_) => return Err(CatalogError::parse(path, "`properties` is not an object")),
            None => return Err(CatalogError::parse(path, "missing `properties`")),
        };
        let id = required_str(path, &properties, "id")?;
        let kind = required_str(path, &properties, "type")?;

        let geometry = match record.remove("geometry") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let geojson = geojson::Geometry::from_json_value(raw).map_err(|err| {
                    CatalogError::parse(path, format!("source {id}: invalid geometry: {err}"))
                })?;
                let geometry = Geometry::<f64>::try_from(geojson).map_err(|err| {
                    CatalogError::parse(path, format!("source {id}: invalid geometry: {err}"))
                })?;
                Some(geometry)
            }
        };

        Ok(Self {
            id,
            kind,
            geometry,
            properties,
            record_keys,
        })
    }

    pub fn imagery_type(&self) -> Option<ImageryType> {
        self.kind.parse().ok()
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Projection codes, or `None` when the field is absent or not a list.
    pub fn available_projections(&self) -> Option<Vec<&str>> {
        let Value::Array(items) = self.properties.get("available_projections")? else {
            return None;
        };
        Some(items.iter().filter_map(Value::as_str).collect())
    }
}

fn required_str(
    path: &Utf8Path,
    properties: &Map<String, Value>,
    key: &str,
) -> Result<String, CatalogError> {
    match properties.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(CatalogError::parse(path, format!("`properties.{key}` is not a string"))),
        None => Err(CatalogError::parse(path, format!("missing `properties.{key}`"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
}

impl From<&FieldValue> for Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Str(value) => Value::String(value.clone()),
            FieldValue::Int(value) => Value::from(*value),
        }
    }
}

/// A normalized, schema-conformant catalog record.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub properties: Vec<(String, FieldValue)>,
    pub geometry: Option<Geometry<f64>>,
}

impl CatalogEntry {
    pub fn property(&self, key: &str) -> Option<&FieldValue> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }
}
