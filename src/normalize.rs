use geo::Geometry;
use serde_json::Value;
use tracing::debug;

use crate::config::ZoomDefaultPolicy;
use crate::domain::{CatalogEntry, FieldValue, ImagerySourceDescriptor};
use crate::schema::{FieldType, Schema};

pub const DEFAULT_MIN_ZOOM: i64 = 0;
pub const DEFAULT_MAX_ZOOM: i64 = 22;

/// Projects a descriptor's properties onto the output schema.
pub struct AttributeNormalizer<'a> {
    schema: &'a Schema,
    zoom_defaults: ZoomDefaultPolicy,
}

impl<'a> AttributeNormalizer<'a> {
    pub fn new(schema: &'a Schema, zoom_defaults: ZoomDefaultPolicy) -> Self {
        Self {
            schema,
            zoom_defaults,
        }
    }

    /// Builds a new entry holding exactly the schema's fields; `source` is left untouched.
    pub fn normalize(
        &self,
        source: &ImagerySourceDescriptor,
        geometry: Option<Geometry<f64>>,
    ) -> CatalogEntry {
        let properties = self
            .schema
            .fields()
            .iter()
            .map(|field| {
                let value = self
                    .zoom_default(source, &field.name)
                    .or_else(|| {
                        source
                            .property(&field.name)
                            .and_then(|raw| coerce(raw, field.field_type))
                    })
                    .unwrap_or_else(|| zero_value(field.field_type));
                (field.name.clone(), value)
            })
            .collect();

        CatalogEntry {
            id: source.id.clone(),
            properties,
            geometry,
        }
    }

    fn zoom_default(&self, source: &ImagerySourceDescriptor, name: &str) -> Option<FieldValue> {
        let default = match name {
            "min_zoom" => DEFAULT_MIN_ZOOM,
            "max_zoom" => DEFAULT_MAX_ZOOM,
            _ => return None,
        };
        let present = match self.zoom_defaults {
            ZoomDefaultPolicy::Record => source.record_keys.contains(name),
            ZoomDefaultPolicy::Properties => source.properties.contains_key(name),
        };
        if present {
            return None;
        }
        if let Some(existing) = source.property(name) {
            debug!(
                source = source.id.as_str(),
                "{name} {existing} replaced by record-level default {default}"
            );
        }
        Some(FieldValue::Int(default))
    }
}

pub fn zero_value(field_type: FieldType) -> FieldValue {
    match field_type {
        FieldType::Str => FieldValue::Str(String::new()),
        FieldType::Int | FieldType::Flag => FieldValue::Int(0),
    }
}

fn coerce(raw: &Value, field_type: FieldType) -> Option<FieldValue> {
    match field_type {
        FieldType::Str => coerce_str(raw).map(FieldValue::Str),
        FieldType::Int => coerce_int(raw).map(FieldValue::Int),
        FieldType::Flag => coerce_int(raw).map(|value| FieldValue::Int(i64::from(value != 0))),
    }
}

fn coerce_str(raw: &Value) -> Option<String> {
    match raw {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(","),
        ),
        // Attribution blocks carry their display string under `text`.
        Value::Object(object) => match object.get("text") {
            Some(Value::String(text)) => Some(text.clone()),
            _ => Some(raw.to_string()),
        },
        Value::Null | Value::Bool(_) => None,
    }
}

fn coerce_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Bool(value) => Some(i64::from(*value)),
        Value::Number(value) => value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.is_finite())
                .map(|float| float as i64)
        }),
        Value::String(value) => value.trim().parse().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;
    use serde_json::json;

    use super::*;

    fn source(record: Value) -> ImagerySourceDescriptor {
        ImagerySourceDescriptor::from_value(Utf8Path::new("test.geojson"), record).unwrap()
    }

    #[test]
    fn coerce_values_to_field_types() {
        assert_eq!(coerce(&json!(true), FieldType::Flag), Some(FieldValue::Int(1)));
        assert_eq!(coerce(&json!(5), FieldType::Flag), Some(FieldValue::Int(1)));
        assert_eq!(coerce(&json!("19"), FieldType::Int), Some(FieldValue::Int(19)));
        assert_eq!(coerce(&json!(18.0), FieldType::Int), Some(FieldValue::Int(18)));
        assert_eq!(coerce(&json!(18.5), FieldType::Int), None);
        assert_eq!(
            coerce(&json!(["EPSG:3857", "EPSG:4326"]), FieldType::Str),
            Some(FieldValue::Str("EPSG:3857,EPSG:4326".to_string()))
        );
        assert_eq!(
            coerce(&json!({"text": "© Example", "required": true}), FieldType::Str),
            Some(FieldValue::Str("© Example".to_string()))
        );
        assert_eq!(
            coerce(&json!({"a": 1}), FieldType::Str),
            Some(FieldValue::Str("{\"a\":1}".to_string()))
        );
        assert_eq!(coerce(&json!(null), FieldType::Str), None);
    }

    #[test]
    fn record_policy_overrides_property_zooms() {
        let schema = Schema::imagery();
        let normalizer = AttributeNormalizer::new(&schema, ZoomDefaultPolicy::Record);
        let descriptor = source(json!({
            "type": "Feature",
            "properties": {"id": "z", "type": "tms", "min_zoom": 5, "max_zoom": 19}
        }));

        let entry = normalizer.normalize(&descriptor, None);
        assert_eq!(entry.property("min_zoom"), Some(&FieldValue::Int(0)));
        assert_eq!(entry.property("max_zoom"), Some(&FieldValue::Int(22)));
    }

    #[test]
    fn record_policy_respects_top_level_zooms() {
        let schema = Schema::imagery();
        let normalizer = AttributeNormalizer::new(&schema, ZoomDefaultPolicy::Record);
        let descriptor = source(json!({
            "type": "Feature",
            "min_zoom": 3,
            "max_zoom": 17,
            "properties": {"id": "z", "type": "tms", "min_zoom": 5, "max_zoom": 19}
        }));

        let entry = normalizer.normalize(&descriptor, None);
        assert_eq!(entry.property("min_zoom"), Some(&FieldValue::Int(5)));
        assert_eq!(entry.property("max_zoom"), Some(&FieldValue::Int(19)));
    }

    #[test]
    fn properties_policy_keeps_property_zooms() {
        let schema = Schema::imagery();
        let normalizer = AttributeNormalizer::new(&schema, ZoomDefaultPolicy::Properties);
        let descriptor = source(json!({
            "type": "Feature",
            "properties": {"id": "z", "type": "tms", "max_zoom": 19}
        }));

        let entry = normalizer.normalize(&descriptor, None);
        assert_eq!(entry.property("min_zoom"), Some(&FieldValue::Int(0)));
        assert_eq!(entry.property("max_zoom"), Some(&FieldValue::Int(19)));
    }
}
