use std::fs;
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value, json};
use tempfile::NamedTempFile;

use crate::domain::CatalogEntry;
use crate::error::CatalogError;
use crate::geometry::round_coordinates;

pub const WGS84_CRS_NAME: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// Receives the entries that survive the pipeline, one at a time.
pub trait CatalogSink {
    fn write(&mut self, entry: &CatalogEntry) -> Result<(), CatalogError>;
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub entries: Vec<CatalogEntry>,
}

impl CatalogSink for MemorySink {
    fn write(&mut self, entry: &CatalogEntry) -> Result<(), CatalogError> {
        self.entries.push(entry.clone());
        Ok(())
    }
}

/// Streams a GeoJSON FeatureCollection into a temp file next to `target`; nothing
/// appears at `target` until [`GeoJsonCatalogWriter::finish`] succeeds.
pub struct GeoJsonCatalogWriter {
    target: Utf8PathBuf,
    precision: u32,
    out: BufWriter<NamedTempFile>,
    written: usize,
}

impl GeoJsonCatalogWriter {
    pub fn create(target: &Utf8Path, precision: u32) -> Result<Self, CatalogError> {
        let parent = match target.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("imagery-catalog")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;

        let mut out = BufWriter::new(temp);
        let crs = json!({"type": "name", "properties": {"name": WGS84_CRS_NAME}});
        write!(out, "{{\"type\":\"FeatureCollection\",\"crs\":{crs},\"features\":[")
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;

        Ok(Self {
            target: target.to_path_buf(),
            precision,
            out,
            written: 0,
        })
    }

    pub fn finish(mut self) -> Result<Utf8PathBuf, CatalogError> {
        self.out
            .write_all(b"]}\n")
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        let temp = self
            .out
            .into_inner()
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        temp.persist(self.target.as_std_path())
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        tracing::info!("wrote {} entries to {}", self.written, self.target);
        Ok(self.target)
    }

    pub fn feature(entry: &CatalogEntry, precision: u32) -> geojson::Feature {
        let properties = entry
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value)))
            .collect::<Map<_, _>>();
        let geometry = entry.geometry.as_ref().map(|geometry| {
            geojson::Geometry::new(geojson::Value::from(&round_coordinates(
                geometry, precision,
            )))
        });
        geojson::Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

impl CatalogSink for GeoJsonCatalogWriter {
    fn write(&mut self, entry: &CatalogEntry) -> Result<(), CatalogError> {
        if self.written > 0 {
            self.out
                .write_all(b",")
                .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        }
        self.out
            .write_all(b"\n")
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        let feature = Self::feature(entry, self.precision);
        serde_json::to_writer(&mut self.out, &feature)
            .map_err(|err| CatalogError::Serialize(format!("source {}: {err}", entry.id)))?;
        self.written += 1;
        Ok(())
    }
}
