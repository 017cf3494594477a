use std::fs;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::ImagerySourceDescriptor;
use crate::error::CatalogError;

pub const DESCRIPTOR_EXTENSION: &str = "geojson";

/// Finds every descriptor file below `root`, sorted by path.
pub fn discover_sources(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CatalogError> {
    if !root.as_std_path().is_dir() {
        return Err(CatalogError::SourcesNotFound(root.to_path_buf()));
    }
    let mut sources = Vec::new();
    for path in walk_dir(root.as_std_path())? {
        let is_descriptor = path.is_file()
            && path
                .extension()
                .map(|ext| ext == DESCRIPTOR_EXTENSION)
                .unwrap_or(false);
        if !is_descriptor {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(path).map_err(|path| {
            CatalogError::Filesystem(format!("non-utf8 descriptor path: {}", path.display()))
        })?;
        sources.push(path);
    }
    sources.sort();
    tracing::debug!("discovered {} descriptor(s) under {root}", sources.len());
    Ok(sources)
}

pub fn load_descriptor(path: &Utf8Path) -> Result<ImagerySourceDescriptor, CatalogError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| CatalogError::parse(path, format!("read failed: {err}")))?;
    ImagerySourceDescriptor::from_json(path, &content)
}

fn walk_dir(root: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut items = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(path) = stack.pop() {
        let entries = fs::read_dir(&path).map_err(|err| {
            CatalogError::Filesystem(format!("read dir {}: {err}", path.display()))
        })?;
        for entry in entries {
            let entry = entry.map_err(|err| CatalogError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            items.push(path);
        }
    }
    Ok(items)
}
