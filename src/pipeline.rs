use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::discovery::load_descriptor;
use crate::domain::{CatalogEntry, ImagerySourceDescriptor};
use crate::error::CatalogError;
use crate::filter::{EligibilityFilter, SkipReason};
use crate::geometry;
use crate::normalize::AttributeNormalizer;
use crate::schema::Schema;
use crate::writer::CatalogSink;

#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Kept(CatalogEntry),
    Skipped { id: String, reason: SkipReason },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Record parse and geometry failures per source instead of aborting the run.
    pub keep_going: bool,
    pub jobs: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            keep_going: false,
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub discovered: usize,
    pub kept: Vec<String>,
    pub skipped: Vec<SkippedSource>,
    pub failed: Vec<FailedSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedSource {
    pub id: String,
    pub path: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedSource {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => debug!("{}", event.message),
        }
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn event(&self, _event: ProgressEvent) {}
}

/// Runs sources through repair, simplification, filtering and normalization.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CatalogConfig,
    schema: Schema,
    current_year: i32,
}

impl Pipeline {
    pub fn new(config: CatalogConfig, schema: Schema, current_year: i32) -> Self {
        Self {
            config,
            schema,
            current_year,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn process(&self, source: &ImagerySourceDescriptor) -> Result<SourceOutcome, CatalogError> {
        let repaired = geometry::repair(&source.id, source.geometry.clone())?;
        let simplified =
            geometry::simplify(&source.id, repaired, self.config.simplify_tolerance)?;

        let filter = EligibilityFilter::new(&self.config, self.current_year);
        if let Err(reason) = filter.evaluate(source) {
            debug!(source = source.id.as_str(), "skipped: {reason}");
            return Ok(SourceOutcome::Skipped {
                id: source.id.clone(),
                reason,
            });
        }

        let normalizer = AttributeNormalizer::new(&self.schema, self.config.zoom_defaults);
        Ok(SourceOutcome::Kept(normalizer.normalize(source, simplified)))
    }

    pub fn process_path(&self, path: &Utf8Path) -> Result<SourceOutcome, CatalogError> {
        let source = load_descriptor(path)?;
        self.process(&source)
    }

    /// Processes `paths` and writes kept entries to `sink` in input order.
    ///
    /// Without `keep_going` the first parse or geometry error is returned as is.
    pub fn run(
        &self,
        paths: &[Utf8PathBuf],
        sink: &mut dyn CatalogSink,
        options: &RunOptions,
        progress: &dyn ProgressSink,
    ) -> Result<RunReport, CatalogError> {
        let start = Instant::now();
        let mut report = RunReport {
            discovered: paths.len(),
            ..RunReport::default()
        };
        progress.event(ProgressEvent {
            message: format!("processing {} source(s)", paths.len()),
            elapsed: None,
        });

        if options.jobs > 1 {
            for (path, outcome) in self.process_parallel(paths, options.jobs)? {
                record(path, outcome, sink, options, progress, &mut report)?;
            }
        } else {
            for path in paths {
                record(path, self.process_path(path), sink, options, progress, &mut report)?;
            }
        }

        progress.event(ProgressEvent {
            message: format!(
                "kept {}, skipped {}, failed {}",
                report.kept.len(),
                report.skipped.len(),
                report.failed.len()
            ),
            elapsed: Some(start.elapsed()),
        });
        Ok(report)
    }

    fn process_parallel<'p>(
        &self,
        paths: &'p [Utf8PathBuf],
        jobs: usize,
    ) -> Result<Vec<(&'p Utf8PathBuf, Result<SourceOutcome, CatalogError>)>, CatalogError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|err| CatalogError::InvalidConfig(format!("worker pool: {err}")))?;
        Ok(pool.install(|| {
            paths
                .par_iter()
                .map(|path| (path, self.process_path(path)))
                .collect()
        }))
    }
}

fn record(
    path: &Utf8Path,
    outcome: Result<SourceOutcome, CatalogError>,
    sink: &mut dyn CatalogSink,
    options: &RunOptions,
    progress: &dyn ProgressSink,
    report: &mut RunReport,
) -> Result<(), CatalogError> {
    match outcome {
        Ok(SourceOutcome::Kept(entry)) => {
            sink.write(&entry)?;
            progress.event(ProgressEvent {
                message: format!("kept {}", entry.id),
                elapsed: None,
            });
            report.kept.push(entry.id);
        }
        Ok(SourceOutcome::Skipped { id, reason }) => {
            progress.event(ProgressEvent {
                message: format!("skipped {id}: {reason}"),
                elapsed: None,
            });
            report.skipped.push(SkippedSource {
                id,
                path: path.to_string(),
                reason,
            });
        }
        Err(err) if options.keep_going => {
            warn!("{path}: {err}");
            report.failed.push(FailedSource {
                path: path.to_string(),
                error: err.to_string(),
            });
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use camino::Utf8Path;
    use serde_json::json;

    use super::*;

    #[test]
    fn broken_geometry_is_fatal_even_for_skipped_sources() {
        let pipeline = Pipeline::new(CatalogConfig::default(), Schema::imagery(), 2024);
        let source = ImagerySourceDescriptor::from_value(
            Utf8Path::new("line.geojson"),
            json!({
                "type": "Feature",
                "properties": {"id": "osmbe", "type": "tms"},
                "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}
            }),
        )
        .unwrap();

        let err = pipeline.process(&source).unwrap_err();
        assert_matches!(err, CatalogError::InvalidGeometry { ref id, .. } if id == "osmbe");
    }
}
