use std::fmt;

use serde::Serialize;

use crate::config::CatalogConfig;
use crate::domain::{ImagerySourceDescriptor, ImageryType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Denylisted,
    UnsupportedType { kind: String },
    MissingProjections,
    NoSupportedProjection,
    Outdated { end_year: i32 },
    UnparsableEndDate { end_date: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Denylisted => write!(f, "id is on the denylist"),
            SkipReason::UnsupportedType { kind } => write!(f, "unsupported imagery type {kind:?}"),
            SkipReason::MissingProjections => write!(f, "wms source without available_projections"),
            SkipReason::NoSupportedProjection => write!(f, "no supported projection"),
            SkipReason::Outdated { end_year } => write!(f, "imagery ended in {end_year}"),
            SkipReason::UnparsableEndDate { end_date } => {
                write!(f, "cannot read a year from end_date {end_date:?}")
            }
        }
    }
}

/// Decides whether a source belongs in the catalog. All predicates must hold.
pub struct EligibilityFilter<'a> {
    config: &'a CatalogConfig,
    current_year: i32,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(config: &'a CatalogConfig, current_year: i32) -> Self {
        Self {
            config,
            current_year,
        }
    }

    pub fn evaluate(&self, source: &ImagerySourceDescriptor) -> Result<(), SkipReason> {
        self.check_denylist(source)?;
        let imagery_type = self.check_type(source)?;
        if imagery_type == ImageryType::Wms {
            self.check_projections(source)?;
        }
        self.check_age(source)
    }

    fn check_denylist(&self, source: &ImagerySourceDescriptor) -> Result<(), SkipReason> {
        if self.config.denylist.contains(&source.id) {
            return Err(SkipReason::Denylisted);
        }
        Ok(())
    }

    fn check_type(&self, source: &ImagerySourceDescriptor) -> Result<ImageryType, SkipReason> {
        source
            .imagery_type()
            .ok_or_else(|| SkipReason::UnsupportedType {
                kind: source.kind.clone(),
            })
    }

    fn check_projections(&self, source: &ImagerySourceDescriptor) -> Result<(), SkipReason> {
        let projections = source
            .available_projections()
            .filter(|codes| !codes.is_empty())
            .ok_or(SkipReason::MissingProjections)?;
        if projections
            .iter()
            .any(|code| self.config.supported_projections.contains(*code))
        {
            Ok(())
        } else {
            Err(SkipReason::NoSupportedProjection)
        }
    }

    fn check_age(&self, source: &ImagerySourceDescriptor) -> Result<(), SkipReason> {
        let end_date = match source.property("end_date") {
            None | Some(serde_json::Value::Null) => return Ok(()),
            Some(end_date) => end_date,
        };
        let end_date = match end_date {
            serde_json::Value::String(value) => value.clone(),
            other => other.to_string(),
        };
        let end_year = leading_year(&end_date).ok_or_else(|| SkipReason::UnparsableEndDate {
            end_date: end_date.clone(),
        })?;
        if self.current_year.saturating_sub(end_year) < self.config.max_age_years {
            Ok(())
        } else {
            Err(SkipReason::Outdated { end_year })
        }
    }
}

fn leading_year(end_date: &str) -> Option<i32> {
    end_date.split('-').next()?.trim().parse().ok()
}
