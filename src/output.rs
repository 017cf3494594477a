use std::io::{self, Write};

use serde::Serialize;

use crate::pipeline::{ProgressEvent, ProgressSink, RunReport};
use crate::schema::Schema;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_schema(schema: &Schema) -> io::Result<()> {
        Self::print_json(schema)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct HumanOutput;

impl HumanOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(
            stdout,
            "{} source(s): {} kept, {} skipped, {} failed",
            report.discovered,
            report.kept.len(),
            report.skipped.len(),
            report.failed.len()
        )?;
        for skipped in &report.skipped {
            writeln!(stdout, "  skip {} ({})", skipped.id, skipped.reason)?;
        }
        for failed in &report.failed {
            writeln!(stdout, "  FAIL {}: {}", failed.path, failed.error)?;
        }
        Ok(())
    }

    pub fn print_schema(schema: &Schema) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for field in schema.fields() {
            writeln!(stdout, "{:<24}{}", field.name, field.field_type)?;
        }
        Ok(())
    }
}
