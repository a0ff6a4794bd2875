//! Recorded sensor log parsing.
//!
//! One reading per line, whitespace separated:
//!
//! ```text
//! # kind  x      y      z
//! accel   0.12  -0.30   9.79
//! mag     4.10  21.70 -40.20
//! ```
//!
//! Blank lines and `#` comments are ignored. Kinds accept the long names
//! (`accelerometer`, `magnetometer`) and single letters too.

use std::path::Path;

use sunposition::orientation::{RawVector3, SensorKind};

use crate::error::CliError;

/// One parsed reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEntry {
    pub kind: SensorKind,
    pub vector: RawVector3,
}

/// Parse a whole log.
pub fn parse(text: &str) -> Result<Vec<LogEntry>, CliError> {
    let mut entries = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        entries.push(parse_line(line).map_err(|reason| CliError::SensorLog {
            line: index + 1,
            reason,
        })?);
    }
    Ok(entries)
}

/// Read and parse a log file.
pub fn read_file(path: &Path) -> Result<Vec<LogEntry>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse(&text)
}

fn parse_line(line: &str) -> Result<LogEntry, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [kind, x, y, z] = fields.as_slice() else {
        return Err(format!("expected 4 fields, found {}", fields.len()));
    };

    let kind =
        SensorKind::from_name(kind).ok_or_else(|| format!("unknown sensor kind '{}'", kind))?;

    Ok(LogEntry {
        kind,
        vector: RawVector3::new(component(x)?, component(y)?, component(z)?),
    })
}

fn component(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("invalid number '{}'", s))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("non-finite value '{}'", s))
    }
}
