//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sunposition::config::TrackerConfig;
use sunposition::freshness::default_state_path;

use crate::error::CliError;

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<TrackerConfig, CliError> {
    let config = match path {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::load_default()?,
    };
    Ok(config)
}

/// Resolve the freshness state file: CLI argument first, then the default.
pub fn resolve_state_path(cli_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    cli_path.or_else(default_state_path).ok_or_else(|| {
        CliError::Argument(
            "No data directory available for the state file. Use --state-file".to_string(),
        )
    })
}

/// Render a duration as `1h 02m 03s`, `4m 05s` or `6s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(6)), "6s");
        assert_eq!(format_duration(Duration::from_secs(245)), "4m 05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03s");
    }

    #[test]
    fn test_explicit_state_path_wins() {
        let path = PathBuf::from("/tmp/custom.json");
        assert_eq!(resolve_state_path(Some(path.clone())).unwrap(), path);
    }

    #[test]
    fn test_load_explicit_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[sun]\nhour_offset = 2\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.query.hour_offset, 2);
    }
}
