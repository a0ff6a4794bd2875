//! Tracker configuration.
//!
//! `TrackerConfig` groups the tunables of every stage. It has sensible
//! defaults, builder-style setters, and can be read from an INI file:
//!
//! ```ini
//! [compass]
//! low_pass_alpha = 0.05
//!
//! [sun]
//! refresh_interval_secs = 600
//! location_timeout_secs = 30
//! hour_offset = 0
//!
//! [output]
//! throttle_interval_ms = 10
//! channel_capacity = 256
//! ```
//!
//! Missing keys keep their defaults.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use crate::error::ConfigError;
use crate::freshness::DEFAULT_STALENESS_THRESHOLD;
use crate::orientation::DEFAULT_LOW_PASS_ALPHA;

/// Default timeout for a location fix.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default output rate limit interval.
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(10);

/// Default capacity of the frame broadcast channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default capacity of the sensor event channel.
pub const DEFAULT_SENSOR_CHANNEL_CAPACITY: usize = 1024;

/// Largest accepted hour offset in either direction.
pub const MAX_HOUR_OFFSET: i64 = 48;

const SECTION_COMPASS: &str = "compass";
const SECTION_SUN: &str = "sun";
const SECTION_OUTPUT: &str = "output";

/// Orientation filter settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassConfig {
    /// Low-pass smoothing factor in (0, 1].
    pub low_pass_alpha: f64,
    /// Sensor events buffered between the platform and the fusion task.
    pub sensor_channel_capacity: usize,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            low_pass_alpha: DEFAULT_LOW_PASS_ALPHA,
            sensor_channel_capacity: DEFAULT_SENSOR_CHANNEL_CAPACITY,
        }
    }
}

/// Astronomical query settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// A result older than this is re-queried on resume.
    pub refresh_interval: Duration,
    /// Give up on the location provider after this long.
    pub location_timeout: Duration,
    /// Hours added to the current time before computing the sun position.
    pub hour_offset: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_STALENESS_THRESHOLD,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            hour_offset: 0,
        }
    }
}

/// Output stream settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Interval for the "last value per interval" rate limiter.
    pub throttle_interval: Duration,
    /// Capacity of the broadcast channels carrying frames.
    pub channel_capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Configuration for a [`SunTracker`](crate::session::SunTracker).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerConfig {
    pub compass: CompassConfig,
    pub query: QueryConfig,
    pub output: OutputConfig,
}

impl TrackerConfig {
    /// Set the low-pass smoothing factor.
    pub fn with_low_pass_alpha(mut self, alpha: f64) -> Self {
        self.compass.low_pass_alpha = alpha;
        self
    }

    /// Set the staleness threshold for re-querying.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.query.refresh_interval = interval;
        self
    }

    /// Set the location fix timeout.
    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.query.location_timeout = timeout;
        self
    }

    /// Set the hour offset applied to query times.
    pub fn with_hour_offset(mut self, hours: i64) -> Self {
        self.query.hour_offset = hours;
        self
    }

    /// Set the output throttle interval.
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.output.throttle_interval = interval;
        self
    }

    /// Set the frame channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.output.channel_capacity = capacity;
        self
    }

    /// Load from an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Load from the default path, falling back to defaults if it is absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(alpha) = parse_key::<f64>(ini, SECTION_COMPASS, "low_pass_alpha")? {
            config.compass.low_pass_alpha = alpha;
        }
        if let Some(capacity) = parse_key::<usize>(ini, SECTION_COMPASS, "sensor_channel_capacity")? {
            config.compass.sensor_channel_capacity = capacity;
        }
        if let Some(secs) = parse_key::<u64>(ini, SECTION_SUN, "refresh_interval_secs")? {
            config.query.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_key::<u64>(ini, SECTION_SUN, "location_timeout_secs")? {
            config.query.location_timeout = Duration::from_secs(secs);
        }
        if let Some(hours) = parse_key::<i64>(ini, SECTION_SUN, "hour_offset")? {
            config.query.hour_offset = hours;
        }
        if let Some(ms) = parse_key::<u64>(ini, SECTION_OUTPUT, "throttle_interval_ms")? {
            config.output.throttle_interval = Duration::from_millis(ms);
        }
        if let Some(capacity) = parse_key::<usize>(ini, SECTION_OUTPUT, "channel_capacity")? {
            config.output.channel_capacity = capacity;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let alpha = self.compass.low_pass_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(invalid(SECTION_COMPASS, "low_pass_alpha", alpha, "must be in (0, 1]"));
        }
        if self.compass.sensor_channel_capacity == 0 {
            return Err(invalid(SECTION_COMPASS, "sensor_channel_capacity", 0, "must be positive"));
        }
        if self.query.location_timeout.is_zero() {
            return Err(invalid(SECTION_SUN, "location_timeout_secs", 0, "must be positive"));
        }
        if self.query.hour_offset.abs() > MAX_HOUR_OFFSET {
            return Err(invalid(
                SECTION_SUN,
                "hour_offset",
                self.query.hour_offset,
                "must be within ±48 hours",
            ));
        }
        if self.output.channel_capacity == 0 {
            return Err(invalid(SECTION_OUTPUT, "channel_capacity", 0, "must be positive"));
        }
        Ok(())
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sunposition").join("config.ini"))
}

fn parse_key<T>(ini: &Ini, section: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match ini.get_from(Some(section), key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(section, key, raw, e)),
    }
}

fn invalid(section: &str, key: &str, value: impl Display, reason: impl Display) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
