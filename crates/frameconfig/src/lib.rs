use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration of the fieldframe daemon.
///
/// Durations accept either a bare number of seconds or a human-readable
/// string such as `"33ms"` or `"1m 30s"`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrameConfig {
    pub version: u32,
    pub display: DisplayConfig,
    #[serde(default)]
    pub camera: CameraTimings,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// Interval between pipeline ticks.
    #[serde(default = "default_tick", deserialize_with = "deserialize_duration")]
    pub tick: Duration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraTimings {
    /// Duration of the upward pan sweep.
    #[serde(default = "default_pan_up", deserialize_with = "deserialize_duration")]
    pub pan_up: Duration,
    /// Duration of the downward pan sweep.
    #[serde(
        default = "default_pan_down",
        deserialize_with = "deserialize_duration"
    )]
    pub pan_down: Duration,
    /// Duration of one zoom half-sweep.
    #[serde(default = "default_zoom", deserialize_with = "deserialize_duration")]
    pub zoom: Duration,
}

impl Default for CameraTimings {
    fn default() -> Self {
        Self {
            pan_up: default_pan_up(),
            pan_down: default_pan_down(),
            zoom: default_zoom(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RotationConfig {
    /// Seed for the asset rotation policy; derived from entropy when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetEntry {
    /// Pack name or directory path, resolved against the asset search roots.
    pub handle: String,
}

fn default_tick() -> Duration {
    Duration::from_millis(33)
}

fn default_pan_up() -> Duration {
    Duration::from_secs(8)
}

fn default_pan_down() -> Duration {
    Duration::from_secs(3)
}

fn default_zoom() -> Duration {
    Duration::from_secs(5)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl FrameConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FrameConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "display dimensions must be nonzero, got {}x{}",
                self.display.width, self.display.height
            )));
        }

        if self.display.tick < Duration::from_millis(1) {
            return Err(ConfigError::Invalid(
                "display tick must be at least 1ms".into(),
            ));
        }

        if self.assets.is_empty() {
            return Err(ConfigError::Invalid(
                "config must declare at least one asset".into(),
            ));
        }

        for entry in &self.assets {
            if entry.handle.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "asset entries must carry a non-empty handle".into(),
                ));
            }
        }

        for (name, duration) in [
            ("camera.pan_up", self.camera.pan_up),
            ("camera.pan_down", self.camera.pan_down),
            ("camera.zoom", self.camera.zoom),
        ] {
            if duration.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }
}
