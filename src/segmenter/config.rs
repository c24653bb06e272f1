use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use super::naming::DEFAULT_EXTENSION;

/// 20 MiB, the size a single segment should never exceed.
pub const DEFAULT_MAX_SEGMENT_SIZE_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_TRIGGER_THRESHOLD_RATIO: f64 = 0.95;
pub const DEFAULT_COOLDOWN_MS: u64 = 2_000;

/// Tunables for one segment monitor. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Hard upper bound for a segment file.
    pub max_segment_size_bytes: u64,

    /// Polling period for the active file's size.
    pub check_interval_ms: u64,

    /// Fraction of `max_segment_size_bytes` at which a rollover is requested.
    /// Lower values leave more headroom but produce more segments.
    pub trigger_threshold_ratio: f64,

    /// Pause after a rollover request before the active file is measured again.
    pub cooldown_ms: u64,

    /// Extension given to generated segment names, including the leading dot.
    pub extension: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_segment_size_bytes: DEFAULT_MAX_SEGMENT_SIZE_BYTES,
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            trigger_threshold_ratio: DEFAULT_TRIGGER_THRESHOLD_RATIO,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            extension: DEFAULT_EXTENSION.into(),
        }
    }
}

impl SegmenterConfig {
    /// Reads a JSON config file. A missing file yields the defaults; absent keys
    /// fall back to their default values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read segmenter config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid segmenter config in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write segmenter config to {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_segment_size_bytes == 0 {
            bail!("max_segment_size_bytes must be greater than zero");
        }
        if self.check_interval_ms == 0 {
            bail!("check_interval_ms must be greater than zero");
        }
        if !(self.trigger_threshold_ratio > 0.0 && self.trigger_threshold_ratio <= 1.0) {
            bail!(
                "trigger_threshold_ratio must be within (0, 1], got {}",
                self.trigger_threshold_ratio
            );
        }
        if !self.extension.starts_with('.') || self.extension.len() < 2 {
            bail!("extension must start with '.', got {:?}", self.extension);
        }
        Ok(())
    }

    /// Size at which a rollover is requested: `floor(max * ratio)`.
    pub fn trigger_size(&self) -> u64 {
        (self.max_segment_size_bytes as f64 * self.trigger_threshold_ratio).floor() as u64
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}
