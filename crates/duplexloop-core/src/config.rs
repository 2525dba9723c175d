//! Loopback session configuration
//!
//! Stored as JSON. Every field has a default so partial files are accepted.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_record_seconds() -> u32 {
    crate::MAX_RECORD_SECONDS
}

fn default_loop_playback() -> bool {
    true
}

fn default_peak_decay() -> f32 {
    crate::DEFAULT_PEAK_DECAY
}

fn default_event_capacity() -> usize {
    64
}

fn default_bridge_capacity_frames() -> usize {
    16384
}

/// Loopback session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// Seconds of history kept per recording direction
    #[serde(default = "default_max_record_seconds")]
    pub max_record_seconds: u32,
    /// Whether the clip restarts from the beginning when it ends
    #[serde(default = "default_loop_playback")]
    pub loop_playback: bool,
    /// Per-sample multiplicative decay of the peak detectors (0.0..=1.0)
    #[serde(default = "default_peak_decay")]
    pub peak_decay: f32,
    /// Capacity of the audio-to-control event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Frames of input buffered between the input and output callbacks
    #[serde(default = "default_bridge_capacity_frames")]
    pub bridge_capacity_frames: usize,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            max_record_seconds: default_max_record_seconds(),
            loop_playback: default_loop_playback(),
            peak_decay: default_peak_decay(),
            event_capacity: default_event_capacity(),
            bridge_capacity_frames: default_bridge_capacity_frames(),
        }
    }
}

impl LoopbackConfig {
    /// Read session settings from `path`
    ///
    /// A missing or malformed file is not fatal: the session runs with the
    /// built-in settings and the problem is logged.
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Cannot read loopback settings, running with built-in settings"
                );
                return Self::default();
            }
        };

        match serde_json::from_str::<Self>(&contents) {
            Ok(config) => {
                tracing::info!(
                    path = %path.display(),
                    max_record_seconds = config.max_record_seconds,
                    loop_playback = config.loop_playback,
                    peak_decay = config.peak_decay,
                    "Loopback settings read"
                );
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Loopback settings are not valid JSON, running with built-in settings"
                );
                Self::default()
            }
        }
    }

    /// Write the settings as pretty JSON, creating missing directories
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write loopback settings to {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loopback settings written");
        Ok(())
    }
}
