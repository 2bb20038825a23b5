//! Player settings and preferences
//!
//! Persisted separately from scores, through the same storage backend.

use serde::{Deserialize, Serialize};

use crate::highscores::STORAGE_PREFIX;
use crate::persistence::{self, Storage};
use crate::sim::tap::TapDuration;

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute all cues
    pub muted: bool,
    /// Mute when the page loses focus
    pub mute_on_blur: bool,

    // === Games ===
    /// Duration preselected when Tap Frenzy opens
    pub tap_duration: TapDuration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            mute_on_blur: true,
            tap_duration: TapDuration::Ten,
        }
    }
}

impl Settings {
    fn storage_key() -> String {
        format!("{}settings", STORAGE_PREFIX)
    }

    /// Volume actually applied to cues
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Load settings, falling back to defaults when absent or corrupted
    pub fn load(storage: &dyn Storage) -> Self {
        match persistence::read_versioned(storage, &Self::storage_key()) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        match persistence::write_versioned(storage, &Self::storage_key(), self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}
