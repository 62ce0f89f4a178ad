//! Runtime configuration for the platform adapters.
//!
//! Every section defaults sensibly, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Height difference (layout viewport minus visual viewport) above which an overlay is treated
/// as a virtual keyboard.
pub const KEYBOARD_OVERLAY_THRESHOLD_PX: f64 = 120.0;

/// Top-level adapter configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Web Storage key namespacing.
    pub storage: StorageOptions,
    /// Visual viewport heuristics.
    pub viewport: ViewportOptions,
    /// Options passed to every geolocation request.
    pub geolocation: PositionOptions,
    /// Language fallbacks.
    pub languages: LanguageOptions,
}

impl PlatformConfig {
    /// Parses a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Config`] when the document is not valid JSON or has fields of the
    /// wrong type.
    pub fn from_json_str(raw: &str) -> Result<Self, PlatformError> {
        serde_json::from_str(raw).map_err(|err| PlatformError::Config(err.to_string()))
    }
}

/// Options for [`StorageData`](crate::storage::StorageData).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Prepended to every key before it reaches the storage area.
    pub prefix: String,
}

/// Options for [`ViewportInfo`](crate::viewport::ViewportInfo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    /// See [`KEYBOARD_OVERLAY_THRESHOLD_PX`].
    pub keyboard_overlay_threshold_px: f64,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            keyboard_overlay_threshold_px: KEYBOARD_OVERLAY_THRESHOLD_PX,
        }
    }
}

/// `PositionOptions` of the Geolocation API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionOptions {
    /// `enableHighAccuracy`
    pub enable_high_accuracy: bool,
    /// `timeout`; `None` waits indefinitely.
    pub timeout_ms: Option<u32>,
    /// `maximumAge`; `None` means `0` (no cached fixes).
    pub maximum_age_ms: Option<u32>,
}

/// Options for [`PreferredLanguages`](crate::languages::PreferredLanguages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageOptions {
    /// Reported when neither a header nor the navigator provides a language.
    pub fallback_language: String,
}

impl Default for LanguageOptions {
    fn default() -> Self {
        Self {
            fallback_language: "en".to_string(),
        }
    }
}
