//! Error types surfaced by platform adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric geolocation failure reason as reported by the Geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationErrorCode {
    /// The user or the user agent refused location access.
    PermissionDenied,
    /// The position could not be determined.
    PositionUnavailable,
    /// No position was produced before the configured timeout.
    Timeout,
}

impl GeolocationErrorCode {
    /// Maps the native numeric code (`1..=3`) onto the typed reason.
    pub const fn from_native(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }

    /// Returns the stable token used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::PositionUnavailable => "position-unavailable",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for GeolocationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure captured from a native platform call.
///
/// Adapters never return this from property getters. Acquisition failures are stored in the
/// owning bridge and exposed as data through `error()` accessors; only explicit writes and
/// configuration parsing return it as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The host environment does not provide the requested API.
    #[error("{api} is not available in this environment")]
    Unsupported {
        /// Stable API identifier used in diagnostics.
        api: &'static str,
    },
    /// The native call was issued but its promise rejected.
    #[error("{api} request was rejected: {message}")]
    Rejected {
        /// Stable API identifier used in diagnostics.
        api: &'static str,
        /// Rendered rejection reason.
        message: String,
    },
    /// The Geolocation API reported an error callback.
    #[error("geolocation failed ({code}): {message}")]
    Geolocation {
        /// Typed failure reason.
        code: GeolocationErrorCode,
        /// Native error message.
        message: String,
    },
    /// A Web Storage write or delete failed (quota, security policy).
    #[error("storage operation failed: {0}")]
    Storage(String),
    /// Configuration could not be parsed.
    #[error("invalid platform configuration: {0}")]
    Config(String),
}

impl PlatformError {
    /// Builds a [`PlatformError::Rejected`] from any displayable rejection reason.
    pub fn rejected(api: &'static str, reason: impl fmt::Display) -> Self {
        Self::Rejected {
            api,
            message: reason.to_string(),
        }
    }
}
