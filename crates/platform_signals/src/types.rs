//! Value types shared between native API contracts and adapters.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Effective connection class reported by the Network Information API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EffectiveConnectionType {
    /// `slow-2g`
    #[serde(rename = "slow-2g")]
    Slow2g,
    /// `2g`
    #[serde(rename = "2g")]
    TwoG,
    /// `3g`
    #[serde(rename = "3g")]
    ThreeG,
    /// `4g`
    #[serde(rename = "4g")]
    FourG,
    /// Unreported or unrecognized connection class.
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl EffectiveConnectionType {
    /// Returns the native string token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slow2g => "slow-2g",
            Self::TwoG => "2g",
            Self::ThreeG => "3g",
            Self::FourG => "4g",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a native token; unrecognized tokens map to [`EffectiveConnectionType::Unknown`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "slow-2g" => Self::Slow2g,
            "2g" => Self::TwoG,
            "3g" => Self::ThreeG,
            "4g" => Self::FourG,
            _ => Self::Unknown,
        }
    }

    /// `true` for `slow-2g` and `2g`.
    pub const fn is_slow(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG)
    }
}

impl fmt::Display for EffectiveConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `document.visibilityState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityState {
    /// The page is at least partially visible.
    #[default]
    Visible,
    /// The page is hidden (background tab, minimized window).
    Hidden,
}

/// `screen.orientation.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationType {
    /// `portrait-primary`
    #[default]
    PortraitPrimary,
    /// `portrait-secondary`
    PortraitSecondary,
    /// `landscape-primary`
    LandscapePrimary,
    /// `landscape-secondary`
    LandscapeSecondary,
}

impl OrientationType {
    /// Returns the native string token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PortraitPrimary => "portrait-primary",
            Self::PortraitSecondary => "portrait-secondary",
            Self::LandscapePrimary => "landscape-primary",
            Self::LandscapeSecondary => "landscape-secondary",
        }
    }

    /// Parses a native token; unrecognized tokens map to the default.
    pub fn from_token(token: &str) -> Self {
        match token {
            "portrait-secondary" => Self::PortraitSecondary,
            "landscape-primary" => Self::LandscapePrimary,
            "landscape-secondary" => Self::LandscapeSecondary,
            _ => Self::PortraitPrimary,
        }
    }

    /// Returns whether the orientation is one of the landscape variants.
    pub const fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapePrimary | Self::LandscapeSecondary)
    }
}

/// Permission names understood by `navigator.permissions.query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionName {
    /// `accelerometer`
    Accelerometer,
    /// `background-sync`
    BackgroundSync,
    /// `camera`
    Camera,
    /// `clipboard-read`
    ClipboardRead,
    /// `clipboard-write`
    ClipboardWrite,
    /// `geolocation`
    Geolocation,
    /// `gyroscope`
    Gyroscope,
    /// `magnetometer`
    Magnetometer,
    /// `microphone`
    Microphone,
    /// `midi`
    Midi,
    /// `notifications`
    Notifications,
    /// `persistent-storage`
    PersistentStorage,
    /// `push`
    Push,
    /// `screen-wake-lock`
    ScreenWakeLock,
}

impl PermissionName {
    /// Every known permission name.
    pub const ALL: [Self; 14] = [
        Self::Accelerometer,
        Self::BackgroundSync,
        Self::Camera,
        Self::ClipboardRead,
        Self::ClipboardWrite,
        Self::Geolocation,
        Self::Gyroscope,
        Self::Magnetometer,
        Self::Microphone,
        Self::Midi,
        Self::Notifications,
        Self::PersistentStorage,
        Self::Push,
        Self::ScreenWakeLock,
    ];

    /// Returns the descriptor name passed to the native query.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accelerometer => "accelerometer",
            Self::BackgroundSync => "background-sync",
            Self::Camera => "camera",
            Self::ClipboardRead => "clipboard-read",
            Self::ClipboardWrite => "clipboard-write",
            Self::Geolocation => "geolocation",
            Self::Gyroscope => "gyroscope",
            Self::Magnetometer => "magnetometer",
            Self::Microphone => "microphone",
            Self::Midi => "midi",
            Self::Notifications => "notifications",
            Self::PersistentStorage => "persistent-storage",
            Self::Push => "push",
            Self::ScreenWakeLock => "screen-wake-lock",
        }
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown permission name `{s}`"))
    }
}

/// Current decision for a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Access was granted.
    Granted,
    /// Access was denied.
    Denied,
    /// The user has not decided yet.
    #[default]
    Prompt,
}

impl PermissionState {
    /// Parses a native token; unknown tokens map to [`PermissionState::Prompt`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            _ => Self::Prompt,
        }
    }
}

/// `GeolocationCoordinates` without methods.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoCoordinates {
    /// Accuracy of latitude/longitude in meters.
    pub accuracy: f64,
    /// Altitude in meters, when known.
    pub altitude: Option<f64>,
    /// Accuracy of the altitude in meters, when known.
    pub altitude_accuracy: Option<f64>,
    /// Heading in degrees clockwise from true north, when known.
    pub heading: Option<f64>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Ground speed in meters per second, when known.
    pub speed: Option<f64>,
}

/// `GeolocationPosition` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Reported coordinates.
    pub coords: GeoCoordinates,
    /// Epoch timestamp in milliseconds; `0` before the first fix.
    pub timestamp: f64,
}

/// Web Storage area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// `window.localStorage`
    Local,
    /// `window.sessionStorage`
    Session,
}

impl StorageKind {
    /// Returns the stable token used in labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Session => "session",
        }
    }
}

/// Payload of a cross-document `storage` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key; `None` when the whole area was cleared.
    pub key: Option<String>,
    /// Area the change happened in; `None` when it could not be identified.
    pub area: Option<StorageKind>,
    /// Previous value.
    pub old_value: Option<String>,
    /// New value; `None` on removal.
    pub new_value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_tokens_round_trip_and_classify() {
        for token in ["slow-2g", "2g", "3g", "4g", "unknown"] {
            assert_eq!(EffectiveConnectionType::from_token(token).as_str(), token);
        }
        assert_eq!(
            EffectiveConnectionType::from_token("5g"),
            EffectiveConnectionType::Unknown
        );
        assert!(EffectiveConnectionType::Slow2g.is_slow());
        assert!(EffectiveConnectionType::TwoG.is_slow());
        assert!(!EffectiveConnectionType::ThreeG.is_slow());
    }

    #[test]
    fn orientation_tokens_fall_back_to_portrait_primary() {
        assert_eq!(
            OrientationType::from_token("landscape-secondary"),
            OrientationType::LandscapeSecondary
        );
        assert_eq!(
            OrientationType::from_token("sideways"),
            OrientationType::PortraitPrimary
        );
        assert!(OrientationType::from_token("landscape-primary").is_landscape());
    }

    #[test]
    fn permission_names_parse_from_descriptor_tokens() {
        for name in PermissionName::ALL {
            assert_eq!(name.as_str().parse::<PermissionName>(), Ok(name));
        }
        assert!("teleport".parse::<PermissionName>().is_err());
    }

    #[test]
    fn serde_uses_native_tokens() {
        assert_eq!(
            serde_json::to_string(&EffectiveConnectionType::Slow2g).expect("serialize"),
            "\"slow-2g\""
        );
        assert_eq!(
            serde_json::to_string(&OrientationType::LandscapeSecondary).expect("serialize"),
            "\"landscape-secondary\""
        );
        assert_eq!(
            serde_json::to_string(&PermissionName::ScreenWakeLock).expect("serialize"),
            "\"screen-wake-lock\""
        );
    }
}
