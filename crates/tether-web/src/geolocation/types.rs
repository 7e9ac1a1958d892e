use std::fmt;
use std::rc::Rc;

use web_time::{Duration, SystemTime, UNIX_EPOCH};

/// Options passed to every provider, mirroring `PositionOptions`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeolocationParams {
    pub maximum_age: Option<Duration>,
    pub timeout: Option<Duration>,
    pub enable_high_accuracy: bool,
}

impl GeolocationParams {
    pub fn maximum_age(mut self, age: Duration) -> Self {
        self.maximum_age = Some(age);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn high_accuracy(mut self) -> Self {
        self.enable_high_accuracy = true;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Self::default()
        }
    }
}

/// A fix as delivered by a provider.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub coords: Coordinates,
    /// Milliseconds since the Unix epoch.
    pub timestamp: f64,
}

impl Position {
    pub fn new(coords: Coordinates, timestamp: f64) -> Self {
        Self { coords, timestamp }
    }

    /// A position stamped with the current wall-clock time.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default();
        Self::new(Coordinates::new(latitude, longitude), timestamp)
    }

    pub fn location(&self) -> Location {
        Location {
            latitude: self.coords.latitude,
            longitude: self.coords.longitude,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// `GeolocationPositionError` codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl PositionErrorCode {
    /// Maps the numeric codes browsers use (1, 2, 3).
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::PermissionDenied),
            2 => Some(Self::PositionUnavailable),
            3 => Some(Self::Timeout),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::PositionUnavailable => "POSITION_UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for PositionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(PositionErrorCode::PermissionDenied, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(PositionErrorCode::PositionUnavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PositionErrorCode::Timeout, message)
    }
}

/// Everything that can show up on `reporting.failed`.
///
/// Errors from the platform API (and custom providers that choose to speak
/// its language) are [`GeolocationError::Position`]; anything else a custom
/// provider fails with is passed through untouched as
/// [`GeolocationError::Provider`].
#[derive(Clone, Debug, thiserror::Error)]
pub enum GeolocationError {
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error("geolocation provider failed: {0}")]
    Provider(Rc<dyn std::error::Error>),
}

impl GeolocationError {
    pub fn provider(err: impl std::error::Error + 'static) -> Self {
        Self::Provider(Rc::new(err))
    }

    pub fn code(&self) -> Option<PositionErrorCode> {
        match self {
            Self::Position(err) => Some(err.code),
            Self::Provider(_) => None,
        }
    }
}
