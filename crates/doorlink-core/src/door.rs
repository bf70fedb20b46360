// Door state model and the remote-vocabulary translator.
//
// The device reports a five-plus word vocabulary; internally only
// Unsecured/Secured are written from poll observations. Opening/Closing/
// Stopped remain valid current values for command-driven updates.

/// Position of the door as tracked by the engine.
///
/// All five variants are valid *current* states; only [`Unsecured`] and
/// [`Secured`] are used as *target* states.
///
/// [`Unsecured`]: DoorState::Unsecured
/// [`Secured`]: DoorState::Secured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    /// Fully open.
    Unsecured,
    /// Fully closed.
    Secured,
    Opening,
    Closing,
    Stopped,
}

impl DoorState {
    /// Translate the device's reported state word, case-insensitively.
    ///
    /// Transient and indeterminate words collapse onto the two
    /// authoritative values: a door mid-motion is treated as already at
    /// its destination, and a stopped or unknown door as closed.
    /// Unrecognized words yield `None`.
    pub fn from_report(text: &str) -> Option<Self> {
        match text.to_uppercase().as_str() {
            "OPEN" | "OPENING" => Some(Self::Unsecured),
            "CLOSED" | "CLOSING" => Some(Self::Secured),
            "UNKNOWN" | "STOPPED" | "STOPPED-OPENING" | "STOPPED-CLOSING" => Some(Self::Secured),
            _ => None,
        }
    }

    /// The device-vocabulary label for logging and diagnostics.
    pub fn report_label(self) -> &'static str {
        match self {
            Self::Unsecured => "OPEN",
            Self::Secured => "CLOSED",
            Self::Opening => "OPENING",
            Self::Closing => "CLOSING",
            Self::Stopped => "STOPPED",
        }
    }

    /// The target state implied by observing this current state.
    ///
    /// `Stopped` implies nothing: the target is left untouched.
    pub fn derived_target(self) -> Option<Self> {
        match self {
            Self::Unsecured | Self::Opening => Some(Self::Unsecured),
            Self::Secured | Self::Closing => Some(Self::Secured),
            Self::Stopped => None,
        }
    }

    /// The current state implied by a target change.
    pub fn derived_current(self) -> Option<Self> {
        match self {
            Self::Unsecured => Some(Self::Unsecured),
            Self::Secured => Some(Self::Secured),
            _ => None,
        }
    }
}

/// Logging label for a light value.
pub fn light_label(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
