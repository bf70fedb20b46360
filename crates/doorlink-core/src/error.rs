use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the reconciliation engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A gateway exchange failed during state determination. Propagated
    /// unchanged so the polling loop can log the underlying cause.
    #[error(transparent)]
    Api(#[from] doorlink_api::Error),

    /// The device reported a state word outside its documented vocabulary.
    #[error("The reported door state was unrecognized: {raw:?}")]
    UnrecognizedState { raw: String },

    /// A commanded action failed; the tracked state was left untouched.
    #[error("Command to operate the {subject} failed: {source}")]
    CommandFailed {
        subject: &'static str,
        #[source]
        source: doorlink_api::Error,
    },

    /// A light command was issued against a device with no light block
    /// configured.
    #[error("No light is configured for this device")]
    LightNotConfigured,

    /// The current state has not been confirmed by the device for too
    /// long. Synthesized at read time; never mutates state.
    #[error(
        "The {subject} current state is unknown (last known: {last_known}); \
         nothing has been reported for {elapsed:?}"
    )]
    StaleState {
        subject: &'static str,
        last_known: &'static str,
        elapsed: Duration,
    },
}

impl CoreError {
    /// Returns `true` for failures the next poll cycle may clear on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(e) | Self::CommandFailed { source: e, .. } => e.is_transient(),
            Self::StaleState { .. } => true,
            Self::UnrecognizedState { .. } | Self::LightNotConfigured => false,
        }
    }
}
