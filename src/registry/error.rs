//! Errors raised while registering or invoking capabilities.

use std::any::Any;

/// Errors that can occur when registering a capability
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The descriptor's key field was the empty string
    #[error("{kind} registration requires a non-empty {field}")]
    EmptyKey {
        kind: &'static str,
        field: &'static str,
    },
}

/// Failure returned by a capability handler.
///
/// Handlers return this instead of panicking; the resource reader and the
/// dispatcher turn it into an `isError` response using [`HandlerError::reported_message`].
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Free-form failure message
    #[error("{0}")]
    Message(String),

    /// A required argument was not supplied
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// An argument was supplied with the wrong shape
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Failure while encoding a handler's payload
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by the issue tracker
    #[error(transparent)]
    Tracker(#[from] crate::tracker::TrackerError),
}

impl HandlerError {
    /// Create a free-form handler error
    pub fn message(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        HandlerError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The message to surface to the caller, or `None` when the error carries no text
    pub fn reported_message(&self) -> Option<String> {
        let message = self.to_string();
        if message.trim().is_empty() {
            None
        } else {
            Some(message)
        }
    }
}

/// Extract a human-readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        return None;
    };

    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}
