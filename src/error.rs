//! Error taxonomy for session operations and recognition failures
//!
//! Synchronous precondition failures are reported through [`SessionError`]
//! on the operation itself. Asynchronous recognition failures never reach
//! the operation result; they arrive as an error event carrying a stable
//! numeric code and a human-readable message.

use serde::{Deserialize, Serialize};

/// Failure of a session operation, reported synchronously on the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Microphone permission is not granted and could not be obtained
    #[error("microphone permission denied")]
    PermissionDenied,

    /// No host context is available to present a permission prompt
    #[error("no host context available to present a permission prompt")]
    NoHostContext,

    /// The platform reports no speech-recognition capability
    #[error("speech recognition is not available on this device")]
    RecognizerUnavailable,

    /// A listening session is already active
    #[error("a listening session is already active")]
    AlreadyListening,

    /// No listening session is active
    ///
    /// Present for hosts that want a strict stop/cancel policy; the default
    /// policy treats stop/cancel with nothing pending as a success no-op and
    /// does not return this.
    #[error("no listening session is active")]
    NotListening,

    /// The session reached its terminal state and cannot serve the operation
    #[error("session has been destroyed")]
    SessionDestroyed,

    /// The platform recognizer rejected the request synchronously
    #[error("recognizer rejected the request: {0}")]
    NativeRejection(String),
}

/// Asynchronous recognition failure categories.
///
/// Each kind maps to a stable numeric code; codes pass through the error
/// event unchanged so subscribers can match on them across hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionErrorKind {
    Audio,
    Network,
    NetworkTimeout,
    Server,
    NoMatch,
    SpeechTimeout,
    Busy,
    InsufficientPermissions,
    Client,
    Unknown,
}

impl RecognitionErrorKind {
    /// Map a native error code onto a kind. Out-of-range codes are `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Audio,
            2 => Self::Network,
            3 => Self::NetworkTimeout,
            4 => Self::Server,
            5 => Self::NoMatch,
            6 => Self::SpeechTimeout,
            7 => Self::Busy,
            8 => Self::InsufficientPermissions,
            9 => Self::Client,
            _ => Self::Unknown,
        }
    }

    /// The stable numeric code for this kind. `Unknown` has no code of its
    /// own; the raw native code is carried on the event instead.
    pub fn code(&self) -> i32 {
        match self {
            Self::Audio => 1,
            Self::Network => 2,
            Self::NetworkTimeout => 3,
            Self::Server => 4,
            Self::NoMatch => 5,
            Self::SpeechTimeout => 6,
            Self::Busy => 7,
            Self::InsufficientPermissions => 8,
            Self::Client => 9,
            Self::Unknown => 0,
        }
    }

    /// Human-readable message for the error event.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Audio => "Audio recording error",
            Self::Network => "Network error",
            Self::NetworkTimeout => "Network timeout",
            Self::Server => "Server error",
            Self::NoMatch => "No recognition match",
            Self::SpeechTimeout => "No speech input",
            Self::Busy => "Recognition service busy",
            Self::InsufficientPermissions => "Insufficient permissions",
            Self::Client => "Client side error",
            Self::Unknown => "Unknown recognition error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in 1..=9 {
            assert_eq!(RecognitionErrorKind::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_no_match_code_and_message() {
        let kind = RecognitionErrorKind::from_code(5);
        assert_eq!(kind, RecognitionErrorKind::NoMatch);
        assert_eq!(kind.message(), "No recognition match");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(
            RecognitionErrorKind::from_code(42),
            RecognitionErrorKind::Unknown
        );
        assert_eq!(
            RecognitionErrorKind::from_code(-1),
            RecognitionErrorKind::Unknown
        );
        assert_eq!(
            RecognitionErrorKind::Unknown.message(),
            "Unknown recognition error"
        );
    }

    #[test]
    fn test_session_error_display() {
        assert_eq!(
            SessionError::AlreadyListening.to_string(),
            "a listening session is already active"
        );
        assert_eq!(
            SessionError::NativeRejection("busy".into()).to_string(),
            "recognizer rejected the request: busy"
        );
    }
}
