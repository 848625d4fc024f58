//! Recognition event vocabulary and fan-out bridge
//!
//! Native recognizer callbacks are normalized into [`RecognitionEvent`] and
//! republished to subscribers by the [`EventBridge`].

mod bridge;

use serde::{Deserialize, Serialize};

pub use bridge::{EventBridge, Subscription};

/// Events emitted by a recognition session, in native callback order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionEvent {
    /// The recognizer is ready to receive speech
    Ready,

    /// The user has started speaking
    BeginningOfSpeech,

    /// Input volume changed; emitted at high frequency while listening
    VolumeChanged {
        /// Current sound level in dB
        rms_db: f32,
    },

    /// An intermediate hypothesis for the utterance so far
    PartialResult {
        /// Best partial hypothesis
        partial_text: String,
        /// All partial hypotheses, best first
        alternatives: Vec<String>,
    },

    /// The final hypothesis for the utterance
    FinalResult {
        /// Best hypothesis
        text: String,
        /// All hypotheses, best first
        alternatives: Vec<String>,
    },

    /// The user has stopped speaking
    EndOfSpeech {
        ended: bool,
    },

    /// The recognizer reported an asynchronous failure
    Error {
        /// Stable numeric code (unknown native codes pass through unchanged)
        code: i32,
        /// Human-readable message
        message: String,
    },
}

impl RecognitionEvent {
    /// The subscription kind this event is delivered under
    pub fn kind(&self) -> EventKind {
        match self {
            RecognitionEvent::Ready => EventKind::Ready,
            RecognitionEvent::BeginningOfSpeech => EventKind::BeginningOfSpeech,
            RecognitionEvent::VolumeChanged { .. } => EventKind::VolumeChanged,
            RecognitionEvent::PartialResult { .. } => EventKind::PartialResult,
            RecognitionEvent::FinalResult { .. } => EventKind::FinalResult,
            RecognitionEvent::EndOfSpeech { .. } => EventKind::EndOfSpeech,
            RecognitionEvent::Error { .. } => EventKind::Error,
        }
    }
}

impl std::fmt::Display for RecognitionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionEvent::Ready => write!(f, "READY"),
            RecognitionEvent::BeginningOfSpeech => write!(f, "BEGINNING_OF_SPEECH"),
            RecognitionEvent::VolumeChanged { rms_db } => {
                write!(f, "VOLUME_CHANGED ({:.2} dB)", rms_db)
            }
            RecognitionEvent::PartialResult { partial_text, .. } => {
                write!(f, "PARTIAL_RESULT ({:?})", partial_text)
            }
            RecognitionEvent::FinalResult { text, .. } => {
                write!(f, "FINAL_RESULT ({:?})", text)
            }
            RecognitionEvent::EndOfSpeech { .. } => write!(f, "END_OF_SPEECH"),
            RecognitionEvent::Error { code, message } => {
                write!(f, "ERROR ({}: {})", code, message)
            }
        }
    }
}

/// Event categories a subscriber can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    BeginningOfSpeech,
    VolumeChanged,
    PartialResult,
    FinalResult,
    EndOfSpeech,
    Error,
}
