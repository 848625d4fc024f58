//! Platform recognizer collaborator traits and callback vocabulary
//!
//! The platform capability that performs actual speech-to-text inference
//! lives behind [`RecognizerFactory`]/[`Recognizer`]. Implementations push
//! raw [`NativeCallback`]s into the channel they are handed at creation;
//! the session task normalizes them into the public event vocabulary.

mod handle;
pub mod mock;

use tokio::sync::mpsc;

pub use handle::RecognizerHandle;

/// Channel end a recognizer uses to deliver callbacks to the session task
pub type CallbackSender = mpsc::UnboundedSender<NativeCallback>;

/// Raw callback vocabulary of the platform recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCallback {
    /// Ready to receive speech
    Ready,
    /// User started speaking
    BeginningOfSpeech,
    /// Input volume changed, in dB
    RmsChanged(f32),
    /// Raw audio buffer; not surfaced by this layer
    BufferReceived(Vec<u8>),
    /// User stopped speaking
    EndOfSpeech,
    /// Recognition failed with a native error code
    Error(i32),
    /// Final hypotheses, best first
    Results(Vec<String>),
    /// Partial hypotheses, best first
    PartialResults(Vec<String>),
    /// Recognizer-specific extension event; not surfaced by this layer
    Event(i32),
}

/// Options for one listen attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ListenOptions {
    /// Resolved language tag (never empty; resolution happens before start)
    pub language: String,
    /// Ask for intermediate hypotheses while listening
    pub partial_results: bool,
    /// Maximum number of hypotheses per result
    pub max_alternatives: u32,
}

/// Failures reported by the platform recognizer while issuing a command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    /// The platform reports no speech-recognition capability
    #[error("speech recognition unavailable")]
    Unavailable,

    /// The recognizer rejected the command
    #[error("{0}")]
    Rejected(String),
}

/// Raw platform failures never propagate past this boundary; they become
/// session-level rejections.
impl From<NativeError> for crate::error::SessionError {
    fn from(e: NativeError) -> Self {
        match e {
            NativeError::Unavailable => crate::error::SessionError::RecognizerUnavailable,
            NativeError::Rejected(detail) => crate::error::SessionError::NativeRejection(detail),
        }
    }
}

/// Creates recognizer instances and reports platform capability
pub trait RecognizerFactory: Send + Sync {
    /// Whether the platform offers speech recognition at all
    fn is_available(&self) -> bool;

    /// Create a recognizer that delivers its callbacks into `callbacks`
    fn create(&self, callbacks: CallbackSender) -> Result<Box<dyn Recognizer>, NativeError>;
}

/// One live native recognizer instance.
///
/// Commands accept or reject synchronously; recognition outcomes arrive
/// later through the callback channel. Implementations must not invoke
/// callbacks re-entrantly from within a command.
pub trait Recognizer: Send {
    fn start_listening(&mut self, options: &ListenOptions) -> Result<(), NativeError>;

    fn stop_listening(&mut self) -> Result<(), NativeError>;

    fn cancel(&mut self) -> Result<(), NativeError>;

    fn destroy(&mut self);
}
