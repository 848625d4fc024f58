//! voicebridge: async session bridge over a platform speech recognizer
//!
//! Turns a single, stateful, callback-driven native recognizer into a safe,
//! future-based, multiply-subscribable API:
//! - start/stop/cancel/destroy a listening session with validated state
//!   transitions (no double-start, stop-when-idle is a benign no-op)
//! - query/request the microphone permission
//! - subscribe to a stream of lifecycle and result events
//!
//! The platform recognizer and permission store are injected behind traits;
//! this crate contains no audio or acoustic-model code.
//!
//! ```no_run
//! use std::sync::Arc;
//! use voicebridge::{Config, SpeechSession, StaticPermissions};
//! use voicebridge::mock::MockRecognizerFactory;
//!
//! # async fn demo() -> Result<(), voicebridge::SessionError> {
//! let session = SpeechSession::spawn(
//!     Config::load(),
//!     Arc::new(StaticPermissions::granted()),
//!     Arc::new(MockRecognizerFactory::new()),
//! );
//!
//! let _sub = session.on_speech_results(|text, _alternatives| {
//!     println!("heard: {text}");
//! });
//!
//! session.start_listening(Some("en-US")).await?;
//! session.stop_listening().await?;
//! session.destroy().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod permission;
pub mod recognizer;
pub mod session;

pub use config::Config;
pub use error::{RecognitionErrorKind, SessionError};
pub use events::{EventBridge, EventKind, RecognitionEvent, Subscription};
pub use permission::{PermissionError, PermissionGate, PermissionStore, StaticPermissions};
pub use recognizer::mock;
pub use recognizer::{
    CallbackSender, ListenOptions, NativeCallback, NativeError, Recognizer, RecognizerFactory,
    RecognizerHandle,
};
pub use session::{SessionState, SpeechSession};
