//! Public handle for a recognition session
//!
//! `SpeechSession` is the caller-facing surface: async operations that
//! settle exactly once per call, and typed event subscriptions. The handle
//! is cheap to clone; all clones talk to the same session task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::config::Config;
use crate::error::SessionError;
use crate::events::{EventBridge, EventKind, RecognitionEvent, Subscription};
use crate::permission::PermissionStore;
use crate::recognizer::RecognizerFactory;

use super::machine::{SessionCommand, SessionState, SessionStateMachine};
use super::mediator::OperationResult;

/// Handle to the single recognition session of this process
#[derive(Clone)]
pub struct SpeechSession {
    commands: mpsc::Sender<SessionCommand>,
    bridge: EventBridge,
}

impl SpeechSession {
    /// Spawn the session task and return its handle.
    ///
    /// The task runs until every clone of the handle has been dropped; the
    /// native recognizer, if live, is released on exit.
    pub fn spawn(
        config: Config,
        permissions: Arc<dyn PermissionStore>,
        factory: Arc<dyn RecognizerFactory>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (callback_tx, callback_rx) = mpsc::unbounded_channel();
        let bridge = EventBridge::new();

        let machine =
            SessionStateMachine::new(config, permissions, factory, bridge.clone(), callback_tx);
        tokio::spawn(machine.run(command_rx, callback_rx));

        Self {
            commands: command_tx,
            bridge,
        }
    }

    /// Whether microphone capture is currently granted. Never fails.
    pub async fn check_permissions(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::CheckPermissions { reply })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Prompt for microphone capture; resolves to the resulting grant
    pub async fn request_permissions(&self) -> Result<bool, SessionError> {
        self.operation(|reply| SessionCommand::RequestPermissions { reply })
            .await
    }

    /// Start a listen attempt with the given language tag, or the
    /// configured/host default when `None`
    pub async fn start_listening(&self, language: Option<&str>) -> Result<bool, SessionError> {
        let language = language.map(str::to_owned);
        self.operation(|reply| SessionCommand::Start { language, reply })
            .await
    }

    /// Request the end of the active listen attempt. Resolves once the
    /// request is accepted; the final result arrives later as an event.
    pub async fn stop_listening(&self) -> Result<bool, SessionError> {
        self.operation(|reply| SessionCommand::Stop { reply }).await
    }

    /// Abort the active listen attempt, discarding any in-flight result
    pub async fn cancel_listening(&self) -> Result<bool, SessionError> {
        self.operation(|reply| SessionCommand::Cancel { reply }).await
    }

    /// Tear down the session and its recognizer. Idempotent.
    pub async fn destroy(&self) -> Result<bool, SessionError> {
        self.operation(|reply| SessionCommand::Destroy { reply })
            .await
    }

    /// Current session state
    pub async fn current_state(&self) -> SessionState {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::CurrentState { reply })
            .await
            .is_err()
        {
            return SessionState::Destroyed;
        }
        rx.await.unwrap_or(SessionState::Destroyed)
    }

    async fn operation<F>(&self, command: F) -> OperationResult
    where
        F: FnOnce(oneshot::Sender<OperationResult>) -> SessionCommand,
    {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::SessionDestroyed)?;
        rx.await.map_err(|_| SessionError::SessionDestroyed)?
    }

    /// The underlying event bridge, for untyped subscriptions
    pub fn events(&self) -> &EventBridge {
        &self.bridge
    }

    /// The recognizer is ready to receive speech
    pub fn on_speech_begin<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.bridge
            .subscribe(EventKind::Ready, move |_| callback())
    }

    /// The user has started speaking
    pub fn on_speech_start<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.bridge
            .subscribe(EventKind::BeginningOfSpeech, move |_| callback())
    }

    /// Input volume changed, in dB
    pub fn on_speech_volume_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        self.bridge.subscribe(EventKind::VolumeChanged, move |event| {
            if let RecognitionEvent::VolumeChanged { rms_db } = event {
                callback(*rms_db);
            }
        })
    }

    /// Intermediate hypotheses for the utterance so far
    pub fn on_speech_partial_results<F>(&self, callback: F) -> Subscription
    where
        F: Fn(String, Vec<String>) + Send + Sync + 'static,
    {
        self.bridge.subscribe(EventKind::PartialResult, move |event| {
            if let RecognitionEvent::PartialResult {
                partial_text,
                alternatives,
            } = event
            {
                callback(partial_text.clone(), alternatives.clone());
            }
        })
    }

    /// The final hypotheses for the utterance
    pub fn on_speech_results<F>(&self, callback: F) -> Subscription
    where
        F: Fn(String, Vec<String>) + Send + Sync + 'static,
    {
        self.bridge.subscribe(EventKind::FinalResult, move |event| {
            if let RecognitionEvent::FinalResult { text, alternatives } = event {
                callback(text.clone(), alternatives.clone());
            }
        })
    }

    /// The user has stopped speaking
    pub fn on_speech_end<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.bridge.subscribe(EventKind::EndOfSpeech, move |event| {
            if let RecognitionEvent::EndOfSpeech { ended } = event {
                callback(*ended);
            }
        })
    }

    /// An asynchronous recognition failure
    pub fn on_speech_error<F>(&self, callback: F) -> Subscription
    where
        F: Fn(i32, String) + Send + Sync + 'static,
    {
        self.bridge.subscribe(EventKind::Error, move |event| {
            if let RecognitionEvent::Error { code, message } = event {
                callback(*code, message.clone());
            }
        })
    }
}
