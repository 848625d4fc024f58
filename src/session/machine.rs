//! Core session state machine
//!
//! Runs as a single task that owns all session state and consumes two
//! channels: caller commands (each carrying a oneshot reply) and native
//! recognizer callbacks. Funneling both onto one task is what keeps an
//! in-flight callback from interleaving destructively with a concurrent
//! start/stop/cancel request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{RecognitionErrorKind, SessionError};
use crate::events::{EventBridge, RecognitionEvent};
use crate::permission::{PermissionGate, PermissionStore};
use crate::recognizer::{
    CallbackSender, ListenOptions, NativeCallback, RecognizerFactory, RecognizerHandle,
};

use super::mediator::{Operation, OperationResult, ResultMediator};

/// The four possible states of a recognition session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No listen attempt in flight
    Idle,
    /// The recognizer is capturing speech
    Listening,
    /// Stop requested; awaiting native finalization
    Stopping,
    /// Terminal: the session and its recognizer are gone
    Destroyed,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Listening => write!(f, "Listening"),
            SessionState::Stopping => write!(f, "Stopping"),
            SessionState::Destroyed => write!(f, "Destroyed"),
        }
    }
}

/// Commands issued by the public session handle
pub(crate) enum SessionCommand {
    CheckPermissions {
        reply: oneshot::Sender<bool>,
    },
    RequestPermissions {
        reply: oneshot::Sender<OperationResult>,
    },
    Start {
        language: Option<String>,
        reply: oneshot::Sender<OperationResult>,
    },
    Stop {
        reply: oneshot::Sender<OperationResult>,
    },
    Cancel {
        reply: oneshot::Sender<OperationResult>,
    },
    Destroy {
        reply: oneshot::Sender<OperationResult>,
    },
    CurrentState {
        reply: oneshot::Sender<SessionState>,
    },
}

/// The state machine driving one recognition session
pub(crate) struct SessionStateMachine {
    state: SessionState,
    config: Config,
    gate: PermissionGate,
    recognizer: RecognizerHandle,
    bridge: EventBridge,
    mediator: ResultMediator,
    /// Handed to the factory so the recognizer can reach the session task
    callback_tx: CallbackSender,
    /// Set by cancel/destroy; drops every native callback until the next
    /// successful start so a superseded attempt cannot deliver results
    suppress_callbacks: bool,
}

impl SessionStateMachine {
    pub(crate) fn new(
        config: Config,
        permissions: Arc<dyn PermissionStore>,
        factory: Arc<dyn RecognizerFactory>,
        bridge: EventBridge,
        callback_tx: CallbackSender,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            config,
            gate: PermissionGate::new(permissions),
            recognizer: RecognizerHandle::new(factory),
            bridge,
            mediator: ResultMediator::new(),
            callback_tx,
            suppress_callbacks: false,
        }
    }

    /// Run the session task until every handle is dropped
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut callbacks: mpsc::UnboundedReceiver<NativeCallback>,
    ) {
        info!("session task started in Idle state");

        loop {
            tokio::select! {
                // Pending callbacks are drained before the next command, so
                // an in-flight recognition outcome is applied before a later
                // operation observes state.
                biased;
                Some(callback) = callbacks.recv() => {
                    self.handle_callback(callback);
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }
        }

        self.recognizer.release();
        info!("session task stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::CheckPermissions { reply } => {
                let _ = reply.send(self.gate.check().await);
            }
            SessionCommand::RequestPermissions { reply } => {
                let _ = reply.send(self.gate.request().await);
            }
            SessionCommand::CurrentState { reply } => {
                let _ = reply.send(self.state);
            }
            SessionCommand::Start { language, reply } => {
                if self.mediator.begin(Operation::Start, reply) {
                    let result = self.do_start(language).await;
                    self.mediator.settle(Operation::Start, result);
                }
            }
            SessionCommand::Stop { reply } => {
                if self.mediator.begin(Operation::Stop, reply) {
                    let result = self.do_stop();
                    self.mediator.settle(Operation::Stop, result);
                }
            }
            SessionCommand::Cancel { reply } => {
                if self.mediator.begin(Operation::Cancel, reply) {
                    let result = self.do_cancel();
                    self.mediator.settle(Operation::Cancel, result);
                }
            }
            SessionCommand::Destroy { reply } => {
                if self.mediator.begin(Operation::Destroy, reply) {
                    let result = self.do_destroy();
                    self.mediator.settle(Operation::Destroy, result);
                }
            }
        }
    }

    /// Start a listen attempt. Allowed only from `Idle`; never touches the
    /// native recognizer from any other state.
    async fn do_start(&mut self, language: Option<String>) -> OperationResult {
        match self.state {
            SessionState::Destroyed => return Err(SessionError::SessionDestroyed),
            SessionState::Listening | SessionState::Stopping => {
                return Err(SessionError::AlreadyListening);
            }
            SessionState::Idle => {}
        }

        let mut granted = self.gate.check().await;
        if !granted && self.config.auto_request_permission {
            granted = self.gate.request().await?;
        }
        if !granted {
            return Err(SessionError::PermissionDenied);
        }

        // Language resolution happens here, at call time.
        let options = ListenOptions {
            language: self.config.resolve_language(language.as_deref()),
            partial_results: self.config.partial_results,
            max_alternatives: self.config.max_alternatives,
        };

        let callbacks = self.callback_tx.clone();
        let recognizer = self.recognizer.ensure(callbacks)?;
        recognizer.start_listening(&options)?;

        self.suppress_callbacks = false;
        self.transition_to(SessionState::Listening);
        debug!(language = %options.language, "listen attempt started");
        Ok(true)
    }

    /// Request native stop. The result acknowledges the request; native
    /// finalization arrives later as a final-result or error event.
    fn do_stop(&mut self) -> OperationResult {
        match self.state {
            SessionState::Destroyed => Err(SessionError::SessionDestroyed),
            // Stop with nothing in flight is a benign no-op.
            SessionState::Idle | SessionState::Stopping => Ok(true),
            SessionState::Listening => {
                let recognizer = self
                    .recognizer
                    .live()
                    .ok_or(SessionError::RecognizerUnavailable)?;
                recognizer.stop_listening()?;
                self.transition_to(SessionState::Stopping);
                Ok(true)
            }
        }
    }

    /// Cancel the active attempt, discarding any in-flight result
    fn do_cancel(&mut self) -> OperationResult {
        match self.state {
            SessionState::Destroyed => Err(SessionError::SessionDestroyed),
            SessionState::Idle => Ok(true),
            SessionState::Listening | SessionState::Stopping => {
                if let Some(recognizer) = self.recognizer.live() {
                    recognizer.cancel()?;
                }
                self.suppress_callbacks = true;
                self.transition_to(SessionState::Idle);
                Ok(true)
            }
        }
    }

    /// Tear down the session and its recognizer. Idempotent.
    fn do_destroy(&mut self) -> OperationResult {
        if self.state == SessionState::Destroyed {
            return Ok(true);
        }

        if matches!(self.state, SessionState::Listening | SessionState::Stopping) {
            if let Some(recognizer) = self.recognizer.live() {
                if let Err(e) = recognizer.cancel() {
                    warn!(%e, "native cancel failed during destroy");
                }
            }
            self.suppress_callbacks = true;
        }

        self.recognizer.release();
        self.transition_to(SessionState::Destroyed);
        Ok(true)
    }

    /// Normalize one native callback into the public event vocabulary and
    /// apply its state effect
    fn handle_callback(&mut self, callback: NativeCallback) {
        if self.state == SessionState::Destroyed || self.suppress_callbacks {
            debug!(?callback, "dropping native callback for superseded attempt");
            return;
        }

        match callback {
            NativeCallback::Ready => {
                self.bridge.emit(&RecognitionEvent::Ready);
            }
            NativeCallback::BeginningOfSpeech => {
                self.bridge.emit(&RecognitionEvent::BeginningOfSpeech);
            }
            NativeCallback::RmsChanged(rms_db) => {
                self.bridge.emit(&RecognitionEvent::VolumeChanged { rms_db });
            }
            NativeCallback::PartialResults(alternatives) => {
                let partial_text = alternatives.first().cloned().unwrap_or_default();
                self.bridge.emit(&RecognitionEvent::PartialResult {
                    partial_text,
                    alternatives,
                });
            }
            NativeCallback::Results(alternatives) => {
                let text = alternatives.first().cloned().unwrap_or_default();
                self.bridge
                    .emit(&RecognitionEvent::FinalResult { text, alternatives });
                if matches!(self.state, SessionState::Listening | SessionState::Stopping) {
                    self.transition_to(SessionState::Idle);
                }
            }
            NativeCallback::EndOfSpeech => {
                self.bridge.emit(&RecognitionEvent::EndOfSpeech { ended: true });
                if self.state == SessionState::Listening {
                    self.transition_to(SessionState::Idle);
                }
            }
            NativeCallback::Error(code) => {
                let kind = RecognitionErrorKind::from_code(code);
                self.bridge.emit(&RecognitionEvent::Error {
                    code,
                    message: kind.message().to_string(),
                });
                if matches!(self.state, SessionState::Listening | SessionState::Stopping) {
                    self.transition_to(SessionState::Idle);
                }
            }
            // Raw audio and recognizer-specific extension events are not
            // part of the public vocabulary.
            NativeCallback::BufferReceived(_) | NativeCallback::Event(_) => {}
        }
    }

    /// Perform a state transition
    fn transition_to(&mut self, new_state: SessionState) {
        if self.state == new_state {
            return;
        }

        info!(
            from = %self.state,
            to = %new_state,
            "session state transition"
        );
        self.state = new_state;
    }
}
