//! Scripted recognizer for tests and the demo binary
//!
//! Records every command it receives and replays configured callback
//! scripts on start/stop, so session behavior can be driven without a
//! platform recognizer. The factory keeps a handle to the callback channel
//! of the last created instance, letting tests inject late callbacks (for
//! example a final result arriving after a cancel).

use std::sync::{Arc, Mutex};

use super::{
    CallbackSender, ListenOptions, NativeCallback, NativeError, Recognizer, RecognizerFactory,
};

/// Commands observed by the mock, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Create,
    Start(ListenOptions),
    Stop,
    Cancel,
    Destroy,
}

#[derive(Default)]
struct Shared {
    calls: Vec<MockCall>,
    sink: Option<CallbackSender>,
}

/// Factory producing scripted [`MockRecognizer`]s
#[derive(Clone)]
pub struct MockRecognizerFactory {
    available: bool,
    fail_create: bool,
    fail_start: bool,
    start_script: Vec<NativeCallback>,
    stop_script: Vec<NativeCallback>,
    shared: Arc<Mutex<Shared>>,
}

impl MockRecognizerFactory {
    pub fn new() -> Self {
        Self {
            available: true,
            fail_create: false,
            fail_start: false,
            start_script: Vec::new(),
            stop_script: Vec::new(),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Report the speech-recognition capability as absent
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Reject recognizer creation
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Reject every start command
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Callbacks replayed after each accepted start command
    pub fn with_start_script(mut self, script: Vec<NativeCallback>) -> Self {
        self.start_script = script;
        self
    }

    /// Callbacks replayed after each accepted stop command
    pub fn with_stop_script(mut self, script: Vec<NativeCallback>) -> Self {
        self.stop_script = script;
        self
    }

    /// All commands observed so far, in call order
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.shared).calls.clone()
    }

    /// Number of accepted-or-rejected start commands issued to the native layer
    pub fn start_count(&self) -> usize {
        lock(&self.shared)
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::Start(_)))
            .count()
    }

    /// Inject a callback as if the native layer delivered it now.
    /// Requires a created recognizer instance.
    pub fn emit(&self, callback: NativeCallback) {
        let shared = lock(&self.shared);
        if let Some(sink) = &shared.sink {
            let _ = sink.send(callback);
        }
    }
}

impl Default for MockRecognizerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognizerFactory for MockRecognizerFactory {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create(&self, callbacks: CallbackSender) -> Result<Box<dyn Recognizer>, NativeError> {
        if self.fail_create {
            return Err(NativeError::Rejected("mock creation failure".into()));
        }

        let mut shared = lock(&self.shared);
        shared.calls.push(MockCall::Create);
        shared.sink = Some(callbacks.clone());

        Ok(Box::new(MockRecognizer {
            callbacks,
            fail_start: self.fail_start,
            start_script: self.start_script.clone(),
            stop_script: self.stop_script.clone(),
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Scripted recognizer instance; see [`MockRecognizerFactory`]
pub struct MockRecognizer {
    callbacks: CallbackSender,
    fail_start: bool,
    start_script: Vec<NativeCallback>,
    stop_script: Vec<NativeCallback>,
    shared: Arc<Mutex<Shared>>,
}

impl MockRecognizer {
    fn replay(&self, script: &[NativeCallback]) {
        for callback in script {
            let _ = self.callbacks.send(callback.clone());
        }
    }
}

impl Recognizer for MockRecognizer {
    fn start_listening(&mut self, options: &ListenOptions) -> Result<(), NativeError> {
        lock(&self.shared).calls.push(MockCall::Start(options.clone()));
        if self.fail_start {
            return Err(NativeError::Rejected("mock start rejection".into()));
        }
        self.replay(&self.start_script);
        Ok(())
    }

    fn stop_listening(&mut self) -> Result<(), NativeError> {
        lock(&self.shared).calls.push(MockCall::Stop);
        self.replay(&self.stop_script);
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), NativeError> {
        lock(&self.shared).calls.push(MockCall::Cancel);
        Ok(())
    }

    fn destroy(&mut self) {
        lock(&self.shared).calls.push(MockCall::Destroy);
    }
}

fn lock(shared: &Mutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
