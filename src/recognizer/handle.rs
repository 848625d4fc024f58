//! Ownership of the single native recognizer instance

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::SessionError;

use super::{CallbackSender, Recognizer, RecognizerFactory};

/// Lazily creates and exclusively owns the native recognizer.
///
/// `ensure` reuses the live instance instead of ever creating a second one;
/// combined with the one-session-per-process design this bounds the process
/// to a single live recognizer. `release` is idempotent.
pub struct RecognizerHandle {
    factory: Arc<dyn RecognizerFactory>,
    recognizer: Option<Box<dyn Recognizer>>,
}

impl RecognizerHandle {
    pub fn new(factory: Arc<dyn RecognizerFactory>) -> Self {
        Self {
            factory,
            recognizer: None,
        }
    }

    /// The live recognizer, creating it on first need.
    ///
    /// Fails with `RecognizerUnavailable` when the platform reports the
    /// capability absent and with `NativeRejection` when creation fails;
    /// neither failure leaves a partially-created instance behind.
    pub fn ensure(
        &mut self,
        callbacks: CallbackSender,
    ) -> Result<&mut Box<dyn Recognizer>, SessionError> {
        if self.recognizer.is_none() {
            if !self.factory.is_available() {
                warn!("platform reports no speech-recognition capability");
                return Err(SessionError::RecognizerUnavailable);
            }

            let recognizer = self.factory.create(callbacks)?;

            debug!("native recognizer created");
            self.recognizer = Some(recognizer);
        }

        // The instance was just placed above if it was missing.
        Ok(self.recognizer.as_mut().expect("recognizer present"))
    }

    /// The live recognizer, if any
    pub fn live(&mut self) -> Option<&mut Box<dyn Recognizer>> {
        self.recognizer.as_mut()
    }

    /// Destroy the live recognizer. Safe to call when none exists.
    pub fn release(&mut self) {
        if let Some(mut recognizer) = self.recognizer.take() {
            recognizer.destroy();
            debug!("native recognizer destroyed");
        }
    }

    /// Whether a native recognizer instance is currently live
    pub fn is_live(&self) -> bool {
        self.recognizer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::{MockCall, MockRecognizerFactory};
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_lazy_creation_and_reuse() {
        let factory = MockRecognizerFactory::new();
        let mut handle = RecognizerHandle::new(Arc::new(factory.clone()));
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(!handle.is_live());
        handle.ensure(tx.clone()).unwrap();
        handle.ensure(tx).unwrap();

        assert!(handle.is_live());
        assert_eq!(
            factory
                .calls()
                .iter()
                .filter(|call| **call == MockCall::Create)
                .count(),
            1
        );
    }

    #[test]
    fn test_unavailable_platform() {
        let factory = MockRecognizerFactory::new().unavailable();
        let mut handle = RecognizerHandle::new(Arc::new(factory));
        let (tx, _rx) = mpsc::unbounded_channel();

        assert_eq!(
            handle.ensure(tx).err(),
            Some(SessionError::RecognizerUnavailable)
        );
        assert!(!handle.is_live());
    }

    #[test]
    fn test_release_is_idempotent() {
        let factory = MockRecognizerFactory::new();
        let mut handle = RecognizerHandle::new(Arc::new(factory.clone()));
        let (tx, _rx) = mpsc::unbounded_channel();

        handle.release();
        handle.ensure(tx).unwrap();
        handle.release();
        handle.release();

        assert!(!handle.is_live());
        assert_eq!(
            factory
                .calls()
                .iter()
                .filter(|call| **call == MockCall::Destroy)
                .count(),
            1
        );
    }
}
