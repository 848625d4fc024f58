//! Microphone permission queries against the host platform
//!
//! The gate wraps an injected [`PermissionStore`] and pins the microphone
//! permission identifier; it holds no state of its own.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::SessionError;

/// Permission identifier for microphone capture
pub const MICROPHONE_PERMISSION: &str = "microphone";

/// Failures a permission store can report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The host cannot present a permission prompt (no foreground context)
    #[error("no host context available to present a permission prompt")]
    NoHostContext,

    /// The platform permission query itself failed
    #[error("permission store failure: {0}")]
    Store(String),
}

/// Host platform permission capability.
///
/// `request` may suspend for user interaction of OS-enforced duration but
/// must resolve; it never hangs on the API contract.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Whether the permission is currently granted
    async fn check(&self, permission: &str) -> Result<bool, PermissionError>;

    /// Prompt the user for the permission; resolves to the resulting grant
    async fn request(&self, permission: &str) -> Result<bool, PermissionError>;
}

/// Queries and requests the microphone-capture permission
pub struct PermissionGate {
    store: Arc<dyn PermissionStore>,
}

impl PermissionGate {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// Whether microphone capture is granted. Never fails: any store failure
    /// or unsupported query resolves to `false`.
    pub async fn check(&self) -> bool {
        match self.store.check(MICROPHONE_PERMISSION).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(?e, "permission check failed, treating as not granted");
                false
            }
        }
    }

    /// Prompt for microphone capture. Resolves `false` on denial or when the
    /// platform lacks the capability; fails with `NoHostContext` when no
    /// prompt can be presented.
    pub async fn request(&self) -> Result<bool, SessionError> {
        match self.store.request(MICROPHONE_PERMISSION).await {
            Ok(granted) => Ok(granted),
            Err(PermissionError::NoHostContext) => Err(SessionError::NoHostContext),
            Err(PermissionError::Store(detail)) => {
                warn!(%detail, "permission request failed, treating as denied");
                Ok(false)
            }
        }
    }
}

/// Fixed-answer permission store for hosts without a permission model,
/// for the demo binary, and for tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    granted: bool,
}

impl StaticPermissions {
    pub fn granted() -> Self {
        Self { granted: true }
    }

    pub fn denied() -> Self {
        Self { granted: false }
    }
}

#[async_trait]
impl PermissionStore for StaticPermissions {
    async fn check(&self, _permission: &str) -> Result<bool, PermissionError> {
        Ok(self.granted)
    }

    async fn request(&self, _permission: &str) -> Result<bool, PermissionError> {
        Ok(self.granted)
    }
}
