//! Settlement of pending operation replies
//!
//! Each caller-initiated operation yields exactly one settlement. The
//! mediator holds at most one pending reply per operation category and
//! ignores every signal after the first; a stray native acknowledgement for
//! an operation that was already settled explicitly cannot re-settle it.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::SessionError;

/// Caller-initiated operation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Start,
    Stop,
    Cancel,
    Destroy,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Start => write!(f, "start"),
            Operation::Stop => write!(f, "stop"),
            Operation::Cancel => write!(f, "cancel"),
            Operation::Destroy => write!(f, "destroy"),
        }
    }
}

/// Settlement value for a pending operation
pub type OperationResult = Result<bool, SessionError>;

/// Tracks at most one pending reply per operation category
pub struct ResultMediator {
    pending: HashMap<Operation, oneshot::Sender<OperationResult>>,
}

impl ResultMediator {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Register the reply sender for a newly issued operation.
    ///
    /// A second `begin` for a category that is still pending is rejected
    /// immediately on the new reply (never queued); returns whether the
    /// operation was registered.
    pub fn begin(&mut self, op: Operation, reply: oneshot::Sender<OperationResult>) -> bool {
        if self.pending.contains_key(&op) {
            warn!(%op, "operation already in flight, rejecting");
            let _ = reply.send(Err(SessionError::AlreadyListening));
            return false;
        }
        self.pending.insert(op, reply);
        true
    }

    /// Settle the pending operation, if any. Monotonic: returns whether this
    /// call performed the settlement; later signals for the same operation
    /// are ignored.
    pub fn settle(&mut self, op: Operation, result: OperationResult) -> bool {
        match self.pending.remove(&op) {
            Some(reply) => {
                debug!(%op, ok = result.is_ok(), "settling operation");
                let _ = reply.send(result);
                true
            }
            None => {
                debug!(%op, "ignoring settlement for operation with no pending reply");
                false
            }
        }
    }

    /// Whether an operation of this category is awaiting settlement
    pub fn is_pending(&self, op: Operation) -> bool {
        self.pending.contains_key(&op)
    }
}

impl Default for ResultMediator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_settlement() {
        let mut mediator = ResultMediator::new();
        let (tx, rx) = oneshot::channel();

        assert!(mediator.begin(Operation::Start, tx));
        assert!(mediator.is_pending(Operation::Start));

        assert!(mediator.settle(Operation::Start, Ok(true)));
        assert!(!mediator.is_pending(Operation::Start));
        assert_eq!(rx.await.unwrap(), Ok(true));

        // A late signal for the same operation is ignored.
        assert!(!mediator.settle(Operation::Start, Err(SessionError::NativeRejection("late".into()))));
    }

    #[tokio::test]
    async fn test_second_begin_rejected_not_queued() {
        let mut mediator = ResultMediator::new();
        let (first_tx, _first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();

        assert!(mediator.begin(Operation::Start, first_tx));
        assert!(!mediator.begin(Operation::Start, second_tx));

        // The second caller was rejected synchronously.
        assert_eq!(second_rx.await.unwrap(), Err(SessionError::AlreadyListening));
        // The first reply is still pending.
        assert!(mediator.is_pending(Operation::Start));
    }

    #[tokio::test]
    async fn test_categories_are_independent() {
        let mut mediator = ResultMediator::new();
        let (start_tx, start_rx) = oneshot::channel();
        let (destroy_tx, destroy_rx) = oneshot::channel();

        assert!(mediator.begin(Operation::Start, start_tx));
        assert!(mediator.begin(Operation::Destroy, destroy_tx));

        assert!(mediator.settle(Operation::Destroy, Ok(true)));
        assert!(mediator.is_pending(Operation::Start));

        assert!(mediator.settle(Operation::Start, Err(SessionError::PermissionDenied)));
        assert_eq!(destroy_rx.await.unwrap(), Ok(true));
        assert_eq!(start_rx.await.unwrap(), Err(SessionError::PermissionDenied));
    }
}
