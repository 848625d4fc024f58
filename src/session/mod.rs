//! Recognition session: state machine, settlement, public handle
//!
//! One logical session per process. The machine validates every transition:
//! - Idle -> Listening (start)
//! - Listening -> Stopping -> Idle (stop, then native finalization)
//! - Listening -> Idle (cancel, error, end of speech)
//! - any non-terminal state -> Destroyed

mod machine;
mod mediator;
mod session;

pub use machine::SessionState;
pub use mediator::{Operation, OperationResult, ResultMediator};
pub use session::SpeechSession;
