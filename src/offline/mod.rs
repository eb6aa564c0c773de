pub mod confirm;
pub mod operation;
pub mod orchestrator;

pub use confirm::{AutoConfirm, ConfirmPrompt, Confirmer};
pub use operation::{
    CacheKind, CacheOperation, FailureKind, OperationId, OperationStatus, RejectReason,
    Transition, TransitionError,
};
pub use orchestrator::{CacheOrchestrator, EventEffect};
