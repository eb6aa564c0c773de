//! One user-initiated save or remove and its state machine.
//!
//! ```text
//! Pending ──confirm──▶ Confirmed ──start──▶ InProgress ──end──▶ Completed
//!    │                     │  └──units-removed / end──▶ Completed    │
//!    └──reject──▶ Rejected ◀── busy                      error ──▶ Failed
//! ```
//!
//! Every (status, transition) pair is listed in [`CacheOperation::apply`];
//! pairs not listed there are refused with a [`TransitionError`] and leave
//! the operation untouched.

use crate::{
    layers::descriptor::{LayerDescriptor, LayerId},
    tiles::events::CacheFailure,
};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Save,
    Remove,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Save => write!(f, "save"),
            CacheKind::Remove => write!(f, "remove"),
        }
    }
}

/// Failure class, used to pick the user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The tile server could not be reached
    Transport,
    Unknown,
}

const TRANSPORT_PATTERNS: [&str; 5] = [
    "Failed to fetch",
    "NetworkError",
    "network",
    "timeout",
    "Load failed",
];

impl FailureKind {
    /// Transport when the backend says so, when no detail was given at all,
    /// or when the message reads like a fetch failure.
    pub fn classify(failure: &CacheFailure) -> Self {
        if failure.transport {
            return FailureKind::Transport;
        }
        match &failure.message {
            None => FailureKind::Transport,
            Some(message) if TRANSPORT_PATTERNS.iter().any(|p| message.contains(p)) => {
                FailureKind::Transport
            }
            Some(_) => FailureKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The pre-flight count is above the ceiling
    TooManyTiles { count: usize, limit: usize },
    UserDeclined,
    /// The same layer and kind is already running
    AlreadyInProgress,
    /// No layer is selected as the target of the request
    NoActiveLayer,
    /// None of the save zoom levels lie inside the layer's zoom range
    NoZoomLevels,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Failed(FailureKind),
    Rejected(RejectReason),
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Completed | OperationStatus::Failed(_) | OperationStatus::Rejected(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Confirmed => "confirmed",
            OperationStatus::InProgress => "in-progress",
            OperationStatus::Completed => "completed",
            OperationStatus::Failed(_) => "failed",
            OperationStatus::Rejected(_) => "rejected",
        }
    }
}

/// Input of the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Confirm,
    Reject(RejectReason),
    Start { total: usize },
    UnitComplete,
    Finish,
    Removed { count: usize },
    Fail(FailureKind),
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::Reject(_) => "reject",
            Transition::Start { .. } => "start",
            Transition::UnitComplete => "unit-complete",
            Transition::Finish => "end",
            Transition::Removed { .. } => "units-removed",
            Transition::Fail(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation}: '{transition}' is not allowed while {status}")]
pub struct TransitionError {
    pub operation: OperationId,
    pub status: &'static str,
    pub transition: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOperation {
    pub id: OperationId,
    pub layer_id: LayerId,
    pub layer_name: String,
    pub kind: CacheKind,
    /// Pre-flight tile count, for saves that got that far
    pub estimated_units: Option<usize>,
    pub total_units: usize,
    pub completed_units: usize,
    pub status: OperationStatus,
}

impl CacheOperation {
    pub fn new(id: OperationId, layer: &LayerDescriptor, kind: CacheKind) -> Self {
        Self {
            id,
            layer_id: layer.id.clone(),
            layer_name: layer.name.clone(),
            kind,
            estimated_units: None,
            total_units: 0,
            completed_units: 0,
            status: OperationStatus::Pending,
        }
    }

    /// An operation with no target layer, rejected on creation
    pub fn without_layer(id: OperationId, kind: CacheKind) -> Self {
        Self {
            id,
            layer_id: LayerId::new(),
            layer_name: String::new(),
            kind,
            estimated_units: None,
            total_units: 0,
            completed_units: 0,
            status: OperationStatus::Rejected(RejectReason::NoActiveLayer),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Rounded completion percentage; 0 while the total is unknown
    pub fn percent(&self) -> u32 {
        if self.total_units == 0 {
            return 0;
        }
        ((self.completed_units as f64 / self.total_units as f64) * 100.0).round() as u32
    }

    pub fn apply(&mut self, transition: Transition) -> Result<(), TransitionError> {
        use OperationStatus as S;
        use Transition as T;

        let next = match (&self.status, transition) {
            (S::Pending, T::Confirm) => S::Confirmed,
            (S::Pending, T::Reject(reason)) => S::Rejected(reason),
            // Losing the execution slot after the user already confirmed
            (S::Confirmed, T::Reject(RejectReason::AlreadyInProgress)) => {
                S::Rejected(RejectReason::AlreadyInProgress)
            }
            (S::Confirmed, T::Start { total }) => {
                self.total_units = total;
                self.completed_units = 0;
                S::InProgress
            }
            (S::InProgress, T::UnitComplete) => {
                if self.completed_units < self.total_units {
                    self.completed_units += 1;
                } else {
                    log::debug!("{}: unit beyond total {} ignored", self.id, self.total_units);
                }
                S::InProgress
            }
            (S::Confirmed | S::InProgress, T::Finish) => S::Completed,
            (S::Confirmed | S::InProgress, T::Removed { count }) => {
                self.total_units = count;
                self.completed_units = count;
                S::Completed
            }
            (S::Confirmed | S::InProgress, T::Fail(kind)) => S::Failed(kind),
            (status, transition) => {
                return Err(TransitionError {
                    operation: self.id,
                    status: status.name(),
                    transition: transition.name(),
                })
            }
        };

        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LayerConfig;
    use crate::layers::descriptor::LayerKind;

    fn operation(kind: CacheKind) -> CacheOperation {
        let layer = LayerDescriptor::from_config(
            &LayerConfig::new("gsi-std", "地理院地図", "https://example.org/{z}/{x}/{y}.png"),
            LayerKind::Base,
        );
        CacheOperation::new(OperationId(1), &layer, kind)
    }

    #[test]
    fn test_save_lifecycle() {
        let mut op = operation(CacheKind::Save);
        op.apply(Transition::Confirm).unwrap();
        op.apply(Transition::Start { total: 4 }).unwrap();

        let mut percents = Vec::new();
        for _ in 0..4 {
            op.apply(Transition::UnitComplete).unwrap();
            percents.push(op.percent());
        }
        op.apply(Transition::Finish).unwrap();

        assert_eq!(percents, vec![25, 50, 75, 100]);
        assert_eq!(op.status, OperationStatus::Completed);
    }

    #[test]
    fn test_completed_units_never_exceed_total() {
        let mut op = operation(CacheKind::Save);
        op.apply(Transition::Confirm).unwrap();
        op.apply(Transition::Start { total: 1 }).unwrap();
        op.apply(Transition::UnitComplete).unwrap();
        op.apply(Transition::UnitComplete).unwrap();

        assert_eq!(op.completed_units, 1);
        assert_eq!(op.percent(), 100);
    }

    #[test]
    fn test_terminal_states_refuse_further_events() {
        let mut op = operation(CacheKind::Save);
        op.apply(Transition::Confirm).unwrap();
        op.apply(Transition::Start { total: 2 }).unwrap();
        op.apply(Transition::Finish).unwrap();

        let err = op.apply(Transition::UnitComplete).unwrap_err();
        assert_eq!(err.status, "completed");
        assert_eq!(err.transition, "unit-complete");
        assert_eq!(op.status, OperationStatus::Completed);
        assert_eq!(op.completed_units, 0);
    }

    #[test]
    fn test_illegal_transitions() {
        let mut op = operation(CacheKind::Save);
        assert!(op.apply(Transition::Start { total: 1 }).is_err());
        assert!(op.apply(Transition::UnitComplete).is_err());
        assert_eq!(op.status, OperationStatus::Pending);

        op.apply(Transition::Confirm).unwrap();
        assert!(op.apply(Transition::Reject(RejectReason::UserDeclined)).is_err());
        op.apply(Transition::Start { total: 1 }).unwrap();
        assert!(op.apply(Transition::Start { total: 1 }).is_err());
        assert!(op.apply(Transition::Confirm).is_err());
    }

    #[test]
    fn test_remove_completes_directly() {
        let mut op = operation(CacheKind::Remove);
        op.apply(Transition::Confirm).unwrap();
        op.apply(Transition::Removed { count: 42 }).unwrap();

        assert_eq!(op.status, OperationStatus::Completed);
        assert_eq!(op.completed_units, 42);
    }

    #[test]
    fn test_declining_rejects_from_pending() {
        let mut op = operation(CacheKind::Remove);
        op.apply(Transition::Reject(RejectReason::UserDeclined)).unwrap();
        assert_eq!(op.status, OperationStatus::Rejected(RejectReason::UserDeclined));
        assert!(op.is_terminal());
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            FailureKind::classify(&CacheFailure::new("TypeError: Failed to fetch")),
            FailureKind::Transport
        );
        assert_eq!(
            FailureKind::classify(&CacheFailure::transport("connection reset")),
            FailureKind::Transport
        );
        assert_eq!(FailureKind::classify(&CacheFailure::unspecified()), FailureKind::Transport);
        assert_eq!(
            FailureKind::classify(&CacheFailure::new("QuotaExceededError")),
            FailureKind::Unknown
        );
    }
}
