//! Lifecycle events emitted by a tile cache backend for one save or remove.
//!
//! A save emits `Start`, then one `UnitComplete` per stored tile, then `End`
//! or `Error`. A remove emits `UnitsRemoved` (or `Error`).

/// Failure reported by the tile cache backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFailure {
    /// Human readable cause, when the backend has one
    pub message: Option<String>,
    /// Set when the backend knows the failure happened at the transport level
    pub transport: bool,
}

impl CacheFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            transport: false,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            transport: true,
        }
    }

    /// A failure without any detail
    pub fn unspecified() -> Self {
        Self {
            message: None,
            transport: false,
        }
    }
}

impl std::fmt::Display for CacheFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}", message),
            None => write!(f, "unspecified cache failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Download started; `total` tiles will be fetched
    Start { total: usize },
    /// One tile was fetched and stored
    UnitComplete,
    /// Download finished
    End,
    /// The operation failed
    Error(CacheFailure),
    /// Removal finished; `count` tiles were deleted
    UnitsRemoved { count: usize },
}

impl CacheEvent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            CacheEvent::Start { .. } => "start",
            CacheEvent::UnitComplete => "unit-complete",
            CacheEvent::End => "end",
            CacheEvent::Error(_) => "error",
            CacheEvent::UnitsRemoved { .. } => "units-removed",
        }
    }
}
