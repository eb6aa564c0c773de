//! The single transient status line shared by every cache operation.
//!
//! Each `show` replaces whatever was displayed and re-arms the dismiss
//! deadline. Progress notices have no deadline; the next notice supersedes
//! them.

use crate::core::config::NotificationConfig;
use crossbeam_channel::{unbounded, Receiver, Sender};
use instant::Instant;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Info,
    /// Percentage update of a running operation
    Progress,
    /// Rendered with the error styling
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub shown_at: Instant,
    /// `None` for notices that stay until superseded
    pub dismiss_after: Option<Duration>,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    pub fn dismisses_at(&self) -> Option<Instant> {
        self.dismiss_after.map(|delay| self.shown_at + delay)
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        match self.dismisses_at() {
            Some(deadline) => now < deadline,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    current: Option<Notice>,
    subscribers: Vec<Sender<Notice>>,
}

/// Latest-wins notification surface
#[derive(Debug, Default)]
pub struct NotificationSurface {
    config: NotificationConfig,
    state: Mutex<SurfaceState>,
}

impl NotificationSurface {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SurfaceState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the status line; errors stay up longer than normal messages
    pub fn show(&self, message: impl Into<String>, is_error: bool) -> Notice {
        let (kind, delay) = if is_error {
            (NoticeKind::Error, self.config.error_dismiss())
        } else {
            (NoticeKind::Info, self.config.info_dismiss())
        };
        self.publish(message.into(), kind, Some(delay))
    }

    /// Replaces the status line with a notice that never auto-dismisses
    pub fn show_progress(&self, message: impl Into<String>) -> Notice {
        self.publish(message.into(), NoticeKind::Progress, None)
    }

    fn publish(&self, message: String, kind: NoticeKind, dismiss_after: Option<Duration>) -> Notice {
        let notice = Notice {
            message,
            kind,
            shown_at: Instant::now(),
            dismiss_after,
        };

        if notice.is_error() {
            log::warn!("{}", notice.message);
        } else {
            log::debug!("{}", notice.message);
        }

        let mut state = self.lock();
        state.current = Some(notice.clone());
        state
            .subscribers
            .retain(|tx| tx.send(notice.clone()).is_ok());
        notice
    }

    /// The notice on screen right now, if any
    pub fn current(&self) -> Option<Notice> {
        self.current_at(Instant::now())
    }

    /// The notice that would be on screen at `now`
    pub fn current_at(&self, now: Instant) -> Option<Notice> {
        self.lock()
            .current
            .as_ref()
            .filter(|notice| notice.is_visible_at(now))
            .cloned()
    }

    /// The last notice shown, whether or not it has been dismissed
    pub fn last(&self) -> Option<Notice> {
        self.lock().current.clone()
    }

    pub fn clear(&self) {
        self.lock().current = None;
    }

    /// Receives every notice published from now on
    pub fn subscribe(&self) -> Receiver<Notice> {
        let (tx, rx) = unbounded();
        self.lock().subscribers.push(tx);
        rx
    }
}
