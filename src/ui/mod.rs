pub mod format;
pub mod notification;

pub use format::{format_bytes, format_percent};
pub use notification::{Notice, NoticeKind, NotificationSurface};
