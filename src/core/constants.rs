//! Engine-wide defaults derived from the field viewer's behaviour.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Hard ceiling on tiles a single save request may fetch.
pub const MAX_TILES_PER_SAVE: usize = 2500;

/// Zoom levels a save request downloads when the layer does not override them.
pub const DEFAULT_SAVE_ZOOM_LEVELS: [u8; 3] = [16, 17, 18];

/// Auto-dismiss delay for informational notices.
pub const INFO_DISMISS_MS: u64 = 3000;

/// Auto-dismiss delay for error notices.
pub const ERROR_DISMISS_MS: u64 = 8000;

/// Key under which the last viewport is persisted.
pub const MAP_STATE_KEY: &str = "mapState";

/// Boundary feature property carrying the region (prefecture) name.
pub const REGION_NAME_PROPERTY: &str = "N03_001";

/// Initial center when nothing was persisted (Tokyo Station).
pub const DEFAULT_CENTER: (f64, f64) = (35.6809591, 139.7673068);

/// Initial zoom when nothing was persisted.
pub const DEFAULT_ZOOM: f64 = 16.0;

/// Maximum zoom the map surface allows.
pub const MAX_ZOOM: u8 = 23;
