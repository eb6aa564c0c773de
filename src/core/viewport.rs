use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};

/// The last settled view of the map: center and zoom.
///
/// Serialized as `{"lat": .., "lng": .., "zoom": ..}`, which is also the
/// layout persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

impl ViewportState {
    pub fn new(lat: f64, lng: f64, zoom: f64) -> Self {
        Self { lat, lng, zoom }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// A center inside the globe and a finite, non-negative zoom
    pub fn is_valid(&self) -> bool {
        self.center().is_valid() && self.zoom.is_finite() && self.zoom >= 0.0
    }
}

/// Payload of a settle event: the view plus the rectangle it shows.
///
/// Bounds come from the rendering surface; projection math stays there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettledViewport {
    pub state: ViewportState,
    pub bounds: LatLngBounds,
}

impl SettledViewport {
    pub fn new(state: ViewportState, bounds: LatLngBounds) -> Self {
        Self { state, bounds }
    }
}
