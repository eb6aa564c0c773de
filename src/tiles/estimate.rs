//! Tile enumeration for bulk saves.
//!
//! Mirrors how the offline control enumerates tiles: for every requested zoom
//! the tile range under the viewport rectangle, inclusive on both ends and
//! clipped to the pyramid.

use crate::core::geo::{LatLng, LatLngBounds, TileCoord};

/// Inclusive tile range at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Tile range covering `bounds` at `zoom`
    pub fn covering(bounds: &LatLngBounds, zoom: u8) -> Self {
        let north_west = TileCoord::from_lat_lng(&LatLng::new(bounds.north(), bounds.west()), zoom);
        let south_east = TileCoord::from_lat_lng(&LatLng::new(bounds.south(), bounds.east()), zoom);

        Self {
            zoom,
            min_x: north_west.x.min(south_east.x),
            min_y: north_west.y.min(south_east.y),
            max_x: north_west.x.max(south_east.x),
            max_y: north_west.y.max(south_east.y),
        }
    }

    /// Tile count, saturating at `usize::MAX` on narrow targets
    pub fn len(&self) -> usize {
        let width = u64::from(self.max_x - self.min_x) + 1;
        let height = u64::from(self.max_y - self.min_y) + 1;
        usize::try_from(width.saturating_mul(height)).unwrap_or(usize::MAX)
    }

    /// Inclusive ranges always hold at least one tile
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.min_y..=self.max_y).flat_map(move |y| {
            (self.min_x..=self.max_x).map(move |x| TileCoord::new(x, y, self.zoom))
        })
    }
}

/// Number of tiles a save of `bounds` at `zoom_levels` would fetch.
///
/// Invalid bounds count as zero tiles. Huge areas saturate instead of
/// wrapping, so they always exceed any ceiling.
pub fn count_tiles(bounds: &LatLngBounds, zoom_levels: &[u8]) -> usize {
    if !bounds.is_valid() {
        return 0;
    }
    zoom_levels
        .iter()
        .map(|zoom| TileRange::covering(bounds, *zoom).len())
        .fold(0usize, usize::saturating_add)
}

const PREALLOCATE_LIMIT: usize = 1 << 16;

/// Every tile a save of `bounds` at `zoom_levels` would fetch, zoom by zoom
pub fn tiles_in_bounds(bounds: &LatLngBounds, zoom_levels: &[u8]) -> Vec<TileCoord> {
    if !bounds.is_valid() {
        return Vec::new();
    }
    let mut tiles = Vec::with_capacity(count_tiles(bounds, zoom_levels).min(PREALLOCATE_LIMIT));
    for zoom in zoom_levels {
        tiles.extend(TileRange::covering(bounds, *zoom).coords());
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tile_bounds() {
        let tile = TileCoord::new(58210, 25803, 16);
        let b = tile.bounds();
        // Shrink slightly so the rectangle stays inside one tile
        let inner = LatLngBounds::from_coords(
            b.south() + 1e-7,
            b.west() + 1e-7,
            b.north() - 1e-7,
            b.east() - 1e-7,
        );

        assert_eq!(count_tiles(&inner, &[16]), 1);
        assert_eq!(tiles_in_bounds(&inner, &[16]), vec![tile]);
        // One zoom deeper covers the four children
        assert_eq!(count_tiles(&inner, &[16, 17]), 5);
    }

    #[test]
    fn test_range_is_inclusive() {
        let nw = TileCoord::new(10, 20, 8).bounds();
        let se = TileCoord::new(12, 23, 8).bounds();
        let bounds = LatLngBounds::from_coords(
            se.south() + 1e-6,
            nw.west() + 1e-6,
            nw.north() - 1e-6,
            se.east() - 1e-6,
        );

        let range = TileRange::covering(&bounds, 8);
        assert_eq!((range.min_x, range.max_x, range.min_y, range.max_y), (10, 12, 20, 23));
        assert_eq!(range.len(), 12);
        assert_eq!(range.coords().count(), 12);
    }

    #[test]
    fn test_world_at_zoom_two() {
        let world = LatLngBounds::from_coords(-85.0, -180.0, 85.0, 180.0);
        assert_eq!(count_tiles(&world, &[2]), 16);
    }

    #[test]
    fn test_world_at_save_zooms_saturates_instead_of_wrapping() {
        let world = LatLngBounds::from_coords(-85.0, -180.0, 85.0, 180.0);

        let z18 = TileRange::covering(&world, 18);
        assert_eq!((z18.min_x, z18.max_x), (0, (1 << 18) - 1));
        let exact = u64::from(z18.max_x - z18.min_x + 1) * u64::from(z18.max_y - z18.min_y + 1);
        assert!(exact > u64::from(u32::MAX));
        assert_eq!(z18.len(), usize::try_from(exact).unwrap_or(usize::MAX));

        let total = count_tiles(&world, &[16, 17, 18]);
        assert!(total >= z18.len());
        assert!(total > 2500);
    }

    #[test]
    fn test_invalid_bounds_yield_nothing() {
        let inverted = LatLngBounds::from_coords(36.0, 140.0, 35.0, 139.0);
        assert_eq!(count_tiles(&inverted, &[16]), 0);
        assert!(tiles_in_bounds(&inverted, &[16]).is_empty());
    }
}
