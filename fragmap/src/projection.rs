//! Map projections which turn longitude and latitude into world coordinates.

use std::f64::consts::PI;

use geo_types::{coord, Coord, Rect};

use crate::coords::{bounds_from_coords, TILE_SIZE};

/// The latitude at which web mercator is cut off so that the world becomes a square.
pub const MERCATOR_LAT_LIMIT: f64 = 85.05112877980659;

/// Projects geographic coordinates (`x` = longitude, `y` = latitude) into world
/// coordinates. The world spans `0..TILE_SIZE` on both axes, with `y` pointing south.
pub trait MapProjection: Send + Sync + 'static {
    fn project(&self, lon_lat: Coord<f64>) -> Coord<f64>;

    /// World bounding box of a geographic rectangle.
    fn project_rect(&self, rect: &Rect<f64>) -> Rect<f64> {
        let corners = [
            self.project(rect.min()),
            self.project(rect.max()),
            self.project(coord! { x: rect.min().x, y: rect.max().y }),
            self.project(coord! { x: rect.max().x, y: rect.min().y }),
        ];
        // Four corners are always present.
        bounds_from_coords(corners.iter()).unwrap_or(*rect)
    }
}

/// Web mercator.
#[derive(Copy, Clone, Debug, Default)]
pub struct MercatorProjection;

impl MapProjection for MercatorProjection {
    fn project(&self, lon_lat: Coord<f64>) -> Coord<f64> {
        let lat = lon_lat
            .y
            .clamp(-MERCATOR_LAT_LIMIT, MERCATOR_LAT_LIMIT)
            .to_radians();
        let x = (lon_lat.x + 180.0) / 360.0;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
        coord! { x: x * TILE_SIZE, y: y * TILE_SIZE }
    }
}

/// Equirectangular projection. Quads are squares in geographic space, so they stay squares.
#[derive(Copy, Clone, Debug, Default)]
pub struct GeographicProjection;

impl MapProjection for GeographicProjection {
    fn project(&self, lon_lat: Coord<f64>) -> Coord<f64> {
        coord! {
            x: (lon_lat.x + 180.0) / 360.0 * TILE_SIZE,
            y: (90.0 - lon_lat.y) / 180.0 * TILE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use geo_types::{coord, Rect};

    use crate::projection::{GeographicProjection, MapProjection, MercatorProjection};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_mercator() {
        let projection = MercatorProjection;
        let center = projection.project(coord! { x: 0.0, y: 0.0 });
        assert_close(center.x, 128.0);
        assert_close(center.y, 128.0);

        let north_west = projection.project(coord! { x: -180.0, y: 90.0 });
        assert_close(north_west.x, 0.0);
        assert_close(north_west.y, 0.0);
    }

    #[test]
    fn test_project_rect() {
        let rect = Rect::new(coord! { x: -180.0, y: 0.0 }, coord! { x: 0.0, y: 90.0 });
        let world = GeographicProjection.project_rect(&rect);
        assert_eq!(world.min(), coord! { x: 0.0, y: 0.0 });
        assert_eq!(world.max(), coord! { x: 128.0, y: 128.0 });
    }
}
