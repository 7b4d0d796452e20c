//! Decides up front whether a fragment can carry geometry at all.

use geo::Intersects;
use geo_types::Rect;

use crate::coords::Quadkey;

/// A pure predicate. Fragments for which it answers `true` are never requested.
pub trait EmptinessChecker {
    fn is_empty(&self, bbox: Option<&Rect<f64>>, quad: &Quadkey) -> bool;
}

/// Treats a fragment as empty if the region's bounding box does not touch the quad. Regions
/// without a bounding box are never empty.
#[derive(Copy, Clone, Debug, Default)]
pub struct BoundingBoxEmptinessChecker;

impl EmptinessChecker for BoundingBoxEmptinessChecker {
    fn is_empty(&self, bbox: Option<&Rect<f64>>, quad: &Quadkey) -> bool {
        match bbox {
            Some(bbox) => !bbox.intersects(&quad.lon_lat_rect()),
            None => false,
        }
    }
}

/// Requests every fragment.
#[derive(Copy, Clone, Debug, Default)]
pub struct NeverEmpty;

impl EmptinessChecker for NeverEmpty {
    fn is_empty(&self, _bbox: Option<&Rect<f64>>, _quad: &Quadkey) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use geo_types::{coord, Rect};

    use crate::{
        coords::Quadkey,
        fragment::emptiness::{BoundingBoxEmptinessChecker, EmptinessChecker},
    };

    #[test]
    fn test_bounding_box() {
        let checker = BoundingBoxEmptinessChecker;
        // Somewhere in central europe.
        let bbox = Rect::new(coord! { x: 5.0, y: 45.0 }, coord! { x: 15.0, y: 55.0 });

        let north_east: Quadkey = "1".parse().unwrap();
        let south_west: Quadkey = "2".parse().unwrap();
        assert!(!checker.is_empty(Some(&bbox), &north_east));
        assert!(checker.is_empty(Some(&bbox), &south_west));
        assert!(!checker.is_empty(None, &south_west));
    }
}
