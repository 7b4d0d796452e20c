//! Sets of fragment keys which are recomputed on every tick and passed between systems.

use std::collections::{BTreeMap, BTreeSet};

use geo_types::MultiPolygon;

use crate::fragment::FragmentKey;

/// Output of the viewport diff.
#[derive(Default, Debug)]
pub struct ChangedFragments {
    /// Fragments which became visible and may carry geometry.
    pub requested: BTreeSet<FragmentKey>,
    /// Fragments which are no longer visible.
    pub obsolete: BTreeSet<FragmentKey>,
    /// Fragments which became visible but are known to be empty.
    pub known_empty: BTreeSet<FragmentKey>,
}

impl ChangedFragments {
    pub fn is_changed(&self) -> bool {
        !self.requested.is_empty() || !self.obsolete.is_empty() || !self.known_empty.is_empty()
    }

    pub fn clear(&mut self) {
        self.requested.clear();
        self.obsolete.clear();
        self.known_empty.clear();
    }
}

/// Geometry which arrived from the server during this tick.
pub type DownloadedFragments = BTreeMap<FragmentKey, MultiPolygon<f64>>;

/// Fragments which became ready during this tick: empties, freshly cached fragments, and
/// requested fragments which were cached already.
pub type EmittedFragments = BTreeSet<FragmentKey>;
