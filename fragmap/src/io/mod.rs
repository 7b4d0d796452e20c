//! Handles IO related processing as well as multithreading.

use std::{collections::BTreeSet, fmt};

use crate::{coords::Quadkey, fragment::RegionId};

pub mod inbox;
pub mod scheduler;
pub mod source_client;

/// A request for the fragments of one region at the given quads.
#[derive(Clone)]
pub struct FragmentRequest {
    pub region_id: RegionId,
    pub quads: BTreeSet<Quadkey>,
}

impl fmt::Debug for FragmentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentRequest({}, {:?})", &self.region_id, &self.quads)
    }
}
