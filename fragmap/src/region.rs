//! Regions and the bookkeeping of the fragments they are waiting for.

use std::collections::{BTreeMap, BTreeSet};

use geo_types::Rect;

use crate::{
    coords::ZoomLevel,
    fragment::{FragmentKey, LayerId, RegionId},
};

/// A region of the map, e.g. a country, whose geometry is streamed as fragments.
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    bbox: Option<Rect<f64>>,
    layer_id: LayerId,
    displayed: BTreeSet<FragmentKey>,
}

impl Region {
    pub fn new(id: impl Into<RegionId>) -> Self {
        Self {
            id: id.into(),
            bbox: None,
            layer_id: LayerId::default(),
            displayed: BTreeSet::new(),
        }
    }

    /// The lon/lat bounding box of the region, if known.
    pub fn with_bbox(mut self, bbox: Rect<f64>) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_layer(mut self, layer_id: LayerId) -> Self {
        self.layer_id = layer_id;
        self
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn bbox(&self) -> Option<&Rect<f64>> {
        self.bbox.as_ref()
    }

    pub fn layer_id(&self) -> LayerId {
        self.layer_id
    }

    /// Keys of the fragments the renderer should draw for this region.
    pub fn displayed(&self) -> &BTreeSet<FragmentKey> {
        &self.displayed
    }

    pub(crate) fn replace_displayed(&mut self, displayed: BTreeSet<FragmentKey>) {
        self.displayed = displayed;
    }
}

/// Registry of all regions.
#[derive(Default)]
pub struct Regions {
    regions: BTreeMap<RegionId, Region>,
    added: BTreeSet<RegionId>,
}

impl Regions {
    /// Registers a region. It is diffed against the whole visible set on the next tick.
    pub fn insert(&mut self, region: Region) -> Option<Region> {
        let id = region.id.clone();
        self.added.insert(id.clone());
        self.regions.insert(id, region)
    }

    pub fn remove(&mut self, id: &RegionId) -> Option<Region> {
        self.added.remove(id);
        self.regions.remove(id)
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn get_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        self.regions.get_mut(id)
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Regions registered since the last call.
    pub fn take_added(&mut self) -> BTreeSet<RegionId> {
        std::mem::take(&mut self.added)
    }

    /// True if any region displays `key`.
    pub fn is_displayed(&self, key: &FragmentKey) -> bool {
        self.regions
            .get(&key.region_id)
            .map_or(false, |region| region.displayed.contains(key))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Fragments a region is waiting for at the pending zoom level.
///
/// `ready` and `waiting` are disjoint. `done` is raised once when `waiting` runs empty, by a
/// key becoming ready or by the last waiting key being removed, and stays raised until it is
/// consumed.
#[derive(Default, Debug)]
pub struct PendingFragments {
    waiting: BTreeSet<FragmentKey>,
    ready: BTreeSet<FragmentKey>,
    done: bool,
}

impl PendingFragments {
    pub fn add_waiting(&mut self, key: FragmentKey) {
        self.ready.remove(&key);
        self.waiting.insert(key);
    }

    /// Forgets `key`. Taking the last waiting key away raises `done` if anything is ready.
    pub fn remove(&mut self, key: &FragmentKey) {
        let was_waiting = self.waiting.remove(key);
        self.ready.remove(key);
        if was_waiting && self.waiting.is_empty() && !self.ready.is_empty() {
            self.done = true;
        }
    }

    /// Moves `key` from waiting to ready. Only a key which was waiting can raise `done`.
    pub fn mark_ready(&mut self, key: &FragmentKey) {
        if self.waiting.remove(key) {
            self.ready.insert(key.clone());
            if self.waiting.is_empty() {
                self.done = true;
            }
        }
    }

    pub fn take_done(&mut self) -> bool {
        std::mem::replace(&mut self.done, false)
    }

    pub fn waiting(&self) -> &BTreeSet<FragmentKey> {
        &self.waiting
    }

    pub fn ready(&self) -> &BTreeSet<FragmentKey> {
        &self.ready
    }
}

/// The pending state of all regions and the zoom level it refers to.
#[derive(Default, Debug)]
pub struct PendingRegions {
    zoom: Option<ZoomLevel>,
    regions: BTreeMap<RegionId, PendingFragments>,
}

impl PendingRegions {
    pub fn zoom(&self) -> Option<ZoomLevel> {
        self.zoom
    }

    /// Forgets everything and starts collecting for `zoom`.
    pub fn reset(&mut self, zoom: ZoomLevel) {
        self.zoom = Some(zoom);
        self.regions.clear();
    }

    pub fn get(&self, id: &RegionId) -> Option<&PendingFragments> {
        self.regions.get(id)
    }

    pub fn get_or_default(&mut self, id: &RegionId) -> &mut PendingFragments {
        self.regions.entry(id.clone()).or_default()
    }

    pub fn get_mut(&mut self, id: &RegionId) -> Option<&mut PendingFragments> {
        self.regions.get_mut(id)
    }

    pub fn remove(&mut self, id: &RegionId) -> Option<PendingFragments> {
        self.regions.remove(id)
    }

    /// Consumes the `done` flags. Returns the regions which had it raised, with their ready
    /// keys.
    pub fn take_done(&mut self) -> Vec<(RegionId, BTreeSet<FragmentKey>)> {
        self.regions
            .iter_mut()
            .filter_map(|(id, pending)| {
                pending
                    .take_done()
                    .then(|| (id.clone(), pending.ready.clone()))
            })
            .collect()
    }
}
