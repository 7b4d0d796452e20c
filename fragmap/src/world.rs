use std::fmt;

use crate::{
    fragment::{
        cache::CachedFragments,
        changes::{ChangedFragments, DownloadedFragments, EmittedFragments},
        empty::EmptyFragments,
        queue::DownloadQueue,
        streaming::StreamingFragments,
        RegionId,
    },
    region::{PendingRegions, Region, Regions},
    settings::{FragmentSettings, SettingsError},
};

/// All registries of the engine. Systems access them through the
/// [`MapContext`](crate::context::MapContext).
///
/// A fragment key lives in at most one of `queue`, `streaming`, `cached` and `empty`.
pub struct World {
    pub regions: Regions,
    pub pending: PendingRegions,
    pub queue: DownloadQueue,
    pub streaming: StreamingFragments,
    pub cached: CachedFragments,
    pub empty: EmptyFragments,

    /// Recomputed every tick.
    pub changes: ChangedFragments,
    pub downloaded: DownloadedFragments,
    pub emitted: EmittedFragments,
    pub ready_regions: Vec<RegionId>,
}

impl World {
    pub fn new(settings: &FragmentSettings) -> Result<Self, SettingsError> {
        let (outer, inner) = settings.memo_capacities()?;
        Ok(Self {
            regions: Regions::default(),
            pending: PendingRegions::default(),
            queue: DownloadQueue::new(),
            streaming: StreamingFragments::new(),
            cached: CachedFragments::new(),
            empty: EmptyFragments::new(outer, inner),
            changes: ChangedFragments::default(),
            downloaded: DownloadedFragments::new(),
            emitted: EmittedFragments::new(),
            ready_regions: Vec::new(),
        })
    }

    /// Forgets a region: its queued fragments, its pending state, the empty fragments
    /// remembered for it and its cached fragments. Responses which are still in flight are
    /// discarded when they arrive.
    pub fn remove_region(&mut self, id: &RegionId) -> Option<Region> {
        let region = self.regions.remove(id)?;

        self.pending.remove(id);
        self.queue.remove_where(|key| &key.region_id == id);
        self.empty.remove_region(id);

        let owned: Vec<_> = self.cached.keys_of_region(id).cloned().collect();
        for key in &owned {
            self.cached.dispose(key);
        }
        log::info!(
            "removed region {id}, disposed {} cached fragments",
            owned.len()
        );
        Some(region)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            regions: self.regions.len(),
            queued: self.queue.len(),
            streaming: self.streaming.len(),
            cached: self.cached.len(),
            empty: self.empty.len(),
        }
    }
}

/// Sizes of the registries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub regions: usize,
    pub queued: usize,
    pub streaming: usize,
    pub cached: usize,
    pub empty: usize,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "regions: {}, queued: {}, streaming: {}, cached: {}, empty: {}",
            self.regions, self.queued, self.streaming, self.cached, self.empty
        )
    }
}
