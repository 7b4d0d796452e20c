//! Remembers fragments which are known to carry no geometry.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::{
    coords::Quadkey,
    fragment::{FragmentKey, RegionId},
};

/// A two level LRU: the outer level bounds the number of regions, the inner level the number
/// of quads per region. A key which is missing may still be empty; it was either never
/// downloaded or it got evicted.
pub struct EmptyFragments {
    regions: LruCache<RegionId, LruCache<Quadkey, ()>>,
    quads_per_region: NonZeroUsize,
}

impl EmptyFragments {
    pub fn new(region_capacity: NonZeroUsize, quads_per_region: NonZeroUsize) -> Self {
        Self {
            regions: LruCache::new(region_capacity),
            quads_per_region,
        }
    }

    pub fn insert(&mut self, key: &FragmentKey) {
        if let Some(quads) = self.regions.get_mut(&key.region_id) {
            quads.put(key.quad, ());
            return;
        }

        let mut quads = LruCache::new(self.quads_per_region);
        quads.put(key.quad, ());
        if let Some((evicted, _)) = self.regions.push(key.region_id.clone(), quads) {
            log::debug!("forgot empty fragments of region {evicted}");
        }
    }

    /// Looks up `key` and marks it as recently used.
    pub fn contains(&mut self, key: &FragmentKey) -> bool {
        self.regions
            .get_mut(&key.region_id)
            .map_or(false, |quads| quads.get(&key.quad).is_some())
    }

    /// Looks up `key` without touching the recency order.
    pub fn peek(&self, key: &FragmentKey) -> bool {
        self.regions
            .peek(&key.region_id)
            .map_or(false, |quads| quads.contains(&key.quad))
    }

    pub fn remove_region(&mut self, region_id: &RegionId) {
        self.regions.pop(region_id);
    }

    /// Number of remembered keys over all regions.
    pub fn len(&self) -> usize {
        self.regions.iter().map(|(_, quads)| quads.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use crate::fragment::{empty::EmptyFragments, FragmentKey, RegionId};

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn key(region: &str, quad: &str) -> FragmentKey {
        FragmentKey::parse(region, quad).unwrap()
    }

    #[test]
    fn test_quads_per_region_are_bounded() {
        let mut empty = EmptyFragments::new(capacity(4), capacity(2));
        empty.insert(&key("a", "0"));
        empty.insert(&key("a", "1"));
        assert!(empty.contains(&key("a", "0")));

        // "1" is now the least recently used quad of "a".
        empty.insert(&key("a", "2"));
        assert!(empty.contains(&key("a", "0")));
        assert!(!empty.contains(&key("a", "1")));
        assert!(empty.contains(&key("a", "2")));
        assert_eq!(empty.len(), 2);
    }

    #[test]
    fn test_regions_are_bounded() {
        let mut empty = EmptyFragments::new(capacity(2), capacity(8));
        empty.insert(&key("a", "0"));
        empty.insert(&key("b", "0"));
        empty.insert(&key("c", "0"));

        assert!(!empty.contains(&key("a", "0")));
        assert!(empty.contains(&key("b", "0")));
        assert!(empty.contains(&key("c", "0")));

        empty.remove_region(&RegionId::from("b"));
        assert!(!empty.contains(&key("b", "0")));
        assert_eq!(empty.len(), 1);
    }
}
