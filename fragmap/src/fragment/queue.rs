//! Fragments waiting to be downloaded, grouped by zoom level.

use std::collections::{BTreeMap, HashMap};

use crate::{coords::ZoomLevel, fragment::FragmentKey};

/// An ordered set which hands out its keys first in, first out.
#[derive(Default)]
pub struct FifoSet {
    next_sequence: u64,
    order: BTreeMap<u64, FragmentKey>,
    index: HashMap<FragmentKey, u64>,
}

impl FifoSet {
    /// Appends `key`. Returns false if it was already contained; the position stays unchanged
    /// in that case.
    pub fn push(&mut self, key: FragmentKey) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.order.insert(sequence, key.clone());
        self.index.insert(key, sequence);
        true
    }

    pub fn remove(&mut self, key: &FragmentKey) -> bool {
        match self.index.remove(key) {
            Some(sequence) => {
                self.order.remove(&sequence);
                true
            }
            None => false,
        }
    }

    pub fn pop_front(&mut self) -> Option<FragmentKey> {
        let sequence = *self.order.keys().next()?;
        let key = self.order.remove(&sequence)?;
        self.index.remove(&key);
        Some(key)
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FragmentKey> {
        self.order.values()
    }
}

/// Per zoom level FIFO queues of fragments which are wanted but not yet requested.
#[derive(Default)]
pub struct DownloadQueue {
    queues: BTreeMap<ZoomLevel, FifoSet>,
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, key: FragmentKey) -> bool {
        self.queues.entry(key.zoom()).or_default().push(key)
    }

    pub fn remove(&mut self, key: &FragmentKey) -> bool {
        let Some(queue) = self.queues.get_mut(&key.zoom()) else {
            return false;
        };
        let removed = queue.remove(key);
        if queue.is_empty() {
            self.queues.remove(&key.zoom());
        }
        removed
    }

    /// Removes and returns the oldest key queued at `zoom`.
    pub fn pop(&mut self, zoom: ZoomLevel) -> Option<FragmentKey> {
        let queue = self.queues.get_mut(&zoom)?;
        let key = queue.pop_front();
        if queue.is_empty() {
            self.queues.remove(&zoom);
        }
        key
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.queues
            .get(&key.zoom())
            .map_or(false, |queue| queue.contains(key))
    }

    /// Drops every key which satisfies `predicate`.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&FragmentKey) -> bool) {
        for queue in self.queues.values_mut() {
            let doomed: Vec<FragmentKey> =
                queue.iter().filter(|key| predicate(key)).cloned().collect();
            for key in &doomed {
                queue.remove(key);
            }
        }
        self.queues.retain(|_, queue| !queue.is_empty());
    }

    pub fn len_at(&self, zoom: ZoomLevel) -> usize {
        self.queues.get(&zoom).map_or(0, FifoSet::len)
    }

    pub fn len(&self) -> usize {
        self.queues.values().map(FifoSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        coords::ZoomLevel,
        fragment::{queue::DownloadQueue, FragmentKey},
    };

    fn key(region: &str, quad: &str) -> FragmentKey {
        FragmentKey::parse(region, quad).unwrap()
    }

    #[test]
    fn test_fifo_per_zoom() {
        let mut queue = DownloadQueue::new();
        assert!(queue.enqueue(key("a", "012")));
        assert!(queue.enqueue(key("a", "01")));
        assert!(queue.enqueue(key("b", "000")));
        assert!(!queue.enqueue(key("a", "012")));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.len_at(ZoomLevel::new(3)), 2);
        assert_eq!(queue.pop(ZoomLevel::new(3)), Some(key("a", "012")));
        assert_eq!(queue.pop(ZoomLevel::new(3)), Some(key("b", "000")));
        assert_eq!(queue.pop(ZoomLevel::new(3)), None);
        assert_eq!(queue.pop(ZoomLevel::new(2)), Some(key("a", "01")));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut queue = DownloadQueue::new();
        queue.enqueue(key("a", "0"));
        queue.enqueue(key("a", "1"));
        queue.enqueue(key("a", "2"));

        assert!(queue.remove(&key("a", "1")));
        assert!(!queue.remove(&key("a", "1")));
        assert!(!queue.contains(&key("a", "1")));

        // Re-enqueueing moves the key to the back.
        queue.enqueue(key("a", "1"));
        let zoom = ZoomLevel::new(1);
        assert_eq!(queue.pop(zoom), Some(key("a", "0")));
        assert_eq!(queue.pop(zoom), Some(key("a", "2")));
        assert_eq!(queue.pop(zoom), Some(key("a", "1")));
    }

    #[test]
    fn test_remove_where() {
        let mut queue = DownloadQueue::new();
        queue.enqueue(key("a", "0"));
        queue.enqueue(key("b", "0"));
        queue.enqueue(key("a", "00"));

        queue.remove_where(|key| key.region_id.as_str() == "a");
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(&key("b", "0")));
    }
}
