//! Materialized fragments.

use std::collections::{BTreeMap, HashMap};

use crate::fragment::{FragmentKey, RegionId, RenderableFragment};

/// Called with every fragment which leaves the cache, so render-side resources can be freed.
pub type DisposeHook = Box<dyn FnMut(&RenderableFragment)>;

/// Owns every [`RenderableFragment`]. Remembers the order of insertion, which is the order of
/// eviction.
#[derive(Default)]
pub struct CachedFragments {
    next_sequence: u64,
    fragments: HashMap<FragmentKey, (u64, RenderableFragment)>,
    insertion_order: BTreeMap<u64, FragmentKey>,
    on_dispose: Option<DisposeHook>,
}

impl CachedFragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dispose_hook(&mut self, hook: DisposeHook) {
        self.on_dispose = Some(hook);
    }

    /// Panics if the fragment is already cached.
    pub fn insert(&mut self, fragment: RenderableFragment) {
        let key = fragment.key.clone();
        assert!(
            !self.fragments.contains_key(&key),
            "fragment {key} is already cached"
        );

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.insertion_order.insert(sequence, key.clone());
        self.fragments.insert(key, (sequence, fragment));
    }

    pub fn get(&self, key: &FragmentKey) -> Option<&RenderableFragment> {
        self.fragments.get(key).map(|(_, fragment)| fragment)
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.fragments.contains_key(key)
    }

    /// Removes the fragment and runs the dispose hook on it. Returns false if it was not
    /// cached.
    pub fn dispose(&mut self, key: &FragmentKey) -> bool {
        let Some((sequence, fragment)) = self.fragments.remove(key) else {
            return false;
        };
        self.insertion_order.remove(&sequence);
        if let Some(hook) = self.on_dispose.as_mut() {
            hook(&fragment);
        }
        log::trace!("disposed fragment {key}");
        true
    }

    /// Cached keys, oldest first.
    pub fn keys_by_age(&self) -> impl Iterator<Item = &FragmentKey> {
        self.insertion_order.values()
    }

    pub fn keys_of_region<'a>(
        &'a self,
        region_id: &'a RegionId,
    ) -> impl Iterator<Item = &'a FragmentKey> + 'a {
        self.keys_by_age()
            .filter(move |key| key.region_id == *region_id)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use geo_types::{coord, LineString, MultiLineString, MultiPolygon, Polygon};

    use crate::fragment::{
        cache::CachedFragments, FragmentKey, LayerId, RegionId, RenderableFragment,
    };

    fn fragment(region: &str, quad: &str) -> RenderableFragment {
        RenderableFragment {
            key: FragmentKey::parse(region, quad).unwrap(),
            geometry: MultiPolygon::new(vec![]),
            border: MultiLineString::new(vec![]),
            clip_path: Polygon::new(LineString::new(vec![]), vec![]),
            origin: coord! { x: 0.0, y: 0.0 },
            dimension: coord! { x: 1.0, y: 1.0 },
            scale: 1.0,
            layer_id: LayerId(0),
        }
    }

    #[test]
    fn test_insertion_order() {
        let mut cache = CachedFragments::new();
        cache.insert(fragment("b", "1"));
        cache.insert(fragment("a", "0"));
        cache.insert(fragment("a", "2"));

        let keys: Vec<String> = cache.keys_by_age().map(|key| key.to_string()).collect();
        assert_eq!(keys, vec!["b@1", "a@0", "a@2"]);

        let region = RegionId::from("a");
        assert_eq!(cache.keys_of_region(&region).count(), 2);
    }

    #[test]
    fn test_dispose_calls_hook() {
        let disposed = Rc::new(RefCell::new(Vec::new()));
        let mut cache = CachedFragments::new();
        let sink = disposed.clone();
        cache.set_dispose_hook(Box::new(move |fragment| {
            sink.borrow_mut().push(fragment.key.clone())
        }));

        cache.insert(fragment("a", "0"));
        let key = FragmentKey::parse("a", "0").unwrap();
        assert!(cache.contains(&key));
        assert!(cache.dispose(&key));
        assert!(!cache.dispose(&key));
        assert!(cache.is_empty());
        assert_eq!(disposed.borrow().as_slice(), &[key]);
    }

    #[test]
    #[should_panic]
    fn test_double_insert_panics() {
        let mut cache = CachedFragments::new();
        cache.insert(fragment("a", "0"));
        cache.insert(fragment("a", "0"));
    }
}
