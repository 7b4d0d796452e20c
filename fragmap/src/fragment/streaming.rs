//! Fragments which were dispatched to the server and are not cached yet.

use std::collections::{BTreeSet, HashMap};

use crate::{
    coords::ZoomLevel,
    fragment::{pipeline::FragmentProjection, FragmentKey, RenderableFragment},
    multitasking::MicroTask,
};

pub enum StreamingState {
    /// A request for the fragment is running.
    Downloading,
    /// The geometry arrived and is being processed.
    Projecting(Box<FragmentProjection>),
}

/// The in-flight set. A fragment enters when its request is dispatched and leaves when its
/// response is discarded, found empty, or its projection is committed to the cache.
#[derive(Default)]
pub struct StreamingFragments {
    fragments: HashMap<FragmentKey, StreamingState>,
}

impl StreamingFragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_download(&mut self, key: FragmentKey) {
        let previous = self.fragments.insert(key, StreamingState::Downloading);
        assert!(previous.is_none(), "fragment is already streaming");
    }

    /// Attaches a projection to a downloading fragment. A fragment is never projected twice.
    pub fn start_projection(&mut self, projection: FragmentProjection) {
        let key = projection.key().clone();
        match self.fragments.get_mut(&key) {
            Some(state) => {
                assert!(
                    matches!(state, StreamingState::Downloading),
                    "fragment {key} is already projecting"
                );
                *state = StreamingState::Projecting(Box::new(projection));
            }
            None => panic!("fragment {key} is not streaming"),
        }
    }

    pub fn release(&mut self, key: &FragmentKey) -> Option<StreamingState> {
        self.fragments.remove(key)
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.fragments.contains_key(key)
    }

    pub fn is_downloading(&self, key: &FragmentKey) -> bool {
        matches!(self.fragments.get(key), Some(StreamingState::Downloading))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FragmentKey> {
        self.fragments.keys()
    }

    /// Zoom levels of all fragments which are still streaming.
    pub fn zooms(&self) -> BTreeSet<ZoomLevel> {
        self.fragments.keys().map(FragmentKey::zoom).collect()
    }

    /// Running projections in key order.
    pub fn projections_mut(&mut self) -> Vec<&mut FragmentProjection> {
        let mut projections: Vec<&mut FragmentProjection> = self
            .fragments
            .values_mut()
            .filter_map(|state| match state {
                StreamingState::Projecting(projection) if projection.alive() => {
                    Some(projection.as_mut())
                }
                _ => None,
            })
            .collect();
        projections.sort_by(|a, b| a.key().cmp(b.key()));
        projections
    }

    /// Removes every finished projection from the set and returns its result.
    pub fn take_finished(&mut self) -> Vec<RenderableFragment> {
        let finished: Vec<FragmentKey> = self
            .fragments
            .iter()
            .filter_map(|(key, state)| match state {
                StreamingState::Projecting(projection) if !projection.alive() => Some(key.clone()),
                _ => None,
            })
            .collect();

        let mut fragments: Vec<RenderableFragment> = finished
            .into_iter()
            .filter_map(|key| match self.fragments.remove(&key) {
                Some(StreamingState::Projecting(mut projection)) => projection.take_result(),
                _ => None,
            })
            .collect();
        fragments.sort_by(|a, b| a.key.cmp(&b.key));
        fragments
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use geo_types::{polygon, MultiPolygon};

    use crate::{
        coords::ZoomLevel,
        fragment::{
            pipeline::FragmentProjection, streaming::StreamingFragments, FragmentKey, LayerId,
        },
        multitasking::run_quant,
        projection::GeographicProjection,
    };

    fn projection(key: &FragmentKey) -> FragmentProjection {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 2.0),
            (x: 1.0, y: 1.0),
        ]]);
        FragmentProjection::new(key.clone(), geometry, LayerId(0), Arc::new(GeographicProjection))
    }

    #[test]
    fn test_lifecycle() {
        let key = FragmentKey::parse("r", "01").unwrap();
        let other = FragmentKey::parse("r", "0").unwrap();
        let mut streaming = StreamingFragments::new();
        streaming.start_download(key.clone());
        streaming.start_download(other.clone());

        assert!(streaming.is_downloading(&key));
        assert_eq!(
            streaming.zooms().into_iter().collect::<Vec<_>>(),
            vec![ZoomLevel::new(1), ZoomLevel::new(2)]
        );

        streaming.start_projection(projection(&key));
        assert!(!streaming.is_downloading(&key));
        assert!(streaming.take_finished().is_empty());

        for projection in streaming.projections_mut() {
            run_quant(projection, usize::MAX);
        }
        let finished = streaming.take_finished();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].key, key);
        assert!(!streaming.contains(&key));
        assert_eq!(streaming.len(), 1);
    }

    #[test]
    #[should_panic]
    fn test_projection_requires_download() {
        let key = FragmentKey::parse("r", "01").unwrap();
        StreamingFragments::new().start_projection(projection(&key));
    }
}
