//! Sorts downloaded geometry into empty and renderable fragments and commits finished
//! projections to the cache.

use std::{borrow::Cow, mem};

use crate::{
    context::MapContext,
    fragment::pipeline::FragmentProjection,
    tcs::system::System,
    world::World,
};

pub struct FragmentEmitSystem;

impl System for FragmentEmitSystem {
    fn name(&self) -> Cow<'static, str> {
        "fragment_emit".into()
    }

    #[tracing::instrument(name = "fragment_emit", skip_all)]
    fn run(
        &mut self,
        MapContext {
            world:
                World {
                    regions,
                    streaming,
                    cached,
                    empty,
                    changes,
                    downloaded,
                    emitted,
                    ..
                },
            view_state,
            projection,
            ..
        }: &mut MapContext,
    ) {
        emitted.clear();

        for (key, geometry) in mem::take(downloaded) {
            let region = match regions.get(&key.region_id) {
                Some(region) if view_state.is_visible(&key.quad) => region,
                _ => {
                    log::trace!("discarding obsolete fragment {key}");
                    streaming.release(&key);
                    continue;
                }
            };

            if geometry.0.is_empty() {
                streaming.release(&key);
                empty.insert(&key);
                emitted.insert(key);
                continue;
            }

            let layer_id = region.layer_id();
            streaming.start_projection(FragmentProjection::new(
                key,
                geometry,
                layer_id,
                projection.clone(),
            ));
        }

        for fragment in streaming.take_finished() {
            let key = &fragment.key;
            if !regions.contains(&key.region_id) || !view_state.is_visible(&key.quad) {
                log::trace!("discarding obsolete projection of {key}");
                continue;
            }
            emitted.insert(key.clone());
            cached.insert(fragment);
        }

        for key in &changes.requested {
            if cached.contains(key) {
                emitted.insert(key.clone());
            }
        }
        emitted.extend(changes.known_empty.iter().cloned());
    }
}
