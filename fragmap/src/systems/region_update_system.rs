//! Tracks which fragments each region still waits for and swaps the displayed fragments of
//! a region once all of them arrived.

use std::{borrow::Cow, collections::BTreeSet};

use crate::{
    context::MapContext,
    coords::ZoomLevel,
    fragment::{emptiness::EmptinessChecker, FragmentKey},
    tcs::system::System,
    view_state::ViewState,
    world::World,
};

pub struct RegionUpdateSystem;

impl RegionUpdateSystem {
    /// Starts collecting at a new zoom level. Every visible fragment at that level is waited
    /// for; those which are cached or known to be empty are ready right away. Fragments which
    /// are tracked nowhere are queued again.
    fn start_zoom(
        world: &mut World,
        view_state: &ViewState,
        emptiness: &dyn EmptinessChecker,
        zoom: ZoomLevel,
    ) {
        log::debug!("collecting fragments for zoom level {zoom}");
        world.pending.reset(zoom);

        let mut seeded = Vec::new();
        for region in world.regions.iter() {
            for quad in view_state.visible_quads() {
                if quad.zoom_level() != zoom || emptiness.is_empty(region.bbox(), quad) {
                    continue;
                }
                seeded.push(FragmentKey::new(region.id().clone(), *quad));
            }
        }

        for key in seeded {
            let arrived = world.cached.contains(&key) || world.empty.contains(&key);
            if !arrived && !world.queue.contains(&key) && !world.streaming.contains(&key) {
                world.queue.enqueue(key.clone());
            }

            let pending = world.pending.get_or_default(&key.region_id);
            pending.add_waiting(key.clone());
            if arrived {
                pending.mark_ready(&key);
            }
        }
    }
}

impl System for RegionUpdateSystem {
    fn name(&self) -> Cow<'static, str> {
        "region_update".into()
    }

    #[tracing::instrument(name = "region_update", skip_all)]
    fn run(
        &mut self,
        MapContext {
            world,
            view_state,
            emptiness,
            ..
        }: &mut MapContext,
    ) {
        world.ready_regions.clear();

        let level = view_state.zoom_level();
        if view_state.is_integer_zoom() && world.pending.zoom() != Some(level) {
            Self::start_zoom(world, view_state, &**emptiness, level);
        }

        let Some(zoom) = world.pending.zoom() else {
            return;
        };
        let at_zoom = |key: &&FragmentKey| key.zoom() == zoom;

        let World {
            regions,
            pending,
            cached,
            changes,
            emitted,
            ready_regions,
            ..
        } = world;

        for key in changes
            .requested
            .iter()
            .chain(changes.known_empty.iter())
            .filter(at_zoom)
        {
            if regions.contains(&key.region_id) {
                pending.get_or_default(&key.region_id).add_waiting(key.clone());
            }
        }

        for key in changes.obsolete.iter().filter(at_zoom) {
            if let Some(fragments) = pending.get_mut(&key.region_id) {
                fragments.remove(key);
            }
        }

        for key in emitted.iter().filter(at_zoom) {
            if let Some(fragments) = pending.get_mut(&key.region_id) {
                fragments.mark_ready(key);
            }
        }

        for (region_id, ready) in pending.take_done() {
            let Some(region) = regions.get_mut(&region_id) else {
                continue;
            };
            let displayed: BTreeSet<FragmentKey> = ready
                .into_iter()
                .filter(|key| cached.contains(key))
                .collect();
            log::info!(
                "region {region_id} is ready, displaying {} fragments",
                displayed.len()
            );
            region.replace_displayed(displayed);
            ready_regions.push(region_id);
        }
    }
}
