//! Computes which fragments became wanted or obsolete since the last tick.

use std::borrow::Cow;

use crate::{
    context::MapContext,
    fragment::{changes::ChangedFragments, FragmentKey},
    tcs::system::System,
    world::World,
};

pub struct ViewportDiffSystem;

impl System for ViewportDiffSystem {
    fn name(&self) -> Cow<'static, str> {
        "viewport_diff".into()
    }

    #[tracing::instrument(name = "viewport_diff", skip_all)]
    fn run(
        &mut self,
        MapContext {
            world,
            view_state,
            emptiness,
            ..
        }: &mut MapContext,
    ) {
        let World {
            regions,
            empty,
            changes,
            ..
        } = world;
        changes.clear();

        if view_state.did_zoom_change() {
            log::debug!("camera zoom changed to {}", view_state.zoom());
        }

        let added = regions.take_added();
        for region in regions.iter() {
            let id = region.id();
            let is_new = added.contains(id);
            let visible: Vec<_> = if is_new {
                view_state.visible_quads().iter().collect()
            } else {
                view_state.newly_visible().collect()
            };

            for quad in visible {
                let key = FragmentKey::new(id.clone(), *quad);
                if empty.contains(&key) {
                    changes.known_empty.insert(key);
                } else if !emptiness.is_empty(region.bbox(), quad) {
                    changes.requested.insert(key);
                }
            }

            if is_new {
                continue;
            }

            for quad in view_state.newly_hidden() {
                let key = FragmentKey::new(id.clone(), *quad);
                if !empty.contains(&key) {
                    changes.obsolete.insert(key);
                }
            }
        }

        if changes.is_changed() {
            log_changes(changes);
        }

        view_state.update_references();
    }
}

fn log_changes(changes: &ChangedFragments) {
    log::debug!(
        "viewport diff: {} requested, {} obsolete, {} known empty",
        changes.requested.len(),
        changes.obsolete.len(),
        changes.known_empty.len()
    );
}
