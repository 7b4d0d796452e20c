//! Evicts cached fragments nobody needs once the cache grows beyond its budget.

use std::borrow::Cow;

use crate::{
    context::MapContext, fragment::FragmentKey, tcs::system::System, world::World,
};

pub struct FragmentsRemovingSystem;

impl System for FragmentsRemovingSystem {
    fn name(&self) -> Cow<'static, str> {
        "fragments_removing".into()
    }

    #[tracing::instrument(name = "fragments_removing", skip_all)]
    fn run(
        &mut self,
        MapContext {
            world:
                World {
                    regions,
                    streaming,
                    cached,
                    changes,
                    ..
                },
            view_state,
            settings,
            ..
        }: &mut MapContext,
    ) {
        if !changes.is_changed() {
            return;
        }

        let streaming_zooms = streaming.zooms();
        let candidates: Vec<FragmentKey> = cached
            .keys_by_age()
            .filter(|key| {
                !changes.requested.contains(key)
                    && !regions.is_displayed(key)
                    && !streaming_zooms.contains(&key.zoom())
                    && !view_state.is_visible(&key.quad)
            })
            .cloned()
            .collect();

        if candidates.len() <= settings.cache_size_budget {
            return;
        }

        let excess = candidates.len() - settings.cache_size_budget;
        for key in &candidates[..excess] {
            cached.dispose(key);
        }
        log::debug!("evicted {excess} cached fragments");
    }
}
