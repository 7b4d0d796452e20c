//! Admits wanted fragments to the download queue and collects finished downloads.

use std::borrow::Cow;

use crate::{
    context::MapContext,
    fragment::FragmentKey,
    io::inbox::{FetchOutcome, FragmentInbox},
    tcs::system::System,
    view_state::ViewState,
    world::World,
};

pub struct DownloadSystem {
    inbox: FragmentInbox,
}

impl DownloadSystem {
    pub fn new(inbox: FragmentInbox) -> Self {
        Self { inbox }
    }
}

/// Queues `key` unless it is tracked somewhere already.
fn admit(world: &mut World, key: &FragmentKey) -> bool {
    if world.queue.contains(key)
        || world.streaming.contains(key)
        || world.cached.contains(key)
        || world.empty.contains(key)
    {
        return false;
    }
    world.queue.enqueue(key.clone())
}

impl System for DownloadSystem {
    fn name(&self) -> Cow<'static, str> {
        "fragment_download".into()
    }

    #[tracing::instrument(name = "fragment_download", skip_all)]
    fn run(
        &mut self,
        MapContext {
            world, view_state, ..
        }: &mut MapContext,
    ) {
        let obsolete = std::mem::take(&mut world.changes.obsolete);
        for key in &obsolete {
            world.queue.remove(key);
        }
        world.changes.obsolete = obsolete;

        let requested = std::mem::take(&mut world.changes.requested);
        for key in &requested {
            admit(world, key);
        }
        world.changes.requested = requested;

        world.downloaded.clear();
        for outcome in self.inbox.drain() {
            match outcome {
                FetchOutcome::Received(fragments) => {
                    for (key, geometry) in fragments {
                        if world.streaming.is_downloading(&key) {
                            world.downloaded.insert(key, geometry);
                        } else {
                            log::debug!("dropping unexpected response for {key}");
                        }
                    }
                }
                FetchOutcome::Failed(keys) => {
                    log::warn!("download of {} fragments failed", keys.len());
                    for key in keys {
                        requeue_failed(world, view_state, key);
                    }
                }
            }
        }
    }
}

fn requeue_failed(world: &mut World, view_state: &ViewState, key: FragmentKey) {
    if !world.streaming.is_downloading(&key) {
        return;
    }
    world.streaming.release(&key);

    if view_state.is_visible(&key.quad) && world.regions.contains(&key.region_id) {
        admit(world, &key);
    }
}
