//! Requests queued fragments at the current zoom level

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use crate::{
    context::MapContext,
    coords::Quadkey,
    environment::Environment,
    fragment::{FragmentKey, RegionId},
    io::{
        inbox::{FetchOutcome, FragmentInbox},
        scheduler::Scheduler,
        FragmentRequest,
    },
    kernel::Kernel,
    tcs::system::System,
};

pub struct RequestSystem<E: Environment> {
    kernel: Rc<Kernel<E>>,
    inbox: FragmentInbox,
}

impl<E: Environment> RequestSystem<E> {
    pub fn new(kernel: &Rc<Kernel<E>>, inbox: FragmentInbox) -> Self {
        Self {
            kernel: kernel.clone(),
            inbox,
        }
    }

    fn dispatch(&self, request: FragmentRequest) -> Result<(), Vec<FragmentKey>> {
        let keys = request_keys(&request);
        let client = self.kernel.source_client().clone();
        let inbox = self.inbox.clone();

        log::info!("fragment request started: {request:?}");
        self.kernel
            .scheduler()
            .schedule(move || async move {
                match client.fetch(&request).await {
                    Ok(fragments) => inbox.push(FetchOutcome::Received(fragments)),
                    Err(e) => {
                        log::error!("{e:?}");
                        inbox.push(FetchOutcome::Failed(request_keys(&request)))
                    }
                }
            })
            .map_err(|e| {
                log::error!("failed to schedule fragment request: {e}");
                keys
            })
    }
}

fn request_keys(request: &FragmentRequest) -> Vec<FragmentKey> {
    request
        .quads
        .iter()
        .map(|quad| FragmentKey::new(request.region_id.clone(), *quad))
        .collect()
}

impl<E: Environment> System for RequestSystem<E> {
    fn name(&self) -> Cow<'static, str> {
        "fragment_request".into()
    }

    #[tracing::instrument(name = "fragment_request", skip_all)]
    fn run(
        &mut self,
        MapContext {
            world,
            view_state,
            settings,
            ..
        }: &mut MapContext,
    ) {
        let zoom = view_state.zoom_level();
        let mut batches: BTreeMap<RegionId, BTreeSet<Quadkey>> = BTreeMap::new();

        while world.streaming.len() < settings.max_concurrent_downloads {
            let Some(key) = world.queue.pop(zoom) else {
                break;
            };
            world.streaming.start_download(key.clone());
            batches.entry(key.region_id).or_default().insert(key.quad);
        }

        for (region_id, quads) in batches {
            let request = FragmentRequest { region_id, quads };
            if let Err(keys) = self.dispatch(request) {
                // Nothing runs for these keys, so they go back to the queue.
                for key in keys {
                    world.streaming.release(&key);
                    world.queue.enqueue(key);
                }
            }
        }
    }
}
