//! Module which is used target platform is not web related.

use std::{
    future::Future,
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{environment::Environment, io::source_client::GeometryClient};

pub mod scheduler;

pub use scheduler::TokioScheduler;

/// Runs `future` on a fresh multi-threaded tokio runtime.
pub fn run_multithreaded<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .thread_name_fn(|| {
            static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
            format!("fragmap-pool-{id}")
        })
        .on_thread_start(|| log::info!("Worker thread started"))
        .build()?;
    Ok(runtime.block_on(future))
}

/// Spawns fetch tasks on tokio and fetches through `GC`.
pub struct TokioEnvironment<GC> {
    phantom_gc: PhantomData<GC>,
}

impl<GC: GeometryClient> Environment for TokioEnvironment<GC> {
    type Scheduler = TokioScheduler;
    type GeometryClient = GC;
}
