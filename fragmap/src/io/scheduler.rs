//! Scheduling.

use std::future::Future;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("scheduling work failed")]
    Scheduling(Box<dyn std::error::Error + Send + Sync>),
    #[error("scheduler is not implemented on this platform")]
    NotImplemented,
}

/// Async/await scheduler.
/// Can schedule a task from a future factory. Fetch tasks are spawned through it and must not
/// touch anything besides the [`FragmentInbox`](crate::io::inbox::FragmentInbox).
pub trait Scheduler: 'static {
    fn schedule<T>(
        &self,
        future_factory: impl (FnOnce() -> T) + Send + 'static,
    ) -> Result<(), ScheduleError>
    where
        T: Future<Output = ()> + Send + 'static;
}

pub struct NopScheduler;

impl Scheduler for NopScheduler {
    fn schedule<T>(
        &self,
        _future_factory: impl FnOnce() -> T + Send + 'static,
    ) -> Result<(), ScheduleError>
    where
        T: Future<Output = ()> + Send + 'static,
    {
        Err(ScheduleError::NotImplemented)
    }
}
