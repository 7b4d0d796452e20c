use std::future::Future;

use crate::io::scheduler::{ScheduleError, Scheduler};

/// Multi-threading with Tokio.
///
/// Tasks are spawned on the runtime the caller is running in, so ticks have to happen inside
/// a runtime context.
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self {}
    }
}

impl Scheduler for TokioScheduler {
    fn schedule<T>(
        &self,
        future_factory: impl FnOnce() -> T + Send + 'static,
    ) -> Result<(), ScheduleError>
    where
        T: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| ScheduleError::Scheduling(Box::new(e)))?;
        handle.spawn((future_factory)());
        Ok(())
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use crate::{
        io::scheduler::{ScheduleError, Scheduler},
        platform::TokioScheduler,
    };

    #[test]
    fn test_requires_runtime() {
        let result = TokioScheduler::new().schedule(|| async {});
        assert!(matches!(result, Err(ScheduleError::Scheduling(_))));
    }

    #[tokio::test]
    async fn test_spawns_on_runtime() {
        let ran = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = tokio::sync::oneshot::channel();

        let flag = ran.clone();
        TokioScheduler::new()
            .schedule(move || async move {
                flag.store(true, Ordering::SeqCst);
                let _ = sender.send(());
            })
            .unwrap();

        receiver.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
