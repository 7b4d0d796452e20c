//! Cooperative multitasking within the tick. Long running work is split into resumable
//! steps which are driven a few at a time, so a single frame never stalls on it.

use std::time::Duration;

use instant::Instant;

/// A task which makes progress one step per [`MicroTask::resume`] call. The task keeps its
/// own cursor between calls.
pub trait MicroTask {
    type Output;

    /// Performs a single step. Calling it on a task which is no longer alive does nothing.
    fn resume(&mut self);

    fn alive(&self) -> bool;

    /// Hands out the result once the task finished. Returns `None` while the task is alive
    /// and after the result has been taken.
    fn take_result(&mut self) -> Option<Self::Output>;
}

/// Resumes `task` at most `quant` times. Returns the number of steps performed.
pub fn run_quant<T: MicroTask + ?Sized>(task: &mut T, quant: usize) -> usize {
    let mut steps = 0;
    while steps < quant && task.alive() {
        task.resume();
        steps += 1;
    }
    steps
}

/// Limits the time spent on micro tasks during one tick.
pub struct TimeBudget {
    started: Instant,
    budget: Duration,
}

impl TimeBudget {
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn exceeded(&self) -> bool {
        self.started.elapsed() >= self.budget
    }
}
