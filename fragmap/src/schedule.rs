use crate::context::MapContext;

pub struct NopStage;

impl Stage for NopStage {
    fn run(&mut self, _context: &mut MapContext) {}
}

pub trait Stage: 'static {
    /// Runs the stage; this happens once per tick.
    /// Implementors must initialize all of their state before running the first time.
    fn run(&mut self, context: &mut MapContext);
}

/// A container of [`Stage`]s set to be run in a linear order.
#[derive(Default)]
pub struct Schedule {
    stages: Vec<(&'static str, Box<dyn Stage>)>,
}

impl Schedule {
    /// Adds the given `stage` at the last position of the schedule.
    ///
    /// # Example
    ///
    /// ```
    /// # use fragmap::schedule::{Schedule, NopStage};
    /// #
    /// # let mut schedule = Schedule::default();
    /// schedule.add_stage("my_stage", NopStage);
    /// ```
    pub fn add_stage<S: Stage>(&mut self, label: &'static str, stage: S) -> &mut Self {
        assert!(
            !self.stages.iter().any(|(existing, _)| *existing == label),
            "Stage already exists: {label:?}."
        );
        self.stages.push((label, Box::new(stage)));
        self
    }

    pub fn stage_labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|(label, _)| *label)
    }

    /// Executes each [`Stage`] contained in the schedule, one at a time.
    pub fn run_once(&mut self, context: &mut MapContext) {
        for (label, stage) in self.stages.iter_mut() {
            #[cfg(feature = "trace")]
            let _stage_span = tracing::info_span!("stage", name = *label).entered();
            log::trace!("running stage {label}");
            stage.run(context);
        }
    }
}

impl Stage for Schedule {
    fn run(&mut self, context: &mut MapContext) {
        self.run_once(context)
    }
}
