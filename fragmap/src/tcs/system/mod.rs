use std::borrow::Cow;

use crate::context::MapContext;

pub mod stage;

/// One step of a tick. Systems are grouped into a [`SystemStage`](stage::SystemStage) and run
/// in the order they were added.
pub trait System: 'static {
    /// Name used in logs and trace spans.
    fn name(&self) -> Cow<'static, str>;

    fn run(&mut self, context: &mut MapContext);
}

pub type BoxedSystem = Box<dyn System>;
