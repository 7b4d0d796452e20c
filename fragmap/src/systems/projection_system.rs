//! Drives the running fragment projections within the time budget of a tick.

use std::borrow::Cow;

use crate::{
    context::MapContext,
    multitasking::{run_quant, TimeBudget},
    tcs::system::System,
};

pub struct ProjectionSystem;

impl System for ProjectionSystem {
    fn name(&self) -> Cow<'static, str> {
        "fragment_projection".into()
    }

    #[tracing::instrument(name = "fragment_projection", skip_all)]
    fn run(
        &mut self,
        MapContext {
            world, settings, ..
        }: &mut MapContext,
    ) {
        let budget = TimeBudget::start(settings.projection_time_budget());
        for projection in world.streaming.projections_mut() {
            run_quant(projection, settings.projection_quant);
            if budget.exceeded() {
                break;
            }
        }
    }
}
