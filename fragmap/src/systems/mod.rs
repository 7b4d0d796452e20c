//! The systems which make up one tick, in the order they run:
//!
//! 1. [`ViewportDiffSystem`] turns the change of visible quads into requested and obsolete
//!    fragments.
//! 2. [`DownloadSystem`] admits requested fragments to the queue and drains the inbox.
//! 3. [`FragmentEmitSystem`] consumes downloaded geometry and commits finished projections.
//! 4. [`RequestSystem`] dispatches queued fragments while the in-flight set has room.
//! 5. [`RegionUpdateSystem`] swaps the displayed fragments of regions which became ready.
//! 6. [`FragmentsRemovingSystem`] evicts unneeded cached fragments.
//! 7. [`ProjectionSystem`] advances running projections.

use std::rc::Rc;

use crate::{
    environment::Environment,
    io::inbox::FragmentInbox,
    kernel::Kernel,
    schedule::Schedule,
    systems::{
        download_system::DownloadSystem, emit_system::FragmentEmitSystem,
        projection_system::ProjectionSystem, region_update_system::RegionUpdateSystem,
        removing_system::FragmentsRemovingSystem, request_system::RequestSystem,
        viewport_diff_system::ViewportDiffSystem,
    },
    tcs::system::stage::SystemStage,
};

pub mod download_system;
pub mod emit_system;
pub mod projection_system;
pub mod region_update_system;
pub mod removing_system;
pub mod request_system;
pub mod viewport_diff_system;

pub fn register_systems<E: Environment>(
    schedule: &mut Schedule,
    kernel: &Rc<Kernel<E>>,
    inbox: FragmentInbox,
) {
    schedule.add_stage(
        "update",
        SystemStage::default()
            .with_system(ViewportDiffSystem)
            .with_system(DownloadSystem::new(inbox.clone())),
    );
    schedule.add_stage(
        "emit",
        SystemStage::default()
            .with_system(FragmentEmitSystem)
            .with_system(RequestSystem::new(kernel, inbox)),
    );
    schedule.add_stage(
        "regions",
        SystemStage::default()
            .with_system(RegionUpdateSystem)
            .with_system(FragmentsRemovingSystem),
    );
    schedule.add_stage(
        "projection",
        SystemStage::default().with_system(ProjectionSystem),
    );
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use crate::{
        coords::{Quadkey, Zoom},
        engine::FragmentEngineBuilder,
        environment::Environment,
        fragment::{emptiness::NeverEmpty, FragmentKey, RegionId},
        io::{
            scheduler::NopScheduler,
            source_client::{GeometryClient, RegionGeometries, SourceFetchError},
        },
        region::Region,
    };

    #[derive(Clone)]
    struct SilentClient;

    #[async_trait]
    impl GeometryClient for SilentClient {
        async fn fetch(
            &self,
            _region_ids: &[RegionId],
            _quads: &BTreeSet<Quadkey>,
        ) -> Result<RegionGeometries, SourceFetchError> {
            Ok(RegionGeometries::new())
        }
    }

    struct NopEnvironment;

    impl Environment for NopEnvironment {
        type Scheduler = NopScheduler;
        type GeometryClient = SilentClient;
    }

    #[test]
    fn test_unscheduled_requests_stay_queued() {
        let mut engine = FragmentEngineBuilder::<NopEnvironment>::new()
            .with_scheduler(NopScheduler)
            .with_geometry_client(SilentClient)
            .with_emptiness_checker(NeverEmpty)
            .build()
            .unwrap();

        engine.add_region(Region::new("r"));
        engine.view_state_mut().update_zoom(Zoom::new(1.0));
        engine
            .view_state_mut()
            .set_visible_quads(["0".parse::<Quadkey>().unwrap()]);
        engine.tick();
        engine.tick();

        let key = FragmentKey::parse("r", "0").unwrap();
        assert!(engine.world().queue.contains(&key));
        assert!(engine.world().streaming.is_empty());
    }

    #[test]
    fn test_stage_order() {
        let engine = FragmentEngineBuilder::<NopEnvironment>::new()
            .with_scheduler(NopScheduler)
            .with_geometry_client(SilentClient)
            .build()
            .unwrap();

        assert_eq!(
            engine.stage_labels(),
            vec!["update", "emit", "regions", "projection"]
        );
    }
}
