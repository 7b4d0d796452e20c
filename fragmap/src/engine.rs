//! The entry point for hosts: register regions, push the view state and tick once per frame.

use std::{rc::Rc, sync::Arc};

use crate::{
    context::MapContext,
    coords::Zoom,
    environment::Environment,
    error::Error,
    fragment::{
        cache::DisposeHook,
        emptiness::{BoundingBoxEmptinessChecker, EmptinessChecker},
        RegionId, RenderableFragment,
    },
    io::inbox::FragmentInbox,
    kernel::{Kernel, KernelBuilder},
    projection::{MapProjection, MercatorProjection},
    region::Region,
    schedule::Schedule,
    settings::FragmentSettings,
    systems::register_systems,
    view_state::ViewState,
    world::{Diagnostics, World},
};

/// Called once for every region whenever it becomes ready.
pub type RegionReadyListener = Box<dyn FnMut(&RegionId)>;

/// Streams and caches the fragments of regions for the visible part of the map.
///
/// The engine is single threaded: [`FragmentEngine::tick`] never waits for I/O. Requests run on
/// the [`Scheduler`](crate::io::scheduler::Scheduler) of the environment and hand their
/// results back through an inbox which is drained on the next tick.
pub struct FragmentEngine<E: Environment> {
    context: MapContext,
    schedule: Schedule,
    kernel: Rc<Kernel<E>>,
    on_region_ready: Option<RegionReadyListener>,
}

impl<E: Environment> FragmentEngine<E> {
    /// Registers `region`. A region with the same id is removed first.
    pub fn add_region(&mut self, region: Region) {
        if self.context.world.regions.contains(region.id()) {
            self.remove_region(&region.id().clone());
        }
        log::info!("added region {}", region.id());
        self.context.world.regions.insert(region);
    }

    /// Removes a region and disposes the fragments it owned.
    pub fn remove_region(&mut self, id: &RegionId) -> Option<Region> {
        self.context.world.remove_region(id)
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.context.world.regions.get(id)
    }

    pub fn view_state(&self) -> &ViewState {
        &self.context.view_state
    }

    pub fn view_state_mut(&mut self) -> &mut ViewState {
        &mut self.context.view_state
    }

    pub fn settings(&self) -> &FragmentSettings {
        &self.context.settings
    }

    pub fn kernel(&self) -> &Rc<Kernel<E>> {
        &self.kernel
    }

    pub fn world(&self) -> &World {
        &self.context.world
    }

    /// Runs all systems once.
    #[tracing::instrument(name = "tick", skip_all)]
    pub fn tick(&mut self) {
        self.schedule.run_once(&mut self.context);

        if let Some(listener) = self.on_region_ready.as_mut() {
            for region_id in &self.context.world.ready_regions {
                listener(region_id);
            }
        }
    }

    /// The fragments the renderer should draw for a region.
    pub fn displayed_fragments(&self, id: &RegionId) -> Vec<&RenderableFragment> {
        let world = &self.context.world;
        world.regions.get(id).map_or_else(Vec::new, |region| {
            region
                .displayed()
                .iter()
                .filter_map(|key| world.cached.get(key))
                .collect()
        })
    }

    /// Regions which became ready during the last tick.
    pub fn ready_regions(&self) -> &[RegionId] {
        &self.context.world.ready_regions
    }

    pub fn on_region_ready(&mut self, listener: impl FnMut(&RegionId) + 'static) {
        self.on_region_ready = Some(Box::new(listener));
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.context.world.diagnostics()
    }

    /// Labels of the stages a tick runs through, in order.
    pub fn stage_labels(&self) -> Vec<&'static str> {
        self.schedule.stage_labels().collect()
    }
}

/// A convenient builder for [`FragmentEngine`]s.
pub struct FragmentEngineBuilder<E: Environment> {
    kernel_builder: KernelBuilder<E>,
    settings: FragmentSettings,
    projection: Arc<dyn MapProjection>,
    emptiness: Box<dyn EmptinessChecker>,
    initial_zoom: Zoom,
    dispose_hook: Option<DisposeHook>,
}

impl<E: Environment> Default for FragmentEngineBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> FragmentEngineBuilder<E> {
    pub fn new() -> Self {
        Self {
            kernel_builder: KernelBuilder::new(),
            settings: FragmentSettings::default(),
            projection: Arc::new(MercatorProjection),
            emptiness: Box::new(BoundingBoxEmptinessChecker),
            initial_zoom: Zoom::default(),
            dispose_hook: None,
        }
    }

    pub fn with_settings(mut self, settings: FragmentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_scheduler(mut self, scheduler: E::Scheduler) -> Self {
        self.kernel_builder = self.kernel_builder.with_scheduler(scheduler);
        self
    }

    pub fn with_geometry_client(mut self, geometry_client: E::GeometryClient) -> Self {
        self.kernel_builder = self.kernel_builder.with_geometry_client(geometry_client);
        self
    }

    pub fn with_projection(mut self, projection: impl MapProjection) -> Self {
        self.projection = Arc::new(projection);
        self
    }

    pub fn with_emptiness_checker(mut self, emptiness: impl EmptinessChecker + 'static) -> Self {
        self.emptiness = Box::new(emptiness);
        self
    }

    pub fn with_initial_zoom(mut self, zoom: Zoom) -> Self {
        self.initial_zoom = zoom;
        self
    }

    /// Called with every fragment which is evicted or disposed together with its region.
    pub fn with_dispose_hook(
        mut self,
        hook: impl FnMut(&RenderableFragment) + 'static,
    ) -> Self {
        self.dispose_hook = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Result<FragmentEngine<E>, Error> {
        self.settings.validate()?;
        let kernel = Rc::new(self.kernel_builder.build()?);

        let mut world = World::new(&self.settings)?;
        if let Some(hook) = self.dispose_hook {
            world.cached.set_dispose_hook(hook);
        }

        let mut schedule = Schedule::default();
        register_systems(&mut schedule, &kernel, FragmentInbox::new());

        log::debug!("built fragment engine with {:?}", self.settings);
        Ok(FragmentEngine {
            context: MapContext {
                world,
                view_state: ViewState::new(self.initial_zoom),
                settings: self.settings,
                projection: self.projection,
                emptiness: self.emptiness,
            },
            schedule,
            kernel,
            on_region_ready: None,
        })
    }
}
