#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap, HashSet},
    future::Future,
    io,
    pin::Pin,
    rc::Rc,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use fragmap::{
    coords::{Quadkey, Zoom},
    engine::{FragmentEngine, FragmentEngineBuilder},
    environment::Environment,
    fragment::{emptiness::NeverEmpty, FragmentKey, RegionId},
    io::{
        scheduler::{ScheduleError, Scheduler},
        source_client::{GeometryClient, RegionGeometries, SourceFetchError},
    },
    projection::GeographicProjection,
    settings::FragmentSettings,
    world::World,
};
use geo_types::{coord, MultiPolygon, Rect};

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Collects scheduled tasks until the test decides to run them.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tasks: Arc<Mutex<Vec<Task>>>,
}

impl ManualScheduler {
    /// Runs every task scheduled so far to completion. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let count = tasks.len();
        for task in tasks {
            runtime.block_on(task);
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule<T>(
        &self,
        future_factory: impl FnOnce() -> T + Send + 'static,
    ) -> Result<(), ScheduleError>
    where
        T: Future<Output = ()> + Send + 'static,
    {
        self.tasks.lock().unwrap().push(Box::pin(future_factory()));
        Ok(())
    }
}

#[derive(Default)]
struct ServerState {
    geometries: HashMap<(RegionId, Quadkey), MultiPolygon<f64>>,
    failures: HashSet<Quadkey>,
    requests: Vec<(RegionId, BTreeSet<Quadkey>)>,
}

/// Serves geometry from memory. Quads without geometry are left out of responses.
#[derive(Clone, Default)]
pub struct InMemoryClient {
    state: Arc<Mutex<ServerState>>,
}

impl InMemoryClient {
    pub fn insert(&self, region: &str, quad: &str, geometry: MultiPolygon<f64>) {
        self.state
            .lock()
            .unwrap()
            .geometries
            .insert((region.into(), quad.parse().unwrap()), geometry);
    }

    /// Puts a square into each of the quads.
    pub fn insert_squares(&self, region: &str, quads: &[&str]) {
        for quad in quads {
            self.insert(region, quad, square_in(&quad.parse().unwrap()));
        }
    }

    /// The next request which contains `quad` fails.
    pub fn fail_once(&self, quad: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(quad.parse().unwrap());
    }

    pub fn requests(&self) -> Vec<(RegionId, BTreeSet<Quadkey>)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests which asked for `quad` of `region`.
    pub fn request_count(&self, region: &str, quad: &str) -> usize {
        let quad: Quadkey = quad.parse().unwrap();
        self.requests()
            .iter()
            .filter(|(id, quads)| id.as_str() == region && quads.contains(&quad))
            .count()
    }
}

#[async_trait]
impl GeometryClient for InMemoryClient {
    async fn fetch(
        &self,
        region_ids: &[RegionId],
        quads: &BTreeSet<Quadkey>,
    ) -> Result<RegionGeometries, SourceFetchError> {
        let mut state = self.state.lock().unwrap();
        for region_id in region_ids {
            state.requests.push((region_id.clone(), quads.clone()));
        }

        let failed = quads
            .iter()
            .filter(|quad| state.failures.remove(*quad))
            .count()
            > 0;
        if failed {
            return Err(SourceFetchError(Box::new(io::Error::new(
                io::ErrorKind::Other,
                "simulated failure",
            ))));
        }

        let mut response = RegionGeometries::new();
        for region_id in region_ids {
            for quad in quads {
                if let Some(geometry) = state.geometries.get(&(region_id.clone(), *quad)) {
                    response
                        .entry(region_id.clone())
                        .or_default()
                        .push((*quad, geometry.clone()));
                }
            }
        }
        Ok(response)
    }
}

pub struct TestEnvironment;

impl Environment for TestEnvironment {
    type Scheduler = ManualScheduler;
    type GeometryClient = InMemoryClient;
}

pub struct Harness {
    pub engine: FragmentEngine<TestEnvironment>,
    pub scheduler: ManualScheduler,
    pub client: InMemoryClient,
    /// Keys of every fragment the engine disposed.
    pub disposed: Rc<RefCell<Vec<FragmentKey>>>,
}

impl Harness {
    pub fn new(settings: FragmentSettings) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let scheduler = ManualScheduler::default();
        let client = InMemoryClient::default();
        let disposed = Rc::new(RefCell::new(Vec::new()));
        let sink = disposed.clone();
        let engine = FragmentEngineBuilder::<TestEnvironment>::new()
            .with_settings(FragmentSettings {
                projection_time_budget_ms: 10_000,
                ..settings
            })
            .with_scheduler(scheduler.clone())
            .with_geometry_client(client.clone())
            .with_projection(GeographicProjection)
            .with_emptiness_checker(NeverEmpty)
            .with_dispose_hook(move |fragment| sink.borrow_mut().push(fragment.key.clone()))
            .build()
            .unwrap();

        Self {
            engine,
            scheduler,
            client,
            disposed,
        }
    }

    pub fn show(&mut self, zoom: f64, quads: &[&str]) {
        let view_state = self.engine.view_state_mut();
        view_state.update_zoom(Zoom::new(zoom));
        view_state.set_visible_quads(quads.iter().map(|quad| quad.parse().unwrap()));
    }

    /// Ticks and then lets every scheduled request finish.
    pub fn step(&mut self) {
        self.engine.tick();
        assert_exclusive(self.engine.world());
        self.scheduler.run_pending();
    }

    /// Steps until nothing is queued or streaming anymore.
    pub fn settle(&mut self) {
        for _ in 0..50 {
            self.step();
            let world = self.engine.world();
            if world.queue.is_empty() && world.streaming.is_empty() {
                return;
            }
        }
        panic!("engine did not settle");
    }

    pub fn displayed(&self, region: &str) -> Vec<String> {
        self.engine
            .displayed_fragments(&region.into())
            .iter()
            .map(|fragment| fragment.key.quad.to_string())
            .collect()
    }
}

pub fn key(region: &str, quad: &str) -> FragmentKey {
    FragmentKey::parse(region, quad).unwrap()
}

pub fn square_in(quad: &Quadkey) -> MultiPolygon<f64> {
    let rect = quad.lon_lat_rect();
    let center = rect.center();
    let (dx, dy) = (rect.width() / 4.0, rect.height() / 4.0);
    MultiPolygon::new(vec![Rect::new(
        coord! { x: center.x - dx, y: center.y - dy },
        coord! { x: center.x + dx, y: center.y + dy },
    )
    .to_polygon()])
}

/// A key is in at most one of queue, in-flight set, cache and empty memo.
pub fn assert_exclusive(world: &World) {
    let mut keys: BTreeSet<FragmentKey> = world.streaming.keys().cloned().collect();
    keys.extend(world.cached.keys_by_age().cloned());

    for key in &keys {
        let places = [
            world.queue.contains(key),
            world.streaming.contains(key),
            world.cached.contains(key),
            world.empty.peek(key),
        ];
        let count = places.iter().filter(|place| **place).count();
        assert!(count <= 1, "{key} is tracked {count} times: {places:?}");
    }
}
