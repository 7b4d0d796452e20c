use std::{
    collections::{hash_map::DefaultHasher, BTreeSet},
    hash::{Hash, Hasher},
    io,
    path::PathBuf,
    time::Duration,
};

use async_trait::async_trait;
use clap::Parser;
use fragmap::{
    coords::{Quadkey, Zoom},
    engine::{FragmentEngine, FragmentEngineBuilder},
    fragment::RegionId,
    io::source_client::{GeometryClient, RegionGeometries, SourceFetchError},
    platform::{run_multithreaded, TokioEnvironment, TokioScheduler},
    region::Region,
    settings::FragmentSettings,
};
use geo_types::{coord, Coord, LineString, MultiPolygon, Polygon, Rect};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file with engine settings
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Overrides `max_concurrent_downloads` of the settings
    #[arg(long)]
    max_downloads: Option<usize>,
    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Seed of the simulated server
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Share of requests which fail
    #[arg(long, default_value_t = 0.05)]
    failure_rate: f64,
}

/// Pretends to be a geometry server. Answers after a random delay, leaves some quads out and
/// sometimes fails entirely.
#[derive(Clone)]
struct SimulatedClient {
    seed: u64,
    failure_rate: f64,
}

impl SimulatedClient {
    fn rng_for(&self, region_ids: &[RegionId], quads: &BTreeSet<Quadkey>) -> StdRng {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        for region_id in region_ids {
            region_id.as_str().hash(&mut hasher);
        }
        quads.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }
}

/// A jagged ring around the center of `rect`.
fn blob(rect: &Rect<f64>, rng: &mut impl Rng) -> Polygon<f64> {
    let center = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    let corners = rng.gen_range(5..12);

    let mut points: Vec<Coord<f64>> = (0..corners)
        .map(|i| {
            let angle = i as f64 / corners as f64 * std::f64::consts::TAU;
            let radius = rng.gen_range(0.3..1.0);
            coord! {
                x: center.x + angle.cos() * rx * radius,
                y: center.y + angle.sin() * ry * radius,
            }
        })
        .collect();
    points.push(points[0]);
    Polygon::new(LineString::new(points), vec![])
}

#[async_trait]
impl GeometryClient for SimulatedClient {
    async fn fetch(
        &self,
        region_ids: &[RegionId],
        quads: &BTreeSet<Quadkey>,
    ) -> Result<RegionGeometries, SourceFetchError> {
        let (delay, failed, response) = {
            let mut rng = self.rng_for(region_ids, quads);
            let delay = Duration::from_millis(rng.gen_range(20..250));
            let failed = rng.gen_bool(self.failure_rate);

            let mut response = RegionGeometries::new();
            for region_id in region_ids {
                for quad in quads {
                    if rng.gen_bool(0.3) {
                        continue;
                    }
                    let geometry = MultiPolygon::new(vec![blob(&quad.lon_lat_rect(), &mut rng)]);
                    response
                        .entry(region_id.clone())
                        .or_default()
                        .push((*quad, geometry));
                }
            }
            (delay, failed, response)
        };

        tokio::time::sleep(delay).await;
        if failed {
            return Err(SourceFetchError(Box::new(io::Error::new(
                io::ErrorKind::TimedOut,
                "simulated timeout",
            ))));
        }
        Ok(response)
    }
}

/// Position of the simulated camera for a frame: a slow pan across Europe while zooming in
/// and out between levels 3 and 6.
fn camera(frame: u32) -> (Zoom, Rect<f64>) {
    let t = frame as f64;
    let step = (t / 120.0) as u32 % 6;
    let level = 3 + if step < 4 { step } else { 6 - step };
    // The first frames of every step pass fractional zooms.
    let phase = (t % 120.0) / 10.0;
    let zoom = if phase < 1.0 {
        Zoom::new(level as f64 - 1.0 + phase)
    } else {
        Zoom::new(level as f64)
    };

    let center = coord! { x: -5.0 + (t / 20.0) % 35.0, y: 42.0 + (t / 60.0) % 12.0 };
    let extent = 360.0 / 2.0_f64.powf(zoom.value());
    let rect = Rect::new(
        coord! { x: center.x - extent / 2.0, y: center.y - extent / 4.0 },
        coord! { x: center.x + extent / 2.0, y: center.y + extent / 4.0 },
    );
    (zoom, rect)
}

fn regions() -> Vec<Region> {
    vec![
        Region::new("FR").with_bbox(Rect::new(
            coord! { x: -5.2, y: 41.3 },
            coord! { x: 9.6, y: 51.1 },
        )),
        Region::new("DE").with_bbox(Rect::new(
            coord! { x: 5.8, y: 47.2 },
            coord! { x: 15.1, y: 55.1 },
        )),
        Region::new("ES").with_bbox(Rect::new(
            coord! { x: -9.4, y: 35.9 },
            coord! { x: 3.4, y: 43.8 },
        )),
        Region::new("IT").with_bbox(Rect::new(
            coord! { x: 6.6, y: 36.6 },
            coord! { x: 18.6, y: 47.1 },
        )),
    ]
}

fn load_settings(args: &Args) -> Result<FragmentSettings, fragmap::settings::SettingsError> {
    let mut settings = match &args.settings {
        Some(path) => FragmentSettings::from_file(path)?,
        None => FragmentSettings::default(),
    };
    if let Some(max_downloads) = args.max_downloads {
        settings.max_concurrent_downloads = max_downloads;
    }
    Ok(settings)
}

async fn simulate(
    mut engine: FragmentEngine<TokioEnvironment<SimulatedClient>>,
    ticks: u32,
) {
    for region in regions() {
        engine.add_region(region);
    }

    for frame in 0..ticks {
        let (zoom, rect) = camera(frame);
        let view_state = engine.view_state_mut();
        view_state.update_zoom(zoom);
        view_state.set_visible_quads(Quadkey::covering(&rect, zoom.level()));

        engine.tick();

        if frame % 60 == 0 {
            log::info!("frame {frame} at zoom {zoom}: {}", engine.diagnostics());
        }
        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    log::info!("finished: {}", engine.diagnostics());
}

#[cfg(feature = "trace")]
fn enable_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer());

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    #[cfg(feature = "trace")]
    enable_tracing();

    let args = Args::parse();
    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("invalid settings: {e}");
            std::process::exit(1);
        }
    };

    let client = SimulatedClient {
        seed: args.seed,
        failure_rate: args.failure_rate.clamp(0.0, 1.0),
    };
    let ready = |region_id: &RegionId| log::info!("region {region_id} is ready");

    let result = run_multithreaded(async move {
        let mut engine = FragmentEngineBuilder::<TokioEnvironment<SimulatedClient>>::new()
            .with_settings(settings)
            .with_scheduler(TokioScheduler::new())
            .with_geometry_client(client)
            .build()?;
        engine.on_region_ready(ready);
        simulate(engine, args.ticks).await;
        Ok::<_, fragmap::error::Error>(())
    });

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("engine failed: {e}"),
        Err(e) => log::error!("failed to start runtime: {e}"),
    }
}
