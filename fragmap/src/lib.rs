//! # fragmap
//!
//! Streams the geometry of map regions (countries, districts, ...) tile by tile. The map is
//! subdivided into quads; the part of a region within one quad is a fragment. For the visible
//! quads the engine decides which fragments have to be fetched, fetches them with bounded
//! concurrency, projects their geometry in small slices per frame, caches the results and
//! evicts them under pressure. A region is reported ready only once every fragment it needs
//! at the current zoom level arrived, so it never renders half loaded.
//!
//! ```no_run
//! # use fragmap::{coords::{Quadkey, Zoom}, engine::FragmentEngineBuilder};
//! # use fragmap::{platform::{TokioEnvironment, TokioScheduler}, region::Region};
//! # use fragmap::io::source_client::GeometryClient;
//! # fn run<GC: GeometryClient>(client: GC) -> Result<(), fragmap::error::Error> {
//! let mut engine = FragmentEngineBuilder::<TokioEnvironment<GC>>::new()
//!     .with_scheduler(TokioScheduler::new())
//!     .with_geometry_client(client)
//!     .build()?;
//!
//! engine.add_region(Region::new("DE"));
//! engine.view_state_mut().update_zoom(Zoom::new(3.0));
//! engine.view_state_mut().set_visible_quads(["120".parse::<Quadkey>().unwrap()]);
//! engine.tick();
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod coords;
pub mod engine;
pub mod environment;
pub mod error;
pub mod fragment;
pub mod io;
pub mod kernel;
pub mod multitasking;
pub mod platform;
pub mod projection;
pub mod region;
pub mod schedule;
pub mod settings;
pub mod systems;
pub mod tcs;
pub mod util;
pub mod view_state;
pub mod world;
