//! Turns the lon/lat geometry of a fragment into a [`RenderableFragment`].
//!
//! The work is split into [micro tasks](crate::multitasking::MicroTask) which process one
//! point per step:
//!
//! 1. [`BorderFilterTask`] extracts the outline of the region from the polygon rings and drops
//!    the runs which lie on the edge of the clip rectangle.
//! 2. [`ResampleTask`] moves polygons, border and clip path into screen space.

use std::{mem, sync::Arc};

use geo::BoundingRect;
use geo_types::{Coord, LineString, MultiLineString, MultiPolygon, Polygon, Rect};

use crate::{
    coords::inflate,
    fragment::{FragmentKey, LayerId, RenderableFragment},
    multitasking::MicroTask,
    projection::MapProjection,
};

/// The server clips fragment geometry to the quad inflated by this fraction on each side.
pub const CLIP_INFLATION: f64 = 1.0 / 8.0;

/// Maps lon/lat into the screen space of one fragment.
#[derive(Clone)]
pub struct FragmentTransform {
    projection: Arc<dyn MapProjection>,
    origin: Coord<f64>,
    scale: f64,
}

impl FragmentTransform {
    pub fn new(projection: Arc<dyn MapProjection>, origin: Coord<f64>, scale: f64) -> Self {
        Self {
            projection,
            origin,
            scale,
        }
    }

    pub fn apply(&self, lon_lat: Coord<f64>) -> Coord<f64> {
        (self.projection.project(lon_lat) - self.origin) * self.scale
    }
}

/// Collects the parts of polygon rings which do not lie on the edge of `clip`.
pub struct BorderFilterTask {
    rings: Vec<LineString<f64>>,
    clip: Rect<f64>,
    epsilon: f64,
    ring: usize,
    point: usize,
    current: Vec<Coord<f64>>,
    border: Vec<LineString<f64>>,
    finished: Option<MultiLineString<f64>>,
}

impl BorderFilterTask {
    pub fn new(rings: Vec<LineString<f64>>, clip: Rect<f64>) -> Self {
        let epsilon = clip.width().max(clip.height()) * 1e-9;
        let mut task = Self {
            rings,
            clip,
            epsilon,
            ring: 0,
            point: 0,
            current: Vec::new(),
            border: Vec::new(),
            finished: None,
        };
        task.finish_if_exhausted();
        task
    }

    /// Returns the rings the task was created with.
    pub fn into_rings(self) -> Vec<LineString<f64>> {
        self.rings
    }

    fn on_clip_edge(&self, a: Coord<f64>, b: Coord<f64>) -> bool {
        let near = |value: f64, edge: f64| (value - edge).abs() <= self.epsilon;
        let (min, max) = (self.clip.min(), self.clip.max());

        (near(a.x, min.x) && near(b.x, min.x))
            || (near(a.x, max.x) && near(b.x, max.x))
            || (near(a.y, min.y) && near(b.y, min.y))
            || (near(a.y, max.y) && near(b.y, max.y))
    }

    fn flush(&mut self) {
        let run = mem::take(&mut self.current);
        if run.len() >= 2 {
            self.border.push(LineString::new(run));
        }
    }

    fn finish_if_exhausted(&mut self) {
        if self.ring >= self.rings.len() && self.finished.is_none() {
            self.finished = Some(MultiLineString::new(mem::take(&mut self.border)));
        }
    }
}

impl MicroTask for BorderFilterTask {
    type Output = MultiLineString<f64>;

    fn resume(&mut self) {
        if !self.alive() {
            return;
        }

        let points = &self.rings[self.ring].0;
        if self.point + 1 >= points.len() {
            self.flush();
            self.ring += 1;
            self.point = 0;
            self.finish_if_exhausted();
            return;
        }

        let (a, b) = (points[self.point], points[self.point + 1]);
        if self.on_clip_edge(a, b) {
            self.flush();
        } else {
            if self.current.is_empty() {
                self.current.push(a);
            }
            self.current.push(b);
        }
        self.point += 1;
    }

    fn alive(&self) -> bool {
        self.ring < self.rings.len()
    }

    fn take_result(&mut self) -> Option<Self::Output> {
        self.finished.take()
    }
}

/// Applies a [`FragmentTransform`] to a list of line strings, one point per step.
pub struct ResampleTask {
    transform: FragmentTransform,
    source: Vec<LineString<f64>>,
    line: usize,
    point: usize,
    current: Vec<Coord<f64>>,
    result: Vec<LineString<f64>>,
    taken: bool,
}

impl ResampleTask {
    pub fn new(source: Vec<LineString<f64>>, transform: FragmentTransform) -> Self {
        Self {
            transform,
            result: Vec::with_capacity(source.len()),
            source,
            line: 0,
            point: 0,
            current: Vec::new(),
            taken: false,
        }
    }
}

impl MicroTask for ResampleTask {
    type Output = Vec<LineString<f64>>;

    fn resume(&mut self) {
        if !self.alive() {
            return;
        }

        let points = &self.source[self.line].0;
        if let Some(point) = points.get(self.point) {
            let transformed = self.transform.apply(*point);
            self.current.push(transformed);
            self.point += 1;
        } else {
            self.result.push(LineString::new(mem::take(&mut self.current)));
            self.line += 1;
            self.point = 0;
        }
    }

    fn alive(&self) -> bool {
        self.line < self.source.len()
    }

    fn take_result(&mut self) -> Option<Self::Output> {
        if self.alive() || self.taken {
            return None;
        }
        self.taken = true;
        Some(mem::take(&mut self.result))
    }
}

enum ProjectionStage {
    FilterBorder(BorderFilterTask),
    Resample {
        task: ResampleTask,
        border_lines: usize,
    },
    Finished,
}

/// The whole processing of one fragment. Polygons keep their ring structure through the
/// pipeline; it is recorded in `ring_counts` while the rings travel as one flat list.
///
/// Screen coordinates are relative to the world bounding box of the geometry. The clip path is
/// the quad itself; the inflated clip rectangle only serves the border filter.
pub struct FragmentProjection {
    key: FragmentKey,
    layer_id: LayerId,
    transform: FragmentTransform,
    quad_rect: Rect<f64>,
    origin: Coord<f64>,
    dimension: Coord<f64>,
    scale: f64,
    ring_counts: Vec<usize>,
    stage: ProjectionStage,
    result: Option<RenderableFragment>,
}

impl FragmentProjection {
    pub fn new(
        key: FragmentKey,
        geometry: MultiPolygon<f64>,
        layer_id: LayerId,
        projection: Arc<dyn MapProjection>,
    ) -> Self {
        let quad_rect = key.quad.lon_lat_rect();
        let clip = inflate(&quad_rect, CLIP_INFLATION);
        // Both projections are monotonic on each axis, so the projected bounding box of the
        // geometry is the bounding box of the projected geometry.
        let bounds = geometry.bounding_rect().unwrap_or(quad_rect);
        let world = projection.project_rect(&bounds);
        let scale = key.zoom().scale();
        let origin = world.min();
        let dimension = Coord {
            x: world.width(),
            y: world.height(),
        };

        let mut ring_counts = Vec::with_capacity(geometry.0.len());
        let mut rings = Vec::new();
        for polygon in geometry {
            let (exterior, interiors) = polygon.into_inner();
            ring_counts.push(1 + interiors.len());
            rings.push(exterior);
            rings.extend(interiors);
        }

        Self {
            key,
            layer_id,
            transform: FragmentTransform::new(projection, origin, scale),
            quad_rect,
            origin,
            dimension,
            scale,
            ring_counts,
            stage: ProjectionStage::FilterBorder(BorderFilterTask::new(rings, clip)),
            result: None,
        }
    }

    pub fn key(&self) -> &FragmentKey {
        &self.key
    }

    fn start_resample(&mut self, filter: BorderFilterTask, border: MultiLineString<f64>) {
        let border_lines = border.0.len();
        let mut source = filter.into_rings();
        source.extend(border);
        source.push(self.quad_rect.to_polygon().exterior().clone());

        self.stage = ProjectionStage::Resample {
            task: ResampleTask::new(source, self.transform.clone()),
            border_lines,
        };
    }

    fn assemble(&mut self, mut lines: Vec<LineString<f64>>, border_lines: usize) {
        let clip_ring = lines.pop().unwrap_or_else(|| LineString::new(vec![]));
        let border = lines.split_off(lines.len() - border_lines);

        let mut rings = lines.into_iter();
        let polygons = self
            .ring_counts
            .iter()
            .filter_map(|count| {
                let exterior = rings.next()?;
                let interiors = rings.by_ref().take(count - 1).collect();
                Some(Polygon::new(exterior, interiors))
            })
            .collect();

        self.result = Some(RenderableFragment {
            key: self.key.clone(),
            geometry: MultiPolygon::new(polygons),
            border: MultiLineString::new(border),
            clip_path: Polygon::new(clip_ring, vec![]),
            origin: self.origin,
            dimension: self.dimension,
            scale: self.scale,
            layer_id: self.layer_id,
        });
        self.stage = ProjectionStage::Finished;
    }
}

impl MicroTask for FragmentProjection {
    type Output = RenderableFragment;

    fn resume(&mut self) {
        match &mut self.stage {
            ProjectionStage::FilterBorder(task) => {
                task.resume();
                if task.alive() {
                    return;
                }
                let border = task
                    .take_result()
                    .unwrap_or_else(|| MultiLineString::new(vec![]));
                let ProjectionStage::FilterBorder(task) =
                    mem::replace(&mut self.stage, ProjectionStage::Finished)
                else {
                    unreachable!()
                };
                self.start_resample(task, border);
            }
            ProjectionStage::Resample { task, border_lines } => {
                task.resume();
                if task.alive() {
                    return;
                }
                let border_lines = *border_lines;
                let lines = task.take_result().unwrap_or_default();
                self.assemble(lines, border_lines);
            }
            ProjectionStage::Finished => {}
        }
    }

    fn alive(&self) -> bool {
        !matches!(self.stage, ProjectionStage::Finished)
    }

    fn take_result(&mut self) -> Option<Self::Output> {
        self.result.take()
    }
}
