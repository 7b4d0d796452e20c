//! Fragments are the parts of a region which lie within a single quad. This module contains
//! their identity, the registries which track them through their lifecycle and the pipeline
//! which turns downloaded geometry into a [`RenderableFragment`].

use std::fmt;

use geo_types::{Coord, MultiLineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

pub use key::{FragmentKey, RegionId};

pub mod cache;
pub mod changes;
pub mod emptiness;
pub mod empty;
mod key;
pub mod pipeline;
pub mod queue;
pub mod streaming;

/// Identifies the render layer a region is drawn in.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// A fragment which is ready to be handed to the renderer. All geometry is in screen space
/// relative to [`RenderableFragment::origin`].
#[derive(Clone, Debug)]
pub struct RenderableFragment {
    pub key: FragmentKey,
    pub geometry: MultiPolygon<f64>,
    /// The outline of the region without the edges introduced by clipping at the quad.
    pub border: MultiLineString<f64>,
    /// The area the geometry was clipped to.
    pub clip_path: Polygon<f64>,
    /// World position of the fragment's bounding box.
    pub origin: Coord<f64>,
    /// World size of the fragment's bounding box.
    pub dimension: Coord<f64>,
    /// Factor which scales world coordinates to screen coordinates, `2^zoom`.
    pub scale: f64,
    pub layer_id: LayerId,
}
