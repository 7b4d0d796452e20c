use std::collections::BTreeSet;

use crate::{
    coords::{Quadkey, Zoom, ZoomLevel},
    util::ChangeObserver,
};

/// Stores what the host currently shows: the camera zoom and the visible quads. The quads of
/// the previous tick are kept to compute the difference.
pub struct ViewState {
    zoom: ChangeObserver<Zoom>,
    visible_quads: BTreeSet<Quadkey>,
    previous_quads: BTreeSet<Quadkey>,
}

impl ViewState {
    pub fn new(zoom: Zoom) -> Self {
        Self {
            zoom: ChangeObserver::new(zoom),
            visible_quads: BTreeSet::new(),
            previous_quads: BTreeSet::new(),
        }
    }

    pub fn set_visible_quads(&mut self, quads: impl IntoIterator<Item = Quadkey>) {
        self.visible_quads = quads.into_iter().collect();
    }

    pub fn update_zoom(&mut self, zoom: Zoom) {
        *self.zoom = zoom;
    }

    pub fn zoom(&self) -> Zoom {
        *self.zoom
    }

    pub fn zoom_level(&self) -> ZoomLevel {
        self.zoom.level()
    }

    pub fn is_integer_zoom(&self) -> bool {
        self.zoom.is_integer()
    }

    pub fn did_zoom_change(&self) -> bool {
        self.zoom.did_change(0.0)
    }

    pub fn visible_quads(&self) -> &BTreeSet<Quadkey> {
        &self.visible_quads
    }

    pub fn is_visible(&self, quad: &Quadkey) -> bool {
        self.visible_quads.contains(quad)
    }

    pub fn newly_visible(&self) -> impl Iterator<Item = &Quadkey> {
        self.visible_quads.difference(&self.previous_quads)
    }

    pub fn newly_hidden(&self) -> impl Iterator<Item = &Quadkey> {
        self.previous_quads.difference(&self.visible_quads)
    }

    /// Makes the current state the reference for the next difference.
    pub fn update_references(&mut self) {
        self.zoom.update_reference();
        if self.previous_quads != self.visible_quads {
            self.previous_quads = self.visible_quads.clone();
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Zoom::default())
    }
}
