use std::sync::Arc;

use crate::{
    fragment::emptiness::EmptinessChecker, projection::MapProjection,
    settings::FragmentSettings, view_state::ViewState, world::World,
};

/// Stores the context of the engine which is handed to every system.
///
/// This struct should not depend on the [`crate::environment::Environment`] trait. Else types
/// throughout the crate get messy quickly.
pub struct MapContext {
    pub world: World,
    pub view_state: ViewState,
    pub settings: FragmentSettings,
    pub projection: Arc<dyn MapProjection>,
    pub emptiness: Box<dyn EmptinessChecker>,
}
