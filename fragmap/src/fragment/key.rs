use std::{
    fmt,
    fmt::{Display, Formatter},
    sync::Arc,
};

use crate::coords::{Quadkey, QuadkeyParseError, ZoomLevel};

/// Identifier of a region, e.g. a country or a district. Cheap to clone.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(Arc<str>);

impl RegionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        RegionId(Arc::from(id))
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        RegionId(Arc::from(id))
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "R({})", self.0)
    }
}

impl Display for RegionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a fragment: the part of a region which lies within one quad.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentKey {
    pub region_id: RegionId,
    pub quad: Quadkey,
}

impl FragmentKey {
    pub fn new(region_id: RegionId, quad: Quadkey) -> Self {
        Self { region_id, quad }
    }

    pub fn parse(region_id: &str, quad: &str) -> Result<Self, QuadkeyParseError> {
        Ok(Self::new(region_id.into(), quad.parse()?))
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.quad.zoom_level()
    }
}

impl fmt::Debug for FragmentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "F({}, {})", self.region_id, self.quad)
    }
}

impl Display for FragmentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.region_id, self.quad)
    }
}
