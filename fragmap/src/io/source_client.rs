//! Geometry client.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use geo_types::MultiPolygon;
use thiserror::Error;

use crate::{
    coords::Quadkey,
    fragment::{FragmentKey, RegionId},
    io::FragmentRequest,
};

/// Geometries of the requested quads grouped by region. Quads may be missing from a response.
pub type RegionGeometries = HashMap<RegionId, Vec<(Quadkey, MultiPolygon<f64>)>>;

/// Fetches decoded lon/lat geometry of region fragments from a server.
///
/// Futures returned by the client are executed on the runtime of the
/// [`Scheduler`](crate::io::scheduler::Scheduler), so they have to be thread-safe.
#[async_trait]
pub trait GeometryClient: Clone + Sync + Send + 'static {
    async fn fetch(
        &self,
        region_ids: &[RegionId],
        quads: &BTreeSet<Quadkey>,
    ) -> Result<RegionGeometries, SourceFetchError>;
}

#[derive(Error, Debug)]
#[error("failed to fetch fragments from source")]
pub struct SourceFetchError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// Gives access to the [`GeometryClient`] and turns its responses into per-fragment results.
#[derive(Clone)]
pub struct SourceClient<GC>
where
    GC: GeometryClient,
{
    inner_client: GC,
}

impl<GC> SourceClient<GC>
where
    GC: GeometryClient,
{
    pub fn new(geometry_client: GC) -> Self {
        Self {
            inner_client: geometry_client,
        }
    }

    /// Fetches the fragments of `request`. Every requested quad has an entry in the result;
    /// quads the server stayed silent about are empty.
    pub async fn fetch(
        &self,
        request: &FragmentRequest,
    ) -> Result<HashMap<FragmentKey, MultiPolygon<f64>>, SourceFetchError> {
        let mut response = self
            .inner_client
            .fetch(std::slice::from_ref(&request.region_id), &request.quads)
            .await?;

        let mut fragments: HashMap<FragmentKey, MultiPolygon<f64>> = response
            .remove(&request.region_id)
            .unwrap_or_default()
            .into_iter()
            .filter(|(quad, _)| request.quads.contains(quad))
            .map(|(quad, geometry)| (FragmentKey::new(request.region_id.clone(), quad), geometry))
            .collect();

        for quad in &request.quads {
            fragments
                .entry(FragmentKey::new(request.region_id.clone(), *quad))
                .or_insert_with(|| MultiPolygon::new(vec![]));
        }

        Ok(fragments)
    }
}
