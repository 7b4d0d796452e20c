use crate::{environment::Environment, error::Error, io::source_client::SourceClient};

/// Holds references to core constructs of the engine. Based on the compile-time initialization
/// different implementations for handling asynchronous work or geometry sources are provided
/// through a [`Kernel`].
///
/// An [`Environment`] defines the types which are used.
///
/// A Kernel lives as long as a [FragmentEngine](crate::engine::FragmentEngine) usually. It is
/// shared between the systems which dispatch requests.
pub struct Kernel<E: Environment> {
    scheduler: E::Scheduler,
    source_client: SourceClient<E::GeometryClient>,
}

impl<E: Environment> Kernel<E> {
    pub fn scheduler(&self) -> &E::Scheduler {
        &self.scheduler
    }

    pub fn source_client(&self) -> &SourceClient<E::GeometryClient> {
        &self.source_client
    }
}

/// A convenient builder for [Kernels](Kernel).
pub struct KernelBuilder<E: Environment> {
    scheduler: Option<E::Scheduler>,
    geometry_client: Option<E::GeometryClient>,
}

impl<E: Environment> Default for KernelBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> KernelBuilder<E> {
    pub fn new() -> Self {
        Self {
            scheduler: None,
            geometry_client: None,
        }
    }

    pub fn with_scheduler(mut self, scheduler: E::Scheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_geometry_client(mut self, geometry_client: E::GeometryClient) -> Self {
        self.geometry_client = Some(geometry_client);
        self
    }

    pub fn build(self) -> Result<Kernel<E>, Error> {
        Ok(Kernel {
            scheduler: self.scheduler.ok_or(Error::Missing("scheduler"))?,
            source_client: SourceClient::new(
                self.geometry_client
                    .ok_or(Error::Missing("geometry client"))?,
            ),
        })
    }
}
