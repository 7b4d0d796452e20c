use crate::io::{scheduler::Scheduler, source_client::GeometryClient};

/// Ties together the types which depend on the platform or on the host application.
pub trait Environment: 'static {
    type Scheduler: Scheduler;
    type GeometryClient: GeometryClient;
}
