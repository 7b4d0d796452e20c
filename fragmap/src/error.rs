//! Errors which can happen in various parts of the library.

use thiserror::Error;

use crate::{
    io::{scheduler::ScheduleError, source_client::SourceFetchError},
    settings::SettingsError,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("scheduling failed")]
    Schedule(#[from] ScheduleError),
    #[error("fetching fragments failed")]
    Fetch(#[from] SourceFetchError),
    #[error("invalid settings")]
    Settings(#[from] SettingsError),
    #[error("engine is missing a {0}")]
    Missing(&'static str),
}
