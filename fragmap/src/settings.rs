//! Settings for the fragment engine

use std::{num::NonZeroUsize, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings")]
    Json(#[from] serde_json::Error),
    #[error("`{0}` must be at least 1")]
    Zero(&'static str),
}

/// Tunes the streaming engine. Every field has a default, so a settings file only needs to
/// name the values it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentSettings {
    /// Upper bound of fragments which are downloading or projecting at the same time.
    pub max_concurrent_downloads: usize,
    /// Number of cached fragments which may stay around while nothing protects them.
    pub cache_size_budget: usize,
    /// Number of regions for which empty fragments are remembered.
    pub empty_memo_outer_capacity: usize,
    /// Number of empty quads remembered per region.
    pub empty_memo_inner_capacity: usize,
    /// Steps a single projection may take per tick.
    pub projection_quant: usize,
    /// Time all projections together may take per tick.
    pub projection_time_budget_ms: u64,
}

impl Default for FragmentSettings {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 60,
            cache_size_budget: 60_000,
            empty_memo_outer_capacity: 5_000,
            empty_memo_inner_capacity: 50_000,
            projection_quant: 1_000,
            projection_time_budget_ms: 8,
        }
    }
}

impl FragmentSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: FragmentSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.memo_capacities()?;
        if self.max_concurrent_downloads == 0 {
            return Err(SettingsError::Zero("max_concurrent_downloads"));
        }
        if self.projection_quant == 0 {
            return Err(SettingsError::Zero("projection_quant"));
        }
        Ok(())
    }

    /// Outer and inner capacity of the empty fragment memo.
    pub fn memo_capacities(&self) -> Result<(NonZeroUsize, NonZeroUsize), SettingsError> {
        let outer = NonZeroUsize::new(self.empty_memo_outer_capacity)
            .ok_or(SettingsError::Zero("empty_memo_outer_capacity"))?;
        let inner = NonZeroUsize::new(self.empty_memo_inner_capacity)
            .ok_or(SettingsError::Zero("empty_memo_inner_capacity"))?;
        Ok((outer, inner))
    }

    pub fn projection_time_budget(&self) -> Duration {
        Duration::from_millis(self.projection_time_budget_ms)
    }
}

#[cfg(test)]
mod tests {
    use crate::settings::{FragmentSettings, SettingsError};

    #[test]
    fn test_partial_json() {
        let settings =
            FragmentSettings::from_json(r#"{ "max_concurrent_downloads": 4 }"#).unwrap();
        assert_eq!(settings.max_concurrent_downloads, 4);
        assert_eq!(
            settings.cache_size_budget,
            FragmentSettings::default().cache_size_budget
        );
    }

    #[test]
    fn test_rejects_zero() {
        let result = FragmentSettings::from_json(r#"{ "empty_memo_inner_capacity": 0 }"#);
        assert!(matches!(
            result,
            Err(SettingsError::Zero("empty_memo_inner_capacity"))
        ));
        assert!(matches!(
            FragmentSettings::from_json("{ nope"),
            Err(SettingsError::Json(_))
        ));
    }
}
