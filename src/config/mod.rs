// src/config/mod.rs
pub mod io;
pub mod types;

pub use self::types::{DescentConfig, PrankConfig, SimulationConfig};

use std::path::Path;

use crate::error::{PrankError, Result};

impl PrankConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `prank.toml` from the working directory, or defaults if absent.
    ///
    /// # Errors
    /// Returns error if the file exists but is unreadable or malformed.
    pub fn load_local() -> anyhow::Result<Self> {
        Self::load(Path::new(io::DEFAULT_PATH))
    }

    /// Loads the configuration at `path`, or defaults if absent.
    ///
    /// # Errors
    /// Returns error if the file exists but is unreadable or malformed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        io::load_from_file(path)
    }

    /// Saves the configuration to `path`.
    ///
    /// # Errors
    /// Returns error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        io::save_to_file(self, path)
    }

    /// Validates every table.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.descent.validate()?;
        self.simulation.validate()
    }
}

impl DescentConfig {
    /// # Errors
    /// Returns `InvalidNeighborCount` for `k == 0` and `InvalidConfig` for a
    /// sample rate outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(PrankError::InvalidNeighborCount(self.k));
        }
        if !(self.sample_rate > 0.0 && self.sample_rate <= 1.0) {
            return Err(PrankError::InvalidConfig(format!(
                "descent.sample_rate must lie in (0, 1], got {}",
                self.sample_rate
            )));
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// # Errors
    /// Returns `InvalidConfig` for fewer than two dimensions or zero groups.
    pub fn validate(&self) -> Result<()> {
        if self.dimension < 2 {
            return Err(PrankError::InvalidConfig(format!(
                "simulation.dimension must be at least 2, got {}",
                self.dimension
            )));
        }
        if self.groups == 0 {
            return Err(PrankError::InvalidConfig(
                "simulation.groups must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
