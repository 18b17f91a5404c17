//! Config - Solver Configuration
//!
//! Iteration budget, convergence threshold and backend selection for the
//! iterative solvers, loadable from TOML:
//!
//! ```toml
//! max_iter = 500
//! tol = 1e-6
//! device = "blas"
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::Path;

use serde::{Deserialize, Serialize};

use gpuplay_core::{backends, DevicePtr, DeviceType};

use crate::error::{SolverError, SolverResult};

// =============================================================================
// Solver Configuration
// =============================================================================

/// Settings shared by every iterative solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum number of iterations.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// The solver stops once the residual norm drops below this value.
    #[serde(default = "default_tol")]
    pub tol: f32,

    /// Backend that [`SolverConfig::device()`] resolves.
    ///
    /// Used to allocate operands; `solve` runs on whichever device the
    /// operands share.
    #[serde(default = "default_device")]
    pub device: DeviceType,
}

fn default_max_iter() -> usize {
    1000
}

fn default_tol() -> f32 {
    f32::EPSILON
}

fn default_device() -> DeviceType {
    DeviceType::Serial
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tol: default_tol(),
            device: default_device(),
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration budget.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence threshold.
    #[must_use]
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the backend.
    #[must_use]
    pub fn with_device(mut self, device: DeviceType) -> Self {
        self.device = device;
        self
    }

    /// Resolves the configured backend through the registry.
    pub fn device(&self) -> SolverResult<DevicePtr> {
        Ok(backends::make_device(self.device)?)
    }

    /// Checks that the values are usable.
    pub fn validate(&self) -> SolverResult<()> {
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(SolverError::Config(format!(
                "tol must be a finite non-negative number, got {}",
                self.tol
            )));
        }
        Ok(())
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> SolverResult<Self> {
        let config: SolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
