//! Summary of a completed solve.

use std::path::PathBuf;

use serde::Serialize;

use crate::api::{ApiVersion, MatrixSize, SolveStatus};
use crate::mode::Mode;

/// What the driver learned from one solve.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    /// `None` if the library did not answer the version query.
    pub api_version: Option<ApiVersion>,
    pub mode: Mode,
    pub config_file: PathBuf,
    pub system_file: PathBuf,
    pub system: MatrixSize,
    pub iterations: i32,
    pub status: SolveStatus,
    /// Final residual norm, when the configuration enabled residual monitoring.
    pub final_residual: Option<f64>,
}

impl SolveReport {
    pub fn converged(&self) -> bool {
        self.status.is_success()
    }
}
