//! The seam between the driver and the AMGX C API.
//!
//! [`AmgxApi`] has one method per library entry point the driver uses. The
//! production implementation is [`crate::ffi::AmgxLibrary`]; tests substitute
//! a recording mock.

use std::ffi::{CStr, c_char, c_int};
use std::fmt;

use serde::Serialize;

use crate::mode::Mode;

/// Result of a single library call: the value, or the non-success return code.
pub type CallResult<T> = std::result::Result<T, ReturnCode>;

/// Signature of the console callback accepted by `AMGX_register_print_callback`.
pub type PrintCallback = unsafe extern "C" fn(msg: *const c_char, length: c_int);

/// Return codes of the AMGX C API (`AMGX_RC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Ok,
    BadParameters,
    Unknown,
    NotSupportedTarget,
    NotSupportedBlocksize,
    CudaFailure,
    ThrustFailure,
    NoMemory,
    IoError,
    BadMode,
    Core,
    Plugin,
    BadConfiguration,
    NotImplemented,
    LicenseNotFound,
    Internal,
    /// A code this driver does not know about.
    Other(i32),
}

impl ReturnCode {
    /// Convert a raw `AMGX_RC` value.
    pub fn from_raw(code: c_int) -> Self {
        match code {
            0 => ReturnCode::Ok,
            1 => ReturnCode::BadParameters,
            2 => ReturnCode::Unknown,
            3 => ReturnCode::NotSupportedTarget,
            4 => ReturnCode::NotSupportedBlocksize,
            5 => ReturnCode::CudaFailure,
            6 => ReturnCode::ThrustFailure,
            7 => ReturnCode::NoMemory,
            8 => ReturnCode::IoError,
            9 => ReturnCode::BadMode,
            10 => ReturnCode::Core,
            11 => ReturnCode::Plugin,
            12 => ReturnCode::BadConfiguration,
            13 => ReturnCode::NotImplemented,
            14 => ReturnCode::LicenseNotFound,
            15 => ReturnCode::Internal,
            other => ReturnCode::Other(other),
        }
    }

    /// The raw `AMGX_RC` value.
    pub fn as_raw(self) -> c_int {
        match self {
            ReturnCode::Ok => 0,
            ReturnCode::BadParameters => 1,
            ReturnCode::Unknown => 2,
            ReturnCode::NotSupportedTarget => 3,
            ReturnCode::NotSupportedBlocksize => 4,
            ReturnCode::CudaFailure => 5,
            ReturnCode::ThrustFailure => 6,
            ReturnCode::NoMemory => 7,
            ReturnCode::IoError => 8,
            ReturnCode::BadMode => 9,
            ReturnCode::Core => 10,
            ReturnCode::Plugin => 11,
            ReturnCode::BadConfiguration => 12,
            ReturnCode::NotImplemented => 13,
            ReturnCode::LicenseNotFound => 14,
            ReturnCode::Internal => 15,
            ReturnCode::Other(code) => code,
        }
    }

    /// Turn a raw status into a [`CallResult`] carrying `value` on success.
    pub fn into_result<T>(code: c_int, value: T) -> CallResult<T> {
        match Self::from_raw(code) {
            ReturnCode::Ok => Ok(value),
            failure => Err(failure),
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReturnCode::Ok => "AMGX_RC_OK",
            ReturnCode::BadParameters => "AMGX_RC_BAD_PARAMETERS",
            ReturnCode::Unknown => "AMGX_RC_UNKNOWN",
            ReturnCode::NotSupportedTarget => "AMGX_RC_NOT_SUPPORTED_TARGET",
            ReturnCode::NotSupportedBlocksize => "AMGX_RC_NOT_SUPPORTED_BLOCKSIZE",
            ReturnCode::CudaFailure => "AMGX_RC_CUDA_FAILURE",
            ReturnCode::ThrustFailure => "AMGX_RC_THRUST_FAILURE",
            ReturnCode::NoMemory => "AMGX_RC_NO_MEMORY",
            ReturnCode::IoError => "AMGX_RC_IO_ERROR",
            ReturnCode::BadMode => "AMGX_RC_BAD_MODE",
            ReturnCode::Core => "AMGX_RC_CORE",
            ReturnCode::Plugin => "AMGX_RC_PLUGIN",
            ReturnCode::BadConfiguration => "AMGX_RC_BAD_CONFIGURATION",
            ReturnCode::NotImplemented => "AMGX_RC_NOT_IMPLEMENTED",
            ReturnCode::LicenseNotFound => "AMGX_RC_LICENSE_NOT_FOUND",
            ReturnCode::Internal => "AMGX_RC_INTERNAL",
            ReturnCode::Other(code) => return write!(f, "AMGX_RC({})", code),
        };
        write!(f, "{} ({})", name, self.as_raw())
    }
}

/// Outcome reported by `AMGX_solver_get_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Success,
    Failed,
    /// AMGX uses the same value for "diverged".
    NotConverged,
    Other(i32),
}

impl SolveStatus {
    pub fn from_raw(status: c_int) -> Self {
        match status {
            0 => SolveStatus::Success,
            1 => SolveStatus::Failed,
            2 => SolveStatus::NotConverged,
            other => SolveStatus::Other(other),
        }
    }

    pub fn is_success(self) -> bool {
        self == SolveStatus::Success
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Success => write!(f, "success"),
            SolveStatus::Failed => write!(f, "failed"),
            SolveStatus::NotConverged => write!(f, "not converged"),
            SolveStatus::Other(code) => write!(f, "unknown status {}", code),
        }
    }
}

/// AMGX C API version as reported by `AMGX_get_api_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiVersion {
    pub major: i32,
    pub minor: i32,
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Dimensions of a loaded system matrix (`AMGX_matrix_get_size`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixSize {
    /// Number of block rows.
    pub rows: i32,
    pub block_dimx: i32,
    pub block_dimy: i32,
}

/// Entry points of the AMGX C API used by the driver.
///
/// Every fallible call returns a [`CallResult`]; output parameters of the C
/// functions become return values. Handles are opaque and only meaningful to
/// the implementation that produced them.
pub trait AmgxApi {
    /// Opaque handle type shared by configs, resources, solvers, matrices and vectors.
    type Handle: Copy + fmt::Debug;

    fn initialize(&self) -> CallResult<()>;
    fn finalize(&self) -> CallResult<()>;
    fn register_print_callback(&self, callback: PrintCallback) -> CallResult<()>;
    fn api_version(&self) -> CallResult<ApiVersion>;

    /// Human-readable text for a return code (`AMGX_get_error_string`).
    ///
    /// Never fails: implementations fall back to the code's own name.
    fn error_string(&self, code: ReturnCode) -> String;

    fn config_create_from_file(&self, path: &CStr) -> CallResult<Self::Handle>;
    fn config_destroy(&self, config: Self::Handle) -> CallResult<()>;

    fn resources_create_simple(&self, config: Self::Handle) -> CallResult<Self::Handle>;
    fn resources_destroy(&self, resources: Self::Handle) -> CallResult<()>;

    fn solver_create(
        &self,
        resources: Self::Handle,
        mode: Mode,
        config: Self::Handle,
    ) -> CallResult<Self::Handle>;
    fn solver_destroy(&self, solver: Self::Handle) -> CallResult<()>;
    fn solver_setup(&self, solver: Self::Handle, matrix: Self::Handle) -> CallResult<()>;
    fn solver_solve(
        &self,
        solver: Self::Handle,
        rhs: Self::Handle,
        solution: Self::Handle,
    ) -> CallResult<()>;
    fn solver_iterations(&self, solver: Self::Handle) -> CallResult<i32>;
    fn solver_status(&self, solver: Self::Handle) -> CallResult<SolveStatus>;

    /// Residual norm of block component `block` after iteration `iteration`.
    fn solver_iteration_residual(
        &self,
        solver: Self::Handle,
        iteration: i32,
        block: i32,
    ) -> CallResult<f64>;

    fn matrix_create(&self, resources: Self::Handle, mode: Mode) -> CallResult<Self::Handle>;
    fn matrix_destroy(&self, matrix: Self::Handle) -> CallResult<()>;
    fn matrix_size(&self, matrix: Self::Handle) -> CallResult<MatrixSize>;

    fn vector_create(&self, resources: Self::Handle, mode: Mode) -> CallResult<Self::Handle>;
    fn vector_destroy(&self, vector: Self::Handle) -> CallResult<()>;

    /// Populate `matrix`, `rhs` and `solution` from a Matrix Market file.
    fn read_system(
        &self,
        matrix: Self::Handle,
        rhs: Self::Handle,
        solution: Self::Handle,
        path: &CStr,
    ) -> CallResult<()>;
}
