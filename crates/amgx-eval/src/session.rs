//! Scoped AMGX session and owned library handles.
//!
//! [`Session::new`] calls `AMGX_initialize` and dropping the session calls
//! `AMGX_finalize`, so process-wide library state is released on every path
//! once initialization succeeded. Handles created through the session borrow
//! it and call their destroy function when dropped; declaring them after the
//! session gives reverse-creation-order teardown followed by finalize.

use std::ffi::CString;
use std::marker::PhantomData;
use std::path::Path;

use crate::api::{AmgxApi, ApiVersion, CallResult, MatrixSize, ReturnCode, SolveStatus};
use crate::error::{AmgxError, Result};
use crate::ffi::forward_to_log;
use crate::mode::Mode;

/// An initialized AMGX library.
pub struct Session<A: AmgxApi> {
    api: A,
}

impl<A: AmgxApi> Session<A> {
    /// Initialize the library. Finalize runs when the session is dropped.
    pub fn new(api: A) -> Result<Self> {
        let rc = api.initialize();
        // No session exists yet, so a failed initialize is never finalized.
        if let Err(code) = rc {
            return Err(library_error(&api, "AMGX_initialize", code));
        }
        log::debug!("AMGX initialized");
        Ok(Self { api })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Convert a call result into a driver result labelled with `operation`.
    pub fn check<T>(&self, operation: &'static str, result: CallResult<T>) -> Result<T> {
        result.map_err(|code| library_error(&self.api, operation, code))
    }

    /// Library API version. Informational only, so failures are logged and ignored.
    pub fn api_version(&self) -> Option<ApiVersion> {
        match self.api.api_version() {
            Ok(version) => Some(version),
            Err(code) => {
                log::debug!("AMGX_get_api_version returned {}", code);
                None
            }
        }
    }

    /// Route AMGX console output into the `log` facade.
    pub fn route_output_to_log(&self) -> Result<()> {
        self.check(
            "AMGX_register_print_callback",
            self.api.register_print_callback(forward_to_log),
        )
    }

    /// Parse a JSON solver configuration file.
    pub fn load_config(&self, path: &Path) -> Result<Config<'_, A>> {
        let c_path = c_path(path)?;
        let raw = self.check(
            "AMGX_config_create_from_file",
            self.api.config_create_from_file(&c_path),
        )?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(Handle::new(self, raw))
    }

    /// Create single-device resources (no MPI communicator).
    pub fn create_resources(&self, config: &Config<'_, A>) -> Result<Resources<'_, A>> {
        let raw = self.check(
            "AMGX_resources_create_simple",
            self.api.resources_create_simple(config.raw),
        )?;
        Ok(Handle::new(self, raw))
    }

    pub fn create_solver(
        &self,
        resources: &Resources<'_, A>,
        mode: Mode,
        config: &Config<'_, A>,
    ) -> Result<Solver<'_, A>> {
        let raw = self.check(
            "AMGX_solver_create",
            self.api.solver_create(resources.raw, mode, config.raw),
        )?;
        Ok(Handle::new(self, raw))
    }

    pub fn create_matrix(&self, resources: &Resources<'_, A>, mode: Mode) -> Result<Matrix<'_, A>> {
        let raw = self.check(
            "AMGX_matrix_create",
            self.api.matrix_create(resources.raw, mode),
        )?;
        Ok(Handle::new(self, raw))
    }

    pub fn create_vector(&self, resources: &Resources<'_, A>, mode: Mode) -> Result<Vector<'_, A>> {
        let raw = self.check(
            "AMGX_vector_create",
            self.api.vector_create(resources.raw, mode),
        )?;
        Ok(Handle::new(self, raw))
    }

    /// Fill `matrix`, `rhs` and `solution` from a Matrix Market system file.
    pub fn read_system(
        &self,
        matrix: &Matrix<'_, A>,
        rhs: &Vector<'_, A>,
        solution: &Vector<'_, A>,
        path: &Path,
    ) -> Result<()> {
        let c_path = c_path(path)?;
        self.check(
            "AMGX_read_system",
            self.api.read_system(matrix.raw, rhs.raw, solution.raw, &c_path),
        )?;
        log::debug!("Read system from {}", path.display());
        Ok(())
    }
}

impl<A: AmgxApi> Drop for Session<A> {
    fn drop(&mut self) {
        match self.api.finalize() {
            Ok(()) => log::debug!("AMGX finalized"),
            Err(code) => log::warn!("AMGX_finalize failed - {}", self.api.error_string(code)),
        }
    }
}

fn library_error<A: AmgxApi>(api: &A, operation: &'static str, code: ReturnCode) -> AmgxError {
    AmgxError::Library {
        operation,
        code,
        message: api.error_string(code),
    }
}

fn c_path(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_encoded_bytes())
        .map_err(|_| AmgxError::InvalidPath(path.to_path_buf()))
}

/// The kind of object a [`Handle`] refers to.
pub trait HandleKind {
    /// Name used in log messages.
    const NAME: &'static str;
    /// C entry point that destroys this kind of handle.
    const DESTROY: &'static str;

    fn destroy<A: AmgxApi>(api: &A, raw: A::Handle) -> CallResult<()>;
}

pub enum ConfigKind {}
pub enum ResourcesKind {}
pub enum SolverKind {}
pub enum MatrixKind {}
pub enum VectorKind {}

impl HandleKind for ConfigKind {
    const NAME: &'static str = "config";
    const DESTROY: &'static str = "AMGX_config_destroy";

    fn destroy<A: AmgxApi>(api: &A, raw: A::Handle) -> CallResult<()> {
        api.config_destroy(raw)
    }
}

impl HandleKind for ResourcesKind {
    const NAME: &'static str = "resources";
    const DESTROY: &'static str = "AMGX_resources_destroy";

    fn destroy<A: AmgxApi>(api: &A, raw: A::Handle) -> CallResult<()> {
        api.resources_destroy(raw)
    }
}

impl HandleKind for SolverKind {
    const NAME: &'static str = "solver";
    const DESTROY: &'static str = "AMGX_solver_destroy";

    fn destroy<A: AmgxApi>(api: &A, raw: A::Handle) -> CallResult<()> {
        api.solver_destroy(raw)
    }
}

impl HandleKind for MatrixKind {
    const NAME: &'static str = "matrix";
    const DESTROY: &'static str = "AMGX_matrix_destroy";

    fn destroy<A: AmgxApi>(api: &A, raw: A::Handle) -> CallResult<()> {
        api.matrix_destroy(raw)
    }
}

impl HandleKind for VectorKind {
    const NAME: &'static str = "vector";
    const DESTROY: &'static str = "AMGX_vector_destroy";

    fn destroy<A: AmgxApi>(api: &A, raw: A::Handle) -> CallResult<()> {
        api.vector_destroy(raw)
    }
}

/// A library object owned by the driver, destroyed exactly once on drop.
pub struct Handle<'s, A: AmgxApi, K: HandleKind> {
    session: &'s Session<A>,
    raw: A::Handle,
    _kind: PhantomData<K>,
}

pub type Config<'s, A> = Handle<'s, A, ConfigKind>;
pub type Resources<'s, A> = Handle<'s, A, ResourcesKind>;
pub type Solver<'s, A> = Handle<'s, A, SolverKind>;
pub type Matrix<'s, A> = Handle<'s, A, MatrixKind>;
pub type Vector<'s, A> = Handle<'s, A, VectorKind>;

impl<'s, A: AmgxApi, K: HandleKind> Handle<'s, A, K> {
    fn new(session: &'s Session<A>, raw: A::Handle) -> Self {
        log::trace!("Created {} handle {:?}", K::NAME, raw);
        Self {
            session,
            raw,
            _kind: PhantomData,
        }
    }

    pub fn raw(&self) -> A::Handle {
        self.raw
    }
}

impl<A: AmgxApi, K: HandleKind> Drop for Handle<'_, A, K> {
    fn drop(&mut self) {
        let api = self.session.api();
        match K::destroy(api, self.raw) {
            Ok(()) => log::trace!("Destroyed {} handle {:?}", K::NAME, self.raw),
            Err(code) => log::warn!("{} failed - {}", K::DESTROY, api.error_string(code)),
        }
    }
}

impl<A: AmgxApi> Solver<'_, A> {
    /// Analysis phase: build the solver hierarchy for `matrix`.
    pub fn setup(&self, matrix: &Matrix<'_, A>) -> Result<()> {
        self.session.check(
            "AMGX_solver_setup",
            self.session.api().solver_setup(self.raw, matrix.raw),
        )
    }

    /// Solve for `solution` given `rhs`, using the state built by [`Solver::setup`].
    pub fn solve(&self, rhs: &Vector<'_, A>, solution: &Vector<'_, A>) -> Result<()> {
        self.session.check(
            "AMGX_solver_solve",
            self.session.api().solver_solve(self.raw, rhs.raw, solution.raw),
        )
    }

    pub fn iterations(&self) -> Result<i32> {
        self.session.check(
            "AMGX_solver_get_iterations_number",
            self.session.api().solver_iterations(self.raw),
        )
    }

    pub fn status(&self) -> Result<SolveStatus> {
        self.session.check(
            "AMGX_solver_get_status",
            self.session.api().solver_status(self.raw),
        )
    }

    /// Residual norm of the first block component after the last iteration.
    ///
    /// History index 0 holds the initial residual and index `k` the residual
    /// after iteration `k`, so the final one sits at `iterations`. AMGX only stores residual history when the configuration enables
    /// monitoring, so this returns `None` instead of an error when the
    /// library has nothing to report.
    pub fn final_residual(&self, iterations: i32) -> Option<f64> {
        let iteration = iterations.max(0);
        match self
            .session
            .api()
            .solver_iteration_residual(self.raw, iteration, 0)
        {
            Ok(residual) => Some(residual),
            Err(code) => {
                log::debug!("No residual history available ({})", code);
                None
            }
        }
    }
}

impl<A: AmgxApi> Matrix<'_, A> {
    pub fn size(&self) -> Result<MatrixSize> {
        self.session.check(
            "AMGX_matrix_get_size",
            self.session.api().matrix_size(self.raw),
        )
    }
}
