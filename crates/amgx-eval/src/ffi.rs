//! Dynamic bindings to the AMGX shared library.
//!
//! The library is opened at runtime so the driver builds on machines without
//! AMGX or CUDA installed; a missing library surfaces as
//! [`AmgxError::LibraryLoad`] instead of a link failure.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::path::Path;

use libloading::Library;

use crate::api::{
    AmgxApi, ApiVersion, CallResult, MatrixSize, PrintCallback, ReturnCode, SolveStatus,
};
use crate::error::{AmgxError, Result};
use crate::mode::Mode;

/// Size of the buffer handed to `AMGX_get_error_string`.
const ERROR_STRING_LEN: usize = 256;

/// Opaque AMGX handle (`AMGX_config_handle`, `AMGX_solver_handle`, ...).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHandle(*mut c_void);

impl RawHandle {
    fn null() -> Self {
        Self(std::ptr::null_mut())
    }
}

type InitializeFn = unsafe extern "C" fn() -> c_int;
type FinalizeFn = unsafe extern "C" fn() -> c_int;
type RegisterPrintCallbackFn = unsafe extern "C" fn(callback: PrintCallback) -> c_int;
type GetApiVersionFn = unsafe extern "C" fn(major: *mut c_int, minor: *mut c_int) -> c_int;
type GetErrorStringFn = unsafe extern "C" fn(err: c_int, buf: *mut c_char, buf_len: c_int) -> c_int;

type ConfigCreateFromFileFn =
    unsafe extern "C" fn(config: *mut RawHandle, param_file: *const c_char) -> c_int;
type ResourcesCreateSimpleFn =
    unsafe extern "C" fn(resources: *mut RawHandle, config: RawHandle) -> c_int;
type SolverCreateFn = unsafe extern "C" fn(
    solver: *mut RawHandle,
    resources: RawHandle,
    mode: c_int,
    config: RawHandle,
) -> c_int;
type ObjectCreateFn =
    unsafe extern "C" fn(object: *mut RawHandle, resources: RawHandle, mode: c_int) -> c_int;
type DestroyFn = unsafe extern "C" fn(handle: RawHandle) -> c_int;

type SolverSetupFn = unsafe extern "C" fn(solver: RawHandle, matrix: RawHandle) -> c_int;
type SolverSolveFn =
    unsafe extern "C" fn(solver: RawHandle, rhs: RawHandle, solution: RawHandle) -> c_int;
type SolverGetIterationsNumberFn = unsafe extern "C" fn(solver: RawHandle, n: *mut c_int) -> c_int;
type SolverGetStatusFn = unsafe extern "C" fn(solver: RawHandle, status: *mut c_int) -> c_int;
type SolverGetIterationResidualFn = unsafe extern "C" fn(
    solver: RawHandle,
    iteration: c_int,
    block: c_int,
    residual: *mut f64,
) -> c_int;

type MatrixGetSizeFn = unsafe extern "C" fn(
    matrix: RawHandle,
    n: *mut c_int,
    block_dimx: *mut c_int,
    block_dimy: *mut c_int,
) -> c_int;
type ReadSystemFn = unsafe extern "C" fn(
    matrix: RawHandle,
    rhs: RawHandle,
    solution: RawHandle,
    filename: *const c_char,
) -> c_int;

/// The AMGX shared library with every entry point the driver needs resolved.
pub struct AmgxLibrary {
    _lib: Library,

    initialize: InitializeFn,
    finalize: FinalizeFn,
    register_print_callback: RegisterPrintCallbackFn,
    get_api_version: GetApiVersionFn,
    get_error_string: GetErrorStringFn,

    config_create_from_file: ConfigCreateFromFileFn,
    config_destroy: DestroyFn,
    resources_create_simple: ResourcesCreateSimpleFn,
    resources_destroy: DestroyFn,

    solver_create: SolverCreateFn,
    solver_destroy: DestroyFn,
    solver_setup: SolverSetupFn,
    solver_solve: SolverSolveFn,
    solver_get_iterations_number: SolverGetIterationsNumberFn,
    solver_get_status: SolverGetStatusFn,
    solver_get_iteration_residual: SolverGetIterationResidualFn,

    matrix_create: ObjectCreateFn,
    matrix_destroy: DestroyFn,
    matrix_get_size: MatrixGetSizeFn,
    vector_create: ObjectCreateFn,
    vector_destroy: DestroyFn,
    read_system: ReadSystemFn,
}

impl AmgxLibrary {
    /// Platform-specific names tried by [`AmgxLibrary::load`].
    pub fn default_names() -> &'static [&'static str] {
        if cfg!(target_os = "windows") {
            &["amgxsh.dll"]
        } else if cfg!(target_os = "macos") {
            &["libamgxsh.dylib"]
        } else {
            &["libamgxsh.so"]
        }
    }

    /// Load AMGX from the default library search path.
    pub fn load() -> Result<Self> {
        let mut last_error = None;
        for name in Self::default_names() {
            match unsafe { Library::new(name) } {
                Ok(lib) => {
                    log::debug!("Loaded AMGX from {}", name);
                    return Self::from_library(lib);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(AmgxError::LibraryLoad(match last_error {
            Some(e) => e.to_string(),
            None => "no library names to try".to_string(),
        }))
    }

    /// Load AMGX from an explicit path.
    pub fn open(path: &Path) -> Result<Self> {
        let lib = unsafe { Library::new(path) }
            .map_err(|e| AmgxError::LibraryLoad(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded AMGX from {}", path.display());
        Self::from_library(lib)
    }

    fn from_library(lib: Library) -> Result<Self> {
        // SAFETY: each symbol is resolved with the signature declared in amgx_c.h.
        unsafe {
            Ok(Self {
                initialize: symbol(&lib, "AMGX_initialize")?,
                finalize: symbol(&lib, "AMGX_finalize")?,
                register_print_callback: symbol(&lib, "AMGX_register_print_callback")?,
                get_api_version: symbol(&lib, "AMGX_get_api_version")?,
                get_error_string: symbol(&lib, "AMGX_get_error_string")?,
                config_create_from_file: symbol(&lib, "AMGX_config_create_from_file")?,
                config_destroy: symbol(&lib, "AMGX_config_destroy")?,
                resources_create_simple: symbol(&lib, "AMGX_resources_create_simple")?,
                resources_destroy: symbol(&lib, "AMGX_resources_destroy")?,
                solver_create: symbol(&lib, "AMGX_solver_create")?,
                solver_destroy: symbol(&lib, "AMGX_solver_destroy")?,
                solver_setup: symbol(&lib, "AMGX_solver_setup")?,
                solver_solve: symbol(&lib, "AMGX_solver_solve")?,
                solver_get_iterations_number: symbol(&lib, "AMGX_solver_get_iterations_number")?,
                solver_get_status: symbol(&lib, "AMGX_solver_get_status")?,
                solver_get_iteration_residual: symbol(
                    &lib,
                    "AMGX_solver_get_iteration_residual",
                )?,
                matrix_create: symbol(&lib, "AMGX_matrix_create")?,
                matrix_destroy: symbol(&lib, "AMGX_matrix_destroy")?,
                matrix_get_size: symbol(&lib, "AMGX_matrix_get_size")?,
                vector_create: symbol(&lib, "AMGX_vector_create")?,
                vector_destroy: symbol(&lib, "AMGX_vector_destroy")?,
                read_system: symbol(&lib, "AMGX_read_system")?,
                _lib: lib,
            })
        }
    }
}

/// Resolve `name` and copy the function pointer out of the library.
///
/// # Safety
/// `T` must match the C signature of `name`.
unsafe fn symbol<T: Copy>(lib: &Library, name: &str) -> Result<T> {
    unsafe { lib.get::<T>(name.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|e| AmgxError::LibraryLoad(format!("{}: {}", name, e)))
}

// SAFETY (all calls below): the function pointers come from the loaded AMGX
// library, which `_lib` keeps mapped for the lifetime of `self`. Handles are
// only ever ones previously returned by this library.
impl AmgxApi for AmgxLibrary {
    type Handle = RawHandle;

    fn initialize(&self) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.initialize)() }, ())
    }

    fn finalize(&self) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.finalize)() }, ())
    }

    fn register_print_callback(&self, callback: PrintCallback) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.register_print_callback)(callback) }, ())
    }

    fn api_version(&self) -> CallResult<ApiVersion> {
        let (mut major, mut minor) = (0, 0);
        let rc = unsafe { (self.get_api_version)(&mut major, &mut minor) };
        ReturnCode::into_result(rc, ApiVersion { major, minor })
    }

    fn error_string(&self, code: ReturnCode) -> String {
        let mut buf = [0 as c_char; ERROR_STRING_LEN];
        let rc = unsafe {
            (self.get_error_string)(code.as_raw(), buf.as_mut_ptr(), ERROR_STRING_LEN as c_int)
        };
        if ReturnCode::from_raw(rc) != ReturnCode::Ok {
            return code.to_string();
        }
        // Guarantee termination even if the library filled the whole buffer.
        buf[ERROR_STRING_LEN - 1] = 0;
        let text = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_string_lossy();
        let text = text.trim();
        if text.is_empty() {
            code.to_string()
        } else {
            text.to_string()
        }
    }

    fn config_create_from_file(&self, path: &CStr) -> CallResult<RawHandle> {
        let mut config = RawHandle::null();
        let rc = unsafe { (self.config_create_from_file)(&mut config, path.as_ptr()) };
        ReturnCode::into_result(rc, config)
    }

    fn config_destroy(&self, config: RawHandle) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.config_destroy)(config) }, ())
    }

    fn resources_create_simple(&self, config: RawHandle) -> CallResult<RawHandle> {
        let mut resources = RawHandle::null();
        let rc = unsafe { (self.resources_create_simple)(&mut resources, config) };
        ReturnCode::into_result(rc, resources)
    }

    fn resources_destroy(&self, resources: RawHandle) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.resources_destroy)(resources) }, ())
    }

    fn solver_create(
        &self,
        resources: RawHandle,
        mode: Mode,
        config: RawHandle,
    ) -> CallResult<RawHandle> {
        let mut solver = RawHandle::null();
        let rc = unsafe { (self.solver_create)(&mut solver, resources, mode.as_raw(), config) };
        ReturnCode::into_result(rc, solver)
    }

    fn solver_destroy(&self, solver: RawHandle) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.solver_destroy)(solver) }, ())
    }

    fn solver_setup(&self, solver: RawHandle, matrix: RawHandle) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.solver_setup)(solver, matrix) }, ())
    }

    fn solver_solve(
        &self,
        solver: RawHandle,
        rhs: RawHandle,
        solution: RawHandle,
    ) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.solver_solve)(solver, rhs, solution) }, ())
    }

    fn solver_iterations(&self, solver: RawHandle) -> CallResult<i32> {
        let mut iterations = 0;
        let rc = unsafe { (self.solver_get_iterations_number)(solver, &mut iterations) };
        ReturnCode::into_result(rc, iterations)
    }

    fn solver_status(&self, solver: RawHandle) -> CallResult<SolveStatus> {
        let mut status = 0;
        let rc = unsafe { (self.solver_get_status)(solver, &mut status) };
        ReturnCode::into_result(rc, SolveStatus::from_raw(status))
    }

    fn solver_iteration_residual(
        &self,
        solver: RawHandle,
        iteration: i32,
        block: i32,
    ) -> CallResult<f64> {
        let mut residual = 0.0;
        let rc = unsafe {
            (self.solver_get_iteration_residual)(solver, iteration, block, &mut residual)
        };
        ReturnCode::into_result(rc, residual)
    }

    fn matrix_create(&self, resources: RawHandle, mode: Mode) -> CallResult<RawHandle> {
        let mut matrix = RawHandle::null();
        let rc = unsafe { (self.matrix_create)(&mut matrix, resources, mode.as_raw()) };
        ReturnCode::into_result(rc, matrix)
    }

    fn matrix_destroy(&self, matrix: RawHandle) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.matrix_destroy)(matrix) }, ())
    }

    fn matrix_size(&self, matrix: RawHandle) -> CallResult<MatrixSize> {
        let (mut rows, mut block_dimx, mut block_dimy) = (0, 0, 0);
        let rc = unsafe {
            (self.matrix_get_size)(matrix, &mut rows, &mut block_dimx, &mut block_dimy)
        };
        ReturnCode::into_result(
            rc,
            MatrixSize {
                rows,
                block_dimx,
                block_dimy,
            },
        )
    }

    fn vector_create(&self, resources: RawHandle, mode: Mode) -> CallResult<RawHandle> {
        let mut vector = RawHandle::null();
        let rc = unsafe { (self.vector_create)(&mut vector, resources, mode.as_raw()) };
        ReturnCode::into_result(rc, vector)
    }

    fn vector_destroy(&self, vector: RawHandle) -> CallResult<()> {
        ReturnCode::into_result(unsafe { (self.vector_destroy)(vector) }, ())
    }

    fn read_system(
        &self,
        matrix: RawHandle,
        rhs: RawHandle,
        solution: RawHandle,
        path: &CStr,
    ) -> CallResult<()> {
        let rc = unsafe { (self.read_system)(matrix, rhs, solution, path.as_ptr()) };
        ReturnCode::into_result(rc, ())
    }
}

/// Print callback that forwards AMGX console output to the `log` facade.
///
/// Registered with `AMGX_register_print_callback`; lines are logged at info
/// level under the `amgx` target.
pub unsafe extern "C" fn forward_to_log(msg: *const c_char, length: c_int) {
    if msg.is_null() || length <= 0 {
        return;
    }
    // SAFETY: AMGX passes a buffer of `length` bytes.
    let bytes = unsafe { std::slice::from_raw_parts(msg.cast::<u8>(), length as usize) };
    let text = String::from_utf8_lossy(bytes);
    for line in console_lines(&text) {
        log::info!(target: "amgx", "{}", line);
    }
}

/// Non-blank lines of an AMGX console message, without trailing NULs or whitespace.
fn console_lines(text: &str) -> impl Iterator<Item = &str> {
    text.trim_end_matches('\0')
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
}
