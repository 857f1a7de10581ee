//! A recording stand-in for the AMGX library.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::CStr;
use std::rc::Rc;

use amgx_eval::api::PrintCallback;
use amgx_eval::{AmgxApi, ApiVersion, CallResult, MatrixSize, Mode, ReturnCode, SolveStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Config,
    Resources,
    Solver,
    Matrix,
    Vector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize,
    Finalize,
    RegisterPrintCallback,
    ApiVersion,
    Create(Kind, u32),
    Destroy(Kind, u32),
    ReadSystem,
    MatrixSize,
    Setup,
    Solve,
    Iterations,
    Status,
    /// History index passed to `solver_iteration_residual`.
    Residual(i32),
}

/// Shared view of the calls made on a [`RecordingApi`], usable after the
/// api itself has been moved into a session.
#[derive(Clone)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn residual_queries(&self) -> Vec<i32> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Residual(iteration) => Some(*iteration),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.0.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.count(call) > 0
    }

    pub fn creates(&self) -> Vec<(Kind, u32)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Create(kind, id) => Some((*kind, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn destroys(&self) -> Vec<(Kind, u32)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Destroy(kind, id) => Some((*kind, *id)),
                _ => None,
            })
            .collect()
    }

    /// Every created handle destroyed once, in reverse order, then a single
    /// finalize as the very last call.
    pub fn assert_balanced_teardown(&self) {
        let mut expected = self.creates();
        expected.reverse();
        assert_eq!(self.destroys(), expected, "teardown order");
        assert_eq!(self.count(&Call::Finalize), 1, "finalize count");
        assert_eq!(self.calls().last(), Some(&Call::Finalize), "finalize is last");
    }
}

pub struct RecordingApi {
    log: CallLog,
    failures: HashMap<&'static str, ReturnCode>,
    next_handle: Cell<u32>,
    iterations: i32,
    status: SolveStatus,
    residual: Option<f64>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            log: CallLog(Rc::new(RefCell::new(Vec::new()))),
            failures: HashMap::new(),
            next_handle: Cell::new(1),
            iterations: 12,
            status: SolveStatus::Success,
            residual: Some(3.5e-11),
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Make `operation` (the trait method name) return `code`.
    pub fn failing(mut self, operation: &'static str, code: ReturnCode) -> Self {
        self.failures.insert(operation, code);
        self
    }

    pub fn with_iterations(mut self, iterations: i32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_status(mut self, status: SolveStatus) -> Self {
        self.status = status;
        self
    }

    pub fn without_residual(mut self) -> Self {
        self.residual = None;
        self
    }

    fn record(&self, call: Call) {
        self.log.0.borrow_mut().push(call);
    }

    fn outcome(&self, operation: &str) -> CallResult<()> {
        match self.failures.get(operation) {
            Some(code) => Err(*code),
            None => Ok(()),
        }
    }

    fn create(&self, operation: &str, kind: Kind) -> CallResult<u32> {
        self.outcome(operation)?;
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        self.record(Call::Create(kind, id));
        Ok(id)
    }

    fn destroy(&self, operation: &str, kind: Kind, id: u32) -> CallResult<()> {
        self.record(Call::Destroy(kind, id));
        self.outcome(operation)
    }
}

impl AmgxApi for RecordingApi {
    type Handle = u32;

    fn initialize(&self) -> CallResult<()> {
        self.record(Call::Initialize);
        self.outcome("initialize")
    }

    fn finalize(&self) -> CallResult<()> {
        self.record(Call::Finalize);
        self.outcome("finalize")
    }

    fn register_print_callback(&self, _callback: PrintCallback) -> CallResult<()> {
        self.record(Call::RegisterPrintCallback);
        self.outcome("register_print_callback")
    }

    fn api_version(&self) -> CallResult<ApiVersion> {
        self.record(Call::ApiVersion);
        self.outcome("api_version")?;
        Ok(ApiVersion { major: 2, minor: 4 })
    }

    fn error_string(&self, code: ReturnCode) -> String {
        format!("stubbed failure {}", code)
    }

    fn config_create_from_file(&self, _path: &CStr) -> CallResult<u32> {
        self.create("config_create_from_file", Kind::Config)
    }

    fn config_destroy(&self, config: u32) -> CallResult<()> {
        self.destroy("config_destroy", Kind::Config, config)
    }

    fn resources_create_simple(&self, _config: u32) -> CallResult<u32> {
        self.create("resources_create_simple", Kind::Resources)
    }

    fn resources_destroy(&self, resources: u32) -> CallResult<()> {
        self.destroy("resources_destroy", Kind::Resources, resources)
    }

    fn solver_create(&self, _resources: u32, _mode: Mode, _config: u32) -> CallResult<u32> {
        self.create("solver_create", Kind::Solver)
    }

    fn solver_destroy(&self, solver: u32) -> CallResult<()> {
        self.destroy("solver_destroy", Kind::Solver, solver)
    }

    fn solver_setup(&self, _solver: u32, _matrix: u32) -> CallResult<()> {
        self.record(Call::Setup);
        self.outcome("solver_setup")
    }

    fn solver_solve(&self, _solver: u32, _rhs: u32, _solution: u32) -> CallResult<()> {
        self.record(Call::Solve);
        self.outcome("solver_solve")
    }

    fn solver_iterations(&self, _solver: u32) -> CallResult<i32> {
        self.record(Call::Iterations);
        self.outcome("solver_iterations")?;
        Ok(self.iterations)
    }

    fn solver_status(&self, _solver: u32) -> CallResult<SolveStatus> {
        self.record(Call::Status);
        self.outcome("solver_status")?;
        Ok(self.status)
    }

    fn solver_iteration_residual(&self, _solver: u32, iteration: i32, _block: i32) -> CallResult<f64> {
        self.record(Call::Residual(iteration));
        self.outcome("solver_iteration_residual")?;
        self.residual.ok_or(ReturnCode::BadParameters)
    }

    fn matrix_create(&self, _resources: u32, _mode: Mode) -> CallResult<u32> {
        self.create("matrix_create", Kind::Matrix)
    }

    fn matrix_destroy(&self, matrix: u32) -> CallResult<()> {
        self.destroy("matrix_destroy", Kind::Matrix, matrix)
    }

    fn matrix_size(&self, _matrix: u32) -> CallResult<MatrixSize> {
        self.record(Call::MatrixSize);
        self.outcome("matrix_size")?;
        Ok(MatrixSize {
            rows: 1000,
            block_dimx: 1,
            block_dimy: 1,
        })
    }

    fn vector_create(&self, _resources: u32, _mode: Mode) -> CallResult<u32> {
        self.create("vector_create", Kind::Vector)
    }

    fn vector_destroy(&self, vector: u32) -> CallResult<()> {
        self.destroy("vector_destroy", Kind::Vector, vector)
    }

    fn read_system(&self, _matrix: u32, _rhs: u32, _solution: u32, _path: &CStr) -> CallResult<()> {
        self.record(Call::ReadSystem);
        self.outcome("read_system")
    }
}
