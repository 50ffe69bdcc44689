//! Command-line front end for `riskcast_core`
//!
//! Reads a run request (instruments, weights and price or return history),
//! estimates the return model, simulates the portfolio and writes a JSON report.

pub mod logging;
pub mod report;
pub mod request;

pub use logging::init_logging;
pub use report::{DEFAULT_HISTOGRAM_BINS, Report, run};
pub use request::{Overrides, RequestError, RunRequest};
