pub mod log;
pub mod severity;
pub mod systime;

pub use log::{enabled, log, set_min_severity};
pub use severity::LogSeverity;
