//! Event log and run reports
//!
//! - **EventLog**: timestamped audit trail of stage transitions, shortages and day headers
//! - **CompletedJobRecord**: per-stage timeline of each delivered job
//! - **JobLogRecord**: attributes of every created job

pub mod event_log;
pub mod report;

pub use event_log::*;
pub use report::*;
