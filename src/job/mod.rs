//! Print jobs and the generator that creates them
//!
//! - **Job model**: bounding box, derived durations, eligible printers, lifecycle
//! - **Generator**: arrival processes and the formulas deriving job attributes

pub mod generator;
pub mod job;

pub use generator::*;
pub use job::*;
