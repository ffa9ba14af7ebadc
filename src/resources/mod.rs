//! Printers, workers and dispatch
//!
//! - **ResourcePool**: servers of one stage with an overflow queue
//! - **DispatchPolicy**: how pending jobs are matched to idle printers

pub mod dispatch;
pub mod pool;

pub use dispatch::*;
pub use pool::*;
