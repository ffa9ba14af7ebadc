//! Cost and satisfaction accounting

pub mod cost;
pub mod satisfaction;

pub use cost::*;
pub use satisfaction::*;
