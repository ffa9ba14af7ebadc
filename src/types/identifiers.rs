//! Identifier types for the print farm simulator
//!
//! Jobs and resources are identified by small integers. Jobs are numbered in
//! arrival order starting at zero; printers carry the id from the capability
//! table and workers are numbered from zero within their pool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a job, assigned in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u32);

impl JobId {
    /// Create a job id from its raw number
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The id that follows this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw numeric value
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a single-capacity server (printer or worker) within its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Create a resource id from its raw number
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Printers are addressed by the id given in the capability table
pub type PrinterId = ResourceId;
