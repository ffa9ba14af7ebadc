//! Enumeration types for the print farm simulator
//!
//! This module contains the job lifecycle states, the three processing stages,
//! the cost categories tracked by the ledger and the selectable dispatch policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a job
///
/// Legal paths are `Created -> Shortage` and
/// `Created -> Pending -> Printing -> PostProcessing -> Packaging -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Freshly sampled, eligibility not yet decided
    Created,
    /// Waiting in the pending list for an idle eligible printer
    Pending,
    /// Owned by a printer
    Printing,
    /// Owned by the post-processing pool (in service or queued)
    PostProcessing,
    /// Owned by the packaging pool (in service or queued)
    Packaging,
    /// Packaged and delivered
    Done,
    /// Rejected at arrival because no printer can hold it
    Shortage,
}

impl JobStatus {
    /// Whether `next` is the one legal successor of this status
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Created, JobStatus::Shortage)
                | (JobStatus::Created, JobStatus::Pending)
                | (JobStatus::Pending, JobStatus::Printing)
                | (JobStatus::Printing, JobStatus::PostProcessing)
                | (JobStatus::PostProcessing, JobStatus::Packaging)
                | (JobStatus::Packaging, JobStatus::Done)
        )
    }

    /// Terminal statuses never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Shortage)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Created => write!(f, "Created"),
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::Printing => write!(f, "Printing"),
            JobStatus::PostProcessing => write!(f, "Post-processing"),
            JobStatus::Packaging => write!(f, "Packaging"),
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Shortage => write!(f, "Shortage"),
        }
    }
}

/// The three serially ordered processing stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Additive build on a printer
    Printing,
    /// Support removal and finishing by a worker
    PostProcessing,
    /// Boxing and handover to delivery
    Packaging,
}

impl Stage {
    /// All stages in processing order
    pub const ALL: [Stage; 3] = [Stage::Printing, Stage::PostProcessing, Stage::Packaging];

    /// The stage that follows this one, if any
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Printing => Some(Stage::PostProcessing),
            Stage::PostProcessing => Some(Stage::Packaging),
            Stage::Packaging => None,
        }
    }

    /// Job status while a job is owned by this stage
    pub fn status(self) -> JobStatus {
        match self {
            Stage::Printing => JobStatus::Printing,
            Stage::PostProcessing => JobStatus::PostProcessing,
            Stage::Packaging => JobStatus::Packaging,
        }
    }

    /// Noun used for the servers of this stage in the event log
    pub fn resource_noun(self) -> &'static str {
        match self {
            Stage::Printing => "Printer",
            Stage::PostProcessing | Stage::Packaging => "Worker",
        }
    }

    /// Short label used in event log lines
    pub fn log_label(self) -> &'static str {
        match self {
            Stage::Printing => "Print",
            Stage::PostProcessing => "Post-processing",
            Stage::Packaging => "Packaging",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Printing => write!(f, "Printing"),
            Stage::PostProcessing => write!(f, "Post-processing"),
            Stage::Packaging => write!(f, "Packaging"),
        }
    }
}

/// Cost categories accumulated per simulated day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CostCategory {
    /// Material and machine time on the printers
    Printing,
    /// Labour spent post-processing
    PostProcessing,
    /// Packaging material, tiered by volume
    Packaging,
    /// One unit per delivered job
    Delivery,
    /// Penalty for jobs rejected at arrival
    Shortage,
}

impl CostCategory {
    /// All categories in ledger order
    pub const ALL: [CostCategory; 5] = [
        CostCategory::Printing,
        CostCategory::PostProcessing,
        CostCategory::Packaging,
        CostCategory::Delivery,
        CostCategory::Shortage,
    ];
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostCategory::Printing => write!(f, "Printing cost"),
            CostCategory::PostProcessing => write!(f, "Post-processing cost"),
            CostCategory::Packaging => write!(f, "Packaging cost"),
            CostCategory::Delivery => write!(f, "Delivery cost"),
            CostCategory::Shortage => write!(f, "Shortage cost"),
        }
    }
}

/// Which dispatch policy matches pending jobs to printers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicyKind {
    /// Scan printers in ascending id order and take the first idle eligible one
    #[default]
    FirstIdle,
    /// Rotate a shared counter over each job's eligible printer list
    RoundRobin,
}

impl fmt::Display for DispatchPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPolicyKind::FirstIdle => write!(f, "first_idle"),
            DispatchPolicyKind::RoundRobin => write!(f, "round_robin"),
        }
    }
}

impl FromStr for DispatchPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first_idle" | "firstidle" | "first" => Ok(DispatchPolicyKind::FirstIdle),
            "round_robin" | "roundrobin" | "rr" => Ok(DispatchPolicyKind::RoundRobin),
            _ => Err(format!("Unknown dispatch policy: {}", s)),
        }
    }
}
