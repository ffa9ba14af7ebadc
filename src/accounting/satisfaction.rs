//! Customer satisfaction
//!
//! Completed jobs score `positive / latency`; a job rejected at arrival has
//! zero latency and scores the fixed negative constant. The running total is
//! never reset by day boundaries.

use serde::Serialize;
use tracing::debug;

use crate::types::{JobId, SatisfactionConstants};

/// One scored job
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SatisfactionRecord {
    /// Scored job
    pub job_id: JobId,
    /// Hours from arrival to completion, zero for shortages
    pub latency: f64,
    /// Score added to the total
    pub score: f64,
}

/// Running satisfaction total
#[derive(Debug, Clone)]
pub struct SatisfactionTracker {
    constants: SatisfactionConstants,
    total: f64,
    records: Vec<SatisfactionRecord>,
}

impl SatisfactionTracker {
    /// Tracker starting at zero
    pub fn new(constants: SatisfactionConstants) -> Self {
        Self { constants, total: 0.0, records: Vec::new() }
    }

    /// Score for a given latency
    pub fn score(&self, latency: f64) -> f64 {
        if latency == 0.0 {
            self.constants.negative
        } else {
            self.constants.positive / latency
        }
    }

    /// Score a job completing at `completion_time` and add it to the total
    pub fn record(&mut self, job_id: JobId, create_time: f64, completion_time: f64) -> f64 {
        let latency = completion_time - create_time;
        let score = self.score(latency);
        self.total += score;
        self.records.push(SatisfactionRecord { job_id, latency, score });
        debug!("Job {} satisfaction {:.4} (latency {:.2}h, total {:.4})", job_id, score, latency, self.total);
        score
    }

    /// Running total over all scored jobs
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Scored jobs in completion order
    pub fn records(&self) -> &[SatisfactionRecord] {
        &self.records
    }

    /// Mean score per recorded job
    pub fn mean(&self) -> Option<f64> {
        (!self.records.is_empty()).then(|| self.total / self.records.len() as f64)
    }
}
