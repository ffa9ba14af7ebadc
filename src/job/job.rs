//! Job data model
//!
//! A job is a unit of demand: a bounding box, the per-stage durations derived
//! from it, the printers able to build it and a lifecycle status that only ever
//! moves forward through the stages.

use serde::{Deserialize, Serialize};

use crate::types::{JobId, JobStatus, PrinterId, ResourceId, Stage, HOURS_PER_DAY};

/// Bounding box of a part in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in mm
    pub width: u32,
    /// Height in mm
    pub height: u32,
    /// Depth in mm
    pub depth: u32,
}

impl Dimensions {
    /// Create a bounding box
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    /// width * height * depth
    pub fn volume(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * u64::from(self.depth)
    }

    /// Arithmetic mean of the three axes
    pub fn mean(&self) -> f64 {
        (f64::from(self.width) + f64::from(self.height) + f64::from(self.depth)) / 3.0
    }
}

/// Time a job spent on one server of one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageInterval {
    /// Printer or worker that held the job
    pub resource: ResourceId,
    /// Virtual time the hold began
    pub start: f64,
    /// Virtual time the hold ended, once it has
    pub end: Option<f64>,
}

/// Costs charged against a single job
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JobCosts {
    /// Printing cost
    pub printing: f64,
    /// Post-processing cost
    pub post_processing: f64,
    /// Packaging cost
    pub packaging: f64,
    /// Delivery cost
    pub delivery: f64,
    /// Shortage cost
    pub shortage: f64,
}

impl JobCosts {
    /// Sum over all categories
    pub fn total(&self) -> f64 {
        self.printing + self.post_processing + self.packaging + self.delivery + self.shortage
    }
}

/// A print job moving through the shop
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Arrival-ordered id
    pub id: JobId,
    /// Sampled bounding box
    pub dimensions: Dimensions,
    /// Bounding-box volume in cubic mm
    pub volume: u64,
    /// Virtual time of arrival in hours
    pub create_time: f64,
    /// Printing hold in hours
    pub build_time: u64,
    /// Post-processing hold in hours
    pub post_processing_time: f64,
    /// Packaging hold in minutes
    pub packaging_time: u32,
    /// Printers whose envelope dominates the bounding box, ascending id
    pub eligible_printers: Vec<PrinterId>,
    /// Costs charged so far
    pub costs: JobCosts,
    /// 1 when the job was rejected at arrival
    pub shortage: u8,
    /// Virtual time the job reached a terminal status
    pub completion_time: Option<f64>,
    /// Satisfaction score recorded at completion
    pub satisfaction: Option<f64>,
    status: JobStatus,
    timeline: [Option<StageInterval>; 3],
}

impl Job {
    /// Create a job in the `Created` status
    pub fn new(
        id: JobId,
        dimensions: Dimensions,
        create_time: f64,
        build_time: u64,
        post_processing_time: f64,
        packaging_time: u32,
        eligible_printers: Vec<PrinterId>,
    ) -> Self {
        Self {
            id,
            dimensions,
            volume: dimensions.volume(),
            create_time,
            build_time,
            post_processing_time,
            packaging_time,
            eligible_printers,
            costs: JobCosts::default(),
            shortage: 0,
            completion_time: None,
            satisfaction: None,
            status: JobStatus::Created,
            timeline: [None; 3],
        }
    }

    /// Current lifecycle status
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Move to the next status.
    ///
    /// # Panics
    ///
    /// Panics when `next` is not the legal successor of the current status;
    /// that can only happen if the dispatch or hand-off logic is broken.
    pub fn transition(&mut self, next: JobStatus) {
        assert!(
            self.status.can_transition_to(next),
            "job {} cannot move from {} to {}",
            self.id,
            self.status,
            next
        );
        self.status = next;
    }

    /// Whether the printer is in the job's eligible set
    pub fn is_eligible_for(&self, printer: PrinterId) -> bool {
        self.eligible_printers.contains(&printer)
    }

    /// Whether no printer can build this job
    pub fn has_no_eligible_printer(&self) -> bool {
        self.eligible_printers.is_empty()
    }

    /// Hold duration of a stage in hours; packaging minutes are converted here
    pub fn hold_hours(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Printing => self.build_time as f64,
            Stage::PostProcessing => self.post_processing_time,
            Stage::Packaging => f64::from(self.packaging_time) / 60.0,
        }
    }

    /// One-based simulated day of arrival
    pub fn creation_day(&self) -> usize {
        (self.create_time / HOURS_PER_DAY).floor() as usize + 1
    }

    /// Record the start of a stage hold
    pub fn begin_stage(&mut self, stage: Stage, resource: ResourceId, now: f64) {
        self.timeline[stage_index(stage)] = Some(StageInterval { resource, start: now, end: None });
    }

    /// Record the end of a stage hold
    pub fn end_stage(&mut self, stage: Stage, now: f64) {
        if let Some(interval) = self.timeline[stage_index(stage)].as_mut() {
            interval.end = Some(now);
        }
    }

    /// Interval spent in a stage, if the stage has started
    pub fn interval(&self, stage: Stage) -> Option<&StageInterval> {
        self.timeline[stage_index(stage)].as_ref()
    }

    /// Hours from arrival to completion
    pub fn latency(&self) -> Option<f64> {
        self.completion_time.map(|done| done - self.create_time)
    }
}

fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Printing => 0,
        Stage::PostProcessing => 1,
        Stage::Packaging => 2,
    }
}
