//! Run reports
//!
//! Completed-job records and the job log, written as JSON lines.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::job::Job;
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{JobId, ResourceId, Stage};

/// Per-stage timeline of a delivered job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedJobRecord {
    /// Delivered job
    pub job_id: JobId,
    /// One-based day the job arrived
    pub day: usize,
    /// Printer that built the job
    pub assigned_printer: ResourceId,
    /// Start of the print
    pub printing_start: f64,
    /// End of the print
    pub printing_finish: f64,
    /// Post-processing worker
    pub postprocess_worker: ResourceId,
    /// Start of post-processing
    pub postprocessing_start: f64,
    /// End of post-processing
    pub postprocessing_finish: f64,
    /// Packaging worker
    pub packaging_worker: ResourceId,
    /// Start of packaging
    pub packaging_start: f64,
    /// End of packaging
    pub packaging_finish: f64,
}

impl CompletedJobRecord {
    /// Build the record of a job that went through all three stages
    pub fn from_job(job: &Job) -> Option<Self> {
        let printing = job.interval(Stage::Printing)?;
        let post_processing = job.interval(Stage::PostProcessing)?;
        let packaging = job.interval(Stage::Packaging)?;

        Some(Self {
            job_id: job.id,
            day: job.creation_day(),
            assigned_printer: printing.resource,
            printing_start: printing.start,
            printing_finish: printing.end?,
            postprocess_worker: post_processing.resource,
            postprocessing_start: post_processing.start,
            postprocessing_finish: post_processing.end?,
            packaging_worker: packaging.resource,
            packaging_start: packaging.start,
            packaging_finish: packaging.end?,
        })
    }
}

/// Attributes of a created job, shortages included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobLogRecord {
    /// One-based day the job arrived
    pub day: usize,
    /// Created job
    pub job_id: JobId,
    /// Width in mm
    pub width: u32,
    /// Height in mm
    pub height: u32,
    /// Depth in mm
    pub depth: u32,
    /// Arrival time in hours
    pub create_time: f64,
    /// Bounding-box volume
    pub volume: u64,
    /// Printing hours
    pub build_time: u64,
    /// Post-processing hours
    pub post_processing_time: f64,
    /// Packaging minutes
    pub packaging_time: u32,
}

impl From<&Job> for JobLogRecord {
    fn from(job: &Job) -> Self {
        Self {
            day: job.creation_day(),
            job_id: job.id,
            width: job.dimensions.width,
            height: job.dimensions.height,
            depth: job.dimensions.depth,
            create_time: job.create_time,
            volume: job.volume,
            build_time: job.build_time,
            post_processing_time: job.post_processing_time,
            packaging_time: job.packaging_time,
        }
    }
}

/// Write `records` to `path`, one JSON object per line
pub fn write_jsonl<T: Serialize, P: AsRef<Path>>(records: &[T], path: P) -> SimulationResult<()> {
    let path = path.as_ref();
    info!("Writing {} records to {}", records.len(), path.display());

    let file = File::create(path).map_err(|e| {
        SimulationError::output_error(format!("Failed to create '{}': {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(file);

    for record in records {
        let line = serde_json::to_string(record)?;
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    Ok(())
}
