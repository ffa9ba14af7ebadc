//! Event log
//!
//! Ordered, human-readable audit trail of a run. Stage lines carry a
//! wall-clock style `<hour>:<minute>` stamp taken from the virtual clock.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::types::{JobId, ResourceId, Stage};

/// Whether a stage hold began or ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageEvent {
    /// The server took the job
    Started,
    /// The hold ended and the job left the server
    Finished,
}

impl StageEvent {
    /// Verb used in the log line for this stage
    pub fn verb(self, stage: Stage) -> &'static str {
        match (self, stage) {
            (StageEvent::Started, Stage::Printing) => "printed",
            (StageEvent::Started, _) => "starting",
            (StageEvent::Finished, _) => "finishing",
        }
    }
}

/// Payload of a log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LogKind {
    /// A job began or ended a stage hold
    Stage {
        /// Job concerned
        job_id: JobId,
        /// Stage of the hold
        stage: Stage,
        /// Start or finish
        event: StageEvent,
        /// Printer or worker
        resource: ResourceId,
    },
    /// A job was rejected at arrival
    Shortage {
        /// Rejected job
        job_id: JobId,
        /// Bounding-box volume of the rejected job
        volume: u64,
    },
    /// Header opening a simulated day
    DayStart {
        /// One-based day number
        day: usize,
    },
}

/// One timestamped entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    /// Virtual time in hours
    pub time: f64,
    /// What happened
    pub kind: LogKind,
}

impl LogLine {
    /// `<hour>:<minute>` within the simulated day
    pub fn clock(&self) -> String {
        let hour = (self.time % 24.0) as u32;
        let minute = ((self.time % 1.0) * 60.0) as u32;
        format!("{}:{:02}", hour, minute)
    }

    /// Stage transition carried by this line, if any
    pub fn stage_transition(&self) -> Option<(JobId, Stage, StageEvent)> {
        match self.kind {
            LogKind::Stage { job_id, stage, event, .. } => Some((job_id, stage, event)),
            _ => None,
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LogKind::Stage { job_id, stage, event, resource } => write!(
                f,
                "{} - Job {} is {} on {} {} ({})",
                self.clock(),
                job_id,
                event.verb(*stage),
                stage.resource_noun(),
                resource,
                stage.log_label()
            ),
            LogKind::Shortage { job_id, volume } => write!(
                f,
                "Job {} could not be assigned: No suitable printer available (Job size: {:.2})",
                job_id, *volume as f64
            ),
            LogKind::DayStart { day } => write!(f, "===== Day {} Report: =====", day),
        }
    }
}

/// Append-only log, optionally cleared at each day boundary
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: Vec<LogLine>,
    retain: bool,
}

impl EventLog {
    /// Create a log; `retain` keeps entries across day boundaries
    pub fn new(retain: bool) -> Self {
        Self { entries: Vec::new(), retain }
    }

    fn push(&mut self, line: LogLine) {
        debug!("{}", line);
        self.entries.push(line);
    }

    /// Record a stage start or finish
    pub fn record_stage(&mut self, time: f64, job_id: JobId, stage: Stage, event: StageEvent, resource: ResourceId) {
        self.push(LogLine { time, kind: LogKind::Stage { job_id, stage, event, resource } });
    }

    /// Record a rejected arrival
    pub fn record_shortage(&mut self, time: f64, job_id: JobId, volume: u64) {
        self.push(LogLine { time, kind: LogKind::Shortage { job_id, volume } });
    }

    /// Record the header of a new day
    pub fn record_day_start(&mut self, time: f64, day: usize) {
        self.push(LogLine { time, kind: LogKind::DayStart { day } });
    }

    /// Clear the log unless it retains the whole run
    pub fn roll_over(&mut self) {
        if !self.retain {
            self.entries.clear();
        }
    }

    /// Entries in append order
    pub fn entries(&self) -> &[LogLine] {
        &self.entries
    }

    /// Rendered lines in append order
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage transitions of one job in log order
    pub fn stage_transitions_for(&self, job_id: JobId) -> Vec<(Stage, StageEvent)> {
        self.entries
            .iter()
            .filter_map(LogLine::stage_transition)
            .filter(|(id, _, _)| *id == job_id)
            .map(|(_, stage, event)| (stage, event))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_line_format() {
        let mut log = EventLog::new(true);
        log.record_stage(26.5, JobId::new(4), Stage::Printing, StageEvent::Started, ResourceId::new(2));
        log.record_stage(3.25, JobId::new(4), Stage::PostProcessing, StageEvent::Started, ResourceId::new(0));
        log.record_stage(13.0, JobId::new(4), Stage::Packaging, StageEvent::Finished, ResourceId::new(1));

        assert_eq!(
            log.lines(),
            vec![
                "2:30 - Job 4 is printed on Printer 2 (Print)",
                "3:15 - Job 4 is starting on Worker 0 (Post-processing)",
                "13:00 - Job 4 is finishing on Worker 1 (Packaging)",
            ]
        );
    }

    #[test]
    fn test_shortage_and_day_lines() {
        let mut log = EventLog::new(true);
        log.record_day_start(0.0, 1);
        log.record_shortage(0.5, JobId::new(7), 12_000_000);

        assert_eq!(log.lines()[0], "===== Day 1 Report: =====");
        assert_eq!(
            log.lines()[1],
            "Job 7 could not be assigned: No suitable printer available (Job size: 12000000.00)"
        );
        assert!(log.stage_transitions_for(JobId::new(7)).is_empty());
    }

    #[test]
    fn test_roll_over_respects_retention() {
        let mut retained = EventLog::new(true);
        retained.record_day_start(0.0, 1);
        retained.roll_over();
        assert_eq!(retained.len(), 1);

        let mut daily = EventLog::new(false);
        daily.record_day_start(0.0, 1);
        daily.roll_over();
        assert!(daily.is_empty());
    }

    #[test]
    fn test_transitions_filtered_by_job() {
        let mut log = EventLog::new(true);
        log.record_stage(0.0, JobId::new(1), Stage::Printing, StageEvent::Started, ResourceId::new(0));
        log.record_stage(0.0, JobId::new(2), Stage::Printing, StageEvent::Started, ResourceId::new(1));
        log.record_stage(2.0, JobId::new(1), Stage::Printing, StageEvent::Finished, ResourceId::new(0));

        assert_eq!(
            log.stage_transitions_for(JobId::new(1)),
            vec![(Stage::Printing, StageEvent::Started), (Stage::Printing, StageEvent::Finished)]
        );
    }
}
