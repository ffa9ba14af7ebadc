//! Statistics collection and reporting
//!
//! Counters updated by the engine as jobs move through the shop, plus a
//! snapshot of utilization and accounting totals filled in on demand.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Run-level statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationStatistics {
    // Job flow
    /// Jobs created by the generator, shortages included
    pub jobs_created: usize,
    /// Jobs admitted to the pending list
    pub jobs_admitted: usize,
    /// Jobs delivered
    pub jobs_completed: usize,
    /// Jobs rejected at arrival
    pub shortages: usize,
    /// Jobs still waiting for a printer
    pub jobs_pending: usize,
    /// Jobs owned by a printer or a worker pool
    pub jobs_in_progress: usize,
    /// Sum of arrival-to-delivery latencies in hours
    pub total_latency_hours: f64,

    // Accounting
    /// Sum of the closed daily cost totals
    pub total_cost: f64,
    /// Running satisfaction total
    pub satisfaction_total: f64,
    /// Mean score per scored job, `None` before the first score
    pub satisfaction_mean: Option<f64>,

    // Resources
    /// Mean busy fraction of the printers
    pub printer_utilization: f64,
    /// Mean busy fraction of the post-processing workers
    pub post_processing_utilization: f64,
    /// Mean busy fraction of the packaging workers
    pub packaging_utilization: f64,

    // Simulation metadata
    /// Closed days
    pub days_closed: usize,
    /// Virtual hours advanced
    pub simulated_hours: f64,
    /// Wall-clock duration of the run
    pub simulation_duration: Duration,
}

impl SimulationStatistics {
    /// Empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a created job
    pub fn record_created(&mut self) {
        self.jobs_created += 1;
    }

    /// Count a job entering the pending list
    pub fn record_admitted(&mut self) {
        self.jobs_admitted += 1;
    }

    /// Count a rejected job
    pub fn record_shortage(&mut self) {
        self.shortages += 1;
    }

    /// Count a delivered job
    pub fn record_completed(&mut self, latency: f64) {
        self.jobs_completed += 1;
        self.total_latency_hours += latency;
    }

    /// Set the wall-clock duration of the run
    pub fn set_simulation_duration(&mut self, duration: Duration) {
        self.simulation_duration = duration;
    }

    /// Mean arrival-to-delivery latency of delivered jobs
    pub fn average_latency(&self) -> f64 {
        if self.jobs_completed == 0 {
            return 0.0;
        }
        self.total_latency_hours / self.jobs_completed as f64
    }

    /// Share of created jobs rejected at arrival
    pub fn shortage_percentage(&self) -> f64 {
        if self.jobs_created == 0 {
            return 0.0;
        }
        (self.shortages as f64 / self.jobs_created as f64) * 100.0
    }

    /// Share of admitted jobs delivered
    pub fn completion_percentage(&self) -> f64 {
        if self.jobs_admitted == 0 {
            return 0.0;
        }
        (self.jobs_completed as f64 / self.jobs_admitted as f64) * 100.0
    }

    /// Mean closed daily cost
    pub fn average_daily_cost(&self) -> f64 {
        if self.days_closed == 0 {
            return 0.0;
        }
        self.total_cost / self.days_closed as f64
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} jobs created | {} delivered ({:.1}%) | {} shortages ({:.1}%) | {} pending | avg latency {:.2}h | cost {:.2} | satisfaction {:.2} (mean {:.4})",
            self.jobs_created,
            self.jobs_completed,
            self.completion_percentage(),
            self.shortages,
            self.shortage_percentage(),
            self.jobs_pending,
            self.average_latency(),
            self.total_cost,
            self.satisfaction_total,
            self.satisfaction_mean.unwrap_or(0.0)
        )
    }

    /// Multi-line report printed at the end of a run
    pub fn generate_statistics_output(&self) -> String {
        let mut output = String::new();

        output.push_str("🖨️  Print Farm Simulation Complete!\n");
        output.push_str("==================================\n\n");

        output.push_str("📊 Simulation Summary:\n");
        output.push_str(&format!("   Days Closed: {}\n", self.days_closed));
        output.push_str(&format!("   Simulated Hours: {:.2}\n", self.simulated_hours));
        output.push_str(&format!(
            "   Duration: {:.2} seconds\n\n",
            self.simulation_duration.as_secs_f64()
        ));

        output.push_str("📦 Job Flow:\n");
        output.push_str(&format!("   Jobs Created: {}\n", self.jobs_created));
        output.push_str(&format!(
            "   Delivered: {} ({:.1}% of admitted)\n",
            self.jobs_completed,
            self.completion_percentage()
        ));
        output.push_str(&format!(
            "   Shortages: {} ({:.1}% of created)\n",
            self.shortages,
            self.shortage_percentage()
        ));
        output.push_str(&format!(
            "   Still Pending: {}, In Progress: {}\n",
            self.jobs_pending, self.jobs_in_progress
        ));
        output.push_str(&format!("   Average Latency: {:.2} hours\n\n", self.average_latency()));

        output.push_str("⚙️  Utilization:\n");
        output.push_str(&format!("   Printers: {:.1}%\n", self.printer_utilization * 100.0));
        output.push_str(&format!(
            "   Post-processing: {:.1}%\n",
            self.post_processing_utilization * 100.0
        ));
        output.push_str(&format!("   Packaging: {:.1}%\n\n", self.packaging_utilization * 100.0));

        output.push_str("💰 Accounting:\n");
        output.push_str(&format!("   Total Cost: {:.2}\n", self.total_cost));
        if self.days_closed > 0 {
            output.push_str(&format!("   Daily Average: {:.2}\n", self.average_daily_cost()));
        }
        output.push_str(&format!("   Satisfaction Total: {:.4}\n", self.satisfaction_total));
        if let Some(mean) = self.satisfaction_mean {
            output.push_str(&format!("   Satisfaction Mean: {:.4}\n", mean));
        }
        output.push('\n');

        output.push_str("💡 Summary: ");
        output.push_str(&self.summary());
        output.push('\n');

        output
    }
}

impl fmt::Display for SimulationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
