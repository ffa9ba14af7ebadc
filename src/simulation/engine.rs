//! Simulation engine
//!
//! [`Simulation`] is the context object of a run. It owns the virtual clock,
//! the random number generator, every resource pool, the pending list, the
//! cost ledger, the satisfaction tracker and the event log, and it resumes
//! four kinds of cooperative tasks:
//!
//! - the day tracker, every 24 hours, closing the previous day's costs
//! - the generator, at each arrival, admitting or rejecting one job
//! - the dispatcher, every hour, matching pending jobs to idle printers
//! - stage completions, one per job per stage, handing the job onward
//!
//! Each resumption runs to completion before the next one starts, so the
//! shared state needs no locking.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::mem;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::accounting::{CostLedger, SatisfactionTracker};
use crate::events::{CompletedJobRecord, EventLog, JobLogRecord, StageEvent};
use crate::job::{ArrivalProcess, Job, JobGenerator, PoissonArrivals};
use crate::resources::{policy_for, DispatchPolicy, ResourcePool};
use crate::simulation::{Scheduler, SimulationError, SimulationResult, SimulationStatistics};
use crate::types::{
    CostCategory, DispatchPolicyKind, JobStatus, SimulationConfig, Stage, DISPATCH_TICK_HOURS,
    HOURS_PER_DAY,
};

/// A suspended cooperative task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    TrackDay,
    GenerateJob,
    Dispatch,
    Complete { stage: Stage, server: usize },
}

/// The three stage pools
#[derive(Debug, Clone)]
struct StagePools {
    printers: ResourcePool,
    post_processing: ResourcePool,
    packaging: ResourcePool,
}

impl StagePools {
    fn get(&self, stage: Stage) -> &ResourcePool {
        match stage {
            Stage::Printing => &self.printers,
            Stage::PostProcessing => &self.post_processing,
            Stage::Packaging => &self.packaging,
        }
    }

    fn get_mut(&mut self, stage: Stage) -> &mut ResourcePool {
        match stage {
            Stage::Printing => &mut self.printers,
            Stage::PostProcessing => &mut self.post_processing,
            Stage::Packaging => &mut self.packaging,
        }
    }
}

/// Simulation context
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    scheduler: Scheduler<Task>,
    rng: StdRng,
    arrivals: Box<dyn ArrivalProcess>,
    generator: JobGenerator,
    dispatch_policy: Box<dyn DispatchPolicy>,
    pending: Vec<Job>,
    pools: StagePools,
    ledger: CostLedger,
    satisfaction: SatisfactionTracker,
    event_log: EventLog,
    completed: Vec<Job>,
    shortages: Vec<Job>,
    job_log: Vec<JobLogRecord>,
    statistics: SimulationStatistics,
    created_today: usize,
    last_day_demand: usize,
}

impl Simulation {
    /// Build a simulation with exponential arrivals drawn from the configuration
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        let arrivals = PoissonArrivals::from_config(&config)?;
        Self::with_arrivals(config, Box::new(arrivals))
    }

    /// Build a simulation driven by a custom arrival process
    #[instrument(skip(config, arrivals), fields(days = config.days, printers = config.printers.len()))]
    pub fn with_arrivals(
        config: SimulationConfig,
        arrivals: Box<dyn ArrivalProcess>,
    ) -> SimulationResult<Self> {
        config.validate()?;
        let first_arrival = arrivals.first_arrival();
        if !first_arrival.is_finite() || first_arrival < 0.0 {
            return Err(SimulationError::arrival_process_error(format!(
                "first arrival must be a non-negative finite time, got {}",
                first_arrival
            )));
        }

        let rng = if let Some(seed) = config.seed {
            info!("Using deterministic seed: {}", seed);
            StdRng::seed_from_u64(seed)
        } else {
            debug!("Using entropy-based random seed");
            StdRng::from_entropy()
        };

        let pools = StagePools {
            printers: ResourcePool::printers(&config.printers),
            post_processing: ResourcePool::workers(
                Stage::PostProcessing,
                config.post_processing_workers,
            ),
            packaging: ResourcePool::workers(Stage::Packaging, config.packaging_workers),
        };

        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(0.0, Task::TrackDay);
        scheduler.schedule_at(first_arrival, Task::GenerateJob);
        scheduler.schedule_at(0.0, Task::Dispatch);

        info!(
            "Simulation initialized: {} printers, {} post-processing workers, {} packaging workers, {} dispatch",
            pools.printers.len(),
            pools.post_processing.len(),
            pools.packaging.len(),
            config.dispatch_policy
        );

        Ok(Self {
            scheduler,
            rng,
            generator: JobGenerator::new(&config),
            dispatch_policy: policy_for(config.dispatch_policy),
            arrivals,
            pending: Vec::new(),
            pools,
            ledger: CostLedger::new(),
            satisfaction: SatisfactionTracker::new(config.satisfaction),
            event_log: EventLog::new(config.retain_event_log),
            completed: Vec::new(),
            shortages: Vec::new(),
            job_log: Vec::new(),
            statistics: SimulationStatistics::new(),
            created_today: 0,
            last_day_demand: 0,
            config,
        })
    }

    /// Resume every task due at the earliest wake time; false once nothing is scheduled
    pub fn step(&mut self) -> bool {
        let Some((now, tasks)) = self.scheduler.pop_due() else {
            return false;
        };
        for task in tasks {
            self.resume(task, now);
        }
        true
    }

    /// Run every task due at or before `limit`, then move the clock to `limit`
    pub fn run_until(&mut self, limit: f64) {
        while self.scheduler.peek_time().is_some_and(|time| time <= limit) {
            self.step();
        }
        if limit.is_finite() {
            self.scheduler.advance_to(limit);
        }
    }

    /// Run up to and including the next day boundary
    pub fn run_day(&mut self) {
        let boundary = ((self.now() / HOURS_PER_DAY).floor() + 1.0) * HOURS_PER_DAY;
        self.run_until(boundary);
    }

    /// Run the horizon and drain every admitted job
    #[instrument(skip(self), fields(days = self.config.days))]
    pub fn run(&mut self) -> SimulationStatistics {
        let started = Instant::now();
        info!("Running {} simulated days", self.config.days);

        while self.step() {}

        self.statistics.set_simulation_duration(started.elapsed());
        let statistics = self.statistics();
        info!("Simulation finished at {:.2}h: {}", self.now(), statistics.summary());
        statistics
    }

    fn resume(&mut self, task: Task, now: f64) {
        match task {
            Task::TrackDay => self.track_day(now),
            Task::GenerateJob => self.generate_job(now),
            Task::Dispatch => self.dispatch(now),
            Task::Complete { stage, server } => self.complete(stage, server, now),
        }
    }

    fn track_day(&mut self, now: f64) {
        let day = (now / HOURS_PER_DAY).round() as usize;
        if day > 0 {
            let total = self.ledger.close_day(day).total;
            self.last_day_demand = mem::take(&mut self.created_today);
            crate::sim_event!(
                info,
                "Day closed",
                day = day,
                total_cost = total,
                demand = self.last_day_demand,
                satisfaction = self.satisfaction.total()
            );
        }

        if now < self.config.horizon_hours() || self.work_in_flight() {
            self.event_log.roll_over();
            self.event_log.record_day_start(now, day + 1);
            info!("===== Day {} Report: =====", day + 1);
            self.scheduler.schedule_in(HOURS_PER_DAY, Task::TrackDay);
        } else {
            debug!("Day tracker stopped at {:.2}h", now);
        }
    }

    fn generate_job(&mut self, now: f64) {
        if now >= self.config.horizon_hours() {
            debug!("Generator stopped at horizon ({:.2}h)", now);
            return;
        }
        let Some(dimensions) = self.arrivals.sample_dimensions(&mut self.rng) else {
            debug!("Arrival process exhausted at {:.2}h", now);
            return;
        };

        let mut job = self.generator.create_job(dimensions, now, &mut self.rng);
        self.job_log.push(JobLogRecord::from(&job));
        self.statistics.record_created();
        self.created_today += 1;

        if job.has_no_eligible_printer() {
            self.reject(job, now);
        } else {
            job.transition(JobStatus::Pending);
            self.statistics.record_admitted();
            self.pending.push(job);
        }

        match self.arrivals.next_interarrival(&mut self.rng) {
            Some(delay) if delay.is_finite() && delay >= 0.0 => {
                self.scheduler.schedule_in(delay, Task::GenerateJob);
            }
            Some(delay) => {
                warn!("Arrival process returned gap {} at {:.2}h, no further arrivals", delay, now);
            }
            None => {}
        }
    }

    fn reject(&mut self, mut job: Job, now: f64) {
        job.transition(JobStatus::Shortage);
        job.shortage = 1;

        let cost = self.config.costs.shortage_cost(job.shortage);
        job.costs.shortage += cost;
        self.ledger.accrue(CostCategory::Shortage, cost);
        self.event_log.record_shortage(now, job.id, job.volume);

        job.completion_time = Some(now);
        job.satisfaction = Some(self.satisfaction.record(job.id, job.create_time, now));

        self.statistics.record_shortage();
        self.shortages.push(job);
    }

    fn dispatch(&mut self, now: f64) {
        let snapshot = mem::take(&mut self.pending);
        let mut still_pending = Vec::with_capacity(snapshot.len());

        for mut job in snapshot {
            match self.dispatch_policy.select(&job, &self.pools.printers) {
                Some(index) => {
                    job.transition(JobStatus::Printing);
                    self.start_hold(Stage::Printing, index, job, now);
                }
                None => still_pending.push(job),
            }
        }
        self.pending = still_pending;

        if now < self.config.horizon_hours() || !self.pending.is_empty() {
            self.scheduler.schedule_in(DISPATCH_TICK_HOURS, Task::Dispatch);
        } else {
            debug!("Dispatcher stopped at {:.2}h", now);
        }
    }

    /// Put `job` on server `index` of `stage` and schedule its completion
    fn start_hold(&mut self, stage: Stage, index: usize, mut job: Job, now: f64) {
        if stage == Stage::Printing {
            let cost = self.config.costs.printing_cost(job.volume, job.build_time);
            job.costs.printing += cost;
            self.ledger.accrue(CostCategory::Printing, cost);
        }

        let pool = self.pools.get_mut(stage);
        let Some(resource) = pool.server(index).map(|server| server.id()) else {
            panic!("{} index {} out of range", stage, index);
        };
        job.begin_stage(stage, resource, now);
        self.event_log.record_stage(now, job.id, stage, StageEvent::Started, resource);

        let hold = job.hold_hours(stage);
        pool.acquire(index, job, now);
        self.scheduler.schedule_in(hold, Task::Complete { stage, server: index });
    }

    /// Hand a job to a worker pool: start it on an idle worker or queue it
    fn assign(&mut self, stage: Stage, mut job: Job, now: f64) {
        job.transition(stage.status());
        let pool = self.pools.get_mut(stage);
        match pool.first_idle_eligible(&job) {
            Some(index) => self.start_hold(stage, index, job, now),
            None => {
                debug!("Job {} queued for {} ({} waiting)", job.id, stage, pool.queue_len() + 1);
                pool.enqueue(job);
            }
        }
    }

    fn complete(&mut self, stage: Stage, index: usize, now: f64) {
        let pool = self.pools.get_mut(stage);
        let mut job = pool.release(index, now);
        let resource = pool.servers()[index].id();
        job.end_stage(stage, now);
        self.event_log.record_stage(now, job.id, stage, StageEvent::Finished, resource);

        match stage {
            Stage::Printing => self.assign(Stage::PostProcessing, job, now),
            Stage::PostProcessing => {
                let cost = self.config.costs.post_processing_cost(job.post_processing_time);
                job.costs.post_processing += cost;
                self.ledger.accrue(CostCategory::PostProcessing, cost);
                self.assign(Stage::Packaging, job, now);
                self.pull_next(stage, index, now);
            }
            Stage::Packaging => {
                self.deliver(job, now);
                self.pull_next(stage, index, now);
            }
        }
    }

    fn pull_next(&mut self, stage: Stage, index: usize, now: f64) {
        if let Some(job) = self.pools.get_mut(stage).pop_queued() {
            self.start_hold(stage, index, job, now);
        }
    }

    fn deliver(&mut self, mut job: Job, now: f64) {
        let packaging = self.config.costs.packaging_cost(job.volume);
        job.costs.packaging += packaging;
        self.ledger.accrue(CostCategory::Packaging, packaging);
        job.costs.delivery += 1.0;
        self.ledger.accrue(CostCategory::Delivery, 1.0);

        job.completion_time = Some(now);
        let score = self.satisfaction.record(job.id, job.create_time, now);
        job.satisfaction = Some(score);
        job.transition(JobStatus::Done);

        self.statistics.record_completed(now - job.create_time);
        self.completed.push(job);
    }

    /// Whether any admitted job is not yet delivered
    pub fn work_in_flight(&self) -> bool {
        !self.pending.is_empty() || Stage::ALL.iter().any(|&stage| self.pools.get(stage).in_flight() > 0)
    }

    /// Whether no task remains scheduled
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// Current virtual time in hours
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// Configuration snapshot the simulation was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Active dispatch policy
    pub fn dispatch_policy(&self) -> DispatchPolicyKind {
        self.dispatch_policy.kind()
    }

    /// Replace the dispatch policy from the next dispatcher tick on
    pub fn set_dispatch_policy(&mut self, kind: DispatchPolicyKind) {
        if kind != self.dispatch_policy.kind() {
            info!("Dispatch policy changed from {} to {}", self.dispatch_policy.kind(), kind);
            self.dispatch_policy = policy_for(kind);
        }
    }

    /// Jobs waiting for a printer, in arrival order
    pub fn pending(&self) -> &[Job] {
        &self.pending
    }

    /// Pool of one stage
    pub fn pool(&self, stage: Stage) -> &ResourcePool {
        self.pools.get(stage)
    }

    /// Printer pool
    pub fn printers(&self) -> &ResourcePool {
        &self.pools.printers
    }

    /// Post-processing pool
    pub fn post_processing(&self) -> &ResourcePool {
        &self.pools.post_processing
    }

    /// Packaging pool
    pub fn packaging(&self) -> &ResourcePool {
        &self.pools.packaging
    }

    /// Cost ledger
    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    /// Satisfaction tracker
    pub fn satisfaction(&self) -> &SatisfactionTracker {
        &self.satisfaction
    }

    /// Event log
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Delivered jobs in completion order
    pub fn completed_jobs(&self) -> &[Job] {
        &self.completed
    }

    /// Jobs rejected at arrival
    pub fn shortage_jobs(&self) -> &[Job] {
        &self.shortages
    }

    /// Per-stage timelines of delivered jobs
    pub fn completed_records(&self) -> Vec<CompletedJobRecord> {
        self.completed.iter().filter_map(CompletedJobRecord::from_job).collect()
    }

    /// Every created job, shortages included
    pub fn job_log(&self) -> &[JobLogRecord] {
        &self.job_log
    }

    /// Jobs created during the most recently closed day
    pub fn last_day_demand(&self) -> usize {
        self.last_day_demand
    }

    /// Statistics snapshot
    pub fn statistics(&self) -> SimulationStatistics {
        let now = self.now();
        let mut statistics = self.statistics.clone();
        statistics.jobs_pending = self.pending.len();
        statistics.jobs_in_progress =
            Stage::ALL.iter().map(|&stage| self.pools.get(stage).in_flight()).sum();
        statistics.total_cost = self.ledger.cumulative_total();
        statistics.satisfaction_total = self.satisfaction.total();
        statistics.satisfaction_mean = self.satisfaction.mean();
        statistics.printer_utilization = self.pools.printers.utilization(now);
        statistics.post_processing_utilization = self.pools.post_processing.utilization(now);
        statistics.packaging_utilization = self.pools.packaging.utilization(now);
        statistics.days_closed = self.ledger.history().len();
        statistics.simulated_hours = now;
        statistics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Dimensions, ScriptedArrival, ScriptedArrivals};
    use crate::types::{CostTable, JobId, PrinterSpec, ResourceId};

    fn single_printer_config() -> SimulationConfig {
        SimulationConfig {
            days: 1,
            seed: Some(1),
            printers: vec![PrinterSpec::new(0, 300, 300, 300)],
            post_processing_workers: 1,
            packaging_workers: 1,
            small_packaging_minutes: crate::types::InclusiveRange::new(30, 30),
            large_packaging_minutes: crate::types::InclusiveRange::new(30, 30),
            ..Default::default()
        }
    }

    fn scripted(config: SimulationConfig, arrivals: &[(f64, Dimensions)]) -> Simulation {
        let arrivals = arrivals.iter().map(|&(at, dims)| ScriptedArrival::new(at, dims)).collect();
        Simulation::with_arrivals(config, Box::new(ScriptedArrivals::new(arrivals))).unwrap()
    }

    #[test]
    fn test_invalid_configuration_fails_fast() {
        let config = SimulationConfig { post_processing_workers: 0, ..Default::default() };
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_unbounded_first_arrival_rejected() {
        let arrivals = ScriptedArrivals::new(vec![ScriptedArrival::new(
            f64::INFINITY,
            Dimensions::new(10, 10, 10),
        )]);
        let result = Simulation::with_arrivals(single_printer_config(), Box::new(arrivals));
        assert!(matches!(result, Err(SimulationError::ArrivalProcessError(_))));
    }

    #[test]
    fn test_negative_first_arrival_rejected() {
        for at in [-5.0, f64::NAN] {
            let arrivals =
                ScriptedArrivals::new(vec![ScriptedArrival::new(at, Dimensions::new(10, 10, 10))]);
            let result = Simulation::with_arrivals(single_printer_config(), Box::new(arrivals));
            assert!(matches!(result, Err(SimulationError::ArrivalProcessError(_))), "at {}", at);
        }
    }

    /// Emits one job per call and then a fixed, possibly invalid, gap
    #[derive(Debug)]
    struct FixedGapArrivals {
        gap: f64,
        remaining: usize,
    }

    impl ArrivalProcess for FixedGapArrivals {
        fn sample_dimensions(&mut self, _rng: &mut StdRng) -> Option<Dimensions> {
            self.remaining = self.remaining.checked_sub(1)?;
            Some(Dimensions::new(100, 100, 100))
        }

        fn next_interarrival(&mut self, _rng: &mut StdRng) -> Option<f64> {
            Some(self.gap)
        }
    }

    #[test]
    fn test_invalid_gap_ends_arrivals() {
        for gap in [-1.0, f64::NAN, f64::INFINITY] {
            let arrivals = FixedGapArrivals { gap, remaining: 5 };
            let mut sim = Simulation::with_arrivals(single_printer_config(), Box::new(arrivals)).unwrap();
            sim.run();

            assert_eq!(sim.job_log().len(), 1, "gap {}", gap);
            assert_eq!(sim.completed_jobs().len(), 1, "gap {}", gap);
            assert!(!sim.work_in_flight());
        }
    }

    #[test]
    fn test_valid_gap_keeps_arrivals_going() {
        let arrivals = FixedGapArrivals { gap: 3.0, remaining: 3 };
        let mut sim = Simulation::with_arrivals(single_printer_config(), Box::new(arrivals)).unwrap();
        sim.run();

        let times: Vec<f64> = sim.job_log().iter().map(|record| record.create_time).collect();
        assert_eq!(times, vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn test_job_at_time_zero_is_dispatched_at_time_zero() {
        let mut sim = scripted(single_printer_config(), &[(0.0, Dimensions::new(100, 100, 100))]);
        sim.run_until(0.0);

        assert!(sim.pending().is_empty());
        assert!(!sim.printers().is_idle(0));
        assert_eq!(sim.event_log().lines()[1], "0:00 - Job 0 is printed on Printer 0 (Print)");
    }

    #[test]
    fn test_job_flows_through_every_stage() {
        // 100^3 mm: build 2h, post-processing 2h, packaging 30 min
        let mut sim = scripted(single_printer_config(), &[(0.0, Dimensions::new(100, 100, 100))]);
        sim.run();

        let job = &sim.completed_jobs()[0];
        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.completion_time, Some(4.5));
        assert_eq!(job.satisfaction, Some(100.0 / 4.5));
        assert_eq!(
            sim.event_log().stage_transitions_for(JobId::new(0)),
            vec![
                (Stage::Printing, StageEvent::Started),
                (Stage::Printing, StageEvent::Finished),
                (Stage::PostProcessing, StageEvent::Started),
                (Stage::PostProcessing, StageEvent::Finished),
                (Stage::Packaging, StageEvent::Started),
                (Stage::Packaging, StageEvent::Finished),
            ]
        );
        assert!(sim.is_finished());
        assert!(!sim.work_in_flight());
    }

    #[test]
    fn test_worker_pulls_queued_job_on_completion() {
        let config = single_printer_config();
        let config = SimulationConfig {
            printers: vec![PrinterSpec::new(0, 300, 300, 300), PrinterSpec::new(1, 300, 300, 300)],
            ..config
        };
        let dims = Dimensions::new(100, 100, 100);
        let mut sim = scripted(config, &[(0.0, dims), (0.0, dims)]);
        sim.run();

        let second = sim.completed_jobs().iter().find(|job| job.id == JobId::new(1)).unwrap();
        let post = second.interval(Stage::PostProcessing).unwrap();
        // Job 1 is dispatched on the 1h tick and prints until 3h, then waits for job 0 to leave at 4h
        assert_eq!(post.start, 4.0);
        assert_eq!(post.resource, ResourceId::new(0));
    }

    #[test]
    fn test_shortage_is_costed_and_scored() {
        let config = SimulationConfig {
            costs: CostTable { shortage: 7.0, ..Default::default() },
            ..single_printer_config()
        };
        let mut sim = scripted(config, &[(0.5, Dimensions::new(400, 10, 10))]);
        sim.run_until(1.0);

        let job = &sim.shortage_jobs()[0];
        assert_eq!(job.shortage, 1);
        assert_eq!(job.status(), JobStatus::Shortage);
        assert_eq!(job.completion_time, Some(job.create_time));
        assert_eq!(job.satisfaction, Some(-10.0));
        assert_eq!(sim.ledger().current(CostCategory::Shortage), 7.0);
        assert!(sim.pending().is_empty());
    }

    #[test]
    fn test_day_boundary_closes_ledger() {
        let mut sim = scripted(single_printer_config(), &[(0.0, Dimensions::new(100, 100, 100))]);
        sim.run_day();

        assert_eq!(sim.now(), 24.0);
        let entry = sim.ledger().last_closed().unwrap();
        assert_eq!(entry.day, 1);
        assert_eq!(entry.amount(CostCategory::Delivery), 1.0);
        assert_eq!(sim.ledger().daily_total(), 0.0);
        assert_eq!(sim.last_day_demand(), 1);
    }

    #[test]
    fn test_switching_dispatch_policy() {
        let mut sim = Simulation::new(SimulationConfig { seed: Some(3), ..Default::default() }).unwrap();
        assert_eq!(sim.dispatch_policy(), DispatchPolicyKind::FirstIdle);
        sim.set_dispatch_policy(DispatchPolicyKind::RoundRobin);
        assert_eq!(sim.dispatch_policy(), DispatchPolicyKind::RoundRobin);
    }
}
