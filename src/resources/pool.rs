//! Resource pools
//!
//! One pool type serves all three stages. A server is busy exactly when it
//! holds a job; printers restrict which jobs they accept through their
//! capability, workers accept anything. Jobs that find no idle server wait in
//! the pool's FIFO queue (workers) or in the dispatcher's pending list
//! (printers).

use std::collections::VecDeque;
use tracing::trace;

use crate::job::Job;
use crate::types::{PrinterSpec, ResourceId, Stage};

/// What a server is able to process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Accepts any job
    Unrestricted,
    /// Accepts jobs whose eligible set names this printer
    Envelope(PrinterSpec),
}

/// A printer or worker slot
#[derive(Debug, Clone)]
pub struct Server {
    id: ResourceId,
    capability: Capability,
    job: Option<Job>,
    busy_since: Option<f64>,
    busy_hours: f64,
    jobs_served: u32,
}

impl Server {
    fn new(id: ResourceId, capability: Capability) -> Self {
        Self { id, capability, job: None, busy_since: None, busy_hours: 0.0, jobs_served: 0 }
    }

    /// Server id
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Whether the server holds a job
    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// The job in service, if any
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Whether this server may process `job`
    pub fn can_serve(&self, job: &Job) -> bool {
        match self.capability {
            Capability::Unrestricted => true,
            Capability::Envelope(spec) => job.is_eligible_for(spec.id),
        }
    }

    /// Completed holds
    pub fn jobs_served(&self) -> u32 {
        self.jobs_served
    }

    /// Hours spent busy up to `now`, including an open hold
    pub fn busy_hours(&self, now: f64) -> f64 {
        self.busy_hours + self.busy_since.map_or(0.0, |since| (now - since).max(0.0))
    }
}

/// Homogeneous set of servers for one stage plus its overflow queue
#[derive(Debug, Clone)]
pub struct ResourcePool {
    stage: Stage,
    servers: Vec<Server>,
    queue: VecDeque<Job>,
}

impl ResourcePool {
    /// Printer pool, ordered by ascending printer id
    pub fn printers(specs: &[PrinterSpec]) -> Self {
        let mut specs = specs.to_vec();
        specs.sort_by_key(|spec| spec.id);
        let servers = specs
            .into_iter()
            .map(|spec| Server::new(spec.id, Capability::Envelope(spec)))
            .collect();
        Self { stage: Stage::Printing, servers, queue: VecDeque::new() }
    }

    /// Worker pool of `count` interchangeable workers with ids `0..count`
    pub fn workers(stage: Stage, count: usize) -> Self {
        let servers = (0..count)
            .map(|index| Server::new(ResourceId::new(index as u32), Capability::Unrestricted))
            .collect();
        Self { stage, servers, queue: VecDeque::new() }
    }

    /// Stage served by this pool
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Number of servers
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether the pool has no servers
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// All servers in scan order
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Server at `index`
    pub fn server(&self, index: usize) -> Option<&Server> {
        self.servers.get(index)
    }

    /// Index of the server with the given id
    pub fn index_of(&self, id: ResourceId) -> Option<usize> {
        self.servers.iter().position(|server| server.id == id)
    }

    /// Whether the server at `index` is idle
    pub fn is_idle(&self, index: usize) -> bool {
        self.servers.get(index).is_some_and(|server| !server.is_busy())
    }

    /// Busy flag per server in scan order
    pub fn busy_flags(&self) -> Vec<bool> {
        self.servers.iter().map(Server::is_busy).collect()
    }

    /// Number of busy servers
    pub fn busy_count(&self) -> usize {
        self.servers.iter().filter(|server| server.is_busy()).count()
    }

    /// Number of idle servers
    pub fn idle_count(&self) -> usize {
        self.len() - self.busy_count()
    }

    /// Jobs waiting in the overflow queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Jobs owned by the pool, in service or queued
    pub fn in_flight(&self) -> usize {
        self.busy_count() + self.queue_len()
    }

    /// Jobs currently in service
    pub fn jobs_in_service(&self) -> impl Iterator<Item = &Job> {
        self.servers.iter().filter_map(Server::job)
    }

    /// Jobs waiting in the overflow queue, oldest first
    pub fn queued(&self) -> impl Iterator<Item = &Job> {
        self.queue.iter()
    }

    /// Lowest-index idle server able to process `job`
    pub fn first_idle_eligible(&self, job: &Job) -> Option<usize> {
        self.servers.iter().position(|server| !server.is_busy() && server.can_serve(job))
    }

    /// Put `job` on the server at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the server is busy or cannot process the job.
    pub fn acquire(&mut self, index: usize, job: Job, now: f64) -> ResourceId {
        let server = &mut self.servers[index];
        assert!(
            !server.is_busy(),
            "{} {} ({}) acquired while holding a job",
            self.stage.resource_noun(),
            server.id,
            self.stage
        );
        assert!(
            server.can_serve(&job),
            "job {} is not eligible for {} {}",
            job.id,
            self.stage.resource_noun(),
            server.id
        );

        trace!("{} {} ({}) acquired job {}", self.stage.resource_noun(), server.id, self.stage, job.id);
        server.job = Some(job);
        server.busy_since = Some(now);
        server.id
    }

    /// Take the job off the server at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the server is idle.
    pub fn release(&mut self, index: usize, now: f64) -> Job {
        let stage = self.stage;
        let server = &mut self.servers[index];
        let Some(job) = server.job.take() else {
            panic!("{} {} ({}) released while idle", stage.resource_noun(), server.id, stage);
        };

        if let Some(since) = server.busy_since.take() {
            server.busy_hours += (now - since).max(0.0);
        }
        server.jobs_served += 1;
        trace!("{} {} ({}) released job {}", stage.resource_noun(), server.id, stage, job.id);
        job
    }

    /// Append to the overflow queue
    pub fn enqueue(&mut self, job: Job) {
        self.queue.push_back(job);
    }

    /// Oldest queued job
    pub fn pop_queued(&mut self) -> Option<Job> {
        self.queue.pop_front()
    }

    /// Mean busy fraction of the servers over `[0, now]`
    pub fn utilization(&self, now: f64) -> f64 {
        if now <= 0.0 || self.servers.is_empty() {
            return 0.0;
        }
        let busy: f64 = self.servers.iter().map(|server| server.busy_hours(now)).sum();
        busy / (now * self.servers.len() as f64)
    }
}
