//! Control adapter
//!
//! Wraps a [`Simulation`] as a day-stepped environment for an external
//! controller: observe the shop, apply an action, advance one day, read back
//! the negated daily cost as reward.

use serde::Serialize;
use tracing::{debug, info};

use crate::accounting::DailyCostEntry;
use crate::simulation::{Simulation, SimulationResult};
use crate::types::{DispatchPolicyKind, SimulationConfig};

/// Parameters applied before a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlAction {
    /// Dispatch policy to use from now on; `None` keeps the current one
    pub dispatch_policy: Option<DispatchPolicyKind>,
}

/// Side information returned with each step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    /// One-based day that was stepped
    pub day: usize,
    /// Costs of that day, if its boundary was reached
    pub daily_costs: Option<DailyCostEntry>,
    /// Running satisfaction total
    pub satisfaction_total: f64,
    /// Jobs delivered so far
    pub jobs_completed: usize,
    /// Jobs rejected so far
    pub shortages: usize,
    /// Jobs waiting for a printer
    pub jobs_pending: usize,
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Observation after the step
    pub state: Vec<f64>,
    /// Negated total cost of the stepped day
    pub reward: f64,
    /// Whether the configured number of days has been stepped
    pub done: bool,
    /// Side information
    pub info: StepInfo,
}

/// Day-stepped environment around a simulation
#[derive(Debug)]
pub struct ControlEnvironment {
    config: SimulationConfig,
    simulation: Simulation,
    days_stepped: usize,
}

impl ControlEnvironment {
    /// Build the environment and its first simulation
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        let simulation = Simulation::new(config.clone())?;
        Ok(Self { config, simulation, days_stepped: 0 })
    }

    /// Rebuild the simulation from the stored configuration and return the first observation
    pub fn reset(&mut self) -> SimulationResult<Vec<f64>> {
        info!("Resetting control environment");
        self.simulation = Simulation::new(self.config.clone())?;
        self.days_stepped = 0;
        Ok(self.observe())
    }

    /// Observation vector.
    ///
    /// Layout: busy flag per printer, busy flag per post-processing worker,
    /// busy flag per packaging worker, pending jobs, post-processing queue
    /// length, packaging queue length, jobs created during the last closed day.
    pub fn observe(&self) -> Vec<f64> {
        let sim = &self.simulation;
        let flag = |busy: bool| if busy { 1.0 } else { 0.0 };

        let mut state = Vec::with_capacity(self.observation_len());
        state.extend(sim.printers().busy_flags().into_iter().map(flag));
        state.extend(sim.post_processing().busy_flags().into_iter().map(flag));
        state.extend(sim.packaging().busy_flags().into_iter().map(flag));
        state.push(sim.pending().len() as f64);
        state.push(sim.post_processing().queue_len() as f64);
        state.push(sim.packaging().queue_len() as f64);
        state.push(sim.last_day_demand() as f64);
        state
    }

    /// Length of the observation vector
    pub fn observation_len(&self) -> usize {
        self.config.printers.len()
            + self.config.post_processing_workers
            + self.config.packaging_workers
            + 4
    }

    /// Apply `action` and advance to the next day boundary
    pub fn step(&mut self, action: ControlAction) -> StepOutcome {
        if let Some(kind) = action.dispatch_policy {
            self.simulation.set_dispatch_policy(kind);
        }

        self.simulation.run_day();
        self.days_stepped += 1;

        let day = self.days_stepped;
        let daily_costs =
            self.simulation.ledger().last_closed().filter(|entry| entry.day == day).cloned();
        let reward = daily_costs.as_ref().map_or(0.0, |entry| -entry.total);
        let done = self.days_stepped >= self.config.days;

        debug!("Stepped day {}: reward {:.4}, done {}", day, reward, done);

        StepOutcome {
            state: self.observe(),
            reward,
            done,
            info: StepInfo {
                day,
                daily_costs,
                satisfaction_total: self.simulation.satisfaction().total(),
                jobs_completed: self.simulation.completed_jobs().len(),
                shortages: self.simulation.shortage_jobs().len(),
                jobs_pending: self.simulation.pending().len(),
            },
        }
    }

    /// Days stepped since construction or the last reset
    pub fn days_stepped(&self) -> usize {
        self.days_stepped
    }

    /// The wrapped simulation
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }
}
