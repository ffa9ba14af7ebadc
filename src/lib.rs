//! Print Farm Simulator
//!
//! A discrete-event simulation of a make-to-order 3D print job shop. Jobs
//! arrive at random, are matched to printers able to hold them, then pass
//! through post-processing and packaging while the shop accrues daily costs and
//! a latency-derived customer satisfaction score.
//!
//! # Overview
//!
//! The simulation advances a virtual clock measured in hours. Nothing runs in
//! real time and nothing runs in parallel: cooperative tasks (the arrival
//! generator, the hourly dispatcher, the day tracker and one completion per
//! stage hold) are resumed from a time-ordered heap, so a fixed seed always
//! reproduces the same run.
//!
//! ## Key Features
//!
//! - **Capability matching**: a job may only print on printers whose envelope holds it
//! - **Three-stage flow**: printing, post-processing and packaging pools with FIFO overflow
//! - **Pluggable dispatch**: first-idle scan by printer id, or round robin
//! - **Daily cost ledger**: printing, post-processing, packaging, delivery and shortage
//! - **Audit trail**: an event log of every stage transition plus JSON-lines reports
//! - **Control adapter**: observe / step / reset over simulated days
//!
//! ## Quick Start
//!
//! ```rust
//! use print_farm_simulator::*;
//!
//! let config = SimulationConfig {
//!     days: 3,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let mut simulation = Simulation::new(config)?;
//! let statistics = simulation.run();
//!
//! println!("{}", statistics.summary());
//! for day in simulation.ledger().history() {
//!     println!("day {}: {:.2}", day.day, day.total);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Identifiers, enums and configuration
//! - [`job`]: Job model, arrival processes and job generation
//! - [`resources`]: Resource pools and dispatch policies
//! - [`accounting`]: Cost ledger and satisfaction tracker
//! - [`events`]: Event log and run reports
//! - [`simulation`]: Scheduler, engine, control adapter, statistics and logging
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │     Job     │    │  Resources  │
//! │             │    │             │    │             │
//! │ Identifiers │◄───┤ Model       │◄───┤ Pools       │
//! │ Enums       │    │ Generator   │    │ Dispatch    │
//! │ Config      │    │ Arrivals    │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                   ▲                   ▲
//!        │                   │                   │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Accounting  │    │   Events    │    │ Simulation  │
//! │             │    │             │    │             │
//! │ Cost Ledger │◄───┤ Event Log   │◄───┤ Scheduler   │
//! │ Satisfaction│    │ Reports     │    │ Engine      │
//! │             │    │             │    │ Environment │
//! └─────────────┘    └─────────────┘    └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod accounting;
pub mod events;
pub mod job;
pub mod resources;
pub mod simulation;

pub mod types;

// Core types and identifiers
pub use types::{
    CliArgs,
    ConfigError,
    ConfigValidationError,
    CostCategory,
    CostTable,
    DispatchPolicyKind,
    InclusiveRange,
    // Identifiers
    JobId,
    // Enums
    JobStatus,
    PrinterId,
    PrinterSpec,
    ResourceId,
    SatisfactionConstants,
    // Configuration
    SimulationConfig,
    Stage,
};

// Jobs and arrivals
pub use job::{
    ArrivalProcess, Dimensions, Job, JobGenerator, PoissonArrivals, ScriptedArrival,
    ScriptedArrivals,
};

// Resources and dispatch
pub use resources::{
    DispatchPolicy, FirstIdleDispatch, ResourcePool, RoundRobinDispatch,
};

// Accounting
pub use accounting::{CostLedger, DailyCostEntry, SatisfactionTracker};

// Event log and reports
pub use events::{CompletedJobRecord, EventLog, JobLogRecord, LogLine, StageEvent};

// Simulation types and functionality
pub use simulation::{
    ControlAction, ControlEnvironment, LoggingConfig, Simulation, SimulationError,
    SimulationResult, SimulationStatistics, StepOutcome,
};
