//! Simulation engine and control
//!
//! This module contains the virtual-time scheduler, the simulation context
//! that runs the shop, the day-stepped control adapter, statistics, error
//! handling and logging setup.
//!
//! # Overview
//!
//! - **Scheduler**: virtual clock and min-heap of suspended tasks
//! - **Simulation**: owns every pool, the ledger, the tracker and the event log
//! - **ControlEnvironment**: observe / step / reset wrapper for external controllers
//! - **SimulationStatistics**: run-level counters and report output
//! - **SimulationError**: errors raised while building or reporting on a run
//!
//! # Usage Example
//!
//! ```rust
//! use print_farm_simulator::simulation::*;
//! use print_farm_simulator::types::*;
//!
//! let config = SimulationConfig {
//!     days: 2,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut simulation = Simulation::new(config).unwrap();
//! let statistics = simulation.run();
//!
//! assert_eq!(statistics.jobs_created, simulation.job_log().len());
//! assert!(!simulation.work_in_flight());
//! ```

pub mod engine;
pub mod environment;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod statistics;

// Re-export all public types for convenience
pub use engine::*;
pub use environment::*;
pub use error::*;
pub use logging::*;
pub use scheduler::*;
pub use statistics::*;
