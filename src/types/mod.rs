//! Core types and identifiers for the print farm simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: integer ids for jobs, printers and workers
//! - **Enums**: job lifecycle, processing stages, cost categories, dispatch policies
//! - **Configuration**: simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use print_farm_simulator::types::*;
//!
//! let printer = PrinterSpec::new(0, 300, 300, 300);
//! assert!(printer.fits(120, 80, 250));
//!
//! let config = SimulationConfig {
//!     days: 3,
//!     printers: vec![printer],
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert!(JobStatus::Pending.can_transition_to(JobStatus::Printing));
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
