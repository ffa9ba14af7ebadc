//! Error types and handling
//!
//! This module contains error types for building, running and reporting on a
//! simulation. Broken internal invariants are not represented here: they
//! panic at the point of violation.

use thiserror::Error;

use crate::types::ConfigValidationError;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration could not be turned into a simulation
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigValidationError),

    /// Arrival process could not be built
    #[error("Arrival process error: {0}")]
    ArrivalProcessError(String),

    /// Report output failed
    #[error("Report output failed: {0}")]
    OutputError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an arrival process error
    pub fn arrival_process_error(msg: impl Into<String>) -> Self {
        Self::ArrivalProcessError(msg.into())
    }

    /// Create a report output error
    pub fn output_error(msg: impl Into<String>) -> Self {
        Self::OutputError(msg.into())
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::ConfigurationError(_) => false,
            SimulationError::InvalidConfiguration(_) => false,
            SimulationError::ArrivalProcessError(_) => false,
            SimulationError::OutputError(_) => true,
            SimulationError::IoError(_) => true,
            SimulationError::SerializationError(_) => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::InvalidConfiguration(_) => "Configuration",
            SimulationError::ArrivalProcessError(_) => "Arrival Process",
            SimulationError::OutputError(_) => "Output",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
