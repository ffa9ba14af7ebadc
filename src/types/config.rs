//! Configuration structures for the print farm simulator
//!
//! This module contains the simulation configuration, its command line and
//! file front-ends, and the validation that rejects malformed shops before a
//! simulation is constructed.

use super::{DispatchPolicyKind, PrinterId, ResourceId};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Hours in one simulated day
pub const HOURS_PER_DAY: f64 = 24.0;

/// Period of the dispatcher in simulated hours
pub const DISPATCH_TICK_HOURS: f64 = 1.0;

/// Inclusive integer range used for sampled dimensions (mm) and packaging times (minutes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusiveRange {
    /// Smallest value that can be drawn
    pub min: u32,
    /// Largest value that can be drawn
    pub max: u32,
}

impl InclusiveRange {
    /// Create a range, bounds included
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// True when `min <= max`
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    /// Whether `value` lies within the range
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// One printer of the capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSpec {
    /// Printer id; printers are scanned in ascending id order
    pub id: PrinterId,
    /// Maximum build width in mm
    pub width: u32,
    /// Maximum build height in mm
    pub height: u32,
    /// Maximum build depth in mm
    pub depth: u32,
}

impl PrinterSpec {
    /// Create a printer with the given envelope
    pub fn new(id: u32, width: u32, height: u32, depth: u32) -> Self {
        Self { id: ResourceId::new(id), width, height, depth }
    }

    /// Whether a part of the given size fits the envelope on every axis
    pub fn fits(&self, width: u32, height: u32, depth: u32) -> bool {
        width <= self.width && height <= self.height && depth <= self.depth
    }
}

/// Unit costs per category plus the packaging tier threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    /// Cost per unit of (volume + build time)
    pub printing: f64,
    /// Cost per post-processing hour
    pub post_processing: f64,
    /// Packaging cost per job, doubled above the threshold
    pub packaging: f64,
    /// Cost per job rejected for shortage
    pub shortage: f64,
    /// Volume at or above which packaging is charged twice
    pub packaging_cost_threshold: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            printing: 0.00001,
            post_processing: 5.0,
            packaging: 2.0,
            shortage: 50.0,
            packaging_cost_threshold: 25.0,
        }
    }
}

/// Constants of the satisfaction score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionConstants {
    /// Numerator of the latency-derived score
    pub positive: f64,
    /// Fixed score for a job rejected at arrival
    pub negative: f64,
}

impl Default for SatisfactionConstants {
    fn default() -> Self {
        Self { positive: 100.0, negative: -10.0 }
    }
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "print-farm-simulator",
    version = "0.1.0",
    about = "Print Farm Simulator - Discrete-event simulation of a 3D print job shop",
    long_about = "Routes stochastically arriving print jobs through printing, post-processing and packaging stages, tracking daily costs and a latency-derived customer satisfaction score over simulated time.

EXAMPLES:
    # Run a week with default settings
    print-farm-simulator

    # Use a configuration file
    print-farm-simulator --config shop.json

    # Reproducible run with the event log printed
    print-farm-simulator --seed 42 --print-events

    # Generate configuration template
    print-farm-simulator --print-config > my-shop.json

    # Keep the resolved settings of a tuned run
    print-farm-simulator --days 14 --dispatch-policy round_robin --save-config tuned.json

    # Validate configuration without running
    print-farm-simulator --config my-shop.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Number of days to simulate
    #[arg(
        long,
        help = "Number of days to simulate",
        long_help = "Simulation horizon in days. New jobs arrive only before the horizon; admitted jobs are drained afterwards. Default: 7"
    )]
    pub days: Option<usize>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Mean hours between job arrivals
    #[arg(long, help = "Mean hours between job arrivals (exponential)")]
    pub mean_interarrival_hours: Option<f64>,

    /// Number of post-processing workers
    #[arg(long, help = "Number of post-processing workers")]
    pub post_processing_workers: Option<usize>,

    /// Number of packaging workers
    #[arg(long, help = "Number of packaging workers")]
    pub packaging_workers: Option<usize>,

    /// Dispatch policy for matching pending jobs to printers
    #[arg(
        long,
        help = "Dispatch policy (first_idle or round_robin)",
        long_help = "Policy used by the dispatcher to match pending jobs to idle printers. Supported: first_idle, round_robin. Default: first_idle"
    )]
    pub dispatch_policy: Option<String>,

    /// Output path for completed-job records
    #[arg(long, help = "Output path for completed-job records (JSONL)")]
    pub report_output: Option<String>,

    /// Output path for the job log
    #[arg(long, help = "Output path for the job creation log (JSONL)")]
    pub job_log_output: Option<String>,

    /// Print the event log after the run
    #[arg(long, help = "Print the event log after the run")]
    pub print_events: bool,

    /// Clear the event log at every day boundary
    #[arg(long, help = "Clear the event log at every day boundary")]
    pub clear_event_log_daily: bool,

    /// Also write diagnostic logs to daily rolling files in this directory
    #[arg(long, help = "Directory for daily rolling JSON log files")]
    pub log_dir: Option<String>,

    /// Emit console logs as JSON
    #[arg(long, help = "Emit console logs as JSON")]
    pub log_json: bool,

    /// Raw tracing filter directive
    #[arg(
        long,
        help = "Tracing filter directive (overrides -v/-d and RUST_LOG)",
        long_help = "Tracing filter directive, for example 'print_farm_simulator::simulation=trace'. Overrides the level chosen by --verbose/--debug and the RUST_LOG environment variable."
    )]
    pub log_filter: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,

    /// Write the resolved configuration to a file
    #[arg(long, help = "Save the resolved configuration as JSON, reusable with --config")]
    pub save_config: Option<String>,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Number of days to simulate
    pub days: Option<usize>,
    /// Random seed for reproducible results
    pub seed: Option<u64>,
    /// Mean hours between job arrivals
    pub mean_interarrival_hours: Option<f64>,
    /// Width range of generated jobs in mm
    pub width_range: Option<InclusiveRange>,
    /// Height range of generated jobs in mm
    pub height_range: Option<InclusiveRange>,
    /// Depth range of generated jobs in mm
    pub depth_range: Option<InclusiveRange>,
    /// Filament feed speed in mm per hour
    pub build_speed: Option<f64>,
    /// Filament diameter in mm
    pub filament_diameter: Option<f64>,
    /// Divisor turning mean dimension into post-processing hours
    pub post_processing_coefficient: Option<f64>,
    /// Packaging minutes for small jobs
    pub small_packaging_minutes: Option<InclusiveRange>,
    /// Packaging minutes for large jobs
    pub large_packaging_minutes: Option<InclusiveRange>,
    /// Printer capability table
    pub printers: Option<Vec<PrinterSpec>>,
    /// Number of post-processing workers
    pub post_processing_workers: Option<usize>,
    /// Number of packaging workers
    pub packaging_workers: Option<usize>,
    /// Unit cost table
    pub costs: Option<CostTable>,
    /// Satisfaction constants
    pub satisfaction: Option<SatisfactionConstants>,
    /// Dispatch policy
    pub dispatch_policy: Option<DispatchPolicyKind>,
    /// Keep the event log for the whole run instead of clearing it daily
    pub retain_event_log: Option<bool>,
}

/// Configuration for the print farm simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation horizon in days
    pub days: usize,
    /// Random seed for reproducible results
    pub seed: Option<u64>,
    /// Mean hours between job arrivals (exponential inter-arrival times)
    pub mean_interarrival_hours: f64,
    /// Width range of generated jobs in mm
    pub width_range: InclusiveRange,
    /// Height range of generated jobs in mm
    pub height_range: InclusiveRange,
    /// Depth range of generated jobs in mm
    pub depth_range: InclusiveRange,
    /// Filament feed speed in mm per hour
    pub build_speed: f64,
    /// Filament diameter in mm
    pub filament_diameter: f64,
    /// Divisor turning mean dimension into post-processing hours
    pub post_processing_coefficient: f64,
    /// Packaging minutes for jobs up to half the largest possible volume
    pub small_packaging_minutes: InclusiveRange,
    /// Packaging minutes for larger jobs
    pub large_packaging_minutes: InclusiveRange,
    /// Printer capability table
    pub printers: Vec<PrinterSpec>,
    /// Number of post-processing workers
    pub post_processing_workers: usize,
    /// Number of packaging workers
    pub packaging_workers: usize,
    /// Unit cost table
    pub costs: CostTable,
    /// Satisfaction constants
    pub satisfaction: SatisfactionConstants,
    /// Dispatch policy
    pub dispatch_policy: DispatchPolicyKind,
    /// Keep the event log for the whole run instead of clearing it daily
    pub retain_event_log: bool,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),

    /// Unknown value for an enumerated CLI option
    #[error("Invalid value for {field}: {message}")]
    InvalidArgument {
        /// Name of the offending option
        field: String,
        /// Parser message
        message: String,
    },
}

/// Validation errors for simulation configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    /// Days count is invalid
    #[error("Days count must be greater than 0, got {0}")]
    InvalidDaysCount(usize),

    /// A range is inverted or starts at zero
    #[error("Invalid {field} range: min ({min}) must be > 0 and <= max ({max})")]
    InvalidRange {
        /// Name of the range
        field: String,
        /// Configured lower bound
        min: u32,
        /// Configured upper bound
        max: u32,
    },

    /// A quantity that must be strictly positive is not
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive {
        /// Name of the parameter
        field: String,
        /// The rejected value
        value: f64,
    },

    /// A unit cost is negative or not finite
    #[error("Unit cost {field} must be a non-negative finite number, got {value}")]
    InvalidCost {
        /// Name of the cost entry
        field: String,
        /// The rejected value
        value: f64,
    },

    /// A satisfaction constant is not finite
    #[error("Satisfaction constant {field} must be finite, got {value}")]
    InvalidSatisfaction {
        /// Name of the constant
        field: String,
        /// The rejected value
        value: f64,
    },

    /// No printers configured
    #[error("Printer table must contain at least one printer")]
    EmptyPrinterTable,

    /// Two printers share an id
    #[error("Duplicate printer id {0}")]
    DuplicatePrinterId(PrinterId),

    /// A printer envelope has a zero axis
    #[error("Printer {id} has a zero-sized envelope ({width}x{height}x{depth})")]
    InvalidPrinterEnvelope {
        /// Printer id
        id: PrinterId,
        /// Envelope width
        width: u32,
        /// Envelope height
        height: u32,
        /// Envelope depth
        depth: u32,
    },

    /// A worker pool has no workers
    #[error("{pool} pool must have at least one worker")]
    EmptyWorkerPool {
        /// Name of the pool
        pool: String,
    },
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 7,
            seed: None,
            mean_interarrival_hours: 1.0,
            width_range: InclusiveRange::new(50, 260),
            height_range: InclusiveRange::new(50, 260),
            depth_range: InclusiveRange::new(50, 260),
            build_speed: 250_000.0,
            filament_diameter: 1.75,
            post_processing_coefficient: 50.0,
            small_packaging_minutes: InclusiveRange::new(10, 30),
            large_packaging_minutes: InclusiveRange::new(30, 60),
            printers: vec![
                PrinterSpec::new(0, 220, 220, 250),
                PrinterSpec::new(1, 250, 210, 210),
                PrinterSpec::new(2, 256, 256, 256),
                PrinterSpec::new(3, 180, 180, 180),
                PrinterSpec::new(4, 300, 300, 200),
            ],
            post_processing_workers: 4,
            packaging_workers: 3,
            costs: CostTable::default(),
            satisfaction: SatisfactionConstants::default(),
            dispatch_policy: DispatchPolicyKind::FirstIdle,
            retain_event_log: true,
        }
    }
}

impl SimulationConfig {
    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        Self::apply_cli_overrides(&mut config, args)?;

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            days: config_file.days.unwrap_or(defaults.days),
            seed: config_file.seed.or(defaults.seed),
            mean_interarrival_hours: config_file
                .mean_interarrival_hours
                .unwrap_or(defaults.mean_interarrival_hours),
            width_range: config_file.width_range.unwrap_or(defaults.width_range),
            height_range: config_file.height_range.unwrap_or(defaults.height_range),
            depth_range: config_file.depth_range.unwrap_or(defaults.depth_range),
            build_speed: config_file.build_speed.unwrap_or(defaults.build_speed),
            filament_diameter: config_file.filament_diameter.unwrap_or(defaults.filament_diameter),
            post_processing_coefficient: config_file
                .post_processing_coefficient
                .unwrap_or(defaults.post_processing_coefficient),
            small_packaging_minutes: config_file
                .small_packaging_minutes
                .unwrap_or(defaults.small_packaging_minutes),
            large_packaging_minutes: config_file
                .large_packaging_minutes
                .unwrap_or(defaults.large_packaging_minutes),
            printers: config_file.printers.unwrap_or(defaults.printers),
            post_processing_workers: config_file
                .post_processing_workers
                .unwrap_or(defaults.post_processing_workers),
            packaging_workers: config_file.packaging_workers.unwrap_or(defaults.packaging_workers),
            costs: config_file.costs.unwrap_or(defaults.costs),
            satisfaction: config_file.satisfaction.unwrap_or(defaults.satisfaction),
            dispatch_policy: config_file.dispatch_policy.unwrap_or(defaults.dispatch_policy),
            retain_event_log: config_file.retain_event_log.unwrap_or(defaults.retain_event_log),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) -> Result<(), ConfigError> {
        if let Some(value) = args.days {
            config.days = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.mean_interarrival_hours {
            config.mean_interarrival_hours = value;
        }
        if let Some(value) = args.post_processing_workers {
            config.post_processing_workers = value;
        }
        if let Some(value) = args.packaging_workers {
            config.packaging_workers = value;
        }
        if let Some(value) = args.dispatch_policy {
            config.dispatch_policy = value.parse().map_err(|message| ConfigError::InvalidArgument {
                field: "dispatch_policy".to_string(),
                message,
            })?;
        }
        if args.clear_event_log_daily {
            config.retain_event_log = false;
        }
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.days == 0 {
            return Err(ConfigValidationError::InvalidDaysCount(self.days));
        }

        self.validate_positive("mean_interarrival_hours", self.mean_interarrival_hours)?;

        self.validate_range("width", self.width_range)?;
        self.validate_range("height", self.height_range)?;
        self.validate_range("depth", self.depth_range)?;

        self.validate_positive("build_speed", self.build_speed)?;
        self.validate_positive("filament_diameter", self.filament_diameter)?;
        self.validate_positive("post_processing_coefficient", self.post_processing_coefficient)?;

        self.validate_range("small_packaging_minutes", self.small_packaging_minutes)?;
        self.validate_range("large_packaging_minutes", self.large_packaging_minutes)?;

        if self.printers.is_empty() {
            return Err(ConfigValidationError::EmptyPrinterTable);
        }
        let mut seen = HashSet::new();
        for printer in &self.printers {
            if !seen.insert(printer.id) {
                return Err(ConfigValidationError::DuplicatePrinterId(printer.id));
            }
            if printer.width == 0 || printer.height == 0 || printer.depth == 0 {
                return Err(ConfigValidationError::InvalidPrinterEnvelope {
                    id: printer.id,
                    width: printer.width,
                    height: printer.height,
                    depth: printer.depth,
                });
            }
        }

        if self.post_processing_workers == 0 {
            return Err(ConfigValidationError::EmptyWorkerPool {
                pool: "Post-processing".to_string(),
            });
        }
        if self.packaging_workers == 0 {
            return Err(ConfigValidationError::EmptyWorkerPool { pool: "Packaging".to_string() });
        }

        self.validate_cost("printing", self.costs.printing)?;
        self.validate_cost("post_processing", self.costs.post_processing)?;
        self.validate_cost("packaging", self.costs.packaging)?;
        self.validate_cost("shortage", self.costs.shortage)?;
        self.validate_cost("packaging_cost_threshold", self.costs.packaging_cost_threshold)?;

        for (field, value) in [
            ("positive", self.satisfaction.positive),
            ("negative", self.satisfaction.negative),
        ] {
            if !value.is_finite() {
                return Err(ConfigValidationError::InvalidSatisfaction {
                    field: field.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }

    fn validate_range(&self, field: &str, range: InclusiveRange) -> Result<(), ConfigValidationError> {
        if range.min == 0 || !range.is_ordered() {
            return Err(ConfigValidationError::InvalidRange {
                field: field.to_string(),
                min: range.min,
                max: range.max,
            });
        }
        Ok(())
    }

    fn validate_positive(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigValidationError::NonPositive { field: field.to_string(), value });
        }
        Ok(())
    }

    fn validate_cost(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigValidationError::InvalidCost { field: field.to_string(), value });
        }
        Ok(())
    }

    /// Simulation horizon in hours
    pub fn horizon_hours(&self) -> f64 {
        self.days as f64 * HOURS_PER_DAY
    }

    /// Volume of the largest job the dimension ranges can produce
    pub fn max_bounding_volume(&self) -> u64 {
        u64::from(self.width_range.max)
            * u64::from(self.height_range.max)
            * u64::from(self.depth_range.max)
    }

    /// Printers sorted by id, the order in which the dispatcher scans them
    pub fn printers_by_id(&self) -> Vec<PrinterSpec> {
        let mut printers = self.printers.clone();
        printers.sort_by_key(|printer| printer.id);
        printers
    }
}
