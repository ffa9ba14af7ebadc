// Print Farm Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/print-farm-simulator
// ```
//
// Or with custom configuration:
//
// ```console
// $ ./target/release/print-farm-simulator --days 14 --seed 42 --packaging-workers 2 --verbose
// ```

use anyhow::{Context, Result};
use clap::Parser;
use print_farm_simulator::events::write_jsonl;
use print_farm_simulator::simulation::{LoggingConfig, Simulation, SimulationStatistics};
use print_farm_simulator::types::{CliArgs, CostCategory, SimulationConfig};
use serde::Serialize;
use std::process;
use tracing::{error, info, warn};

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let _log_guard = match logging_config(&args).init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    info!("Print Farm Simulator completed successfully");
}

/// Logging setup from the CLI flags; warnings only unless asked for more
fn logging_config(args: &CliArgs) -> LoggingConfig {
    let mut logging = if args.debug {
        LoggingConfig::debug()
    } else if args.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::new().with_level(tracing::Level::WARN)
    };
    if args.log_json {
        logging = logging.json();
    }
    if let Some(directory) = &args.log_dir {
        logging = logging.with_log_file(directory.clone());
    }
    if let Some(directive) = &args.log_filter {
        logging = logging.with_directive(directive.clone());
    }
    logging
}

fn run(args: CliArgs) -> Result<()> {
    info!("Starting Print Farm Simulator");

    let config =
        SimulationConfig::from_cli_args(args.clone()).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    info!("Configuration loaded and validated successfully");

    if let Some(path) = &args.save_config {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to save configuration to {}", path))?;
        info!("Configuration saved to {}", path);
        eprintln!("Configuration saved to {}", path);
    }

    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return Ok(());
    }

    print_startup_banner(&config);

    let mut simulation =
        Simulation::new(config.clone()).context("Failed to initialize simulation")?;

    eprintln!("Simulating {} days...", config.days);
    let statistics = simulation.run();

    if args.print_events {
        print_event_log(&simulation);
    }
    print_daily_costs(&simulation);
    print_final_statistics(&statistics);

    if let Some(path) = &args.report_output {
        write_report("Completed-job report", &simulation.completed_records(), path)?;
    }
    if let Some(path) = &args.job_log_output {
        write_report("Job log", simulation.job_log(), path)?;
    }

    Ok(())
}

/// Write one JSONL report; a failed report is reported and skipped so the others still get written
fn write_report<T: Serialize>(name: &str, records: &[T], path: &str) -> Result<()> {
    match write_jsonl(records, path) {
        Ok(()) => {
            eprintln!("{} written to: {}", name, path);
            Ok(())
        }
        Err(e) if e.is_recoverable() => {
            warn!("{} not written ({} error): {}", name, e.category(), e);
            eprintln!("Warning: {} could not be written to '{}': {}", name, path, e);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to write {} to '{}'", name, path)),
    }
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("Print Farm Simulator");
    eprintln!("====================");
    eprintln!("Discrete-event simulation of a 3D print job shop");
    eprintln!();

    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Configuration:");
    eprintln!("  Days: {}", config.days);
    eprintln!("  Mean Inter-arrival: {:.2} hours", config.mean_interarrival_hours);
    eprintln!(
        "  Job Size (mm): {}-{} x {}-{} x {}-{}",
        config.width_range.min,
        config.width_range.max,
        config.height_range.min,
        config.height_range.max,
        config.depth_range.min,
        config.depth_range.max
    );
    eprintln!("  Printers: {}", config.printers.len());
    for printer in config.printers_by_id() {
        eprintln!(
            "    Printer {}: {} x {} x {}",
            printer.id, printer.width, printer.height, printer.depth
        );
    }
    eprintln!("  Post-processing Workers: {}", config.post_processing_workers);
    eprintln!("  Packaging Workers: {}", config.packaging_workers);
    eprintln!("  Dispatch Policy: {}", config.dispatch_policy);
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}

fn print_event_log(simulation: &Simulation) {
    for line in simulation.event_log().lines() {
        println!("{}", line);
    }
}

fn print_daily_costs(simulation: &Simulation) {
    eprintln!("Daily Costs:");
    for entry in simulation.ledger().history() {
        let breakdown: Vec<String> = CostCategory::ALL
            .iter()
            .map(|&category| format!("{} {:.2}", category, entry.amount(category)))
            .collect();
        eprintln!("  Day {}: {:.2} ({})", entry.day, entry.total, breakdown.join(", "));
    }
    eprintln!();
}

fn print_final_statistics(statistics: &SimulationStatistics) {
    eprintln!("{}", statistics.generate_statistics_output());
}
