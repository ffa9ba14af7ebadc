//! Job generation
//!
//! The arrival process decides *when* jobs arrive and *how big* they are; the
//! [`JobGenerator`] turns a sampled bounding box into a fully derived [`Job`]
//! with durations and an eligible printer set.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::fmt;
use tracing::debug;

use crate::job::{Dimensions, Job};
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{InclusiveRange, JobId, PrinterId, PrinterSpec, SimulationConfig};

/// Source of arrivals driving the generator task
///
/// The generator asks for the dimensions of the job arriving now, then for
/// the delay to the next arrival. Returning `None` from either ends arrivals.
pub trait ArrivalProcess: fmt::Debug {
    /// Virtual time of the first arrival
    fn first_arrival(&self) -> f64 {
        0.0
    }

    /// Bounding box of the job arriving now
    fn sample_dimensions(&mut self, rng: &mut StdRng) -> Option<Dimensions>;

    /// Hours until the next arrival, sampled after the current one is processed
    fn next_interarrival(&mut self, rng: &mut StdRng) -> Option<f64>;
}

/// Renewal process with exponential gaps and uniformly sampled axes
#[derive(Debug, Clone)]
pub struct PoissonArrivals {
    interarrival: Exp<f64>,
    width_range: InclusiveRange,
    height_range: InclusiveRange,
    depth_range: InclusiveRange,
}

impl PoissonArrivals {
    /// Build from the configured mean gap and per-axis ranges
    pub fn from_config(config: &SimulationConfig) -> SimulationResult<Self> {
        let interarrival = Exp::new(1.0 / config.mean_interarrival_hours).map_err(|e| {
            SimulationError::configuration_error(format!(
                "invalid mean inter-arrival time {}: {}",
                config.mean_interarrival_hours, e
            ))
        })?;

        Ok(Self {
            interarrival,
            width_range: config.width_range,
            height_range: config.height_range,
            depth_range: config.depth_range,
        })
    }
}

impl ArrivalProcess for PoissonArrivals {
    fn sample_dimensions(&mut self, rng: &mut StdRng) -> Option<Dimensions> {
        let width = rng.gen_range(self.width_range.min..=self.width_range.max);
        let height = rng.gen_range(self.height_range.min..=self.height_range.max);
        let depth = rng.gen_range(self.depth_range.min..=self.depth_range.max);
        Some(Dimensions::new(width, height, depth))
    }

    fn next_interarrival(&mut self, rng: &mut StdRng) -> Option<f64> {
        Some(self.interarrival.sample(rng))
    }
}

/// One arrival of a replayed demand trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedArrival {
    /// Virtual time of the arrival in hours
    pub at: f64,
    /// Bounding box of the arriving job
    pub dimensions: Dimensions,
}

impl ScriptedArrival {
    /// Create an arrival at `at` hours
    pub fn new(at: f64, dimensions: Dimensions) -> Self {
        Self { at, dimensions }
    }
}

/// Replays a fixed list of arrivals in time order
#[derive(Debug, Clone, Default)]
pub struct ScriptedArrivals {
    arrivals: VecDeque<ScriptedArrival>,
    last_at: f64,
}

impl ScriptedArrivals {
    /// Create from arrivals; they are sorted by time, ties keep their order
    pub fn new(mut arrivals: Vec<ScriptedArrival>) -> Self {
        arrivals.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { arrivals: arrivals.into(), last_at: 0.0 }
    }

    /// Arrivals not yet replayed
    pub fn remaining(&self) -> usize {
        self.arrivals.len()
    }
}

impl ArrivalProcess for ScriptedArrivals {
    fn first_arrival(&self) -> f64 {
        self.arrivals.front().map_or(0.0, |arrival| arrival.at)
    }

    fn sample_dimensions(&mut self, _rng: &mut StdRng) -> Option<Dimensions> {
        let arrival = self.arrivals.pop_front()?;
        self.last_at = arrival.at;
        Some(arrival.dimensions)
    }

    fn next_interarrival(&mut self, _rng: &mut StdRng) -> Option<f64> {
        self.arrivals.front().map(|next| next.at - self.last_at)
    }
}

/// Hours needed to extrude `volume` cubic mm of filament
pub fn build_time_hours(volume: u64, build_speed: f64, filament_diameter: f64) -> u64 {
    let radius = filament_diameter / 2.0;
    (volume as f64 / (build_speed * PI * radius * radius)).round() as u64
}

/// Post-processing hours: floor of the mean axis over the coefficient
pub fn post_processing_hours(dimensions: &Dimensions, coefficient: f64) -> f64 {
    (dimensions.mean() / coefficient).floor()
}

/// Derives job attributes and eligibility from sampled bounding boxes
#[derive(Debug, Clone)]
pub struct JobGenerator {
    next_id: JobId,
    printers: Vec<PrinterSpec>,
    build_speed: f64,
    filament_diameter: f64,
    post_processing_coefficient: f64,
    small_packaging_minutes: InclusiveRange,
    large_packaging_minutes: InclusiveRange,
    small_volume_limit: f64,
}

impl JobGenerator {
    /// Create a generator for the configured shop
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            next_id: JobId::new(0),
            printers: config.printers_by_id(),
            build_speed: config.build_speed,
            filament_diameter: config.filament_diameter,
            post_processing_coefficient: config.post_processing_coefficient,
            small_packaging_minutes: config.small_packaging_minutes,
            large_packaging_minutes: config.large_packaging_minutes,
            small_volume_limit: config.max_bounding_volume() as f64 / 2.0,
        }
    }

    /// Number of jobs created so far
    pub fn jobs_created(&self) -> u32 {
        self.next_id.value()
    }

    /// Printers whose envelope holds the bounding box, in ascending id order
    pub fn eligible_printers(&self, dimensions: &Dimensions) -> Vec<PrinterId> {
        self.printers
            .iter()
            .filter(|printer| printer.fits(dimensions.width, dimensions.height, dimensions.depth))
            .map(|printer| printer.id)
            .collect()
    }

    /// Packaging minutes drawn from the small or large tier
    pub fn sample_packaging_minutes<R: Rng>(&self, volume: u64, rng: &mut R) -> u32 {
        let tier = if volume as f64 <= self.small_volume_limit {
            self.small_packaging_minutes
        } else {
            self.large_packaging_minutes
        };
        rng.gen_range(tier.min..=tier.max)
    }

    /// Create the job arriving at `now` with the given bounding box
    pub fn create_job<R: Rng>(&mut self, dimensions: Dimensions, now: f64, rng: &mut R) -> Job {
        let id = self.next_id;
        self.next_id = id.next();

        let volume = dimensions.volume();
        let build_time = build_time_hours(volume, self.build_speed, self.filament_diameter);
        let post_processing_time =
            post_processing_hours(&dimensions, self.post_processing_coefficient);
        let packaging_time = self.sample_packaging_minutes(volume, rng);
        let eligible = self.eligible_printers(&dimensions);

        debug!(
            "Created job {} ({}x{}x{}, volume {}) eligible for {} printers",
            id,
            dimensions.width,
            dimensions.height,
            dimensions.depth,
            volume,
            eligible.len()
        );

        Job::new(id, dimensions, now, build_time, post_processing_time, packaging_time, eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceId;
    use rand::SeedableRng;

    fn shop_config() -> SimulationConfig {
        SimulationConfig {
            printers: vec![
                PrinterSpec::new(2, 300, 300, 300),
                PrinterSpec::new(0, 100, 100, 100),
                PrinterSpec::new(1, 200, 50, 200),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_time_formula() {
        // 1e6 / (250000 * pi * 0.875^2) = 1.663..
        assert_eq!(build_time_hours(1_000_000, 250_000.0, 1.75), 2);
        assert_eq!(build_time_hours(0, 250_000.0, 1.75), 0);
    }

    #[test]
    fn test_post_processing_formula() {
        let dims = Dimensions::new(100, 120, 140);
        assert_eq!(post_processing_hours(&dims, 50.0), 2.0);
        assert_eq!(post_processing_hours(&Dimensions::new(10, 10, 10), 50.0), 0.0);
    }

    #[test]
    fn test_eligibility_uses_every_axis() {
        let generator = JobGenerator::new(&shop_config());

        let eligible = generator.eligible_printers(&Dimensions::new(90, 40, 90));
        assert_eq!(eligible, vec![ResourceId::new(0), ResourceId::new(1), ResourceId::new(2)]);

        let eligible = generator.eligible_printers(&Dimensions::new(150, 60, 150));
        assert_eq!(eligible, vec![ResourceId::new(2)]);

        assert!(generator.eligible_printers(&Dimensions::new(301, 10, 10)).is_empty());
    }

    #[test]
    fn test_packaging_tiers() {
        let config = SimulationConfig {
            width_range: InclusiveRange::new(10, 10),
            height_range: InclusiveRange::new(10, 10),
            depth_range: InclusiveRange::new(10, 10),
            small_packaging_minutes: InclusiveRange::new(5, 5),
            large_packaging_minutes: InclusiveRange::new(50, 50),
            ..shop_config()
        };
        let generator = JobGenerator::new(&config);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(generator.sample_packaging_minutes(500, &mut rng), 5);
        assert_eq!(generator.sample_packaging_minutes(501, &mut rng), 50);
    }

    #[test]
    fn test_ids_assigned_in_arrival_order() {
        let mut generator = JobGenerator::new(&shop_config());
        let mut rng = StdRng::seed_from_u64(7);

        let first = generator.create_job(Dimensions::new(50, 40, 50), 0.0, &mut rng);
        let second = generator.create_job(Dimensions::new(50, 40, 50), 0.5, &mut rng);

        assert_eq!(first.id, JobId::new(0));
        assert_eq!(second.id, JobId::new(1));
        assert_eq!(second.create_time, 0.5);
        assert_eq!(generator.jobs_created(), 2);
    }

    #[test]
    fn test_poisson_arrivals_stay_in_range() {
        let config = shop_config();
        let mut arrivals = PoissonArrivals::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let dims = arrivals.sample_dimensions(&mut rng).unwrap();
            assert!(config.width_range.contains(dims.width));
            assert!(config.height_range.contains(dims.height));
            assert!(config.depth_range.contains(dims.depth));
            assert!(arrivals.next_interarrival(&mut rng).unwrap() >= 0.0);
        }
    }

    #[test]
    fn test_scripted_arrivals_replay_gaps() {
        let dims = Dimensions::new(10, 10, 10);
        let mut arrivals = ScriptedArrivals::new(vec![
            ScriptedArrival::new(2.5, dims),
            ScriptedArrival::new(1.0, dims),
        ]);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(arrivals.first_arrival(), 1.0);
        assert_eq!(arrivals.sample_dimensions(&mut rng), Some(dims));
        assert_eq!(arrivals.next_interarrival(&mut rng), Some(1.5));
        assert_eq!(arrivals.sample_dimensions(&mut rng), Some(dims));
        assert_eq!(arrivals.next_interarrival(&mut rng), None);
        assert_eq!(arrivals.remaining(), 0);
    }

    #[test]
    fn test_scripted_times_are_reported_unclamped() {
        let dims = Dimensions::new(10, 10, 10);
        let arrivals = ScriptedArrivals::new(vec![
            ScriptedArrival::new(1.0, dims),
            ScriptedArrival::new(-5.0, dims),
        ]);
        assert_eq!(arrivals.first_arrival(), -5.0);

        let mut arrivals = ScriptedArrivals::new(vec![
            ScriptedArrival::new(1.0, dims),
            ScriptedArrival::new(f64::NAN, dims),
        ]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(arrivals.first_arrival(), 1.0);
        arrivals.sample_dimensions(&mut rng);
        assert!(arrivals.next_interarrival(&mut rng).is_some_and(f64::is_nan));
    }
}
