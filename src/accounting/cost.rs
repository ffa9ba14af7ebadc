//! Cost accounting
//!
//! Costs accrue into per-category accumulators for the current day. At each
//! day boundary the accumulators are folded into a [`DailyCostEntry`] and
//! reset to zero.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::types::{CostCategory, CostTable};

impl CostTable {
    /// Printing cost charged when a job is assigned to a printer
    pub fn printing_cost(&self, volume: u64, build_time: u64) -> f64 {
        (volume as f64 + build_time as f64) * self.printing
    }

    /// Post-processing cost charged when post-processing completes
    pub fn post_processing_cost(&self, post_processing_hours: f64) -> f64 {
        post_processing_hours * self.post_processing
    }

    /// Packaging cost charged when packaging completes; doubled at or above the threshold
    pub fn packaging_cost(&self, volume: u64) -> f64 {
        if volume as f64 >= self.packaging_cost_threshold {
            2.0 * self.packaging
        } else {
            self.packaging
        }
    }

    /// Shortage cost charged when a job is rejected at arrival
    pub fn shortage_cost(&self, shortage: u8) -> f64 {
        f64::from(shortage) * self.shortage
    }
}

/// Costs of one closed day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCostEntry {
    /// One-based day number
    pub day: usize,
    /// Amount per category
    pub by_category: BTreeMap<CostCategory, f64>,
    /// Sum over categories
    pub total: f64,
}

impl DailyCostEntry {
    /// Amount charged to one category
    pub fn amount(&self, category: CostCategory) -> f64 {
        self.by_category.get(&category).copied().unwrap_or(0.0)
    }
}

/// Running accumulators plus the history of closed days
#[derive(Debug, Clone)]
pub struct CostLedger {
    current: BTreeMap<CostCategory, f64>,
    history: Vec<DailyCostEntry>,
}

impl Default for CostLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CostLedger {
    /// Ledger with every category at zero
    pub fn new() -> Self {
        Self {
            current: CostCategory::ALL.iter().map(|&category| (category, 0.0)).collect(),
            history: Vec::new(),
        }
    }

    /// Add `amount` to the running accumulator of `category`
    pub fn accrue(&mut self, category: CostCategory, amount: f64) {
        *self.current.entry(category).or_insert(0.0) += amount;
    }

    /// Running amount of one category for the current day
    pub fn current(&self, category: CostCategory) -> f64 {
        self.current.get(&category).copied().unwrap_or(0.0)
    }

    /// Sum of the running accumulators
    pub fn daily_total(&self) -> f64 {
        self.current.values().sum()
    }

    /// Fold the accumulators into the history as `day` and reset them
    pub fn close_day(&mut self, day: usize) -> &DailyCostEntry {
        let by_category = std::mem::replace(
            &mut self.current,
            CostCategory::ALL.iter().map(|&category| (category, 0.0)).collect(),
        );
        let total = by_category.values().sum();

        for (category, amount) in &by_category {
            info!("{}: {}", category, amount);
        }
        info!("Daily total cost: {}", total);

        self.history.push(DailyCostEntry { day, by_category, total });
        &self.history[self.history.len() - 1]
    }

    /// Closed days in order
    pub fn history(&self) -> &[DailyCostEntry] {
        &self.history
    }

    /// Most recently closed day
    pub fn last_closed(&self) -> Option<&DailyCostEntry> {
        self.history.last()
    }

    /// Sum over all closed days
    pub fn cumulative_total(&self) -> f64 {
        self.history.iter().map(|entry| entry.total).sum()
    }
}
