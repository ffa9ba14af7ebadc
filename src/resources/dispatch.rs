//! Dispatch policies
//!
//! A policy picks the printer a pending job should start on. The dispatcher
//! calls it once per pending job per tick, in pending order, and acquires the
//! returned printer immediately so later jobs of the same tick see it busy.

use std::fmt;

use crate::job::Job;
use crate::resources::ResourcePool;
use crate::types::DispatchPolicyKind;

/// Chooses an idle eligible printer for a pending job
pub trait DispatchPolicy: fmt::Debug {
    /// Which configured policy this is
    fn kind(&self) -> DispatchPolicyKind;

    /// Index into `printers` of an idle server able to take `job`, if any
    fn select(&mut self, job: &Job, printers: &ResourcePool) -> Option<usize>;
}

/// Scan printers in ascending id order and take the first idle eligible one
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstIdleDispatch;

impl DispatchPolicy for FirstIdleDispatch {
    fn kind(&self) -> DispatchPolicyKind {
        DispatchPolicyKind::FirstIdle
    }

    fn select(&mut self, job: &Job, printers: &ResourcePool) -> Option<usize> {
        printers.first_idle_eligible(job)
    }
}

/// Rotate through each job's own eligible list.
///
/// The counter is a position in the eligible list of whichever job is being
/// placed, not a printer index, so jobs with different envelopes share it.
/// The scan starts one past the counter and takes the first idle printer,
/// wrapping around the eligible list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinDispatch {
    last: Option<usize>,
}

impl DispatchPolicy for RoundRobinDispatch {
    fn kind(&self) -> DispatchPolicyKind {
        DispatchPolicyKind::RoundRobin
    }

    fn select(&mut self, job: &Job, printers: &ResourcePool) -> Option<usize> {
        let eligible = &job.eligible_printers;
        if eligible.is_empty() {
            return None;
        }
        let start = self.last.map_or(0, |last| (last + 1) % eligible.len());

        let (position, index) = (0..eligible.len())
            .map(|offset| (start + offset) % eligible.len())
            .find_map(|position| {
                printers
                    .index_of(eligible[position])
                    .filter(|&index| printers.is_idle(index))
                    .map(|index| (position, index))
            })?;
        self.last = Some(position);
        Some(index)
    }
}

/// Build the policy for a configured kind
pub fn policy_for(kind: DispatchPolicyKind) -> Box<dyn DispatchPolicy> {
    match kind {
        DispatchPolicyKind::FirstIdle => Box::new(FirstIdleDispatch),
        DispatchPolicyKind::RoundRobin => Box::new(RoundRobinDispatch::default()),
    }
}
