//! Tests for the day-stepped control adapter

use print_farm_simulator::simulation::{ControlAction, ControlEnvironment};
use print_farm_simulator::types::{DispatchPolicyKind, SimulationConfig};

fn environment(days: usize, seed: u64) -> ControlEnvironment {
    let config = SimulationConfig { days, seed: Some(seed), ..Default::default() };
    ControlEnvironment::new(config).unwrap()
}

/// Test that an episode ends after the configured number of days
#[test]
fn test_episode_length() {
    let mut env = environment(3, 17);
    let mut done_at = None;

    for step in 1..=3 {
        let outcome = env.step(ControlAction::default());
        assert_eq!(outcome.info.day, step);
        assert_eq!(env.simulation().now(), step as f64 * 24.0);
        if outcome.done {
            done_at = Some(step);
            break;
        }
    }

    assert_eq!(done_at, Some(3));
    assert_eq!(env.days_stepped(), 3);
}

/// Test that the reward is the negated cost of the stepped day
#[test]
fn test_reward_matches_ledger() {
    let mut env = environment(3, 23);

    for _ in 0..3 {
        let outcome = env.step(ControlAction::default());
        let closed = env.simulation().ledger().last_closed().unwrap();
        assert_eq!(closed.day, outcome.info.day);
        assert_eq!(outcome.reward, -closed.total);
        assert!(outcome.reward <= 0.0);
    }
}

/// Test the observation layout against the simulation state
#[test]
fn test_observation_layout() {
    let mut env = environment(2, 31);
    let outcome = env.step(ControlAction::default());
    let state = &outcome.state;
    let sim = env.simulation();

    let printers = sim.printers().len();
    let post = sim.post_processing().len();
    let packing = sim.packaging().len();
    assert_eq!(state.len(), printers + post + packing + 4);
    assert_eq!(state.len(), env.observation_len());

    let busy = state[..printers + post + packing].iter().filter(|&&flag| flag == 1.0).count();
    let expected_busy =
        sim.printers().busy_count() + sim.post_processing().busy_count() + sim.packaging().busy_count();
    assert_eq!(busy, expected_busy);
    assert!(state[..printers + post + packing].iter().all(|&flag| flag == 0.0 || flag == 1.0));

    let tail = &state[printers + post + packing..];
    assert_eq!(tail[0], sim.pending().len() as f64);
    assert_eq!(tail[1], sim.post_processing().queue_len() as f64);
    assert_eq!(tail[2], sim.packaging().queue_len() as f64);
    assert_eq!(tail[3], sim.last_day_demand() as f64);
    assert!(tail[3] > 0.0);

    assert_eq!(outcome.info.jobs_pending, sim.pending().len());
}

/// Test that the action switches the dispatch policy before the day runs
#[test]
fn test_action_changes_dispatch_policy() {
    let mut env = environment(2, 3);
    assert_eq!(env.simulation().dispatch_policy(), DispatchPolicyKind::FirstIdle);

    env.step(ControlAction { dispatch_policy: Some(DispatchPolicyKind::RoundRobin) });
    assert_eq!(env.simulation().dispatch_policy(), DispatchPolicyKind::RoundRobin);

    // an empty action keeps the current policy
    env.step(ControlAction::default());
    assert_eq!(env.simulation().dispatch_policy(), DispatchPolicyKind::RoundRobin);
}

/// Test that a reset replays a seeded episode exactly
#[test]
fn test_reset_reproduces_episode() {
    let mut env = environment(3, 8);

    let first: Vec<_> = (0..3).map(|_| env.step(ControlAction::default())).collect();
    let first_log = env.simulation().event_log().lines();

    let state = env.reset().unwrap();
    assert_eq!(env.days_stepped(), 0);
    assert!(state.iter().all(|&value| value == 0.0));

    let second: Vec<_> = (0..3).map(|_| env.step(ControlAction::default())).collect();
    assert_eq!(first, second);
    assert_eq!(env.simulation().event_log().lines(), first_log);
}
