//! Episode rollout helpers and contract smoke checks.
//!
//! These drive an environment with random in-spec actions and assert the
//! contract properties every implementation must satisfy: deterministic
//! resets, spec-conformant observations, and well-formed step-type
//! sequences. Intended for use from `#[test]` functions, so violations
//! panic with a descriptive message.

use safari_core::error::EnvError;
use safari_core::seed::derive_seed;
use safari_core::types::{StepType, Timestep};
use safari_env::env::Environment;

use crate::rng::seeded_rng;

/// Outcome of one full episode rollout.
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    /// Number of `step` calls taken (excludes the reset).
    pub steps: usize,
    /// Sum of rewards over the episode.
    pub total_reward: f32,
    /// Every timestep observed, reset included.
    pub timesteps: Vec<Timestep>,
}

/// Run one episode with random in-spec actions.
///
/// Actions are sampled from the environment's action spec with a generator
/// derived from `seed`, so the rollout is reproducible. Stops at the first
/// `Last` timestep or after `max_safety_steps`, whichever comes first.
pub fn run_episode<E: Environment>(
    env: &E,
    seed: u64,
    max_safety_steps: usize,
) -> Result<EpisodeSummary, EnvError> {
    let mut rng = seeded_rng(derive_seed(seed, "actions"));
    let action_spec = env.action_spec();

    let (mut state, ts) = env.reset(seed);
    let mut timesteps = vec![ts];
    let mut total_reward = 0.0;
    let mut steps = 0;
    while !timesteps[timesteps.len() - 1].is_last() && steps < max_safety_steps {
        let action = action_spec.sample(&mut rng);
        let (next, ts) = env.step(&state, &action)?;
        total_reward += ts.reward;
        steps += 1;
        timesteps.push(ts);
        state = next;
    }
    Ok(EpisodeSummary {
        steps,
        total_reward,
        timesteps,
    })
}

/// Assert that the spec accessors are self-consistent.
///
/// The generated placeholder of each spec must validate against that spec,
/// and sampled actions must validate against the action spec.
///
/// # Panics
///
/// Panics with a descriptive message on any inconsistency.
pub fn check_env_specs<E: Environment>(env: &E) {
    for (name, spec) in [
        ("observation", env.observation_spec()),
        ("action", env.action_spec()),
        ("reward", env.reward_spec()),
        ("discount", env.discount_spec()),
    ] {
        let value = spec.generate_value();
        spec.validate(&value)
            .unwrap_or_else(|e| panic!("{name} spec rejects its own generated value: {e}"));
    }

    let mut rng = seeded_rng(0);
    let action_spec = env.action_spec();
    for _ in 0..10 {
        let action = action_spec.sample(&mut rng);
        action_spec
            .validate(&action)
            .unwrap_or_else(|e| panic!("action spec rejects its own sample: {e}"));
    }
}

/// Run `episodes` random-action episodes and assert the core contract.
///
/// Checks, per episode:
/// - `reset` is deterministic: resetting twice with the episode seed yields
///   structurally identical timesteps;
/// - every observation validates against the observation spec;
/// - the step-type sequence matches `First, Mid*, Last`.
///
/// # Panics
///
/// Panics with a descriptive message on any contract violation.
pub fn check_env_does_not_smoke<E: Environment>(env: &E, seed: u64, episodes: usize) {
    let obs_spec = env.observation_spec();
    for episode in 0..episodes {
        let episode_seed = derive_seed(seed, &format!("episode:{episode}"));

        let (_, a) = env.reset(episode_seed);
        let (_, b) = env.reset(episode_seed);
        assert_eq!(a, b, "reset is not deterministic for seed {episode_seed}");

        let summary = run_episode(env, episode_seed, 10_000)
            .unwrap_or_else(|e| panic!("episode {episode} failed: {e}"));
        assert!(
            summary.timesteps.last().is_some_and(Timestep::is_last),
            "episode {episode} did not terminate within the safety limit"
        );

        for (i, ts) in summary.timesteps.iter().enumerate() {
            obs_spec.validate(&ts.observation).unwrap_or_else(|e| {
                panic!("episode {episode}, step {i}: observation violates spec: {e}")
            });
            let expected = if i == 0 {
                StepType::First
            } else if i == summary.timesteps.len() - 1 {
                StepType::Last
            } else {
                StepType::Mid
            };
            assert_eq!(
                ts.step_type, expected,
                "episode {episode}, step {i}: malformed step-type sequence"
            );
            assert!(
                (0.0..=1.0).contains(&ts.discount),
                "episode {episode}, step {i}: discount {} outside [0, 1]",
                ts.discount
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{AlwaysLose, Counting};

    #[test]
    fn run_episode_is_reproducible() {
        let env = Counting { horizon: 5 };
        let a = run_episode(&env, 3, 100).unwrap();
        let b = run_episode(&env, 3, 100).unwrap();
        assert_eq!(a.timesteps, b.timesteps);
        assert_eq!(a.steps, 5);
        assert!((a.total_reward - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn run_episode_stops_at_safety_limit() {
        // Horizon beyond the cap: the rollout gives up without a Last.
        let env = Counting { horizon: 1000 };
        let summary = run_episode(&env, 0, 10).unwrap();
        assert_eq!(summary.steps, 10);
        assert!(!summary.timesteps.last().unwrap().is_last());
    }

    #[test]
    fn mock_envs_do_not_smoke() {
        check_env_specs(&AlwaysLose);
        check_env_does_not_smoke(&AlwaysLose, 0, 5);

        check_env_specs(&Counting { horizon: 4 });
        check_env_does_not_smoke(&Counting { horizon: 4 }, 0, 3);
    }
}
