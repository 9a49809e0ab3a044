//! Time-limit wrapper: truncates episodes at a configured step count.
//!
//! Truncation is not termination: the forced `Last` timestep keeps its
//! natural discount, so value estimators can still bootstrap past it. The
//! step counter lives inside the augmented [`TimedState`], never in the
//! wrapper, preserving the statelessness the batching wrapper relies on.

use safari_core::error::{ConfigError, EnvError};
use safari_core::spec::Spec;
use safari_core::types::{StepType, Timestep};
use safari_core::value::Value;

use crate::env::Environment;

// ---------------------------------------------------------------------------
// TimeLimit
// ---------------------------------------------------------------------------

/// Wrapper forcing a truncated `Last` once `max_episode_steps` is reached.
#[derive(Debug, Clone)]
pub struct TimeLimit<E> {
    env: E,
    max_episode_steps: u32,
}

/// Inner state plus the episode step counter.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedState<S> {
    inner: S,
    step_count: u32,
}

impl<S> TimedState<S> {
    /// The wrapped environment's state.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Steps taken in the current episode.
    #[must_use]
    pub const fn step_count(&self) -> u32 {
        self.step_count
    }
}

impl<E> TimeLimit<E> {
    /// Wrap `env` with a step limit.
    ///
    /// A zero limit is rejected eagerly: it would truncate every episode
    /// before its first transition.
    pub fn new(env: E, max_episode_steps: u32) -> Result<Self, ConfigError> {
        if max_episode_steps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_episode_steps".into(),
                message: "must be >= 1".into(),
            });
        }
        Ok(Self {
            env,
            max_episode_steps,
        })
    }

    /// The configured step limit.
    #[must_use]
    pub const fn max_episode_steps(&self) -> u32 {
        self.max_episode_steps
    }

    /// The wrapped environment.
    pub const fn inner(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> Environment for TimeLimit<E> {
    type State = TimedState<E::State>;

    fn reset(&self, seed: u64) -> (Self::State, Timestep) {
        let (inner, timestep) = self.env.reset(seed);
        (
            TimedState {
                inner,
                step_count: 0,
            },
            timestep,
        )
    }

    fn step(
        &self,
        state: &Self::State,
        action: &Value,
    ) -> Result<(Self::State, Timestep), EnvError> {
        let (inner, timestep) = self.env.step(&state.inner, action)?;
        let step_count = state.step_count + 1;
        let timestep = if !timestep.is_last() && step_count >= self.max_episode_steps {
            // Forced Last with the discount left at its natural value:
            // truncation, not termination.
            Timestep {
                step_type: StepType::Last,
                ..timestep
            }
        } else {
            timestep
        };
        Ok((TimedState { inner, step_count }, timestep))
    }

    fn observation_spec(&self) -> Spec {
        self.env.observation_spec()
    }

    fn action_spec(&self) -> Spec {
        self.env.action_spec()
    }

    fn reward_spec(&self) -> Spec {
        self.env.reward_spec()
    }

    fn discount_spec(&self) -> Spec {
        self.env.discount_spec()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::test_fixtures::{noop, CountEnv};

    #[test]
    fn zero_limit_rejected_at_construction() {
        let err = TimeLimit::new(CountEnv { horizon: 10 }, 0).unwrap_err();
        assert!(err.to_string().contains("max_episode_steps"));
    }

    #[test]
    fn truncates_at_limit_with_natural_discount() {
        // Inner horizon 100 would run long; the limit cuts it at 3.
        let env = TimeLimit::new(CountEnv { horizon: 100 }, 3).unwrap();
        let (mut state, _) = env.reset(0);
        let mut last = None;
        for _ in 0..3 {
            let (next, ts) = env.step(&state, &noop()).unwrap();
            state = next;
            last = Some(ts);
        }
        let ts = last.unwrap();
        assert!(ts.is_last());
        assert!((ts.discount - 1.0).abs() < f32::EPSILON, "truncation keeps discount");
        assert_eq!(state.step_count(), 3);
    }

    #[test]
    fn natural_termination_passes_through() {
        // Inner horizon 2 ends before the limit of 10: a true termination
        // with discount 0, untouched by the wrapper.
        let env = TimeLimit::new(CountEnv { horizon: 2 }, 10).unwrap();
        let (s0, _) = env.reset(0);
        let (s1, ts) = env.step(&s0, &noop()).unwrap();
        assert!(ts.is_mid());
        let (_, ts) = env.step(&s1, &noop()).unwrap();
        assert!(ts.is_last());
        assert!(ts.discount.abs() < f32::EPSILON, "termination forces discount 0");
    }

    #[test]
    fn termination_exactly_at_limit_keeps_zero_discount() {
        // Domain termination and the limit coincide: the domain's discount
        // wins, since the episode genuinely ended.
        let env = TimeLimit::new(CountEnv { horizon: 3 }, 3).unwrap();
        let (mut state, _) = env.reset(0);
        let mut ts = None;
        for _ in 0..3 {
            let (next, t) = env.step(&state, &noop()).unwrap();
            state = next;
            ts = Some(t);
        }
        let ts = ts.unwrap();
        assert!(ts.is_last());
        assert!(ts.discount.abs() < f32::EPSILON);
    }

    #[test]
    fn reset_clears_the_counter() {
        let env = TimeLimit::new(CountEnv { horizon: 100 }, 2).unwrap();
        let (s0, _) = env.reset(0);
        let (s1, _) = env.step(&s0, &noop()).unwrap();
        assert_eq!(s1.step_count(), 1);
        let (fresh, _) = env.reset(1);
        assert_eq!(fresh.step_count(), 0);
    }

    #[test]
    fn counter_lives_in_state_not_wrapper() {
        // Forking the state forks the counter: two lineages stepped from the
        // same snapshot truncate independently.
        let env = TimeLimit::new(CountEnv { horizon: 100 }, 2).unwrap();
        let (s0, _) = env.reset(0);
        let (s1, _) = env.step(&s0, &noop()).unwrap();

        let (_, ts_a) = env.step(&s1, &noop()).unwrap();
        let (_, ts_b) = env.step(&s1, &noop()).unwrap();
        assert!(ts_a.is_last());
        assert!(ts_b.is_last());

        // The original snapshot is still one step in.
        let (_, ts_c) = env.step(&s0, &noop()).unwrap();
        assert!(ts_c.is_mid());
    }

    #[test]
    fn composes_under_auto_reset() {
        use crate::auto_reset::AutoReset;

        // Time-limit inside auto-reset: truncation looks like any other
        // Last, so the next call starts a new episode.
        let env = AutoReset::new(TimeLimit::new(CountEnv { horizon: 100 }, 2).unwrap());
        let (mut state, _) = env.reset(0);
        let mut saw_first_after_last = false;
        let mut prev_last = false;
        for _ in 0..10 {
            let (next, ts) = env.step(&state, &noop()).unwrap();
            if prev_last {
                assert!(ts.is_first());
                saw_first_after_last = true;
            }
            prev_last = ts.is_last();
            state = next;
        }
        assert!(saw_first_after_last);
    }
}
