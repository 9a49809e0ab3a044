//! Auto-reset wrapper: makes episode boundaries invisible to the driver.
//!
//! Wrapping an environment in [`AutoReset`] guarantees that every `Last`
//! timestep is followed by a fresh episode without manual intervention, so a
//! driver can run fixed-length batches without tracking terminations. Reset
//! seeds derive deterministically from the seed passed to the wrapper's own
//! `reset` and an episode counter carried in the wrapper state; no mutable
//! storage hides inside the wrapper itself.

use tracing::debug;

use safari_core::error::EnvError;
use safari_core::seed::derive_seed_indexed;
use safari_core::spec::Spec;
use safari_core::types::Timestep;
use safari_core::value::Value;

use crate::env::Environment;

// ---------------------------------------------------------------------------
// AutoResetMode
// ---------------------------------------------------------------------------

/// Which call surfaces the fresh episode after a termination.
///
/// Driver logic depends on exactly one of these conventions, so the mode is
/// fixed at construction and documented per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoResetMode {
    /// The terminating call returns the true terminal timestep. The *next*
    /// `step` call performs the reset instead of stepping — its action is
    /// ignored — and returns the new episode's `First` timestep.
    #[default]
    NextStep,
    /// The terminating call resets immediately and returns a timestep
    /// carrying the terminal step type, reward, and discount, but the fresh
    /// episode's first observation. No separate `First` timestep appears.
    Immediate,
}

// ---------------------------------------------------------------------------
// AutoReset
// ---------------------------------------------------------------------------

/// Wrapper that starts a new episode whenever the inner environment ends one.
#[derive(Debug, Clone)]
pub struct AutoReset<E> {
    env: E,
    mode: AutoResetMode,
}

/// Inner state plus the bookkeeping auto-reset needs: the root seed episode
/// seeds derive from, how many episodes have completed, and (in
/// [`AutoResetMode::NextStep`]) whether a reset is owed on the next call.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoResetState<S> {
    inner: S,
    root_seed: u64,
    episodes_completed: u64,
    pending_reset: bool,
}

impl<S> AutoResetState<S> {
    /// The wrapped environment's state.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of episodes completed since the wrapper was reset.
    #[must_use]
    pub const fn episodes_completed(&self) -> u64 {
        self.episodes_completed
    }
}

impl<E> AutoReset<E> {
    /// Wrap `env` with the default [`AutoResetMode::NextStep`] convention.
    #[must_use]
    pub fn new(env: E) -> Self {
        Self {
            env,
            mode: AutoResetMode::default(),
        }
    }

    /// Wrap `env` with an explicit reset convention.
    #[must_use]
    pub const fn with_mode(env: E, mode: AutoResetMode) -> Self {
        Self { env, mode }
    }

    /// The reset convention in effect.
    #[must_use]
    pub const fn mode(&self) -> AutoResetMode {
        self.mode
    }

    /// The wrapped environment.
    pub const fn inner(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> AutoReset<E> {
    fn next_episode(&self, root_seed: u64, episode: u64) -> (E::State, Timestep) {
        let seed = derive_seed_indexed(root_seed, episode);
        debug!(episode, seed, "auto-reset: starting new episode");
        self.env.reset(seed)
    }
}

impl<E: Environment> Environment for AutoReset<E> {
    type State = AutoResetState<E::State>;

    fn reset(&self, seed: u64) -> (Self::State, Timestep) {
        let (inner, timestep) = self.env.reset(seed);
        let state = AutoResetState {
            inner,
            root_seed: seed,
            episodes_completed: 0,
            pending_reset: false,
        };
        (state, timestep)
    }

    fn step(
        &self,
        state: &Self::State,
        action: &Value,
    ) -> Result<(Self::State, Timestep), EnvError> {
        if state.pending_reset {
            // NextStep convention: this call performs the owed reset. The
            // action is ignored and not validated.
            let (inner, timestep) =
                self.next_episode(state.root_seed, state.episodes_completed);
            let next = AutoResetState {
                inner,
                root_seed: state.root_seed,
                episodes_completed: state.episodes_completed,
                pending_reset: false,
            };
            return Ok((next, timestep));
        }

        let (inner, timestep) = self.env.step(&state.inner, action)?;
        if !timestep.is_last() {
            let next = AutoResetState {
                inner,
                root_seed: state.root_seed,
                episodes_completed: state.episodes_completed,
                pending_reset: false,
            };
            return Ok((next, timestep));
        }

        let completed = state.episodes_completed + 1;
        match self.mode {
            AutoResetMode::NextStep => {
                let next = AutoResetState {
                    inner,
                    root_seed: state.root_seed,
                    episodes_completed: completed,
                    pending_reset: true,
                };
                Ok((next, timestep))
            }
            AutoResetMode::Immediate => {
                let (fresh, reset_ts) = self.next_episode(state.root_seed, completed);
                let next = AutoResetState {
                    inner: fresh,
                    root_seed: state.root_seed,
                    episodes_completed: completed,
                    pending_reset: false,
                };
                // Terminal reward/discount/step type, fresh observation.
                let merged = Timestep {
                    observation: reset_ts.observation,
                    ..timestep
                };
                Ok((next, merged))
            }
        }
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
    use crate::env::test_fixtures::{assert_step_type, noop, CountEnv};
    use safari_core::types::StepType;

    #[test]
    fn next_step_mode_emits_last_then_first() {
        let env = AutoReset::new(CountEnv { horizon: 2 });
        let (s0, ts) = env.reset(0);
        assert_step_type(&ts, StepType::First);

        let (s1, ts) = env.step(&s0, &noop()).unwrap();
        assert_step_type(&ts, StepType::Mid);
        let (s2, ts) = env.step(&s1, &noop()).unwrap();
        assert_step_type(&ts, StepType::Last);
        assert!((ts.reward - 1.0).abs() < f32::EPSILON);
        assert!(ts.discount.abs() < f32::EPSILON);

        // The very next call starts a fresh episode.
        let (_, ts) = env.step(&s2, &noop()).unwrap();
        assert_step_type(&ts, StepType::First);
        assert!(ts.reward.abs() < f32::EPSILON);
    }

    #[test]
    fn immediate_mode_merges_terminal_and_first() {
        let env = AutoReset::with_mode(CountEnv { horizon: 1 }, AutoResetMode::Immediate);
        let (s0, _) = env.reset(3);

        let (s1, ts) = env.step(&s0, &noop()).unwrap();
        // Terminal bookkeeping from the ended episode, but the fresh
        // episode's initial observation: in this convention no separate
        // First timestep ever surfaces.
        assert_step_type(&ts, StepType::Last);
        assert!((ts.reward - 1.0).abs() < f32::EPSILON);
        assert!(ts.discount.abs() < f32::EPSILON);
        assert_eq!(s1.episodes_completed(), 1);

        // Subsequent step continues the fresh episode (no dead state).
        let (_, ts) = env.step(&s1, &noop()).unwrap();
        assert_step_type(&ts, StepType::Last); // horizon 1: every step terminates
    }

    #[test]
    fn liveness_no_consecutive_unresolved_lasts() {
        let env = AutoReset::new(CountEnv { horizon: 1 });
        let (mut state, mut prev) = env.reset(0);
        for _ in 0..20 {
            let (next, ts) = env.step(&state, &noop()).unwrap();
            if prev.is_last() {
                assert!(ts.is_first(), "a Last must be followed by a First");
            }
            state = next;
            prev = ts;
        }
    }

    #[test]
    fn derived_episode_seeds_are_deterministic() {
        let env = AutoReset::new(CountEnv { horizon: 1 });
        let run = |root: u64| {
            let (mut state, _) = env.reset(root);
            let mut observations = Vec::new();
            for _ in 0..8 {
                let (next, ts) = env.step(&state, &noop()).unwrap();
                observations.push(ts.observation);
                state = next;
            }
            observations
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    /// One-step env whose state records the seed it was reset with, to
    /// observe which seeds the wrapper feeds to `reset`.
    struct SeedProbe;

    impl Environment for SeedProbe {
        type State = u64;

        fn reset(&self, seed: u64) -> (Self::State, Timestep) {
            (seed, Timestep::restart(Value::scalar_f32(0.0)))
        }

        fn step(
            &self,
            state: &Self::State,
            _action: &Value,
        ) -> Result<(Self::State, Timestep), EnvError> {
            Ok((*state, Timestep::termination(0.0, Value::scalar_f32(1.0))))
        }

        fn observation_spec(&self) -> Spec {
            Spec::unit_interval()
        }

        fn action_spec(&self) -> Spec {
            Spec::discrete(2)
        }
    }

    #[test]
    fn reset_seed_not_reused_verbatim() {
        let env = AutoReset::new(SeedProbe);
        let (s0, _) = env.reset(3);
        assert_eq!(*s0.inner(), 3);
        let (s1, _last) = env.step(&s0, &noop()).unwrap();
        let (s2, fresh) = env.step(&s1, &noop()).unwrap();
        assert!(fresh.is_first());
        // The second episode runs on a derived seed, not the root verbatim.
        assert_eq!(*s2.inner(), derive_seed_indexed(3, 1));
        assert_ne!(*s2.inner(), 3);
    }

    #[test]
    fn specs_delegate_to_inner() {
        let inner = CountEnv { horizon: 2 };
        let env = AutoReset::new(CountEnv { horizon: 2 });
        assert_eq!(env.observation_spec(), inner.observation_spec());
        assert_eq!(env.action_spec(), inner.action_spec());
    }

    #[test]
    fn mid_episode_steps_pass_through() {
        let env = AutoReset::new(CountEnv { horizon: 5 });
        let (mut state, _) = env.reset(0);
        for _ in 0..4 {
            let (next, ts) = env.step(&state, &noop()).unwrap();
            assert!(ts.is_mid());
            state = next;
        }
        assert_eq!(state.episodes_completed(), 0);
    }
}
