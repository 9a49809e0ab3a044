//! The core environment contract.
//!
//! An [`Environment`] is a bundle of pure functions over an explicit
//! [`State`](Environment::State) value. The environment object itself holds
//! only immutable configuration; everything needed to compute the next
//! transition, including any pseudo-random generator, lives in the state the
//! caller threads through. That statelessness is what makes transitions
//! replayable, forkable, and batchable across lanes.

use std::fmt;

use safari_core::error::EnvError;
use safari_core::spec::Spec;
use safari_core::types::Timestep;
use safari_core::value::Value;

/// A purely-functional reinforcement-learning environment.
///
/// # Contract
///
/// - `reset` and `step` are deterministic given their inputs. Stochastic
///   environments carry their generator inside `State` and return an
///   advanced copy, never reaching for an ambient source of randomness.
/// - `step` never mutates the state it is given; it returns a new one. The
///   caller owns states between calls and may snapshot or fork them freely.
/// - A malformed action is a caller bug and fails with
///   [`EnvError::ActionSpecViolation`]. A domain-legal-but-unsuccessful move
///   (hitting a wall, repacking an item) is an ordinary [`Timestep`] — data,
///   never an error.
pub trait Environment {
    /// Everything needed to compute the next transition.
    type State: Clone + fmt::Debug;

    /// Start a new episode.
    ///
    /// Deterministic given `seed`, which is the sole source of randomness
    /// consumed. The returned timestep has step type `First`, zero reward,
    /// and discount 1.
    fn reset(&self, seed: u64) -> (Self::State, Timestep);

    /// Advance one transition.
    ///
    /// Pure function of `(state, action)`. Fails only on contract
    /// violations; domain outcomes are encoded in the timestep.
    fn step(&self, state: &Self::State, action: &Value)
        -> Result<(Self::State, Timestep), EnvError>;

    /// Spec describing observations. Stable for the life of the instance.
    fn observation_spec(&self) -> Spec;

    /// Spec describing legal actions. Stable for the life of the instance.
    fn action_spec(&self) -> Spec;

    /// Spec describing rewards. Defaults to an unbounded float scalar.
    fn reward_spec(&self) -> Spec {
        Spec::float_scalar()
    }

    /// Spec describing discounts. Defaults to a float scalar in `[0, 1]`.
    fn discount_spec(&self) -> Spec {
        Spec::unit_interval()
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// In-crate fixtures for wrapper tests. Richer mocks live in
/// `safari-test-utils`.
#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use safari_core::types::StepType;

    /// Deterministic counting environment: observation is `offset + t` where
    /// `offset` derives from the seed; terminates with reward 1 after
    /// `horizon` steps.
    #[derive(Debug)]
    pub struct CountEnv {
        pub horizon: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct CountState {
        pub t: u32,
        pub offset: f32,
    }

    impl CountEnv {
        fn observe(state: &CountState) -> Value {
            Value::scalar_f32(state.offset + state.t as f32)
        }
    }

    impl Environment for CountEnv {
        type State = CountState;

        fn reset(&self, seed: u64) -> (Self::State, Timestep) {
            let state = CountState {
                t: 0,
                offset: (seed % 7) as f32,
            };
            let ts = Timestep::restart(Self::observe(&state));
            (state, ts)
        }

        fn step(
            &self,
            state: &Self::State,
            action: &Value,
        ) -> Result<(Self::State, Timestep), EnvError> {
            self.action_spec().validate(action)?;
            let next = CountState {
                t: state.t + 1,
                offset: state.offset,
            };
            let obs = Self::observe(&next);
            let ts = if next.t >= self.horizon {
                Timestep::termination(1.0, obs)
            } else {
                Timestep::transition(0.0, obs)
            };
            Ok((next, ts))
        }

        fn observation_spec(&self) -> Spec {
            Spec::float_scalar()
        }

        fn action_spec(&self) -> Spec {
            Spec::discrete(2)
        }
    }

    pub fn noop() -> Value {
        Value::scalar_i64(0)
    }

    pub fn assert_step_type(ts: &Timestep, expected: StepType) {
        assert_eq!(ts.step_type, expected, "unexpected step type: {ts:?}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
