//! Mock environments for testing the contract and the generic wrappers.
//!
//! Lightweight fixtures usable from any crate's test suite without pulling
//! in a real game.

use safari_core::error::EnvError;
use safari_core::spec::Spec;
use safari_core::types::Timestep;
use safari_core::value::Value;
use safari_env::env::Environment;

// ---------------------------------------------------------------------------
// AlwaysLose
// ---------------------------------------------------------------------------

/// Minimal one-step environment that always ends in a loss.
///
/// Action spec is `{0, 1}`, observation spec a scalar in `[0, 1]`.
/// `reset` yields observation `0`; any step yields a termination with
/// reward `-1`, discount `0`, and observation `1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysLose;

/// Whether the single transition has happened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlwaysLoseState {
    pub terminal: bool,
}

impl Environment for AlwaysLose {
    type State = AlwaysLoseState;

    fn reset(&self, _seed: u64) -> (Self::State, Timestep) {
        (
            AlwaysLoseState { terminal: false },
            Timestep::restart(Value::scalar_f32(0.0)),
        )
    }

    fn step(
        &self,
        _state: &Self::State,
        action: &Value,
    ) -> Result<(Self::State, Timestep), EnvError> {
        self.action_spec().validate(action)?;
        Ok((
            AlwaysLoseState { terminal: true },
            Timestep::termination(-1.0, Value::scalar_f32(1.0)),
        ))
    }

    fn observation_spec(&self) -> Spec {
        Spec::unit_interval()
    }

    fn action_spec(&self) -> Spec {
        Spec::discrete(2)
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// Environment that counts up and terminates with reward 1 after `horizon`
/// steps. The observation is the step index; the seed offsets nothing, so
/// two lanes with different seeds still agree — useful when a test wants a
/// fully deterministic fixture.
#[derive(Debug, Clone, Copy)]
pub struct Counting {
    pub horizon: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountingState {
    pub t: u32,
}

impl Counting {
    fn observe(state: &CountingState) -> Value {
        Value::scalar_i64(i64::from(state.t))
    }
}

impl Environment for Counting {
    type State = CountingState;

    fn reset(&self, _seed: u64) -> (Self::State, Timestep) {
        let state = CountingState { t: 0 };
        let ts = Timestep::restart(Self::observe(&state));
        (state, ts)
    }

    fn step(
        &self,
        state: &Self::State,
        action: &Value,
    ) -> Result<(Self::State, Timestep), EnvError> {
        self.action_spec().validate(action)?;
        let next = CountingState { t: state.t + 1 };
        let obs = Self::observe(&next);
        let ts = if next.t >= self.horizon {
            Timestep::termination(1.0, obs)
        } else {
            Timestep::transition(0.0, obs)
        };
        Ok((next, ts))
    }

    fn observation_spec(&self) -> Spec {
        Spec::BoundedArray {
            dtype: safari_core::value::ElementType::Int,
            shape: Vec::new(),
            minimum: 0.0,
            maximum: f64::from(self.horizon),
        }
    }

    fn action_spec(&self) -> Spec {
        Spec::discrete(2)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use safari_core::types::StepType;
    use safari_env::auto_reset::AutoReset;

    #[test]
    fn always_lose_matches_its_contract() {
        let env = AlwaysLose;
        let (state, ts) = env.reset(0);
        assert_eq!(ts.step_type, StepType::First);
        assert!(ts.reward.abs() < f32::EPSILON);
        assert!((ts.discount - 1.0).abs() < f32::EPSILON);
        assert_eq!(ts.observation, Value::scalar_f32(0.0));

        let (state, ts) = env.step(&state, &Value::scalar_i64(0)).unwrap();
        assert!(state.terminal);
        assert_eq!(ts.step_type, StepType::Last);
        assert!((ts.reward + 1.0).abs() < f32::EPSILON);
        assert!(ts.discount.abs() < f32::EPSILON);
        assert_eq!(ts.observation, Value::scalar_f32(1.0));
    }

    #[test]
    fn always_lose_rejects_out_of_spec_action() {
        let env = AlwaysLose;
        let (state, _) = env.reset(0);
        assert!(env.step(&state, &Value::scalar_i64(2)).is_err());
        assert!(env.step(&state, &Value::scalar_f32(0.0)).is_err());
    }

    #[test]
    fn always_lose_under_auto_reset_restarts_at_zero() {
        // The concrete scenario: after the loss, the wrapper yields a First
        // with observation 0 again within one call.
        let env = AutoReset::new(AlwaysLose);
        let (s0, _) = env.reset(0);
        let (s1, last) = env.step(&s0, &Value::scalar_i64(0)).unwrap();
        assert!(last.is_last());
        assert!((last.reward + 1.0).abs() < f32::EPSILON);
        let (_, first) = env.step(&s1, &Value::scalar_i64(0)).unwrap();
        assert!(first.is_first());
        assert_eq!(first.observation, Value::scalar_f32(0.0));
    }

    #[test]
    fn counting_terminates_at_horizon() {
        let env = Counting { horizon: 2 };
        let (s0, _) = env.reset(9);
        let (s1, ts) = env.step(&s0, &Value::scalar_i64(1)).unwrap();
        assert!(ts.is_mid());
        let (_, ts) = env.step(&s1, &Value::scalar_i64(1)).unwrap();
        assert!(ts.is_last());
        assert!((ts.reward - 1.0).abs() < f32::EPSILON);
    }
}
