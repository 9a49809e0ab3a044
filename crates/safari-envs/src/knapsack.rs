//! Knapsack: pack items into a budget-limited sack.
//!
//! Each episode draws item weights and values from the seed. An action
//! picks an item to pack; packing earns that item's value as reward.
//! Picking an item that is already packed or does not fit is a legal but
//! ineffective move (a no-op `Mid` transition), never an error. The episode
//! terminates once no unpacked item fits the remaining budget.
//!
//! The observation is a dict — weights, values, packed mask, remaining
//! budget — exercising composite specs end to end.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use safari_core::error::{ConfigError, EnvError};
use safari_core::spec::Spec;
use safari_core::types::Timestep;
use safari_core::value::{Tensor, Value};
use safari_env::env::Environment;

// ---------------------------------------------------------------------------
// KnapsackConfig
// ---------------------------------------------------------------------------

/// Problem size for [`Knapsack`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnapsackConfig {
    /// Number of items per episode.
    pub num_items: usize,
    /// Total weight budget.
    pub capacity: f32,
}

impl Default for KnapsackConfig {
    fn default() -> Self {
        Self {
            num_items: 10,
            capacity: 2.0,
        }
    }
}

impl KnapsackConfig {
    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_items == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_items".into(),
                message: "must be >= 1".into(),
            });
        }
        if !(self.capacity > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "capacity".into(),
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Knapsack
// ---------------------------------------------------------------------------

/// The Knapsack environment.
#[derive(Debug, Clone)]
pub struct Knapsack {
    config: KnapsackConfig,
}

/// Full state of one Knapsack episode.
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackState {
    pub weights: Vec<f32>,
    pub values: Vec<f32>,
    pub packed: Vec<bool>,
    pub remaining: f32,
    /// Generator state, threaded through so transitions stay pure.
    pub rng: ChaCha8Rng,
}

impl KnapsackState {
    /// Whether any unpacked item still fits the remaining budget.
    #[must_use]
    pub fn any_item_fits(&self) -> bool {
        self.weights
            .iter()
            .zip(&self.packed)
            .any(|(w, packed)| !packed && *w <= self.remaining)
    }
}

impl Knapsack {
    /// Build a Knapsack environment, validating the config eagerly.
    pub fn new(config: KnapsackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Problem size.
    #[must_use]
    pub const fn config(&self) -> &KnapsackConfig {
        &self.config
    }

    fn observe(&self, state: &KnapsackState) -> Value {
        let n = self.config.num_items;
        Value::dict([
            (
                "weights".to_string(),
                Value::Leaf(Tensor::from_f32(vec![n], state.weights.clone())),
            ),
            (
                "values".to_string(),
                Value::Leaf(Tensor::from_f32(vec![n], state.values.clone())),
            ),
            (
                "packed".to_string(),
                Value::Leaf(Tensor::from_bool(vec![n], state.packed.clone())),
            ),
            (
                "remaining".to_string(),
                Value::scalar_f32(state.remaining),
            ),
        ])
    }
}

impl Environment for Knapsack {
    type State = KnapsackState;

    fn reset(&self, seed: u64) -> (Self::State, Timestep) {
        let n = self.config.num_items;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let weights: Vec<f32> = (0..n).map(|_| rng.gen_range(0.05..1.0)).collect();
        let values: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
        let state = KnapsackState {
            weights,
            values,
            packed: vec![false; n],
            remaining: self.config.capacity,
            rng,
        };
        let timestep = Timestep::restart(self.observe(&state));
        (state, timestep)
    }

    fn step(
        &self,
        state: &Self::State,
        action: &Value,
    ) -> Result<(Self::State, Timestep), EnvError> {
        if !state.any_item_fits() {
            return Err(EnvError::StateMismatch(
                "episode already ended; reset to start a new one".into(),
            ));
        }
        self.action_spec().validate(action)?;
        let item = action
            .as_leaf()
            .and_then(Tensor::scalar_as_i64)
            .ok_or_else(|| EnvError::StateMismatch("action is not a scalar int".into()))?
            as usize;

        let mut next = state.clone();
        let reward;
        if state.packed[item] || state.weights[item] > state.remaining {
            // Legal but ineffective pick: nothing changes, no reward.
            reward = 0.0;
        } else {
            next.packed[item] = true;
            next.remaining -= state.weights[item];
            reward = state.values[item];
        }

        let observation = self.observe(&next);
        let timestep = if next.any_item_fits() {
            Timestep::transition(reward, observation)
        } else {
            Timestep::termination(reward, observation)
        };
        Ok((next, timestep))
    }

    fn observation_spec(&self) -> Spec {
        let n = self.config.num_items;
        Spec::dict([
            ("weights".to_string(), Spec::bounded_float(vec![n], 0.0, 1.0)),
            ("values".to_string(), Spec::bounded_float(vec![n], 0.0, 1.0)),
            ("packed".to_string(), Spec::bools(vec![n])),
            (
                "remaining".to_string(),
                Spec::bounded_float(Vec::new(), 0.0, f64::from(self.config.capacity)),
            ),
        ])
    }

    fn action_spec(&self) -> Spec {
        Spec::discrete(self.config.num_items as i64)
    }

    fn reward_spec(&self) -> Spec {
        Spec::bounded_float(Vec::new(), 0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
