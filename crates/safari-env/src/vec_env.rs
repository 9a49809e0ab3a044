//! Vectorized execution: one environment contract lifted over N lanes.
//!
//! [`VecEnv`] runs N independent instances of an environment through a
//! single `reset`/`step` surface. Because transitions are pure functions of
//! their own state, lanes share nothing: each evolves exactly as the
//! unbatched environment would for its own seed and actions. Batched values
//! carry a leading lane dimension on every leaf, produced by
//! [`safari_core::value::stack`].
//!
//! Auto-reset composes per lane: wrap the inner environment in
//! [`AutoReset`](crate::auto_reset::AutoReset) *before* vectorizing, so a
//! `Last` in one lane never blocks or desynchronizes the others.

use std::collections::BTreeMap;

use tracing::trace;

use safari_core::error::{BatchError, ConfigError, EnvError};
use safari_core::seed::SeedHierarchy;
use safari_core::spec::Spec;
use safari_core::types::{StepType, Timestep};
use safari_core::value::{self, Value};

use crate::auto_reset::{AutoReset, AutoResetMode};
use crate::env::Environment;
use crate::time_limit::TimeLimit;

// ---------------------------------------------------------------------------
// BatchedTimestep
// ---------------------------------------------------------------------------

/// Per-lane timesteps stacked along a leading lane dimension.
///
/// Scalar fields become vectors indexed by lane; the observation tree gains
/// a leading dimension on every leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedTimestep {
    pub step_types: Vec<StepType>,
    pub rewards: Vec<f32>,
    pub discounts: Vec<f32>,
    pub observation: Value,
    pub extras: Vec<BTreeMap<String, f32>>,
}

impl BatchedTimestep {
    /// Stack per-lane timesteps into one batched record.
    pub fn from_lanes(lanes: Vec<Timestep>) -> Result<Self, BatchError> {
        if lanes.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        let observations: Vec<Value> = lanes.iter().map(|ts| ts.observation.clone()).collect();
        let observation = value::stack(&observations)?;
        Ok(Self {
            step_types: lanes.iter().map(|ts| ts.step_type).collect(),
            rewards: lanes.iter().map(|ts| ts.reward).collect(),
            discounts: lanes.iter().map(|ts| ts.discount).collect(),
            observation,
            extras: lanes.into_iter().map(|ts| ts.extras).collect(),
        })
    }

    /// Split back into per-lane timesteps. Inverse of [`from_lanes`](Self::from_lanes).
    pub fn lanes(&self) -> Result<Vec<Timestep>, BatchError> {
        let observations = value::unstack(&self.observation, self.num_lanes())?;
        Ok(observations
            .into_iter()
            .enumerate()
            .map(|(i, observation)| Timestep {
                step_type: self.step_types[i],
                reward: self.rewards[i],
                discount: self.discounts[i],
                observation,
                extras: self.extras[i].clone(),
            })
            .collect())
    }

    /// Number of lanes.
    #[must_use]
    pub fn num_lanes(&self) -> usize {
        self.step_types.len()
    }

    /// Indices of lanes whose timestep is `Last`.
    #[must_use]
    pub fn last_lanes(&self) -> Vec<usize> {
        self.step_types
            .iter()
            .enumerate()
            .filter(|(_, st)| st.is_last())
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether any lane ended its episode this step.
    #[must_use]
    pub fn any_last(&self) -> bool {
        self.step_types.iter().any(|st| st.is_last())
    }
}

// ---------------------------------------------------------------------------
// VecEnv
// ---------------------------------------------------------------------------

/// N independent lanes of one environment behind a single batched surface.
#[derive(Debug, Clone)]
pub struct VecEnv<E> {
    env: E,
    num_envs: u16,
}

impl<E> VecEnv<E> {
    /// Lift `env` over `num_envs` lanes.
    pub fn new(env: E, num_envs: u16) -> Result<Self, ConfigError> {
        if num_envs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_envs".into(),
                message: "must be >= 1".into(),
            });
        }
        Ok(Self { env, num_envs })
    }

    /// Number of lanes.
    #[must_use]
    pub const fn num_envs(&self) -> u16 {
        self.num_envs
    }

    /// The per-lane environment.
    pub const fn inner(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> VecEnv<E> {
    /// Reset every lane with its own seed.
    ///
    /// `seeds` must contain exactly one seed per lane.
    pub fn reset(&self, seeds: &[u64]) -> Result<(Vec<E::State>, BatchedTimestep), EnvError> {
        let n = usize::from(self.num_envs);
        if seeds.len() != n {
            return Err(EnvError::Batch(BatchError::WrongLaneCount {
                expected: n,
                got: seeds.len(),
            }));
        }
        trace!(num_envs = n, "vectorized reset");
        let mut states = Vec::with_capacity(n);
        let mut timesteps = Vec::with_capacity(n);
        for seed in seeds {
            let (state, timestep) = self.env.reset(*seed);
            states.push(state);
            timesteps.push(timestep);
        }
        Ok((states, BatchedTimestep::from_lanes(timesteps)?))
    }

    /// Reset every lane with seeds derived from one root seed.
    pub fn reset_from_root(
        &self,
        root_seed: u64,
    ) -> Result<(Vec<E::State>, BatchedTimestep), EnvError> {
        let seeds = SeedHierarchy::new(root_seed).lane_seeds(usize::from(self.num_envs));
        self.reset(&seeds)
    }

    /// Step every lane with its slice of the batched actions.
    ///
    /// `actions` must be a batched value whose leading dimension equals the
    /// lane count; `states` must hold one state per lane. Lanes are stepped
    /// in order, but nothing flows between them.
    pub fn step(
        &self,
        states: &[E::State],
        actions: &Value,
    ) -> Result<(Vec<E::State>, BatchedTimestep), EnvError> {
        let n = usize::from(self.num_envs);
        if states.len() != n {
            return Err(EnvError::Batch(BatchError::WrongLaneCount {
                expected: n,
                got: states.len(),
            }));
        }
        let lane_actions = value::unstack(actions, n).map_err(EnvError::Batch)?;
        let mut next_states = Vec::with_capacity(n);
        let mut timesteps = Vec::with_capacity(n);
        for (state, action) in states.iter().zip(&lane_actions) {
            let (next, timestep) = self.env.step(state, action)?;
            next_states.push(next);
            timesteps.push(timestep);
        }
        Ok((next_states, BatchedTimestep::from_lanes(timesteps)?))
    }

    /// Spec of the batched observation: the per-lane spec with a leading
    /// lane dimension on every leaf.
    #[must_use]
    pub fn observation_spec(&self) -> Spec {
        self.env
            .observation_spec()
            .with_leading_dim(usize::from(self.num_envs))
    }

    /// Spec of the batched actions.
    #[must_use]
    pub fn action_spec(&self) -> Spec {
        self.env
            .action_spec()
            .with_leading_dim(usize::from(self.num_envs))
    }
}

/// Standard wrapper chain: time-limit inside auto-reset inside vectorization.
///
/// Time-limit sits innermost so a truncation looks like any other `Last` to
/// auto-reset; auto-reset sits under the batcher so each lane restarts
/// independently the moment it terminates.
pub fn vectorize<E: Environment>(
    env: E,
    num_envs: u16,
    max_episode_steps: u32,
    mode: AutoResetMode,
) -> Result<VecEnv<AutoReset<TimeLimit<E>>>, ConfigError> {
    let limited = TimeLimit::new(env, max_episode_steps)?;
    VecEnv::new(AutoReset::with_mode(limited, mode), num_envs)
}

/// [`vectorize`] driven by a validated [`RunConfig`].
pub fn vectorize_from_config<E: Environment>(
    env: E,
    config: &safari_core::config::RunConfig,
    mode: AutoResetMode,
) -> Result<VecEnv<AutoReset<TimeLimit<E>>>, ConfigError> {
    config.validate()?;
    vectorize(env, config.num_envs, config.max_episode_steps, mode)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
