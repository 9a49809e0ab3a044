//! Timestep: the immutable outcome of one environment transition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

// ---------------------------------------------------------------------------
// StepType
// ---------------------------------------------------------------------------

/// Position of a timestep within an episode.
///
/// Within one episode the sequence is always `First, Mid*, Last`; a `Last`
/// is never followed by a `Mid` without an intervening reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    /// First timestep of an episode, produced by `reset`.
    First,
    /// Any timestep that is neither first nor last.
    Mid,
    /// Final timestep of an episode (termination or truncation).
    Last,
}

impl StepType {
    /// Returns `true` for the first timestep of an episode.
    #[must_use]
    pub const fn is_first(self) -> bool {
        matches!(self, Self::First)
    }

    /// Returns `true` for intermediate timesteps.
    #[must_use]
    pub const fn is_mid(self) -> bool {
        matches!(self, Self::Mid)
    }

    /// Returns `true` for the final timestep of an episode.
    #[must_use]
    pub const fn is_last(self) -> bool {
        matches!(self, Self::Last)
    }
}

// ---------------------------------------------------------------------------
// Timestep
// ---------------------------------------------------------------------------

/// Outcome of one `reset`/`step` call.
///
/// Produced fresh by every transition and never mutated afterward. Wrappers
/// may replace a timestep wholesale (auto-reset substitutes a fresh `First`)
/// but never edit one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestep {
    pub step_type: StepType,
    pub reward: f32,
    /// Discount in `[0, 1]`. Zero on termination; left at its natural value
    /// on truncation, which is how drivers tell the two apart.
    pub discount: f32,
    pub observation: Value,
    /// Open, environment-defined auxiliary metrics.
    pub extras: BTreeMap<String, f32>,
}

impl Timestep {
    /// First timestep of an episode: zero reward, discount 1.
    #[must_use]
    pub fn restart(observation: Value) -> Self {
        Self {
            step_type: StepType::First,
            reward: 0.0,
            discount: 1.0,
            observation,
            extras: BTreeMap::new(),
        }
    }

    /// Ordinary mid-episode transition with discount 1.
    #[must_use]
    pub fn transition(reward: f32, observation: Value) -> Self {
        Self {
            step_type: StepType::Mid,
            reward,
            discount: 1.0,
            observation,
            extras: BTreeMap::new(),
        }
    }

    /// Episode end by domain rules: discount forced to 0.
    #[must_use]
    pub fn termination(reward: f32, observation: Value) -> Self {
        Self {
            step_type: StepType::Last,
            reward,
            discount: 0.0,
            observation,
            extras: BTreeMap::new(),
        }
    }

    /// Episode end for external reasons (e.g. a time limit): the discount
    /// keeps its natural value.
    #[must_use]
    pub fn truncation(reward: f32, observation: Value, discount: f32) -> Self {
        Self {
            step_type: StepType::Last,
            reward,
            discount,
            observation,
            extras: BTreeMap::new(),
        }
    }

    /// Attach an extras entry. Returns `self` for chaining.
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: f32) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }

    /// Returns `true` if this is the first timestep of an episode.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.step_type.is_first()
    }

    /// Returns `true` if this is a mid-episode timestep.
    #[must_use]
    pub const fn is_mid(&self) -> bool {
        self.step_type.is_mid()
    }

    /// Returns `true` if this is the final timestep of an episode.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.step_type.is_last()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
