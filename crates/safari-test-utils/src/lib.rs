//! Shared test fixtures and utilities for Safari crates.
//!
//! Provides deterministic RNG setup, mock environments, and rollout/smoke
//! checkers for the properties every environment must satisfy.

pub mod episodes;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use episodes::{check_env_does_not_smoke, check_env_specs, run_episode, EpisodeSummary};
pub use mocks::{AlwaysLose, Counting};
pub use rng::seeded_rng;
