use thiserror::Error;

use crate::value::ElementType;

/// Top-level error type for safari-core.
#[derive(Debug, Error)]
pub enum SafariError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Spec violation: {0}")]
    Spec(#[from] SpecError),

    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
}

/// Configuration errors, raised eagerly at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Spec validation errors.
///
/// Every variant carries the path of the offending field within the value
/// tree (e.g. `observation.agents.0`), so a failure deep inside a nested
/// structure is attributable without a debugger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("{path}: expected shape {expected:?}, got {got:?}")]
    ShapeMismatch {
        path: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("{path}: expected dtype {expected}, got {got}")]
    DtypeMismatch {
        path: String,
        expected: ElementType,
        got: ElementType,
    },

    #[error("{path}: value {value} outside bounds [{minimum}, {maximum}]")]
    OutOfBounds {
        path: String,
        value: f64,
        minimum: f64,
        maximum: f64,
    },

    #[error("{path}: expected {expected} children, got {got}")]
    ArityMismatch {
        path: String,
        expected: usize,
        got: usize,
    },

    #[error("{path}: missing field `{field}`")]
    MissingField { path: String, field: String },

    #[error("{path}: unexpected field `{field}`")]
    UnexpectedField { path: String, field: String },

    #[error("{path}: expected a {expected} value")]
    StructureMismatch {
        path: String,
        expected: &'static str,
    },
}

/// Environment contract violations.
///
/// These indicate caller or implementation bugs and are never encoded in a
/// [`Timestep`](crate::types::Timestep). Domain-legal-but-unsuccessful moves
/// are ordinary timesteps, not errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("action does not conform to the action spec: {0}")]
    ActionSpecViolation(#[from] SpecError),

    #[error("state was not produced by this environment: {0}")]
    StateMismatch(String),

    #[error("batch error: {0}")]
    Batch(#[from] BatchError),
}

/// Errors from stacking/unstacking value trees across batch lanes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("cannot stack an empty batch")]
    EmptyBatch,

    #[error("{path}: lane structures differ")]
    LaneMismatch { path: String },

    #[error("expected {expected} lanes, got {got}")]
    WrongLaneCount { expected: usize, got: usize },

    #[error("{path}: leading dimension {got} does not match lane count {expected}")]
    LeadingDimMismatch {
        path: String,
        expected: usize,
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
