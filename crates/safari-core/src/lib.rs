// safari-core: Specs, value trees, timesteps, errors, and seeds for Safari environments.

pub mod config;
pub mod error;
pub mod seed;
pub mod spec;
pub mod types;
pub mod value;

pub use error::{BatchError, ConfigError, EnvError, SafariError, SpecError};
pub use spec::Spec;
pub use types::{StepType, Timestep};
pub use value::{ElementType, Tensor, Value};
