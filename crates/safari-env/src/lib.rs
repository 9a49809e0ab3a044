// safari-env: Environment contract and generic wrappers for Safari.

pub mod auto_reset;
pub mod env;
pub mod time_limit;
pub mod vec_env;

pub use auto_reset::{AutoReset, AutoResetMode, AutoResetState};
pub use env::Environment;
pub use time_limit::{TimeLimit, TimedState};
pub use vec_env::{vectorize, vectorize_from_config, BatchedTimestep, VecEnv};
