// safari-envs: Concrete environments built on the Safari contract.

pub mod catch;
pub mod knapsack;

pub use catch::{Catch, CatchConfig, CatchState};
pub use knapsack::{Knapsack, KnapsackConfig, KnapsackState};
