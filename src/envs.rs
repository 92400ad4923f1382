mod base_env;
mod rollout_collector;

pub use base_env::{BaseEnv, StepResult};
pub use rollout_collector::RolloutCollector;
