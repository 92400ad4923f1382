/// Outcome of one environment step. Auxiliary info is not carried.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub next_state: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

pub trait BaseEnv {
    fn reset(&mut self) -> Vec<f32>;
    fn step(&mut self, action: &[f32]) -> StepResult;
}
