/// Per-step accumulators of a backward discounted scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountedStep {
    /// `r_i + gamma * return_{i+1}`, seeded with 0 past the last step.
    pub mc_return: f64,
    /// `gamma^(len - i)`: discount from step `i` to the end of the sequence.
    pub terminal_factor: f64,
}

// Reverse cumulative sum considering the discount rate. Iterative so that
// long trajectories cost no stack.
pub fn cumsum_rev(rewards: &[f64], gamma: f64) -> Vec<DiscountedStep> {
    let mut steps = vec![
        DiscountedStep {
            mc_return: 0.0,
            terminal_factor: 1.0,
        };
        rewards.len()
    ];
    let mut mc_return = 0.0;
    let mut terminal_factor = 1.0;
    for (step, &reward) in steps.iter_mut().zip(rewards).rev() {
        terminal_factor *= gamma;
        mc_return = reward + gamma * mc_return;
        *step = DiscountedStep {
            mc_return,
            terminal_factor,
        };
    }
    steps
}
