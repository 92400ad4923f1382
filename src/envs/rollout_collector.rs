use super::base_env::BaseEnv;
use crate::memory::{Experience, Trajectory};

/// Runs a policy against an environment and cuts the stream of transitions
/// into trajectories of exactly `trajectory_length` steps.
pub struct RolloutCollector {
    trajectory_length: usize,
}

impl RolloutCollector {
    pub fn new(trajectory_length: usize) -> Self {
        assert!(trajectory_length > 0);
        RolloutCollector { trajectory_length }
    }

    pub fn trajectory_length(&self) -> usize {
        self.trajectory_length
    }

    /// Collects one trajectory starting from a fresh `reset`.
    ///
    /// `policy` maps a state to `(action, log_prob)`. When the environment
    /// reports `done` before the trajectory is full, it is reset and the
    /// rollout continues, so the result always has `trajectory_length` steps.
    pub fn collect<E, P>(&self, env: &mut E, policy: &mut P) -> Trajectory
    where
        E: BaseEnv + ?Sized,
        P: FnMut(&[f32]) -> (Vec<f32>, f32),
    {
        let mut experiences = Vec::with_capacity(self.trajectory_length);
        let mut state = env.reset();
        let mut episodes = 1;
        while experiences.len() < self.trajectory_length {
            let (action, log_prob) = policy(&state);
            let result = env.step(&action);
            let done = result.done;
            experiences.push(Experience::new(
                state,
                action,
                result.next_state.clone(),
                result.reward,
                done,
                log_prob,
            ));
            state = if done && experiences.len() < self.trajectory_length {
                episodes += 1;
                env.reset()
            } else {
                result.next_state
            };
        }

        let trajectory = Trajectory::new(experiences);
        tracing::debug!(
            episode_id = %trajectory.episode_id(),
            episodes,
            total_reward = trajectory.total_reward(),
            "collected trajectory"
        );
        trajectory
    }

    pub fn collect_many<E, P>(&self, env: &mut E, policy: &mut P, n_trajectories: usize) -> Vec<Trajectory>
    where
        E: BaseEnv + ?Sized,
        P: FnMut(&[f32]) -> (Vec<f32>, f32),
    {
        (0..n_trajectories)
            .map(|_| self.collect(env, policy))
            .collect()
    }
}
