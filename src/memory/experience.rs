use std::ops::Index;
use ulid::Ulid;

/// One environment transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    pub state: Vec<f32>,
    pub action: Vec<f32>,
    pub next_state: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    /// Log-probability of `action` under the policy that generated it.
    pub log_prob: f32,
}

impl Experience {
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        next_state: Vec<f32>,
        reward: f32,
        done: bool,
        log_prob: f32,
    ) -> Self {
        Experience {
            state,
            action,
            next_state,
            reward,
            done,
            log_prob,
        }
    }
}

/// Ordered experiences from one continuous rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    episode_id: Ulid,
    experiences: Vec<Experience>,
}

impl Trajectory {
    pub fn new(experiences: Vec<Experience>) -> Self {
        Self::with_id(Ulid::new(), experiences)
    }

    pub fn with_id(episode_id: Ulid, experiences: Vec<Experience>) -> Self {
        Trajectory {
            episode_id,
            experiences,
        }
    }

    pub fn episode_id(&self) -> Ulid {
        self.episode_id
    }

    pub fn len(&self) -> usize {
        self.experiences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
    }

    pub fn experiences(&self) -> &[Experience] {
        &self.experiences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Experience> {
        self.experiences.iter()
    }

    pub fn last(&self) -> Option<&Experience> {
        self.experiences.last()
    }

    /// Undiscounted sum of rewards.
    pub fn total_reward(&self) -> f64 {
        self.experiences.iter().map(|e| e.reward as f64).sum()
    }
}

impl From<Vec<Experience>> for Trajectory {
    fn from(experiences: Vec<Experience>) -> Self {
        Trajectory::new(experiences)
    }
}

impl Index<usize> for Trajectory {
    type Output = Experience;

    fn index(&self, index: usize) -> &Experience {
        &self.experiences[index]
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Experience;
    type IntoIter = std::slice::Iter<'a, Experience>;

    fn into_iter(self) -> Self::IntoIter {
        self.experiences.iter()
    }
}
