use super::experience::Trajectory;
use super::persistence;
use super::record_schema::RecordSchema;
use super::sampler;
use crate::config::BufferConfig;
use crate::error::{BufferError, Result};
use crate::misc::cumsum;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::Rng;
use std::path::Path;
use ulid::Ulid;

/// Circular store of fixed-length trajectories.
///
/// Backed by a preallocated `(max_trajectories, trajectory_length, width)`
/// array. Once every slot is filled, each insertion overwrites the oldest
/// trajectory.
#[derive(Debug, Clone)]
pub struct TrajectoryBuffer {
    trajectories: Array3<f32>,
    episode_ids: Vec<Option<Ulid>>,
    schema: RecordSchema,
    stored_trajectories: usize,
    new_trajectory_idx: usize,
    max_trajectories: usize,
    trajectory_length: usize,
    discount_factor: f64,
    immutable: bool,
}

impl TrajectoryBuffer {
    pub fn new(
        trajectory_length: usize,
        state_dim: usize,
        action_dim: usize,
        max_trajectories: usize,
        discount_factor: f64,
        immutable: bool,
        load_from: Option<&Path>,
    ) -> Result<Self> {
        BufferConfig::new(trajectory_length, state_dim, action_dim)
            .with_max_trajectories(max_trajectories)
            .with_discount_factor(discount_factor)
            .validate()?;

        let schema = RecordSchema::new(state_dim, action_dim);
        let mut buffer = TrajectoryBuffer {
            trajectories: Array3::zeros((max_trajectories, trajectory_length, schema.width())),
            episode_ids: vec![None; max_trajectories],
            schema,
            stored_trajectories: 0,
            new_trajectory_idx: 0,
            max_trajectories,
            trajectory_length,
            discount_factor,
            immutable,
        };
        if immutable {
            tracing::info!("Creating immutable replay buffer");
        }
        if let Some(path) = load_from {
            buffer.restore(path)?;
        }
        Ok(buffer)
    }

    pub fn from_config(config: &BufferConfig) -> Result<Self> {
        Self::new(
            config.trajectory_length,
            config.state_dim,
            config.action_dim,
            config.max_trajectories,
            config.discount_factor,
            config.immutable,
            config.load_from.as_deref(),
        )
    }

    /// Number of trajectories currently stored.
    pub fn len(&self) -> usize {
        self.stored_trajectories
    }

    pub fn is_empty(&self) -> bool {
        self.stored_trajectories == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_trajectories
    }

    pub fn trajectory_length(&self) -> usize {
        self.trajectory_length
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Slot the next insertion will write to.
    pub fn new_trajectory_idx(&self) -> usize {
        self.new_trajectory_idx
    }

    /// Packs `trajectory` into the next slot.
    ///
    /// Every precondition is checked before anything is written, so a
    /// failed call leaves contents and counters untouched.
    pub fn add_trajectory(&mut self, trajectory: &Trajectory, force: bool) -> Result<()> {
        if self.immutable && !force {
            return Err(BufferError::ImmutableBufferError);
        }
        if trajectory.len() != self.trajectory_length {
            return Err(BufferError::InvalidTrajectoryLength {
                expected: self.trajectory_length,
                actual: trajectory.len(),
            });
        }
        for experience in trajectory {
            self.schema.check(experience)?;
        }
        if self.immutable {
            tracing::warn!("Forcing insertion into immutable replay buffer");
        }

        let slot = self.new_trajectory_idx;
        let terminal_state = match trajectory.last() {
            Some(last) => last.next_state.as_slice(),
            None => {
                return Err(BufferError::InvalidTrajectoryLength {
                    expected: self.trajectory_length,
                    actual: 0,
                })
            }
        };
        let rewards: Vec<f64> = trajectory.iter().map(|e| e.reward as f64).collect();
        let steps = cumsum::cumsum_rev(&rewards, self.discount_factor);

        let mut slot_view = self.trajectories.index_axis_mut(Axis(0), slot);
        for ((experience, step), row) in trajectory
            .iter()
            .zip(&steps)
            .zip(slot_view.rows_mut())
        {
            self.schema.pack(
                experience,
                terminal_state,
                step.terminal_factor as f32,
                step.mc_return as f32,
                row,
            );
        }
        self.episode_ids[slot] = Some(trajectory.episode_id());

        self.new_trajectory_idx = (self.new_trajectory_idx + 1) % self.max_trajectories;
        if self.stored_trajectories < self.max_trajectories {
            self.stored_trajectories += 1;
        }

        tracing::debug!(
            slot,
            episode_id = %trajectory.episode_id(),
            mc_return = steps[0].mc_return,
            stored = self.stored_trajectories,
            "added trajectory"
        );
        Ok(())
    }

    /// Adds each trajectory in order. Stops at the first failure; earlier
    /// insertions are kept.
    pub fn add_trajectories(&mut self, trajectories: &[Trajectory], force: bool) -> Result<()> {
        for trajectory in trajectories {
            self.add_trajectory(trajectory, force)?;
        }
        Ok(())
    }

    /// Samples `batch_size` records uniformly, with replacement, from the
    /// stored trajectories. Rows are `schema().width()` wide.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Array2<f32>> {
        let indices = self.sample_indices(batch_size, rng)?;
        Ok(sampler::gather(self.populated(), &indices))
    }

    /// The `(slot, timestep)` pairs `sample` would gather for the same rng state.
    pub fn sample_indices<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>> {
        if self.stored_trajectories == 0 {
            return Err(BufferError::EmptyBufferError);
        }
        Ok(sampler::sample_indices(
            rng,
            self.stored_trajectories,
            self.trajectory_length,
            batch_size,
        ))
    }

    /// The packed `(trajectory_length, width)` records of a populated slot.
    pub fn trajectory(&self, slot: usize) -> Option<ArrayView2<f32>> {
        if slot < self.stored_trajectories {
            Some(self.trajectories.index_axis(Axis(0), slot))
        } else {
            None
        }
    }

    /// Episode id of the rollout held in `slot`; `None` for empty slots and
    /// slots restored from disk.
    pub fn trajectory_id(&self, slot: usize) -> Option<Ulid> {
        self.episode_ids.get(slot).copied().flatten()
    }

    /// Slot currently holding the rollout with `episode_id`, if it has not
    /// been overwritten.
    pub fn find_trajectory(&self, episode_id: Ulid) -> Option<usize> {
        self.episode_ids[..self.stored_trajectories]
            .iter()
            .position(|id| *id == Some(episode_id))
    }

    /// The populated prefix `[0, len())` of the backing array.
    pub fn populated(&self) -> ArrayView3<f32> {
        self.trajectories.slice(s![..self.stored_trajectories, .., ..])
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::save(path, self.populated())
    }

    /// Replaces the buffer contents with a snapshot written by `save`.
    ///
    /// At most `capacity()` trajectories are copied; the write cursor is
    /// placed at `loaded_count % capacity()`.
    pub fn restore(&mut self, path: &Path) -> Result<()> {
        let loaded = persistence::load(path, (self.trajectory_length, self.schema.width()))?;
        let loaded_count = loaded.len_of(Axis(0));
        let kept = loaded_count.min(self.max_trajectories);

        self.trajectories.fill(0.0);
        self.trajectories
            .slice_mut(s![..kept, .., ..])
            .assign(&loaded.slice(s![..kept, .., ..]));
        self.episode_ids.iter_mut().for_each(|id| *id = None);
        self.stored_trajectories = kept;
        self.new_trajectory_idx = loaded_count % self.max_trajectories;

        tracing::info!(
            path = %path.display(),
            loaded = loaded_count,
            stored = kept,
            "Restored replay buffer"
        );
        Ok(())
    }
}
