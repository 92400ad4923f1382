use super::experience::Trajectory;
use super::trajectory_buffer::TrajectoryBuffer;
use crate::error::Result;
use ndarray::Array2;
use rand::Rng;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to a `TrajectoryBuffer` shared between a writer and
/// readers.
///
/// Each operation holds the lock for its whole duration: an insertion writes
/// all records and bumps the counters before any sampler can look, and a
/// sample reads `(len, cursor)` and the rows under the same guard.
#[derive(Clone)]
pub struct SharedTrajectoryBuffer {
    inner: Arc<Mutex<TrajectoryBuffer>>,
}

impl SharedTrajectoryBuffer {
    pub fn new(buffer: TrajectoryBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    // Insertion only mutates after every check has passed, so a poisoned
    // guard still holds a consistent buffer.
    fn lock(&self) -> MutexGuard<'_, TrajectoryBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_trajectory(&self, trajectory: &Trajectory, force: bool) -> Result<()> {
        self.lock().add_trajectory(trajectory, force)
    }

    pub fn add_trajectories(&self, trajectories: &[Trajectory], force: bool) -> Result<()> {
        self.lock().add_trajectories(trajectories, force)
    }

    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Array2<f32>> {
        self.lock().sample(batch_size, rng)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.lock().save(path)
    }

    /// Runs `f` with exclusive access to the underlying buffer.
    pub fn with_buffer<T>(&self, f: impl FnOnce(&mut TrajectoryBuffer) -> T) -> T {
        f(&mut self.lock())
    }
}
