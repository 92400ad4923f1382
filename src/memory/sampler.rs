use ndarray::parallel::prelude::*;
use ndarray::{s, Array2, ArrayView1, ArrayView3, Zip};
use rand::Rng;

/// Draws `batch_size` `(slot, timestep)` pairs uniformly with replacement
/// from the first `stored_trajectories` slots.
///
/// Indices are drawn one at a time from `rng`, so a seeded generator
/// reproduces the same batch.
pub(crate) fn sample_indices<R: Rng + ?Sized>(
    rng: &mut R,
    stored_trajectories: usize,
    trajectory_length: usize,
    batch_size: usize,
) -> Vec<(usize, usize)> {
    let n_steps = stored_trajectories * trajectory_length;
    assert!(n_steps > 0, "cannot sample from zero stored timesteps");
    (0..batch_size)
        .map(|_| {
            let idx = rng.gen_range(0..n_steps);
            (idx / trajectory_length, idx % trajectory_length)
        })
        .collect()
}

/// Copies the addressed records into a `[indices.len(), width]` matrix.
pub(crate) fn gather(trajectories: ArrayView3<f32>, indices: &[(usize, usize)]) -> Array2<f32> {
    let width = trajectories.shape()[2];
    let mut batch = Array2::zeros((indices.len(), width));
    Zip::from(batch.rows_mut())
        .and(ArrayView1::from(indices))
        .par_for_each(|mut row, &(slot, t)| {
            row.assign(&trajectories.slice(s![slot, t, ..]));
        });
    batch
}
