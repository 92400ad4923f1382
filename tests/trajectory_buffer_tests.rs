use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;
use trajectory_replay::{
    BatchView, BufferError, Experience, SharedTrajectoryBuffer, Trajectory, TrajectoryBuffer,
};

const STATE_DIM: usize = 6;
const ACTION_DIM: usize = 4;

fn random_trajectory(rng: &mut StdRng, length: usize) -> Trajectory {
    let mut next_state: Vec<f32> = (0..STATE_DIM).map(|_| rng.gen_range(0.0..1.0)).collect();
    let experiences = (0..length)
        .map(|t| {
            let state = next_state.clone();
            let action: Vec<f32> = (0..ACTION_DIM).map(|_| rng.gen_range(-1.0..0.0)).collect();
            next_state = (0..STATE_DIM).map(|_| rng.gen_range(0.0..1.0)).collect();
            Experience::new(
                state,
                action,
                next_state.clone(),
                rng.gen_range(0.0..1.0),
                t + 1 == length,
                rng.gen_range(-3.0..0.0),
            )
        })
        .collect::<Vec<_>>();
    Trajectory::new(experiences)
}

fn unit_reward_trajectory(length: usize) -> Trajectory {
    let experiences = (0..length)
        .map(|t| {
            Experience::new(
                vec![t as f32; STATE_DIM],
                vec![0.0; ACTION_DIM],
                vec![t as f32 + 1.0; STATE_DIM],
                1.0,
                false,
                0.0,
            )
        })
        .collect::<Vec<_>>();
    Trajectory::new(experiences)
}

fn new_buffer(length: usize, capacity: usize) -> TrajectoryBuffer {
    TrajectoryBuffer::new(length, STATE_DIM, ACTION_DIM, capacity, 0.99, false, None).unwrap()
}

#[test]
fn test_len_tracks_insertions_below_capacity() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut buffer = new_buffer(10, 8);
    for k in 1..=8 {
        buffer.add_trajectory(&random_trajectory(&mut rng, 10), false).unwrap();
        assert_eq!(buffer.len(), k);
    }
}

#[test]
fn test_len_saturates_and_oldest_is_overwritten() {
    let mut rng = StdRng::seed_from_u64(1);
    let capacity = 5;
    let mut buffer = new_buffer(10, capacity);

    let first = random_trajectory(&mut rng, 10);
    let first_terminal = first.last().unwrap().next_state.clone();
    buffer.add_trajectory(&first, false).unwrap();
    for _ in 0..capacity {
        buffer.add_trajectory(&random_trajectory(&mut rng, 10), false).unwrap();
    }

    assert_eq!(buffer.len(), capacity);
    assert_eq!(buffer.find_trajectory(first.episode_id()), None);

    for slot in 0..buffer.len() {
        let records = buffer.trajectory(slot).unwrap().to_owned();
        let batch = BatchView::with_schema(records, buffer.schema().clone());
        for row in batch.terminal_observation().rows() {
            assert_ne!(row.to_vec(), first_terminal);
        }
    }
}

#[test]
fn test_monte_carlo_returns_and_terminal_factors() {
    let mut buffer =
        TrajectoryBuffer::new(3, STATE_DIM, ACTION_DIM, 4, 0.5, false, None).unwrap();
    buffer.add_trajectory(&unit_reward_trajectory(3), false).unwrap();

    let records = buffer.trajectory(0).unwrap().to_owned();
    let batch = BatchView::new(records, ACTION_DIM, STATE_DIM);
    let returns = batch.monte_carlo_return().column(0).to_vec();
    let factors = batch.terminal_factor().column(0).to_vec();
    for (actual, expected) in returns.iter().zip([1.75f32, 1.5, 1.0]) {
        assert_abs_diff_eq!(*actual, expected, epsilon = 1e-6);
    }
    for (actual, expected) in factors.iter().zip([0.125f32, 0.25, 0.5]) {
        assert_abs_diff_eq!(*actual, expected, epsilon = 1e-6);
    }
}

#[test]
fn test_every_terminal_observation_matches_last_next_state() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut buffer = new_buffer(7, 6);
    let trajectories: Vec<Trajectory> = (0..4).map(|_| random_trajectory(&mut rng, 7)).collect();
    buffer.add_trajectories(&trajectories, false).unwrap();

    for (slot, trajectory) in trajectories.iter().enumerate() {
        let expected = &trajectory.last().unwrap().next_state;
        let records = buffer.trajectory(slot).unwrap().to_owned();
        let batch = BatchView::new(records, ACTION_DIM, STATE_DIM);
        for row in batch.terminal_observation().rows() {
            assert_eq!(&row.to_vec(), expected);
        }
    }
}

#[test]
fn test_sample_never_reads_unpopulated_slots() {
    let mut rng = StdRng::seed_from_u64(3);
    let length = 5;
    let mut buffer = new_buffer(length, 100);
    for _ in 0..3 {
        buffer.add_trajectory(&random_trajectory(&mut rng, length), false).unwrap();
    }

    let indices = buffer.sample_indices(5000, &mut rng).unwrap();
    assert!(indices.iter().all(|&(slot, t)| slot < 3 && t < length));

    // Log-probs are strictly negative, while unpopulated slots hold zeros.
    let batch = BatchView::new(buffer.sample(5000, &mut rng).unwrap(), ACTION_DIM, STATE_DIM);
    assert!(batch.log_prob().iter().all(|&lp| lp < 0.0));
}

#[test]
fn test_sample_matches_indices() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut buffer = new_buffer(4, 10);
    for _ in 0..6 {
        buffer.add_trajectory(&random_trajectory(&mut rng, 4), false).unwrap();
    }

    let indices = buffer.sample_indices(64, &mut StdRng::seed_from_u64(9)).unwrap();
    let batch = buffer.sample(64, &mut StdRng::seed_from_u64(9)).unwrap();
    for (row, &(slot, t)) in batch.rows().into_iter().zip(&indices) {
        assert_eq!(row, buffer.trajectory(slot).unwrap().row(t));
    }
}

#[test]
fn test_save_then_load_is_bit_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("buffer.bin");
    let mut rng = StdRng::seed_from_u64(5);
    let mut buffer = new_buffer(12, 20);
    for _ in 0..7 {
        buffer.add_trajectory(&random_trajectory(&mut rng, 12), false).unwrap();
    }
    buffer.save(&path).unwrap();

    let restored =
        TrajectoryBuffer::new(12, STATE_DIM, ACTION_DIM, 20, 0.99, false, Some(&path)).unwrap();
    assert_eq!(restored.len(), 7);
    assert_eq!(restored.new_trajectory_idx(), 7);
    let original_bits: Vec<u32> = buffer.populated().iter().map(|v| v.to_bits()).collect();
    let restored_bits: Vec<u32> = restored.populated().iter().map(|v| v.to_bits()).collect();
    assert_eq!(original_bits, restored_bits);
}

#[test]
fn test_load_with_different_dims_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("buffer.bin");
    let mut rng = StdRng::seed_from_u64(6);
    let mut buffer = new_buffer(12, 20);
    buffer.add_trajectory(&random_trajectory(&mut rng, 12), false).unwrap();
    buffer.save(&path).unwrap();

    let result = TrajectoryBuffer::new(11, STATE_DIM, ACTION_DIM, 20, 0.99, false, Some(&path));
    assert!(matches!(
        result,
        Err(BufferError::IncompatibleBufferShape {
            expected: (11, _),
            actual: (12, _),
        })
    ));
}

#[test]
fn test_immutable_buffer_is_unchanged_by_rejected_insert() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("buffer.bin");
    let mut rng = StdRng::seed_from_u64(7);
    let mut source = new_buffer(4, 10);
    source.add_trajectory(&random_trajectory(&mut rng, 4), false).unwrap();
    source.save(&path).unwrap();

    let mut buffer =
        TrajectoryBuffer::new(4, STATE_DIM, ACTION_DIM, 10, 0.99, true, Some(&path)).unwrap();
    let before = buffer.populated().to_owned();
    let result = buffer.add_trajectory(&random_trajectory(&mut rng, 4), false);
    assert!(matches!(result, Err(BufferError::ImmutableBufferError)));
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.new_trajectory_idx(), 1);
    assert_eq!(buffer.populated(), before);
}

#[test]
fn test_short_trajectory_is_rejected() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut buffer = new_buffer(10, 10);
    let result = buffer.add_trajectory(&random_trajectory(&mut rng, 9), false);
    assert!(matches!(
        result,
        Err(BufferError::InvalidTrajectoryLength {
            expected: 10,
            actual: 9
        })
    ));
    assert!(buffer.is_empty());
    assert_eq!(buffer.new_trajectory_idx(), 0);
}

#[test]
fn test_sample_empty_buffer_fails() {
    let buffer = new_buffer(10, 10);
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        buffer.sample(1, &mut rng),
        Err(BufferError::EmptyBufferError)
    ));
}

#[test]
fn test_shared_buffer_round_trip() {
    let mut rng = StdRng::seed_from_u64(10);
    let shared = SharedTrajectoryBuffer::new(new_buffer(5, 3));
    let trajectories: Vec<Trajectory> = (0..4).map(|_| random_trajectory(&mut rng, 5)).collect();
    shared.add_trajectories(&trajectories, false).unwrap();
    assert_eq!(shared.len(), 3);

    let batch = shared.sample(16, &mut rng).unwrap();
    assert_eq!(batch.shape(), &[16, 3 * STATE_DIM + ACTION_DIM + 5]);
}
