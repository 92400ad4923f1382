mod misc;

pub mod config;
pub mod envs;
pub mod error;
pub mod memory;

pub use config::BufferConfig;
pub use error::{BufferError, Result};
pub use memory::{
    BatchView, Experience, Field, RecordSchema, SharedTrajectoryBuffer, Trajectory,
    TrajectoryBuffer,
};
