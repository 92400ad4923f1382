mod batch_view;
mod experience;
pub mod persistence;
mod record_schema;
mod sampler;
mod shared_trajectory_buffer;
mod trajectory_buffer;

pub use batch_view::BatchView;
pub use experience::{Experience, Trajectory};
pub use record_schema::{Field, RecordSchema};
pub use shared_trajectory_buffer::SharedTrajectoryBuffer;
pub use trajectory_buffer::TrajectoryBuffer;
