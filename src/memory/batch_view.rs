use super::record_schema::{Field, RecordSchema};
use ndarray::{s, Array2, ArrayView2};

/// Named, read-only access to a sampled `[batch_size, width]` matrix.
///
/// Must be built with the same `(action_dim, observation_dim)` as the
/// buffer that produced the samples.
#[derive(Debug, Clone)]
pub struct BatchView {
    samples: Array2<f32>,
    schema: RecordSchema,
}

impl BatchView {
    pub fn new(samples: Array2<f32>, action_dim: usize, observation_dim: usize) -> Self {
        Self::with_schema(samples, RecordSchema::new(observation_dim, action_dim))
    }

    pub fn with_schema(samples: Array2<f32>, schema: RecordSchema) -> Self {
        assert_eq!(
            samples.ncols(),
            schema.width(),
            "sample width does not match record schema (state_dim={}, action_dim={})",
            schema.state_dim(),
            schema.action_dim()
        );
        BatchView { samples, schema }
    }

    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.nrows() == 0
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn samples(&self) -> ArrayView2<f32> {
        self.samples.view()
    }

    pub fn into_inner(self) -> Array2<f32> {
        self.samples
    }

    /// `[batch_size, field_width]` slice of one field.
    pub fn field(&self, field: Field) -> ArrayView2<f32> {
        self.samples.slice(s![.., self.schema.field_range(field)])
    }

    pub fn observation(&self) -> ArrayView2<f32> {
        self.field(Field::State)
    }

    pub fn action(&self) -> ArrayView2<f32> {
        self.field(Field::Action)
    }

    pub fn next_observation(&self) -> ArrayView2<f32> {
        self.field(Field::NextState)
    }

    pub fn terminal_observation(&self) -> ArrayView2<f32> {
        self.field(Field::TerminalState)
    }

    pub fn log_prob(&self) -> ArrayView2<f32> {
        self.field(Field::LogProb)
    }

    pub fn terminal_factor(&self) -> ArrayView2<f32> {
        self.field(Field::TerminalFactor)
    }

    pub fn done(&self) -> ArrayView2<f32> {
        self.field(Field::Done)
    }

    pub fn reward(&self) -> ArrayView2<f32> {
        self.field(Field::Reward)
    }

    pub fn monte_carlo_return(&self) -> ArrayView2<f32> {
        self.field(Field::MonteCarloReturn)
    }

    /// Copies the batch into a `[batch_size, width]` float tensor on `device`.
    #[cfg(feature = "torch")]
    pub fn to_tensor(&self, device: tch::Device) -> tch::Tensor {
        let values: Vec<f32> = self.samples.iter().copied().collect();
        tch::Tensor::from_slice(&values)
            .reshape(&[self.samples.nrows() as i64, self.samples.ncols() as i64])
            .to_device(device)
    }
}
