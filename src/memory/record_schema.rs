use super::experience::Experience;
use crate::error::{BufferError, Result};
use ndarray::{s, Array1, ArrayView1, ArrayViewMut1};
use std::ops::Range;

/// Logical fields of a record, in packing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    State,
    Action,
    NextState,
    TerminalState,
    LogProb,
    TerminalFactor,
    Done,
    Reward,
    MonteCarloReturn,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::State,
        Field::Action,
        Field::NextState,
        Field::TerminalState,
        Field::LogProb,
        Field::TerminalFactor,
        Field::Done,
        Field::Reward,
        Field::MonteCarloReturn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::State => "state",
            Field::Action => "action",
            Field::NextState => "next_state",
            Field::TerminalState => "terminal_state",
            Field::LogProb => "log_prob",
            Field::TerminalFactor => "terminal_discount_factor",
            Field::Done => "done",
            Field::Reward => "reward",
            Field::MonteCarloReturn => "monte_carlo_return",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    state_dim: usize,
    action_dim: usize,
    offsets: [(usize, usize); 9],
    width: usize,
}

impl RecordSchema {
    pub fn new(state_dim: usize, action_dim: usize) -> Self {
        let mut offsets = [(0, 0); 9];
        let mut start = 0;
        for field in Field::ALL {
            let length = match field {
                Field::State | Field::NextState | Field::TerminalState => state_dim,
                Field::Action => action_dim,
                _ => 1,
            };
            offsets[field.index()] = (start, length);
            start += length;
        }
        RecordSchema {
            state_dim,
            action_dim,
            offsets,
            width: start,
        }
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    /// Total floats per record.
    pub fn width(&self) -> usize {
        self.width
    }

    /// `(start, length)` of a field within a record.
    pub fn field_offset(&self, field: Field) -> (usize, usize) {
        self.offsets[field.index()]
    }

    pub fn field_range(&self, field: Field) -> Range<usize> {
        let (start, length) = self.field_offset(field);
        start..start + length
    }

    /// Checks that an experience fits this layout.
    pub fn check(&self, experience: &Experience) -> Result<()> {
        let checks = [
            (Field::State, &experience.state),
            (Field::Action, &experience.action),
            (Field::NextState, &experience.next_state),
        ];
        for (field, values) in checks {
            let (_, expected) = self.field_offset(field);
            if values.len() != expected {
                return Err(BufferError::DimensionMismatch {
                    field: field.name(),
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Writes one record into `out`, which must be exactly `width()` long.
    ///
    /// Panics if the experience or terminal state do not match the schema;
    /// call `check` first when the input is untrusted.
    pub fn pack(
        &self,
        experience: &Experience,
        terminal_state: &[f32],
        terminal_factor: f32,
        mc_return: f32,
        mut out: ArrayViewMut1<f32>,
    ) {
        assert_eq!(out.len(), self.width, "record width mismatch");
        let vectors: [(Field, &[f32]); 4] = [
            (Field::State, &experience.state),
            (Field::Action, &experience.action),
            (Field::NextState, &experience.next_state),
            (Field::TerminalState, terminal_state),
        ];
        for (field, values) in vectors {
            out.slice_mut(s![self.field_range(field)])
                .assign(&ArrayView1::from(values));
        }

        let scalars = [
            (Field::LogProb, experience.log_prob),
            (Field::TerminalFactor, terminal_factor),
            (Field::Done, if experience.done { 1.0 } else { 0.0 }),
            (Field::Reward, experience.reward),
            (Field::MonteCarloReturn, mc_return),
        ];
        for (field, value) in scalars {
            out[self.field_offset(field).0] = value;
        }
    }

    pub fn pack_record(
        &self,
        experience: &Experience,
        terminal_state: &[f32],
        terminal_factor: f32,
        mc_return: f32,
    ) -> Array1<f32> {
        let mut record = Array1::zeros(self.width);
        self.pack(
            experience,
            terminal_state,
            terminal_factor,
            mc_return,
            record.view_mut(),
        );
        record
    }

    /// Reads one field back out of a packed record.
    pub fn field<'a>(&self, record: ArrayView1<'a, f32>, field: Field) -> ArrayView1<'a, f32> {
        record.slice_move(s![self.field_range(field)])
    }
}
