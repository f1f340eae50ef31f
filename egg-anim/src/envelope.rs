//! Per-channel value envelope
//!
//! Most channels of a rig never move during a clip. An envelope stores a
//! single value until a sample differs from it, then switches to storing every
//! frame, backfilling the constant run it had been holding back.

/// Two samples closer than this are the same value
pub const SAME_VALUE_TOLERANCE: f32 = 1e-4;

#[derive(Clone, Debug, PartialEq)]
enum EnvelopeState {
    /// Every sample so far matched `value`; `frames` counts them
    Constant { value: f32, frames: usize },
    /// One value per sampled frame
    Varying(Vec<f32>),
}

/// Sampled values of one channel of one bone
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    state: EnvelopeState,
    samples: usize,
}

impl Envelope {
    /// Create an envelope from its first sample
    pub fn new(value: f32) -> Self {
        Self {
            state: EnvelopeState::Constant { value, frames: 1 },
            samples: 1,
        }
    }

    /// Record the next frame's sample
    pub fn add_value(&mut self, value: f32) {
        self.samples += 1;

        let (held, frames) = match &mut self.state {
            EnvelopeState::Varying(values) => {
                values.push(value);
                return;
            }
            EnvelopeState::Constant { value: held, frames }
                if (*held - value).abs() < SAME_VALUE_TOLERANCE =>
            {
                *frames += 1;
                return;
            }
            EnvelopeState::Constant { value: held, frames } => (*held, *frames),
        };

        let mut values = Vec::with_capacity(frames + 1);
        values.resize(frames, held);
        values.push(value);
        self.state = EnvelopeState::Varying(values);
    }

    /// Stored values: one for a constant channel, one per frame otherwise
    pub fn values(&self) -> &[f32] {
        match &self.state {
            EnvelopeState::Constant { value, .. } => std::slice::from_ref(value),
            EnvelopeState::Varying(values) => values,
        }
    }

    /// True while every sample matched the first one
    pub fn is_constant(&self) -> bool {
        matches!(self.state, EnvelopeState::Constant { .. })
    }

    /// Number of samples written, before filtering
    pub fn sample_count(&self) -> usize {
        self.samples
    }
}
