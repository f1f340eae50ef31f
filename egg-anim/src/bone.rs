//! Animation channels of a single bone

use crate::channel::{Channel, CHANNEL_COUNT};
use crate::envelope::Envelope;

/// Envelopes of one bone, one slot per channel
///
/// Slots are filled on the first sample written to the channel.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneAnimation {
    envelopes: [Option<Envelope>; CHANNEL_COUNT],
}

impl Default for BoneAnimation {
    fn default() -> Self {
        Self {
            envelopes: std::array::from_fn(|_| None),
        }
    }
}

impl BoneAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample to the channel's envelope, creating it if needed
    pub fn add_envelope_value(&mut self, channel: Channel, value: f32) {
        let slot = &mut self.envelopes[channel.index()];
        if let Some(envelope) = slot {
            envelope.add_value(value);
        } else {
            *slot = Some(Envelope::new(value));
        }
    }

    pub fn envelope(&self, channel: Channel) -> Option<&Envelope> {
        self.envelopes[channel.index()].as_ref()
    }

    /// Recorded envelopes in channel order (`i j k p r h x y z`)
    pub fn envelopes(&self) -> impl Iterator<Item = (Channel, &Envelope)> + '_ {
        Channel::ALL
            .into_iter()
            .zip(self.envelopes.iter())
            .filter_map(|(channel, envelope)| envelope.as_ref().map(|e| (channel, e)))
    }

    /// True when no channel has been recorded
    pub fn is_empty(&self) -> bool {
        self.envelopes.iter().all(Option::is_none)
    }

    /// Drop every recorded channel
    pub(crate) fn clear(&mut self) {
        self.envelopes = std::array::from_fn(|_| None);
    }
}
