//! Per-tick input and output signal bundles.

use serde::{Deserialize, Serialize};

use super::state::{PacketOutcome, State};
use crate::protocol::ByteOrder;

/// Everything sampled on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inputs {
    /// Synchronous global reset.
    pub reset: bool,
    /// A packet is waiting in the inbound buffer.
    pub packet_ready: bool,
    /// The engine cannot accept a new packet.
    pub engine_busy: bool,
    /// Word at the current read address.
    pub inbound_word: u32,
    /// Engine pulls the next body word.
    pub engine_wants_next: bool,
    /// Engine is writing `engine_data` this tick.
    pub engine_wrote_word: bool,
    /// Word being written by the engine.
    pub engine_data: u32,
    /// Engine marks a transaction header (or end of body).
    pub engine_header_marker: bool,
    /// Engine aborts the packet.
    pub engine_error: bool,
}

impl Inputs {
    /// `packet_ready AND NOT engine_busy`.
    #[inline]
    pub fn start(&self) -> bool {
        self.packet_ready && !self.engine_busy
    }
}

/// One outbound buffer write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordWrite {
    pub address: u32,
    pub data: u32,
}

/// Everything driven after one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    /// State the machine moved into.
    pub state: State,
    /// Address to present on the next tick.
    pub read_address: u32,
    /// Outbound write issued on this tick, if any.
    pub write: Option<WordWrite>,
    /// A body word is available for the engine.
    pub outbound_ready: bool,
    /// Latched byte order of the last validated packet.
    pub byte_order: ByteOrder,
    /// Current NextExpectedId.
    pub next_expected_id: u16,
    /// Pulse: a packet was accepted from the inbound buffer.
    pub packet_received: bool,
    /// Pulse: the trailer was written.
    pub packet_transmitted: bool,
    /// Set on the tick the trailer is written.
    pub outcome: Option<PacketOutcome>,
}

impl Outputs {
    #[inline]
    pub fn write_enable(&self) -> bool {
        self.write.is_some()
    }

    /// Write address, or 0 when not writing.
    #[inline]
    pub fn write_address(&self) -> u32 {
        self.write.map_or(0, |w| w.address)
    }

    /// Write data, or 0 when not writing.
    #[inline]
    pub fn write_data(&self) -> u32 {
        self.write.map_or(0, |w| w.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_requires_idle_engine() {
        let mut inputs = Inputs {
            packet_ready: true,
            ..Default::default()
        };
        assert!(inputs.start());

        inputs.engine_busy = true;
        assert!(!inputs.start());

        assert!(!Inputs::default().start());
    }

    #[test]
    fn test_write_accessors() {
        let idle = Outputs::default();
        assert!(!idle.write_enable());
        assert_eq!(idle.write_address(), 0);
        assert_eq!(idle.write_data(), 0);

        let writing = Outputs {
            write: Some(WordWrite {
                address: 4,
                data: 0xABCD,
            }),
            ..Default::default()
        };
        assert!(writing.write_enable());
        assert_eq!(writing.write_address(), 4);
        assert_eq!(writing.write_data(), 0xABCD);
    }
}
