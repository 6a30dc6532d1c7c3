//! The packet transactor state machine.
//!
//! [`PacketTransactor`] is clocked by an external driver: one [`step`] per
//! tick, with the word at the current read address and the engine's
//! flow-control signals as [`Inputs`]. It owns no buffer storage; it only
//! decides read/write addresses and what to write.
//!
//! # Two-phase step
//!
//! Every tick runs two phases in a fixed order:
//!
//! 1. **Read decision**: the next read address is computed from the state
//!    as it was at the start of the tick (plus that tick's pull signal).
//! 2. **Effects**: counters, write address, latches and state move, using
//!    the signals sampled during the tick.
//!
//! Phase 2 never feeds phase 1 within the same tick, so the sequence of read
//! addresses is fully determined by prior state.
//!
//! # Example
//!
//! ```
//! use ipbus_transactor::transactor::{Inputs, PacketTransactor, State};
//!
//! let mut transactor = PacketTransactor::new();
//! let out = transactor.step(&Inputs {
//!     packet_ready: true,
//!     inbound_word: 0x0000_0005, // no header region, 5 body words
//!     ..Default::default()
//! });
//! assert_eq!(out.state, State::Id);
//! assert_eq!(out.read_address, 1);
//! ```
//!
//! [`step`]: PacketTransactor::step

mod sequence;
mod signals;
mod state;

pub use sequence::SequenceCounter;
pub use signals::{Inputs, Outputs, WordWrite};
pub use state::{PacketOutcome, State};

use crate::config::TransactorConfig;
use crate::protocol::{validate, ByteOrder, IdWord, LengthWord};

/// Side effects produced by the effect phase of one tick.
#[derive(Debug, Default)]
struct Effects {
    write: Option<WordWrite>,
    received: bool,
    transmitted: bool,
    outcome: Option<PacketOutcome>,
}

/// Cycle-accurate packet transactor.
#[derive(Debug, Clone)]
pub struct PacketTransactor {
    state: State,
    addr_mask: u32,
    read_address: u32,
    write_address: u32,
    /// Trailer slot claimed by an engine header marker.
    header_address: Option<u32>,
    /// Words relayed in the current region (header words, then body words).
    read_counter: u16,
    /// Counted reply words, saturating at the 16-bit trailer field.
    write_counter: u16,
    length: LengthWord,
    first_body_word: bool,
    id_word: Option<IdWord>,
    byte_order: ByteOrder,
    sequence: SequenceCounter,
    /// Outcome decided before the `Done` tick.
    pending: Option<PacketOutcome>,
    last_outcome: Option<PacketOutcome>,
}

impl PacketTransactor {
    /// Create a transactor with default settings.
    pub fn new() -> Self {
        Self::with_config(&TransactorConfig::default())
    }

    /// Create a transactor using the address width and ID seed from `config`.
    ///
    /// `config` is expected to have passed [`TransactorConfig::validate`];
    /// an out-of-range width is clamped to a full 32-bit address mask.
    pub fn with_config(config: &TransactorConfig) -> Self {
        Self {
            state: State::Idle,
            addr_mask: config.addr_mask(),
            read_address: 0,
            write_address: 0,
            header_address: None,
            read_counter: 0,
            write_counter: 0,
            length: LengthWord::new(0, 0),
            first_body_word: false,
            id_word: None,
            byte_order: ByteOrder::Normal,
            sequence: SequenceCounter::new(config.initial_expected_id),
            pending: None,
            last_outcome: None,
        }
    }

    /// Advance one tick.
    pub fn step(&mut self, inputs: &Inputs) -> Outputs {
        if inputs.reset {
            self.reset();
            return self.outputs(Effects::default());
        }

        // Phase 1: nothing below may change what this reads.
        let next_read = self.next_read_address(inputs);
        // Phase 2.
        let effects = self.update(inputs);
        self.read_address = next_read;

        self.outputs(effects)
    }

    /// Global reset: back to `Idle` with counters and NextExpectedId
    /// reinitialized.
    ///
    /// A packet in flight is recorded as [`PacketOutcome::Abandoned`].
    pub fn reset(&mut self) {
        if self.state != State::Idle {
            tracing::debug!("Reset abandoned packet in state {}", self.state);
            self.last_outcome = Some(PacketOutcome::Abandoned);
        }
        self.state = State::Idle;
        self.read_address = 0;
        self.clear_packet();
        self.byte_order = ByteOrder::Normal;
        self.sequence.reset();
    }

    /// Read-decision phase.
    fn next_read_address(&self, inputs: &Inputs) -> u32 {
        let next = match self.state {
            State::Idle if inputs.start() => 1,
            State::Idle | State::Done => 0,
            // Header words, then step past the ID word to the first body word.
            State::Header | State::Id => self.read_address.wrapping_add(1),
            State::Body if inputs.engine_wants_next && self.body_remaining() => {
                self.read_address.wrapping_add(1)
            }
            State::Body => self.read_address,
        };
        next & self.addr_mask
    }

    /// Effect phase.
    fn update(&mut self, inputs: &Inputs) -> Effects {
        match self.state {
            State::Idle => self.on_idle(inputs),
            State::Header => self.on_header(inputs),
            State::Id => self.on_id(inputs),
            State::Body => self.on_body(inputs),
            State::Done => self.on_done(),
        }
    }

    fn on_idle(&mut self, inputs: &Inputs) -> Effects {
        if !inputs.start() {
            return Effects::default();
        }

        self.clear_packet();
        self.length = LengthWord::decode(inputs.inbound_word);
        self.write_address = 1 & self.addr_mask;
        let next = if self.length.has_header_region() {
            State::Header
        } else {
            State::Id
        };
        tracing::debug!(
            "Packet start: {} header words, {} body words",
            self.length.header_words,
            self.length.body_words
        );
        self.transition(next);

        Effects {
            received: true,
            ..Default::default()
        }
    }

    fn on_header(&mut self, inputs: &Inputs) -> Effects {
        let write = WordWrite {
            address: self.write_address,
            data: inputs.inbound_word,
        };
        self.write_address = self.write_address.wrapping_add(1) & self.addr_mask;
        self.read_counter += 1;

        if self.read_counter == self.length.header_words {
            self.transition(State::Id);
        }

        Effects {
            write: Some(write),
            ..Default::default()
        }
    }

    fn on_id(&mut self, inputs: &Inputs) -> Effects {
        let id = IdWord::parse(inputs.inbound_word);
        self.id_word = Some(id);
        self.read_counter = 0;
        self.write_counter = 0;

        match validate(&id, self.sequence.get(), self.length.body_words) {
            Ok(()) => {
                self.sequence.advance();
                self.byte_order = id.byte_order;
                self.first_body_word = true;
                self.transition(State::Body);
            }
            Err(rejection) => {
                tracing::warn!("Packet rejected: {}", rejection);
                self.pending = Some(PacketOutcome::Rejected(rejection));
                self.transition(State::Done);
            }
        }

        Effects::default()
    }

    fn on_body(&mut self, inputs: &Inputs) -> Effects {
        let remaining = self.body_remaining();
        let mut effects = Effects::default();

        if inputs.engine_wants_next && remaining {
            self.read_counter += 1;
        }

        if inputs.engine_wrote_word {
            let address = if self.first_body_word {
                // Response ID word lands on the request's ID slot, uncounted.
                self.first_body_word = false;
                self.write_address
            } else {
                self.write_address = self.write_address.wrapping_add(1) & self.addr_mask;
                self.write_counter = self.write_counter.saturating_add(1);
                self.write_address
            };

            if inputs.engine_header_marker {
                self.header_address = Some(address);
            }

            effects.write = Some(WordWrite {
                address,
                data: inputs.engine_data,
            });
        }

        if inputs.engine_error {
            tracing::warn!(
                "Engine error after {} reply words, terminating packet",
                self.write_counter
            );
            self.pending = Some(PacketOutcome::EngineFault {
                words: self.write_counter,
            });
            self.transition(State::Done);
        } else if !remaining && inputs.engine_header_marker {
            self.pending = Some(PacketOutcome::Delivered {
                words: self.write_counter,
            });
            self.transition(State::Done);
        }

        effects
    }

    fn on_done(&mut self) -> Effects {
        let trailer = LengthWord::new(self.length.header_words, self.write_counter);
        let write = WordWrite {
            address: self.header_address.unwrap_or(0),
            data: trailer.encode(),
        };
        let outcome = self.pending.take().unwrap_or(PacketOutcome::Delivered {
            words: self.write_counter,
        });

        tracing::debug!("Packet done: {:?}, trailer {:#010x}", outcome, write.data);
        self.last_outcome = Some(outcome);
        self.clear_packet();
        self.transition(State::Idle);

        Effects {
            write: Some(write),
            transmitted: true,
            outcome: Some(outcome),
            ..Default::default()
        }
    }

    fn transition(&mut self, next: State) {
        tracing::trace!("State {} -> {}", self.state, next);
        self.state = next;
    }

    /// Reset per-packet counters and latches (not the sequence or byte order).
    fn clear_packet(&mut self) {
        self.write_address = 0;
        self.header_address = None;
        self.read_counter = 0;
        self.write_counter = 0;
        self.first_body_word = false;
        self.pending = None;
    }

    /// Body words not yet pulled by the engine.
    #[inline]
    fn body_remaining(&self) -> bool {
        self.read_counter < self.length.body_words
    }

    fn outputs(&self, effects: Effects) -> Outputs {
        Outputs {
            state: self.state,
            read_address: self.read_address,
            write: effects.write,
            outbound_ready: self.outbound_ready(),
            byte_order: self.byte_order,
            next_expected_id: self.sequence.get(),
            packet_received: effects.received,
            packet_transmitted: effects.transmitted,
            outcome: effects.outcome,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Address the next inbound word should come from.
    #[inline]
    pub fn read_address(&self) -> u32 {
        self.read_address
    }

    /// Current NextExpectedId.
    #[inline]
    pub fn next_expected_id(&self) -> u16 {
        self.sequence.get()
    }

    /// Byte order latched by the last validated packet.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// ID word of the packet in flight (or the last one checked).
    #[inline]
    pub fn id_word(&self) -> Option<IdWord> {
        self.id_word
    }

    /// Length word of the packet in flight (or the last one started).
    #[inline]
    pub fn length(&self) -> LengthWord {
        self.length
    }

    /// Outcome of the most recently finished packet.
    #[inline]
    pub fn last_outcome(&self) -> Option<PacketOutcome> {
        self.last_outcome
    }

    /// Words relayed in the current region.
    #[inline]
    pub fn read_counter(&self) -> u16 {
        self.read_counter
    }

    /// Counted reply words so far.
    #[inline]
    pub fn write_counter(&self) -> u16 {
        self.write_counter
    }

    /// Body word available to the engine.
    #[inline]
    pub fn outbound_ready(&self) -> bool {
        self.state == State::Body && self.body_remaining()
    }
}

impl Default for PacketTransactor {
    fn default() -> Self {
        Self::new()
    }
}
