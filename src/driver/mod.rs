//! Tick loop that runs whole packets through the transactor.
//!
//! The [`Driver`] owns both word buffers and a [`TransactionEngine`] and
//! plays the role of the surrounding hardware: each tick it reads the
//! inbound word at the transactor's read address, lets the engine react to
//! the previous outputs, steps the transactor and applies its write.
//!
//! ```text
//! Packet ─► inbound buffer ─► PacketTransactor ◄──► TransactionEngine
//!                                   │
//!                                   ▼
//!                           outbound buffer ─► Response
//! ```

mod response;

pub use response::Response;

use crate::buffer::{InboundBuffer, OutboundBuffer, WordBuffer};
use crate::config::TransactorConfig;
use crate::engine::{EngineView, TransactionEngine};
use crate::error::{Result, TransactorError};
use crate::protocol::Packet;
use crate::trace::{Trace, TraceRecord};
use crate::transactor::{Inputs, Outputs, PacketTransactor, State};

/// Drives one transactor, one engine and a pair of buffers.
#[derive(Debug)]
pub struct Driver<E> {
    config: TransactorConfig,
    transactor: PacketTransactor,
    inbound: WordBuffer,
    outbound: WordBuffer,
    engine: E,
    last: Outputs,
    ticks: u64,
    trace: Trace,
}

impl<E: TransactionEngine> Driver<E> {
    /// Create a driver with buffers sized from `config`.
    pub fn new(config: TransactorConfig, engine: E) -> Result<Self> {
        config.validate()?;
        let transactor = PacketTransactor::with_config(&config);
        let last = Outputs {
            next_expected_id: transactor.next_expected_id(),
            ..Default::default()
        };

        Ok(Self {
            inbound: WordBuffer::new(&config),
            outbound: WordBuffer::new(&config),
            transactor,
            engine,
            last,
            ticks: 0,
            trace: Trace::new(),
            config,
        })
    }

    /// Run `packet` to completion.
    pub fn process(&mut self, packet: &Packet) -> Result<Response> {
        self.process_words(&packet.words()?)
    }

    /// Load raw inbound words and run them to completion.
    ///
    /// Rejected packets and engine faults come back as a [`Response`] with
    /// the matching outcome. If the packet does not finish within
    /// `max_ticks_per_packet`, [`TransactorError::TickLimit`] is returned;
    /// a packet stuck mid-flight is abandoned with a reset first, while one
    /// that was never accepted leaves NextExpectedId untouched.
    pub fn process_words(&mut self, words: &[u32]) -> Result<Response> {
        self.inbound.clear();
        self.inbound.load(words)?;
        self.outbound.clear();

        let mut packet_ready = true;
        for _ in 0..self.config.max_ticks_per_packet {
            let out = self.tick(packet_ready)?;
            if out.packet_received {
                packet_ready = false;
            }

            if let (Some(trailer), Some(outcome)) = (out.write, out.outcome) {
                return Ok(Response::from_outbound(
                    self.outbound.words(),
                    trailer,
                    outcome,
                ));
            }
        }

        if self.transactor.state() == State::Idle {
            // Never started; nothing in flight to abandon.
            tracing::warn!(
                "Packet not accepted within {} ticks, engine busy",
                self.config.max_ticks_per_packet
            );
        } else {
            tracing::error!(
                "Packet did not finish within {} ticks (state {}), resetting",
                self.config.max_ticks_per_packet,
                self.transactor.state()
            );
            self.reset();
        }
        Err(TransactorError::TickLimit(self.config.max_ticks_per_packet))
    }

    /// Run a single tick with `packet_ready` driven as given.
    pub fn tick(&mut self, packet_ready: bool) -> Result<Outputs> {
        let word = self.inbound.read(self.last.read_address)?;
        let view = EngineView {
            state: self.last.state,
            ready: self.last.outbound_ready,
            word,
            id: self.transactor.id_word(),
        };
        let signals = self.engine.tick(&view);

        let mut inputs = Inputs {
            packet_ready,
            engine_busy: self.engine.busy(),
            inbound_word: word,
            ..Default::default()
        };
        signals.apply(&mut inputs);

        let out = self.transactor.step(&inputs);
        if let Some(write) = out.write {
            self.outbound.write(write.address, write.data)?;
        }

        self.finish_tick(inputs, out);
        Ok(out)
    }

    /// Assert the global reset for one tick.
    pub fn reset(&mut self) {
        let inputs = Inputs {
            reset: true,
            ..Default::default()
        };
        let out = self.transactor.step(&inputs);
        self.engine.reset();
        self.finish_tick(inputs, out);
    }

    fn finish_tick(&mut self, inputs: Inputs, outputs: Outputs) {
        if self.config.record_trace {
            self.trace.push(TraceRecord {
                tick: self.ticks,
                inputs,
                outputs,
            });
        }
        self.ticks += 1;
        self.last = outputs;
    }

    #[inline]
    pub fn transactor(&self) -> &PacketTransactor {
        &self.transactor
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[inline]
    pub fn inbound(&self) -> &WordBuffer {
        &self.inbound
    }

    /// Outbound buffer as left by the last packet.
    #[inline]
    pub fn outbound(&self) -> &WordBuffer {
        &self.outbound
    }

    #[inline]
    pub fn config(&self) -> &TransactorConfig {
        &self.config
    }

    /// Ticks run since creation.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Recorded trace (empty unless `record_trace` is set).
    #[inline]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Hand over the recorded trace, leaving an empty one.
    pub fn take_trace(&mut self) -> Trace {
        std::mem::take(&mut self.trace)
    }
}
