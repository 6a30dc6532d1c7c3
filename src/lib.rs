//! # ipbus-transactor
//!
//! Cycle-accurate model of an IPbus packet transactor.
//!
//! The transactor sits between an inbound packet buffer, a transaction
//! engine and an outbound response buffer. It walks each packet through
//! `Idle → Header → Id → Body → Done`, relays the header region, validates
//! the ID word against the packet sequence, hands body words to the engine
//! and writes a trailer once the engine is finished.
//!
//! ## Layers
//!
//! - [`transactor`]: the state machine, one [`PacketTransactor::step`] per tick
//! - [`driver`]: runs whole packets against word buffers and an engine
//! - [`service`]: tokio task fronting a driver for async requesters
//! - [`trace`]: JSON-lines tick traces with replay
//!
//! ## Example
//!
//! ```
//! use ipbus_transactor::{ByteOrder, Driver, IdWord, LoopbackEngine, Packet, TransactorConfig};
//!
//! let mut driver = Driver::new(TransactorConfig::default(), LoopbackEngine::new()).unwrap();
//! let packet = Packet::new(IdWord::control(1, ByteOrder::Normal).encode(), vec![0xA, 0xB]);
//!
//! let response = driver.process(&packet).unwrap();
//! assert_eq!(response.body_word_count(), 2);
//! assert_eq!(response.reply_words(), &[0xA, 0xB]);
//! ```

pub mod buffer;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod service;
pub mod trace;
pub mod transactor;

pub use buffer::{InboundBuffer, OutboundBuffer, WordBuffer};
pub use config::TransactorConfig;
pub use driver::{Driver, Response};
pub use engine::{EngineSignals, EngineView, LoopbackEngine, ScriptedEngine, TransactionEngine};
pub use error::{Result, TransactorError};
pub use protocol::{ByteOrder, IdWord, LengthWord, Packet, Rejection};
pub use service::{spawn_transactor_task, TransactorHandle};
pub use trace::{Trace, TraceRecord};
pub use transactor::{Inputs, Outputs, PacketOutcome, PacketTransactor, State};
