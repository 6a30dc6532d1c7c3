//! Transaction engine collaborator.
//!
//! The real register engine is outside this crate; the transactor only sees
//! its handshake signals. [`TransactionEngine`] is that contract as the
//! [`Driver`](crate::driver::Driver) calls it: once per tick, with a view of
//! the transactor's previous outputs, returning this tick's signals.
//!
//! Two engines ship with the crate:
//! - [`LoopbackEngine`] echoes every body word back (optionally failing
//!   after N words), which is enough to exercise every transactor path.
//! - [`ScriptedEngine`] replays a fixed list of signals, one per tick.

use std::collections::VecDeque;

use crate::protocol::IdWord;
use crate::transactor::{Inputs, State};

/// What the engine can observe at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineView {
    /// Transactor state after the previous tick.
    pub state: State,
    /// `outbound_ready` after the previous tick.
    pub ready: bool,
    /// Inbound word at the current read address.
    pub word: u32,
    /// ID word of the packet in flight.
    pub id: Option<IdWord>,
}

/// Handshake signals driven by the engine for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSignals {
    /// Pull the next body word.
    pub wants_next: bool,
    /// Word to write to the outbound buffer.
    pub write: Option<u32>,
    /// Transaction header marker / end of body.
    pub header_marker: bool,
    /// Abort the packet.
    pub error: bool,
}

impl EngineSignals {
    /// Pull the current word and write `data` back.
    pub fn pull_and_write(data: u32) -> Self {
        Self {
            wants_next: true,
            write: Some(data),
            ..Default::default()
        }
    }

    /// Write `data` without pulling.
    pub fn write(data: u32) -> Self {
        Self {
            write: Some(data),
            ..Default::default()
        }
    }

    /// Bare header marker.
    pub fn marker() -> Self {
        Self {
            header_marker: true,
            ..Default::default()
        }
    }

    /// Error.
    pub fn error() -> Self {
        Self {
            error: true,
            ..Default::default()
        }
    }

    /// Copy these signals onto a transactor input bundle.
    pub fn apply(&self, inputs: &mut Inputs) {
        inputs.engine_wants_next = self.wants_next;
        inputs.engine_wrote_word = self.write.is_some();
        inputs.engine_data = self.write.unwrap_or(0);
        inputs.engine_header_marker = self.header_marker;
        inputs.engine_error = self.error;
    }
}

/// The engine side of the body handshake.
pub trait TransactionEngine {
    /// Produce this tick's signals.
    fn tick(&mut self, view: &EngineView) -> EngineSignals;

    /// Whether the engine refuses new packets.
    fn busy(&self) -> bool {
        false
    }

    /// Drop any per-packet state.
    fn reset(&mut self) {}
}

/// Echoes the request back.
///
/// On its first body tick it writes the request's ID word as the response ID
/// word, then pulls each body word and writes it straight back, and signals
/// the end of the body with a bare header marker once the transactor stops
/// offering words.
#[derive(Debug, Clone, Default)]
pub struct LoopbackEngine {
    replied_id: bool,
    echoed: u16,
    fail_after: Option<u16>,
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an error instead of echoing word `words + 1`.
    pub fn failing_after(words: u16) -> Self {
        Self {
            fail_after: Some(words),
            ..Default::default()
        }
    }

    /// Words echoed in the current packet.
    pub fn echoed(&self) -> u16 {
        self.echoed
    }
}

impl TransactionEngine for LoopbackEngine {
    fn tick(&mut self, view: &EngineView) -> EngineSignals {
        if view.state != State::Body {
            self.reset();
            return EngineSignals::default();
        }

        if !self.replied_id {
            self.replied_id = true;
            let reply = view.id.map_or(0, |id| id.encode());
            return EngineSignals::write(reply);
        }

        if self.fail_after.is_some_and(|limit| self.echoed >= limit) {
            return EngineSignals::error();
        }

        if view.ready {
            self.echoed += 1;
            return EngineSignals::pull_and_write(view.word);
        }

        EngineSignals::marker()
    }

    fn reset(&mut self) {
        self.replied_id = false;
        self.echoed = 0;
    }
}

/// Replays queued signals, one per tick, then goes quiet.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    script: VecDeque<EngineSignals>,
    busy: bool,
}

impl ScriptedEngine {
    pub fn new(script: impl IntoIterator<Item = EngineSignals>) -> Self {
        Self {
            script: script.into_iter().collect(),
            busy: false,
        }
    }

    /// Report busy until cleared.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Ticks left in the script.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl TransactionEngine for ScriptedEngine {
    fn tick(&mut self, _view: &EngineView) -> EngineSignals {
        self.script.pop_front().unwrap_or_default()
    }

    fn busy(&self) -> bool {
        self.busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ByteOrder;

    fn body_view(ready: bool, word: u32) -> EngineView {
        EngineView {
            state: State::Body,
            ready,
            word,
            id: Some(IdWord::control(4, ByteOrder::Normal)),
        }
    }

    #[test]
    fn test_loopback_sequence() {
        let mut engine = LoopbackEngine::new();

        let first = engine.tick(&body_view(true, 0x55));
        assert_eq!(first, EngineSignals::write(0x2000_04F0));

        let echo = engine.tick(&body_view(true, 0x55));
        assert_eq!(echo, EngineSignals::pull_and_write(0x55));
        assert_eq!(engine.echoed(), 1);

        let end = engine.tick(&body_view(false, 0));
        assert_eq!(end, EngineSignals::marker());
    }

    #[test]
    fn test_loopback_idle_outside_body() {
        let mut engine = LoopbackEngine::new();
        engine.tick(&body_view(true, 1));
        engine.tick(&body_view(true, 1));

        let view = EngineView {
            state: State::Done,
            ready: false,
            word: 0,
            id: None,
        };
        assert_eq!(engine.tick(&view), EngineSignals::default());
        assert_eq!(engine.echoed(), 0);
    }

    #[test]
    fn test_loopback_failure() {
        let mut engine = LoopbackEngine::failing_after(1);
        engine.tick(&body_view(true, 1));
        engine.tick(&body_view(true, 1));
        assert_eq!(engine.tick(&body_view(true, 2)), EngineSignals::error());
    }

    #[test]
    fn test_loopback_swapped_reply() {
        let mut engine = LoopbackEngine::new();
        let view = EngineView {
            id: Some(IdWord::control(4, ByteOrder::Swapped)),
            ..body_view(true, 0)
        };
        let reply = engine.tick(&view).write.unwrap();
        assert_eq!(ByteOrder::detect(reply), ByteOrder::Swapped);
    }

    #[test]
    fn test_scripted_replays_then_quiet() {
        let mut engine = ScriptedEngine::new([EngineSignals::marker(), EngineSignals::error()]);
        let view = body_view(true, 0);
        assert_eq!(engine.tick(&view), EngineSignals::marker());
        assert_eq!(engine.remaining(), 1);
        assert_eq!(engine.tick(&view), EngineSignals::error());
        assert_eq!(engine.tick(&view), EngineSignals::default());
    }

    #[test]
    fn test_apply_sets_inputs() {
        let mut inputs = Inputs::default();
        EngineSignals::pull_and_write(9).apply(&mut inputs);
        assert!(inputs.engine_wants_next);
        assert!(inputs.engine_wrote_word);
        assert_eq!(inputs.engine_data, 9);
        assert!(!inputs.engine_header_marker);
    }
}
