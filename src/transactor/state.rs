//! State machine and per-packet outcome types.

use serde::{Deserialize, Serialize};

use crate::protocol::Rejection;

/// All states of the transactor.
///
/// ```text
///  Idle ──start, hlen≠0──▶ Header ──hlen words relayed──▶ Id
///    │                                                    ▲ │
///    └───────────────start, hlen=0────────────────────────┘ │
///                                                valid│     │invalid
///                                                     ▼     ▼
///  Idle ◀───────────── Done ◀──marker & drained | error── Body
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// Waiting for a packet.
    #[default]
    Idle,
    /// Relaying the header region.
    Header,
    /// Checking the ID word.
    Id,
    /// Exchanging body words with the engine.
    Body,
    /// Writing the trailer.
    Done,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// How a packet ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketOutcome {
    /// Body drained and the engine signalled completion.
    Delivered { words: u16 },
    /// Failed the ID-phase check; no body transfer.
    Rejected(Rejection),
    /// Engine raised an error mid-body.
    EngineFault { words: u16 },
    /// A reset arrived while the packet was in flight.
    Abandoned,
}

impl PacketOutcome {
    /// Reply words recorded in the trailer (0 for rejected or abandoned packets).
    pub fn body_words(&self) -> u16 {
        match self {
            PacketOutcome::Delivered { words } | PacketOutcome::EngineFault { words } => *words,
            PacketOutcome::Rejected(_) | PacketOutcome::Abandoned => 0,
        }
    }

    /// Whether the packet passed validation and drained normally.
    #[inline]
    pub fn is_delivered(&self) -> bool {
        matches!(self, PacketOutcome::Delivered { .. })
    }

    /// Whether the packet reached the engine at all.
    #[inline]
    pub fn was_validated(&self) -> bool {
        matches!(
            self,
            PacketOutcome::Delivered { .. } | PacketOutcome::EngineFault { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(State::default(), State::Idle);
        assert_eq!(State::Body.to_string(), "Body");
    }

    #[test]
    fn test_outcome_body_words() {
        assert_eq!(PacketOutcome::Delivered { words: 5 }.body_words(), 5);
        assert_eq!(PacketOutcome::EngineFault { words: 3 }.body_words(), 3);
        assert_eq!(
            PacketOutcome::Rejected(Rejection::BodyTooShort(1)).body_words(),
            0
        );
        assert_eq!(PacketOutcome::Abandoned.body_words(), 0);
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(PacketOutcome::Delivered { words: 0 }.is_delivered());
        assert!(PacketOutcome::EngineFault { words: 0 }.was_validated());
        assert!(!PacketOutcome::EngineFault { words: 0 }.is_delivered());
        assert!(!PacketOutcome::Rejected(Rejection::UnsupportedVersion(1)).was_validated());
    }

    #[test]
    fn test_outcome_serializes() {
        let json = serde_json::to_string(&PacketOutcome::Delivered { words: 2 }).unwrap();
        assert_eq!(json, r#"{"Delivered":{"words":2}}"#);
    }
}
