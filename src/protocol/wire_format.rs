//! Wire format encoding and decoding.
//!
//! A packet sits in the inbound buffer as whole 32-bit words:
//! ```text
//! ┌───────────────┬─────────────────┬─────────┬──────────────────┐
//! │ Length word   │ Header region   │ ID word │ Body             │
//! │ [hlen][blen]  │ hlen words      │ 1 word  │ blen words       │
//! │ 16 | 16 bits  │ copied verbatim │         │ to the engine    │
//! └───────────────┴─────────────────┴─────────┴──────────────────┘
//! ```
//!
//! The ID word is the IPbus 2.0 packet header. In the normal map:
//! ```text
//! ┌─────────┬──────────┬──────────────┬──────┬──────┐
//! │ Version │ Reserved │ Packet ID    │ 0xF  │ Type │
//! │ 31..28  │ 27..24   │ 23..8        │ 7..4 │ 3..0 │
//! └─────────┴──────────┴──────────────┴──────┴──────┘
//! ```
//! A peer that emits the word with its bytes reversed puts the `0xF`
//! qualifier in the top nibble, which selects the swapped map.
//!
//! All words are big-endian on the wire regardless of the byte-order mode.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Only accepted protocol version.
pub const PROTOCOL_VERSION: u8 = 2;

/// Nibble that marks the byte-order qualifier position.
pub const BYTE_ORDER_QUALIFIER: u8 = 0xF;

/// Bytes per word on the wire.
pub const WORD_SIZE: usize = 4;

/// Packet type values carried in the ID word (informational only).
pub mod packet_type {
    /// Control packet (transactions).
    pub const CONTROL: u8 = 0x0;
    /// Status request.
    pub const STATUS: u8 = 0x1;
    /// Re-send request.
    pub const RESEND: u8 = 0x2;
}

/// Length word at address 0 of a packet, also used for the response trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthWord {
    /// Words in the header region.
    pub header_words: u16,
    /// Body words (request) or counted reply words (trailer).
    pub body_words: u16,
}

impl LengthWord {
    /// Create a new length word.
    pub fn new(header_words: u16, body_words: u16) -> Self {
        Self {
            header_words,
            body_words,
        }
    }

    /// Split a word into its high and low halves.
    #[inline]
    pub fn decode(word: u32) -> Self {
        Self {
            header_words: (word >> 16) as u16,
            body_words: word as u16,
        }
    }

    /// Pack into a single word.
    #[inline]
    pub fn encode(&self) -> u32 {
        (u32::from(self.header_words) << 16) | u32::from(self.body_words)
    }

    /// True when there is no header region to relay.
    #[inline]
    pub fn has_header_region(&self) -> bool {
        self.header_words != 0
    }
}

/// Which of the two field maps applies to a packet's ID word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Fields at their IPbus 2.0 positions.
    #[default]
    Normal,
    /// Word received byte-reversed.
    Swapped,
}

impl ByteOrder {
    /// Detect the byte order from the top nibble of an ID word.
    #[inline]
    pub fn detect(word: u32) -> Self {
        if (word >> 28) as u8 == BYTE_ORDER_QUALIFIER {
            ByteOrder::Swapped
        } else {
            ByteOrder::Normal
        }
    }

    /// The output flag value.
    #[inline]
    pub fn is_swapped(self) -> bool {
        self == ByteOrder::Swapped
    }

    /// Extraction map for this byte order.
    #[inline]
    pub fn field_map(self) -> &'static FieldMap {
        match self {
            ByteOrder::Normal => &NORMAL_MAP,
            ByteOrder::Swapped => &SWAPPED_MAP,
        }
    }
}

/// Bit positions of every ID word field for one byte order.
///
/// The packet ID is split into its two bytes because a byte swap moves them
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    /// Shift of the 4-bit version field.
    pub version_shift: u32,
    /// Shift of the packet ID's high byte.
    pub id_high_shift: u32,
    /// Shift of the packet ID's low byte.
    pub id_low_shift: u32,
    /// Shift of the 4-bit packet type field.
    pub type_shift: u32,
    /// Shift of the byte-order qualifier nibble.
    pub qualifier_shift: u32,
}

/// IPbus 2.0 layout.
pub const NORMAL_MAP: FieldMap = FieldMap {
    version_shift: 28,
    id_high_shift: 16,
    id_low_shift: 8,
    type_shift: 0,
    qualifier_shift: 4,
};

/// The normal layout after reversing the four bytes of the word.
pub const SWAPPED_MAP: FieldMap = FieldMap {
    version_shift: 4,
    id_high_shift: 8,
    id_low_shift: 16,
    type_shift: 24,
    qualifier_shift: 28,
};

impl FieldMap {
    /// Pull `(packet_id, version, packet_type)` out of a word.
    #[inline]
    pub fn extract(&self, word: u32) -> (u16, u8, u8) {
        let high = ((word >> self.id_high_shift) & 0xFF) as u16;
        let low = ((word >> self.id_low_shift) & 0xFF) as u16;
        let version = ((word >> self.version_shift) & 0xF) as u8;
        let packet_type = ((word >> self.type_shift) & 0xF) as u8;
        ((high << 8) | low, version, packet_type)
    }

    /// Place fields (and the qualifier nibble) into a word.
    ///
    /// Reserved bits are zero.
    #[inline]
    pub fn insert(&self, packet_id: u16, version: u8, packet_type: u8) -> u32 {
        (u32::from(version & 0xF) << self.version_shift)
            | (u32::from(packet_id >> 8) << self.id_high_shift)
            | (u32::from(packet_id & 0xFF) << self.id_low_shift)
            | (u32::from(packet_type & 0xF) << self.type_shift)
            | (u32::from(BYTE_ORDER_QUALIFIER) << self.qualifier_shift)
    }
}

/// Decoded ID word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdWord {
    /// Packet ID (0 = not sequence checked).
    pub packet_id: u16,
    /// 4-bit protocol version.
    pub version: u8,
    /// 4-bit packet type (see [`packet_type`]).
    pub packet_type: u8,
    /// Map the fields were taken from.
    pub byte_order: ByteOrder,
}

impl IdWord {
    /// Create a control packet ID word for the current protocol version.
    pub fn control(packet_id: u16, byte_order: ByteOrder) -> Self {
        Self {
            packet_id,
            version: PROTOCOL_VERSION,
            packet_type: packet_type::CONTROL,
            byte_order,
        }
    }

    /// Detect byte order and extract fields with the matching map.
    pub fn parse(word: u32) -> Self {
        let byte_order = ByteOrder::detect(word);
        let (packet_id, version, packet_type) = byte_order.field_map().extract(word);
        Self {
            packet_id,
            version,
            packet_type,
            byte_order,
        }
    }

    /// Encode with the map selected by `byte_order`.
    pub fn encode(&self) -> u32 {
        self.byte_order
            .field_map()
            .insert(self.packet_id, self.version, self.packet_type)
    }
}

/// Why a packet failed validation in the ID phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Rejection {
    /// Non-zero packet ID that is not the expected one.
    #[error("packet ID {got} does not match expected {expected}")]
    UnexpectedId { got: u16, expected: u16 },

    /// Version field other than [`PROTOCOL_VERSION`].
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),

    /// Body length of 0 or 1 words.
    #[error("body of {0} words is too short")]
    BodyTooShort(u16),
}

/// The ID-phase validation predicate.
///
/// `body_words > 1 && (id == 0 || id == expected) && version == 2`, with ID 0
/// exempt from the sequence check. Checks run in that order and the first
/// failure is reported, so a packet too short to carry a body is always
/// [`Rejection::BodyTooShort`] whatever its ID word holds.
pub fn validate(id: &IdWord, expected: u16, body_words: u16) -> Result<(), Rejection> {
    if body_words <= 1 {
        return Err(Rejection::BodyTooShort(body_words));
    }

    if id.packet_id != 0 && id.packet_id != expected {
        return Err(Rejection::UnexpectedId {
            got: id.packet_id,
            expected,
        });
    }

    if id.version != PROTOCOL_VERSION {
        return Err(Rejection::UnsupportedVersion(id.version));
    }

    Ok(())
}
