//! Protocol module - wire format, field maps, and packet codecs.
//!
//! This module implements the word-level format the transactor consumes:
//! - Length/trailer word (`[hlen:16][blen:16]`)
//! - ID word with byte-order detection and the two frozen field maps
//! - The ID-phase validation predicate
//! - [`Packet`] with word and big-endian byte codecs

mod packet;
mod wire_format;

pub use packet::{bytes_to_words, words_to_bytes, Packet};
pub use wire_format::{
    packet_type, validate, ByteOrder, FieldMap, IdWord, LengthWord, Rejection,
    BYTE_ORDER_QUALIFIER, NORMAL_MAP, PROTOCOL_VERSION, SWAPPED_MAP, WORD_SIZE,
};
