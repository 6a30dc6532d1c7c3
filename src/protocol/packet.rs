//! Request packet with word and byte codecs.
//!
//! A [`Packet`] is what a requester hands to the transactor: optional header
//! words, the ID word, and the body. [`Packet::words`] lays it out exactly as
//! it sits in the inbound buffer, length word first.
//!
//! # Example
//!
//! ```
//! use ipbus_transactor::protocol::{ByteOrder, IdWord, Packet};
//!
//! let packet = Packet::new(IdWord::control(1, ByteOrder::Normal).encode(), vec![0xA, 0xB]);
//! let words = packet.words().unwrap();
//! assert_eq!(words, vec![0x0000_0002, 0x2000_01F0, 0xA, 0xB]);
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::wire_format::{IdWord, LengthWord, WORD_SIZE};
use crate::error::{Result, TransactorError};

/// A complete request packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Header region, relayed verbatim to the response.
    pub header: Vec<u32>,
    /// Raw ID word (either byte order).
    pub id_word: u32,
    /// Body words for the transaction engine.
    pub body: Vec<u32>,
}

impl Packet {
    /// Create a packet without a header region.
    pub fn new(id_word: u32, body: Vec<u32>) -> Self {
        Self {
            header: Vec::new(),
            id_word,
            body,
        }
    }

    /// Attach a header region.
    pub fn with_header(mut self, header: Vec<u32>) -> Self {
        self.header = header;
        self
    }

    /// Decoded view of the ID word.
    #[inline]
    pub fn id(&self) -> IdWord {
        IdWord::parse(self.id_word)
    }

    /// Length word for this packet.
    ///
    /// Fails if either region does not fit a 16-bit length field.
    pub fn length_word(&self) -> Result<LengthWord> {
        let header_words = u16::try_from(self.header.len()).map_err(|_| {
            TransactorError::Protocol(format!(
                "Header region of {} words exceeds 16-bit length",
                self.header.len()
            ))
        })?;
        let body_words = u16::try_from(self.body.len()).map_err(|_| {
            TransactorError::Protocol(format!(
                "Body of {} words exceeds 16-bit length",
                self.body.len()
            ))
        })?;
        Ok(LengthWord::new(header_words, body_words))
    }

    /// Total words including the length word.
    #[inline]
    pub fn word_len(&self) -> usize {
        2 + self.header.len() + self.body.len()
    }

    /// Lay the packet out as inbound buffer words.
    pub fn words(&self) -> Result<Vec<u32>> {
        let length = self.length_word()?;
        let mut words = Vec::with_capacity(self.word_len());
        words.push(length.encode());
        words.extend_from_slice(&self.header);
        words.push(self.id_word);
        words.extend_from_slice(&self.body);
        Ok(words)
    }

    /// Encode as a big-endian byte stream.
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(words_to_bytes(&self.words()?))
    }

    /// Parse from inbound buffer words.
    ///
    /// Returns [`TransactorError::Protocol`] if the word count disagrees with
    /// the length word.
    pub fn from_words(words: &[u32]) -> Result<Self> {
        let Some((&first, rest)) = words.split_first() else {
            return Err(TransactorError::Protocol("Empty packet".to_string()));
        };

        let length = LengthWord::decode(first);
        let hlen = usize::from(length.header_words);
        let blen = usize::from(length.body_words);

        if rest.len() != hlen + 1 + blen {
            return Err(TransactorError::Protocol(format!(
                "Length word claims {} words, packet has {}",
                hlen + 1 + blen,
                rest.len()
            )));
        }

        Ok(Self {
            header: rest[..hlen].to_vec(),
            id_word: rest[hlen],
            body: rest[hlen + 1..].to_vec(),
        })
    }

    /// Parse from a big-endian byte stream.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        Self::from_words(&bytes_to_words(buf)?)
    }
}

/// Encode words as a contiguous big-endian byte stream.
pub fn words_to_bytes(words: &[u32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(words.len() * WORD_SIZE);
    for &word in words {
        buf.put_u32(word);
    }
    buf.freeze()
}

/// Decode a big-endian byte stream into words.
///
/// Fails if the stream is not a whole number of words.
pub fn bytes_to_words(mut buf: &[u8]) -> Result<Vec<u32>> {
    if buf.len() % WORD_SIZE != 0 {
        return Err(TransactorError::Protocol(format!(
            "Byte stream of {} bytes is not word aligned",
            buf.len()
        )));
    }

    let mut words = Vec::with_capacity(buf.len() / WORD_SIZE);
    while buf.has_remaining() {
        words.push(buf.get_u32());
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ByteOrder;

    fn id_word(id: u16) -> u32 {
        IdWord::control(id, ByteOrder::Normal).encode()
    }

    #[test]
    fn test_words_layout_with_header() {
        let packet = Packet::new(id_word(3), vec![0x11, 0x22, 0x33]).with_header(vec![0xAA, 0xBB]);
        let words = packet.words().unwrap();

        assert_eq!(words[0], 0x0002_0003);
        assert_eq!(&words[1..3], &[0xAA, 0xBB]);
        assert_eq!(words[3], id_word(3));
        assert_eq!(&words[4..], &[0x11, 0x22, 0x33]);
        assert_eq!(words.len(), packet.word_len());
    }

    #[test]
    fn test_from_words_splits_regions() {
        let words = [0x0001_0002, 0xCAFE, id_word(9), 0x1, 0x2];
        let packet = Packet::from_words(&words).unwrap();

        assert_eq!(packet.header, vec![0xCAFE]);
        assert_eq!(packet.id().packet_id, 9);
        assert_eq!(packet.body, vec![0x1, 0x2]);
    }

    #[test]
    fn test_from_words_length_mismatch() {
        let result = Packet::from_words(&[0x0000_0003, id_word(1), 0x1]);
        assert!(result.unwrap_err().to_string().contains("claims 4 words"));
    }

    #[test]
    fn test_from_words_empty() {
        assert!(Packet::from_words(&[]).is_err());
    }

    #[test]
    fn test_bytes_are_big_endian() {
        let packet = Packet::new(0x2000_01F0, vec![0x0102_0304, 0x0506_0708]);
        let bytes = packet.to_bytes().unwrap();

        assert_eq!(bytes.len(), 4 * WORD_SIZE);
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x00, 0x02]);
        assert_eq!(&bytes[4..8], &[0x20, 0x00, 0x01, 0xF0]);
        assert_eq!(&bytes[8..12], &[0x01, 0x02, 0x03, 0x04]);

        assert_eq!(Packet::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn test_unaligned_bytes_rejected() {
        let result = bytes_to_words(&[0, 0, 0, 2, 0x20]);
        assert!(result.unwrap_err().to_string().contains("not word aligned"));
    }

    #[test]
    fn test_oversized_body_rejected() {
        let packet = Packet::new(id_word(1), vec![0; usize::from(u16::MAX) + 1]);
        assert!(packet.words().is_err());
    }
}
