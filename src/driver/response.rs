//! Response packet collected from the outbound buffer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::protocol::{words_to_bytes, LengthWord};
use crate::transactor::{PacketOutcome, WordWrite};

/// One finished packet as it sits in the outbound buffer.
///
/// ```text
/// addr 0        trailer [hlen][reply words]  (unless moved by a header marker)
/// 1..=hlen      header region copy
/// hlen+1        response ID word              (validated packets only)
/// hlen+2..      counted reply words
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    trailer: LengthWord,
    trailer_address: u32,
    outcome: PacketOutcome,
    words: Vec<u32>,
}

impl Response {
    /// Cut the response image out of the outbound buffer.
    ///
    /// `trailer` is the write issued on the `Done` tick.
    pub fn from_outbound(outbound: &[u32], trailer: WordWrite, outcome: PacketOutcome) -> Self {
        let length = LengthWord::decode(trailer.data);
        let mut len = 1 + usize::from(length.header_words);
        if outcome.was_validated() {
            len += 1 + usize::from(length.body_words);
        }

        Self {
            trailer: length,
            trailer_address: trailer.address,
            outcome,
            words: outbound[..len.min(outbound.len())].to_vec(),
        }
    }

    /// Decoded trailer.
    #[inline]
    pub fn trailer(&self) -> LengthWord {
        self.trailer
    }

    /// Where the trailer was written.
    #[inline]
    pub fn trailer_address(&self) -> u32 {
        self.trailer_address
    }

    #[inline]
    pub fn outcome(&self) -> PacketOutcome {
        self.outcome
    }

    /// Counted reply words, as recorded in the trailer.
    #[inline]
    pub fn body_word_count(&self) -> u16 {
        self.trailer.body_words
    }

    /// The whole image, starting at address 0.
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Copy of the request's header region.
    pub fn header_words(&self) -> &[u32] {
        let end = (1 + usize::from(self.trailer.header_words)).min(self.words.len());
        &self.words[1.min(end)..end]
    }

    /// Response ID word written by the engine.
    pub fn reply_id_word(&self) -> Option<u32> {
        if !self.outcome.was_validated() {
            return None;
        }
        self.words
            .get(1 + usize::from(self.trailer.header_words))
            .copied()
    }

    /// Counted reply words written by the engine.
    pub fn reply_words(&self) -> &[u32] {
        if !self.outcome.was_validated() {
            return &[];
        }
        let start = (2 + usize::from(self.trailer.header_words)).min(self.words.len());
        &self.words[start..]
    }

    /// Big-endian byte stream of [`words`](Self::words).
    pub fn to_bytes(&self) -> Bytes {
        words_to_bytes(&self.words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Rejection;

    #[test]
    fn test_delivered_layout() {
        let outbound = [0x0001_0002, 0xAB, 0x2000_01F0, 7, 8, 0, 0];
        let response = Response::from_outbound(
            &outbound,
            WordWrite {
                address: 0,
                data: 0x0001_0002,
            },
            PacketOutcome::Delivered { words: 2 },
        );

        assert_eq!(response.words(), &outbound[..5]);
        assert_eq!(response.header_words(), &[0xAB]);
        assert_eq!(response.reply_id_word(), Some(0x2000_01F0));
        assert_eq!(response.reply_words(), &[7, 8]);
        assert_eq!(response.body_word_count(), 2);
    }

    #[test]
    fn test_rejected_has_no_reply() {
        let outbound = [0, 0, 0, 0];
        let response = Response::from_outbound(
            &outbound,
            WordWrite {
                address: 0,
                data: 0,
            },
            PacketOutcome::Rejected(Rejection::BodyTooShort(1)),
        );

        assert_eq!(response.words(), &[0]);
        assert!(response.header_words().is_empty());
        assert_eq!(response.reply_id_word(), None);
        assert!(response.reply_words().is_empty());
    }

    #[test]
    fn test_image_clamped_to_buffer() {
        let outbound = [0x0000_0010, 1, 2];
        let response = Response::from_outbound(
            &outbound,
            WordWrite {
                address: 0,
                data: 0x0000_0010,
            },
            PacketOutcome::EngineFault { words: 16 },
        );
        assert_eq!(response.words().len(), 3);
        assert_eq!(response.reply_words(), &[2]);
    }

    #[test]
    fn test_to_bytes_big_endian() {
        let response = Response::from_outbound(
            &[0x0000_0000],
            WordWrite {
                address: 0,
                data: 0,
            },
            PacketOutcome::Abandoned,
        );
        assert_eq!(&response.to_bytes()[..], &[0, 0, 0, 0]);
    }
}
