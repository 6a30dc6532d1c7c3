//! Addressable word buffers on either side of the transactor.
//!
//! The transactor never owns buffer storage; it only produces addresses.
//! [`InboundBuffer`] and [`OutboundBuffer`] are the two collaborator
//! contracts, and [`WordBuffer`] is a plain in-memory store implementing both.

use crate::config::TransactorConfig;
use crate::error::{Result, TransactorError};

/// Word store the transactor reads packets from.
pub trait InboundBuffer {
    /// Word at `address`.
    fn read(&self, address: u32) -> Result<u32>;
}

/// Word store the transactor writes responses into.
pub trait OutboundBuffer {
    /// Store `word` at `address`.
    fn write(&mut self, address: u32, word: u32) -> Result<()>;
}

/// Fixed-size word memory addressed from 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBuffer {
    words: Vec<u32>,
}

impl WordBuffer {
    /// Buffer sized for `config.addr_width`.
    pub fn new(config: &TransactorConfig) -> Self {
        Self::with_capacity(config.buffer_words())
    }

    /// Buffer of `2^addr_width` words.
    pub fn with_addr_width(addr_width: u8) -> Self {
        Self::with_capacity(1usize << addr_width)
    }

    /// Buffer of exactly `capacity` words.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity],
        }
    }

    /// Copy `words` in starting at address 0.
    pub fn load(&mut self, words: &[u32]) -> Result<()> {
        if words.len() > self.words.len() {
            return Err(TransactorError::Protocol(format!(
                "Packet of {} words does not fit buffer of {} words",
                words.len(),
                self.words.len()
            )));
        }
        self.words[..words.len()].copy_from_slice(words);
        Ok(())
    }

    /// Zero every word.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Whole buffer contents.
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of addressable words.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    fn index(&self, address: u32) -> Result<usize> {
        let index = address as usize;
        if index >= self.words.len() {
            return Err(TransactorError::AddressOutOfRange {
                address,
                capacity: self.words.len(),
            });
        }
        Ok(index)
    }
}

impl InboundBuffer for WordBuffer {
    fn read(&self, address: u32) -> Result<u32> {
        let index = self.index(address)?;
        Ok(self.words[index])
    }
}

impl OutboundBuffer for WordBuffer {
    fn write(&mut self, address: u32, word: u32) -> Result<()> {
        let index = self.index(address)?;
        self.words[index] = word;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_from_config() {
        let config = TransactorConfig {
            addr_width: 4,
            ..Default::default()
        };
        let buffer = WordBuffer::new(&config);
        assert_eq!(buffer.capacity(), 16);
        assert!(buffer.words().iter().all(|&w| w == 0));
    }

    #[test]
    fn test_load_then_read() {
        let mut buffer = WordBuffer::with_addr_width(3);
        buffer.load(&[0x0000_0002, 0x2000_01F0, 7]).unwrap();

        assert_eq!(buffer.read(0).unwrap(), 0x0000_0002);
        assert_eq!(buffer.read(2).unwrap(), 7);
        assert_eq!(buffer.read(3).unwrap(), 0);
    }

    #[test]
    fn test_write_then_read() {
        let mut buffer = WordBuffer::with_capacity(4);
        buffer.write(3, 0xDEAD_BEEF).unwrap();
        assert_eq!(buffer.read(3).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_out_of_range() {
        let mut buffer = WordBuffer::with_capacity(4);
        let err = buffer.read(4).unwrap_err();
        assert!(matches!(
            err,
            TransactorError::AddressOutOfRange { address: 4, capacity: 4 }
        ));
        assert!(buffer.write(100, 1).is_err());
    }

    #[test]
    fn test_load_too_large() {
        let mut buffer = WordBuffer::with_capacity(2);
        assert!(buffer.load(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_clear() {
        let mut buffer = WordBuffer::with_capacity(2);
        buffer.load(&[5, 6]).unwrap();
        buffer.clear();
        assert_eq!(buffer.words(), &[0, 0]);
    }
}
