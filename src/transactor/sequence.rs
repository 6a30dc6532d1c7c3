//! NextExpectedId: the only state that survives from one packet to the next.

/// Expected packet ID, never zero.
///
/// Advances by one per validated packet and wraps from `0xFFFF` to `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter {
    next: u16,
    seed: u16,
}

impl SequenceCounter {
    /// Counter starting (and resetting) at `seed`. A zero seed becomes 1.
    pub fn new(seed: u16) -> Self {
        let seed = seed.max(1);
        Self { next: seed, seed }
    }

    /// Current expected ID.
    #[inline]
    pub fn get(&self) -> u16 {
        self.next
    }

    /// Step past the current ID, skipping zero.
    #[inline]
    pub fn advance(&mut self) {
        self.next = match self.next.wrapping_add(1) {
            0 => 1,
            n => n,
        };
    }

    /// Back to the seed.
    #[inline]
    pub fn reset(&mut self) {
        self.next = self.seed;
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one() {
        assert_eq!(SequenceCounter::default().get(), 1);
    }

    #[test]
    fn test_zero_seed_becomes_one() {
        assert_eq!(SequenceCounter::new(0).get(), 1);
    }

    #[test]
    fn test_advance() {
        let mut seq = SequenceCounter::new(41);
        seq.advance();
        assert_eq!(seq.get(), 42);
    }

    #[test]
    fn test_wraps_to_one() {
        let mut seq = SequenceCounter::new(0xFFFF);
        seq.advance();
        assert_eq!(seq.get(), 1);
    }

    #[test]
    fn test_never_zero_over_full_cycle() {
        let mut seq = SequenceCounter::default();
        for _ in 0..=u16::MAX as u32 + 2 {
            seq.advance();
            assert_ne!(seq.get(), 0);
        }
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut seq = SequenceCounter::new(100);
        seq.advance();
        seq.advance();
        seq.reset();
        assert_eq!(seq.get(), 100);
    }
}
