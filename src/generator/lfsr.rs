//! Pseudo-random payload bytes

/// Feedback taps of the maximal-period 8-bit Galois LFSR.
pub const LFSR_TAPS: u8 = 0xB8;

/// Seed used when none is configured.
pub const DEFAULT_LFSR_SEED: u8 = 0xE1;

/// 8-bit Galois LFSR; visits all 255 non-zero states before repeating.
#[derive(Debug, Clone)]
pub struct Lfsr {
    state: u8,
}

impl Lfsr {
    /// Returns `None` for a zero seed, which would lock the register at zero.
    pub fn new(seed: u8) -> Option<Self> {
        (seed != 0).then_some(Self { state: seed })
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    pub fn next_byte(&mut self) -> u8 {
        let lsb = self.state & 0x1;
        self.state >>= 1;
        if lsb != 0 {
            self.state ^= LFSR_TAPS;
        }
        self.state
    }
}

impl Default for Lfsr {
    fn default() -> Self {
        Self { state: DEFAULT_LFSR_SEED }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn zero_seed_is_rejected() {
        assert!(Lfsr::new(0).is_none());
    }

    #[test]
    fn first_values_from_default_seed() {
        let mut lfsr = Lfsr::default();
        // 0xE1 -> shift 0x70, xor 0xB8 -> 0xC8
        assert_eq!(lfsr.next_byte(), 0xC8);
        // 0xC8 -> 0x64
        assert_eq!(lfsr.next_byte(), 0x64);
    }

    #[test]
    fn period_is_maximal() {
        let mut lfsr = Lfsr::default();
        let seen: HashSet<u8> = (0..255).map(|_| lfsr.next_byte()).collect();
        assert_eq!(seen.len(), 255);
        assert!(!seen.contains(&0));
        assert_eq!(lfsr.state(), DEFAULT_LFSR_SEED);
    }
}
