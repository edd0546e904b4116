//! Data field randomization.
//!
//! DATA fields are XOR'd with the output of an 8-bit LFSR so that payloads
//! full of reserved bytes do not double in size when stuffed. The sequence
//! restarts from [`RANDOM_SEED`] for every frame, which keeps both ends in
//! step regardless of frame loss.

use crate::constants::{RANDOM_SEED, RANDOM_TAPS};

/// Pseudo-random byte generator.
#[derive(Debug, Clone)]
pub struct Randomizer {
    state: u8,
}

impl Default for Randomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Randomizer {
    /// Start a sequence from the seed.
    pub fn new() -> Self {
        Randomizer { state: RANDOM_SEED }
    }

    /// Next byte of the sequence.
    pub fn next_byte(&mut self) -> u8 {
        let out = self.state;
        self.state >>= 1;
        if out & 0x01 != 0 {
            self.state ^= RANDOM_TAPS;
        }
        out
    }

    /// XOR `data` with the sequence in place.
    pub fn apply(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte ^= self.next_byte();
        }
    }
}

/// Randomize (or de-randomize) a DATA field in place.
pub fn randomize(data: &mut [u8]) {
    Randomizer::new().apply(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence() {
        let mut rng = Randomizer::new();
        let bytes: Vec<u8> = (0..16).map(|_| rng.next_byte()).collect();
        assert_eq!(
            bytes,
            vec![
                0x42, 0x21, 0xA8, 0x54, 0x2A, 0x15, 0xB2, 0x59, 0x94, 0x4A, 0x25, 0xAA, 0x55,
                0x92, 0x49, 0x9C
            ]
        );
    }

    #[test]
    fn test_involution() {
        let mut data = vec![0x00, 0x7E, 0x7D, 0xFF];
        randomize(&mut data);
        assert_eq!(data, vec![0x42, 0x5F, 0xD5, 0xAB]);
        randomize(&mut data);
        assert_eq!(data, vec![0x00, 0x7E, 0x7D, 0xFF]);
    }
}
