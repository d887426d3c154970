//! The Curl sponge over a 729-trit state.
//!
//! The state splits into a public rate of [`HASH_LENGTH`] trits and a hidden
//! capacity. Absorbing copies input into the rate a chunk at a time and
//! permutes; squeezing reads the rate and permutes. Every hash, key and
//! keystream in this crate is produced by one of these two motions.

use crate::trits::Trit;

/// Width of the sponge rate, and of every address and digest, in trits.
pub const HASH_LENGTH: usize = 243;

/// Width of the full sponge state in trits.
pub const STATE_LENGTH: usize = 3 * HASH_LENGTH;

/// Round count used everywhere except channel address hiding.
pub const DEFAULT_ROUNDS: usize = 27;

/// Round count used when hiding a channel root into an address.
pub const MASK_HASH_ROUNDS: usize = 81;

/// Output of the round function, indexed by `a + 4b + 5` for input trits
/// `a` and `b`. The 2 entries are never reachable from balanced input.
const TRUTH_TABLE: [Trit; 11] = [1, 0, -1, 2, 1, -1, 0, 2, -1, 1, 0];

/// A Curl sponge instance. Cheap to create and intended to stay local to a
/// single operation.
#[derive(Clone)]
pub struct Curl {
    state: [Trit; STATE_LENGTH],
    rounds: usize,
}

impl Default for Curl {
    fn default() -> Self {
        Curl::new(DEFAULT_ROUNDS)
    }
}

impl Curl {
    /// Creates a sponge with an all-zero state and the given round count.
    pub fn new(rounds: usize) -> Self {
        Curl {
            state: [0; STATE_LENGTH],
            rounds,
        }
    }

    /// Mixes `trits` into the state, one rate-sized chunk at a time. A final
    /// partial chunk overwrites only the front of the rate.
    pub fn absorb(&mut self, trits: &[Trit]) {
        for chunk in trits.chunks(HASH_LENGTH) {
            self.state[..chunk.len()].copy_from_slice(chunk);
            self.transform();
        }
    }

    /// Fills `out` with keystream, permuting after every chunk read.
    pub fn squeeze(&mut self, out: &mut [Trit]) {
        for chunk in out.chunks_mut(HASH_LENGTH) {
            let len = chunk.len();
            chunk.copy_from_slice(&self.state[..len]);
            self.transform();
        }
    }

    /// The current rate, without advancing the sponge.
    pub fn rate(&self) -> &[Trit] {
        &self.state[..HASH_LENGTH]
    }

    /// The full current state, without advancing the sponge.
    pub fn state(&self) -> &[Trit] {
        &self.state
    }

    /// Returns the state to all zeroes.
    pub fn reset(&mut self) {
        self.state = [0; STATE_LENGTH];
    }

    fn transform(&mut self) {
        let mut scratch = [0 as Trit; STATE_LENGTH];
        let mut index = 0;
        for _ in 0..self.rounds {
            scratch.copy_from_slice(&self.state);
            for slot in self.state.iter_mut() {
                let a = scratch[index];
                index = if index < 365 { index + 364 } else { index - 365 };
                let b = scratch[index];
                *slot = TRUTH_TABLE[(a + (b << 2) + 5) as usize];
            }
        }
    }
}
