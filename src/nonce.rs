//! Bit-sliced nonce search.
//!
//! The search packs one sponge state into two 64-bit words per trit, so a
//! single pass of the permutation evaluates 64 candidate nonces at once:
//! `(low, high)` bits of `(1, 1)` encode 0, `(0, 1)` encodes +1 and `(1, 0)`
//! encodes -1. Four counter slots seed every lane with a distinct trit
//! combination; a ripple counter in the tail of the nonce region walks the
//! remaining search space between passes.

use crate::curl::{HASH_LENGTH, STATE_LENGTH};
use crate::errors::Error;
use crate::trits::Trit;

const ROUNDS: usize = 27;
const LANES: usize = 64;
const ALL: u64 = u64::MAX;

/// Lane-enumeration seeds for the four counter slots, low words.
const SEED_LOW: [u64; 4] = [
    0xDB6D_B6DB_6DB6_DB6D,
    0xF1F8_FC7E_3F1F_8FC7,
    0x7FFF_E00F_FFFC_01FF,
    0xFFC0_0000_07FF_FFFF,
];

/// Lane-enumeration seeds for the four counter slots, high words.
const SEED_HIGH: [u64; 4] = [
    0xB6DB_6DB6_DB6D_B6DB,
    0x8FC7_E3F1_F8FC_7E3F,
    0xFFC0_1FFF_F803_FFFF,
    0x003F_FFFF_FFFF_FFFF,
];

/// Searches for a nonce of `length` trits occupying the state slots
/// `offset..offset + length` which, once absorbed into the sponge state
/// `state`, leaves a rate whose weight vanishes at exactly the prefix-third
/// demanded by `security`.
///
/// # Errors
/// Fails with [`Error::InvalidNonceLength`] when the nonce region exceeds
/// the sponge rate.
///
/// # Panics
/// Panics when `state` is shorter than [`STATE_LENGTH`] trits.
pub fn search(state: &[Trit], security: u8, length: usize, offset: usize) -> Result<Vec<Trit>, Error> {
    if length > HASH_LENGTH {
        return Err(Error::InvalidNonceLength(length));
    }
    let mut low = [ALL; STATE_LENGTH];
    let mut high = [ALL; STATE_LENGTH];
    for slot in 0..STATE_LENGTH {
        match state[slot] {
            1 => low[slot] = 0,
            -1 => high[slot] = 0,
            _ => {}
        }
    }
    low[offset..offset + 4].copy_from_slice(&SEED_LOW);
    high[offset..offset + 4].copy_from_slice(&SEED_HIGH);

    let counter_from = offset + 2 * length / 3;
    let counter_to = offset + length;
    loop {
        let (out_low, out_high) = transform(&low, &high);
        if let Some(lane) = scan(security, &out_low, &out_high) {
            return Ok(extract(&low, &high, lane, offset, length));
        }
        increment(&mut low, &mut high, counter_from, counter_to);
    }
}

/// One full permutation of a bit-sliced state, leaving the input untouched.
fn transform(
    low: &[u64; STATE_LENGTH],
    high: &[u64; STATE_LENGTH],
) -> ([u64; STATE_LENGTH], [u64; STATE_LENGTH]) {
    let mut src_low = *low;
    let mut src_high = *high;
    let mut dst_low = [0u64; STATE_LENGTH];
    let mut dst_high = [0u64; STATE_LENGTH];
    let mut index = 0;
    for _ in 0..ROUNDS {
        for slot in 0..STATE_LENGTH {
            let alpha = src_low[index];
            let beta = src_high[index];
            index = if index < 365 { index + 364 } else { index - 365 };
            let gamma = src_high[index];
            let delta = (alpha | !gamma) & (src_low[index] ^ beta);
            dst_low[slot] = !delta;
            dst_high[slot] = (alpha ^ gamma) | delta;
        }
        std::mem::swap(&mut src_low, &mut dst_low);
        std::mem::swap(&mut src_high, &mut dst_high);
    }
    (src_low, src_high)
}

/// Finds a lane whose rate weight vanishes at exactly the `security`-th
/// third: earlier prefix-thirds must keep a nonzero sum or the reader would
/// misjudge the signature length.
fn scan(security: u8, low: &[u64; STATE_LENGTH], high: &[u64; STATE_LENGTH]) -> Option<usize> {
    let third = HASH_LENGTH / 3;
    'lanes: for lane in 0..LANES {
        let mut sum: i32 = 0;
        for level in 1..=security as usize {
            for slot in (level - 1) * third..level * third {
                sum += if (low[slot] >> lane) & 1 == 0 {
                    1
                } else if (high[slot] >> lane) & 1 == 0 {
                    -1
                } else {
                    0
                };
            }
            if sum == 0 {
                if level == security as usize {
                    return Some(lane);
                }
                continue 'lanes;
            }
        }
    }
    None
}

/// Reads one lane of the pre-permutation nonce region back into trits.
fn extract(
    low: &[u64; STATE_LENGTH],
    high: &[u64; STATE_LENGTH],
    lane: usize,
    offset: usize,
    length: usize,
) -> Vec<Trit> {
    (offset..offset + length)
        .map(|slot| {
            match ((low[slot] >> lane) & 1, (high[slot] >> lane) & 1) {
                (1, 0) => -1,
                (0, 1) => 1,
                _ => 0,
            }
        })
        .collect()
}

/// Advances the shared ripple counter by one in balanced ternary.
fn increment(
    low: &mut [u64; STATE_LENGTH],
    high: &mut [u64; STATE_LENGTH],
    from: usize,
    to: usize,
) {
    for slot in from..to {
        if low[slot] == 0 {
            low[slot] = ALL;
            high[slot] = 0;
        } else if high[slot] == 0 {
            high[slot] = ALL;
            break;
        } else {
            low[slot] = 0;
            break;
        }
    }
}
