//! Keystream masking driven by the sponge rate.
//!
//! Masking adds the running rate to the payload trit-by-trit while the
//! plaintext is absorbed, so the keystream for each chunk commits to
//! everything absorbed before it. Unmasking subtracts the same keystream and
//! re-absorbs the recovered plaintext, leaving both sides' sponges in the
//! same state.

use crate::curl::{Curl, HASH_LENGTH, MASK_HASH_ROUNDS};
use crate::trits::Trit;

/// Adds two trits in balanced ternary, wrapping at the radix.
///
/// The sum is its own inverse under negation: `trit_sum(trit_sum(a, b), -b)`
/// is `a` again.
pub fn trit_sum(a: Trit, b: Trit) -> Trit {
    match a + b {
        2 => -1,
        -2 => 1,
        sum => sum,
    }
}

/// Masks `payload` in place with the keystream of `curl`, absorbing the
/// plaintext as it goes.
pub fn mask_slice(payload: &mut [Trit], curl: &mut Curl) {
    let mut key_chunk = [0 as Trit; HASH_LENGTH];
    key_chunk.copy_from_slice(curl.rate());
    let mut offset = 0;
    while offset < payload.len() {
        let end = usize::min(offset + HASH_LENGTH, payload.len());
        curl.absorb(&payload[offset..end]);
        let mut state = [0 as Trit; HASH_LENGTH];
        state.copy_from_slice(curl.rate());
        for i in 0..end - offset {
            payload[offset + i] = trit_sum(payload[offset + i], key_chunk[i]);
            key_chunk[i] = state[i];
        }
        offset = end;
    }
}

/// Inverse of [`mask_slice`]: recovers the plaintext in place and absorbs it.
pub fn unmask_slice(payload: &mut [Trit], curl: &mut Curl) {
    let mut key_chunk = [0 as Trit; HASH_LENGTH];
    key_chunk.copy_from_slice(curl.rate());
    let mut offset = 0;
    while offset < payload.len() {
        let end = usize::min(offset + HASH_LENGTH, payload.len());
        for i in 0..end - offset {
            payload[offset + i] = trit_sum(payload[offset + i], -key_chunk[i]);
        }
        curl.absorb(&payload[offset..end]);
        key_chunk[..end - offset].copy_from_slice(&curl.rate()[..end - offset]);
        offset = end;
    }
}

/// Hides a channel root into its announce address with an 81-round sponge.
pub fn mask_hash(key: &[Trit]) -> Vec<Trit> {
    let mut curl = Curl::new(MASK_HASH_ROUNDS);
    curl.absorb(key);
    let mut out = vec![0 as Trit; HASH_LENGTH];
    curl.squeeze(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    #[derive(Clone, Debug)]
    struct TritVec(Vec<Trit>);

    impl Arbitrary for TritVec {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            let len = usize::arbitrary(g) % 700;
            TritVec((0..len).map(|_| i8::arbitrary(g).rem_euclid(3) - 1).collect())
        }
    }

    fn keyed_curl() -> Curl {
        let mut curl = Curl::default();
        curl.absorb(&[1, -1, 0, 1, 1, -1, 0, 0, 1]);
        curl
    }

    #[test]
    fn trit_sum_wraps() {
        assert_eq!(trit_sum(1, 1), -1);
        assert_eq!(trit_sum(-1, -1), 1);
        assert_eq!(trit_sum(1, -1), 0);
        assert_eq!(trit_sum(0, 1), 1);
    }

    #[quickcheck]
    fn trit_sum_has_inverses(a: i8, b: i8) -> bool {
        let (a, b) = (a.rem_euclid(3) - 1, b.rem_euclid(3) - 1);
        trit_sum(a, b) == trit_sum(b, a)
            && trit_sum(a, -a) == 0
            && trit_sum(trit_sum(a, b), -b) == a
    }

    #[quickcheck]
    fn unmask_inverts_mask(payload: TritVec) -> bool {
        let mut buffer = payload.0.clone();
        let mut masking = keyed_curl();
        mask_slice(&mut buffer, &mut masking);
        let mut unmasking = keyed_curl();
        unmask_slice(&mut buffer, &mut unmasking);
        buffer == payload.0 && masking.state() == unmasking.state()
    }

    #[test]
    fn unmask_works_split_at_chunk_boundaries() {
        let mut buffer: Vec<Trit> = (0..500).map(|i| (i % 3) as Trit - 1).collect();
        let original = buffer.clone();
        let mut masking = keyed_curl();
        mask_slice(&mut buffer, &mut masking);
        let mut unmasking = keyed_curl();
        unmask_slice(&mut buffer[..HASH_LENGTH], &mut unmasking);
        unmask_slice(&mut buffer[HASH_LENGTH..], &mut unmasking);
        assert_eq!(buffer, original);
    }

    #[test]
    fn mask_hash_differs_from_input() {
        let root: Vec<Trit> = (0..HASH_LENGTH).map(|i| (i % 3) as Trit - 1).collect();
        let hidden = mask_hash(&root);
        assert_eq!(hidden.len(), HASH_LENGTH);
        assert_ne!(hidden, root);
        assert_eq!(hidden, mask_hash(&root));
    }
}
