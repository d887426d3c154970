//! Hash-chain one-time signatures over the sponge.
//!
//! A private key is expanded from a subseed as a run of rate-sized
//! fragments. Each fragment is a chain link: the signer iterates a fragment
//! away from the key by the distance encoded in one hash tryte, and the
//! verifier iterates the remaining distance to land on the committed chain
//! head. The digest of all chain heads hashes to the leaf address.

use crate::curl::{Curl, HASH_LENGTH};
use crate::trits::{self, Trit};
use zeroize::Zeroize;

/// Largest value a hash tryte can take.
pub const MAX_TRYTE_VALUE: i8 = 13;
/// Smallest value a hash tryte can take.
pub const MIN_TRYTE_VALUE: i8 = -13;
/// Chain length walked between a raw fragment and its committed head.
const CHAIN_LENGTH: usize = (MAX_TRYTE_VALUE - MIN_TRYTE_VALUE + 1) as usize;
/// Fragments contributed by each security level.
const FRAGMENTS_PER_LEVEL: usize = 27;
/// Trits of key material contributed by each security level.
pub const KEY_FRAGMENT_LENGTH: usize = FRAGMENTS_PER_LEVEL * HASH_LENGTH;

/// Derives the subseed for a leaf `index` from the channel seed.
pub fn subseed(seed: &[Trit], index: u64) -> Vec<Trit> {
    let mut counter = seed.to_vec();
    for _ in 0..index {
        trits::increment(&mut counter);
    }
    let mut curl = Curl::default();
    curl.absorb(&counter);
    counter.zeroize();
    let mut out = vec![0 as Trit; HASH_LENGTH];
    curl.squeeze(&mut out);
    out
}

/// Expands a subseed into the one-time private key for `security`.
pub fn private_key(subseed: &[Trit], security: u8) -> Vec<Trit> {
    let mut key = vec![0 as Trit; security as usize * KEY_FRAGMENT_LENGTH];
    let mut curl = Curl::default();
    curl.absorb(subseed);
    curl.squeeze(&mut key);
    for fragment in key.chunks_mut(HASH_LENGTH) {
        curl.reset();
        curl.absorb(fragment);
        fragment.copy_from_slice(curl.rate());
    }
    key
}

/// Computes the digest a subseed's key commits to, without retaining the key.
pub fn digest_from_subseed(subseed: &[Trit], security: u8) -> Vec<Trit> {
    let mut generator = Curl::default();
    let mut chain = Curl::default();
    let mut accumulator = Curl::default();
    generator.absorb(subseed);
    let mut fragment = [0 as Trit; HASH_LENGTH];
    for _ in 0..security as usize * FRAGMENTS_PER_LEVEL {
        generator.squeeze(&mut fragment);
        for _ in 0..CHAIN_LENGTH {
            chain.reset();
            chain.absorb(&fragment);
            fragment.copy_from_slice(chain.rate());
        }
        accumulator.absorb(&fragment);
    }
    let mut digest = vec![0 as Trit; HASH_LENGTH];
    accumulator.squeeze(&mut digest);
    digest
}

/// Hashes a digest into the address it is published under.
pub fn address(digest: &[Trit]) -> Vec<Trit> {
    let mut curl = Curl::default();
    curl.absorb(digest);
    let mut out = vec![0 as Trit; HASH_LENGTH];
    curl.squeeze(&mut out);
    out
}

/// Signs `hash` with the expanded `key`, consuming one chain distance per
/// hash tryte.
pub fn signature(hash: &[Trit], key: &[Trit]) -> Vec<Trit> {
    let mut out = key.to_vec();
    let mut curl = Curl::default();
    for (i, fragment) in out.chunks_mut(HASH_LENGTH).enumerate() {
        for _ in 0..(MAX_TRYTE_VALUE - tryte_value(hash, i)) as usize {
            curl.reset();
            curl.absorb(fragment);
            fragment.copy_from_slice(curl.rate());
        }
    }
    out
}

/// Walks a signature the rest of the way up its chains and hashes the heads
/// back into the digest the signer committed to.
pub fn digest_from_signature(hash: &[Trit], signature: &[Trit]) -> Vec<Trit> {
    let mut heads = signature.to_vec();
    let mut curl = Curl::default();
    for (i, fragment) in heads.chunks_mut(HASH_LENGTH).enumerate() {
        for _ in 0..(tryte_value(hash, i) - MIN_TRYTE_VALUE) as usize {
            curl.reset();
            curl.absorb(fragment);
            fragment.copy_from_slice(curl.rate());
        }
    }
    curl.reset();
    curl.absorb(&heads);
    let mut digest = vec![0 as Trit; HASH_LENGTH];
    curl.squeeze(&mut digest);
    digest
}

/// Smallest prefix-third of `hash` whose trits sum to zero: 1, 2 or 3, or 0
/// when no prefix vanishes and the hash is unusable for signing.
pub fn checksum_security(hash: &[Trit]) -> usize {
    let third = hash.len() / 3;
    let mut sum: i32 = hash[..third].iter().map(|&t| i32::from(t)).sum();
    if sum == 0 {
        return 1;
    }
    sum += hash[third..2 * third]
        .iter()
        .map(|&t| i32::from(t))
        .sum::<i32>();
    if sum == 0 {
        return 2;
    }
    sum += hash[2 * third..].iter().map(|&t| i32::from(t)).sum::<i32>();
    if sum == 0 {
        3
    } else {
        0
    }
}

fn tryte_value(hash: &[Trit], index: usize) -> i8 {
    hash[3 * index] + 3 * hash[3 * index + 1] + 9 * hash[3 * index + 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_seed() -> Vec<Trit> {
        (0..HASH_LENGTH).map(|i| (i % 3) as Trit - 1).collect()
    }

    /// A hash whose first third sums to zero, so every security level can
    /// sign it.
    fn balanced_hash() -> Vec<Trit> {
        let mut hash = vec![0 as Trit; HASH_LENGTH];
        for i in 0..40 {
            hash[2 * i] = 1;
            hash[2 * i + 1] = -1;
        }
        hash[200] = 1;
        hash[220] = -1;
        hash
    }

    #[test]
    fn subseeds_differ_by_index() {
        let seed = test_seed();
        let a = subseed(&seed, 0);
        let b = subseed(&seed, 1);
        assert_eq!(a.len(), HASH_LENGTH);
        assert_ne!(a, b);
        assert_eq!(b, subseed(&seed, 1));
    }

    #[test]
    fn key_length_scales_with_security() {
        let sub = subseed(&test_seed(), 3);
        for security in 1..=3u8 {
            let key = private_key(&sub, security);
            assert_eq!(key.len(), security as usize * KEY_FRAGMENT_LENGTH);
        }
    }

    #[test]
    fn signature_recovers_committed_digest() {
        let sub = subseed(&test_seed(), 7);
        let hash = balanced_hash();
        for security in 1..=3u8 {
            let key = private_key(&sub, security);
            let digest = digest_from_subseed(&sub, security);
            let sig = signature(&hash, &key);
            assert_eq!(digest_from_signature(&hash, &sig), digest);
        }
    }

    #[test]
    fn tampered_signature_misses_digest() {
        let sub = subseed(&test_seed(), 7);
        let hash = balanced_hash();
        let key = private_key(&sub, 1);
        let digest = digest_from_subseed(&sub, 1);
        let mut sig = signature(&hash, &key);
        sig[100] = -sig[100];
        assert_ne!(digest_from_signature(&hash, &sig), digest);
    }

    #[test]
    fn wrong_hash_misses_digest() {
        let sub = subseed(&test_seed(), 2);
        let key = private_key(&sub, 1);
        let digest = digest_from_subseed(&sub, 1);
        let hash = balanced_hash();
        let mut other = hash.clone();
        other[0] = -1;
        other[1] = 1;
        assert_ne!(
            digest_from_signature(&other, &signature(&hash, &key)),
            digest
        );
    }

    #[test]
    fn checksum_security_picks_smallest_prefix() {
        let mut hash = vec![0 as Trit; HASH_LENGTH];
        assert_eq!(checksum_security(&hash), 1);
        hash[0] = 1;
        hash[100] = -1;
        assert_eq!(checksum_security(&hash), 2);
        hash[100] = 0;
        hash[200] = -1;
        assert_eq!(checksum_security(&hash), 3);
        hash[200] = 0;
        assert_eq!(checksum_security(&hash), 0);
    }
}
