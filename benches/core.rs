#[macro_use]
extern crate criterion;
use criterion::Criterion;

use mam::curl::{Curl, HASH_LENGTH, STATE_LENGTH};
use mam::merkle::MerkleTree;
use mam::trits::Trit;
use mam::{nonce, parse_message, Channel, ChannelMode};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_trits(len: usize) -> Vec<Trit> {
    let mut rng = StdRng::seed_from_u64(0x6d616d);
    (0..len).map(|_| rng.gen_range(-1..=1)).collect()
}

fn sponge_absorb(c: &mut Criterion) {
    let input = random_trits(STATE_LENGTH);
    c.bench_function("Absorb one full state", |b| {
        b.iter(|| {
            let mut curl = Curl::default();
            curl.absorb(&input);
        })
    });
}

fn tree_build(c: &mut Criterion) {
    let seed = random_trits(HASH_LENGTH);
    for &count in &[1usize, 4] {
        c.bench_function(format!("Merkle window with {} leaves", count).as_str(), |b| {
            b.iter(|| MerkleTree::new(&seed, 0, count, 1))
        });
    }
}

fn nonce_search(c: &mut Criterion) {
    let mut curl = Curl::default();
    curl.absorb(&random_trits(STATE_LENGTH));
    c.bench_function("Nonce search at security 1", |b| {
        b.iter(|| nonce::search(curl.state(), 1, HASH_LENGTH / 3, 0).unwrap())
    });
}

fn publish_and_parse(c: &mut Criterion) {
    let seed: String = "BENCHSEED9".chars().cycle().take(81).collect();
    c.bench_function("Publish one message", |b| {
        let mut channel = Channel::new(&seed, 1, ChannelMode::Public, None).unwrap();
        b.iter(|| channel.create_message("BENCHMARK9MESSAGE").unwrap())
    });
    c.bench_function("Parse one message", |b| {
        let mut channel = Channel::new(&seed, 1, ChannelMode::Public, None).unwrap();
        let sent = channel.create_message("BENCHMARK9MESSAGE").unwrap();
        b.iter(|| parse_message(&sent.payload, &sent.root, None).unwrap())
    });
}

criterion_group!(
    benches,
    sponge_absorb,
    tree_build,
    nonce_search,
    publish_and_parse
);
criterion_main!(benches);
