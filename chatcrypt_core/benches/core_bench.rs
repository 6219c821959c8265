use chatcrypt_core::bbs::BlumBlumShub;
use chatcrypt_core::primes::{PrimeTable, SIEVE_LIMIT, primitive_root};
use chatcrypt_core::{
    ChatSession, CipherKey, DhParams, ExchangeBounds, Sdes, derive_session_rng,
    generate_parameters_with_rng,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_prime_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("prime_field");
    group.sample_size(20);
    group.bench_function("sieve-2^17", |b| {
        b.iter(|| black_box(PrimeTable::new(SIEVE_LIMIT).len()))
    });
    for modulus in [2053u64, 65521] {
        group.bench_function(format!("primitive-root-{modulus}"), |b| {
            b.iter(|| black_box(primitive_root(black_box(modulus))))
        });
    }
}

fn bench_parameters(c: &mut Criterion) {
    let mut group = c.benchmark_group("dh");
    group.sample_size(20);
    let bounds = ExchangeBounds::standard();
    group.bench_function("generate-parameters", |b| {
        let mut rng = derive_session_rng(b"bench", b"params");
        b.iter(|| black_box(generate_parameters_with_rng(bounds, &mut rng).unwrap()))
    });
    let params = DhParams::for_modulus(65521).unwrap();
    group.bench_function("join", |b| {
        let mut rng = derive_session_rng(b"bench", b"join");
        b.iter(|| black_box(ChatSession::join_with_rng(params, &bounds, &mut rng).unwrap()))
    });
}

fn bench_bbs(c: &mut Criterion) {
    let mut group = c.benchmark_group("bbs");
    for seed in [1234u64, 65535] {
        group.bench_function(format!("seed-{seed}-10-bits"), |b| {
            b.iter(|| {
                let mut generator = BlumBlumShub::from_seed(black_box(seed)).unwrap();
                black_box(generator.next_bits(10))
            })
        });
    }
    let mut generator = BlumBlumShub::from_seed(4321).unwrap();
    group.bench_function("step", |b| b.iter(|| black_box(generator.next_bit())));
}

fn bench_sdes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sdes");
    let key = CipherKey::new(0b1010000010).unwrap();
    group.bench_function("key-schedule", |b| b.iter(|| black_box(Sdes::new(black_box(key)))));
    let cipher = Sdes::new(key);
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(8);
    group.bench_function("encrypt-360-chars", |b| {
        b.iter(|| black_box(cipher.encrypt(&text).unwrap()))
    });
    let bits = cipher.encrypt(&text).unwrap();
    group.bench_function("decrypt-360-chars", |b| {
        b.iter(|| black_box(cipher.decrypt(&bits).unwrap()))
    });
}

fn bench_session_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    let params = DhParams::for_modulus(65521).unwrap();
    let bounds = ExchangeBounds::standard();
    let mut rng = derive_session_rng(b"bench", b"session");
    let alice = ChatSession::join_with_rng(params, &bounds, &mut rng).unwrap();
    let bob = ChatSession::join_with_rng(params, &bounds, &mut rng).unwrap();
    group.bench_function("encrypt-for-peer", |b| {
        b.iter(|| black_box(alice.encrypt_for(bob.public_key(), "hello there").unwrap()))
    });
}

criterion_group!(
    benches,
    bench_prime_field,
    bench_parameters,
    bench_bbs,
    bench_sdes,
    bench_session_message
);
criterion_main!(benches);
