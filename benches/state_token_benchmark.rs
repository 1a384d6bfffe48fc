use authbridge::services::state_token::{StateTokenSigner, DEFAULT_NONCE_BYTES};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

fn benchmark_state_tokens(c: &mut Criterion) {
    let signer = StateTokenSigner::new(
        b"benchmark_auth_secret_32_bytes_minimum",
        Some(Duration::from_secs(600)),
    )
    .expect("Failed to create signer");

    let token = signer
        .generate(DEFAULT_NONCE_BYTES)
        .expect("Failed to generate token");

    // Same length as a real token, wrong digest
    let (value, digest) = token.split_once('|').expect("Malformed token");
    let forged = format!("{}|{}", value, "0".repeat(digest.len()));

    let mut group = c.benchmark_group("state_token");

    group.bench_function("generate", |b| {
        b.iter(|| signer.generate(black_box(DEFAULT_NONCE_BYTES)))
    });

    group.bench_function("verify_valid", |b| {
        b.iter(|| signer.verify(black_box(&token)))
    });

    group.bench_function("verify_forged", |b| {
        b.iter(|| signer.verify(black_box(&forged)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_state_tokens);
criterion_main!(benches);
