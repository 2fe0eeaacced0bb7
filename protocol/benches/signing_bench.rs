// Signing and key-derivation benchmarks.
//
// Covers SLIP-10 derivation through the vault (cold and cached), signing of
// a serialized payload, and envelope verification.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use txauth_protocol::crypto::KeyPair;
use txauth_protocol::identity::KeyVault;
use txauth_protocol::transaction::{
    encode_input_data, sign_input_data, signing_digest, verify_transaction, Command, InputData,
    OrderCancellation, ProofOfWork, Signature, Transaction, TxVersion,
};

const CHAIN_ID: &str = "bench-chain";

fn payload() -> Vec<u8> {
    let mut input = InputData::new(Command::OrderCancellation(OrderCancellation {
        order_id: None,
        market_id: Some("market-1".into()),
    }));
    input.nonce = 42;
    input.block_height = 1_000_000;
    encode_input_data(&input).unwrap()
}

fn bench_vault_derive(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/derive");

    group.bench_function("cold", |b| {
        b.iter_batched(
            || KeyVault::from_seed([7u8; 64]),
            |vault| vault.derive(0).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });

    let warm = KeyVault::from_seed([7u8; 64]);
    warm.derive(0).unwrap();
    group.bench_function("cached", |b| {
        b.iter(|| warm.derive(0).unwrap());
    });

    group.finish();
}

fn bench_sign_payload(c: &mut Criterion) {
    let keypair = KeyPair::from_seed(&[3u8; 32]);
    let data = payload();

    c.bench_function("ed25519/sign_input_data", |b| {
        b.iter(|| sign_input_data(&keypair, CHAIN_ID, &data));
    });
}

fn bench_signing_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("sha3/signing_digest");

    for size in [64usize, 512, 4096] {
        let data = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| signing_digest(CHAIN_ID, data));
        });
    }

    group.finish();
}

fn bench_verify_transaction(c: &mut Criterion) {
    let keypair = KeyPair::from_seed(&[3u8; 32]);
    let data = payload();
    let signature = sign_input_data(&keypair, CHAIN_ID, &data);
    let tx = Transaction {
        version: TxVersion::V3,
        signature: Signature::ed25519(hex::encode(signature.to_bytes())),
        pow: ProofOfWork {
            tid: "bench".into(),
            nonce: 0,
        },
        input_data: data,
        pub_key: keypair.public_key_hex(),
    };

    c.bench_function("ed25519/verify_transaction", |b| {
        b.iter(|| verify_transaction(&tx, CHAIN_ID).unwrap());
    });
}

criterion_group!(
    benches,
    bench_vault_derive,
    bench_sign_payload,
    bench_signing_digest,
    bench_verify_transaction,
);
criterion_main!(benches);
