//! Canonicalization and signature benchmarks
//!
//! Run with: `cargo bench --bench signing_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use omnikassa_lib::{OrderResultSet, SignatureService};
use serde_json::json;

fn signer() -> SignatureService {
    SignatureService::from_base64("bXlTMWduaW5nSzN5").unwrap()
}

fn page(results: usize) -> OrderResultSet {
    let results: Vec<_> = (0..results)
        .map(|i| {
            json!({
                "merchantOrderId": format!("order{}", i),
                "omnikassaOrderId": "1d0a95f4-2589-439b-9562-c50aa19f9caf",
                "poiId": "2004",
                "orderStatus": "COMPLETED",
                "orderStatusDateTime": "2016-11-25T13:20:03.157+01:00",
                "errorCode": "",
                "paidAmount": { "currency": "EUR", "amount": "4999" },
                "totalAmount": { "currency": "EUR", "amount": "4999" },
            })
        })
        .collect();
    let unsigned = json!({
        "moreOrderResultsAvailable": false,
        "orderResults": results,
        "signature": "",
    });
    let set: OrderResultSet = serde_json::from_value(unsigned.clone()).unwrap();
    let mut signed = unsigned;
    signed["signature"] = signer().sign(&set.canonical_string()).into();
    serde_json::from_value(signed).unwrap()
}

/// Benchmark canonical string construction for a result page
fn bench_canonicalize(c: &mut Criterion) {
    let set = page(100);
    c.bench_function("canonicalize_100_results", |b| {
        b.iter(|| black_box(set.canonical_string()))
    });
}

/// Benchmark HMAC-SHA512 signing at several payload sizes
fn bench_sign(c: &mut Criterion) {
    let svc = signer();
    let mut group = c.benchmark_group("hmac_sha512_sign");

    for size in [64usize, 1024, 16 * 1024] {
        let payload = "x".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{}_bytes", size), |b| {
            b.iter(|| black_box(svc.sign(black_box(&payload))))
        });
    }

    group.finish();
}

/// Benchmark full page verification
fn bench_verify_page(c: &mut Criterion) {
    let svc = signer();
    let set = page(100);
    c.bench_function("verify_page_100_results", |b| {
        b.iter(|| black_box(set.valid_signature(&svc)))
    });
}

criterion_group!(benches, bench_canonicalize, bench_sign, bench_verify_page);
criterion_main!(benches);
