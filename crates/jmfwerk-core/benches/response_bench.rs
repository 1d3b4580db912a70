// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for envelope stamping/serialization and response
// parsing in the jmfwerk-core crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use jmfwerk_core::types::SUBMIT_QUEUE_ENTRY;
use jmfwerk_core::{Envelope, Response, ResponseValidator};

/// Benchmark stamping and serializing a SubmitQueueEntry envelope.
fn bench_envelope_serialize(c: &mut Criterion) {
    let mut envelope = Envelope::command(SUBMIT_QUEUE_ENTRY);
    envelope.set_device("PRESS1");
    envelope.set_submission_url("cid://job.jdf");

    c.bench_function("envelope stamp + serialize", |b| {
        b.iter(|| {
            envelope.stamp();
            black_box(envelope.serialize());
        });
    });
}

/// Benchmark parsing a failure response with a notification comment.
fn bench_parse_response(c: &mut Criterion) {
    let body = Response::new(5)
        .with_type(SUBMIT_QUEUE_ENTRY)
        .with_ref_id("M0123456789")
        .with_comment("Queue full")
        .serialize();

    c.bench_function("parse_response (failure + comment)", |b| {
        b.iter(|| {
            let result = ResponseValidator::parse(black_box(&body));
            assert!(result.is_ok());
        });
    });
}

criterion_group!(benches, bench_envelope_serialize, bench_parse_response);
criterion_main!(benches);
