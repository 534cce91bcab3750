//! Benchmarks for report framing and decoding
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use razer_battery::codec::{decode_keyboard, decode_mouse_level, fallback_level, scale_level};
use razer_battery::crc::report_crc;
use razer_battery::hid::{encode_request, Command, Response, REPORT_SIZE};

/// Benchmark the checksum against a naive fold.
fn bench_crc(c: &mut Criterion) {
    let report: Vec<u8> = (0..REPORT_SIZE).map(|i| (i * 7 + 13) as u8).collect();

    let mut group = c.benchmark_group("crc");
    group.throughput(Throughput::Bytes(86)); // We XOR 86 bytes

    group.bench_function("report_crc", |b| b.iter(|| report_crc(black_box(&report))));

    group.bench_function("naive_loop", |b| {
        b.iter(|| {
            let buf = black_box(&report);
            buf[2..88].iter().fold(0u8, |crc, &byte| crc ^ byte)
        })
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("battery_level", |b| {
        b.iter(|| encode_request(black_box(0x1F), black_box(Command::BatteryLevel)))
    });
    group.bench_function("charging_status", |b| {
        b.iter(|| encode_request(black_box(0x3F), black_box(Command::ChargingStatus)))
    });

    group.finish();
}

fn response(status: u8, value: u8) -> Response {
    let mut raw = vec![0u8; REPORT_SIZE];
    raw[0] = status;
    raw[9] = value;
    raw[13] = 0xC8;
    match Response::parse(raw) {
        Ok(resp) => resp,
        Err(e) => panic!("bench response rejected: {e}"),
    }
}

fn bench_decode(c: &mut Criterion) {
    let ok = response(0x02, 0x80);
    let charging = response(0x04, 0x80);
    let failed = response(0x03, 0x00);

    let mut group = c.benchmark_group("decode");

    group.bench_function("scale_level", |b| b.iter(|| scale_level(black_box(0x80))));
    group.bench_function("mouse_level", |b| {
        b.iter(|| decode_mouse_level(black_box(&ok)))
    });
    group.bench_function("keyboard", |b| b.iter(|| decode_keyboard(black_box(&charging))));
    group.bench_function("fallback_scan", |b| {
        b.iter(|| fallback_level(black_box(&failed)))
    });

    group.finish();
}

criterion_group!(benches, bench_crc, bench_encode, bench_decode);
criterion_main!(benches);
