use criterion::{criterion_group, criterion_main, Criterion};
use rover_telemetry::models::RoverUpdate;
use serde_json::json;
use std::hint::black_box;

fn benchmark_parse_update(c: &mut Criterion) {
    let now = chrono::Utc::now();

    let small = serde_json::to_vec(&json!({"id": "  rover1  ", "battery": 42})).unwrap();

    // A full telemetry frame with nested position and a sensor array
    let frame = serde_json::to_vec(&json!({
        "id": "rover-7",
        "battery": 87.5,
        "status": "driving",
        "position": {"lat": 37.4219, "lon": -122.0841, "alt": 12.3, "hdop": 0.8},
        "imu": {"roll": 0.01, "pitch": -0.02, "yaw": 1.57},
        "wheels": [1200, 1198, 1203, 1201],
        "samples": (0..256).collect::<Vec<u32>>(),
        "timestamp": "ignored"
    }))
    .unwrap();

    let mut group = c.benchmark_group("rover_update");

    group.bench_function("parse_small", |b| {
        b.iter(|| RoverUpdate::from_slice(black_box(&small), now))
    });

    group.bench_function("parse_frame", |b| {
        b.iter(|| RoverUpdate::from_slice(black_box(&frame), now))
    });

    let update = RoverUpdate::from_slice(&frame, now).unwrap();
    group.bench_function("to_document_frame", |b| {
        b.iter(|| black_box(&update).to_document())
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse_update);
criterion_main!(benches);
