//! Benchmarks du pipeline validation → EWKB → mesure → GeoJSON

use burn_severity::{codec, measure, validate, MeasureMode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

/// Cercle approximé par `vertices` sommets autour de Kamloops
fn ring(vertices: usize) -> Vec<[f64; 2]> {
    let mut coords: Vec<[f64; 2]> = (0..vertices)
        .map(|i| {
            let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
            [-120.33 + 0.05 * angle.cos(), 50.67 + 0.03 * angle.sin()]
        })
        .collect();
    coords.push(coords[0]);
    coords
}

fn body(features: usize, vertices: usize) -> Value {
    let feature = json!({
        "type": "Feature",
        "geometry": {"type": "Polygon", "coordinates": [ring(vertices)]},
        "properties": {
            "FIRE_NUMBER": "K20637",
            "FIRE_YEAR": 2023,
            "PRE_FIRE_IMAGE": "S2A_20230601",
            "PRE_FIRE_IMAGE_DATE": "2023-06-01",
            "POST_FIRE_IMAGE": "S2B_20230915",
            "POST_FIRE_IMAGE_DATE": "2023-09-15",
            "FIRE_STATUS": "Out",
            "BURN_SEVERITY_RATING": "Medium",
            "AREA_HA": 1250.0
        }
    });
    json!({
        "type": "FeatureCollection",
        "features": vec![feature; features]
    })
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for vertices in [64, 1024, 16384] {
        let inbound: validate::InboundCollection =
            serde_json::from_value(body(1, vertices)).unwrap();
        group.throughput(Throughput::Elements(vertices as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(vertices),
            &inbound,
            |b, inbound| b.iter(|| black_box(validate::validate(black_box(inbound)).unwrap())),
        );
    }

    group.finish();
}

fn bench_native_round_trip(c: &mut Criterion) {
    let inbound: validate::InboundCollection = serde_json::from_value(body(1, 4096)).unwrap();
    let validated = validate::validate(&inbound).unwrap();
    let geometry = &validated.features[0].geometry;

    c.bench_function("ewkb_round_trip", |b| {
        b.iter(|| {
            let native = codec::encode_native(black_box(geometry)).unwrap();
            black_box(codec::decode_native(&native).unwrap())
        })
    });
}

fn bench_measure(c: &mut Criterion) {
    let inbound: validate::InboundCollection = serde_json::from_value(body(1, 4096)).unwrap();
    let validated = validate::validate(&inbound).unwrap();
    let geometry = &validated.features[0].geometry;

    let mut group = c.benchmark_group("measure");
    for mode in [MeasureMode::Native, MeasureMode::Geodesic, MeasureMode::BcAlbers] {
        group.bench_with_input(BenchmarkId::from_parameter(mode), &mode, |b, mode| {
            b.iter(|| black_box(measure::measure(black_box(geometry), *mode).unwrap()))
        });
    }
    group.finish();
}

fn bench_present(c: &mut Criterion) {
    let inbound: validate::InboundCollection = serde_json::from_value(body(100, 256)).unwrap();
    let records: Vec<_> = validate::validate(&inbound)
        .unwrap()
        .features
        .into_iter()
        .enumerate()
        .map(|(i, f)| burn_severity::BurnSeverityRecord {
            id: i as i64 + 1,
            attributes: f.attributes,
            geometry: f.geometry,
        })
        .collect();

    let mut group = c.benchmark_group("present");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.sample_size(20);
    group.bench_function("100_features", |b| {
        b.iter(|| {
            let fc = burn_severity::present(black_box(&records), MeasureMode::Native).unwrap();
            black_box(serde_json::to_vec(&fc).unwrap())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_validate,
    bench_native_round_trip,
    bench_measure,
    bench_present
);
criterion_main!(benches);
