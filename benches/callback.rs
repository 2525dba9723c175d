//! Benchmarks for the real-time loopback callback
//!
//! Run with: cargo bench --bench callback

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use duplexloop::audio::duplex;
use duplexloop::{DuplexFormat, FullDuplexLoopback, LoopbackConfig, StreamFormat};

fn session(output_channels: u16) -> (FullDuplexLoopback, duplexloop::LoopbackProcessor) {
    let mut engine = FullDuplexLoopback::new(LoopbackConfig {
        max_record_seconds: 10,
        ..LoopbackConfig::default()
    });
    let processor = engine
        .start(DuplexFormat {
            output: StreamFormat::new(48000, output_channels),
            input: StreamFormat::new(48000, 2),
        })
        .unwrap();
    let clip: Vec<f32> = (0..48000).map(|i| (i as f32 * 0.01).sin()).collect();
    engine.load_audio_data(&clip, 48000, 1, 48000).unwrap();
    (engine, processor)
}

/// Benchmark one callback at typical period sizes
fn bench_callback(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_both_streams_ready");

    for period in [64usize, 256, 1024] {
        let (_engine, mut processor) = session(2);
        let input = vec![0.1f32; period * 2];
        let mut output = vec![0.0f32; period * 2];

        group.bench_with_input(BenchmarkId::new("stereo", period), &period, |b, _| {
            b.iter(|| processor.on_both_streams_ready(black_box(&input), black_box(&mut output)))
        });
    }

    group.finish();
}

/// Benchmark the bridge path: push input, then drive output
fn bench_bridge(c: &mut Criterion) {
    let (_engine, processor) = session(2);
    let (mut feeder, mut driver, _stats) = duplex::bridge(processor, 8192);
    let input = vec![0.1f32; 256 * 2];
    let mut output = vec![0.0f32; 256 * 2];

    c.bench_function("bridge_256", |b| {
        b.iter(|| {
            feeder.push(black_box(&input));
            driver.process(black_box(&mut output))
        })
    });
}

criterion_group!(benches, bench_callback, bench_bridge);
criterion_main!(benches);
