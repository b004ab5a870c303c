//! Control channel hot-path benchmarks.
//!
//! Measures the per-message work done on the link's event loop and by
//! publishers:
//! - Inbound parsing (JSON envelope and `topic:payload`)
//! - Correlation and observer fan-out
//! - Control payload encoding
//! - Publishing into the pending queue
//!
//! Run with: cargo bench --bench inbound_dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use rig_link::{
    Action, CameraId, ConnectionManager, ControlCommand, Correlator, InboundMessage,
    LinkObserver, ObserverRegistry,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const OBSERVER_COUNTS: &[usize] = &[1, 4, 16];
const PENDING_CAPS: &[usize] = &[64, 1024];

const JSON_ACK: &str =
    r#"{"topic":"forklift/control/local_camera_right/ack","payload":{"action":"tilt_up","ok":true}}"#;
const COLON_STATUS: &str = "forklift/control/status/local_camera_right:{\"zoom\":3}";

// ============================================================================
// Observers
// ============================================================================

#[derive(Default)]
struct Counting {
    messages: AtomicUsize,
}

impl LinkObserver for Counting {
    fn on_message(&self, _message: &InboundMessage) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// Benchmark: Inbound Parsing
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound_parse");

    group.bench_function("json_envelope", |b| {
        b.iter(|| InboundMessage::parse(black_box(JSON_ACK)));
    });
    group.bench_function("topic_colon_payload", |b| {
        b.iter(|| InboundMessage::parse(black_box(COLON_STATUS)));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Correlation
// ============================================================================

fn bench_correlate(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlate");

    for &count in OBSERVER_COUNTS {
        let registry = Arc::new(ObserverRegistry::new());
        for _ in 0..count {
            registry.add(Arc::new(Counting::default()));
        }
        let correlator = Correlator::new(registry);

        group.bench_with_input(BenchmarkId::new("observers", count), &count, |b, _| {
            b.iter(|| correlator.handle_text(black_box(JSON_ACK)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Command Encoding
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let camera = CameraId::default();
    let held = ControlCommand::new(Action::TiltUp, camera.clone());
    let slider = ControlCommand::with_value(Action::ZoomIn, camera, 75);

    let mut group = c.benchmark_group("command_encode");
    group.bench_function("held", |b| b.iter(|| black_box(&held).to_payload()));
    group.bench_function("slider", |b| b.iter(|| black_box(&slider).to_payload()));
    group.finish();
}

// ============================================================================
// Benchmark: Publish While Disconnected
// ============================================================================

fn bench_publish_queued(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let _guard = rt.enter();

    let mut group = c.benchmark_group("publish_queued");

    for &cap in PENDING_CAPS {
        let link = ConnectionManager::builder()
            .url("ws://127.0.0.1:9")
            .max_pending(cap)
            .build()
            .expect("build link");

        group.bench_with_input(BenchmarkId::new("cap", cap), &cap, |b, _| {
            b.iter(|| link.publish("forklift/control", black_box(r#"{"action":"stop"}"#)));
        });

        link.shutdown();
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(
    benches,
    bench_parse,
    bench_correlate,
    bench_encode,
    bench_publish_queued
);
criterion_main!(benches);
