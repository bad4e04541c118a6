// Producer-side latency benchmarks against a /dev/null file engine.
//
// The timed region is the hot path only: level check, message rendering,
// ring enqueue, condvar notify. The ring is drained with a periodic sync
// so the queue never fills and the numbers stay drop-free.
//
// Pin the producer with PRODUCER_CPU=<n> to keep runs comparable.

use criterion::{criterion_group, criterion_main, Criterion};
use nix::sched::{sched_setaffinity, CpuSet};
use nix::unistd::Pid;
use ringlog::{log_info, Logger, Severity};

const SYNC_EVERY: usize = 32 * 1024;

fn pin_thread_from_env(var: &str) {
    let Ok(value) = std::env::var(var) else {
        return;
    };
    let cpu: usize = value
        .parse()
        .unwrap_or_else(|_| panic!("{var}={value} is not a CPU index"));
    let mut cpuset = CpuSet::new();
    cpuset.set(cpu).expect("CPU index out of range");
    sched_setaffinity(Pid::from_raw(0), &cpuset).expect("failed to set CPU affinity");
}

fn bench_shape(c: &mut Criterion, name: &str, logger: &Logger, emit: impl Fn(&Logger)) {
    let mut n = 0usize;
    c.bench_function(name, |b| {
        b.iter(|| {
            emit(logger);
            n += 1;
            if n % SYNC_EVERY == 0 {
                logger.sync();
            }
        })
    });
    logger.sync();
}

fn producer_latency(c: &mut Criterion) {
    pin_thread_from_env("PRODUCER_CPU");

    let logger = Logger::with_capacity("/dev/null", Severity::Debug, 64 * 1024, usize::MAX)
        .expect("failed to open /dev/null");

    bench_shape(c, "log_static", &logger, |logger| {
        log_info!(logger, "Test");
    });
    bench_shape(c, "log_int", &logger, |logger| {
        log_info!(logger, "Test {}", 42);
    });
    bench_shape(c, "log_double", &logger, |logger| {
        log_info!(logger, "Test {}", 42.0);
    });
    bench_shape(c, "log_str", &logger, |logger| {
        log_info!(logger, "Test {}", "Hello");
    });
    // Below threshold: measures the early-exit path alone.
    logger.set_level(Severity::Error);
    bench_shape(c, "log_filtered", &logger, |logger| {
        ringlog::log_debug!(logger, "Test {}", 42);
    });
}

criterion_group!(benches, producer_latency);
criterion_main!(benches);
