//! Supervisor spawn and restart-cycle benchmarks.
//!
//! `BackoffKind::None` is used throughout so a restart is scheduled with a
//! zero-millisecond timer rather than a real delay, keeping the benchmark
//! honest about scheduler/supervisor overhead instead of timer-thread sleep
//! time.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::hint::black_box;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use corvid_rt::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};

struct Inert;

impl Actor for Inert {
    fn handle(&mut self, _msg: &Message, _ctx: &mut ActorContext<'_>) -> BehaviorResult {
        BehaviorResult::Ok
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn spawn_supervisor_with_ten_children(c: &mut Criterion) {
    c.bench_function("supervisor_spawn_10_children", |b| {
        b.iter_batched(
            || RtLoop::new(RuntimeConfig::default()).expect("valid config"),
            |mut rt| {
                let children = (0..10)
                    .map(|_| {
                        ChildSpec::new(RestartMode::Permanent, 16, || {
                            Box::new(Inert) as Box<dyn Actor>
                        })
                    })
                    .collect();
                let spec = SupervisorSpec {
                    children,
                    policy: SupervisorPolicy::default(),
                };
                black_box(rt.spawn_supervisor(spec).expect("table has room"));
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

/// A child that fails once per dispatch until `restarts_left` is exhausted,
/// then stops cleanly, letting `rt.run()` drive a fixed number of
/// restart cycles to completion without any external polling.
struct FlakyChild {
    restarts_left: Arc<AtomicU32>,
}

impl Actor for FlakyChild {
    fn handle(&mut self, _msg: &Message, ctx: &mut ActorContext<'_>) -> BehaviorResult {
        if self.restarts_left.fetch_sub(1, Ordering::SeqCst) == 0 {
            self.restarts_left.fetch_add(1, Ordering::SeqCst);
            // Transient mode leaves a clean stop un-restarted, but the
            // supervisor itself stays alive with no children afterward;
            // stop it too so `rt.run()` reaches quiescence.
            if let Some(sup) = ctx.parent() {
                let _ = ctx.stop(sup);
            }
            return BehaviorResult::Stop;
        }
        BehaviorResult::Fail
    }

    fn pre_start(&mut self, ctx: &mut ActorContext<'_>) {
        let _ = ctx.send(ctx.id(), Payload::EMPTY, 0);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn restart_cycle_one_for_one(c: &mut Criterion) {
    c.bench_function("supervisor_one_for_one_20_restarts", |b| {
        b.iter_batched(
            || {
                let rt = RtLoop::new(
                    RuntimeConfig::builder()
                        .max_actors(64)
                        .build()
                        .expect("valid config"),
                )
                .expect("valid config");
                let restarts_left = Arc::new(AtomicU32::new(20));
                (rt, restarts_left)
            },
            |(mut rt, restarts_left)| {
                let policy = SupervisorPolicy {
                    strategy: SupervisionStrategy::OneForOne,
                    intensity: 1_000,
                    period_ms: 60_000,
                    backoff: BackoffKind::None,
                    base_delay_ms: 0,
                };
                let factory_counter = Arc::clone(&restarts_left);
                let children = vec![ChildSpec::new(RestartMode::Transient, 8, move || {
                    Box::new(FlakyChild {
                        restarts_left: Arc::clone(&factory_counter),
                    }) as Box<dyn Actor>
                })];
                let spec = SupervisorSpec { children, policy };
                rt.spawn_supervisor(spec).expect("table has room");
                black_box(rt.run().expect("run completes"));
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    spawn_supervisor_with_ten_children,
    restart_cycle_one_for_one
);
criterion_main!(benches);
