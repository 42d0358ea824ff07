use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lilt_animation::{
    Color, EasingKind, SampledCurve, SchedulerConfig, TweenRequest, TweenScheduler, Vec2, Vec3,
};

/// Fill `scheduler` with `count` long-running tweens across value types
fn populate(scheduler: &TweenScheduler, count: usize) {
    let float_sink = Rc::new(Cell::new(0.0_f32));
    let vec_sink = Rc::new(Cell::new(Vec3::ZERO));
    let color_sink = Rc::new(Cell::new(Color::BLACK));

    for i in 0..count {
        match i % 4 {
            0 => {
                let sink = float_sink.clone();
                scheduler.create(
                    TweenRequest::<f32>::new(0.0, 1.0, 1e6)
                        .easing(EasingKind::QuinticInOut)
                        .apply(move |v| sink.set(v)),
                );
            }
            1 => {
                let sink = vec_sink.clone();
                scheduler.create(
                    TweenRequest::<Vec3>::new(Vec3::ZERO, Vec3::ONE, 1e6)
                        .easing(EasingKind::Bounce)
                        .apply(move |v| sink.set(v)),
                );
            }
            2 => {
                let sink = color_sink.clone();
                scheduler.create(
                    TweenRequest::<Color>::new(Color::BLACK, Color::WHITE, 1e6)
                        .custom_curve(SampledCurve::from_easing(EasingKind::Overshoot, 32))
                        .apply(move |v| sink.set(v)),
                );
            }
            _ => {
                scheduler.create(
                    TweenRequest::<Vec2>::new(Vec2::ZERO, Vec2::ONE, 1e6)
                        .apply(|v| {
                            black_box(v);
                        }),
                );
            }
        }
    }
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for count in [16_usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let scheduler = TweenScheduler::new();
            populate(&scheduler, count);
            b.iter(|| scheduler.tick(black_box(0.000_1), black_box(0.000_1)));
        });
    }
    group.finish();
}

fn bench_create_complete(c: &mut Criterion) {
    let config = SchedulerConfig::default().with_pool_capacity(256).with_prewarm(256);
    let scheduler = TweenScheduler::with_config(config);
    c.bench_function("create_complete_pooled", |b| {
        b.iter(|| {
            for _ in 0..64 {
                scheduler.create(TweenRequest::<f32>::new(0.0, 1.0, 0.0).apply(|v| {
                    black_box(v);
                }));
            }
            scheduler.tick(0.016, 0.016)
        });
    });
}

criterion_group!(benches, bench_tick, bench_create_complete);
criterion_main!(benches);
