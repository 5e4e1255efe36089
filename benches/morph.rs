//! Shape generation and per-frame animation throughput.
//!
//! Run with: `cargo bench --bench morph`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use zenparticles::geometry;
use zenparticles::sampling::Sampler;
use zenparticles::{AnimationConfig, FrameTime, InteractionSignal, ParticleField, ShapeArchetype, ShapeCache, TargetResolver};

const COUNTS: [usize; 3] = [1_000, 3_000, 20_000];

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for shape in ShapeArchetype::PROCEDURAL {
        group.bench_with_input(BenchmarkId::new(shape.label(), 3_000), &shape, |b, &shape| {
            let mut sampler = Sampler::seeded(7);
            b.iter(|| geometry::generate_with(black_box(shape), 3_000, &mut sampler));
        });
    }
    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    for count in COUNTS {
        let cache = ShapeCache::new(count);
        let target = TargetResolver::for_cache(&cache).resolve(ShapeArchetype::Saturn, None, &cache);
        let mut field = ParticleField::new(&cache.get(ShapeArchetype::Fireworks), AnimationConfig::default());
        let signal = InteractionSignal::new(0.7, 1.5, true);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            let mut index = 0u64;
            b.iter(|| {
                field.step(FrameTime::fixed(index, 60.0), black_box(&signal), &target);
                index += 1;
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generators, bench_step);
criterion_main!(benches);
