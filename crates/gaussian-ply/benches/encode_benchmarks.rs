//! Benchmarks for splat PLY encoding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gaussian_ply::encode_to_vec;
use recon_common::{ColorCoeffs, GaussianSet};

fn make_set(n: usize, color_width: usize) -> GaussianSet {
    let positions = (0..n)
        .map(|i| {
            let t = i as f32 * 0.001;
            [t.sin(), t.cos(), t]
        })
        .collect();
    GaussianSet {
        colors: ColorCoeffs {
            width: color_width,
            values: (0..n * color_width).map(|v| (v % 13) as f32 * 0.1).collect(),
        },
        ..GaussianSet::with_defaults(positions)
    }
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_ply");
    for &n in &[10_000usize, 100_000, 500_000] {
        for &width in &[3usize, 48] {
            let set = make_set(n, width);
            group.bench_with_input(
                BenchmarkId::new(format!("sh{}", width), n),
                &set,
                |b, set| b.iter(|| encode_to_vec(black_box(set)).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
