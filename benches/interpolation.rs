use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use hepsi::math::{vanishing_poly, vanishing_poly_naive, NttContext};
use hepsi::DEFAULT_PLAIN_MODULUS;

fn random_roots(n: usize) -> Vec<u64> {
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    (0..n)
        .map(|_| rng.gen_range(1..DEFAULT_PLAIN_MODULUS))
        .collect()
}

fn interpolation_benchmark(c: &mut Criterion) {
    let ctx = NttContext::new(1 << 14, DEFAULT_PLAIN_MODULUS).unwrap();

    let mut group = c.benchmark_group("vanishing_poly");
    for n in [16usize, 64, 256, 1024] {
        let roots = random_roots(n);
        group.bench_with_input(BenchmarkId::new("divide_conquer", n), &roots, |b, roots| {
            b.iter(|| vanishing_poly(&ctx, roots).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("naive", n), &roots, |b, roots| {
            b.iter(|| vanishing_poly_naive(roots, DEFAULT_PLAIN_MODULUS));
        });
    }
    group.finish();
}

criterion_group!(benches, interpolation_benchmark);
criterion_main!(benches);
