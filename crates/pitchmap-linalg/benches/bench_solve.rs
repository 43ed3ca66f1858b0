use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use std::hint::black_box;

use pitchmap_linalg::{mat33, solve, Matrix};

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");

    for n in [3, 8, 16].iter() {
        let a = Matrix::from_fn(*n, *n, |i, j| {
            if i == j {
                4.0 + i as f64
            } else {
                1.0 / (1.0 + i as f64 + j as f64)
            }
        });
        let b = (0..*n).map(|i| i as f64).collect::<Vec<_>>();

        group.bench_with_input(BenchmarkId::new("gauss_partial_pivot", n), n, |bencher, _| {
            bencher.iter(|| black_box(solve(&a, &b)))
        });
    }

    group.finish();
}

fn bench_invert_mat33(c: &mut Criterion) {
    let m = [[2.0, -1.0, 0.5], [0.3, 1.5, -2.0], [0.01, 0.002, 1.0]];
    c.bench_function("invert_mat33", |b| {
        b.iter(|| black_box(mat33::invert_mat33(black_box(&m))))
    });
}

criterion_group!(benches, bench_solve, bench_invert_mat33);
criterion_main!(benches);
