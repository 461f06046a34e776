use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use frontal::{Control, Info, MatrixBuilder, qsymbolic};

fn grid_laplacian(n: usize) -> frontal::CscMatrix {
    let dim = n * n;
    let mut b = MatrixBuilder::new(dim, dim);
    b.reserve(5 * dim);
    for y in 0..n {
        for x in 0..n {
            let j = y * n + x;
            b.push(j, j, 4.0).unwrap();
            if x > 0 {
                b.push(j, j - 1, -1.0).unwrap();
            }
            if x + 1 < n {
                b.push(j, j + 1, -1.0).unwrap();
            }
            if y > 0 {
                b.push(j, j - n, -1.0).unwrap();
            }
            if y + 1 < n {
                b.push(j, j + n, -1.0).unwrap();
            }
        }
    }
    b.build().unwrap()
}

/// An unsymmetric banded pattern, to push the COLAMD path.
fn banded_unsymmetric(dim: usize) -> frontal::CscMatrix {
    let mut b = MatrixBuilder::new(dim, dim);
    for j in 0..dim {
        b.push(j, j, 2.0).unwrap();
        for off in [1usize, 3, 7] {
            if j + off < dim {
                b.push(j, j + off, -1.0).unwrap();
            }
        }
    }
    b.build().unwrap()
}

fn bench_symbolic(c: &mut Criterion) {
    let mut group = c.benchmark_group("qsymbolic");

    for n in [8usize, 16, 32] {
        let a = grid_laplacian(n);
        group.throughput(Throughput::Elements(a.nnz() as u64));
        group.bench_with_input(BenchmarkId::new("grid", n * n), &a, |bench, a| {
            bench.iter(|| {
                let mut info = Info::new();
                let s = qsymbolic::<f64>(
                    a.dim.nrows,
                    a.dim.ncols,
                    &a.column_pointers,
                    &a.row_indices,
                    Some(&a.values),
                    None,
                    &Control::default(),
                    &mut info,
                )
                .unwrap();
                black_box(s.lunz_bound)
            });
        });
    }

    for dim in [256usize, 1024] {
        let a = banded_unsymmetric(dim);
        group.throughput(Throughput::Elements(a.nnz() as u64));
        group.bench_with_input(BenchmarkId::new("banded", dim), &a, |bench, a| {
            bench.iter(|| {
                let mut info = Info::new();
                let s = qsymbolic::<f64>(
                    a.dim.nrows,
                    a.dim.ncols,
                    &a.column_pointers,
                    &a.row_indices,
                    Some(&a.values),
                    None,
                    &Control::default(),
                    &mut info,
                )
                .unwrap();
                black_box(s.num_mem_usage_est)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_symbolic);
criterion_main!(benches);
