use std::time::Instant;

use frontal::{Control, Info, MatrixBuilder, qsymbolic};

/// Build the 5-point Laplacian of an n-by-n grid.
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

fn main() {
    let n = std::env::args()
        .nth(1)
        .and_then(|a| a.parse::<usize>().ok())
        .unwrap_or(32);

    let a = grid_laplacian(n);
    println!("matrix: {0}x{0} grid laplacian", n);
    println!("dim: {} x {}", a.dim.nrows, a.dim.ncols);
    println!("nnz: {}", a.nnz());

    let mut info = Info::new();
    let start = Instant::now();
    let symbolic = match qsymbolic::<f64>(
        a.dim.nrows,
        a.dim.ncols,
        &a.column_pointers,
        &a.row_indices,
        Some(&a.values),
        None,
        &Control::default(),
        &mut info,
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("symbolic analysis failed: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    println!();
    println!("symbolic analysis: {:.3}ms", elapsed.as_secs_f64() * 1e3);
    println!("strategy: {:?}", symbolic.strategy);
    println!("ordering: {:?}", symbolic.ordering);
    println!(
        "singletons: {} ({} col, {} row), empty: {} col, {} row",
        symbolic.n1, symbolic.n1c, symbolic.n1r, symbolic.nempty_col, symbolic.nempty_row
    );
    println!("fronts: {}  chains: {}", symbolic.nfr, symbolic.nchains);
    println!(
        "largest front: {} x {}",
        symbolic.maxnrows, symbolic.maxncols
    );
    println!(
        "nz bounds: L {} + U {} (off-diagonal)",
        symbolic.lnz_bound, symbolic.unz_bound
    );
    println!("flop estimate: {:.3e}", info.flops_estimate);
    println!(
        "numeric memory: {:.0} units initial, {:.0} final, {:.0} peak",
        symbolic.dnum_mem_init_usage, symbolic.num_mem_size_est, symbolic.num_mem_usage_est
    );
    println!(
        "peak memory estimate: {:.1} MB",
        info.peak_memory_estimate / (1024.0 * 1024.0)
    );
}
