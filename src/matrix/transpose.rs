/// Transpose a compressed-column pattern, optionally permuting rows.
///
/// Computes `R = (A(P, :))ᵀ` structurally: row k of `A(P, :)` becomes column
/// k of R.  `row_order`, when given, lists old row indices in their new
/// order (`row_order[k] = old`).  Because input columns are scanned in
/// ascending order, every output column comes out with sorted indices;
/// transposing is also the standard trick for sorting an unsorted pattern.
///
/// `rp` must have length at least `n_row + 1`, `ri` at least `ap[n_col]`,
/// and `w` is size-`n_row` scratch holding the old-to-new row map during the
/// placement pass.
pub(crate) fn transpose_pattern(
    n_row: usize,
    n_col: usize,
    ap: &[isize],
    ai: &[isize],
    row_order: Option<&[isize]>,
    rp: &mut [isize],
    ri: &mut [isize],
    w: &mut [isize],
) {
    debug_assert!(rp.len() >= n_row + 1);

    // w[old_row] = new row position
    match row_order {
        Some(p) => {
            debug_assert!(crate::utils::is_permutation(p, n_row));
            for (k, &old) in p[..n_row].iter().enumerate() {
                w[old as usize] = k as isize;
            }
        }
        None => {
            for (k, slot) in w[..n_row].iter_mut().enumerate() {
                *slot = k as isize;
            }
        }
    }

    // count entries per transposed column
    for slot in rp[..n_row + 1].iter_mut() {
        *slot = 0;
    }
    let nz = ap[n_col] as usize;
    for &row in &ai[..nz] {
        debug_assert!(row >= 0 && (row as usize) < n_row);
        rp[w[row as usize] as usize + 1] += 1;
    }
    for k in 0..n_row {
        rp[k + 1] += rp[k];
    }

    // placement, using rp[k] itself as the write cursor of column k; the
    // pointers are shifted back by one afterwards
    for j in 0..n_col {
        for p in ap[j] as usize..ap[j + 1] as usize {
            let new_row = w[ai[p] as usize] as usize;
            ri[rp[new_row] as usize] = j as isize;
            rp[new_row] += 1;
        }
    }
    for k in (1..=n_row).rev() {
        rp[k] = rp[k - 1];
    }
    rp[0] = 0;

    debug_assert_eq!(rp[n_row] as usize, nz);
}
