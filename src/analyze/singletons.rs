use std::collections::VecDeque;

use log::debug;

use crate::utils::EMPTY;

/// Result of the singleton peel.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SingletonInfo {
    /// Total singleton pivots found (column plus row kind).
    pub n1: usize,
    pub n1c: usize,
    pub n1r: usize,
    pub nempty_col: usize,
    pub nempty_row: usize,
    /// The peeled interior is square and Rperm1/Cperm1 agree on it.
    pub is_sym: bool,
    /// Largest row degree of the pruned matrix.
    pub max_rdeg: usize,
}

/// Peel degree-1 rows and columns off the matrix until none remain.
///
/// A row singleton (r with a single live column c) eliminates the pair
/// (c, r): the pivot column c disappears, so every other row with an entry
/// in c loses one degree.  A column singleton (c with a single live row r)
/// eliminates (c, r) the transposed way.  The peel alternates phases: the
/// current batch of row singletons, then the current batch of column
/// singletons; singletons created mid-phase wait for the next round.
///
/// Outputs:
/// - `cperm1[k]`/`rperm1[k]` for k < n1: the k-th eliminated pivot pair, in
///   elimination order; then the surviving columns/rows in caller order
///   (`quser` or natural); empty columns/rows last, in natural order.  A
///   column or row whose entries are consumed by the peel joins the empty
///   tail.
/// - `inv_rperm1` = inverse of `rperm1`.
/// - `cdeg[j]`/`rdeg[i]`, indexed by *original* ids: degree at elimination
///   time for singleton pivots, pruned-matrix degree for survivors.
///
/// Workspace `ci` needs `nz + n_row + 1` entries for the row-form pattern.
/// The matrix must already have passed structural validation.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_singletons(
    n_row: usize,
    n_col: usize,
    ap: &[usize],
    ai: &[usize],
    quser: Option<&[isize]>,
    do_singletons: bool,
    cdeg: &mut [isize],
    cperm1: &mut [isize],
    rdeg: &mut [isize],
    rperm1: &mut [isize],
    inv_rperm1: &mut [isize],
    ci: &mut [isize],
) -> SingletonInfo {
    let nz = ap[n_col];
    debug_assert!(ci.len() >= nz.max(1) + n_row + 1);

    // row-form copy of the pattern (column ids per row, built sorted)
    let (ri, rest) = ci.split_at_mut(nz.max(1));
    let (rp, _) = rest.split_at_mut(n_row + 1);

    for slot in rp.iter_mut() {
        *slot = 0;
    }
    for &row in &ai[..nz] {
        rp[row + 1] += 1;
    }
    for i in 0..n_row {
        rp[i + 1] += rp[i];
    }
    {
        let mut next: Vec<isize> = rp[..n_row].to_vec();
        for col in 0..n_col {
            for p in ap[col]..ap[col + 1] {
                let row = ai[p];
                ri[next[row] as usize] = col as isize;
                next[row] += 1;
            }
        }
    }

    // live degrees, decremented as pivot rows and columns disappear
    let mut wc: Vec<isize> = (0..n_col)
        .map(|j| (ap[j + 1] - ap[j]) as isize)
        .collect();
    let mut wr: Vec<isize> = (0..n_row)
        .map(|i| (rp[i + 1] - rp[i]) as isize)
        .collect();
    let mut col_alive = vec![true; n_col];
    let mut row_alive = vec![true; n_row];

    // candidate order for columns follows the caller's ordering when given
    let col_scan: Vec<usize> = match quser {
        Some(q) => q[..n_col].iter().map(|&j| j as usize).collect(),
        None => (0..n_col).collect(),
    };

    let mut col_queue: VecDeque<usize> = VecDeque::new();
    let mut row_queue: VecDeque<usize> = VecDeque::new();
    if do_singletons {
        for &j in &col_scan {
            if wc[j] == 1 {
                col_queue.push_back(j);
            }
        }
        for i in 0..n_row {
            if wr[i] == 1 {
                row_queue.push_back(i);
            }
        }
    }

    let mut n1 = 0usize;
    let mut n1c = 0usize;
    let mut n1r = 0usize;

    // an eliminated pivot writes the pair (column, row) at position n1
    loop {
        let mut progress = false;

        // row-singleton phase
        let batch: Vec<usize> = row_queue.drain(..).collect();
        for r in batch {
            // a batch member can die, or lose its last entry, to an earlier
            // pivot of the same round; the empty tail picks it up below
            if !row_alive[r] || wr[r] == 0 {
                continue;
            }
            debug_assert_eq!(wr[r], 1);
            let mut pivot_col = EMPTY;
            for p in rp[r] as usize..rp[r + 1] as usize {
                if col_alive[ri[p] as usize] {
                    pivot_col = ri[p];
                    break;
                }
            }
            debug_assert!(pivot_col != EMPTY);
            let c = pivot_col as usize;

            cdeg[c] = wc[c];
            rdeg[r] = 1;
            cperm1[n1] = c as isize;
            rperm1[n1] = r as isize;
            n1 += 1;
            n1r += 1;
            progress = true;

            col_alive[c] = false;
            row_alive[r] = false;
            // the pivot column disappears; its other rows lose one degree
            for p in ap[c]..ap[c + 1] {
                let i = ai[p];
                if !row_alive[i] {
                    continue;
                }
                wr[i] -= 1;
                if wr[i] == 1 {
                    row_queue.push_back(i);
                }
            }
        }

        // column-singleton phase
        let batch: Vec<usize> = col_queue.drain(..).collect();
        for c in batch {
            if !col_alive[c] || wc[c] == 0 {
                continue;
            }
            debug_assert_eq!(wc[c], 1);
            let mut pivot_row = EMPTY;
            for p in ap[c]..ap[c + 1] {
                if row_alive[ai[p]] {
                    pivot_row = ai[p] as isize;
                    break;
                }
            }
            debug_assert!(pivot_row != EMPTY);
            let r = pivot_row as usize;

            cdeg[c] = 1;
            rdeg[r] = wr[r];
            cperm1[n1] = c as isize;
            rperm1[n1] = r as isize;
            n1 += 1;
            n1c += 1;
            progress = true;

            col_alive[c] = false;
            row_alive[r] = false;
            // the pivot row disappears; its other columns lose one degree
            for p in rp[r] as usize..rp[r + 1] as usize {
                let j = ri[p] as usize;
                if !col_alive[j] {
                    continue;
                }
                wc[j] -= 1;
                if wc[j] == 1 {
                    col_queue.push_back(j);
                }
            }
        }

        if !progress && row_queue.is_empty() && col_queue.is_empty() {
            break;
        }
    }

    // surviving interior in caller order, empty columns and rows at the tail
    let mut k = n1;
    let mut nempty_col = 0usize;
    for &j in &col_scan {
        if col_alive[j] && wc[j] > 0 {
            cperm1[k] = j as isize;
            cdeg[j] = wc[j];
            k += 1;
        }
    }
    let interior_col_end = k;
    for j in 0..n_col {
        if col_alive[j] && wc[j] == 0 {
            cperm1[k] = j as isize;
            cdeg[j] = 0;
            k += 1;
            nempty_col += 1;
        }
    }
    debug_assert_eq!(k, n_col);

    let mut k = n1;
    let mut nempty_row = 0usize;
    let mut max_rdeg = 0usize;
    for i in 0..n_row {
        if row_alive[i] && wr[i] > 0 {
            rperm1[k] = i as isize;
            rdeg[i] = wr[i];
            max_rdeg = max_rdeg.max(wr[i] as usize);
            k += 1;
        }
    }
    let interior_row_end = k;
    for i in 0..n_row {
        if row_alive[i] && wr[i] == 0 {
            rperm1[k] = i as isize;
            rdeg[i] = 0;
            k += 1;
            nempty_row += 1;
        }
    }
    debug_assert_eq!(k, n_row);

    let ok = crate::utils::invert_permutation(n_row, rperm1, inv_rperm1);
    debug_assert!(ok);

    // pattern symmetry of the peeled interior: the same original index must
    // sit at every interior position of both permutations
    let is_sym = n_row == n_col
        && nempty_row == nempty_col
        && interior_row_end == interior_col_end
        && (n1..interior_row_end).all(|k| rperm1[k] == cperm1[k]);

    debug!(
        "singletons: n1={n1} (col {n1c}, row {n1r}), empty col {nempty_col} row {nempty_row}, \
         interior symmetric: {is_sym}"
    );

    SingletonInfo {
        n1,
        n1c,
        n1r,
        nempty_col,
        nempty_row,
        is_sym,
        max_rdeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        n_row: usize,
        n_col: usize,
        ap: &[usize],
        ai: &[usize],
        quser: Option<&[isize]>,
        do_singletons: bool,
    ) -> (SingletonInfo, Vec<isize>, Vec<isize>, Vec<isize>, Vec<isize>) {
        let nz = ap[n_col];
        let mut cdeg = vec![EMPTY; n_col + 1];
        let mut rdeg = vec![EMPTY; n_row + 1];
        let mut cperm1 = vec![EMPTY; n_col];
        let mut rperm1 = vec![EMPTY; n_row];
        let mut inv = vec![EMPTY; n_row];
        let mut ci = vec![0isize; nz + n_row + 2];
        let info = find_singletons(
            n_row,
            n_col,
            ap,
            ai,
            quser,
            do_singletons,
            &mut cdeg,
            &mut cperm1,
            &mut rdeg,
            &mut rperm1,
            &mut inv,
            &mut ci,
        );
        (info, cperm1, rperm1, cdeg, rdeg)
    }

    #[test]
    fn diagonal_matrix_peels_completely() {
        let ap = [0usize, 1, 2, 3];
        let ai = [0usize, 1, 2];
        let (info, cperm1, rperm1, cdeg, rdeg) = run(3, 3, &ap, &ai, None, true);
        assert_eq!(info.n1, 3);
        assert_eq!(info.nempty_col, 0);
        assert!(info.is_sym);
        assert_eq!(cperm1, vec![0, 1, 2]);
        assert_eq!(rperm1, vec![0, 1, 2]);
        assert_eq!(&cdeg[..3], &[1, 1, 1]);
        assert_eq!(&rdeg[..3], &[1, 1, 1]);
    }

    #[test]
    fn arrow_matrix_peels_rows_then_column() {
        // 4x4, row 0 holds entries in every column; rows 1..3 are singletons
        // pattern: (0,0) (0,1),(1,1) (0,2),(2,2) (0,3),(3,3) column-major
        let ap = [0usize, 1, 3, 5, 7];
        let ai = [0usize, 0, 1, 0, 2, 0, 3];
        let (info, cperm1, rperm1, cdeg, rdeg) = run(4, 4, &ap, &ai, None, true);
        assert_eq!(info.n1, 4);
        assert_eq!(info.n1r, 3);
        assert_eq!(info.n1c, 1);
        // the three row singletons eliminate columns 1, 2, 3 first, then the
        // leftover 1x1 column 0 goes as a column singleton
        assert_eq!(cperm1, vec![1, 2, 3, 0]);
        assert_eq!(rperm1, vec![1, 2, 3, 0]);
        assert!(info.is_sym);
        // row-singleton pivots record the column degree at elimination time
        assert_eq!(&cdeg[..4], &[1, 2, 2, 2]);
        assert_eq!(&rdeg[..4], &[4 - 3, 1, 1, 1]);
    }

    #[test]
    fn tridiagonal_has_no_singletons() {
        let ap = [0usize, 2, 5, 8, 11, 13];
        let ai = [0usize, 1, 0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4];
        let (info, cperm1, rperm1, _, rdeg) = run(5, 5, &ap, &ai, None, true);
        assert_eq!(info.n1, 0);
        assert!(info.is_sym);
        assert_eq!(cperm1, vec![0, 1, 2, 3, 4]);
        assert_eq!(rperm1, vec![0, 1, 2, 3, 4]);
        assert_eq!(info.max_rdeg, 3);
        assert_eq!(&rdeg[..5], &[2, 3, 3, 3, 2]);
    }

    #[test]
    fn empty_column_is_placed_last() {
        // 4x4 with column 2 empty; diagonal otherwise, plus fill to avoid
        // peeling everything: use a 2x2 dense block on columns {0,1}
        let ap = [0usize, 2, 4, 4, 5];
        let ai = [0usize, 1, 0, 1, 3];
        let (info, cperm1, _, _, _) = run(4, 4, &ap, &ai, None, true);
        assert_eq!(info.nempty_col, 1);
        assert_eq!(cperm1[3], 2);
        // column 3 is a singleton, peeled first
        assert_eq!(cperm1[0], 3);
    }

    #[test]
    fn peeling_disabled_keeps_everything_in_place() {
        let ap = [0usize, 1, 2, 3];
        let ai = [0usize, 1, 2];
        let (info, cperm1, _, cdeg, _) = run(3, 3, &ap, &ai, None, false);
        assert_eq!(info.n1, 0);
        assert_eq!(cperm1, vec![0, 1, 2]);
        assert_eq!(&cdeg[..3], &[1, 1, 1]);
        assert!(info.is_sym);
    }

    #[test]
    fn quser_orders_the_interior() {
        // tridiagonal with a reversed user ordering; no singletons exist so
        // the interior must come out exactly in user order
        let ap = [0usize, 2, 5, 8, 11, 13];
        let ai = [0usize, 1, 0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4];
        let q = [4isize, 3, 2, 1, 0];
        let (info, cperm1, _, _, _) = run(5, 5, &ap, &ai, Some(&q), true);
        assert_eq!(info.n1, 0);
        assert_eq!(cperm1, vec![4, 3, 2, 1, 0]);
        assert!(!info.is_sym);
    }

    #[test]
    fn rectangular_interior_is_not_symmetric() {
        let ap = [0usize, 2, 4, 6];
        let ai = [0usize, 1, 0, 1, 0, 1];
        let (info, _, _, _, _) = run(2, 3, &ap, &ai, None, true);
        assert_eq!(info.n1, 0);
        assert!(!info.is_sym);
    }
}
