use crate::utils::EMPTY;

/// Assign every original row to the front that first assembles it.
///
/// Walks the fronts in tree order; each pivot column of front i claims the
/// not-yet-claimed, non-singleton rows of its original column.  On return
/// `in_front[row]` is the claiming front, `EMPTY` for singleton pivot rows,
/// `nfr` for rows no front touches (empty rows), and `front_1strow[i]` holds
/// the tally of rows claimed by front i.
#[allow(clippy::too_many_arguments)]
pub(crate) fn assign_rows_from_scratch(
    n_row: usize,
    n1: usize,
    nfr: usize,
    ap: &[usize],
    ai: &[usize],
    cperm_init: &[isize],
    rperm1: &[isize],
    front_npivcol: &[isize],
    in_front: &mut [isize],
    front_1strow: &mut [isize],
) {
    for slot in in_front[..n_row].iter_mut() {
        *slot = nfr as isize;
    }
    for k in 0..n1 {
        in_front[rperm1[k] as usize] = EMPTY;
    }
    let mut newj = n1;
    for i in 0..nfr {
        let fpivcol = front_npivcol[i] as usize;
        let mut f1rows = 0isize;
        for _ in 0..fpivcol {
            let j = cperm_init[newj] as usize;
            newj += 1;
            for p in ap[j]..ap[j + 1] {
                let row = ai[p];
                if in_front[row] == nfr as isize {
                    in_front[row] = i as isize;
                    f1rows += 1;
                }
            }
        }
        front_1strow[i] = f1rows;
    }
}

/// Adopt a collaborator-computed row-to-front map.
///
/// The collaborator saw the pruned matrix, so its `in_front[k - n1]` speaks
/// about pruned row k; permute it through `rperm1` back to original row ids
/// and tally rows per front.  Singleton rows become `EMPTY`, rows past the
/// non-empty range go to the dummy front.
#[allow(clippy::too_many_arguments)]
pub(crate) fn assign_rows_from_ordering(
    n_row: usize,
    n1: usize,
    nempty_row: usize,
    nfr: usize,
    rperm1: &[isize],
    collab_in_front: &[isize],
    in_front: &mut [isize],
    front_1strow: &mut [isize],
) {
    for slot in front_1strow[..=nfr].iter_mut() {
        *slot = 0;
    }
    for k in 0..n1 {
        in_front[rperm1[k] as usize] = EMPTY;
    }
    for k in n1..n_row - nempty_row {
        let row = rperm1[k] as usize;
        let i = collab_in_front[k - n1];
        debug_assert!(i >= EMPTY && i < nfr as isize);
        if i != EMPTY {
            front_1strow[i as usize] += 1;
        }
        in_front[row] = i;
    }
    for k in n_row - nempty_row..n_row {
        in_front[rperm1[k] as usize] = nfr as isize;
    }
}

/// Turn the per-front row tallies into starting positions and scatter the
/// rows into `rperm_init`, so rows claimed by the same front are contiguous.
/// Singleton pivot rows fill positions [0, n1).
pub(crate) fn fill_rperm_init(
    n_row: usize,
    n1: usize,
    nfr: usize,
    rperm1: &[isize],
    in_front: &[isize],
    front_1strow: &mut [isize],
    cursor: &mut [isize],
    rperm_init: &mut [isize],
) {
    for k in 0..n1 {
        rperm_init[k] = rperm1[k];
    }
    let mut k = n1 as isize;
    for i in 0..nfr {
        let f1rows = front_1strow[i];
        front_1strow[i] = k;
        k += f1rows;
    }
    front_1strow[nfr] = k;

    cursor[..=nfr].copy_from_slice(&front_1strow[..=nfr]);
    for row in 0..n_row {
        let i = in_front[row];
        if i != EMPTY {
            let newrow = cursor[i as usize];
            cursor[i as usize] += 1;
            debug_assert!(newrow >= n1 as isize);
            rperm_init[newrow as usize] = row as isize;
        }
    }
    rperm_init[n_row] = EMPTY;
}

/// Smallest-indexed front of each subtree, by a single upward pass; the
/// topological numbering (`parent[f] > f`) makes one walk per front enough.
pub(crate) fn leftmost_descendants(
    nfr: usize,
    front_parent: &[isize],
    front_leftmostdesc: &mut [isize],
) {
    for slot in front_leftmostdesc[..=nfr].iter_mut() {
        *slot = EMPTY;
    }
    for i in 0..nfr {
        let mut j = i as isize;
        while j != EMPTY && front_leftmostdesc[j as usize] == EMPTY {
            front_leftmostdesc[j as usize] = i as isize;
            j = front_parent[j as usize];
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ChainLayout {
    pub nchains: usize,
    pub maxnrows: isize,
    pub maxncols: isize,
    /// Largest chain frontal workspace, maxrows * maxcols.
    pub dmaxfrsize: f64,
}

/// Decompose the fronts into chains: maximal runs where each front's parent
/// is its successor.  Fronts of one chain share a frontal workspace sized by
/// the running row/column maxima; maxrows is rounded up to the next odd
/// number, which the numeric kernel's pivot search relies on.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_chains(
    nfr: usize,
    fr_nrows: &[isize],
    fr_ncols: &[isize],
    front_parent: &[isize],
    chain_start: &mut [isize],
    chain_maxrows: &mut [isize],
    chain_maxcols: &mut [isize],
) -> ChainLayout {
    let mut layout = ChainLayout {
        nchains: 0,
        maxnrows: 1,
        maxncols: 1,
        dmaxfrsize: 1.0,
    };

    chain_start[0] = 0;
    let mut maxrows = 1isize;
    let mut maxcols = 1isize;

    for i in 0..nfr {
        maxrows = maxrows.max(fr_nrows[i]);
        maxcols = maxcols.max(fr_ncols[i]);

        if front_parent[i] != i as isize + 1 {
            // end of a chain
            if maxrows % 2 == 0 {
                maxrows += 1;
            }
            chain_maxrows[layout.nchains] = maxrows;
            chain_maxcols[layout.nchains] = maxcols;

            let s = maxrows as f64 * maxcols as f64;
            layout.dmaxfrsize = layout.dmaxfrsize.max(s);
            layout.maxnrows = layout.maxnrows.max(maxrows);
            layout.maxncols = layout.maxncols.max(maxcols);

            layout.nchains += 1;
            chain_start[layout.nchains] = i as isize + 1;
            maxrows = 1;
            maxcols = 1;
        }
    }
    chain_maxrows[layout.nchains] = 0;
    chain_maxcols[layout.nchains] = 0;
    layout.dmaxfrsize = layout.dmaxfrsize.ceil();

    layout
}

/// Rewrite a degree vector so it is indexed by the new ordering:
/// `deg[k] = deg_original[perm[k]]`.
pub(crate) fn permute_degrees(n: usize, perm: &[isize], deg: &mut [isize], scratch: &mut [isize]) {
    for k in 0..n {
        scratch[k] = deg[perm[k] as usize];
    }
    deg[..n].copy_from_slice(&scratch[..n]);
}

/// Initial element sizes of the non-singleton columns when dense rows are
/// present: the column degree minus its entries that live in dense rows
/// (those entries are carried by the dense-row elements instead).
///
/// `cdeg`/`rdeg` are still indexed by original ids here; `inv_rperm_init`
/// maps an original row to its position under the final row ordering.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_esize(
    n_col: usize,
    n1: usize,
    nempty_col: usize,
    dense_row_threshold: usize,
    ap: &[usize],
    ai: &[usize],
    cperm_init: &[isize],
    inv_rperm_init: &[isize],
    cdeg: &[isize],
    rdeg: &[isize],
    esize: &mut [isize],
) {
    for col in n1..n_col - nempty_col {
        let oldcol = cperm_init[col] as usize;
        let mut es = cdeg[oldcol];
        debug_assert!(es > 0);
        for p in ap[oldcol]..ap[oldcol + 1] {
            let oldrow = ai[p];
            let newrow = inv_rperm_init[oldrow];
            if newrow >= n1 as isize && rdeg[oldrow] > dense_row_threshold as isize {
                es -= 1;
            }
        }
        debug_assert!(es >= 0);
        esize[col - n1] = es;
    }
}

/// Where the original diagonal moved: `diagonal_map[newcol]` is the new row
/// position of the entry A(j, j) for j = `cperm_init[newcol]`.
pub(crate) fn compute_diagonal_map(
    nn: usize,
    cperm_init: &[isize],
    inv_rperm_init: &[isize],
    diagonal_map: &mut [isize],
) {
    for newcol in 0..nn {
        let oldcol = cperm_init[newcol] as usize;
        let newrow = inv_rperm_init[oldcol];
        debug_assert!(newrow >= 0 && newrow < nn as isize);
        diagonal_map[newcol] = newrow;
    }
}
