use log::debug;

use crate::error::{AnalyzeError, AnalyzeResult};
use crate::utils::EMPTY;

/// Result of the symbolic front-tree analysis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrontTreeResult {
    pub nfr: usize,
    /// Workspace compactions performed while merging element patterns.
    pub compactions: usize,
}

/// Column-etree symbolic factorization of the pruned, column-ordered matrix.
///
/// Inputs are the pruned pattern S in column form (`sp`/`si`, `n_col2`
/// non-empty columns by `n_rows` rows) and its row-form twin B living at the
/// tail of `arena` (`bp[r]..bp[r+1]` are arena-relative positions of row r's
/// sorted column list).  The same arena holds the element patterns of the
/// factorization; consumed rows are reclaimed by compaction, so the whole
/// pass fits in `snz + n_col2` entries.
///
/// Three steps:
/// 1. column elimination tree of SᵀS by path compression over row cliques,
/// 2. children-first postorder written to `cperm2` (identity when `fix_q`),
/// 3. row-merge elimination over the postordered columns: each pivot column
///    gathers the rows whose leftmost column it is plus the elements whose
///    parent it is; the merged pattern defines the element, its minimum the
///    parent.  Consecutive pivots whose patterns nest exactly are
///    amalgamated into one front.
///
/// Outputs per front f < nfr: `npivcol`, `nrows` (pivot plus Schur rows),
/// `ncols`, and `parent` (a front index strictly greater than f, or EMPTY).
#[allow(clippy::too_many_arguments)]
pub(crate) fn analyze(
    n_rows: usize,
    n_col2: usize,
    sp: &[isize],
    si: &[isize],
    fix_q: bool,
    arena: &mut [isize],
    bp: &[isize],
    link: &mut [isize],
    w: &mut [isize],
    cperm2: &mut [isize],
    front_npivcol: &mut [isize],
    front_nrows: &mut [isize],
    front_ncols: &mut [isize],
    front_parent: &mut [isize],
) -> AnalyzeResult<FrontTreeResult> {
    debug_assert!(n_col2 > 0);
    let snz = sp[n_col2] as usize;
    let bsize = snz.max(1);
    let clen2 = arena.len() - bsize;

    // --- column elimination tree of SᵀS ------------------------------------
    // every row of S is a clique among its columns; consecutive columns of a
    // row are linked through the current partial forest with path
    // compression.  parent lives in `link`, ancestors in `w`.
    let etree_parent = &mut link[..n_col2];
    let ancestor = &mut w[..n_col2];
    etree_parent.fill(EMPTY);
    ancestor.fill(EMPTY);
    let mut prev_col = vec![EMPTY; n_rows];

    for k in 0..n_col2 {
        for p in sp[k] as usize..sp[k + 1] as usize {
            let row = si[p] as usize;
            let mut j = prev_col[row];
            while j != EMPTY && j < k as isize {
                let jnext = ancestor[j as usize];
                ancestor[j as usize] = k as isize;
                if jnext == EMPTY {
                    etree_parent[j as usize] = k as isize;
                }
                j = jnext;
            }
            prev_col[row] = k as isize;
        }
    }

    // --- postorder ---------------------------------------------------------
    if fix_q {
        for (k, slot) in cperm2[..n_col2].iter_mut().enumerate() {
            *slot = k as isize;
        }
    } else {
        postorder(n_col2, etree_parent, &mut cperm2[..n_col2]);
    }
    // old column label -> postordered position
    let inv_post = &mut w[..n_col2];
    for k in 0..n_col2 {
        inv_post[cperm2[k] as usize] = k as isize;
    }

    // --- row-merge elimination --------------------------------------------
    // entities 0..n_rows are the rows of B (blocks inside the arena);
    // entities n_rows..n_rows+n_col2 are pivot elements
    let nent = n_rows + n_col2;
    let mut start = vec![0usize; nent];
    let mut len = vec![0usize; nent];
    let mut live = vec![false; nent];
    // Schur rows an entity carries into its parent
    let mut weight = vec![0isize; nent];

    // rows whose leftmost (postordered) column is j, and elements whose
    // parent column is j
    let mut rows_at: Vec<Vec<u32>> = vec![Vec::new(); n_col2];
    let mut children_of: Vec<Vec<u32>> = vec![Vec::new(); n_col2];

    for r in 0..n_rows {
        let b0 = bp[r] as usize;
        let b1 = bp[r + 1] as usize;
        start[r] = b0;
        len[r] = b1 - b0;
        if b1 == b0 {
            continue; // empty row, belongs to no front
        }
        live[r] = true;
        weight[r] = 1;
        let mut leftmost = isize::MAX;
        for &c in &arena[b0..b1] {
            leftmost = leftmost.min(inv_post[c as usize]);
        }
        rows_at[leftmost as usize].push(r as u32);
    }

    let mut mark = vec![0u64; n_col2];
    let mut generation = 0u64;

    let mut free_ptr = 0usize;
    let mut boundary = clen2;
    let mut compactions = 0usize;

    // per-pivot results, compacted into per-front results afterwards
    // (front_nrows / front_ncols / front_parent double as that storage)
    for jn in 0..n_col2 {
        // make room for the worst-case pattern of one pivot
        if free_ptr + n_col2 > boundary {
            let live_total = compact(arena, &mut start, &len, &live, nent);
            free_ptr = live_total;
            boundary = arena.len();
            compactions += 1;
            if free_ptr + n_col2 > boundary {
                return Err(AnalyzeError::Internal {
                    context: "element workspace exhausted in symbolic factorization",
                });
            }
        }

        generation += 1;
        let stamp = generation;
        mark[jn] = stamp;
        let pstart = free_ptr;
        let mut fallrows = 0isize;

        for &r in &rows_at[jn] {
            let r = r as usize;
            debug_assert!(live[r]);
            for t in start[r]..start[r] + len[r] {
                let c = inv_post[arena[t] as usize];
                debug_assert!(c >= jn as isize);
                if mark[c as usize] != stamp {
                    mark[c as usize] = stamp;
                    arena[free_ptr] = c;
                    free_ptr += 1;
                }
            }
            live[r] = false;
            fallrows += 1;
        }
        for &e in &children_of[jn] {
            let e = e as usize;
            debug_assert!(live[e]);
            for t in start[e]..start[e] + len[e] {
                let c = arena[t];
                debug_assert!(c >= jn as isize);
                if mark[c as usize] != stamp {
                    mark[c as usize] = stamp;
                    arena[free_ptr] = c;
                    free_ptr += 1;
                }
            }
            live[e] = false;
            fallrows += weight[e];
        }

        // the pivot column never lands in the pattern: it was marked first
        let plen = free_ptr - pstart;
        arena[pstart..free_ptr].sort_unstable();

        let e = n_rows + jn;
        start[e] = pstart;
        len[e] = plen;
        live[e] = true;
        weight[e] = (fallrows - 1).max(0);

        let parent_col = if plen > 0 { arena[pstart] } else { EMPTY };
        debug_assert!(parent_col == EMPTY || parent_col > jn as isize);
        if parent_col != EMPTY {
            children_of[parent_col as usize].push(e as u32);
        }

        front_nrows[jn] = fallrows;
        front_ncols[jn] = plen as isize + 1;
        front_parent[jn] = parent_col;
    }

    // --- amalgamation into fronts ------------------------------------------
    // a pivot whose element nests exactly in the next pivot's front joins
    // it: same parent chain and the column count shrinks by exactly one
    let mut col2front = vec![EMPTY; n_col2];
    let mut nfr = 0usize;
    let mut j = 0usize;
    while j < n_col2 {
        let run_start = j;
        while j + 1 < n_col2
            && front_parent[j] == (j + 1) as isize
            && front_nrows[j + 1] == front_nrows[j] - 1
            && front_ncols[j] == front_ncols[j + 1] + 1
        {
            j += 1;
        }
        let npiv = j - run_start + 1;
        for t in run_start..=j {
            col2front[t] = nfr as isize;
        }
        let fallrows = front_nrows[j] + npiv as isize - 1;
        let fallcols = front_ncols[run_start];
        let parent_col = front_parent[j];
        front_npivcol[nfr] = npiv as isize;
        front_nrows[nfr] = fallrows;
        front_ncols[nfr] = fallcols;
        front_parent[nfr] = parent_col; // still a column id, remapped below
        nfr += 1;
        j += 1;
    }
    for f in 0..nfr {
        let pc = front_parent[f];
        front_parent[f] = if pc == EMPTY {
            EMPTY
        } else {
            col2front[pc as usize]
        };
        debug_assert!(front_parent[f] == EMPTY || front_parent[f] > f as isize);
    }

    debug!(
        "front tree: {} pivots folded into {} fronts, {} compactions",
        n_col2, nfr, compactions
    );

    Ok(FrontTreeResult { nfr, compactions })
}

/// Pack the live entity blocks to the front of the arena, preserving their
/// relative order, and return the total live size.
fn compact(
    arena: &mut [isize],
    start: &mut [usize],
    len: &[usize],
    live: &[bool],
    nent: usize,
) -> usize {
    let mut order: Vec<usize> = (0..nent).filter(|&e| live[e] && len[e] > 0).collect();
    order.sort_unstable_by_key(|&e| start[e]);
    let mut out = 0usize;
    for e in order {
        arena.copy_within(start[e]..start[e] + len[e], out);
        start[e] = out;
        out += len[e];
    }
    out
}

/// Children-before-parents order of a forest given as a parent array with
/// `parent[j] > j`; roots and siblings keep their natural order.
fn postorder(n: usize, parent: &[isize], out: &mut [isize]) {
    let mut children: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut roots: Vec<u32> = Vec::new();
    for j in 0..n {
        if parent[j] == EMPTY {
            roots.push(j as u32);
        } else {
            children[parent[j] as usize].push(j as u32);
        }
    }
    let mut k = 0usize;
    let mut stack: Vec<(u32, usize)> = Vec::new();
    for &root in &roots {
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let node = top.0 as usize;
            if top.1 < children[node].len() {
                let child = children[node][top.1];
                top.1 += 1;
                stack.push((child, 0));
            } else {
                out[k] = node as isize;
                k += 1;
                stack.pop();
            }
        }
    }
    debug_assert_eq!(k, n);
}
