// SPDX-License-Identifier: BSD-3-Clause
//
// Minimum-degree ordering in the style of SuiteSparse AMD by Timothy A.
// Davis, Patrick R. Amestoy, and Iain S. Duff, reduced to the quotient-graph
// core: element absorption, dense-variable postponement, assembly-tree
// postorder, and the LDL'/LU work statistics.  Degrees are recomputed
// exactly rather than approximated.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::utils::EMPTY;

#[derive(Debug, Clone, Copy)]
pub struct AmdControl {
    /// Absorb elements whose pattern is covered by the new pivot element,
    /// even when they are not adjacent to the pivot.
    pub aggressive: bool,
    /// Degree above which a variable is postponed to the end of the
    /// ordering.  Use `n` to disable.
    pub dense_cutoff: usize,
}

/// Work statistics of the ordering, phrased as projections for a Cholesky /
/// LU factorization of P(A+Aᵀ)Pᵀ.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmdInfo {
    /// Nonzeros in L, excluding the diagonal.
    pub lnz: f64,
    /// Divide operations, for both LDL' and LU.
    pub ndiv: f64,
    /// Multiply-subtract pairs for LDL'.
    pub nms_ldl: f64,
    /// Multiply-subtract pairs for LU.
    pub nms_lu: f64,
    /// Largest frontal matrix is dmax-by-dmax.
    pub dmax: f64,
    /// Postponed dense variables.
    pub ndense: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Live,
    Eliminated,
    Dense,
}

/// Order the symmetrized pattern by exact-external-degree minimum degree.
///
/// `pe`/`iw` hold the pattern of A+Aᵀ with no diagonal entries (`pe` is
/// `n+1` prefix pointers; the caller flattens an
/// [`crate::ordering::aat::AatGraph`] into this form).  Writes the
/// permutation (`perm[k] = i`: node i is eliminated k-th) and its inverse,
/// both fully defined on return.
pub fn order(
    n: usize,
    pe: &[isize],
    iw: &[isize],
    control: &AmdControl,
    perm: &mut [isize],
    inverse: &mut [isize],
) -> AmdInfo {
    debug_assert!(n > 0);

    let mut info = AmdInfo::default();

    // quotient graph: per live variable, neighbor variables and adjacent
    // elements; per eliminated pivot, the element pattern it left behind
    let mut var_adj: Vec<Vec<u32>> = Vec::with_capacity(n);
    let mut elem_adj: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut elem_pattern: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut state = vec![NodeState::Live; n];
    let mut degree = vec![0usize; n];
    let mut parent = vec![EMPTY; n];
    let mut absorbed = vec![false; n];

    for i in 0..n {
        let adj: Vec<u32> = iw[pe[i] as usize..pe[i + 1] as usize]
            .iter()
            .map(|&v| v as u32)
            .collect();
        degree[i] = adj.len();
        var_adj.push(adj);
    }

    // postpone dense variables; they are ordered last and never enter the
    // quotient graph
    for i in 0..n {
        if degree[i] > control.dense_cutoff {
            state[i] = NodeState::Dense;
            info.ndense += 1;
        }
    }

    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new();
    for i in 0..n {
        if state[i] == NodeState::Live {
            heap.push(Reverse((degree[i], i)));
        }
    }

    // generation-stamped markers: one records membership in the current
    // pivot pattern (also consulted by aggressive absorption), the other
    // backs the per-variable degree recomputation
    let mut mark_le = vec![0u64; n];
    let mut le_generation = 0u64;
    let mut mark = vec![0u64; n];
    let mut generation = 0u64;

    let mut pivots: Vec<usize> = Vec::with_capacity(n);
    let mut pivot_pattern: Vec<u32> = Vec::new();

    while let Some(Reverse((d, me))) = heap.pop() {
        if state[me] != NodeState::Live || d != degree[me] {
            continue; // stale entry
        }

        // Le = union of live neighbors and of the patterns of adjacent
        // elements, excluding me
        le_generation += 1;
        let le_stamp = le_generation;
        mark_le[me] = le_stamp;
        pivot_pattern.clear();
        for &v in &var_adj[me] {
            let v = v as usize;
            if state[v] == NodeState::Live && mark_le[v] != le_stamp {
                mark_le[v] = le_stamp;
                pivot_pattern.push(v as u32);
            }
        }
        for &e in &elem_adj[me] {
            let e = e as usize;
            if absorbed[e] {
                continue;
            }
            for &v in &elem_pattern[e] {
                let v = v as usize;
                if state[v] == NodeState::Live && mark_le[v] != le_stamp {
                    mark_le[v] = le_stamp;
                    pivot_pattern.push(v as u32);
                }
            }
            // the child element is assembled into the new one
            absorbed[e] = true;
            parent[e] = me as isize;
        }
        pivot_pattern.sort_unstable();

        state[me] = NodeState::Eliminated;
        pivots.push(me);
        elem_pattern[me] = pivot_pattern.clone();

        let degme = pivot_pattern.len();

        // refresh every variable of the new element
        for idx in 0..pivot_pattern.len() {
            let i = pivot_pattern[idx] as usize;

            // drop dead neighbors and adjacent absorbed elements; with
            // aggressive absorption, also elements fully covered by Le
            let mut kept_vars: Vec<u32> = Vec::new();
            for &v in &var_adj[i] {
                if state[v as usize] == NodeState::Live && v as usize != i {
                    kept_vars.push(v);
                }
            }
            kept_vars.sort_unstable();
            kept_vars.dedup();
            var_adj[i] = kept_vars;

            let mut kept_elems: Vec<u32> = Vec::new();
            for &e in &elem_adj[i] {
                let e_us = e as usize;
                if absorbed[e_us] || e_us == me {
                    continue;
                }
                if control.aggressive {
                    let covered = elem_pattern[e_us]
                        .iter()
                        .all(|&v| {
                            state[v as usize] != NodeState::Live
                                || mark_le[v as usize] == le_stamp
                        });
                    if covered {
                        absorbed[e_us] = true;
                        parent[e_us] = me as isize;
                        continue;
                    }
                }
                kept_elems.push(e);
            }
            kept_elems.push(me as u32);
            elem_adj[i] = kept_elems;

            // exact external degree of i
            generation += 1;
            let deg_stamp = generation;
            mark[i] = deg_stamp;
            let mut deg = 0usize;
            for &v in &var_adj[i] {
                if mark[v as usize] != deg_stamp {
                    mark[v as usize] = deg_stamp;
                    deg += 1;
                }
            }
            for &e in &elem_adj[i] {
                for &v in &elem_pattern[e as usize] {
                    let v = v as usize;
                    if state[v] == NodeState::Live && mark[v] != deg_stamp {
                        mark[v] = deg_stamp;
                        deg += 1;
                    }
                }
            }
            degree[i] = deg;
            heap.push(Reverse((deg, i)));
        }

        // work statistics for this pivot: a 1-by-(1+r) elimination where the
        // postponed dense variables ride along in every front
        let f = 1.0f64;
        let r = degme as f64 + info.ndense as f64;
        info.dmax = info.dmax.max(f + r);
        let lnzme = f * r + (f - 1.0) * f / 2.0;
        info.lnz += lnzme;
        info.ndiv += lnzme;
        let s = f * r * r + r * (f - 1.0) * f + (f - 1.0) * f * (2.0 * f - 1.0) / 6.0;
        info.nms_lu += s;
        info.nms_ldl += (s + lnzme) / 2.0;
    }

    // the postponed dense variables form one final clique
    let f = info.ndense as f64;
    info.dmax = info.dmax.max(f);
    let lnzme = (f - 1.0) * f / 2.0;
    info.lnz += lnzme;
    info.ndiv += lnzme;
    let s = (f - 1.0) * f * (2.0 * f - 1.0) / 6.0;
    info.nms_lu += s;
    info.nms_ldl += (s + lnzme) / 2.0;

    // postorder the assembly tree so chained pivots end up adjacent;
    // parent[e] is the pivot whose element assembled e, set at absorption
    let order = postorder_assembly_tree(n, &pivots, &parent);

    let mut k = 0usize;
    for &i in &order {
        perm[k] = i as isize;
        inverse[i] = k as isize;
        k += 1;
    }
    for i in 0..n {
        if state[i] == NodeState::Dense {
            perm[k] = i as isize;
            inverse[i] = k as isize;
            k += 1;
        }
    }
    debug_assert_eq!(k, n);
    debug_assert!(crate::utils::is_permutation(&perm[..n], n));

    info
}

/// Children-before-parent order of the eliminated pivots.  Roots and
/// sibling lists keep elimination order, so an already post-ordered
/// elimination sequence is returned unchanged.
fn postorder_assembly_tree(n: usize, pivots: &[usize], parent: &[isize]) -> Vec<usize> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<usize> = Vec::new();
    for &e in pivots {
        let p = parent[e];
        if p == EMPTY {
            roots.push(e);
        } else {
            children[p as usize].push(e);
        }
    }

    let mut order = Vec::with_capacity(pivots.len());
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for &root in &roots {
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if top.1 < children[node].len() {
                let child = children[node][top.1];
                top.1 += 1;
                stack.push((child, 0));
            } else {
                order.push(node);
                stack.pop();
            }
        }
    }
    order
}
