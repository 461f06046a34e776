//! Symmetrized pattern S+Sᵀ of the pruned matrix.
//!
//! The strategy selection reads the symmetry statistics off this graph, and
//! the symmetric ordering path feeds its adjacency to the minimum-degree
//! collaborator.  Columns need not be sorted: every off-diagonal entry is
//! scattered in both directions and the per-node lists are deduplicated
//! afterwards, which also yields the matched-pair count (an entry present
//! in both triangles lands in each list twice).

/// Statistics of the symmetrized pattern.
#[derive(Debug, Clone, Copy)]
pub struct AatStats {
    /// Fraction of off-diagonal entries matched by a transposed partner.
    /// 1.0 for a symmetric pattern, 0.0 when no entry has one.
    pub sym: f64,
    /// Structurally present diagonal entries of S.
    pub nzdiag: usize,
    /// Off-diagonal entries present in both S and Sᵀ (counted once).
    pub nzboth: usize,
    /// Entries of S+Sᵀ, excluding the diagonal.
    pub nzaat: usize,
}

/// S+Sᵀ without its diagonal, one sorted neighbor list per node.
#[derive(Debug)]
pub struct AatGraph {
    pub adj: Vec<Vec<u32>>,
    pub stats: AatStats,
}

impl AatGraph {
    /// Degree of node i in S+Sᵀ, diagonal excluded.
    pub fn degree(&self, i: usize) -> usize {
        self.adj[i].len()
    }
}

/// Build S+Sᵀ from a square compressed-column pattern.
pub(crate) fn symmetrize(n: usize, ap: &[isize], ai: &[isize]) -> AatGraph {
    let nz = ap[n] as usize;
    let mut adj: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut nzdiag = 0usize;

    for col in 0..n {
        for p in ap[col] as usize..ap[col + 1] as usize {
            let row = ai[p] as usize;
            debug_assert!(row < n);
            if row == col {
                nzdiag += 1;
            } else {
                adj[row].push(col as u32);
                adj[col].push(row as u32);
            }
        }
    }

    // every matched (i,j)/(j,i) pair put j into adj[i] twice and i into
    // adj[j] twice; the dedup shrinkage counts those pairs
    let scattered: usize = adj.iter().map(Vec::len).sum();
    for neighbors in adj.iter_mut() {
        neighbors.sort_unstable();
        neighbors.dedup();
    }
    let nzaat: usize = adj.iter().map(Vec::len).sum();
    let nzboth = (scattered - nzaat) / 2;

    let sym = if nz == nzdiag {
        // only diagonal entries, a trivially symmetric pattern
        1.0
    } else {
        (2.0 * nzboth as f64) / ((nz - nzdiag) as f64)
    };

    AatGraph {
        adj,
        stats: AatStats {
            sym,
            nzdiag,
            nzboth,
            nzaat,
        },
    }
}
