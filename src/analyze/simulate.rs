use log::trace;

use crate::scalar::Scalar;
use crate::utils::{EMPTY, dunits_of, units_of};

/// A tuple is one (element, position) reference in a row or column list.
type Tuple = [isize; 2];

/// Capacity reserved for a tuple list holding `tlen` references.
fn tuples(tlen: usize) -> usize {
    (tlen + 1).max(4)
}

/// Size of an element record holding an r-by-c Schur contribution: header,
/// row and column index lists, numerical block.  In Units.
fn element_units<S: Scalar>(r: usize, c: usize) -> f64 {
    1.0 + dunits_of::<isize>((r + c) as f64) + (S::ENTRY_UNITS * r * c) as f64
}

/// Element record plus the tuple-list slots its rows and columns occupy.
fn element_size<S: Scalar>(r: f64, c: f64) -> f64 {
    let rc = r + c;
    1.0 + dunits_of::<isize>(rc)
        + (S::ENTRY_UNITS as f64 * r * c).ceil()
        + 1.0
        + rc * units_of::<Tuple>(1) as f64
}

/// Everything the numeric-phase projection needs from the chain walk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SimulationResult {
    /// Head+tail after the initial elements and tuple lists are in place.
    pub num_mem_init_usage: usize,
    pub dnum_mem_init_usage: f64,
    /// Final head (the finalized LU factors), ceiled.
    pub dhead_usage: f64,
    /// Peak head+tail across the whole factorization, ceiled.
    pub dmax_usage: f64,
    /// Upper bounds on nz in L and U, each including the diagonal.
    pub dlnz: f64,
    pub dunz: f64,
    pub flops: f64,
    /// Dense rows converted to initial elements.
    pub ndense_row: usize,
}

/// Walk the fronts chain by chain, simulating the numeric kernel's memory
/// discipline: finalized LU factors accumulate at the head of one arena,
/// element records and tuple lists live at the tail until assembled.
///
/// `cdeg`/`rdeg` must already be permuted (indexed by pivot position).
/// `link` is size-`nfr` scratch holding the per-front child lists, exactly
/// as the kernel chains elements to the front that will assemble them.
#[allow(clippy::too_many_arguments)]
pub(crate) fn simulate_kernel<S: Scalar>(
    n_row: usize,
    n_col: usize,
    n1: usize,
    nempty_row: usize,
    nempty_col: usize,
    nfr: usize,
    nchains: usize,
    nb: usize,
    dense_row_threshold: usize,
    cdeg: &[isize],
    rdeg: &[isize],
    esize: Option<&[isize]>,
    front_npivcol: &[isize],
    front_parent: &[isize],
    fr_nrows: &[isize],
    fr_ncols: &[isize],
    chain_start: &[isize],
    chain_maxrows: &[isize],
    chain_maxcols: &[isize],
    link: &mut [isize],
) -> SimulationResult {
    let n_inner = n_row.min(n_col);

    // upper limits on nz in L and U, including the unit diagonal
    let mut dlnz = n_inner as f64;
    let mut dunz = dlnz;

    // head and tail markers
    let mut head_usage = 1usize;
    let mut dhead_usage = 1.0f64;
    let mut tail_usage = 2usize;
    let mut dtail_usage = 2.0f64;

    // the kernel stages two pointer arrays while building the initial
    // elements; they are released once the elements stand
    let rp_units = 2 * units_of::<usize>(n_row + 1);
    tail_usage += rp_units + 2;
    dtail_usage += 2.0 * dunits_of::<usize>((n_row + 1) as f64) + 2.0;

    // LU factors of the singleton pivots, at the head
    for k in 0..n1 {
        let lnz = (cdeg[k] - 1) as usize;
        let unz = (rdeg[k] - 1) as usize;
        dlnz += lnz as f64;
        dunz += unz as f64;
        head_usage += units_of::<isize>(lnz)
            + S::ENTRY_UNITS * lnz
            + units_of::<isize>(unz)
            + S::ENTRY_UNITS * unz;
        dhead_usage += dunits_of::<isize>(lnz as f64)
            + (S::ENTRY_UNITS * lnz) as f64
            + dunits_of::<isize>(unz as f64)
            + (S::ENTRY_UNITS * unz) as f64;
    }

    // one initial element per non-singleton column
    for k in n1..n_col - nempty_col {
        let es = match esize {
            Some(e) => e[k - n1],
            None => cdeg[k],
        };
        debug_assert!(es >= 0);
        if es > 0 {
            let u = element_units::<S>(es as usize, 1) + 1.0;
            tail_usage += u as usize;
            dtail_usage += u;
        }
    }

    // one initial element per dense row
    let mut ndense_row = 0usize;
    if esize.is_some() {
        for k in n1..n_row - nempty_row {
            let rd = rdeg[k];
            if rd > dense_row_threshold as isize {
                let u = element_units::<S>(1, rd as usize) + 1.0;
                tail_usage += u as usize;
                dtail_usage += u;
                ndense_row += 1;
            }
        }
    }

    // tuple lists for every row and every column
    if let Some(es) = esize {
        for row in n1..n_row {
            let rd = rdeg[row];
            let tlen = if rd > dense_row_threshold as isize {
                1
            } else {
                rd as usize
            };
            tail_usage += 1 + units_of::<Tuple>(tuples(tlen));
            dtail_usage += 1.0 + units_of::<Tuple>(tuples(tlen)) as f64;
        }
        for col in n1..n_col - nempty_col {
            // one slot for the column element plus one per dense row hit
            let e = es[col - n1];
            let tlen = (e > 0) as usize + (cdeg[col] - e) as usize;
            tail_usage += 1 + units_of::<Tuple>(tuples(tlen));
            dtail_usage += 1.0 + units_of::<Tuple>(tuples(tlen)) as f64;
        }
        for _col in n_col - nempty_col..n_col {
            tail_usage += 1 + units_of::<Tuple>(tuples(0));
            dtail_usage += 1.0 + units_of::<Tuple>(tuples(0)) as f64;
        }
    } else {
        for row in n1..n_row {
            let tlen = rdeg[row] as usize;
            tail_usage += 1 + units_of::<Tuple>(tuples(tlen));
            dtail_usage += 1.0 + units_of::<Tuple>(tuples(tlen)) as f64;
        }
        for _col in n1..n_col {
            tail_usage += 1 + units_of::<Tuple>(tuples(1));
            dtail_usage += 1.0 + units_of::<Tuple>(tuples(1)) as f64;
        }
    }

    let num_mem_init_usage = head_usage + tail_usage;
    let mut dmax_usage = (dhead_usage + dtail_usage).ceil().max(num_mem_init_usage as f64);
    let dnum_mem_init_usage = dmax_usage;

    trace!(
        "kernel init: head {head_usage} + tail {tail_usage} = {num_mem_init_usage} units"
    );

    // the staged pointer arrays are gone once the elements exist
    dtail_usage -= 2.0 * dunits_of::<usize>((n_row + 1) as f64);

    // walk the chains exactly as the kernel does, with each front's element
    // linked into its parent's child list until assembled
    for slot in link[..nfr].iter_mut() {
        *slot = EMPTY;
    }
    let mut flops = 0.0f64;

    for chain in 0..nchains {
        let f1 = chain_start[chain] as usize;
        let f2 = (chain_start[chain + 1] - 1) as usize;

        // frontal working array shared by the whole chain:
        // an nb-by-nb LU block, L is dr-by-nb, U is nb-by-dc, C is dr-by-dc
        let dr = chain_maxrows[chain] as f64;
        let dc = chain_maxcols[chain] as f64;
        let nbf = nb as f64;
        let fsize = nbf * nbf + dr * nbf + nbf * dc + dr * dc;
        dtail_usage += (S::ENTRY_UNITS as f64 * fsize).ceil();
        dmax_usage = dmax_usage.max(dhead_usage + dtail_usage);

        for i in f1..=f2 {
            let fpivcol = front_npivcol[i];
            let fallrows = fr_nrows[i];
            let fallcols = fr_ncols[i];
            let parent = front_parent[i];
            let fpiv = fpivcol.min(fallrows);
            let f = fpiv as f64;
            let r = (fallrows - fpiv) as f64;
            let c = (fallcols - fpiv) as f64;

            // assemble all children of this front
            let mut child = link[i];
            while child != EMPTY {
                let ch = child as usize;
                debug_assert!(front_parent[ch] == i as isize);
                let cp = front_npivcol[ch].min(fr_nrows[ch]);
                let cr = (fr_nrows[ch] - cp) as f64;
                let cc = (fr_ncols[ch] - cp) as f64;
                dtail_usage -= element_size::<S>(cr, cc);
                child = link[ch];
            }

            // canonical flop count for factorizing this front
            flops += S::DIV_FLOPS * (f * r + (f - 1.0) * f / 2.0)
                + S::MULTSUB_FLOPS
                    * (f * r * c + (r + c) * (f - 1.0) * f / 2.0
                        + (f - 1.0) * f * (2.0 * f - 1.0) / 6.0);

            // f columns of L and f rows of U move to the head
            let dlf = (f * f - f) / 2.0 + f * r;
            let duf = (f * f - f) / 2.0 + f * c;
            dlnz += dlf;
            dunz += duf;
            dhead_usage +=
                (S::ENTRY_UNITS as f64 * (dlf + duf)).ceil() + dunits_of::<isize>(r + c + f);

            if parent != EMPTY {
                // the Schur complement becomes an element awaiting assembly
                dtail_usage += element_size::<S>(r, c);
                link[i] = link[parent as usize];
                link[parent as usize] = i as isize;
            }

            dmax_usage = dmax_usage.max(dhead_usage + dtail_usage);
        }

        // the chain is done; its frontal working array goes away
        dtail_usage -= (S::ENTRY_UNITS as f64 * fsize).ceil();
    }

    dhead_usage = dhead_usage.ceil();
    dmax_usage = dmax_usage.ceil();

    SimulationResult {
        num_mem_init_usage,
        dnum_mem_init_usage,
        dhead_usage,
        dmax_usage,
        dlnz,
        dunz,
        flops,
        ndense_row,
    }
}
