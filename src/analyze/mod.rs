pub(crate) mod front_tree;
pub(crate) mod fronts;
pub(crate) mod simulate;
pub(crate) mod singletons;

use std::time::Instant;

use log::debug;

use crate::config::{Control, FixQOverride, OrderingChoice, Strategy, dense_degree};
use crate::error::{AnalyzeError, AnalyzeResult, Status};
use crate::info::{Info, NumericEstimates, set_stats};
use crate::matrix::csc::validate_pattern;
use crate::matrix::transpose::transpose_pattern;
use crate::ordering::aat::{self, AatGraph};
use crate::ordering::amd::{self, AmdControl};
use crate::ordering::colamd::{self, ColamdControl};
use crate::ordering::{CholeskyStats, FrontTreeInfo, OrderingRequest, UserOrdering};
use crate::scalar::Scalar;
use crate::utils::{EMPTY, UNIT_BYTES, dunits_of, invert_permutation};

/// The symbolic analysis result, immutable once built.
///
/// Permutation and degree arrays carry one trailing sentinel slot holding
/// `EMPTY`, matching the layout the numeric phase indexes against.
#[derive(Debug, Clone)]
pub struct Symbolic {
    pub n_row: usize,
    pub n_col: usize,
    pub nz: usize,
    /// Panel size of the downstream kernel (even, at least 2).
    pub nb: usize,

    // singleton peel
    pub n1: usize,
    pub n1r: usize,
    pub n1c: usize,
    pub nempty: usize,
    pub nempty_row: usize,
    pub nempty_col: usize,

    // decisions
    pub strategy: Strategy,
    pub ordering: OrderingChoice,
    pub fix_q: bool,
    pub prefer_diagonal: bool,
    pub dense_row_threshold: usize,

    // strategy signal (EMPTY-valued when the unsymmetric path skipped it)
    pub sym: f64,
    pub nzaat: f64,
    pub nzdiag: f64,
    pub amd_dmax: f64,
    pub amd_lunz: f64,

    /// Column permutation, length `n_col + 1`: singletons first, then the
    /// fill-reduced interior, empty columns last.
    pub cperm_init: Vec<isize>,
    /// Row permutation, length `n_row + 1`: singleton pivot rows first, then
    /// each front's rows contiguously, empty rows last.
    pub rperm_init: Vec<isize>,
    /// Column degrees under the final ordering, length `n_col + 1`.
    pub cdeg: Vec<isize>,
    /// Row degrees under the final ordering, length `n_row + 1`.
    pub rdeg: Vec<isize>,
    /// `diagonal_map[newcol]` = new row holding the original diagonal of
    /// `cperm_init[newcol]`; present for the symmetric strategy (and the
    /// paru flavor) on square matrices.
    pub diagonal_map: Option<Vec<isize>>,

    // front tree, length nfr + 1 including the dummy placeholder front
    pub nfr: usize,
    pub front_npivcol: Vec<isize>,
    pub front_parent: Vec<isize>,
    pub front_1strow: Vec<isize>,
    pub front_leftmostdesc: Vec<isize>,

    // chains, length nchains + 1
    pub nchains: usize,
    pub chain_start: Vec<isize>,
    /// Always odd, by contract with the numeric kernel's pivot search.
    pub chain_maxrows: Vec<isize>,
    pub chain_maxcols: Vec<isize>,

    /// Initial element sizes when dense rows are present (the column degree
    /// minus entries owned by dense-row elements).
    pub esize: Option<Vec<isize>>,

    // numeric-phase projections
    pub maxnrows: usize,
    pub maxncols: usize,
    pub num_mem_init_usage: usize,
    pub dnum_mem_init_usage: f64,
    pub num_mem_size_est: f64,
    pub num_mem_usage_est: f64,
    /// Off-diagonal upper bounds for L and U.
    pub lnz_bound: f64,
    pub unz_bound: f64,
    /// Total nonzero bound, diagonal counted once.
    pub lunz_bound: f64,
    pub peak_sym_usage: f64,
}

impl Symbolic {
    fn allocate(n_row: usize, n_col: usize, nz: usize, nb: usize) -> Self {
        Self {
            n_row,
            n_col,
            nz,
            nb,
            n1: 0,
            n1r: 0,
            n1c: 0,
            nempty: 0,
            nempty_row: 0,
            nempty_col: 0,
            strategy: Strategy::Unsymmetric,
            ordering: OrderingChoice::None,
            fix_q: false,
            prefer_diagonal: false,
            dense_row_threshold: 0,
            sym: EMPTY as f64,
            nzaat: EMPTY as f64,
            nzdiag: EMPTY as f64,
            amd_dmax: EMPTY as f64,
            amd_lunz: EMPTY as f64,
            cperm_init: vec![EMPTY; n_col + 1],
            rperm_init: vec![EMPTY; n_row + 1],
            cdeg: vec![EMPTY; n_col + 1],
            rdeg: vec![EMPTY; n_row + 1],
            diagonal_map: None,
            nfr: 0,
            front_npivcol: Vec::new(),
            front_parent: Vec::new(),
            front_1strow: Vec::new(),
            front_leftmostdesc: Vec::new(),
            nchains: 0,
            chain_start: Vec::new(),
            chain_maxrows: Vec::new(),
            chain_maxcols: Vec::new(),
            esize: None,
            maxnrows: 1,
            maxncols: 1,
            num_mem_init_usage: 0,
            dnum_mem_init_usage: 0.0,
            num_mem_size_est: 0.0,
            num_mem_usage_est: 0.0,
            lnz_bound: 0.0,
            unz_bound: 0.0,
            lunz_bound: 0.0,
            peak_sym_usage: 0.0,
        }
    }
}

/// Call-scoped working storage of the analysis.
///
/// Released in two tranches: the pruned-matrix arrays go right after the
/// symbolic factorization, the rest lives until the analysis returns (or is
/// handed to the caller by the paru entry point).
#[derive(Debug)]
pub struct SymbolicWorkspace {
    /// Pruned-matrix row indices, freed early.
    pub si: Vec<isize>,
    /// Pruned-matrix column pointers, freed early.
    pub sp: Vec<isize>,
    /// Singleton column ordering, freed early.
    pub cperm1: Vec<isize>,

    /// The shared integer arena; every transient slice is carved from here.
    pub ci: Vec<isize>,
    pub inv_rperm1: Vec<isize>,
    pub rperm1: Vec<isize>,
    pub front_npivcol: Vec<isize>,
    pub front_nrows: Vec<isize>,
    pub front_ncols: Vec<isize>,
    pub front_parent: Vec<isize>,
    /// Row-to-front assignment, indexed by original row.
    pub in_front: Vec<isize>,
}

impl SymbolicWorkspace {
    fn allocate(n_row: usize, n_col: usize, nz: usize, clen: usize) -> Self {
        Self {
            si: vec![0; nz.max(1)],
            sp: vec![0; n_col + 1],
            cperm1: vec![EMPTY; n_col],
            ci: vec![0; clen],
            inv_rperm1: vec![EMPTY; n_row],
            rperm1: vec![EMPTY; n_row],
            front_npivcol: vec![0; n_col + 1],
            front_nrows: vec![0; n_col],
            front_ncols: vec![0; n_col],
            front_parent: vec![0; n_col],
            in_front: vec![EMPTY; n_row],
        }
    }

    /// First release tranche: the pruned matrix and the singleton column
    /// ordering are not needed once the front tree stands.
    fn release_pruned(&mut self) {
        self.si = Vec::new();
        self.sp = Vec::new();
        self.cperm1 = Vec::new();
    }
}

/// Worst-case workspace footprint of the analysis, in Units.
fn sym_work_usage(n_row: usize, n_col: usize, nz: usize, clen: f64) -> f64 {
    dunits_of::<isize>(clen)
        + dunits_of::<isize>(nz as f64)
        + 4.0 * dunits_of::<isize>(n_row as f64)
        + 4.0 * dunits_of::<isize>(n_col as f64)
        + 2.0 * dunits_of::<isize>((n_col + 1) as f64)
}

/// Size of the Symbolic object itself, in Units.
fn symbolic_usage(
    n_row: usize,
    n_col: usize,
    nchains: usize,
    nfr: usize,
    esize: usize,
    prefer_diagonal: bool,
) -> f64 {
    let mut u = 2.0
        + 2.0 * dunits_of::<isize>((n_col + 1) as f64)
        + 2.0 * dunits_of::<isize>((n_row + 1) as f64)
        + 4.0 * dunits_of::<isize>((nfr + 1) as f64)
        + 3.0 * dunits_of::<isize>((nchains + 1) as f64)
        + dunits_of::<isize>(esize as f64);
    if prefer_diagonal {
        u += dunits_of::<isize>((n_col + 1) as f64);
    }
    u
}

/// Extract the pruned submatrix S = A(Rperm1[n1..], Cperm1[n1..]) in
/// compressed-column form, and count its structurally present diagonal
/// entries (skipping numerically zero ones when values are supplied).
fn prune_singletons<S: Scalar>(
    n1: usize,
    n_col: usize,
    ap: &[usize],
    ai: &[usize],
    ax: Option<&[S]>,
    cperm1: &[isize],
    inv_rperm1: &[isize],
    sp: &mut [isize],
    si: &mut [isize],
) -> usize {
    let mut nzdiag = 0usize;
    let mut pp = 0usize;
    for k in n1..n_col {
        let oldcol = cperm1[k] as usize;
        let newcol = k - n1;
        sp[newcol] = pp as isize;
        for p in ap[oldcol]..ap[oldcol + 1] {
            let row = ai[p];
            let newrow = inv_rperm1[row] - n1 as isize;
            if newrow >= 0 {
                si[pp] = newrow;
                pp += 1;
                if newrow as usize == newcol {
                    let structurally = match ax {
                        Some(values) => values[p].is_nonzero(),
                        None => true,
                    };
                    if structurally {
                        nzdiag += 1;
                    }
                }
            }
        }
    }
    sp[n_col - n1] = pp as isize;
    nzdiag
}

/// Splice the fill-reducing inverse permutation of the peeled interior into
/// the singleton ordering: singletons keep their positions, the interior is
/// reordered by `qinv` shifted past them, empty columns stay last.
fn combine_ordering(
    n1: usize,
    nempty_col: usize,
    n_col: usize,
    cperm_init: &mut [isize],
    cperm1: &[isize],
    qinv: &[isize],
) {
    for k in 0..n1 {
        cperm_init[k] = cperm1[k];
    }
    for k in n1..n_col - nempty_col {
        let oldcol = cperm1[k];
        let newcol = k - n1;
        let knew = qinv[newcol] as usize + n1;
        debug_assert!(knew < n_col - nempty_col);
        cperm_init[knew] = oldcol;
    }
    for k in n_col - nempty_col..n_col {
        cperm_init[k] = cperm1[k];
    }
    debug_assert!(crate::utils::is_permutation(&cperm_init[..n_col], n_col));
}

/// Fill-reducing ordering of the peeled interior for the symmetric
/// strategy: flatten the symmetrized pattern into the arena and hand it to
/// the built-in minimum degree or to the caller's collaborator.  Returns
/// the ordering actually used plus the Cholesky projections (dmax, lunz).
#[allow(clippy::too_many_arguments)]
fn order_symmetric<S: Scalar>(
    n2: usize,
    graph: &AatGraph,
    choice: OrderingChoice,
    user_ordering: &mut Option<&mut dyn UserOrdering>,
    control: &Control,
    ci: &mut [isize],
    perm: &mut [isize],
    qinv: &mut [isize],
    info: &mut Info,
) -> AnalyzeResult<(OrderingChoice, f64, f64)> {
    debug_assert!(n2 > 0);

    // the built-in ordering and the callback contract both speak
    // compressed-column slices: n2+1 pointers, nzaat indices in the arena
    let nzaat = graph.stats.nzaat;
    let (pe, rest) = ci.split_at_mut(n2 + 1);
    let (iw, _) = rest.split_at_mut(nzaat.max(1));
    pe[0] = 0;
    let mut p = 0usize;
    for (i, neighbors) in graph.adj.iter().enumerate() {
        for &v in neighbors {
            iw[p] = v as isize;
            p += 1;
        }
        pe[i + 1] = p as isize;
    }
    debug_assert_eq!(p, nzaat);

    match choice {
        OrderingChoice::Amd => {
            let amd_control = AmdControl {
                aggressive: control.aggressive_absorption,
                dense_cutoff: amd_dense_cutoff(control.amd_dense_factor, n2),
            };
            let ainfo = amd::order(n2, pe, iw, &amd_control, perm, qinv);
            let lunz = 2.0 * ainfo.lnz + n2 as f64;
            info.symmetric_lunz = lunz;
            info.symmetric_flops = S::DIV_FLOPS * ainfo.ndiv + S::MULTSUB_FLOPS * ainfo.nms_lu;
            info.symmetric_dmax = ainfo.dmax;
            info.symmetric_ndense = ainfo.ndense as f64;
            Ok((OrderingChoice::Amd, ainfo.dmax, lunz))
        }
        OrderingChoice::None => {
            for k in 0..n2 {
                perm[k] = k as isize;
                qinv[k] = k as isize;
            }
            Ok((OrderingChoice::None, EMPTY as f64, EMPTY as f64))
        }
        OrderingChoice::User
        | OrderingChoice::Cholmod
        | OrderingChoice::Metis
        | OrderingChoice::Best => {
            let Some(user) = user_ordering.as_mut() else {
                return Err(AnalyzeError::OrderingFailed);
            };
            let req = OrderingRequest {
                n_row: n2,
                n_col: n2,
                symmetric: true,
                col_ptr: pe,
                row_idx: iw,
            };
            let mut stats = CholeskyStats::default();
            let ok = user.order(&req, &mut perm[..n2], &mut stats);
            if !ok || !invert_permutation(n2, perm, qinv) {
                return Err(AnalyzeError::OrderingFailed);
            }
            let lunz = if stats.lnz >= 0.0 {
                2.0 * stats.lnz + n2 as f64
            } else {
                EMPTY as f64
            };
            info.symmetric_lunz = lunz;
            info.symmetric_dmax = stats.dmax;
            info.symmetric_ndense = 0.0;
            if stats.flops >= 0.0 {
                // the collaborator reports Cholesky flops; an LU on the same
                // pattern does one multiply-subtract per off-diagonal pair
                info.symmetric_flops =
                    S::DIV_FLOPS * stats.lnz.max(0.0) + S::MULTSUB_FLOPS * (stats.flops - n2 as f64);
            }
            Ok((choice, stats.dmax, lunz))
        }
        OrderingChoice::Given | OrderingChoice::MetisGuard => unreachable!(),
    }
}

/// Dense cutoff of the built-in AMD: a multiple of sqrt(n) with a floor of
/// 16, never above n.
fn amd_dense_cutoff(factor: f64, n: usize) -> usize {
    if factor < 0.0 {
        return n;
    }
    let cutoff = (factor * (n as f64).sqrt()) as usize;
    cutoff.max(16).min(n)
}

/// One complete symbolic analysis.  All three public entry points funnel
/// here; they differ only in which of `quser` / `user_ordering` they accept
/// and whether the workspace is returned.
#[allow(clippy::too_many_arguments)]
fn symbolic_analysis<S: Scalar>(
    n_row: usize,
    n_col: usize,
    ap: &[usize],
    ai: &[usize],
    ax: Option<&[S]>,
    quser: Option<&[isize]>,
    mut user_ordering: Option<&mut dyn UserOrdering>,
    control: &Control,
    info: &mut Info,
    for_paru: bool,
) -> AnalyzeResult<(Symbolic, SymbolicWorkspace)> {
    let clock = Instant::now();

    // --- check inputs and settle the configuration ---------------------
    let mut ordering_option = control.ordering;
    match quser {
        None => {
            // without a given permutation these degrade to natural order
            if ordering_option == OrderingChoice::Given
                || (ordering_option == OrderingChoice::User && user_ordering.is_none())
            {
                ordering_option = OrderingChoice::None;
            }
        }
        Some(_) => {
            ordering_option = OrderingChoice::Given;
        }
    }

    let nb = control.nb();
    info.size_of_unit = UNIT_BYTES as f64;
    info.size_of_int = std::mem::size_of::<isize>() as f64;
    info.size_of_entry = (S::ENTRY_UNITS * UNIT_BYTES) as f64;
    info.n_row = n_row as f64;
    info.n_col = n_col as f64;
    info.symbolic_defrag = 0.0;

    if n_row == 0 || n_col == 0 {
        return Err(AnalyzeError::NNonpositive { n_row, n_col });
    }
    validate_pattern(n_row, n_col, ap, ai)?;
    let nz = ap[n_col];
    info.nz = nz as f64;

    let nn = n_row.max(n_col);
    let n_inner = n_row.min(n_col);

    let mut strategy = control.strategy;
    if n_row != n_col {
        strategy = Strategy::Unsymmetric;
        debug!("rectangular input: forcing the unsymmetric strategy");
    }
    if quser.is_some() && strategy != Strategy::Symmetric {
        strategy = Strategy::Unsymmetric;
    }

    // workspace sizing; the decisive formula is whichever consumer needs
    // the most: the column ordering, the front-tree analysis, or S+S'
    let dnz = nz as f64;
    let dclen_colamd = f64::max(
        2.2 * dnz + 9.0 * n_col as f64 + 6.0 * n_row as f64,
        dnz / 5.0 + 13.0 * n_col as f64 + 6.0 * n_row as f64,
    );
    let dclen_analyze =
        n_col as f64 + f64::max(dnz, n_col as f64) + 3.0 * nn as f64 + 1.0 + n_col as f64;
    let dclen_amd = 2.4 * dnz + 8.0 * n_inner as f64 + 1.0;
    let dclen = dclen_colamd.max(dclen_analyze).max(dclen_amd);

    // the analysis indexes the arena with a machine integer; refuse inputs
    // whose workspace would overflow it rather than risk wraparound
    if dclen * std::mem::size_of::<isize>() as f64 >= isize::MAX as f64 {
        return Err(AnalyzeError::OutOfMemory { clen: dclen });
    }
    let clen = dclen as usize;

    info.symbolic_peak_memory = sym_work_usage(n_row, n_col, nz, dclen)
        + symbolic_usage(n_row, n_col, n_col, n_col, n_col, true);

    let mut symbolic = Symbolic::allocate(n_row, n_col, nz, nb);

    if let Some(q) = quser {
        if q.len() < n_col || !invert_permutation(n_col, q, &mut symbolic.cperm_init) {
            return Err(AnalyzeError::InvalidPermutation { n_col });
        }
    }

    let mut sw = SymbolicWorkspace::allocate(n_row, n_col, nz, clen);

    // --- find the row and column singletons ----------------------------
    let single = singletons::find_singletons(
        n_row,
        n_col,
        ap,
        ai,
        quser,
        control.do_singletons,
        &mut symbolic.cdeg,
        &mut sw.cperm1,
        &mut symbolic.rdeg,
        &mut sw.rperm1,
        &mut sw.inv_rperm1,
        &mut sw.ci,
    );
    let n1 = single.n1;
    let nempty = single.nempty_col.min(single.nempty_row);
    info.col_singletons = single.n1c as f64;
    info.row_singletons = single.n1r as f64;
    info.nempty_col = single.nempty_col as f64;
    info.nempty_row = single.nempty_row as f64;
    info.ndense_col = 0.0;
    info.ndense_row = 0.0;
    info.s_symmetric = single.is_sym as usize as f64;

    symbolic.n1 = n1;
    symbolic.n1r = single.n1r;
    symbolic.n1c = single.n1c;
    symbolic.nempty = nempty;
    symbolic.nempty_row = single.nempty_row;
    symbolic.nempty_col = single.nempty_col;
    debug_assert!(n1 <= n_inner);

    let n2 = nn - n1 - nempty;
    info.n2 = n2 as f64;
    let dense_row_threshold = dense_degree(
        control.dense_row_threshold_factor,
        n_col - n1 - single.nempty_col,
    );
    symbolic.dense_row_threshold = dense_row_threshold;

    if !single.is_sym && strategy != Strategy::Unsymmetric {
        // rectangular interior, or the row and column singletons disagree:
        // the symmetric strategy cannot apply
        strategy = Strategy::Unsymmetric;
        debug!("asymmetric singleton interior: forcing the unsymmetric strategy");
    }

    // --- pattern symmetry, diagonal density, strategy ------------------
    let mut nzdiag = EMPTY;
    let mut sym = EMPTY as f64;
    let mut nzaat = EMPTY;
    let mut aat_graph: Option<AatGraph> = None;

    if strategy != Strategy::Unsymmetric {
        debug_assert!(n_row == n_col && single.nempty_row == single.nempty_col);
        nzdiag = prune_singletons(
            n1,
            n_col,
            ap,
            ai,
            ax,
            &sw.cperm1,
            &sw.inv_rperm1,
            &mut sw.sp,
            &mut sw.si,
        ) as isize;

        let graph = aat::symmetrize(n2, &sw.sp, &sw.si);
        sym = graph.stats.sym;
        nzaat = graph.stats.nzaat as isize;
        aat_graph = Some(graph);

        if strategy == Strategy::Auto {
            if sym >= control.sym_threshold
                && nzdiag as f64 >= control.nnzdiag_threshold * n2 as f64
            {
                strategy = Strategy::Symmetric;
                debug!("auto strategy: symmetric (sym {sym:.3}, nzdiag {nzdiag})");
            } else {
                strategy = Strategy::Unsymmetric;
                debug!("auto strategy: unsymmetric (sym {sym:.3}, nzdiag {nzdiag})");
            }
        }
    }

    symbolic.sym = sym;
    symbolic.nzaat = nzaat as f64;
    symbolic.nzdiag = nzdiag as f64;
    info.pattern_symmetry = sym;
    info.nz_a_plus_at = nzaat as f64;
    info.nzdiag = nzdiag as f64;

    let mut fix_q;
    let prefer_diagonal;
    match strategy {
        Strategy::Symmetric => {
            fix_q = true;
            prefer_diagonal = true;
        }
        _ => {
            fix_q = false;
            prefer_diagonal = false;
        }
    }
    match control.fix_q {
        FixQOverride::PreferFixed => fix_q = true,
        FixQOverride::PreferRefined => fix_q = false,
        FixQOverride::NoOverride => {}
    }

    symbolic.strategy = strategy;
    symbolic.fix_q = fix_q;
    symbolic.prefer_diagonal = prefer_diagonal;
    info.strategy_used = match strategy {
        Strategy::Unsymmetric => 0.0,
        Strategy::Symmetric => 1.0,
        Strategy::Auto => unreachable!(),
    };
    info.qfixed = fix_q as usize as f64;
    info.diag_preferred = prefer_diagonal as usize as f64;

    // --- fill-reducing column ordering ---------------------------------
    let mut do_analyze = true;
    let mut collab_fronts: Option<FrontTreeInfo> = None;

    if strategy == Strategy::Symmetric && quser.is_none() {
        // metis-guard always means metis once the strategy is symmetric
        let choice = match ordering_option {
            OrderingChoice::MetisGuard => OrderingChoice::Metis,
            other => other,
        };
        if n2 > 0 {
            let graph = match aat_graph.as_ref() {
                Some(graph) => graph,
                None => unreachable!(),
            };
            let mut perm = vec![EMPTY; n2];
            let mut qinv = vec![EMPTY; n2];
            let (used, dmax, lunz) = order_symmetric::<S>(
                n2,
                graph,
                choice,
                &mut user_ordering,
                control,
                &mut sw.ci,
                &mut perm,
                &mut qinv,
                info,
            )?;
            symbolic.ordering = used;
            symbolic.amd_dmax = dmax;
            symbolic.amd_lunz = lunz;
            combine_ordering(
                n1,
                nempty,
                n_col,
                &mut symbolic.cperm_init,
                &sw.cperm1,
                &qinv,
            );
        } else {
            symbolic.ordering = OrderingChoice::Amd;
            info.symmetric_lunz = 0.0;
            info.symmetric_flops = 0.0;
            info.symmetric_dmax = 0.0;
            info.symmetric_ndense = 0.0;
            combine_ordering(n1, nempty, n_col, &mut symbolic.cperm_init, &sw.cperm1, &[]);
        }
    }

    if quser.is_some() {
        // the caller's ordering is already folded into cperm1
        symbolic.cperm_init[..n_col].copy_from_slice(&sw.cperm1[..n_col]);
        symbolic.ordering = OrderingChoice::Given;
    }

    if strategy == Strategy::Unsymmetric && quser.is_none() {
        prune_singletons::<S>(
            n1,
            n_col,
            ap,
            ai,
            None,
            &sw.cperm1,
            &sw.inv_rperm1,
            &mut sw.sp,
            &mut sw.si,
        );
        let nrow2 = n_row - n1 - single.nempty_row;
        let ncol2 = n_col - n1 - single.nempty_col;

        let mut choice = ordering_option;
        if choice == OrderingChoice::MetisGuard {
            if nrow2 == 0 || ncol2 == 0 {
                choice = OrderingChoice::Amd;
            } else {
                let guard = dense_degree(control.dense_row_threshold_factor, ncol2);
                choice = if single.max_rdeg > guard {
                    // a dense row makes AᵀA too expensive for a graph
                    // partitioner; fall back to the column ordering
                    OrderingChoice::Amd
                } else {
                    OrderingChoice::Metis
                };
                debug!(
                    "metis-guard: max_rdeg {} vs {}, using {:?}",
                    single.max_rdeg, guard, choice
                );
            }
        }

        if nrow2 == 0 || ncol2 == 0 {
            choice = OrderingChoice::None;
        }

        match choice {
            OrderingChoice::User
            | OrderingChoice::Cholmod
            | OrderingChoice::Metis
            | OrderingChoice::Best => {
                let Some(user) = user_ordering.as_mut() else {
                    return Err(AnalyzeError::OrderingFailed);
                };
                let sp_view = &sw.sp[..ncol2 + 1];
                let si_view = &sw.si[..sp_view[ncol2] as usize];
                let req = OrderingRequest {
                    n_row: nrow2,
                    n_col: ncol2,
                    symmetric: false,
                    col_ptr: sp_view,
                    row_idx: si_view,
                };
                let mut stats = CholeskyStats::default();
                let qq = &mut sw.front_nrows[..ncol2];
                if !user.order(&req, qq, &mut stats) {
                    return Err(AnalyzeError::OrderingFailed);
                }
                let qinv = &mut sw.front_npivcol[..ncol2];
                if !invert_permutation(ncol2, qq, qinv) {
                    return Err(AnalyzeError::OrderingFailed);
                }
                combine_ordering(
                    n1,
                    single.nempty_col,
                    n_col,
                    &mut symbolic.cperm_init,
                    &sw.cperm1,
                    qinv,
                );
                symbolic.ordering = choice;

                if let Some(fronts) = user.take_front_tree() {
                    // the collaborator built the front tree as a by-product;
                    // adopt it and skip the symbolic factorization
                    let nfr = fronts.nfr;
                    debug_assert!(nfr <= ncol2);
                    sw.front_npivcol[..nfr].copy_from_slice(&fronts.npivcol[..nfr]);
                    sw.front_nrows[..nfr].copy_from_slice(&fronts.nrows[..nfr]);
                    sw.front_ncols[..nfr].copy_from_slice(&fronts.ncols[..nfr]);
                    sw.front_parent[..nfr].copy_from_slice(&fronts.parent[..nfr]);
                    collab_fronts = Some(fronts);
                    do_analyze = false;
                }
            }
            OrderingChoice::Amd => {
                let colamd_control = ColamdControl {
                    dense_row_cutoff: dense_degree(control.dense_row_threshold_factor, ncol2),
                    dense_col_cutoff: dense_degree(control.dense_col_threshold_factor, nrow2),
                    aggressive: control.aggressive_absorption,
                };
                let qq = &mut sw.front_nrows[..ncol2];
                let stats = colamd::order(nrow2, ncol2, &sw.sp, &sw.si, &colamd_control, qq);
                info.ndense_row = stats.ndense_row as f64;
                info.ndense_col = stats.ndense_col as f64;
                debug_assert_eq!(stats.nempty_col, 0);
                let qinv = &mut sw.front_npivcol[..ncol2];
                let ok = invert_permutation(ncol2, qq, qinv);
                debug_assert!(ok);
                combine_ordering(
                    n1,
                    single.nempty_col,
                    n_col,
                    &mut symbolic.cperm_init,
                    &sw.cperm1,
                    qinv,
                );
                symbolic.ordering = OrderingChoice::Amd;
            }
            OrderingChoice::None => {
                let qinv = &mut sw.front_npivcol[..ncol2];
                for (k, slot) in qinv.iter_mut().enumerate() {
                    *slot = k as isize;
                }
                combine_ordering(
                    n1,
                    single.nempty_col,
                    n_col,
                    &mut symbolic.cperm_init,
                    &sw.cperm1,
                    qinv,
                );
                symbolic.ordering = OrderingChoice::None;
            }
            OrderingChoice::Given | OrderingChoice::MetisGuard => unreachable!(),
        }
    }

    info.ordering_used = symbolic.ordering.as_code();
    symbolic.cperm_init[n_col] = EMPTY;
    debug!(
        "strategy {:?}, ordering {:?}, fixQ {fix_q}, prefer diagonal {prefer_diagonal}",
        strategy, symbolic.ordering
    );

    // --- symbolic factorization: column etree and fronts ---------------
    let ncol2 = n_col - n1 - single.nempty_col;
    let mut nfr = 0usize;
    let mut nempty_row = single.nempty_row;

    if do_analyze && ncol2 > 0 {
        // pruned pattern under the final column ordering
        prune_singletons::<S>(
            n1,
            n_col,
            ap,
            ai,
            None,
            &symbolic.cperm_init,
            &sw.inv_rperm1,
            &mut sw.sp,
            &mut sw.si,
        );

        // arena layout: element space, then Bp, Link, W, Cperm2
        let clen0 = clen - (nn + 1 + 2 * nn + n_col);
        let (arena, rest) = sw.ci.split_at_mut(clen0);
        let (bp, rest) = rest.split_at_mut(nn + 1);
        let (link, rest) = rest.split_at_mut(nn);
        let (w, cperm2_tail) = rest.split_at_mut(nn);
        let cperm2 = &mut cperm2_tail[..n_col];
        debug_assert!(clen0 >= nz + n_col && clen0 >= 2 * n_col);

        // row order by first touch: scan the ordered columns left to right
        let nrow_s = n_row - n1;
        for slot in w[..nrow_s].iter_mut() {
            *slot = 0;
        }
        let p_order = &mut link[..nrow_s];
        let mut k = 0usize;
        for col in 0..n_col - n1 {
            for p in sw.sp[col] as usize..sw.sp[col + 1] as usize {
                let row = sw.si[p] as usize;
                if w[row] == 0 {
                    w[row] = 1;
                    p_order[k] = row as isize;
                    k += 1;
                }
            }
        }
        // rows never touched are structurally empty; they go last
        nempty_row = nrow_s - k;
        debug_assert_eq!(nempty_row, single.nempty_row);
        for row in 0..nrow_s {
            if w[row] == 0 {
                p_order[k] = row as isize;
                k += 1;
            }
        }
        debug_assert_eq!(k, nrow_s);

        // B = (S(P, :))ᵀ at the tail of the element space
        let snz = sw.sp[n_col - n1] as usize;
        let bsize = snz.max(1);
        let clen2 = clen0 - bsize;
        {
            let (_, bi) = arena.split_at_mut(clen2);
            transpose_pattern(nrow_s, ncol2, &sw.sp, &sw.si, Some(&*p_order), bp, bi, w);
        }
        for v in bp[..nrow_s + 1].iter_mut() {
            *v += clen2 as isize;
        }

        let result = front_tree::analyze(
            nrow_s,
            ncol2,
            &sw.sp,
            &sw.si,
            fix_q,
            arena,
            bp,
            link,
            w,
            cperm2,
            &mut sw.front_npivcol,
            &mut sw.front_nrows,
            &mut sw.front_ncols,
            &mut sw.front_parent,
        )?;
        nfr = result.nfr;
        info.symbolic_defrag += result.compactions as f64;

        if !fix_q {
            // fold the postorder into the column permutation; the empty
            // columns stay at the end untouched
            for k in 0..ncol2 {
                w[k] = symbolic.cperm_init[n1 + cperm2[k] as usize];
            }
            symbolic.cperm_init[n1..n1 + ncol2].copy_from_slice(&w[..ncol2]);
        }
        debug_assert!(crate::utils::is_permutation(
            &symbolic.cperm_init[..n_col],
            n_col
        ));
    } else if let Some(fronts) = &collab_fronts {
        nfr = fronts.nfr;
    }

    // first release tranche
    sw.release_pruned();

    // --- finalize the front tree ---------------------------------------
    let nchains = (0..nfr)
        .filter(|&i| sw.front_parent[i] != i as isize + 1)
        .count();
    symbolic.nchains = nchains;
    symbolic.nfr = nfr;
    let esize_len = if single.max_rdeg > dense_row_threshold {
        ncol2
    } else {
        0
    };

    info.symbolic_size = symbolic_usage(n_row, n_col, nchains, nfr, esize_len, prefer_diagonal);
    info.symbolic_peak_memory =
        sym_work_usage(n_row, n_col, nz, dclen) + info.symbolic_size;
    symbolic.peak_sym_usage = info.symbolic_peak_memory;

    symbolic.front_npivcol = vec![EMPTY; nfr + 1];
    symbolic.front_parent = vec![EMPTY; nfr + 1];
    symbolic.front_1strow = vec![0; nfr + 1];
    symbolic.front_leftmostdesc = vec![EMPTY; nfr + 1];
    symbolic.chain_start = vec![0; nchains + 1];
    symbolic.chain_maxrows = vec![0; nchains + 1];
    symbolic.chain_maxcols = vec![0; nchains + 1];

    // row-to-front assignment
    match &collab_fronts {
        None => {
            fronts::assign_rows_from_scratch(
                n_row,
                n1,
                nfr,
                ap,
                ai,
                &symbolic.cperm_init,
                &sw.rperm1,
                &sw.front_npivcol,
                &mut sw.in_front,
                &mut symbolic.front_1strow,
            );
        }
        Some(fronts) => {
            fronts::assign_rows_from_ordering(
                n_row,
                n1,
                nempty_row,
                nfr,
                &sw.rperm1,
                &fronts.in_front,
                &mut sw.in_front,
                &mut symbolic.front_1strow,
            );
        }
    }

    // per-front pivot counts and parents move into the result; the dummy
    // placeholder front nfr absorbs the leftover empty columns and rows
    let mut k = n1;
    for i in 0..nfr {
        symbolic.front_npivcol[i] = sw.front_npivcol[i];
        symbolic.front_parent[i] = sw.front_parent[i];
        k += sw.front_npivcol[i] as usize;
    }
    symbolic.front_npivcol[nfr] = (n_col - k) as isize;
    symbolic.front_parent[nfr] = EMPTY;

    {
        let cursor = &mut sw.ci[..nfr + 1];
        fronts::fill_rperm_init(
            n_row,
            n1,
            nfr,
            &sw.rperm1,
            &sw.in_front,
            &mut symbolic.front_1strow,
            cursor,
            &mut symbolic.rperm_init,
        );
    }
    debug_assert!(crate::utils::is_permutation(
        &symbolic.rperm_init[..n_row],
        n_row
    ));

    // diagonal map
    if (prefer_diagonal || for_paru) && n_row == n_col {
        let inv_rperm = &mut sw.ci[..n_row];
        for newrow in 0..n_row {
            inv_rperm[symbolic.rperm_init[newrow] as usize] = newrow as isize;
        }
        let mut map = vec![EMPTY; n_col + 1];
        fronts::compute_diagonal_map(nn, &symbolic.cperm_init, inv_rperm, &mut map);
        map[n_col] = EMPTY;
        symbolic.diagonal_map = Some(map);
    }

    fronts::leftmost_descendants(
        nfr,
        &symbolic.front_parent,
        &mut symbolic.front_leftmostdesc,
    );

    let layout = fronts::build_chains(
        nfr,
        &sw.front_nrows,
        &sw.front_ncols,
        &symbolic.front_parent,
        &mut symbolic.chain_start,
        &mut symbolic.chain_maxrows,
        &mut symbolic.chain_maxcols,
    );
    debug_assert_eq!(layout.nchains, nchains);
    symbolic.maxnrows = layout.maxnrows as usize;
    symbolic.maxncols = layout.maxncols as usize;

    // initial element sizes, computed against the original-index degrees
    if esize_len > 0 {
        let inv_rperm = &mut sw.ci[..n_row];
        for newrow in 0..n_row {
            inv_rperm[symbolic.rperm_init[newrow] as usize] = newrow as isize;
        }
        let mut esize = vec![0isize; esize_len];
        fronts::compute_esize(
            n_col,
            n1,
            single.nempty_col,
            dense_row_threshold,
            ap,
            ai,
            &symbolic.cperm_init,
            inv_rperm,
            &symbolic.cdeg,
            &symbolic.rdeg,
            &mut esize,
        );
        symbolic.esize = Some(esize);
    }

    // degrees switch from original indexing to the final orderings
    {
        let scratch = &mut sw.ci[..nn];
        fronts::permute_degrees(n_col, &symbolic.cperm_init, &mut symbolic.cdeg, scratch);
        fronts::permute_degrees(n_row, &symbolic.rperm_init, &mut symbolic.rdeg, scratch);
    }
    symbolic.cdeg[n_col] = EMPTY;
    symbolic.rdeg[n_row] = EMPTY;

    // --- simulate the numeric kernel -----------------------------------
    let sim = {
        let link = &mut sw.ci[..nfr.max(1)];
        simulate::simulate_kernel::<S>(
            n_row,
            n_col,
            n1,
            nempty_row,
            single.nempty_col,
            nfr,
            nchains,
            nb,
            dense_row_threshold,
            &symbolic.cdeg,
            &symbolic.rdeg,
            symbolic.esize.as_deref(),
            &symbolic.front_npivcol,
            &symbolic.front_parent,
            &sw.front_nrows,
            &sw.front_ncols,
            &symbolic.chain_start,
            &symbolic.chain_maxrows,
            &symbolic.chain_maxcols,
            link,
        )
    };

    if symbolic.esize.is_some() {
        info.ndense_row = sim.ndense_row as f64;
    }
    symbolic.num_mem_init_usage = sim.num_mem_init_usage;
    symbolic.dnum_mem_init_usage = sim.dnum_mem_init_usage;
    info.variable_init_estimate = sim.dnum_mem_init_usage;
    // the arena can never shrink below what the initial elements filled
    symbolic.num_mem_size_est = sim.dhead_usage.max(sim.dnum_mem_init_usage);
    symbolic.num_mem_usage_est = sim.dmax_usage.max(symbolic.num_mem_size_est);
    symbolic.lnz_bound = sim.dlnz - n_inner as f64;
    symbolic.unz_bound = sim.dunz - n_inner as f64;
    symbolic.lunz_bound = sim.dlnz + sim.dunz - n_inner as f64;

    set_stats(
        info,
        &NumericEstimates {
            max_usage: symbolic.num_mem_usage_est,
            head_usage: symbolic.num_mem_size_est,
            flops: sim.flops,
            lnz: sim.dlnz,
            unz: sim.dunz,
            max_front_size: layout.dmaxfrsize,
            max_front_nrows: symbolic.maxnrows as f64,
            max_front_ncols: symbolic.maxncols as f64,
        },
        n_row,
        n_col,
        n_inner,
        S::ENTRY_UNITS,
    );

    info.symbolic_walltime = clock.elapsed().as_secs_f64();
    info.set_status(Status::Ok);

    Ok((symbolic, sw))
}

fn run<T>(
    info: &mut Info,
    f: impl FnOnce(&mut Info) -> AnalyzeResult<T>,
) -> AnalyzeResult<T> {
    match f(info) {
        Ok(v) => Ok(v),
        Err(e) => {
            info.set_status(e.status());
            Err(e)
        }
    }
}

/// Symbolic analysis with an optional caller-supplied column ordering.
///
/// `ap`/`ai` is the compressed-column pattern of A (sorted, duplicate-free
/// columns); `ax` supplies numerical values only so the diagonal-density
/// strategy signal can skip explicitly stored zeros.  `quser`, when given,
/// must be a permutation of `0..n_col` and is used as-is.
pub fn qsymbolic<S: Scalar>(
    n_row: usize,
    n_col: usize,
    ap: &[usize],
    ai: &[usize],
    ax: Option<&[S]>,
    quser: Option<&[isize]>,
    control: &Control,
    info: &mut Info,
) -> AnalyzeResult<Symbolic> {
    run(info, |info| {
        symbolic_analysis(n_row, n_col, ap, ai, ax, quser, None, control, info, false)
            .map(|(symbolic, _)| symbolic)
    })
}

/// Symbolic analysis with a caller-supplied fill-reducing ordering
/// collaborator instead of a fixed permutation.
pub fn fsymbolic<S: Scalar>(
    n_row: usize,
    n_col: usize,
    ap: &[usize],
    ai: &[usize],
    ax: Option<&[S]>,
    user_ordering: &mut dyn UserOrdering,
    control: &Control,
    info: &mut Info,
) -> AnalyzeResult<Symbolic> {
    run(info, |info| {
        symbolic_analysis(
            n_row,
            n_col,
            ap,
            ai,
            ax,
            None,
            Some(user_ordering),
            control,
            info,
            false,
        )
        .map(|(symbolic, _)| symbolic)
    })
}

/// Symbolic analysis that also hands the call-scoped workspace back to the
/// caller, for consumers that continue the analysis (and always want the
/// diagonal map on square matrices).  A given `quser` wins over the
/// ordering collaborator.
#[allow(clippy::too_many_arguments)]
pub fn paru_symbolic<S: Scalar>(
    n_row: usize,
    n_col: usize,
    ap: &[usize],
    ai: &[usize],
    ax: Option<&[S]>,
    quser: Option<&[isize]>,
    user_ordering: Option<&mut dyn UserOrdering>,
    control: &Control,
    info: &mut Info,
) -> AnalyzeResult<(Symbolic, SymbolicWorkspace)> {
    run(info, |info| {
        symbolic_analysis(
            n_row,
            n_col,
            ap,
            ai,
            ax,
            quser,
            user_ordering,
            control,
            info,
            true,
        )
    })
}
