use crate::error::Status;
use crate::utils::UNIT_BYTES;

const NOT_COMPUTED: f64 = -1.0;

/// Statistics report of one symbolic analysis.
///
/// Every slot is a double, initialized to -1.0 ("not computed"), mirroring
/// the classic info-vector convention so a caller can diff reports across
/// runs.  Slots are filled progressively: the input section before any
/// fallible work, the strategy/ordering section as the pipeline proceeds,
/// and the numeric-phase estimates by [`set_stats`] at the very end.
#[derive(Debug, Clone)]
pub struct Info {
    /// Status code of the analysis (see [`Status::code`]); 0 is success.
    pub status: f64,

    // input matrix
    pub n_row: f64,
    pub n_col: f64,
    pub nz: f64,
    pub size_of_unit: f64,
    pub size_of_int: f64,
    pub size_of_entry: f64,

    // singleton peel
    pub col_singletons: f64,
    pub row_singletons: f64,
    pub nempty_row: f64,
    pub nempty_col: f64,
    /// 1.0 when the peeled interior is pattern-symmetric.
    pub s_symmetric: f64,
    /// Dimension of the pruned square problem, nn - n1 - nempty.
    pub n2: f64,

    // strategy signal
    pub pattern_symmetry: f64,
    pub nzdiag: f64,
    pub nz_a_plus_at: f64,

    // decisions
    pub strategy_used: f64,
    pub ordering_used: f64,
    pub qfixed: f64,
    pub diag_preferred: f64,

    // dense structure
    pub ndense_row: f64,
    pub ndense_col: f64,

    // symbolic phase resources
    pub symbolic_defrag: f64,
    pub symbolic_peak_memory: f64,
    pub symbolic_size: f64,
    pub symbolic_walltime: f64,

    // symmetric-ordering statistics (AMD or callback, when taken)
    pub symmetric_lunz: f64,
    pub symmetric_flops: f64,
    pub symmetric_dmax: f64,
    pub symmetric_ndense: f64,

    // numeric-phase projections
    pub variable_init_estimate: f64,
    pub variable_peak_estimate: f64,
    pub variable_final_estimate: f64,
    pub numeric_size_estimate: f64,
    pub peak_memory_estimate: f64,
    pub flops_estimate: f64,
    pub lnz_estimate: f64,
    pub unz_estimate: f64,
    pub max_front_size_estimate: f64,
    pub max_front_nrows_estimate: f64,
    pub max_front_ncols_estimate: f64,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            status: NOT_COMPUTED,
            n_row: NOT_COMPUTED,
            n_col: NOT_COMPUTED,
            nz: NOT_COMPUTED,
            size_of_unit: NOT_COMPUTED,
            size_of_int: NOT_COMPUTED,
            size_of_entry: NOT_COMPUTED,
            col_singletons: NOT_COMPUTED,
            row_singletons: NOT_COMPUTED,
            nempty_row: NOT_COMPUTED,
            nempty_col: NOT_COMPUTED,
            s_symmetric: NOT_COMPUTED,
            n2: NOT_COMPUTED,
            pattern_symmetry: NOT_COMPUTED,
            nzdiag: NOT_COMPUTED,
            nz_a_plus_at: NOT_COMPUTED,
            strategy_used: NOT_COMPUTED,
            ordering_used: NOT_COMPUTED,
            qfixed: NOT_COMPUTED,
            diag_preferred: NOT_COMPUTED,
            ndense_row: NOT_COMPUTED,
            ndense_col: NOT_COMPUTED,
            symbolic_defrag: NOT_COMPUTED,
            symbolic_peak_memory: NOT_COMPUTED,
            symbolic_size: NOT_COMPUTED,
            symbolic_walltime: NOT_COMPUTED,
            symmetric_lunz: NOT_COMPUTED,
            symmetric_flops: NOT_COMPUTED,
            symmetric_dmax: NOT_COMPUTED,
            symmetric_ndense: NOT_COMPUTED,
            variable_init_estimate: NOT_COMPUTED,
            variable_peak_estimate: NOT_COMPUTED,
            variable_final_estimate: NOT_COMPUTED,
            numeric_size_estimate: NOT_COMPUTED,
            peak_memory_estimate: NOT_COMPUTED,
            flops_estimate: NOT_COMPUTED,
            lnz_estimate: NOT_COMPUTED,
            unz_estimate: NOT_COMPUTED,
            max_front_size_estimate: NOT_COMPUTED,
            max_front_nrows_estimate: NOT_COMPUTED,
            max_front_ncols_estimate: NOT_COMPUTED,
        }
    }
}

impl Info {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status.code();
    }

    /// Status decoded back from the numeric slot.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok.code()
    }
}

/// Inputs to the numeric-phase projection, gathered by the resource
/// simulation.
pub(crate) struct NumericEstimates {
    /// Estimated peak size of the numeric working arena, in Units.
    pub max_usage: f64,
    /// Estimated final size of the arena (the finalized LU factors).
    pub head_usage: f64,
    pub flops: f64,
    pub lnz: f64,
    pub unz: f64,
    /// Largest chain frontal matrix, maxrows * maxcols.
    pub max_front_size: f64,
    pub max_front_nrows: f64,
    pub max_front_ncols: f64,
}

/// Fill the caller-visible numeric-phase projections.
///
/// The fixed part of the numeric object (permutations, pivot values, scale
/// factors, the upper-bound column pattern) is sized here and added to the
/// variable arena estimates to produce whole-object numbers, in Units.
pub(crate) fn set_stats(
    info: &mut Info,
    est: &NumericEstimates,
    n_row: usize,
    n_col: usize,
    n_inner: usize,
    entry_units: usize,
) {
    let int_units = |n: f64| crate::utils::dunits_of::<isize>(n);
    let ent_units = |n: f64| (entry_units as f64 * n).ceil();

    // Numeric object outside the working arena: row and column permutations
    // and their inverses, pivot values, row scale factors, and the refined
    // column pattern kept for pivot searching.
    let fixed = 2.0 * int_units(n_row as f64)
        + 2.0 * int_units(n_col as f64)
        + ent_units(n_inner as f64)
        + ent_units(n_row as f64)
        + int_units(n_col as f64);

    info.variable_peak_estimate = est.max_usage;
    info.variable_final_estimate = est.head_usage;
    info.numeric_size_estimate = (fixed + est.head_usage) * UNIT_BYTES as f64;
    info.peak_memory_estimate = (fixed + est.max_usage) * UNIT_BYTES as f64;
    info.flops_estimate = est.flops;
    info.lnz_estimate = est.lnz;
    info.unz_estimate = est.unz;
    info.max_front_size_estimate = est.max_front_size;
    info.max_front_nrows_estimate = est.max_front_nrows;
    info.max_front_ncols_estimate = est.max_front_ncols;
}
