/// Pivoting strategy for the downstream numeric factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Decide from pattern symmetry and diagonal density after peeling.
    Auto,
    /// Column ordering refined during factorization, no diagonal preference.
    Unsymmetric,
    /// Column ordering fixed, diagonal pivoting preferred.  Requires a
    /// square matrix whose peeled interior is pattern-symmetric.
    Symmetric,
}

/// Override for whether the column ordering is fixed during factorization.
///
/// The strategy implies a default (symmetric fixes Q, unsymmetric refines
/// it); this knob forces either answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixQOverride {
    NoOverride,
    PreferFixed,
    PreferRefined,
}

/// Which fill-reducing ordering collaborator to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingChoice {
    /// Use the caller's column ordering as-is (selected automatically when
    /// one is supplied).
    Given,
    /// Built-in default: AMD on S+Sᵀ for the symmetric strategy, COLAMD on S
    /// otherwise.
    Amd,
    /// No fill-reducing ordering; natural order of the peeled interior.
    None,
    /// The caller's ordering callback.
    User,
    /// External collaborators, reached through the callback interface.
    Cholmod,
    Metis,
    Best,
    /// METIS unless the pruned matrix has a dense row that would make AᵀA
    /// expensive, COLAMD in that case.
    MetisGuard,
}

impl OrderingChoice {
    pub(crate) fn as_code(self) -> f64 {
        match self {
            OrderingChoice::Given => 2.0,
            OrderingChoice::Amd => 0.0,
            OrderingChoice::None => 4.0,
            OrderingChoice::User => 3.0,
            OrderingChoice::Cholmod => 1.0,
            OrderingChoice::Metis => 5.0,
            OrderingChoice::Best => 6.0,
            OrderingChoice::MetisGuard => 7.0,
        }
    }
}

/// Tunable parameters of the symbolic analysis.
#[derive(Debug, Clone)]
pub struct Control {
    /// Scales the "dense row" degree cutoff of the pruned matrix.
    pub dense_row_threshold_factor: f64,
    /// Scales the "dense column" degree cutoff handed to COLAMD.
    pub dense_col_threshold_factor: f64,
    /// Panel size of the downstream numeric kernel.  Clamped to at least 2
    /// and rounded up to an even number.
    pub block_size: usize,
    pub strategy: Strategy,
    pub fix_q: FixQOverride,
    /// Allow the singleton-peeling stage to remove degree-1 rows/columns.
    pub do_singletons: bool,
    pub ordering: OrderingChoice,
    /// Passed through to the AMD/COLAMD collaborators.
    pub aggressive_absorption: bool,
    /// Auto strategy picks symmetric when the pattern symmetry of the peeled
    /// interior is at least this fraction ...
    pub sym_threshold: f64,
    /// ... and at least this fraction of its diagonal is nonzero.
    pub nnzdiag_threshold: f64,
    /// Dense-row multiplier for the built-in AMD (rows denser than
    /// `amd_dense_factor * sqrt(n)` are postponed).
    pub amd_dense_factor: f64,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            dense_row_threshold_factor: 0.2,
            dense_col_threshold_factor: 0.2,
            block_size: 32,
            strategy: Strategy::Auto,
            fix_q: FixQOverride::NoOverride,
            do_singletons: true,
            ordering: OrderingChoice::Amd,
            aggressive_absorption: true,
            sym_threshold: 0.5,
            nnzdiag_threshold: 0.9,
            amd_dense_factor: 10.0,
        }
    }
}

impl Control {
    /// Effective block size: at least 2, even.
    pub(crate) fn nb(&self) -> usize {
        let nb = self.block_size.max(2);
        if nb % 2 == 1 { nb + 1 } else { nb }
    }
}

/// Degree above which a row or column of an n-wide matrix counts as dense.
///
/// A row with 16 or fewer entries is never dense; the cutoff never exceeds n.
pub(crate) fn dense_degree(alpha: f64, n: usize) -> usize {
    if alpha < 0.0 {
        // negative factor disables the dense classification entirely
        return n;
    }
    let cutoff = (alpha * 16.0 * (n as f64).sqrt()) as usize;
    cutoff.max(16).min(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_is_clamped_and_even() {
        let mut c = Control::default();
        c.block_size = 1;
        assert_eq!(c.nb(), 2);
        c.block_size = 7;
        assert_eq!(c.nb(), 8);
        c.block_size = 32;
        assert_eq!(c.nb(), 32);
    }

    #[test]
    fn dense_cutoff_has_floor_and_ceiling() {
        assert_eq!(dense_degree(0.2, 4), 4);
        assert_eq!(dense_degree(0.2, 100_000), 1011);
        assert_eq!(dense_degree(-1.0, 50), 50);
        // small matrices: the floor of 16 clamps to n
        assert_eq!(dense_degree(0.2, 10), 10);
    }
}
