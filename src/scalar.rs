use num_complex::Complex64;

/// Numerical entry type of the matrix being analyzed.
///
/// The analysis itself is purely structural; values are consulted in exactly
/// two places.  Singleton peeling counts truly-nonzero diagonal entries when
/// values are supplied, and the resource simulation needs the storage size of
/// one entry plus the per-operation flop weights of the downstream kernel.
pub trait Scalar: Copy {
    /// True if the entry is not exactly zero.
    fn is_nonzero(&self) -> bool;

    /// Storage size of one entry, in Units (multiples of 8 bytes).
    const ENTRY_UNITS: usize;

    /// Flop cost of one divide by a pivot.
    const DIV_FLOPS: f64;

    /// Flop cost of one multiply-subtract pair.
    const MULTSUB_FLOPS: f64;
}

impl Scalar for f64 {
    fn is_nonzero(&self) -> bool {
        *self != 0.0
    }

    const ENTRY_UNITS: usize = 1;
    const DIV_FLOPS: f64 = 1.0;
    const MULTSUB_FLOPS: f64 = 2.0;
}

impl Scalar for Complex64 {
    fn is_nonzero(&self) -> bool {
        self.re != 0.0 || self.im != 0.0
    }

    const ENTRY_UNITS: usize = 2;
    // one complex divide; one complex multiply plus subtract
    const DIV_FLOPS: f64 = 9.0;
    const MULTSUB_FLOPS: f64 = 8.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_zero_detection() {
        assert!(1e-300f64.is_nonzero());
        assert!(!0.0f64.is_nonzero());
        assert!(!(-0.0f64).is_nonzero());
    }

    #[test]
    fn complex_zero_detection() {
        assert!(Complex64::new(0.0, 2.0).is_nonzero());
        assert!(!Complex64::new(0.0, 0.0).is_nonzero());
        assert_eq!(Complex64::ENTRY_UNITS, 2);
    }
}
