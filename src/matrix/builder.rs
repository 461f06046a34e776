use crate::error::{AnalyzeError, AnalyzeResult};
use crate::matrix::Dim;
use crate::matrix::csc::CscMatrix;
use crate::scalar::Scalar;

/// Builder from COO triplets to canonical CSC.
///
/// Entries may arrive in any order; duplicates are summed at build time and
/// explicit zeros are kept (the analysis treats a stored zero as a
/// structural entry, only the diagonal-count statistic looks at values).
#[derive(Debug)]
pub struct MatrixBuilder<S: Scalar = f64> {
    dim: Dim,
    /// (column, row, value)
    entries: Vec<(usize, usize, S)>,
}

impl<S: Scalar + std::ops::Add<Output = S>> MatrixBuilder<S> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            dim: Dim { nrows, ncols },
            entries: Vec::new(),
        }
    }

    pub fn reserve(&mut self, nnz: usize) {
        self.entries.reserve(nnz);
    }

    pub fn push(&mut self, column: usize, row: usize, value: S) -> AnalyzeResult<()> {
        if column >= self.dim.ncols {
            return Err(AnalyzeError::InvalidColumnPointers {
                col: column,
                start: 0,
                end: self.dim.ncols as isize,
            });
        }
        if row >= self.dim.nrows {
            return Err(AnalyzeError::InvalidRowIndex {
                col: column,
                row: row as isize,
            });
        }
        self.entries.push((column, row, value));
        Ok(())
    }

    pub fn build(mut self) -> AnalyzeResult<CscMatrix<S>> {
        let n = self.dim.ncols;
        self.entries.sort_by_key(|&(c, r, _)| (c, r));

        // combine duplicates
        let mut combined: Vec<(usize, usize, S)> = Vec::with_capacity(self.entries.len());
        for (c, r, v) in self.entries {
            if let Some(last) = combined.last_mut() {
                if last.0 == c && last.1 == r {
                    last.2 = last.2 + v;
                    continue;
                }
            }
            combined.push((c, r, v));
        }

        let mut column_pointers = vec![0usize; n + 1];
        for &(c, _, _) in &combined {
            column_pointers[c + 1] += 1;
        }
        for j in 0..n {
            column_pointers[j + 1] += column_pointers[j];
        }

        let nnz = combined.len();
        let mut row_indices = vec![0usize; nnz];
        let mut values = Vec::with_capacity(nnz);
        for (k, (_, r, v)) in combined.into_iter().enumerate() {
            row_indices[k] = r;
            values.push(v);
        }

        let a = CscMatrix {
            dim: self.dim,
            column_pointers,
            row_indices,
            values,
        };
        a.check_invariants()?;
        Ok(a)
    }
}

/// Shorthand used all over the tests: a unit-valued pattern matrix from
/// (column, row) pairs.
pub fn pattern_matrix(nrows: usize, ncols: usize, entries: &[(usize, usize)]) -> CscMatrix {
    let mut b = MatrixBuilder::new(nrows, ncols);
    for &(c, r) in entries {
        b.push(c, r, 1.0).unwrap();
    }
    b.build().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_summed() {
        let mut b = MatrixBuilder::new(3, 3);
        b.push(2, 2, 30.0).unwrap();
        b.push(2, 2, 5.0).unwrap();
        b.push(0, 0, 1.0).unwrap();
        let a = b.build().unwrap();
        assert_eq!(a.nnz(), 2);
        let (rows, vals) = a.col(2);
        assert_eq!(rows, &[2]);
        assert_eq!(vals, &[35.0]);
    }

    #[test]
    fn out_of_order_input_is_sorted() {
        let a = pattern_matrix(4, 3, &[(2, 3), (0, 1), (2, 0), (0, 0)]);
        assert_eq!(a.column_pointers, vec![0, 2, 2, 4]);
        assert_eq!(a.row_indices, vec![0, 1, 0, 3]);
    }

    #[test]
    fn explicit_zeros_are_kept() {
        let mut b = MatrixBuilder::new(2, 2);
        b.push(0, 0, 0.0).unwrap();
        b.push(1, 1, 2.0).unwrap();
        let a = b.build().unwrap();
        assert_eq!(a.nnz(), 2);
    }

    #[test]
    fn rejects_out_of_range_triplets() {
        let mut b: MatrixBuilder = MatrixBuilder::new(2, 2);
        assert!(b.push(2, 0, 1.0).is_err());
        assert!(b.push(0, 2, 1.0).is_err());
    }
}
