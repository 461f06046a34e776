use thiserror::Error;

/// Numeric status codes mirrored into [`crate::Info::status`].
///
/// Negative codes match the convention of the classic solver interfaces:
/// success is zero, hard errors are negative.  The code is recorded in the
/// report even when the call returns `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    ArgumentMissing,
    NNonpositive,
    InvalidMatrix,
    InvalidPermutation,
    OutOfMemory,
    OrderingFailed,
    InternalError,
}

impl Status {
    pub fn code(self) -> f64 {
        match self {
            Status::Ok => 0.0,
            Status::ArgumentMissing => -1.0,
            Status::NNonpositive => -2.0,
            Status::InvalidMatrix => -3.0,
            Status::InvalidPermutation => -4.0,
            Status::OutOfMemory => -5.0,
            Status::OrderingFailed => -6.0,
            Status::InternalError => -911.0,
        }
    }
}

/// Errors produced by the symbolic analysis.
///
/// Errors are reported, not retried: an ordering failure is terminal and the
/// pipeline never re-invokes a collaborator.  On any error the caller
/// receives no `Symbolic` object; partially built state is dropped.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The column pointer array is too short to describe `n_col` columns.
    #[error("column pointer array has {len} entries, need n_col+1 = {required}")]
    ArgumentMissing { len: usize, required: usize },

    /// One of the matrix dimensions is zero.
    #[error("matrix dimensions must be positive (n_row={n_row}, n_col={n_col})")]
    NNonpositive { n_row: usize, n_col: usize },

    /// Column pointers not monotone, or they disagree with the index array.
    #[error("invalid column pointers at column {col} (start {start}, end {end})")]
    InvalidColumnPointers { col: usize, start: isize, end: isize },

    /// A row index is out of range or breaks the sorted, duplicate-free
    /// per-column order.
    #[error("invalid row index {row} in column {col}")]
    InvalidRowIndex { col: usize, row: isize },

    /// The row index array is shorter than the entry count claims.
    #[error("row index array has {len} entries, column pointers claim {nz}")]
    IndexArrayTooShort { len: usize, nz: usize },

    /// A user-supplied column ordering is not a permutation of `0..n_col`.
    #[error("user column ordering is not a permutation of 0..{n_col}")]
    InvalidPermutation { n_col: usize },

    /// The workspace estimate does not fit the index type in use; the
    /// problem needs the wider-integer build.
    #[error("workspace of {clen:.0} indices exceeds the addressable range")]
    OutOfMemory { clen: f64 },

    /// The fill-reducing ordering collaborator reported failure or returned
    /// an invalid permutation.
    #[error("fill-reducing ordering failed")]
    OrderingFailed,

    /// Pre-sized workspace was exhausted inside the symbolic factorization.
    #[error("internal error: {context}")]
    Internal { context: &'static str },
}

impl AnalyzeError {
    pub fn status(&self) -> Status {
        match self {
            AnalyzeError::ArgumentMissing { .. } => Status::ArgumentMissing,
            AnalyzeError::NNonpositive { .. } => Status::NNonpositive,
            AnalyzeError::InvalidColumnPointers { .. }
            | AnalyzeError::InvalidRowIndex { .. }
            | AnalyzeError::IndexArrayTooShort { .. } => Status::InvalidMatrix,
            AnalyzeError::InvalidPermutation { .. } => Status::InvalidPermutation,
            AnalyzeError::OutOfMemory { .. } => Status::OutOfMemory,
            AnalyzeError::OrderingFailed => Status::OrderingFailed,
            AnalyzeError::Internal { .. } => Status::InternalError,
        }
    }
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;
