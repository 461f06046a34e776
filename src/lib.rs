//! Symbolic analysis for a multifrontal sparse unsymmetric LU factorization.
//!
//! Given a sparse matrix in compressed-column form, the analysis selects a
//! fill-reducing column permutation and an initial row permutation, peels
//! row/column singletons, picks a pivoting strategy (symmetric vs.
//! unsymmetric), builds the frontal-matrix tree with its chain
//! decomposition, and simulates the numeric kernel's memory discipline to
//! bound the memory, nonzeros, and floating-point work the factorization
//! will need.
//!
//! The entry points mirror the classic interface:
//! [`qsymbolic`] takes an optional user column ordering, [`fsymbolic`] a
//! fill-reducing ordering collaborator, and [`paru_symbolic`] additionally
//! returns the call-scoped workspace for consumers that continue the
//! analysis.
//!
//! ```
//! use frontal::{qsymbolic, Control, Info};
//!
//! // a 3x3 tridiagonal pattern
//! let ap = [0usize, 2, 5, 7];
//! let ai = [0usize, 1, 0, 1, 2, 1, 2];
//! let ax = [2.0, -1.0, -1.0, 2.0, -1.0, -1.0, 2.0];
//!
//! let mut info = Info::new();
//! let symbolic = qsymbolic::<f64>(3, 3, &ap, &ai, Some(&ax), None,
//!     &Control::default(), &mut info).unwrap();
//! assert_eq!(symbolic.n_row, 3);
//! assert!(info.is_ok());
//! ```

pub mod analyze;
pub mod config;
pub mod error;
pub mod info;
pub mod matrix;
pub mod ordering;
pub mod scalar;
mod utils;

pub use analyze::{Symbolic, SymbolicWorkspace, fsymbolic, paru_symbolic, qsymbolic};
pub use config::{Control, FixQOverride, OrderingChoice, Strategy};
pub use error::{AnalyzeError, AnalyzeResult, Status};
pub use info::Info;
pub use matrix::builder::MatrixBuilder;
pub use matrix::csc::CscMatrix;
pub use ordering::{CholeskyStats, FrontTreeInfo, OrderingRequest, UserOrdering};
pub use scalar::Scalar;
pub use utils::EMPTY;
