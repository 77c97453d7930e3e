//! QCQP solver for temporal instanton analysis.
//!
//! Minimizes a quadratic objective subject to linear equality constraints and
//! exactly one quadratic equality (the thermal limit condition). The solver
//! translates to a feasible point, rotates onto the constraint null space,
//! diagonalizes the thermal form, eliminates the directions it does not
//! weight, and reduces what remains to a scalar secular equation whose real
//! roots enumerate every stationary point.

pub mod backmap;
pub mod config;
pub mod diagonalize;
pub mod error;
pub mod kernel;
pub mod partition;
pub mod problem;
pub mod quadratic;
pub mod schur;
pub mod secular;
pub mod solve;
pub mod translate;

pub use backmap::{Candidate, TransformChain};
pub use config::{SolverConfig, StallCriterion};
pub use error::{SolverError, SolverResult};
pub use partition::Partition;
pub use problem::{InstantonProblem, LinearSystem};
pub use quadratic::QuadraticForm;
pub use secular::{RootKind, SecularEquation, SecularReport, SecularRoot, solve_secular};
pub use solve::{QcqpSolution, ReducedProblem, SolveDiagnostics, reduce, solve};
