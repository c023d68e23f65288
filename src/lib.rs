//! Equilibrium and resultant solver for two-dimensional concurrent force systems.
//!
//! Given forces with known or unknown magnitudes and angles, this crate finds the
//! unknowns that make the forces balance, or checks and computes a resultant `(R, α)`.
//! The two balance equations ΣFx and ΣFy are built as symbolic expressions and
//! compiled, together with their Jacobian, to native code with
//! [Cranelift](https://github.com/bytecodealliance/wasmtime/tree/main/cranelift).
//! Numeric field text is parsed with [evalexpr](https://github.com/ISibboI/evalexpr).
//!
//! # Features
//!
//! - Numeric fast path for fully known systems
//! - Closed forms for a single unknown force and for an unknown resultant
//! - Analytic solutions, complex ones included, for any other one or two unknowns
//! - Multi-start Gauss–Newton over the JIT-compiled residuals for underdetermined systems
//! - Preference for solutions with non-negative magnitudes
//!
//! # Example
//!
//! ```rust
//! use concurrent_forces::prelude::*;
//!
//! // Which force balances 10 @ 0° and 10 @ 90°?
//! let report = solve_for_equilibrium(&[
//!     Force::known(10.0, 0.0),
//!     Force::known(10.0, 90.0),
//!     Force::unknown(),
//! ]);
//! let solution = &report.outcome.solutions[0];
//! assert_eq!(format!("{solution:.2}"), "F3 = 14.14, theta_F3 = 225.00°");
//! ```

pub use solver::{
    resolved_forces, solve_for_equilibrium, solve_for_resultant, Advisory, EquilibriumReport,
    Outcome, ResultantReport, Solver,
};
pub use system::EquationSystem;

pub mod prelude {
    pub use crate::config::SolverConfig;
    pub use crate::force::{Field, Force};
    pub use crate::solution::{Solution, Value};
    pub use crate::solver::{
        resolved_forces, solve_for_equilibrium, solve_for_resultant, Advisory,
        EquilibriumReport, ResultantReport, Solver,
    };
    pub use crate::strategy::Strategy;
}

/// JIT compilation functionality using Cranelift
pub mod builder;
/// Solver tuning
pub mod config;
/// Parsing of numeric field text through evalexpr
pub mod convert;
/// Construction of the force-balance equations
pub mod equations;
/// Error types for the various failure modes
pub mod errors;
/// Expression tree representation and symbolic differentiation
pub mod expr;
/// Numeric evaluation of fully known systems
pub mod fast_path;
/// Solution preference chain
pub mod filter;
/// Forces, fields and angle helpers
pub mod force;
/// Solver for every unknown pattern without a closed form
pub mod general;
/// Multi-start Gauss–Newton iteration
pub mod newton;
/// Solved values and solution records
pub mod solution;
/// Public entry points and reports
pub mod solver;
/// Dispatch between the solve strategies
pub mod strategy;
/// System of JIT-compiled residual equations
pub mod system;
/// Shared function types
pub mod types;
/// Unknown classification
pub mod unknowns;
/// Functions for linking external functions to the expression tree
pub(crate) mod operators {
    pub(crate) mod trigonometric;
}
