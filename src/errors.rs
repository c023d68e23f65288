//! Error types for the concurrent-forces crate.
//!
//! This module defines the error types that can occur while validating input fields,
//! converting field text, JIT compiling the residual system and solving it. The main
//! error types are:
//!
//! - `ValidationError`: A user-supplied field is not a finite real number
//! - `ConvertError`: Errors during conversion from evalexpr AST to internal representation
//! - `BuilderError`: Errors during JIT compilation with Cranelift
//! - `EquationError`: High-level errors when compiling or evaluating an equation system
//! - `SolveError`: The general solver could not produce a solution set
//!
//! Each error type implements the standard Error trait and provides detailed error messages.

use cranelift_codegen::{settings::SetError, CodegenError};
use cranelift_module::ModuleError;
use evalexpr::{DefaultNumericTypes, EvalexprError};
use thiserror::Error;

/// Errors raised when a force or resultant field cannot be used as a known value.
///
/// Validation happens before any equation is built, so a report carrying one of these
/// has no equations, unknowns or solutions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The field text is neither blank, `?`, nor a real number
    #[error("{field}: '{text}' is not a real number")]
    NotANumber { field: String, text: String },
    /// The field holds NaN or an infinite value
    #[error("{field}: value {value} is not finite")]
    NotFinite { field: String, value: f64 },
}

/// Errors that can occur during conversion from evalexpr AST to our internal AST representation.
///
/// Field text is converted only to check that it is constant arithmetic, so any
/// identifier is reported as an unknown variable.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Error when encountering an operator that is not supported by our implementation
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// Error when encountering a function that is not supported by our implementation
    #[error("Unsupported function: {0}")]
    UnsupportedFunction(String),
    /// Error when the root node does not have exactly one child
    #[error("Expected single child for root node: {0}")]
    RootNode(String),
    /// Error when a constant value is not a number
    #[error("Expected numeric constant: {0}")]
    ConstOperator(String),
    /// Error when a variable is not found in the variable map
    #[error("Variable not found: {0}")]
    VariableNotFound(String),
}

/// Errors that can occur during JIT compilation of expressions.
///
/// This enum represents various failure modes in the process of converting our AST
/// into machine code using Cranelift as the JIT compiler backend.
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Error when the target machine architecture is not supported
    #[error("host machine is not supported: {0}")]
    HostMachineNotSupported(String),
    /// Error when a Cranelift setting is rejected
    #[error("invalid compiler setting: {0}")]
    SettingError(#[from] SetError),
    /// Error during Cranelift code generation
    #[error("codegen error: {0}")]
    CodegenError(CodegenError),
    /// Error in the Cranelift JIT module
    #[error("module error: {0}")]
    ModuleError(ModuleError),
    /// Error when defining the JIT function
    #[error("function error: {0}")]
    FunctionError(String),
    /// Error when declaring the JIT function or one of its imports
    #[error("declaration error: {0}")]
    DeclarationError(String),
}

/// High-level errors that can occur when working with the residual equations.
///
/// This enum wraps lower-level errors from the expression conversion and JIT
/// compilation stages and adds the shape checks of `EquationSystem`.
#[derive(Debug, Error)]
pub enum EquationError {
    /// Error when parsing a string with evalexpr
    #[error("Failed to build Evalexpr AST")]
    BuildEvalexprError(#[from] EvalexprError<DefaultNumericTypes>),
    /// Error when converting from evalexpr AST to our internal AST representation
    #[error("Failed to build JIT AST")]
    BuildJITError(#[from] ConvertError),
    /// Error when JIT compiling the expressions
    #[error("Failed to build JIT function")]
    BuildFunctionError(#[from] BuilderError),
    /// Error when the input length is not the same as the number of variables
    #[error("Invalid input length: expected {expected}, got {got}")]
    InvalidInputLength { expected: usize, got: usize },
    /// Error when an expression references a variable outside the system's variable list
    #[error("Variable not found in equation system: {0}")]
    VariableNotFound(String),
    /// Error when the output length is not the same as the number of equations
    #[error("Invalid output length: expected {expected}, got {got}")]
    InvalidOutputLength { expected: usize, got: usize },
}

/// Failure modes of the general solver.
///
/// These never cross the public API; the solver turns them into an empty solution list
/// plus an advisory.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The unknowns are not pinned down by the two equations (a degenerate geometry)
    #[error("the system is indeterminate: {0}")]
    Indeterminate(String),
    /// The iterative solver did not converge from any starting point
    #[error("no starting point converged after {iterations} iterations")]
    NoConvergence { iterations: usize },
    /// The residual system could not be compiled or evaluated
    #[error("residual system failed: {0}")]
    Jit(#[from] EquationError),
}
