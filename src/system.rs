//! System of residual equations evaluated with JIT compilation.
//!
//! This module provides functionality for evaluating the force-balance residuals
//! simultaneously using JIT compilation. The equations are combined into a single
//! native function, and every column of the Jacobian gets its own combined function
//! built from the symbolic derivatives.
//!
//! # Features
//!
//! - JIT compilation of multiple equations into a single function
//! - Explicit variable ordering shared by every compiled function
//! - Validation that every referenced variable is part of the ordering
//! - Automatic derivative computation and Jacobian matrix generation
//! - Parallel batch evaluation

use crate::builder::build_combined_function;
use crate::errors::EquationError;
use crate::expr::Expr;
use crate::types::CombinedJITFunction;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Represents a system of equations that can be evaluated together.
pub struct EquationSystem {
    /// The simplified AST representations of the equations
    pub asts: Vec<Box<Expr>>,
    /// Maps variable names to their indices in the input array
    pub variable_map: HashMap<String, u32>,
    /// Variables in input order
    pub ordered_variables: Vec<String>,
    /// The JIT-compiled function that evaluates all equations
    pub combined_fun: CombinedJITFunction,
    /// Jacobian of the system - maps variable names to their derivative functions
    pub jacobian_funs: HashMap<String, CombinedJITFunction>,
}

impl EquationSystem {
    /// Creates a new equation system over an explicit variable ordering.
    ///
    /// Variable references in `expressions` are re-indexed to their position in
    /// `variables`, so callers can build expressions without tracking indices.
    ///
    /// # Arguments
    /// * `expressions` - The equations, each of which is driven to zero by a solver
    /// * `variables` - Variable names in input order
    ///
    /// # Errors
    /// Returns `EquationError::VariableNotFound` if an expression references a variable
    /// that is not in `variables`, and any compilation error from the builder.
    pub fn from_exprs(expressions: &[Expr], variables: &[String]) -> Result<Self, EquationError> {
        let variable_map: HashMap<String, u32> = variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i as u32))
            .collect();

        let asts = expressions
            .iter()
            .map(|expr| Ok(reindex(expr, &variable_map)?.simplify()))
            .collect::<Result<Vec<_>, EquationError>>()?;

        let flat: Vec<Expr> = asts.iter().map(|ast| (**ast).clone()).collect();
        let combined_fun = build_combined_function(&flat)?;

        // Create derivative functions for each variable forming a Jacobian matrix
        let mut jacobian_funs = HashMap::with_capacity(variables.len());
        for var in variables {
            let derivative_asts: Vec<Expr> = asts
                .iter()
                .map(|ast| *ast.derivative(var).simplify())
                .collect();
            let jacobian_fun = build_combined_function(&derivative_asts)?;
            jacobian_funs.insert(var.clone(), jacobian_fun);
        }

        Ok(Self {
            asts,
            variable_map,
            ordered_variables: variables.to_vec(),
            combined_fun,
            jacobian_funs,
        })
    }

    /// Evaluates all equations in the system into a pre-allocated buffer.
    ///
    /// # Errors
    /// Returns `EquationError::InvalidInputLength` if the number of inputs doesn't match
    /// the number of variables, and `EquationError::InvalidOutputLength` if the results
    /// buffer size doesn't match the number of equations.
    pub fn eval_into<'a>(
        &self,
        inputs: &[f64],
        results: &'a mut [f64],
    ) -> Result<&'a [f64], EquationError> {
        self.validate_input_length(inputs)?;
        self.validate_output_length(results)?;

        (self.combined_fun)(inputs, results);
        Ok(results)
    }

    /// Evaluates all equations in the system with the given input values.
    /// Allocates a new vector for results.
    pub fn eval(&self, inputs: &[f64]) -> Result<Vec<f64>, EquationError> {
        let mut results = vec![0.0; self.asts.len()];
        self.eval_into(inputs, &mut results)?;
        Ok(results)
    }

    /// Evaluates the equation system in parallel for multiple input sets.
    pub fn eval_parallel(&self, input_sets: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EquationError> {
        for inputs in input_sets {
            self.validate_input_length(inputs)?;
        }

        let n_equations = self.asts.len();
        let fun = Arc::clone(&self.combined_fun);

        Ok(input_sets
            .par_iter()
            .map(|inputs| {
                let mut results = vec![0.0; n_equations];
                (fun)(inputs, &mut results);
                results
            })
            .collect())
    }

    /// Computes the Jacobian matrix of the equation system at the given input values.
    ///
    /// Each row corresponds to an equation, and each column corresponds to a variable in
    /// input order. The entry at position (i,j) is the partial derivative of equation i
    /// with respect to variable j.
    pub fn jacobian(&self, inputs: &[f64]) -> Result<Vec<Vec<f64>>, EquationError> {
        self.validate_input_length(inputs)?;

        let n_equations = self.asts.len();
        let n_vars = self.ordered_variables.len();
        let mut results = vec![Vec::with_capacity(n_vars); n_equations];

        // Fill the transposed matrix
        let mut derivatives = vec![0.0; n_equations];
        for var in &self.ordered_variables {
            let fun = self
                .jacobian_funs
                .get(var)
                .ok_or_else(|| EquationError::VariableNotFound(var.clone()))?;
            fun(inputs, &mut derivatives);
            for (eq_idx, &value) in derivatives.iter().enumerate() {
                results[eq_idx].push(value);
            }
        }

        Ok(results)
    }

    /// Returns the variables in input order.
    pub fn variables(&self) -> &[String] {
        &self.ordered_variables
    }

    /// Returns the number of equations in the system.
    pub fn num_equations(&self) -> usize {
        self.asts.len()
    }

    /// Validates that the number of input values matches the number of variables.
    fn validate_input_length(&self, inputs: &[f64]) -> Result<(), EquationError> {
        if inputs.len() != self.ordered_variables.len() {
            return Err(EquationError::InvalidInputLength {
                expected: self.ordered_variables.len(),
                got: inputs.len(),
            });
        }
        Ok(())
    }

    fn validate_output_length(&self, results: &[f64]) -> Result<(), EquationError> {
        if results.len() != self.asts.len() {
            return Err(EquationError::InvalidOutputLength {
                expected: self.asts.len(),
                got: results.len(),
            });
        }
        Ok(())
    }
}

impl Clone for EquationSystem {
    fn clone(&self) -> Self {
        Self {
            asts: self.asts.clone(),
            variable_map: self.variable_map.clone(),
            ordered_variables: self.ordered_variables.clone(),
            combined_fun: Arc::clone(&self.combined_fun),
            jacobian_funs: self.jacobian_funs.clone(),
        }
    }
}

/// Rewrites every variable index to the variable's position in `variable_map`.
fn reindex(expr: &Expr, variable_map: &HashMap<String, u32>) -> Result<Box<Expr>, EquationError> {
    let rebuilt = match expr {
        Expr::Const(_) => expr.clone(),
        Expr::Var(var_ref) => {
            let index = variable_map
                .get(&var_ref.name)
                .ok_or_else(|| EquationError::VariableNotFound(var_ref.name.clone()))?;
            Expr::var(var_ref.name.as_str(), *index)
        }
        Expr::Add(l, r) => Expr::Add(reindex(l, variable_map)?, reindex(r, variable_map)?),
        Expr::Sub(l, r) => Expr::Sub(reindex(l, variable_map)?, reindex(r, variable_map)?),
        Expr::Mul(l, r) => Expr::Mul(reindex(l, variable_map)?, reindex(r, variable_map)?),
        Expr::Div(l, r) => Expr::Div(reindex(l, variable_map)?, reindex(r, variable_map)?),
        Expr::Sin(e) => Expr::Sin(reindex(e, variable_map)?),
        Expr::Cos(e) => Expr::Cos(reindex(e, variable_map)?),
        Expr::Neg(e) => Expr::Neg(reindex(e, variable_map)?),
    };
    Ok(Box::new(rebuilt))
}
