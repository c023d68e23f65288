//! Expression module for representing the force-balance equations symbolically.
//!
//! This module defines the expression tree every equation in the crate is built from.
//! The main types are:
//!
//! - `Expr`: An enum representing the different kinds of expression nodes
//! - `VarRef`: A struct containing metadata about the unknowns referenced by an expression
//!
//! The expression tree is built recursively using `Box<Expr>` for nested expressions and can be:
//! - JIT compiled into machine code using Cranelift
//! - Symbolically differentiated to build the Jacobian of an equation system
//! - Simplified using algebraic rules
//! - Partially evaluated by substituting known values for variables
//!
//! Supported operations are the ones a sum of force components needs:
//! - Basic arithmetic (+, -, *, /) and negation
//! - Variables and constants
//! - Sine and cosine (arguments in radians)
//!
//! # Symbolic Differentiation
//! The derivative method applies the sum, product, quotient and chain rules. Every
//! residual of a concurrent force system is a sum of `m * cos(theta)` and
//! `m * sin(theta)` products, so these rules are closed over the equations we build.
//!
//! # Expression Simplification
//! The simplify method performs constant folding and identity elimination so that a
//! term like `10 * cos(0)` collapses to `10` before compilation.

use std::collections::HashMap;
use std::collections::HashSet;

use cranelift::prelude::*;
use cranelift_module::{FuncId, Module};

use crate::{errors::EquationError, operators::trigonometric};

/// Represents a reference to a variable in an expression.
///
/// Contains the metadata needed to generate code that loads the variable's value:
/// - The variable's name as a string
/// - The variable's index in the input array
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
    pub index: u32,
}

/// An expression tree node representing mathematical operations.
///
/// The expression tree is built recursively using `Box<Expr>` for nested expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant floating point value
    Const(f64),
    /// A reference to a variable
    Var(VarRef),
    /// Addition of two expressions
    Add(Box<Expr>, Box<Expr>),
    /// Multiplication of two expressions
    Mul(Box<Expr>, Box<Expr>),
    /// Subtraction of two expressions
    Sub(Box<Expr>, Box<Expr>),
    /// Division of two expressions
    Div(Box<Expr>, Box<Expr>),
    /// Sine of an expression (argument in radians)
    Sin(Box<Expr>),
    /// Cosine of an expression (argument in radians)
    Cos(Box<Expr>),
    /// Negation of an expression
    Neg(Box<Expr>),
}

/// Function ids of the external trigonometric functions linked into a JIT module.
#[derive(Debug, Clone, Copy)]
pub struct TrigFuncs {
    pub sin: FuncId,
    pub cos: FuncId,
}

impl Expr {
    /// Creates a variable node.
    pub fn var(name: impl Into<String>, index: u32) -> Expr {
        Expr::Var(VarRef {
            name: name.into(),
            index,
        })
    }

    /// Returns the names of all variables referenced by the expression, sorted.
    pub fn variables(&self) -> Vec<String> {
        let mut names = HashSet::new();
        self.collect_variables(&mut names);
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        names
    }

    fn collect_variables(&self, names: &mut HashSet<String>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(var_ref) => {
                names.insert(var_ref.name.clone());
            }
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::Sin(expr) | Expr::Cos(expr) | Expr::Neg(expr) => expr.collect_variables(names),
        }
    }

    /// Replaces every variable found in `values` by a constant and folds the result.
    ///
    /// Variables that are not present in the map are left in place, so the result is
    /// constant only when every referenced variable was bound.
    pub fn substitute(&self, values: &HashMap<String, f64>) -> Box<Expr> {
        match self {
            Expr::Const(_) => Box::new(self.clone()),

            Expr::Var(var_ref) => match values.get(&var_ref.name) {
                Some(&value) => Box::new(Expr::Const(value)),
                None => Box::new(self.clone()),
            },

            Expr::Add(left, right) => {
                let l = left.substitute(values);
                let r = right.substitute(values);
                match (&*l, &*r) {
                    (Expr::Const(a), Expr::Const(b)) => Box::new(Expr::Const(a + b)),
                    _ => Box::new(Expr::Add(l, r)),
                }
            }

            Expr::Sub(left, right) => {
                let l = left.substitute(values);
                let r = right.substitute(values);
                match (&*l, &*r) {
                    (Expr::Const(a), Expr::Const(b)) => Box::new(Expr::Const(a - b)),
                    _ => Box::new(Expr::Sub(l, r)),
                }
            }

            Expr::Mul(left, right) => {
                let l = left.substitute(values);
                let r = right.substitute(values);
                match (&*l, &*r) {
                    (Expr::Const(a), Expr::Const(b)) => Box::new(Expr::Const(a * b)),
                    _ => Box::new(Expr::Mul(l, r)),
                }
            }

            Expr::Div(left, right) => {
                let l = left.substitute(values);
                let r = right.substitute(values);
                match (&*l, &*r) {
                    (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => Box::new(Expr::Const(a / b)),
                    _ => Box::new(Expr::Div(l, r)),
                }
            }

            Expr::Sin(expr) => {
                let e = expr.substitute(values);
                match &*e {
                    Expr::Const(a) => Box::new(Expr::Const(a.sin())),
                    _ => Box::new(Expr::Sin(e)),
                }
            }

            Expr::Cos(expr) => {
                let e = expr.substitute(values);
                match &*e {
                    Expr::Const(a) => Box::new(Expr::Const(a.cos())),
                    _ => Box::new(Expr::Cos(e)),
                }
            }

            Expr::Neg(expr) => {
                let e = expr.substitute(values);
                match &*e {
                    Expr::Const(a) => Box::new(Expr::Const(-a)),
                    _ => Box::new(Expr::Neg(e)),
                }
            }
        }
    }

    /// Computes the symbolic derivative of this expression with respect to a variable.
    ///
    /// Recursively applies the rules of differentiation to build a new expression tree
    /// representing the derivative. The rules implemented are:
    /// - d/dx(c) = 0 for constants
    /// - d/dx(x) = 1 for the variable we're differentiating with respect to
    /// - d/dx(y) = 0 for other variables
    /// - Sum rule: d/dx(f + g) = df/dx + dg/dx
    /// - Product rule: d/dx(f * g) = f * dg/dx + g * df/dx
    /// - Quotient rule: d/dx(f/g) = (g * df/dx - f * dg/dx) / (g * g)
    /// - Chain rule for sin: d/dx(sin(f)) = cos(f) * df/dx
    /// - Chain rule for cos: d/dx(cos(f)) = -sin(f) * df/dx
    /// - Negation: d/dx(-f) = -(df/dx)
    ///
    /// # Arguments
    /// * `with_respect_to` - The name of the variable to differentiate with respect to
    ///
    /// # Returns
    /// A new expression tree representing the derivative
    pub fn derivative(&self, with_respect_to: &str) -> Box<Expr> {
        match self {
            Expr::Const(_) => Box::new(Expr::Const(0.0)),

            Expr::Var(var_ref) => {
                if var_ref.name == with_respect_to {
                    Box::new(Expr::Const(1.0))
                } else {
                    Box::new(Expr::Const(0.0))
                }
            }

            Expr::Add(left, right) => Box::new(Expr::Add(
                left.derivative(with_respect_to),
                right.derivative(with_respect_to),
            )),

            Expr::Sub(left, right) => Box::new(Expr::Sub(
                left.derivative(with_respect_to),
                right.derivative(with_respect_to),
            )),

            Expr::Mul(left, right) => Box::new(Expr::Add(
                Box::new(Expr::Mul(left.clone(), right.derivative(with_respect_to))),
                Box::new(Expr::Mul(right.clone(), left.derivative(with_respect_to))),
            )),

            Expr::Div(left, right) => Box::new(Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(right.clone(), left.derivative(with_respect_to))),
                    Box::new(Expr::Mul(left.clone(), right.derivative(with_respect_to))),
                )),
                Box::new(Expr::Mul(right.clone(), right.clone())),
            )),

            Expr::Sin(expr) => Box::new(Expr::Mul(
                Box::new(Expr::Cos(expr.clone())),
                expr.derivative(with_respect_to),
            )),

            Expr::Cos(expr) => Box::new(Expr::Mul(
                Box::new(Expr::Neg(Box::new(Expr::Sin(expr.clone())))),
                expr.derivative(with_respect_to),
            )),

            Expr::Neg(expr) => Box::new(Expr::Neg(expr.derivative(with_respect_to))),
        }
    }

    /// Simplifies the expression by folding constants and applying basic algebraic rules.
    ///
    /// # Constant Folding
    /// - Evaluates constant expressions: 2 + 3 → 5, cos(0) → 1
    /// - Simplifies operations with special constants: x * 0 → 0
    ///
    /// # Identity Rules
    /// - Additive identity: x + 0 → x
    /// - Multiplicative identity: x * 1 → x
    /// - Division identity: x / 1 → x
    /// - Double negation: -(-x) → x
    ///
    /// # Returns
    /// A new simplified expression tree
    pub fn simplify(&self) -> Box<Expr> {
        match self {
            Expr::Const(_) | Expr::Var(_) => Box::new(self.clone()),

            Expr::Add(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match (&*l, &*r) {
                    // Fold constants: 1 + 2 -> 3
                    (Expr::Const(a), Expr::Const(b)) => Box::new(Expr::Const(a + b)),
                    // Identity: x + 0 -> x
                    (expr, Expr::Const(0.0)) | (Expr::Const(0.0), expr) => Box::new(expr.clone()),
                    // Combine like terms: c1*x + c2*x -> (c1+c2)*x
                    (Expr::Mul(a1, x1), Expr::Mul(a2, x2))
                        if x1 == x2
                            && matches!(**a1, Expr::Const(_))
                            && matches!(**a2, Expr::Const(_)) =>
                    {
                        let combined_coeff = Expr::Add(a1.clone(), a2.clone()).simplify();
                        Expr::Mul(combined_coeff, x1.clone()).simplify()
                    }
                    // x + (-y) -> x - y
                    (x, Expr::Neg(y)) => Box::new(Expr::Sub(Box::new(x.clone()), y.clone())),
                    _ => Box::new(Expr::Add(l, r)),
                }
            }

            Expr::Sub(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match (&*l, &*r) {
                    // Fold constants: 3 - 2 -> 1
                    (Expr::Const(a), Expr::Const(b)) => Box::new(Expr::Const(a - b)),
                    // Identity: x - 0 -> x
                    (expr, Expr::Const(0.0)) => Box::new(expr.clone()),
                    // 0 - x -> -x
                    (Expr::Const(0.0), expr) => Box::new(Expr::Neg(Box::new(expr.clone()))),
                    // Zero: x - x -> 0
                    (a, b) if a == b => Box::new(Expr::Const(0.0)),
                    _ => Box::new(Expr::Sub(l, r)),
                }
            }

            Expr::Mul(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match (&*l, &*r) {
                    // Fold constants: 2 * 3 -> 6
                    (Expr::Const(a), Expr::Const(b)) => Box::new(Expr::Const(a * b)),
                    // Zero property: x * 0 -> 0
                    (Expr::Const(0.0), _) | (_, Expr::Const(0.0)) => Box::new(Expr::Const(0.0)),
                    // Identity: x * 1 -> x
                    (expr, Expr::Const(1.0)) | (Expr::Const(1.0), expr) => Box::new(expr.clone()),
                    // Negative one: x * (-1) -> -x
                    (expr, Expr::Const(-1.0)) | (Expr::Const(-1.0), expr) => {
                        Box::new(Expr::Neg(Box::new(expr.clone())))
                    }
                    // Keep constants on the left: x * c -> c * x
                    (expr, Expr::Const(c)) => {
                        Box::new(Expr::Mul(Box::new(Expr::Const(*c)), Box::new(expr.clone())))
                    }
                    // Associativity: c1 * (c2 * x) -> (c1 * c2) * x
                    (Expr::Const(c1), Expr::Mul(c2, x)) if matches!(**c2, Expr::Const(_)) => {
                        Expr::Mul(
                            Expr::Mul(Box::new(Expr::Const(*c1)), c2.clone()).simplify(),
                            x.clone(),
                        )
                        .simplify()
                    }
                    _ => Box::new(Expr::Mul(l, r)),
                }
            }

            Expr::Div(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match (&*l, &*r) {
                    // Fold constants: 6 / 2 -> 3
                    (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => Box::new(Expr::Const(a / b)),
                    // Zero numerator: 0 / x -> 0
                    (Expr::Const(0.0), _) => Box::new(Expr::Const(0.0)),
                    // Identity: x / 1 -> x
                    (expr, Expr::Const(1.0)) => Box::new(expr.clone()),
                    // Division by negative one: x / (-1) -> -x
                    (expr, Expr::Const(-1.0)) => Box::new(Expr::Neg(Box::new(expr.clone()))),
                    _ => Box::new(Expr::Div(l, r)),
                }
            }

            Expr::Sin(expr) => {
                let e = expr.simplify();
                match &*e {
                    Expr::Const(a) => Box::new(Expr::Const(a.sin())),
                    _ => Box::new(Expr::Sin(e)),
                }
            }

            Expr::Cos(expr) => {
                let e = expr.simplify();
                match &*e {
                    Expr::Const(a) => Box::new(Expr::Const(a.cos())),
                    _ => Box::new(Expr::Cos(e)),
                }
            }

            Expr::Neg(expr) => {
                let e = expr.simplify();
                match &*e {
                    // Fold constants: -(3) -> -3
                    Expr::Const(a) => Box::new(Expr::Const(-a)),
                    // Double negation: -(-x) -> x
                    Expr::Neg(inner) => inner.clone(),
                    // Factor out negation: -(c*x) -> (-c)*x
                    Expr::Mul(c, x) if matches!(**c, Expr::Const(_)) => {
                        Expr::Mul(Box::new(Expr::Neg(c.clone())), x.clone()).simplify()
                    }
                    _ => Box::new(Expr::Neg(e)),
                }
            }
        }
    }

    /// Evaluates the expression if it contains no variables.
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            Expr::Const(val) => Some(*val),
            Expr::Var(_) => None,
            Expr::Add(left, right) => Some(left.constant_value()? + right.constant_value()?),
            Expr::Sub(left, right) => Some(left.constant_value()? - right.constant_value()?),
            Expr::Mul(left, right) => Some(left.constant_value()? * right.constant_value()?),
            Expr::Div(left, right) => {
                let r = right.constant_value()?;
                if r.abs() < 1e-300 {
                    return None;
                }
                Some(left.constant_value()? / r)
            }
            Expr::Sin(expr) => Some(expr.constant_value()?.sin()),
            Expr::Cos(expr) => Some(expr.constant_value()?.cos()),
            Expr::Neg(expr) => Some(-expr.constant_value()?),
        }
    }

    /// Generates Cranelift IR for the expression.
    ///
    /// Variables are loaded from `input_ptr` at byte offset `index * 8`; sine and cosine
    /// are emitted as calls to the functions linked in `trig`.
    pub fn codegen(
        &self,
        builder: &mut FunctionBuilder,
        module: &mut dyn Module,
        input_ptr: Value,
        trig: TrigFuncs,
    ) -> Result<Value, EquationError> {
        match self {
            Expr::Const(val) => Ok(builder.ins().f64const(*val)),

            Expr::Var(var_ref) => {
                let offset = (var_ref.index as i32) * 8;
                Ok(builder
                    .ins()
                    .load(types::F64, MemFlags::trusted(), input_ptr, offset))
            }

            Expr::Add(left, right) => {
                let l = left.codegen(builder, module, input_ptr, trig)?;
                let r = right.codegen(builder, module, input_ptr, trig)?;
                Ok(builder.ins().fadd(l, r))
            }

            Expr::Sub(left, right) => {
                let l = left.codegen(builder, module, input_ptr, trig)?;
                let r = right.codegen(builder, module, input_ptr, trig)?;
                Ok(builder.ins().fsub(l, r))
            }

            Expr::Mul(left, right) => {
                let l = left.codegen(builder, module, input_ptr, trig)?;
                let r = right.codegen(builder, module, input_ptr, trig)?;
                Ok(builder.ins().fmul(l, r))
            }

            Expr::Div(left, right) => {
                let l = left.codegen(builder, module, input_ptr, trig)?;
                let r = right.codegen(builder, module, input_ptr, trig)?;
                Ok(builder.ins().fdiv(l, r))
            }

            Expr::Neg(expr) => {
                let v = expr.codegen(builder, module, input_ptr, trig)?;
                Ok(builder.ins().fneg(v))
            }

            Expr::Sin(expr) => {
                let v = expr.codegen(builder, module, input_ptr, trig)?;
                Ok(trigonometric::call_sin(builder, module, trig.sin, v))
            }

            Expr::Cos(expr) => {
                let v = expr.codegen(builder, module, input_ptr, trig)?;
                Ok(trigonometric::call_cos(builder, module, trig.cos, v))
            }
        }
    }
}

/// Implements string formatting for expressions.
///
/// - Constants are formatted as numbers
/// - Variables are formatted as their names
/// - Binary operations (+,-,*,/) are wrapped in parentheses
/// - Functions use function call notation
/// - Negation uses - prefix
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Const(val) => write!(f, "{val}"),
            Expr::Var(var_ref) => write!(f, "{0}", var_ref.name),
            Expr::Add(left, right) => write!(f, "({left} + {right})"),
            Expr::Mul(left, right) => write!(f, "({left} * {right})"),
            Expr::Sub(left, right) => write!(f, "({left} - {right})"),
            Expr::Div(left, right) => write!(f, "({left} / {right})"),
            Expr::Sin(expr) => write!(f, "sin({expr})"),
            Expr::Cos(expr) => write!(f, "cos({expr})"),
            Expr::Neg(expr) => write!(f, "-({expr})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::var(name, 0))
    }

    fn constant(value: f64) -> Box<Expr> {
        Box::new(Expr::Const(value))
    }

    #[test]
    fn test_simplify() {
        // 2 + 3 → 5
        assert_eq!(
            *Expr::Add(constant(2.0), constant(3.0)).simplify(),
            Expr::Const(5.0)
        );

        // x + 0 → x
        assert_eq!(*Expr::Add(var("x"), constant(0.0)).simplify(), *var("x"));

        // x * 1 → x
        assert_eq!(*Expr::Mul(var("x"), constant(1.0)).simplify(), *var("x"));

        // x * 0 → 0
        assert_eq!(
            *Expr::Mul(var("x"), constant(0.0)).simplify(),
            Expr::Const(0.0)
        );

        // x / 1 → x
        assert_eq!(*Expr::Div(var("x"), constant(1.0)).simplify(), *var("x"));

        // 10 * cos(0) → 10
        assert_eq!(
            *Expr::Mul(constant(10.0), Box::new(Expr::Cos(constant(0.0)))).simplify(),
            Expr::Const(10.0)
        );

        // -(-x) → x
        assert_eq!(
            *Expr::Neg(Box::new(Expr::Neg(var("x")))).simplify(),
            *var("x")
        );
    }

    #[test]
    fn test_derivative_of_force_component() {
        // d/dF (F * cos(theta)) = F * 0 + cos(theta) * 1
        let component = Expr::Mul(var("F"), Box::new(Expr::Cos(var("theta"))));
        let d_f = component.derivative("F").simplify();
        assert_eq!(*d_f, Expr::Cos(var("theta")));

        // d/dtheta (F * cos(theta)) = F * (-sin(theta) * 1) + cos(theta) * 0
        let d_theta = component.derivative("theta").simplify();
        assert_eq!(
            *d_theta,
            Expr::Mul(var("F"), Box::new(Expr::Neg(Box::new(Expr::Sin(var("theta"))))))
        );
    }

    #[test]
    fn test_substitute_partial_and_full() {
        let component = Expr::Mul(var("F"), Box::new(Expr::Sin(var("theta"))));

        let mut values = HashMap::new();
        values.insert("theta".to_string(), std::f64::consts::FRAC_PI_2);
        let partial = component.substitute(&values);
        assert_eq!(partial.constant_value(), None);
        assert_eq!(partial.variables(), vec!["F".to_string()]);

        values.insert("F".to_string(), 4.0);
        let full = component.substitute(&values);
        let value = full.constant_value().unwrap();
        assert!((value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_variables_are_sorted_and_unique() {
        let expr = Expr::Add(
            Box::new(Expr::Mul(var("theta_F2"), var("F2"))),
            Box::new(Expr::Mul(var("F2"), var("F1"))),
        );
        assert_eq!(expr.variables(), vec!["F1", "F2", "theta_F2"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Expr::Const(5.0)), "5");
        assert_eq!(format!("{}", *var("x")), "x");

        let component = Expr::Mul(var("F1"), Box::new(Expr::Cos(var("theta_F1"))));
        assert_eq!(format!("{component}"), "(F1 * cos(theta_F1))");

        let neg = Expr::Neg(var("R"));
        assert_eq!(format!("{neg}"), "-(R)");
    }
}
