//! Conversion module for transforming evalexpr AST nodes into our internal expression representation.
//!
//! Field text that is not a plain float literal is parsed by evalexpr and converted here.
//! The conversion maps variables, operators and function calls into `Expr`; a field is
//! usable as a known value only when the converted expression is constant.
//!
//! The main entry points are `build_ast`, which recursively traverses the evalexpr AST and
//! builds up our expression tree, and `parse_constant`, which evaluates constant text.

use std::collections::HashMap;

use crate::{
    errors::{ConvertError, EquationError},
    expr::Expr,
};
use evalexpr::{build_operator_tree, DefaultNumericTypes, Node, Operator};

/// Converts an evalexpr AST node into our internal expression representation.
///
/// # Arguments
/// * `node` - The evalexpr AST node to convert
/// * `var_map` - A mapping of variable names to their indices in the input array
///
/// # Returns
/// * `Result<Expr, ConvertError>` - The converted expression or an error if conversion fails
///
/// # Examples of supported operations:
/// * Basic arithmetic: +, -, *, /
/// * Variables: any name present in `var_map`
/// * Constants: integer and floating point numbers
/// * Functions: sin(), cos() (radians); abs(), sqrt(), exp(), ln() of constant arguments
/// * Exponentiation: a^b where both sides are constant
pub fn build_ast(node: &Node, var_map: &HashMap<String, u32>) -> Result<Expr, ConvertError> {
    match node.operator() {
        // Addition operator - combines multiple children into a series of binary Add expressions
        Operator::Add => {
            let children = child_nodes(node, 2)?;
            children
                .iter()
                .skip(1)
                .try_fold(build_ast(&children[0], var_map)?, |acc, child| {
                    Ok(Expr::Add(
                        Box::new(acc),
                        Box::new(build_ast(child, var_map)?),
                    ))
                })
        }
        // Multiplication operator - combines multiple children into a series of binary Mul expressions
        Operator::Mul => {
            let children = child_nodes(node, 2)?;
            children.iter().skip(1).try_fold(
                build_ast(&children[0], var_map)?,
                |acc, child| -> Result<Expr, ConvertError> {
                    Ok(Expr::Mul(
                        Box::new(acc),
                        Box::new(build_ast(child, var_map)?),
                    ))
                },
            )
        }
        Operator::Div => {
            let children = child_nodes(node, 2)?;
            Ok(Expr::Div(
                Box::new(build_ast(&children[0], var_map)?),
                Box::new(build_ast(&children[1], var_map)?),
            ))
        }
        Operator::Sub => {
            let children = child_nodes(node, 2)?;
            Ok(Expr::Sub(
                Box::new(build_ast(&children[0], var_map)?),
                Box::new(build_ast(&children[1], var_map)?),
            ))
        }
        Operator::Const { value } => match value {
            evalexpr::Value::Float(f) => Ok(Expr::Const(*f)),
            evalexpr::Value::Int(i) => Ok(Expr::Const(*i as f64)),
            _ => Err(ConvertError::ConstOperator(format!("{value:?}"))),
        },
        // Variable reference - looks up the variable's index in var_map
        Operator::VariableIdentifierRead { identifier } => {
            let index = var_map
                .get(identifier.as_str())
                .ok_or_else(|| ConvertError::VariableNotFound(identifier.to_string()))?;
            Ok(Expr::var(identifier.as_str(), *index))
        }
        Operator::Neg => {
            let children = child_nodes(node, 1)?;
            Ok(Expr::Neg(Box::new(build_ast(&children[0], var_map)?)))
        }
        Operator::FunctionIdentifier { identifier } => {
            let children = child_nodes(node, 1)?;
            let arg = Box::new(build_ast(&children[0], var_map)?);
            match identifier.as_str() {
                "sin" => Ok(Expr::Sin(arg)),
                "cos" => Ok(Expr::Cos(arg)),
                "abs" => fold_constant(identifier, &arg, f64::abs),
                "sqrt" => fold_constant(identifier, &arg, f64::sqrt),
                "exp" => fold_constant(identifier, &arg, f64::exp),
                "ln" | "log" => fold_constant(identifier, &arg, f64::ln),
                _ => Err(ConvertError::UnsupportedFunction(identifier.to_string())),
            }
        }
        // Root node - should have exactly one child
        Operator::RootNode => {
            let children = node.children();
            if children.len() == 1 {
                build_ast(&children[0], var_map)
            } else {
                Err(ConvertError::RootNode(format!("{} children", children.len())))
            }
        }
        // Exponentiation - only between constants, there is no power node in the tree
        Operator::Exp => {
            let children = child_nodes(node, 2)?;
            let base = build_ast(&children[0], var_map)?.simplify();
            let exponent = build_ast(&children[1], var_map)?.simplify();
            match (base.constant_value(), exponent.constant_value()) {
                (Some(b), Some(e)) => Ok(Expr::Const(b.powf(e))),
                _ => Err(ConvertError::UnsupportedOperator(
                    "non-constant exponentiation".to_string(),
                )),
            }
        }
        _ => Err(ConvertError::UnsupportedOperator(format!(
            "{:?}",
            node.operator()
        ))),
    }
}

fn child_nodes(node: &Node, min: usize) -> Result<&[Node], ConvertError> {
    let children = node.children();
    if children.len() < min {
        return Err(ConvertError::UnsupportedOperator(format!(
            "{:?} with {} operands",
            node.operator(),
            children.len()
        )));
    }
    Ok(children)
}

fn fold_constant(name: &str, arg: &Expr, f: fn(f64) -> f64) -> Result<Expr, ConvertError> {
    arg.simplify()
        .constant_value()
        .map(|value| Expr::Const(f(value)))
        .ok_or_else(|| ConvertError::UnsupportedFunction(format!("{name} of a variable")))
}

/// Evaluates constant arithmetic such as `90/2` or `-(3 + 4.5)`.
///
/// Any identifier makes the text non-constant and is reported as
/// `ConvertError::VariableNotFound`.
pub fn parse_constant(text: &str) -> Result<f64, EquationError> {
    let node = build_operator_tree::<DefaultNumericTypes>(text)?;
    let expr = build_ast(&node, &HashMap::new())?.simplify();
    expr.constant_value()
        .ok_or_else(|| ConvertError::ConstOperator(text.to_string()).into())
}
