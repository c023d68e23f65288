//! Construction of the two force-balance equations.
//!
//! Every force contributes one cosine term to ΣFx and one sine term to ΣFy. In the
//! resultant variant the targets are `R cos(α)` and `R sin(α)`; moved to the left-hand
//! side, the resultant is one more term with sign -1, so both variants reduce to
//! `Σ sign_k · m_k · u(θ_k) = 0`.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::expr::Expr;
use crate::force::{Field, Force};
use crate::unknowns::{SymbolKind, UnknownSet};

/// Which question a solve answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Forces sum to zero
    Equilibrium,
    /// Forces sum to the resultant (R, α)
    Resultant,
}

/// A scalar inside a term: a known number or the unknown at a position of the `UnknownSet`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Known value; angles in radians
    Known(f64),
    Unknown(usize),
}

impl Operand {
    pub fn known(&self) -> Option<f64> {
        match self {
            Operand::Known(value) => Some(*value),
            Operand::Unknown(_) => None,
        }
    }
}

/// One vector contribution `sign · magnitude · (cos θ, sin θ)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub sign: f64,
    pub magnitude: Operand,
    pub angle: Operand,
}

impl Term {
    /// Components of a fully known term, sign included.
    pub fn constant_components(&self) -> Option<(f64, f64)> {
        let magnitude = self.magnitude.known()?;
        let angle = self.angle.known()?;
        Some((
            self.sign * magnitude * angle.cos(),
            self.sign * magnitude * angle.sin(),
        ))
    }
}

/// Human-readable rendition of the equation pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquationDisplay {
    /// Raw per-force x terms, e.g. `10.0 cos(0°)` or `F2 cos(theta_F2)`
    pub fx_terms: Vec<String>,
    pub fy_terms: Vec<String>,
    /// Constants folded, symbolic terms kept
    pub fx_evaluated: String,
    pub fy_evaluated: String,
    /// Right-hand sides: `0`, or the resultant components
    pub fx_target: String,
    pub fy_target: String,
}

impl fmt::Display for EquationDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ΣFx: {} = {}",
            join_raw_terms(&self.fx_terms),
            self.fx_target
        )?;
        writeln!(
            f,
            "ΣFy: {} = {}",
            join_raw_terms(&self.fy_terms),
            self.fy_target
        )?;
        writeln!(f, "     {} = {}", self.fx_evaluated, self.fx_target)?;
        write!(f, "     {} = {}", self.fy_evaluated, self.fy_target)
    }
}

/// The equation pair of one solve, built fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceBalance {
    pub variant: Variant,
    /// Force terms in force order, then the resultant term (sign -1) if any
    pub terms: Vec<Term>,
    pub sum_fx: Expr,
    pub sum_fy: Expr,
    pub target_x: Expr,
    pub target_y: Expr,
    /// Components of the fully known forces
    pub constant_fx: f64,
    pub constant_fy: f64,
    pub display: EquationDisplay,
}

impl ForceBalance {
    /// Builds the equations for a classified force system.
    ///
    /// `resultant` is `Some` exactly in the resultant variant. The forces must already
    /// have passed `UnknownSet::classify`, which also produced `unknowns`.
    pub fn build(
        forces: &[Force],
        resultant: Option<(Field, Field)>,
        unknowns: &UnknownSet,
    ) -> Self {
        let operand = |field: Field, kind: SymbolKind, to_radians: bool| match field {
            Field::Known(value) if to_radians => Operand::Known(value.to_radians()),
            Field::Known(value) => Operand::Known(value),
            Field::Unknown => unknowns
                .position(kind)
                .map_or(Operand::Known(0.0), Operand::Unknown),
        };

        let mut terms: Vec<Term> = forces
            .iter()
            .enumerate()
            .map(|(i, force)| Term {
                sign: 1.0,
                magnitude: operand(force.magnitude, SymbolKind::Magnitude(i), false),
                angle: operand(force.angle, SymbolKind::Angle(i), true),
            })
            .collect();

        let mut sum_fx = Expr::Const(0.0);
        let mut sum_fy = Expr::Const(0.0);
        let mut constant_fx = 0.0;
        let mut constant_fy = 0.0;
        let mut fx_terms = Vec::with_capacity(forces.len());
        let mut fy_terms = Vec::with_capacity(forces.len());
        let mut fx_symbolic = Vec::new();
        let mut fy_symbolic = Vec::new();

        for (i, (force, term)) in forces.iter().zip(&terms).enumerate() {
            let magnitude = operand_expr(&term.magnitude, unknowns);
            let angle = operand_expr(&term.angle, unknowns);
            sum_fx = Expr::Add(
                Box::new(sum_fx),
                Box::new(Expr::Mul(
                    Box::new(magnitude.clone()),
                    Box::new(Expr::Cos(Box::new(angle.clone()))),
                )),
            );
            sum_fy = Expr::Add(
                Box::new(sum_fy),
                Box::new(Expr::Mul(
                    Box::new(magnitude),
                    Box::new(Expr::Sin(Box::new(angle))),
                )),
            );

            let names = (SymbolKind::Magnitude(i).name(), SymbolKind::Angle(i).name());
            let raw = raw_text(force.magnitude, force.angle, &names);
            fx_terms.push(format!("{} cos({})", raw.0, raw.1));
            fy_terms.push(format!("{} sin({})", raw.0, raw.1));

            match term.constant_components() {
                Some((fx, fy)) => {
                    constant_fx += fx;
                    constant_fy += fy;
                }
                None => {
                    fx_symbolic.push(evaluated_term(force.magnitude, force.angle, &names, Axis::X));
                    fy_symbolic.push(evaluated_term(force.magnitude, force.angle, &names, Axis::Y));
                }
            }
        }

        let (variant, target_x, target_y, fx_target, fy_target) = match resultant {
            None => (
                Variant::Equilibrium,
                Expr::Const(0.0),
                Expr::Const(0.0),
                "0".to_string(),
                "0".to_string(),
            ),
            Some((r, alpha)) => {
                let term = Term {
                    sign: -1.0,
                    magnitude: operand(r, SymbolKind::ResultantMagnitude, false),
                    angle: operand(alpha, SymbolKind::ResultantAngle, true),
                };
                let magnitude = operand_expr(&term.magnitude, unknowns);
                let angle = operand_expr(&term.angle, unknowns);
                let target_x = Expr::Mul(
                    Box::new(magnitude.clone()),
                    Box::new(Expr::Cos(Box::new(angle.clone()))),
                );
                let target_y = Expr::Mul(Box::new(magnitude), Box::new(Expr::Sin(Box::new(angle))));
                terms.push(term);

                let names = (
                    SymbolKind::ResultantMagnitude.name(),
                    SymbolKind::ResultantAngle.name(),
                );
                (
                    Variant::Resultant,
                    target_x,
                    target_y,
                    evaluated_term(r, alpha, &names, Axis::X),
                    evaluated_term(r, alpha, &names, Axis::Y),
                )
            }
        };

        let display = EquationDisplay {
            fx_terms,
            fy_terms,
            fx_evaluated: format_sum_with_constant(constant_fx, &fx_symbolic),
            fy_evaluated: format_sum_with_constant(constant_fy, &fy_symbolic),
            fx_target,
            fy_target,
        };

        Self {
            variant,
            terms,
            sum_fx: *sum_fx.simplify(),
            sum_fy: *sum_fy.simplify(),
            target_x: *target_x.simplify(),
            target_y: *target_y.simplify(),
            constant_fx,
            constant_fy,
            display,
        }
    }

    /// The residual pair `[ΣFx - target_x, ΣFy - target_y]`.
    pub fn residuals(&self) -> [Expr; 2] {
        [
            *Expr::Sub(
                Box::new(self.sum_fx.clone()),
                Box::new(self.target_x.clone()),
            )
            .simplify(),
            *Expr::Sub(
                Box::new(self.sum_fy.clone()),
                Box::new(self.target_y.clone()),
            )
            .simplify(),
        ]
    }

    /// Evaluates the residual pair with every unknown bound by name (angles in radians).
    ///
    /// Returns `None` if a referenced unknown is missing from `values`.
    pub fn residual_at(&self, values: &HashMap<String, f64>) -> Option<(f64, f64)> {
        let [rx, ry] = self.residuals();
        Some((
            rx.substitute(values).constant_value()?,
            ry.substitute(values).constant_value()?,
        ))
    }

    /// Sum of all fully known terms on the left-hand side, resultant included.
    pub fn known_sum(&self) -> (f64, f64) {
        self.terms
            .iter()
            .filter_map(Term::constant_components)
            .fold((0.0, 0.0), |(x, y), (fx, fy)| (x + fx, y + fy))
    }

    /// Reference size for relative tolerances: max(1, largest known magnitude, |known sum|).
    pub fn scale(&self) -> f64 {
        let (kx, ky) = self.known_sum();
        self.terms
            .iter()
            .filter_map(|term| term.magnitude.known())
            .map(f64::abs)
            .fold(1.0f64.max(kx.hypot(ky)), f64::max)
    }
}

fn operand_expr(operand: &Operand, unknowns: &UnknownSet) -> Expr {
    match operand {
        Operand::Known(value) => Expr::Const(*value),
        Operand::Unknown(position) => Expr::var(
            unknowns.symbols[*position].name.as_str(),
            *position as u32,
        ),
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn trig(self) -> &'static str {
        match self {
            Axis::X => "cos",
            Axis::Y => "sin",
        }
    }

    fn project(self, angle_degrees: f64) -> f64 {
        match self {
            Axis::X => angle_degrees.to_radians().cos(),
            Axis::Y => angle_degrees.to_radians().sin(),
        }
    }
}

fn raw_text(magnitude: Field, angle: Field, names: &(String, String)) -> (String, String) {
    let magnitude = match magnitude {
        Field::Known(value) => format!("{value:.1}"),
        Field::Unknown => names.0.clone(),
    };
    let angle = match angle {
        Field::Known(value) => format!("{value:.0}°"),
        Field::Unknown => names.1.clone(),
    };
    (magnitude, angle)
}

/// One term with known factors folded to three decimals.
fn evaluated_term(magnitude: Field, angle: Field, names: &(String, String), axis: Axis) -> String {
    match (magnitude, angle) {
        (Field::Known(m), Field::Known(a)) => fixed3(m * axis.project(a)),
        (Field::Known(m), Field::Unknown) => format!("{m:.3} {}({})", axis.trig(), names.1),
        (Field::Unknown, Field::Known(a)) => {
            let coefficient = axis.project(a);
            let shown = format!("{coefficient:.3}");
            match shown.as_str() {
                "1.000" => names.0.clone(),
                "-1.000" => format!("-{}", names.0),
                "0.000" | "-0.000" => "0".to_string(),
                _ => format!("{shown} {}", names.0),
            }
        }
        (Field::Unknown, Field::Unknown) => format!("{} {}({})", names.0, axis.trig(), names.1),
    }
}

/// Three-decimal text without a negative zero.
fn fixed3(value: f64) -> String {
    if value.abs() < 5e-4 {
        "0.000".to_string()
    } else {
        format!("{value:.3}")
    }
}

fn join_raw_terms(terms: &[String]) -> String {
    if terms.is_empty() {
        "0".to_string()
    } else {
        terms.join(" + ")
    }
}

/// Joins a folded constant and symbolic terms into one sum.
///
/// The constant is shown only if it exceeds 1e-6 in magnitude and `0` terms are dropped.
/// Negative terms are joined with `-` instead of `+ -`; an empty sum renders as `0`.
pub fn format_sum_with_constant(constant: f64, symbolic_terms: &[String]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(symbolic_terms.len() + 1);
    if constant.abs() > 1e-6 {
        parts.push(fixed3(constant));
    }

    for term in symbolic_terms.iter().map(|t| t.trim()) {
        if term == "0" {
            continue;
        }
        if term.starts_with('-') || parts.is_empty() {
            parts.push(term.to_string());
        } else {
            parts.push(format!("+ {term}"));
        }
    }

    if parts.is_empty() {
        return "0".to_string();
    }
    parts.join(" ").replace(" -", " - ")
}
