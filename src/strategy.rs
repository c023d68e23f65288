//! Dispatch between the fast path, the closed forms and the general solver.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::equations::{ForceBalance, Variant};
use crate::errors::SolveError;
use crate::expr::Expr;
use crate::solution::Value;
use crate::unknowns::{SymbolKind, UnknownSet};

/// How a solve call is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Nothing unknown: numeric evaluation only
    FastPath,
    /// Magnitude and angle of the force at `index` in an equilibrium problem
    ClosedFormForce { index: usize },
    /// R and α of a resultant problem with every force known
    ClosedFormResultant,
    General,
}

impl Strategy {
    pub fn select(unknowns: &UnknownSet, variant: Variant) -> Self {
        if unknowns.is_empty() {
            return Strategy::FastPath;
        }

        let kinds: Vec<SymbolKind> = unknowns.symbols.iter().map(|s| s.kind).collect();
        match (variant, kinds.as_slice()) {
            (Variant::Equilibrium, [SymbolKind::Magnitude(i), SymbolKind::Angle(j)]) if i == j => {
                Strategy::ClosedFormForce { index: *i }
            }
            (Variant::Resultant, [SymbolKind::ResultantMagnitude, SymbolKind::ResultantAngle]) => {
                Strategy::ClosedFormResultant
            }
            _ => Strategy::General,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::FastPath => write!(f, "fast path"),
            Strategy::ClosedFormForce { index } => write!(f, "closed form for F{}", index + 1),
            Strategy::ClosedFormResultant => write!(f, "closed form for R and alpha"),
            Strategy::General => write!(f, "general solver"),
        }
    }
}

/// The single force that balances all known forces: `F = |V|`, `θ = atan2(V)`.
///
/// Returns `[F, θ]` with θ in radians.
pub fn closed_form_force(balance: &ForceBalance, unknowns: &UnknownSet) -> Vec<Value> {
    let (kx, ky) = balance.known_sum();
    // Subtracting from +0 keeps a balanced sum at +0, so θ comes out as 0 and not −π
    let (rx, ry) = (0.0 - kx, 0.0 - ky);
    let values = vec![Value::real(rx.hypot(ry)), Value::real(ry.atan2(rx))];
    log_residual(balance, unknowns, &values);
    values
}

/// The resultant of fully known forces: `R = |ΣF|`, `α = atan2(ΣF)`.
///
/// Every force operand is a constant here, so ΣFx and ΣFy evaluate directly.
///
/// # Errors
/// Returns `SolveError::Indeterminate` if a force sum still references an unknown.
pub fn closed_form_resultant(
    balance: &ForceBalance,
    unknowns: &UnknownSet,
) -> Result<Vec<Value>, SolveError> {
    let evaluate = |sum: &Expr| {
        sum.constant_value().ok_or_else(|| {
            SolveError::Indeterminate("force sums reference an unknown".to_string())
        })
    };
    let rx = evaluate(&balance.sum_fx)?;
    let ry = evaluate(&balance.sum_fy)?;

    let values = vec![Value::real(rx.hypot(ry)), Value::real(ry.atan2(rx))];
    log_residual(balance, unknowns, &values);
    Ok(values)
}

fn log_residual(balance: &ForceBalance, unknowns: &UnknownSet, values: &[Value]) {
    let bound: HashMap<String, f64> = unknowns
        .names()
        .into_iter()
        .zip(values.iter().filter_map(Value::as_real))
        .collect();
    if let Some((rx, ry)) = balance.residual_at(&bound) {
        debug!("closed-form residual: ({rx:e}, {ry:e})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::{Field, Force};
    use approx::assert_relative_eq;

    fn setup(forces: &[Force], resultant: Option<(Field, Field)>) -> (UnknownSet, ForceBalance) {
        let unknowns = UnknownSet::classify(forces, resultant).unwrap();
        let balance = ForceBalance::build(forces, resultant, &unknowns);
        (unknowns, balance)
    }

    #[test]
    fn test_select() {
        let (unknowns, _) = setup(&[Force::known(1.0, 0.0)], None);
        assert_eq!(Strategy::select(&unknowns, Variant::Equilibrium), Strategy::FastPath);

        let (unknowns, _) = setup(&[Force::known(1.0, 0.0), Force::unknown()], None);
        assert_eq!(
            Strategy::select(&unknowns, Variant::Equilibrium),
            Strategy::ClosedFormForce { index: 1 }
        );
        // A force's own pair in a resultant problem is not closed form
        assert_eq!(Strategy::select(&unknowns, Variant::Resultant), Strategy::General);

        let (unknowns, _) = setup(
            &[Force::known(1.0, 0.0)],
            Some((Field::Unknown, Field::Unknown)),
        );
        assert_eq!(
            Strategy::select(&unknowns, Variant::Resultant),
            Strategy::ClosedFormResultant
        );

        let (unknowns, _) = setup(
            &[Force::new(Field::Unknown, 0.0), Force::new(1.0, Field::Unknown)],
            None,
        );
        assert_eq!(Strategy::select(&unknowns, Variant::Equilibrium), Strategy::General);
    }

    #[test]
    fn test_closed_form_force_balances() {
        let forces = [
            Force::known(10.0, 0.0),
            Force::known(10.0, 90.0),
            Force::unknown(),
        ];
        let (unknowns, balance) = setup(&forces, None);
        let values = closed_form_force(&balance, &unknowns);

        assert_relative_eq!(values[0].as_real().unwrap(), 200f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(
            values[1].as_real().unwrap(),
            -3.0 * std::f64::consts::FRAC_PI_4,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_closed_form_force_for_balanced_knowns_points_along_zero() {
        let (unknowns, balance) = setup(&[Force::unknown()], None);
        let values = closed_form_force(&balance, &unknowns);
        assert_eq!(values[0].as_real(), Some(0.0));
        let angle = values[1].as_real().unwrap();
        assert_eq!(angle, 0.0);
        assert!(angle.is_sign_positive());
    }

    #[test]
    fn test_closed_form_resultant() -> Result<(), Box<dyn std::error::Error>> {
        let forces = [Force::known(3.0, 0.0), Force::known(4.0, 90.0)];
        let (unknowns, balance) = setup(&forces, Some((Field::Unknown, Field::Unknown)));
        let values = closed_form_resultant(&balance, &unknowns)?;

        assert_relative_eq!(values[0].as_real().unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(values[1].as_real().unwrap(), 4f64.atan2(3.0), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_strategy_serializes_with_kind_tag() -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(&Strategy::ClosedFormForce { index: 2 })?;
        assert_eq!(json, r#"{"kind":"closed_form_force","index":2}"#);
        assert_eq!(serde_json::to_string(&Strategy::General)?, r#"{"kind":"general"}"#);
        Ok(())
    }
}
