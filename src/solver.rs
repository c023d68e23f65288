//! Public solve entry points and their report records.
//!
//! A solve is a pure function of its inputs: validation, equation construction,
//! classification, strategy dispatch and solution selection all happen per call. Every
//! failure is recovered into the report, so the entry points never return an error or
//! panic.
//!
//! # Example
//!
//! ```rust
//! use concurrent_forces::prelude::*;
//!
//! let report = Solver::default().solve_equilibrium(&[
//!     Force::known(10.0, 0.0),
//!     Force::unknown(),
//! ]);
//! let solution = &report.outcome.solutions[0];
//! assert_eq!(format!("{solution:.1}"), "F2 = 10.0, theta_F2 = 180.0°");
//! ```

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::SolverConfig;
use crate::equations::{EquationDisplay, ForceBalance};
use crate::errors::ValidationError;
use crate::fast_path::{self, FastPathResult};
use crate::filter::{self, Selection};
use crate::force::{normalize_degrees, Field, Force, RESULTANT_ANGLE_LABEL, RESULTANT_MAGNITUDE_LABEL};
use crate::general;
use crate::solution::{Solution, Value};
use crate::strategy::{self, Strategy};
use crate::unknowns::{Determinacy, SymbolKind, UnknownSet, EQUATION_COUNT};

/// Informational messages attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// A field failed validation; nothing else in the report is meaningful
    Invalid { message: String },
    Underdetermined { unknowns: usize },
    Overdetermined { unknowns: usize },
    /// Only real solutions with some negative magnitude exist
    NegativeMagnitudes,
    /// Only complex solutions exist
    ComplexOnly,
    NoSolution,
    SolveFailed { reason: String },
    InEquilibrium,
    NotInEquilibrium { magnitude: f64, angle_degrees: f64 },
    /// The computed resultant matches the supplied (R, α)
    Consistent,
    Inconsistent { magnitude: f64, angle_degrees: f64 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Invalid { message } => write!(f, "{message}"),
            Advisory::Underdetermined { unknowns } => write!(
                f,
                "underdetermined system: {unknowns} unknowns but only {EQUATION_COUNT} equations; \
                 the solutions shown are representatives of a family"
            ),
            Advisory::Overdetermined { unknowns } => write!(
                f,
                "overdetermined system: {unknowns} unknown(s) but {EQUATION_COUNT} equations; \
                 a solution might not exist"
            ),
            Advisory::NegativeMagnitudes => write!(
                f,
                "no solution with all magnitudes non-negative; negative magnitudes act in the reversed direction"
            ),
            Advisory::ComplexOnly => write!(
                f,
                "no real solution; the complex solutions shown are not physical"
            ),
            Advisory::NoSolution => write!(f, "no solution found for the given system"),
            Advisory::SolveFailed { reason } => write!(f, "solve failed: {reason}"),
            Advisory::InEquilibrium => write!(f, "the forces are in equilibrium"),
            Advisory::NotInEquilibrium {
                magnitude,
                angle_degrees,
            } => write!(
                f,
                "not in equilibrium: the forces sum to {magnitude:.3} @ {angle_degrees:.2}°"
            ),
            Advisory::Consistent => write!(f, "the calculated resultant matches the input"),
            Advisory::Inconsistent {
                magnitude,
                angle_degrees,
            } => write!(
                f,
                "the calculated resultant {magnitude:.3} @ {angle_degrees:.2}° does not match the input"
            ),
        }
    }
}

/// Fields shared by both report kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    /// A validation failure occurred
    pub error: bool,
    pub messages: Vec<Advisory>,
    /// Possibly empty. Angles in degrees
    pub solutions: Vec<Solution>,
    pub unknown_symbols: Vec<String>,
    pub underdetermined: bool,
    pub overdetermined: bool,
    pub strategy: Option<Strategy>,
    /// Tier of the preference chain, for general-solver results
    pub selection: Option<Selection>,
    pub equations: Option<EquationDisplay>,
}

impl Outcome {
    fn invalid(error: &ValidationError) -> Self {
        warn!("invalid input: {error}");
        Self {
            error: true,
            messages: vec![Advisory::Invalid {
                message: error.to_string(),
            }],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EquilibriumReport {
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Set when nothing is unknown
    pub equilibrium_magnitude: Option<f64>,
    pub equilibrium_angle_degrees: Option<f64>,
    pub in_equilibrium: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultantReport {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub resultant_symbol: &'static str,
    pub resultant_angle_symbol: &'static str,
    /// Computed resultant: from the numeric sums, or from the closed-form (R, α) solve
    pub resultant_magnitude: Option<f64>,
    pub resultant_angle_degrees: Option<f64>,
    /// Whether a fully known system matches the supplied (R, α)
    pub consistent_with_input: Option<bool>,
}

impl Default for ResultantReport {
    fn default() -> Self {
        Self {
            outcome: Outcome::default(),
            resultant_symbol: "R",
            resultant_angle_symbol: "alpha",
            resultant_magnitude: None,
            resultant_angle_degrees: None,
            consistent_with_input: None,
        }
    }
}

/// Intermediate state of one call, before it is shaped into a report.
struct Run {
    outcome: Outcome,
    fast: Option<FastPathResult>,
}

/// Solves concurrent force systems with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Finds the unknowns that make the forces sum to zero.
    pub fn solve_equilibrium(&self, forces: &[Force]) -> EquilibriumReport {
        let Run { mut outcome, fast } = match self.run(forces, None) {
            Ok(run) => run,
            Err(error) => {
                return EquilibriumReport {
                    outcome: Outcome::invalid(&error),
                    ..EquilibriumReport::default()
                }
            }
        };

        let Some(fast) = fast else {
            return EquilibriumReport {
                outcome,
                ..EquilibriumReport::default()
            };
        };

        outcome.messages.push(if fast.in_equilibrium {
            Advisory::InEquilibrium
        } else {
            Advisory::NotInEquilibrium {
                magnitude: fast.magnitude,
                angle_degrees: fast.angle_degrees,
            }
        });
        EquilibriumReport {
            outcome,
            equilibrium_magnitude: Some(fast.magnitude),
            equilibrium_angle_degrees: Some(fast.angle_degrees),
            in_equilibrium: Some(fast.in_equilibrium),
        }
    }

    /// Parses `(magnitude, angle)` text pairs, then solves for equilibrium.
    pub fn solve_equilibrium_text<S: AsRef<str>>(&self, fields: &[(S, S)]) -> EquilibriumReport {
        match parse_forces(fields) {
            Ok(forces) => self.solve_equilibrium(&forces),
            Err(error) => EquilibriumReport {
                outcome: Outcome::invalid(&error),
                ..EquilibriumReport::default()
            },
        }
    }

    /// Finds the unknowns that make the forces sum to the resultant `(R, α)`.
    ///
    /// With every field known the resultant is computed numerically and compared with
    /// the supplied values.
    pub fn solve_resultant(&self, forces: &[Force], magnitude: Field, angle_degrees: Field) -> ResultantReport {
        let Run { mut outcome, fast } = match self.run(forces, Some((magnitude, angle_degrees))) {
            Ok(run) => run,
            Err(error) => {
                return ResultantReport {
                    outcome: Outcome::invalid(&error),
                    ..ResultantReport::default()
                }
            }
        };

        if let Some(fast) = fast {
            let consistent = fast_path::is_consistent(&fast, magnitude, angle_degrees, &self.config);
            outcome.messages.push(if consistent {
                Advisory::Consistent
            } else {
                warn!(
                    "calculated resultant {} @ {}° is inconsistent with the input",
                    fast.magnitude, fast.angle_degrees
                );
                Advisory::Inconsistent {
                    magnitude: fast.magnitude,
                    angle_degrees: fast.angle_degrees,
                }
            });
            return ResultantReport {
                outcome,
                resultant_magnitude: Some(fast.magnitude),
                resultant_angle_degrees: Some(fast.angle_degrees),
                consistent_with_input: Some(consistent),
                ..ResultantReport::default()
            };
        }

        let (resultant_magnitude, resultant_angle_degrees) =
            match (outcome.strategy, outcome.solutions.first()) {
                (Some(Strategy::ClosedFormResultant), Some(solution)) => (
                    solution.get("R").and_then(|v| v.as_real()),
                    solution.get("alpha").and_then(|v| v.as_real()),
                ),
                _ => (None, None),
            };
        ResultantReport {
            outcome,
            resultant_magnitude,
            resultant_angle_degrees,
            ..ResultantReport::default()
        }
    }

    /// Parses force text pairs and the `(R, α)` text, then solves for the resultant.
    pub fn solve_resultant_text<S: AsRef<str>>(
        &self,
        fields: &[(S, S)],
        magnitude: &str,
        angle_degrees: &str,
    ) -> ResultantReport {
        let parsed = parse_forces(fields).and_then(|forces| {
            let magnitude = Field::parse(RESULTANT_MAGNITUDE_LABEL, magnitude)?;
            let angle = Field::parse(RESULTANT_ANGLE_LABEL, angle_degrees)?;
            Ok((forces, magnitude, angle))
        });
        match parsed {
            Ok((forces, magnitude, angle)) => self.solve_resultant(&forces, magnitude, angle),
            Err(error) => ResultantReport {
                outcome: Outcome::invalid(&error),
                ..ResultantReport::default()
            },
        }
    }

    fn run(&self, forces: &[Force], resultant: Option<(Field, Field)>) -> Result<Run, ValidationError> {
        debug!("input forces: {forces:?}, resultant: {resultant:?}");
        let unknowns = UnknownSet::classify(forces, resultant)?;
        let balance = ForceBalance::build(forces, resultant, &unknowns);
        debug!("equations:\n{}", balance.display);
        debug!("unknowns: {:?}", unknowns.names());

        let determinacy = unknowns.determinacy();
        let mut outcome = Outcome {
            unknown_symbols: unknowns.names(),
            underdetermined: determinacy == Determinacy::Underdetermined,
            overdetermined: determinacy == Determinacy::Overdetermined,
            equations: Some(balance.display.clone()),
            ..Outcome::default()
        };

        if !unknowns.is_empty() {
            let advisory = match determinacy {
                Determinacy::Underdetermined => Some(Advisory::Underdetermined {
                    unknowns: unknowns.len(),
                }),
                Determinacy::Overdetermined => Some(Advisory::Overdetermined {
                    unknowns: unknowns.len(),
                }),
                Determinacy::Exact => None,
            };
            if let Some(advisory) = advisory {
                warn!("{advisory}");
                outcome.messages.push(advisory);
            }
        }

        let strategy = Strategy::select(&unknowns, balance.variant);
        info!("strategy: {strategy}");
        outcome.strategy = Some(strategy);

        let mut fast = None;
        match strategy {
            Strategy::FastPath => fast = Some(fast_path::evaluate(&balance, &self.config)),
            Strategy::ClosedFormForce { .. } => {
                let values = strategy::closed_form_force(&balance, &unknowns);
                outcome.solutions = vec![Solution::from_radians(&unknowns, &values)];
            }
            Strategy::ClosedFormResultant => match strategy::closed_form_resultant(&balance, &unknowns) {
                Ok(values) => outcome.solutions = vec![Solution::from_radians(&unknowns, &values)],
                Err(error) => self.record_failure(&mut outcome, error.to_string()),
            },
            Strategy::General => match general::solve(&balance, &unknowns, &self.config) {
                Ok(candidates) => {
                    let candidates: Vec<Solution> = candidates
                        .iter()
                        .map(|values| Solution::from_radians(&unknowns, values))
                        .collect();
                    let (selection, surfaced) = filter::select(&candidates);
                    match selection {
                        Selection::DirectionReversed => outcome.messages.push(Advisory::NegativeMagnitudes),
                        Selection::NonPhysical => outcome.messages.push(Advisory::ComplexOnly),
                        Selection::Empty => outcome.messages.push(Advisory::NoSolution),
                        Selection::Preferred => {}
                    }
                    outcome.selection = Some(selection);
                    outcome.solutions = surfaced;
                }
                Err(error) => self.record_failure(&mut outcome, error.to_string()),
            },
        }

        for solution in &outcome.solutions {
            info!("solution: {solution:.precision$}", precision = self.config.magnitude_decimals as usize);
        }
        Ok(Run { outcome, fast })
    }

    fn record_failure(&self, outcome: &mut Outcome, reason: String) {
        warn!("solve failed: {reason}");
        outcome.messages.push(Advisory::SolveFailed { reason });
    }
}

fn parse_forces<S: AsRef<str>>(fields: &[(S, S)]) -> Result<Vec<Force>, ValidationError> {
    fields
        .iter()
        .enumerate()
        .map(|(i, (magnitude, angle))| Force::from_text(i, magnitude.as_ref(), angle.as_ref()))
        .collect()
}

/// Solves for equilibrium with the default configuration.
pub fn solve_for_equilibrium(forces: &[Force]) -> EquilibriumReport {
    Solver::default().solve_equilibrium(forces)
}

/// Solves for the resultant with the default configuration.
pub fn solve_for_resultant(forces: &[Force], magnitude: Field, angle_degrees: Field) -> ResultantReport {
    Solver::default().solve_resultant(forces, magnitude, angle_degrees)
}

/// Fills every unknown field of `forces` from `solution`, as a renderer would draw them.
///
/// Negative magnitudes are flipped to their physical direction (angle + 180°). Returns
/// `None` if a field stays unresolved or is complex.
pub fn resolved_forces(forces: &[Force], solution: &Solution) -> Option<Vec<Force>> {
    let resolve = |field: Field, kind: SymbolKind| match field {
        Field::Known(value) => Some(value),
        Field::Unknown => solution.get(&kind.name()).as_ref().and_then(Value::as_real),
    };

    forces
        .iter()
        .enumerate()
        .map(|(i, force)| {
            let magnitude = resolve(force.magnitude, SymbolKind::Magnitude(i))?;
            let angle = resolve(force.angle, SymbolKind::Angle(i))?;
            Some(if magnitude < 0.0 {
                Force::known(-magnitude, normalize_degrees(angle + 180.0))
            } else {
                Force::known(magnitude, angle)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn value(solution: &Solution, name: &str) -> f64 {
        solution.get(name).and_then(|v| v.as_real()).unwrap()
    }

    #[test]
    fn test_single_unknown_force_balances_one_known() {
        let report = solve_for_equilibrium(&[Force::known(10.0, 0.0), Force::unknown()]);

        assert!(!report.outcome.error);
        assert_eq!(report.outcome.unknown_symbols, vec!["F2", "theta_F2"]);
        assert_eq!(report.outcome.strategy, Some(Strategy::ClosedFormForce { index: 1 }));
        assert_eq!(report.outcome.solutions.len(), 1);
        let solution = &report.outcome.solutions[0];
        assert_relative_eq!(value(solution, "F2"), 10.0, epsilon = 1e-9);
        assert_relative_eq!(value(solution, "theta_F2"), 180.0, epsilon = 1e-9);
        assert!(!report.outcome.underdetermined);
        assert!(!report.outcome.overdetermined);
        assert!(report.outcome.messages.is_empty());
        assert_eq!(report.in_equilibrium, None);
    }

    #[test]
    fn test_two_perpendicular_forces() {
        let report = solve_for_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::known(10.0, 90.0),
            Force::unknown(),
        ]);
        let solution = &report.outcome.solutions[0];
        assert_relative_eq!(value(solution, "F3"), 14.142, epsilon = 1e-3);
        assert_relative_eq!(value(solution, "theta_F3"), 225.0, epsilon = 1e-9);
    }

    #[test]
    fn test_symmetric_triangle_takes_fast_path() {
        let report = solve_for_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::known(10.0, 120.0),
            Force::known(10.0, 240.0),
        ]);

        assert_eq!(report.outcome.strategy, Some(Strategy::FastPath));
        assert_eq!(report.in_equilibrium, Some(true));
        assert!(report.equilibrium_magnitude.unwrap() < 1e-6);
        assert!(report.outcome.solutions.is_empty());
        assert!(report.outcome.unknown_symbols.is_empty());
        assert!(report.outcome.overdetermined);
        assert_eq!(report.outcome.messages, vec![Advisory::InEquilibrium]);
        assert_eq!(report.outcome.selection, None);
    }

    #[test]
    fn test_fast_path_reports_exact_resultant() {
        let report = solve_for_equilibrium(&[Force::known(3.0, 0.0), Force::known(4.0, 90.0)]);
        assert_eq!(report.in_equilibrium, Some(false));
        assert_relative_eq!(report.equilibrium_magnitude.unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(
            report.equilibrium_angle_degrees.unwrap(),
            4f64.atan2(3.0).to_degrees(),
            epsilon = 1e-9
        );
        assert!(matches!(
            report.outcome.messages[0],
            Advisory::NotInEquilibrium { .. }
        ));
    }

    #[test]
    fn test_negative_magnitude_is_surfaced_as_reversed() {
        let report = solve_for_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::known(10.0, 0.0),
            Force::new(Field::Unknown, 0.0),
        ]);

        assert_eq!(report.outcome.strategy, Some(Strategy::General));
        assert_eq!(report.outcome.selection, Some(Selection::DirectionReversed));
        assert!(report.outcome.overdetermined);
        assert_eq!(
            report.outcome.messages,
            vec![
                Advisory::Overdetermined { unknowns: 1 },
                Advisory::NegativeMagnitudes
            ]
        );
        let solution = &report.outcome.solutions[0];
        assert_relative_eq!(value(solution, "F3"), -20.0, epsilon = 1e-9);
        assert_eq!(solution.reversed, vec!["F3"]);
    }

    #[test]
    fn test_underdetermined_representatives_are_capped() {
        let solver = Solver::new(SolverConfig {
            max_representatives: 3,
            ..SolverConfig::default()
        });
        let report = solver.solve_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::unknown(),
            Force::unknown(),
            Force::unknown(),
        ]);

        assert!(report.outcome.underdetermined);
        assert!(!report.outcome.solutions.is_empty());
        assert!(report.outcome.solutions.len() <= 3);
    }

    #[test]
    fn test_zero_balancing_force_points_along_zero_degrees() {
        let report = solve_for_equilibrium(&[Force::unknown()]);

        assert_eq!(report.outcome.solutions.len(), 1);
        let solution = &report.outcome.solutions[0];
        assert_eq!(value(solution, "F1"), 0.0);
        assert_eq!(value(solution, "theta_F1"), 0.0);
    }

    #[test]
    fn test_general_solve_does_not_panic() {
        let result = std::panic::catch_unwind(|| {
            solve_for_equilibrium(&[
                Force::known(2.0, 0.0),
                Force::new(3.0, Field::Unknown),
                Force::new(Field::Unknown, 90.0),
            ])
        });
        let report = result.expect("general solve panicked");
        assert!(!report.outcome.error);
        assert_eq!(report.outcome.strategy, Some(Strategy::General));
        assert_eq!(report.outcome.selection, Some(Selection::Preferred));
        assert_eq!(report.outcome.solutions.len(), 1);
    }

    #[test]
    fn test_closed_form_round_trip() {
        let forces = [
            Force::known(10.0, 0.0),
            Force::known(10.0, 90.0),
            Force::unknown(),
        ];
        let report = solve_for_equilibrium(&forces);
        let resolved = resolved_forces(&forces, &report.outcome.solutions[0]).unwrap();

        let check = solve_for_equilibrium(&resolved);
        assert_eq!(check.outcome.strategy, Some(Strategy::FastPath));
        assert_eq!(check.in_equilibrium, Some(true));
    }

    #[test]
    fn test_resolved_forces_flip_negative_magnitudes() {
        let forces = [
            Force::known(10.0, 0.0),
            Force::known(10.0, 0.0),
            Force::new(Field::Unknown, 0.0),
        ];
        let report = solve_for_equilibrium(&forces);
        let resolved = resolved_forces(&forces, &report.outcome.solutions[0]).unwrap();
        assert_eq!(resolved[2], Force::known(20.0, 180.0));
        assert_eq!(solve_for_equilibrium(&resolved).in_equilibrium, Some(true));
    }

    #[test]
    fn test_same_input_gives_same_report() -> Result<(), Box<dyn std::error::Error>> {
        let forces = [
            Force::known(10.0, 0.0),
            Force::new(Field::Unknown, 90.0),
            Force::unknown(),
        ];
        let first = solve_for_equilibrium(&forces);
        let second = solve_for_equilibrium(&forces);
        assert_eq!(first, second);
        assert_eq!(serde_json::to_string(&first)?, serde_json::to_string(&second)?);
        Ok(())
    }

    #[test]
    fn test_underdetermined_system_gives_representatives() {
        let report = solve_for_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::new(Field::Unknown, 90.0),
            Force::unknown(),
        ]);

        assert!(report.outcome.underdetermined);
        assert_eq!(
            report.outcome.messages[0],
            Advisory::Underdetermined { unknowns: 3 }
        );
        assert!(!report.outcome.solutions.is_empty());
        for solution in &report.outcome.solutions {
            assert!(solution.is_real());
            let f2 = value(solution, "F2");
            let f3 = value(solution, "F3");
            let theta = value(solution, "theta_F3").to_radians();
            assert!((10.0 + f3 * theta.cos()).abs() < 1e-4);
            assert!((f2 + f3 * theta.sin()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_complex_only_solutions() {
        let report = solve_for_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::new(1.0, Field::Unknown),
            Force::new(1.0, Field::Unknown),
        ]);
        assert_eq!(report.outcome.selection, Some(Selection::NonPhysical));
        assert!(report.outcome.messages.contains(&Advisory::ComplexOnly));
        assert!(report.outcome.solutions.iter().all(|s| !s.is_real()));
    }

    #[test]
    fn test_indeterminate_system_is_recovered() {
        let report = solve_for_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::new(Field::Unknown, 0.0),
            Force::new(Field::Unknown, 180.0),
        ]);
        assert!(!report.outcome.error);
        assert!(report.outcome.solutions.is_empty());
        assert!(matches!(
            report.outcome.messages.last(),
            Some(Advisory::SolveFailed { .. })
        ));
    }

    #[test]
    fn test_off_line_single_unknown_has_no_solution() {
        let report = solve_for_equilibrium(&[
            Force::known(10.0, 0.0),
            Force::new(Field::Unknown, 90.0),
        ]);
        assert!(report.outcome.solutions.is_empty());
        assert_eq!(report.outcome.selection, Some(Selection::Empty));
        assert!(report.outcome.messages.contains(&Advisory::NoSolution));
    }

    #[test]
    fn test_invalid_text_is_a_validation_error() {
        let report = Solver::default().solve_equilibrium_text(&[("10", "0"), ("1O", "90")]);

        assert!(report.outcome.error);
        assert!(report.outcome.solutions.is_empty());
        assert!(report.outcome.equations.is_none());
        assert_eq!(report.outcome.strategy, None);
        assert_eq!(
            report.outcome.messages,
            vec![Advisory::Invalid {
                message: "magnitude of F2: '1O' is not a real number".to_string()
            }]
        );
    }

    #[test]
    fn test_text_markers_for_unknowns() {
        let solver = Solver::default();
        let from_text = solver.solve_equilibrium_text(&[("10", "0"), ("", "?")]);
        let from_forces = solver.solve_equilibrium(&[Force::known(10.0, 0.0), Force::unknown()]);
        assert_eq!(from_text, from_forces);
    }

    #[test]
    fn test_resultant_consistency() {
        let solver = Solver::default();
        let fields = [("3", "0"), ("4", "90")];

        let report = solver.solve_resultant_text(&fields, "5", "53.13");
        assert_eq!(report.consistent_with_input, Some(true));
        assert_eq!(report.outcome.messages, vec![Advisory::Consistent]);
        assert_relative_eq!(report.resultant_magnitude.unwrap(), 5.0, epsilon = 1e-12);
        assert!(report.outcome.solutions.is_empty());

        let report = solver.solve_resultant_text(&fields, "5", "90");
        assert_eq!(report.consistent_with_input, Some(false));
        assert!(matches!(
            report.outcome.messages[0],
            Advisory::Inconsistent { .. }
        ));
    }

    #[test]
    fn test_resultant_closed_form() {
        let report = solve_for_resultant(
            &[Force::known(3.0, 0.0), Force::known(4.0, 90.0)],
            Field::Unknown,
            Field::Unknown,
        );
        assert_eq!(report.outcome.strategy, Some(Strategy::ClosedFormResultant));
        assert_eq!(report.resultant_symbol, "R");
        assert_eq!(report.resultant_angle_symbol, "alpha");
        assert_eq!(report.consistent_with_input, None);
        let solution = &report.outcome.solutions[0];
        assert_relative_eq!(value(solution, "R"), 5.0, epsilon = 1e-12);
        assert_relative_eq!(value(solution, "alpha"), 4f64.atan2(3.0).to_degrees(), epsilon = 1e-9);
        assert_eq!(report.resultant_magnitude, Some(value(solution, "R")));
    }

    #[test]
    fn test_resultant_with_unknown_force() {
        let report = solve_for_resultant(
            &[Force::known(10.0, 0.0), Force::new(Field::Unknown, 90.0)],
            Field::Unknown,
            Field::Known(45.0),
        );
        assert_eq!(report.outcome.strategy, Some(Strategy::General));
        assert_eq!(report.outcome.selection, Some(Selection::Preferred));
        let solution = &report.outcome.solutions[0];
        assert_relative_eq!(value(solution, "F2"), 10.0, epsilon = 1e-9);
        assert_relative_eq!(value(solution, "R"), 200f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_resultant_text() {
        let report = Solver::default().solve_resultant_text(&[("3", "0")], "five", "");
        assert!(report.outcome.error);
        assert_eq!(report.resultant_symbol, "R");
        assert!(report.outcome.messages[0]
            .to_string()
            .starts_with("resultant magnitude R"));
    }

    #[test]
    fn test_report_keys_are_always_present() -> Result<(), Box<dyn std::error::Error>> {
        let report = solve_for_equilibrium(&[Force::known(1.0, 0.0), Force::known(1.0, 180.0)]);
        let json = serde_json::to_value(&report)?;
        assert_eq!(json["error"], false);
        assert_eq!(json["solutions"], serde_json::json!([]));
        assert_eq!(json["in_equilibrium"], true);
        assert_eq!(json["strategy"]["kind"], "fast_path");
        assert!(json.get("equations").is_some());
        Ok(())
    }
}
