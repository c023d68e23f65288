//! Simultaneous solve of the two balance equations for any unknown pattern.
//!
//! All terms are moved to one side, `Σ s_k m_k u(θ_k) = 0`, and the fully known terms
//! are folded into the required vector `V = -Σ known`. One or two unknowns are then solved
//! geometrically:
//!
//! - a magnitude: projection of `V` onto the known direction
//! - an angle: direction of `V`, if the known magnitude matches `|V|`
//! - two magnitudes: 2 × 2 linear system (Cramer's rule)
//! - two angles: intersection of two circles (law of cosines)
//! - a magnitude and another term's angle: quadratic in the magnitude
//! - a magnitude and its own angle: `±|V|` along `V`
//!
//! Where the circles do not meet, the complex roots are produced. Real roots are checked
//! against the JIT-compiled residuals. Three or more unknowns go to [`crate::newton`].

use log::debug;
use num::complex::Complex64;

use crate::config::SolverConfig;
use crate::equations::{ForceBalance, Operand, Term};
use crate::errors::SolveError;
use crate::newton::{self, NewtonOptions};
use crate::solution::Value;
use crate::system::EquationSystem;
use crate::unknowns::UnknownSet;

/// Raw root: one value per unknown in `UnknownSet` order, angles in radians.
pub type Candidate = Vec<Value>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn unit(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    fn sub_scaled(self, a: f64, u: Vec2) -> Vec2 {
        Self::new(self.x - a * u.x, self.y - a * u.y)
    }
}

/// Where an unknown sits: which term, and whether it is the magnitude or the angle.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Magnitude(usize),
    Angle(usize),
}

/// Solves the balance for every unknown of `unknowns`.
///
/// # Errors
/// - `SolveError::Indeterminate` when the unknowns are left free by a degenerate geometry
/// - `SolveError::NoConvergence` when the iterative solver finds nothing
/// - `SolveError::Jit` when the residual system fails to compile
pub fn solve(
    balance: &ForceBalance,
    unknowns: &UnknownSet,
    config: &SolverConfig,
) -> Result<Vec<Candidate>, SolveError> {
    let scale = balance.scale();
    let tolerance = config.tolerance * scale;
    let (kx, ky) = balance.known_sum();
    let required = Vec2::new(0.0 - kx, 0.0 - ky);

    let system = EquationSystem::from_exprs(&balance.residuals(), &unknowns.names())?;
    let slots = slots(&balance.terms, unknowns.len())?;

    let candidates = match slots.as_slice() {
        [] => Vec::new(),
        [single] => solve_single(&balance.terms, *single, required, tolerance)?,
        [first, second] => solve_pair(&balance.terms, *first, *second, required, tolerance)?,
        _ => {
            let is_angle: Vec<bool> = slots.iter().map(|s| matches!(s, Slot::Angle(_))).collect();
            let options = NewtonOptions {
                max_iterations: config.newton_max_iterations,
                max_seeds: config.newton_max_seeds,
                max_roots: config.max_representatives,
                tolerance: config.verify_tolerance * scale,
                dedup_tolerance: config.dedup_tolerance * scale,
                scale,
            };
            newton::solve(&system, &is_angle, &options)?
                .into_iter()
                .map(|root| root.into_iter().map(Value::real).collect())
                .collect()
        }
    };
    debug!("raw candidates: {candidates:?}");

    verify(&system, candidates, config.verify_tolerance * scale)
}

fn slots(terms: &[Term], count: usize) -> Result<Vec<Slot>, SolveError> {
    let mut slots = vec![None; count];
    for (k, term) in terms.iter().enumerate() {
        if let Operand::Unknown(p) = term.magnitude {
            slots[p] = Some(Slot::Magnitude(k));
        }
        if let Operand::Unknown(p) = term.angle {
            slots[p] = Some(Slot::Angle(k));
        }
    }
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SolveError::Indeterminate("an unknown appears in no term".to_string()))
}

fn known(operand: Operand) -> Result<f64, SolveError> {
    operand
        .known()
        .ok_or_else(|| SolveError::Indeterminate("expected a known operand".to_string()))
}

/// Keeps complex candidates and the real candidates whose residual is within `tolerance`.
fn verify(
    system: &EquationSystem,
    candidates: Vec<Candidate>,
    tolerance: f64,
) -> Result<Vec<Candidate>, SolveError> {
    let points: Vec<Vec<f64>> = candidates
        .iter()
        .filter_map(|c| c.iter().map(Value::as_real).collect::<Option<Vec<f64>>>())
        .collect();
    let residuals = system.eval_parallel(&points)?;
    let mut residuals = residuals.into_iter();

    Ok(candidates
        .into_iter()
        .filter(|candidate| {
            if !candidate.iter().all(Value::is_real) {
                return true;
            }
            let norm = residuals
                .next()
                .map_or(f64::INFINITY, |r| r.iter().map(|v| v * v).sum::<f64>().sqrt());
            if norm > tolerance {
                debug!("dropping candidate {candidate:?} with residual {norm}");
            }
            norm <= tolerance
        })
        .collect())
}

fn solve_single(
    terms: &[Term],
    slot: Slot,
    required: Vec2,
    tolerance: f64,
) -> Result<Vec<Candidate>, SolveError> {
    match slot {
        Slot::Magnitude(k) => {
            let term = &terms[k];
            let u = Vec2::unit(known(term.angle)?);
            // Off-line part of V cannot be balanced
            if u.cross(required).abs() > tolerance {
                return Ok(Vec::new());
            }
            let a = required.dot(u);
            Ok(vec![vec![Value::real(term.sign * a)]])
        }
        Slot::Angle(k) => {
            let term = &terms[k];
            let p = term.sign * known(term.magnitude)?;
            let d = required.norm();
            if p.abs() <= tolerance {
                if d <= tolerance {
                    return Err(SolveError::Indeterminate(
                        "a zero force leaves its angle free".to_string(),
                    ));
                }
                return Ok(Vec::new());
            }
            if (d - p.abs()).abs() > tolerance {
                return Ok(Vec::new());
            }
            let theta = (required.y / p).atan2(required.x / p);
            Ok(vec![vec![Value::real(theta)]])
        }
    }
}

fn solve_pair(
    terms: &[Term],
    first: Slot,
    second: Slot,
    required: Vec2,
    tolerance: f64,
) -> Result<Vec<Candidate>, SolveError> {
    match (first, second) {
        (Slot::Magnitude(i), Slot::Angle(j)) if i == j => own_angle(&terms[i], required, tolerance, false),
        (Slot::Angle(i), Slot::Magnitude(j)) if i == j => own_angle(&terms[i], required, tolerance, true),
        (Slot::Magnitude(i), Slot::Magnitude(j)) => two_magnitudes(&terms[i], &terms[j], required, tolerance),
        (Slot::Angle(i), Slot::Angle(j)) => two_angles(&terms[i], &terms[j], required, tolerance),
        (Slot::Magnitude(i), Slot::Angle(j)) => {
            magnitude_and_angle(&terms[i], &terms[j], required, tolerance, false)
        }
        (Slot::Angle(j), Slot::Magnitude(i)) => {
            magnitude_and_angle(&terms[i], &terms[j], required, tolerance, true)
        }
    }
}

/// Orders a (magnitude, angle) pair as the unknowns are ordered.
fn ordered(magnitude: Value, angle: Value, angle_first: bool) -> Candidate {
    if angle_first {
        vec![angle, magnitude]
    } else {
        vec![magnitude, angle]
    }
}

/// Magnitude and angle of the same term: `s a u(θ) = V` with `a = ±|V|`.
fn own_angle(
    term: &Term,
    required: Vec2,
    tolerance: f64,
    angle_first: bool,
) -> Result<Vec<Candidate>, SolveError> {
    let d = required.norm();
    if d <= tolerance {
        return Err(SolveError::Indeterminate(
            "the known forces already balance, so the direction of a zero force is free"
                .to_string(),
        ));
    }
    let phi = required.angle();
    Ok(vec![
        ordered(
            Value::real(term.sign * d),
            Value::real(phi),
            angle_first,
        ),
        ordered(
            Value::real(-term.sign * d),
            Value::real(phi + std::f64::consts::PI),
            angle_first,
        ),
    ])
}

fn two_magnitudes(
    first: &Term,
    second: &Term,
    required: Vec2,
    tolerance: f64,
) -> Result<Vec<Candidate>, SolveError> {
    let ui = Vec2::unit(known(first.angle)?);
    let uj = Vec2::unit(known(second.angle)?);
    let det = ui.cross(uj);

    if det.abs() <= 1e-12 {
        // Collinear directions span a line only
        if ui.cross(required).abs() <= tolerance {
            return Err(SolveError::Indeterminate(
                "two unknown magnitudes along the same line".to_string(),
            ));
        }
        return Ok(Vec::new());
    }

    let a = required.cross(uj) / det;
    let b = ui.cross(required) / det;
    Ok(vec![vec![
        Value::real(first.sign * a),
        Value::real(second.sign * b),
    ]])
}

/// Angle of the second term from the remainder `w = (V - a u_i) / q`, complex-safe.
fn remainder_angle(x: Complex64, y: Complex64) -> Complex64 {
    // cos θ = x, sin θ = y  =>  θ = -i ln(x + i y)
    -Complex64::i() * (x + Complex64::i() * y).ln()
}

fn two_angles(
    first: &Term,
    second: &Term,
    required: Vec2,
    tolerance: f64,
) -> Result<Vec<Candidate>, SolveError> {
    let p = first.sign * known(first.magnitude)?;
    let q = second.sign * known(second.magnitude)?;
    let d = required.norm();

    let p_zero = p.abs() <= tolerance;
    let q_zero = q.abs() <= tolerance;
    if p_zero || q_zero || d <= tolerance {
        // One force is free to rotate whenever the lengths are consistent
        let consistent = match (p_zero, q_zero) {
            (true, true) => d <= tolerance,
            (true, false) => (q.abs() - d).abs() <= tolerance,
            (false, true) => (p.abs() - d).abs() <= tolerance,
            (false, false) => (p.abs() - q.abs()).abs() <= tolerance,
        };
        if consistent {
            return Err(SolveError::Indeterminate(
                "an unknown angle is left free".to_string(),
            ));
        }
        return Ok(Vec::new());
    }

    let phi = required.angle();
    let c = (d * d + p * p - q * q) / (2.0 * p * d);

    if c.abs() <= 1.0 + 1e-12 {
        let delta = c.clamp(-1.0, 1.0).acos();
        let mut roots = vec![phi + delta];
        if delta > 1e-9 {
            roots.push(phi - delta);
        }
        return Ok(roots
            .into_iter()
            .map(|theta_i| {
                let w = required.sub_scaled(p, Vec2::unit(theta_i));
                let theta_j = (w.y / q).atan2(w.x / q);
                vec![Value::real(theta_i), Value::real(theta_j)]
            })
            .collect());
    }

    // The circles do not meet
    let delta = Complex64::new(c, 0.0).acos();
    Ok([phi + delta, phi - delta]
        .into_iter()
        .map(|theta_i| {
            let x = (required.x - p * theta_i.cos()) / q;
            let y = (required.y - p * theta_i.sin()) / q;
            vec![
                Value::complex(theta_i),
                Value::complex(remainder_angle(x, y)),
            ]
        })
        .collect())
}

/// Magnitude of `first` (known direction) and angle of `second` (known magnitude).
fn magnitude_and_angle(
    first: &Term,
    second: &Term,
    required: Vec2,
    tolerance: f64,
    angle_first: bool,
) -> Result<Vec<Candidate>, SolveError> {
    let u = Vec2::unit(known(first.angle)?);
    let q = second.sign * known(second.magnitude)?;

    if q.abs() <= tolerance {
        if u.cross(required).abs() <= tolerance {
            return Err(SolveError::Indeterminate(
                "a zero force leaves its angle free".to_string(),
            ));
        }
        return Ok(Vec::new());
    }

    // a² - 2a(V·u) + |V|² - q² = 0
    let b = required.dot(u);
    let off_line = u.cross(required);
    let disc = q * q - off_line * off_line;

    if disc >= -(tolerance * tolerance) {
        let root = disc.max(0.0).sqrt();
        let mut roots = vec![b + root];
        if root > 1e-9 {
            roots.push(b - root);
        }
        return Ok(roots
            .into_iter()
            .map(|a| {
                let w = required.sub_scaled(a, u);
                let theta = (w.y / q).atan2(w.x / q);
                ordered(Value::real(first.sign * a), Value::real(theta), angle_first)
            })
            .collect());
    }

    let root = (-disc).sqrt();
    Ok([
        Complex64::new(b, root),
        Complex64::new(b, -root),
    ]
    .into_iter()
    .map(|a| {
        let x = (required.x - a * u.x) / q;
        let y = (required.y - a * u.y) / q;
        ordered(
            Value::complex(a * first.sign),
            Value::complex(remainder_angle(x, y)),
            angle_first,
        )
    })
    .collect())
}
