//! Multi-start Gauss–Newton iteration over the compiled residual system.
//!
//! With more unknowns than equations the roots form a continuous family. Each starting
//! point is driven onto that family with minimum-norm steps
//! `Δ = Jᵀ (J Jᵀ + λI)⁻¹ r`, and the distinct converged points are returned as
//! representatives.

use itertools::Itertools;
use log::debug;
use rayon::prelude::*;

use crate::errors::SolveError;
use crate::force::normalize_radians;
use crate::system::EquationSystem;

/// Extra iterations after convergence so duplicates agree to near machine precision.
const POLISH_ITERATIONS: usize = 3;

/// Settings of one multi-start run.
#[derive(Debug, Clone, Copy)]
pub struct NewtonOptions {
    pub max_iterations: usize,
    pub max_seeds: usize,
    /// Distinct roots kept, in seed order
    pub max_roots: usize,
    /// Absolute residual norm under which a point counts as a root
    pub tolerance: f64,
    /// Absolute distance under which two roots count as the same
    pub dedup_tolerance: f64,
    /// Typical magnitude, used to place the starting points
    pub scale: f64,
}

/// Runs Gauss–Newton from a deterministic grid of starting points.
///
/// `is_angle[j]` tells whether variable `j` of `system` is an angle in radians; angles
/// are normalized into `[0, 2π)` and compared modulo 2π.
///
/// # Errors
/// Returns `SolveError::NoConvergence` if no starting point converged.
pub fn solve(
    system: &EquationSystem,
    is_angle: &[bool],
    options: &NewtonOptions,
) -> Result<Vec<Vec<f64>>, SolveError> {
    let seeds = starting_points(is_angle, options.scale, options.max_seeds);
    debug!("running Gauss-Newton from {} starting points", seeds.len());

    let converged: Vec<Vec<f64>> = seeds
        .par_iter()
        .filter_map(|seed| iterate(system, seed, options))
        .map(|mut point| {
            for (value, angle) in point.iter_mut().zip(is_angle) {
                if *angle {
                    *value = normalize_radians(*value);
                }
            }
            point
        })
        .collect();

    let mut roots: Vec<Vec<f64>> = Vec::new();
    for point in converged {
        if roots.len() == options.max_roots.max(1) {
            break;
        }
        if !roots
            .iter()
            .any(|root| same_point(root, &point, is_angle, options.dedup_tolerance))
        {
            roots.push(point);
        }
    }

    if roots.is_empty() {
        return Err(SolveError::NoConvergence {
            iterations: options.max_iterations,
        });
    }
    debug!("{} distinct roots", roots.len());
    Ok(roots)
}

/// Starting points: magnitudes at `scale` and `scale / 2`, angles near the four axes.
///
/// The angle offsets differ per variable so that starting points do not sit on the
/// symmetric configurations where the Jacobian loses rank.
fn starting_points(is_angle: &[bool], scale: f64, max_seeds: usize) -> Vec<Vec<f64>> {
    if is_angle.is_empty() {
        return vec![Vec::new()];
    }

    is_angle
        .iter()
        .enumerate()
        .map(|(j, angle)| {
            if *angle {
                let offset = 0.1 * (j + 1) as f64;
                (0..4)
                    .map(|k| k as f64 * std::f64::consts::FRAC_PI_2 + offset)
                    .collect::<Vec<_>>()
            } else {
                vec![scale, 0.5 * scale]
            }
        })
        .multi_cartesian_product()
        .take(max_seeds.max(1))
        .collect()
}

fn residual_norm(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum::<f64>().sqrt()
}

/// Iterates from `seed`; returns the converged point or `None`.
fn iterate(system: &EquationSystem, seed: &[f64], options: &NewtonOptions) -> Option<Vec<f64>> {
    let mut x = seed.to_vec();
    let mut polish = 0;

    for _ in 0..options.max_iterations {
        let r = system.eval(&x).ok()?;
        if residual_norm(&r) <= options.tolerance {
            if polish == POLISH_ITERATIONS {
                return Some(x);
            }
            polish += 1;
        }

        let jacobian = system.jacobian(&x).ok()?;
        let Some(step) = min_norm_step(&jacobian, &r) else {
            return (polish > 0).then_some(x);
        };
        for (value, delta) in x.iter_mut().zip(&step) {
            *value -= delta;
        }
        if x.iter().any(|v| !v.is_finite()) {
            return None;
        }
    }

    let r = system.eval(&x).ok()?;
    (residual_norm(&r) <= options.tolerance).then_some(x)
}

/// Solves `J Δ = r` for the minimum-norm `Δ`, `J` being 2 × n.
///
/// A single unknown uses the least-squares step `Jᵀr / JᵀJ` instead.
fn min_norm_step(jacobian: &[Vec<f64>], r: &[f64]) -> Option<Vec<f64>> {
    let n = jacobian.first().map_or(0, Vec::len);
    let (j0, j1) = (&jacobian[0], &jacobian[1]);

    if n == 1 {
        let jtj = j0[0] * j0[0] + j1[0] * j1[0];
        if jtj == 0.0 {
            return None;
        }
        return Some(vec![(j0[0] * r[0] + j1[0] * r[1]) / jtj]);
    }

    // A = J Jᵀ (2 × 2), damped so rank-deficient points still give a finite step
    let a00: f64 = j0.iter().map(|v| v * v).sum();
    let a11: f64 = j1.iter().map(|v| v * v).sum();
    let a01: f64 = j0.iter().zip(j1).map(|(a, b)| a * b).sum();
    let damping = 1e-12 * (a00 + a11).max(1e-300);
    let (a00, a11) = (a00 + damping, a11 + damping);

    let det = a00 * a11 - a01 * a01;
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let y0 = (a11 * r[0] - a01 * r[1]) / det;
    let y1 = (a00 * r[1] - a01 * r[0]) / det;

    Some((0..n).map(|k| j0[k] * y0 + j1[k] * y1).collect())
}

/// Compares two points, angles modulo 2π.
fn same_point(a: &[f64], b: &[f64], is_angle: &[bool], tolerance: f64) -> bool {
    a.iter().zip(b).zip(is_angle).all(|((x, y), angle)| {
        let diff = if *angle {
            let d = normalize_radians(x - y);
            d.min(std::f64::consts::TAU - d)
        } else {
            (x - y).abs()
        };
        diff <= tolerance
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    fn component(m: &str, theta: &str, cos: bool) -> Box<Expr> {
        let angle = Box::new(Expr::var(theta, 0));
        let trig = if cos { Expr::Cos(angle) } else { Expr::Sin(angle) };
        Box::new(Expr::Mul(Box::new(Expr::var(m, 0)), Box::new(trig)))
    }

    /// F1 + F2 cos(theta_F2) + 10 = 0, F2 sin(theta_F2) - 5 = 0 over (F1, F2, theta_F2)
    fn underdetermined() -> EquationSystem {
        let fx = Expr::Add(
            Box::new(Expr::Add(
                Box::new(Expr::var("F1", 0)),
                component("F2", "theta_F2", true),
            )),
            Box::new(Expr::Const(10.0)),
        );
        let fy = Expr::Sub(component("F2", "theta_F2", false), Box::new(Expr::Const(5.0)));
        let variables = ["F1", "F2", "theta_F2"].map(String::from);
        EquationSystem::from_exprs(&[fx, fy], &variables).unwrap()
    }

    fn options() -> NewtonOptions {
        NewtonOptions {
            max_iterations: 100,
            max_seeds: 64,
            max_roots: 64,
            tolerance: 1e-9,
            dedup_tolerance: 1e-7,
            scale: 10.0,
        }
    }

    #[test]
    fn test_roots_satisfy_the_system() -> Result<(), Box<dyn std::error::Error>> {
        let system = underdetermined();
        let is_angle = [false, false, true];
        let roots = solve(&system, &is_angle, &options())?;

        assert!(!roots.is_empty());
        for root in &roots {
            let r = system.eval(root)?;
            assert!(residual_norm(&r) <= 1e-9);
            assert!((0.0..std::f64::consts::TAU).contains(&root[2]));
        }
        Ok(())
    }

    #[test]
    fn test_roots_are_distinct() -> Result<(), Box<dyn std::error::Error>> {
        let is_angle = [false, false, true];
        let roots = solve(&underdetermined(), &is_angle, &options())?;
        for (i, a) in roots.iter().enumerate() {
            for b in &roots[i + 1..] {
                assert!(!same_point(a, b, &is_angle, 1e-7));
            }
        }
        Ok(())
    }

    #[test]
    fn test_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let is_angle = [false, false, true];
        let system = underdetermined();
        assert_eq!(
            solve(&system, &is_angle, &options())?,
            solve(&system, &is_angle, &options())?
        );
        Ok(())
    }

    #[test]
    fn test_roots_are_capped() -> Result<(), Box<dyn std::error::Error>> {
        let is_angle = [false, false, true];
        let system = underdetermined();
        let all = solve(&system, &is_angle, &options())?;
        assert!(all.len() > 1);

        let capped = solve(&system, &is_angle, &NewtonOptions { max_roots: 1, ..options() })?;
        assert_eq!(capped, all[..1].to_vec());
        Ok(())
    }

    #[test]
    fn test_no_convergence() {
        // x^2 + 1 = 0 has no real root: F1 * F1 + 1, F1 * F1 + 1
        let f = Box::new(Expr::var("F1", 0));
        let expr = Expr::Add(Box::new(Expr::Mul(f.clone(), f)), Box::new(Expr::Const(1.0)));
        let system =
            EquationSystem::from_exprs(&[expr.clone(), expr], &["F1".to_string()]).unwrap();
        let result = solve(&system, &[false], &options());
        assert!(matches!(result, Err(SolveError::NoConvergence { .. })));
    }

    #[test]
    fn test_starting_points_are_capped() {
        let points = starting_points(&[false, true, true, true], 5.0, 10);
        assert_eq!(points.len(), 10);
        assert_eq!(points[0][0], 5.0);
        assert_eq!(starting_points(&[true, true], 1.0, 256).len(), 16);
    }

    #[test]
    fn test_same_point_wraps_angles() {
        let tau = std::f64::consts::TAU;
        assert!(same_point(&[1.0, tau - 1e-9], &[1.0, 0.0], &[false, true], 1e-6));
        assert!(!same_point(&[1.0, 0.0], &[1.1, 0.0], &[false, true], 1e-6));
    }
}
