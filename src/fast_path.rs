//! Direct numeric evaluation of a fully known system.
//!
//! With no unknowns there is nothing to solve: the component sums are evaluated
//! numerically and the resultant is classified.

use log::{debug, info};

use crate::config::SolverConfig;
use crate::equations::ForceBalance;
use crate::force::{angular_distance_degrees, normalize_degrees, round_to, Field};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastPathResult {
    pub sum_fx: f64,
    pub sum_fy: f64,
    pub magnitude: f64,
    /// Direction of the force sum, in [0, 360)
    pub angle_degrees: f64,
    pub in_equilibrium: bool,
}

/// Evaluates ΣFx and ΣFy of a balance whose forces are all known.
///
/// The resultant term of the resultant variant is not part of the sums.
pub fn evaluate(balance: &ForceBalance, config: &SolverConfig) -> FastPathResult {
    let sum_fx = balance.constant_fx;
    let sum_fy = balance.constant_fy;
    let magnitude = sum_fx.hypot(sum_fy);
    let angle_degrees = normalize_degrees(sum_fy.atan2(sum_fx).to_degrees());
    let in_equilibrium = magnitude < config.tolerance;

    debug!("fast path sums: ΣFx = {sum_fx}, ΣFy = {sum_fy}");
    info!(
        "resultant of known forces: {magnitude} @ {angle_degrees}° (in equilibrium: {in_equilibrium})"
    );

    FastPathResult {
        sum_fx,
        sum_fy,
        magnitude,
        angle_degrees,
        in_equilibrium,
    }
}

/// Whether a computed resultant matches user-supplied `(R, α)`.
///
/// The values match if they agree within tolerance either exactly or after rounding the
/// computed values to display precision. Angles are compared modulo 360°, and the angle
/// is ignored when both magnitudes are zero.
pub fn is_consistent(
    result: &FastPathResult,
    magnitude: Field,
    angle_degrees: Field,
    config: &SolverConfig,
) -> bool {
    let (Some(expected_magnitude), Some(expected_angle)) = (magnitude.value(), angle_degrees.value())
    else {
        return false;
    };

    let rounded_magnitude = round_to(result.magnitude, config.magnitude_decimals);
    let rounded_angle = round_to(result.angle_degrees, config.angle_decimals);

    let magnitude_matches = (result.magnitude - expected_magnitude).abs() < config.tolerance
        || (rounded_magnitude - expected_magnitude).abs() < config.tolerance;

    if result.magnitude < config.tolerance && expected_magnitude.abs() < config.tolerance {
        return true;
    }

    let angle_matches = angular_distance_degrees(result.angle_degrees, expected_angle)
        < config.tolerance
        || angular_distance_degrees(rounded_angle, expected_angle) < config.tolerance;

    magnitude_matches && angle_matches
}
