use serde::{Deserialize, Serialize};

/// Tuning knobs for a solve.
///
/// Every field has a default, so a JSON file only needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Zero tolerance for resultant magnitudes and consistency checks
    pub tolerance: f64,
    /// Display precision for magnitudes
    pub magnitude_decimals: u32,
    /// Display precision for angles in degrees
    pub angle_decimals: u32,
    /// Iteration cap per starting point of the iterative solver
    pub newton_max_iterations: usize,
    /// Cap on the number of starting points of the iterative solver
    pub newton_max_seeds: usize,
    /// Cap on the distinct roots the iterative solver reports
    pub max_representatives: usize,
    /// Residual tolerance for accepting a root, relative to the system scale
    pub verify_tolerance: f64,
    /// Tolerance under which two roots count as the same, relative to the system scale
    pub dedup_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            magnitude_decimals: 3,
            angle_decimals: 2,
            newton_max_iterations: 100,
            newton_max_seeds: 256,
            max_representatives: 8,
            verify_tolerance: 1e-6,
            dedup_tolerance: 1e-6,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config = SolverConfig::from_json(r#"{ "tolerance": 1e-9, "newton_max_seeds": 8 }"#)?;
        assert_eq!(config.tolerance, 1e-9);
        assert_eq!(config.newton_max_seeds, 8);
        assert_eq!(config.magnitude_decimals, 3);
        assert_eq!(config.newton_max_iterations, 100);
        assert_eq!(config.max_representatives, 8);
        Ok(())
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(SolverConfig::from_json(r#"{ "tolerance": "small" }"#).is_err());
    }
}
