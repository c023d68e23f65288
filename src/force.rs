//! Force records and their fields.
//!
//! A force is an ordered `(magnitude, angle)` pair. Each field is either a known finite
//! number or unknown; angles are given in degrees, measured counter-clockwise from the
//! positive x-axis.

use serde::{Deserialize, Serialize};

use crate::convert::parse_constant;
use crate::errors::ValidationError;

/// A single scalar input: a known value or a placeholder to be solved for.
///
/// Serializes as a number for `Known` and `null` for `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Field {
    Known(f64),
    #[default]
    Unknown,
}

impl Field {
    /// Parses user-entered text.
    ///
    /// Blank text and `?` mean unknown. Anything else must be a finite real number,
    /// either a float literal or constant arithmetic such as `90/2`.
    ///
    /// # Arguments
    /// * `label` - Human-readable name of the field, used in the error message
    /// * `text` - The raw field text
    pub fn parse(label: &str, text: &str) -> Result<Field, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "?" {
            return Ok(Field::Unknown);
        }

        let value = match trimmed.parse::<f64>() {
            Ok(value) => value,
            Err(_) => parse_constant(trimmed).map_err(|_| ValidationError::NotANumber {
                field: label.to_string(),
                text: text.to_string(),
            })?,
        };

        let field = Field::Known(value);
        field.validate(label)?;
        Ok(field)
    }

    /// Rejects known values that are NaN or infinite.
    pub fn validate(&self, label: &str) -> Result<(), ValidationError> {
        match self {
            Field::Known(value) if !value.is_finite() => Err(ValidationError::NotFinite {
                field: label.to_string(),
                value: *value,
            }),
            _ => Ok(()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Field::Known(value) => Some(*value),
            Field::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Field::Unknown)
    }
}

impl From<Option<f64>> for Field {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Field::Unknown, Field::Known)
    }
}

impl From<Field> for Option<f64> {
    fn from(field: Field) -> Self {
        field.value()
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Known(value)
    }
}

/// A concurrent force: magnitude plus direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Force {
    pub magnitude: Field,
    #[serde(rename = "angle_degrees")]
    pub angle: Field,
}

impl Force {
    pub fn new(magnitude: impl Into<Field>, angle: impl Into<Field>) -> Self {
        Self {
            magnitude: magnitude.into(),
            angle: angle.into(),
        }
    }

    /// A force with both fields known.
    pub fn known(magnitude: f64, angle_degrees: f64) -> Self {
        Self::new(magnitude, angle_degrees)
    }

    /// A force with both fields unknown.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Parses the text of the force at zero-based position `index`.
    pub fn from_text(index: usize, magnitude: &str, angle: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            magnitude: Field::parse(&magnitude_label(index), magnitude)?,
            angle: Field::parse(&angle_label(index), angle)?,
        })
    }

    /// Rejects non-finite known fields of the force at position `index`.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        self.magnitude.validate(&magnitude_label(index))?;
        self.angle.validate(&angle_label(index))
    }
}

pub(crate) fn magnitude_label(index: usize) -> String {
    format!("magnitude of F{}", index + 1)
}

pub(crate) fn angle_label(index: usize) -> String {
    format!("angle of F{}", index + 1)
}

pub(crate) const RESULTANT_MAGNITUDE_LABEL: &str = "resultant magnitude R";
pub(crate) const RESULTANT_ANGLE_LABEL: &str = "resultant angle alpha";

/// Normalizes an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Normalizes an angle in radians into `[0, 2π)`.
pub fn normalize_radians(angle: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let wrapped = angle.rem_euclid(tau);
    if wrapped >= tau {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles in degrees, in `[0, 180]`.
pub fn angular_distance_degrees(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    diff.min(360.0 - diff)
}

/// Rounds to a fixed number of decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
