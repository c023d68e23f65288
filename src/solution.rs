//! Solved values and solution records.

use std::fmt;

use num::complex::Complex64;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::force::normalize_degrees;
use crate::unknowns::{Symbol, UnknownSet};

/// Values this close to zero are stored as exactly zero.
const ZERO_SNAP: f64 = 1e-12;

/// A resolved unknown: a real number, or a complex root passed through for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Real(f64),
    Complex(Complex64),
}

impl Value {
    pub fn real(value: f64) -> Self {
        Value::Real(if value.abs() < ZERO_SNAP { 0.0 } else { value })
    }

    /// Stores `value` as real when its imaginary part vanishes.
    pub fn complex(value: Complex64) -> Self {
        if value.im.abs() <= ZERO_SNAP * value.re.abs().max(1.0) {
            Value::real(value.re)
        } else {
            Value::Complex(value)
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            Value::Complex(_) => None,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Value::Real(_))
    }

    pub fn as_complex(&self) -> Complex64 {
        match self {
            Value::Real(value) => Complex64::new(*value, 0.0),
            Value::Complex(value) => *value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, f.precision()) {
            (Value::Real(v), Some(p)) => write!(f, "{v:.p$}"),
            (Value::Real(v), None) => write!(f, "{v}"),
            (Value::Complex(c), Some(p)) => {
                let sign = if c.im < 0.0 { '-' } else { '+' };
                write!(f, "{:.p$} {sign} {:.p$}i", c.re, c.im.abs())
            }
            (Value::Complex(c), None) => write!(f, "{c}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Real(value) => serializer.serialize_f64(*value),
            Value::Complex(value) => {
                let mut state = serializer.serialize_struct("Complex", 2)?;
                state.serialize_field("re", &value.re)?;
                state.serialize_field("im", &value.im)?;
                state.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub symbol: Symbol,
    /// Magnitudes as solved; angles in degrees, real angles within [0, 360)
    pub value: Value,
}

/// One candidate assignment of every unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    #[serde(rename = "values", serialize_with = "serialize_assignments")]
    pub assignments: Vec<Assignment>,
    /// Magnitude symbols with a negative value; their physical direction is angle + 180°
    pub reversed: Vec<String>,
}

fn serialize_assignments<S: Serializer>(
    assignments: &[Assignment],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(assignments.len()))?;
    for assignment in assignments {
        map.serialize_entry(&assignment.symbol.name, &assignment.value)?;
    }
    map.end()
}

impl Solution {
    /// Builds a solution from raw values ordered like `unknowns`, angles in radians.
    pub fn from_radians(unknowns: &UnknownSet, values: &[Value]) -> Self {
        let assignments: Vec<Assignment> = unknowns
            .symbols
            .iter()
            .zip(values)
            .map(|(symbol, value)| {
                let value = if symbol.kind.is_angle() {
                    match value {
                        Value::Real(radians) => {
                            Value::real(normalize_degrees(radians.to_degrees()))
                        }
                        Value::Complex(radians) => {
                            Value::complex(*radians * (180.0 / std::f64::consts::PI))
                        }
                    }
                } else {
                    *value
                };
                Assignment {
                    symbol: symbol.clone(),
                    value,
                }
            })
            .collect();

        let reversed = assignments
            .iter()
            .filter(|a| a.symbol.kind.is_magnitude())
            .filter(|a| a.value.as_real().is_some_and(|v| v < 0.0))
            .map(|a| a.symbol.name.clone())
            .collect();

        Self {
            assignments,
            reversed,
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.assignments
            .iter()
            .find(|a| a.symbol.name == name)
            .map(|a| a.value)
    }

    pub fn is_real(&self) -> bool {
        self.assignments.iter().all(|a| a.value.is_real())
    }

    /// Real and no magnitude (force or R) below zero.
    pub fn is_physical(&self) -> bool {
        self.is_real() && self.reversed.is_empty()
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = ", assignment.symbol.name)?;
            match f.precision() {
                Some(p) => write!(f, "{:.p$}", assignment.value)?,
                None => write!(f, "{}", assignment.value)?,
            }
            if assignment.symbol.kind.is_angle() {
                write!(f, "°")?;
            }
        }
        Ok(())
    }
}
