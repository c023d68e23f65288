//! Classification of input fields into knowns and unknowns.

use serde::Serialize;

use crate::errors::ValidationError;
use crate::force::{Field, Force, RESULTANT_ANGLE_LABEL, RESULTANT_MAGNITUDE_LABEL};

/// Number of scalar equations in a planar force balance.
pub const EQUATION_COUNT: usize = 2;

/// What an unknown symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "force", rename_all = "snake_case")]
pub enum SymbolKind {
    /// Magnitude of the force at the given zero-based index
    Magnitude(usize),
    /// Angle of the force at the given zero-based index
    Angle(usize),
    ResultantMagnitude,
    ResultantAngle,
}

impl SymbolKind {
    /// Conventional name: `F{i+1}`, `theta_F{i+1}`, `R` or `alpha`.
    pub fn name(&self) -> String {
        match self {
            SymbolKind::Magnitude(i) => format!("F{}", i + 1),
            SymbolKind::Angle(i) => format!("theta_F{}", i + 1),
            SymbolKind::ResultantMagnitude => "R".to_string(),
            SymbolKind::ResultantAngle => "alpha".to_string(),
        }
    }

    /// True for force magnitudes and R.
    pub fn is_magnitude(&self) -> bool {
        matches!(
            self,
            SymbolKind::Magnitude(_) | SymbolKind::ResultantMagnitude
        )
    }

    pub fn is_angle(&self) -> bool {
        !self.is_magnitude()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
}

impl Symbol {
    pub fn new(kind: SymbolKind) -> Self {
        Self {
            name: kind.name(),
            kind,
        }
    }
}

/// Unknown count compared with the two balance equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Determinacy {
    /// More unknowns than equations
    Underdetermined,
    Exact,
    /// Fewer unknowns than equations (including none)
    Overdetermined,
}

/// The ordered unknowns of one solve.
///
/// Order is by force index with the magnitude before the angle, then R, then α.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownSet {
    pub symbols: Vec<Symbol>,
}

impl UnknownSet {
    /// Classifies every field of `forces` and, in the resultant variant, of `(R, α)`.
    ///
    /// A field is unknown iff it is `Field::Unknown`; a known value of zero is a regular
    /// known value. Non-finite known values are rejected.
    pub fn classify(
        forces: &[Force],
        resultant: Option<(Field, Field)>,
    ) -> Result<Self, ValidationError> {
        let mut symbols = Vec::new();

        for (i, force) in forces.iter().enumerate() {
            force.validate(i)?;
            if force.magnitude.is_unknown() {
                symbols.push(Symbol::new(SymbolKind::Magnitude(i)));
            }
            if force.angle.is_unknown() {
                symbols.push(Symbol::new(SymbolKind::Angle(i)));
            }
        }

        if let Some((magnitude, angle)) = resultant {
            magnitude.validate(RESULTANT_MAGNITUDE_LABEL)?;
            angle.validate(RESULTANT_ANGLE_LABEL)?;
            if magnitude.is_unknown() {
                symbols.push(Symbol::new(SymbolKind::ResultantMagnitude));
            }
            if angle.is_unknown() {
                symbols.push(Symbol::new(SymbolKind::ResultantAngle));
            }
        }

        Ok(Self { symbols })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.symbols.iter().map(|s| s.name.clone()).collect()
    }

    /// Position of a symbol kind in the ordered set.
    pub fn position(&self, kind: SymbolKind) -> Option<usize> {
        self.symbols.iter().position(|s| s.kind == kind)
    }

    pub fn contains(&self, kind: SymbolKind) -> bool {
        self.position(kind).is_some()
    }

    pub fn determinacy(&self) -> Determinacy {
        match self.len() {
            n if n > EQUATION_COUNT => Determinacy::Underdetermined,
            n if n < EQUATION_COUNT => Determinacy::Overdetermined,
            _ => Determinacy::Exact,
        }
    }
}
