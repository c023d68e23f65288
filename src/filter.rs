//! Selection of the surfaced solutions among the raw candidates.
//!
//! The preference chain is an ordered list of predicates; the first tier with at least
//! one match wins.

use log::{debug, warn};
use serde::Serialize;

use crate::solution::Solution;

/// Which tier of the preference chain produced the surfaced solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Real, every magnitude non-negative
    Preferred,
    /// Real, some magnitudes negative (drawn at angle + 180°)
    DirectionReversed,
    /// Only complex roots exist
    NonPhysical,
    /// No candidates at all
    Empty,
}

/// A tier of a preference chain: a tag and the predicate its members satisfy.
pub type Tier<'a, T, S> = (S, &'a dyn Fn(&T) -> bool);

/// Returns the first tier whose predicate matches at least one candidate, together with
/// the matching candidates in their original order.
pub fn best_matching_subset<T: Clone, S: Copy>(
    candidates: &[T],
    tiers: &[Tier<'_, T, S>],
) -> Option<(S, Vec<T>)> {
    tiers.iter().find_map(|(tag, predicate)| {
        let subset: Vec<T> = candidates.iter().filter(|c| predicate(c)).cloned().collect();
        (!subset.is_empty()).then_some((*tag, subset))
    })
}

/// Applies the physical preference chain: non-negative real, then any real, then complex.
pub fn select(candidates: &[Solution]) -> (Selection, Vec<Solution>) {
    let tiers: [Tier<'_, Solution, Selection>; 3] = [
        (Selection::Preferred, &Solution::is_physical),
        (Selection::DirectionReversed, &Solution::is_real),
        (Selection::NonPhysical, &|_| true),
    ];

    let (selection, surfaced) =
        best_matching_subset(candidates, &tiers).unwrap_or((Selection::Empty, Vec::new()));

    match selection {
        Selection::Preferred => debug!("{} solutions with non-negative magnitudes", surfaced.len()),
        Selection::DirectionReversed => warn!(
            "no solution with all magnitudes non-negative; surfacing {} real solutions with reversed directions",
            surfaced.len()
        ),
        Selection::NonPhysical => warn!(
            "no real solution; surfacing {} complex solutions",
            surfaced.len()
        ),
        Selection::Empty => debug!("no candidates to select from"),
    }

    (selection, surfaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::Force;
    use crate::solution::Value;
    use crate::unknowns::UnknownSet;
    use num::complex::Complex64;

    #[test]
    fn test_best_matching_subset_takes_first_non_empty_tier() {
        let numbers = [3, -1, 4, -5];
        let tiers: [Tier<'_, i32, &str>; 3] = [
            ("big", &|n| *n > 10),
            ("positive", &|n| *n > 0),
            ("any", &|_| true),
        ];
        assert_eq!(
            best_matching_subset(&numbers, &tiers),
            Some(("positive", vec![3, 4]))
        );

        let empty: [i32; 0] = [];
        assert_eq!(best_matching_subset(&empty, &tiers), None);
    }

    fn candidates() -> (Solution, Solution, Solution) {
        let forces = [Force::known(1.0, 0.0), Force::unknown()];
        let unknowns = UnknownSet::classify(&forces, None).unwrap();
        let positive = Solution::from_radians(&unknowns, &[Value::real(1.0), Value::real(3.14)]);
        let negative = Solution::from_radians(&unknowns, &[Value::real(-1.0), Value::real(0.0)]);
        let complex = Solution::from_radians(
            &unknowns,
            &[Value::complex(Complex64::new(1.0, 1.0)), Value::real(0.0)],
        );
        (positive, negative, complex)
    }

    #[test]
    fn test_select_prefers_non_negative() {
        let (positive, negative, complex) = candidates();
        let (selection, surfaced) = select(&[negative, complex, positive.clone()]);
        assert_eq!(selection, Selection::Preferred);
        assert_eq!(surfaced, vec![positive]);
    }

    #[test]
    fn test_select_falls_back_to_reversed_then_complex() {
        let (_, negative, complex) = candidates();
        let (selection, surfaced) = select(&[complex.clone(), negative.clone()]);
        assert_eq!(selection, Selection::DirectionReversed);
        assert_eq!(surfaced, vec![negative]);

        let (selection, surfaced) = select(std::slice::from_ref(&complex));
        assert_eq!(selection, Selection::NonPhysical);
        assert_eq!(surfaced, vec![complex]);

        let (selection, surfaced) = select(&[]);
        assert_eq!(selection, Selection::Empty);
        assert!(surfaced.is_empty());
    }
}
