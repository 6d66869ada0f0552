/*!
 * Translation quality metrics.
 */

use crate::glossary::GlossaryConstraint;

/// Share of constraints whose target form appears in `hypothesis`
///
/// Matching is case-insensitive substring search. Constraints with a blank
/// target are ignored; with nothing left to check the score is 1.0.
pub fn term_adherence(hypothesis: &str, constraints: &[GlossaryConstraint]) -> f64 {
    let hypothesis = hypothesis.to_lowercase();
    let (total, hits) = constraints
        .iter()
        .map(|c| c.target.trim())
        .filter(|target| !target.is_empty())
        .fold((0usize, 0usize), |(total, hits), target| {
            let hit = hypothesis.contains(&target.to_lowercase());
            (total + 1, hits + usize::from(hit))
        });

    if total == 0 {
        1.0
    } else {
        hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(t: &str) -> GlossaryConstraint {
        GlossaryConstraint::new("", t)
    }

    #[test]
    fn test_termAdherence_allTargetsPresent_shouldBeOne() {
        let score = term_adherence("Buy the Widget Pro today", &[target("Widget Pro")]);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_termAdherence_halfTargetsPresent_shouldBeHalf() {
        let score = term_adherence(
            "Buy the Widget Pro today",
            &[target("Widget Pro"), target("Bundle")],
        );
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_termAdherence_shouldIgnoreCaseAndBlankTargets() {
        assert_eq!(term_adherence("buy the WIDGET PRO", &[target("Widget Pro"), target("  ")]), 1.0);
        assert_eq!(term_adherence("anything", &[]), 1.0);
        assert_eq!(term_adherence("", &[target("")]), 1.0);
        assert_eq!(term_adherence("", &[target("x")]), 0.0);
    }
}
