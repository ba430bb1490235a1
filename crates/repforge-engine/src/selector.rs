//! Pattern-diverse subset selection.

use std::collections::HashSet;

use tracing::debug;

use crate::scoring::ScoredExercise;

/// Pick up to `count` exercises from `ranked` (best first).
///
/// Pass one takes the first exercise of each movement pattern not yet
/// seen. Pass two fills the remaining slots by rank. Output keeps rank
/// order within each pass.
pub fn select(ranked: &[ScoredExercise], count: usize, target_muscles: &[String]) -> Vec<ScoredExercise> {
    let mut chosen: Vec<usize> = Vec::with_capacity(count.min(ranked.len()));
    let mut patterns: HashSet<String> = HashSet::new();

    for (i, candidate) in ranked.iter().enumerate() {
        if chosen.len() >= count {
            break;
        }
        if patterns.insert(candidate.exercise.movement_pattern.to_lowercase()) {
            chosen.push(i);
        }
    }

    for i in 0..ranked.len() {
        if chosen.len() >= count {
            break;
        }
        if !chosen.contains(&i) {
            chosen.push(i);
        }
    }

    let selected: Vec<ScoredExercise> = chosen.into_iter().map(|i| ranked[i].clone()).collect();

    let uncovered: Vec<&String> = target_muscles
        .iter()
        .filter(|m| {
            !selected.iter().any(|s| {
                s.exercise
                    .primary_muscles
                    .iter()
                    .chain(s.exercise.secondary_muscles.iter())
                    .any(|x| x.eq_ignore_ascii_case(m))
            })
        })
        .collect();
    if !uncovered.is_empty() {
        debug!("Selection leaves target muscles uncovered: {:?}", uncovered);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreBreakdown;
    use repforge_core::Exercise;

    fn candidate(slug: &str, pattern: &str, score: f64) -> ScoredExercise {
        let exercise: Exercise = serde_json::from_value(serde_json::json!({
            "name": slug,
            "slug": slug,
            "category": "strength",
            "movement_pattern": pattern,
            "exercise_type": "compound",
            "primary_muscles": ["chest"],
            "difficulty": 2,
            "home_compatibility": 1.0,
            "gym_compatibility": 1.0,
            "outdoor_compatibility": 1.0
        }))
        .unwrap();
        ScoredExercise {
            exercise,
            score,
            breakdown: ScoreBreakdown {
                goal_match: score,
                difficulty_match: score,
                equipment_match: score,
                location_match: score,
                experience_match: score,
                semantic_match: score,
            },
        }
    }

    fn slugs(v: &[ScoredExercise]) -> Vec<&str> {
        v.iter().map(|s| s.exercise.slug.as_str()).collect()
    }

    #[test]
    fn test_variety_first_then_fill() {
        let ranked = vec![
            candidate("bench", "push", 0.9),
            candidate("incline", "push", 0.85),
            candidate("row", "pull", 0.8),
            candidate("squat", "squat", 0.7),
        ];
        let picked = select(&ranked, 3, &[]);
        assert_eq!(slugs(&picked), vec!["bench", "row", "squat"]);

        let picked = select(&ranked, 4, &[]);
        assert_eq!(slugs(&picked), vec!["bench", "row", "squat", "incline"]);
    }

    #[test]
    fn test_size_bounds() {
        let ranked: Vec<_> = (0..6)
            .map(|i| candidate(&format!("e{}", i), if i % 2 == 0 { "a" } else { "b" }, 1.0 - i as f64 * 0.1))
            .collect();
        for count in 0..=8 {
            let picked = select(&ranked, count, &["chest".into()]);
            assert_eq!(picked.len(), count.min(ranked.len()));
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(select(&[], 5, &["back".into()]).is_empty());
    }
}
