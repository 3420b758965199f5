use serde::{Deserialize, Serialize};

use crate::calc::{round_off_2_decimals, ClassAggregate, GradeScale};

/// Minimum score on the next assignment needed to reach `target_grade`.
/// Clamped at 0: a negative requirement means the grade is already locked in.
/// Yields `None` (not an error) when the target grade is unknown to the scale
/// or no positive next-assignment total was given.
pub fn needed_score(
    total_score: f64,
    total_max: f64,
    next_total: f64,
    target_grade: &str,
    scale: &GradeScale,
) -> Option<f64> {
    if !(next_total > 0.0) {
        return None;
    }
    let threshold = scale.threshold(target_grade)?;
    let needed = (threshold / 100.0) * (total_max + next_total) - total_score;
    Some(round_off_2_decimals(needed).max(0.0))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeProjection {
    pub grade: String,
    pub new_total_score: f64,
    pub new_total_max: f64,
    /// Unrounded; handlers round for display.
    pub new_percent: f64,
}

/// Resulting grade if `hypothetical` points are scored on a next assignment
/// worth `next_total`. The caller guarantees `total_max + next_total > 0`;
/// a violation yields `None` rather than a NaN percentage.
pub fn predicted_grade(
    total_score: f64,
    total_max: f64,
    next_total: f64,
    hypothetical: f64,
    scale: &GradeScale,
) -> Option<GradeProjection> {
    let new_total_score = total_score + hypothetical;
    let new_total_max = total_max + next_total;
    if !(new_total_max > 0.0) {
        return None;
    }
    let new_percent = 100.0 * new_total_score / new_total_max;
    let grade = scale.letter_for(new_percent)?.to_string();
    Some(GradeProjection {
        grade,
        new_total_score,
        new_total_max,
        new_percent,
    })
}

/// Category-weighted twin of [`needed_score`]: holds every other category at
/// its current contribution and back-solves the selected category's next
/// assignment. `None` when the category is missing, carries no weight, or the
/// inputs are incomplete.
pub fn category_needed_score(
    agg: &ClassAggregate,
    category_name: &str,
    next_total: f64,
    target_grade: &str,
    scale: &GradeScale,
) -> Option<f64> {
    if !(next_total > 0.0) {
        return None;
    }
    let threshold = scale.threshold(target_grade)?;
    let cat = agg.categories.iter().find(|c| c.name == category_name)?;
    let weight_factor = cat.weight / 100.0;
    if !(weight_factor > 0.0) {
        return None;
    }

    // Work in fractional terms, the same unit as the grade thresholds.
    let other_contribution = agg.percent / 100.0 - cat.contribution / 100.0;
    let target_contribution = threshold / 100.0 - other_contribution;
    let new_total = cat.total + next_total;
    let needed = (target_contribution / weight_factor) * new_total - cat.score;
    Some(round_off_2_decimals(needed).max(0.0))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProjection {
    pub grade: String,
    pub new_percent: f64,
}

/// Recomputes the overall percentage with the selected category's totals bumped
/// by a hypothetical next assignment.
pub fn category_predicted_grade(
    agg: &ClassAggregate,
    category_name: &str,
    next_total: f64,
    hypothetical: f64,
    scale: &GradeScale,
) -> Option<CategoryProjection> {
    if !(next_total > 0.0) {
        return None;
    }
    agg.categories.iter().find(|c| c.name == category_name)?;

    let mut overall = 0.0;
    for c in &agg.categories {
        let (score, total) = if c.name == category_name {
            (c.score + hypothetical, c.total + next_total)
        } else {
            (c.score, c.total)
        };
        if total > 0.0 {
            overall += (score / total) * (c.weight / 100.0);
        }
    }
    let new_percent = overall * 100.0;
    let grade = scale.letter_for(new_percent)?.to_string();
    Some(CategoryProjection { grade, new_percent })
}

pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendWeights {
    pub term1: f64,
    pub term2: f64,
    pub final_exam: f64,
}

impl BlendWeights {
    /// The three components must cover the whole grade. Unlike category
    /// weights this IS validated; a bad sum suppresses any numeric result.
    pub fn is_valid(&self) -> bool {
        (self.term1 + self.term2 + self.final_exam - 100.0).abs() < WEIGHT_SUM_TOLERANCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Achievability {
    Achievable,
    /// Needed score exceeds 100%.
    NotAchievable,
    /// Needed score is zero or below; the target is locked in already.
    AlreadyGuaranteed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermBlendResult {
    /// Intentionally unclamped, unlike the assignment predictors: out-of-range
    /// values are reported as-is and tagged instead.
    pub needed_term2: f64,
    pub achievability: Achievability,
}

/// Back-solves the unknown Term 2 percentage from the weighted three-component
/// blend. `None` when the weights are invalid (sum off 100, or a non-positive
/// Term 2 weight that would make the equation unsolvable).
pub fn solve_term_blend(
    term1: f64,
    final_exam: f64,
    weights: BlendWeights,
    target: f64,
) -> Option<TermBlendResult> {
    if !weights.is_valid() || !(weights.term2 > 0.0) {
        return None;
    }
    let needed = (target - final_exam * (weights.final_exam / 100.0)
        - term1 * (weights.term1 / 100.0))
        / (weights.term2 / 100.0);
    let needed_term2 = round_off_2_decimals(needed);
    let achievability = if needed_term2 > 100.0 {
        Achievability::NotAchievable
    } else if needed_term2 <= 0.0 {
        Achievability::AlreadyGuaranteed
    } else {
        Achievability::Achievable
    };
    Some(TermBlendResult {
        needed_term2,
        achievability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{aggregate, Assignment, Category, Class, ClassType};

    fn weighted_aggregate() -> ClassAggregate {
        let class = Class {
            name: "Chemistry".to_string(),
            class_type: ClassType::CategoryWeighted,
            data: vec![
                Assignment {
                    name: None,
                    score: 8.0,
                    total: 10.0,
                    category: Some("Homework".to_string()),
                },
                Assignment {
                    name: None,
                    score: 45.0,
                    total: 50.0,
                    category: Some("Exams".to_string()),
                },
            ],
            categories: vec![
                Category {
                    name: "Homework".to_string(),
                    weight: 40.0,
                },
                Category {
                    name: "Exams".to_string(),
                    weight: 60.0,
                },
            ],
        };
        aggregate(&class, &GradeScale::standard())
    }

    #[test]
    fn needed_score_clamps_at_zero() {
        // 0.90 * 110 - 100 = -1; the grade is already guaranteed.
        let scale = GradeScale::standard();
        let needed = needed_score(100.0, 100.0, 10.0, "A-", &scale).expect("some");
        assert_eq!(needed, 0.0);
    }

    #[test]
    fn needed_score_basic() {
        let scale = GradeScale::standard();
        // 0.90 * 110 - 80 = 19
        let needed = needed_score(80.0, 100.0, 10.0, "A-", &scale).expect("some");
        assert_eq!(needed, 19.0);
    }

    #[test]
    fn needed_score_requires_grade_and_total() {
        let scale = GradeScale::standard();
        assert_eq!(needed_score(80.0, 100.0, 10.0, "Z", &scale), None);
        assert_eq!(needed_score(80.0, 100.0, 0.0, "A", &scale), None);
        assert_eq!(needed_score(80.0, 100.0, -5.0, "A", &scale), None);
    }

    #[test]
    fn predicted_grade_reports_new_totals() {
        let scale = GradeScale::standard();
        let p = predicted_grade(80.0, 100.0, 10.0, 10.0, &scale).expect("some");
        assert_eq!(p.new_total_score, 90.0);
        assert_eq!(p.new_total_max, 110.0);
        assert!((p.new_percent - 81.8181818).abs() < 1e-6);
        assert_eq!(p.grade, "B-");
    }

    #[test]
    fn predicted_grade_refuses_zero_denominator() {
        let scale = GradeScale::standard();
        assert!(predicted_grade(0.0, 0.0, 0.0, 0.0, &scale).is_none());
    }

    #[test]
    fn category_needed_score_solves_selected_category() {
        let agg = weighted_aggregate();
        let scale = GradeScale::standard();
        // Exams currently 45/50 at weight 60; other contribution is 32%.
        // Target A- (90): need (0.90 - 0.32) / 0.60 * (50 + 50) - 45 = 51.67.
        let needed =
            category_needed_score(&agg, "Exams", 50.0, "A-", &scale).expect("some");
        assert!((needed - 51.67).abs() < 1e-9);
    }

    #[test]
    fn category_needed_score_clamps_and_validates() {
        let agg = weighted_aggregate();
        let scale = GradeScale::standard();
        // F threshold is 0; nothing is needed.
        assert_eq!(
            category_needed_score(&agg, "Exams", 50.0, "F", &scale),
            Some(0.0)
        );
        assert_eq!(category_needed_score(&agg, "Nope", 50.0, "A", &scale), None);
        assert_eq!(category_needed_score(&agg, "Exams", 0.0, "A", &scale), None);
    }

    #[test]
    fn category_needed_score_ignores_zero_weight() {
        let mut agg = weighted_aggregate();
        agg.categories[0].weight = 0.0;
        let scale = GradeScale::standard();
        assert_eq!(
            category_needed_score(&agg, "Homework", 10.0, "A", &scale),
            None
        );
    }

    #[test]
    fn category_predicted_grade_bumps_one_category() {
        let agg = weighted_aggregate();
        let scale = GradeScale::standard();
        // Perfect 50 on a new 50-point exam: Exams go to 95/100,
        // overall = 0.8*40 + 0.95*60 = 89.
        let p = category_predicted_grade(&agg, "Exams", 50.0, 50.0, &scale).expect("some");
        assert!((p.new_percent - 89.0).abs() < 1e-9);
        assert_eq!(p.grade, "B+");
    }

    #[test]
    fn term_blend_matches_worked_example() {
        let weights = BlendWeights {
            term1: 40.0,
            term2: 40.0,
            final_exam: 20.0,
        };
        let r = solve_term_blend(85.0, 90.0, weights, 88.0).expect("some");
        assert_eq!(r.needed_term2, 90.0);
        assert_eq!(r.achievability, Achievability::Achievable);
    }

    #[test]
    fn term_blend_rejects_bad_weight_sum() {
        let weights = BlendWeights {
            term1: 50.0,
            term2: 50.0,
            final_exam: 10.0,
        };
        assert!(solve_term_blend(85.0, 90.0, weights, 88.0).is_none());
    }

    #[test]
    fn term_blend_tolerates_float_noise_in_weights() {
        let weights = BlendWeights {
            term1: 33.33,
            term2: 33.33,
            final_exam: 33.34,
        };
        assert!(solve_term_blend(70.0, 70.0, weights, 70.0).is_some());
    }

    #[test]
    fn term_blend_reports_unreachable_without_clamping() {
        let weights = BlendWeights {
            term1: 45.0,
            term2: 45.0,
            final_exam: 10.0,
        };
        // (99 - 50*0.10 - 60*0.45) / 0.45 = 148.89
        let r = solve_term_blend(60.0, 50.0, weights, 99.0).expect("some");
        assert!(r.needed_term2 > 100.0);
        assert_eq!(r.achievability, Achievability::NotAchievable);

        let r = solve_term_blend(100.0, 100.0, weights, 55.0).expect("some");
        assert!(r.needed_term2 <= 0.0);
        assert_eq!(r.achievability, Achievability::AlreadyGuaranteed);
    }

    #[test]
    fn term_blend_refuses_zero_term2_weight() {
        let weights = BlendWeights {
            term1: 60.0,
            term2: 0.0,
            final_exam: 40.0,
        };
        assert!(solve_term_blend(85.0, 90.0, weights, 88.0).is_none());
    }
}
