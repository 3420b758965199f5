use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Two-decimal display rounding. Aggregation and threshold comparisons keep
/// the unrounded value; only reported percentages pass through here.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Form inputs arrive as numbers, numeric strings, blanks, or nothing at all.
/// Anything that does not parse to a finite number counts as 0.
pub fn coerce_number(v: &serde_json::Value) -> f64 {
    let n = match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite()).unwrap_or(0.0)
}

fn de_lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_number(&raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassType {
    #[serde(rename = "point-based")]
    PointBased,
    #[serde(rename = "category-weighted")]
    CategoryWeighted,
}

impl ClassType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "point-based" => Some(Self::PointBased),
            "category-weighted" => Some(Self::CategoryWeighted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointBased => "point-based",
            Self::CategoryWeighted => "category-weighted",
        }
    }
}

/// One scored item. `category` is only meaningful for category-weighted
/// classes; an empty or unknown value leaves the assignment outside every
/// category's totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_number")]
    pub score: f64,
    #[serde(default, deserialize_with = "de_lenient_number")]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Percentage points, 0-100. Weights are not normalized and are not
    /// required to sum to 100.
    #[serde(default, deserialize_with = "de_lenient_number")]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    /// Immutable after creation. Switching type means recreating the class.
    #[serde(rename = "type")]
    pub class_type: ClassType,
    #[serde(default)]
    pub data: Vec<Assignment>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Class {
    pub fn new(name: impl Into<String>, class_type: ClassType) -> Self {
        Self {
            name: name.into(),
            class_type,
            data: Vec::new(),
            categories: Vec::new(),
        }
    }
}

/// Letter grade to minimum-percentage mapping. Storage order carries no
/// meaning; lookup always walks thresholds from highest to lowest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeScale(BTreeMap<String, f64>);

impl GradeScale {
    /// The stock thirteen-band scale restored by "reset to defaults".
    pub fn standard() -> Self {
        let bands = [
            ("A+", 97.0),
            ("A", 93.0),
            ("A-", 90.0),
            ("B+", 87.0),
            ("B", 83.0),
            ("B-", 80.0),
            ("C+", 77.0),
            ("C", 73.0),
            ("C-", 70.0),
            ("D+", 67.0),
            ("D", 63.0),
            ("D-", 60.0),
            ("F", 0.0),
        ];
        Self(
            bands
                .iter()
                .map(|(g, t)| (g.to_string(), *t))
                .collect(),
        )
    }

    pub fn threshold(&self, grade: &str) -> Option<f64> {
        self.0.get(grade).copied()
    }

    pub fn set(&mut self, grade: &str, min_percent: f64) {
        self.0.insert(grade.to_string(), min_percent);
    }

    /// First grade (walking thresholds high to low) whose minimum does not
    /// exceed `percent`; the boundary itself is inclusive. Falls back to the
    /// lowest defined band, so only an empty scale yields `None`.
    pub fn letter_for(&self, percent: f64) -> Option<&str> {
        let mut bands: Vec<(&String, f64)> = self.0.iter().map(|(g, t)| (g, *t)).collect();
        bands.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        for (grade, min) in &bands {
            if percent >= *min {
                return Some(grade.as_str());
            }
        }
        bands.last().map(|(grade, _)| grade.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub total: f64,
    /// Percent earned inside the category; 0 when it has no graded work.
    pub percent: f64,
    /// Weight-scaled share of the overall percentage, in percentage points.
    /// An empty category contributes nothing rather than dragging the class
    /// to zero.
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAggregate {
    pub total_score: f64,
    pub total_max: f64,
    /// Unrounded. Display formatting applies `round_off_2_decimals` at the
    /// edge; predictors compare against this value directly.
    pub percent: f64,
    pub letter: Option<String>,
    pub categories: Vec<CategoryBreakdown>,
}

/// Computes totals and the overall percentage for a class. Pure: identical
/// input always yields identical output, and no division by zero ever leaks
/// out as NaN or infinity.
pub fn aggregate(class: &Class, scale: &GradeScale) -> ClassAggregate {
    let total_score: f64 = class.data.iter().map(|a| a.score).sum();
    let total_max: f64 = class.data.iter().map(|a| a.total).sum();

    let (percent, categories) = match class.class_type {
        ClassType::PointBased => {
            let percent = if total_max > 0.0 {
                100.0 * total_score / total_max
            } else {
                0.0
            };
            (percent, Vec::new())
        }
        ClassType::CategoryWeighted => {
            let mut breakdown = Vec::with_capacity(class.categories.len());
            let mut overall = 0.0;
            for cat in &class.categories {
                let mut cat_score = 0.0;
                let mut cat_total = 0.0;
                for a in &class.data {
                    if a.category.as_deref() == Some(cat.name.as_str()) {
                        cat_score += a.score;
                        cat_total += a.total;
                    }
                }
                let percent = if cat_total > 0.0 {
                    100.0 * cat_score / cat_total
                } else {
                    0.0
                };
                let contribution = percent * cat.weight / 100.0;
                overall += contribution;
                breakdown.push(CategoryBreakdown {
                    name: cat.name.clone(),
                    weight: cat.weight,
                    score: cat_score,
                    total: cat_total,
                    percent,
                    contribution,
                });
            }
            (overall, breakdown)
        }
    };

    ClassAggregate {
        total_score,
        total_max,
        percent,
        letter: scale.letter_for(percent).map(str::to_string),
        categories,
    }
}
