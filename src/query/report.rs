use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::database::Document;

/// One answered question, reduced to the category it counts toward.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnswer {
    pub category: String,
    pub category_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub category_name: String,
    pub total_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub categories: Vec<CategoryTotal>,
    pub total: f64,
}

/// Sums scores per category plus a grand total.
///
/// Output is ordered by category id and each group is summed in ascending
/// score order, so the result does not depend on input order. Categories
/// without answers do not appear.
pub fn aggregate_scores(answers: &[ScoredAnswer]) -> ScoreReport {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for answer in answers {
        groups
            .entry((answer.category.as_str(), answer.category_name.as_str()))
            .or_default()
            .push(answer.score);
    }

    let categories: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|((category, name), mut scores)| {
            scores.sort_by(f64::total_cmp);
            CategoryTotal {
                category: category.to_string(),
                category_name: name.to_string(),
                total_score: scores.iter().sum(),
            }
        })
        .collect();

    let total = categories.iter().map(|c| c.total_score).sum();
    ScoreReport { categories, total }
}

/// Flattens audits whose `scores -> question -> category` references are
/// populated. Answers missing a numeric score, a question or a category are
/// skipped.
pub fn scored_answers(audits: &[Document]) -> Vec<ScoredAnswer> {
    audits
        .iter()
        .filter_map(|audit| audit.get("scores").and_then(Value::as_array))
        .flatten()
        .filter_map(|score| {
            let category = score.get("question")?.get("category")?;
            Some(ScoredAnswer {
                category: category.get("id")?.as_str()?.to_string(),
                category_name: category.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                score: score.get("score")?.as_f64()?,
            })
        })
        .collect()
}

/// Total of the populated score documents on one audit.
pub fn audit_total(audit: &Document) -> f64 {
    audit
        .get("scores")
        .and_then(Value::as_array)
        .map(|scores| scores.iter().filter_map(|s| s.get("score").and_then(Value::as_f64)).sum())
        .unwrap_or(0.0)
}
