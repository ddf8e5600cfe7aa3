use serde_json::Value;
use tracing::info;

use crate::error::JudgmentError;
use crate::model::{DocRating, Judgment};

/// Reshapes externally supplied ratings into judgments. The batch fails on
/// the first invalid entry and nothing is returned for the entries before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportJudgments;

impl ImportJudgments {
    pub fn normalize(&self, entries: &[Value]) -> Result<Vec<Judgment>, JudgmentError> {
        let mut judgments = Vec::with_capacity(entries.len());

        for entry in entries {
            judgments.push(normalize_entry(entry)?);
        }

        info!(
            queries = judgments.len(),
            ratings = judgments.iter().map(|judgment| judgment.ratings.len()).sum::<usize>(),
            "normalized imported judgments"
        );

        Ok(judgments)
    }
}

fn normalize_entry(entry: &Value) -> Result<Judgment, JudgmentError> {
    let query = entry
        .get("query")
        .and_then(scalar_text)
        .ok_or_else(|| {
            JudgmentError::InvalidInput(
                "query for each judgment rating entry must not be null".to_string(),
            )
        })?;

    let Some(Value::Array(ratings)) = entry.get("ratings") else {
        return Err(JudgmentError::InvalidInput(format!(
            "queryText {query} must have a list of rating data."
        )));
    };

    let mut doc_ratings = Vec::with_capacity(ratings.len());
    for rating_info in ratings {
        let doc_id = rating_info
            .get("docId")
            .and_then(scalar_text)
            .filter(|doc_id| !doc_id.is_empty())
            .ok_or_else(|| {
                JudgmentError::InvalidInput(format!(
                    "docId for queryText {query} must not be null or empty"
                ))
            })?;

        let rating = match rating_info.get("rating") {
            None | Some(Value::Null) => {
                return Err(JudgmentError::InvalidInput(format!(
                    "rating for queryText {query} must not be null"
                )));
            }
            Some(value) => rating_text(value),
        };

        let trimmed = rating.trim();
        let is_float = trimmed
            .parse::<f64>()
            .map(f64::is_finite)
            .unwrap_or(false);
        if !is_float {
            return Err(JudgmentError::InvalidInput(format!(
                "rating '{rating}' for queryText {query} must be a valid float"
            )));
        }

        doc_ratings.push(DocRating {
            doc_id,
            rating: trimmed.to_string(),
        });
    }

    Ok(Judgment {
        query,
        ratings: doc_ratings,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn rating_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
