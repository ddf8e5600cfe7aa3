//! Clicks Over Expected Clicks.
//!
//! A document's rating is its observed click-through rate divided by the
//! corpus-wide click-through rate at the rank where it is usually shown.
//! `1.0` means the document is clicked exactly as often as its position
//! predicts.

mod aggregate;
mod assemble;
mod params;
mod score;


use tracing::info;

use crate::error::JudgmentError;
use crate::events::EventSource;
use crate::judgments::cancellation::CancellationToken;
use crate::model::Judgment;

use aggregate::{ClickAggregates, aggregate_events};
use assemble::assemble_judgment;
use score::{ScoreSummary, expected_click_rates, score_pairs};

pub use params::ClickModelParameters;

#[derive(Debug, Clone)]
pub struct CoecClickModel {
    parameters: ClickModelParameters,
}

impl CoecClickModel {
    pub fn new(parameters: ClickModelParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &ClickModelParameters {
        &self.parameters
    }

    pub fn calculate_judgments(
        &self,
        source: &dyn EventSource,
        cancel: &CancellationToken,
    ) -> Result<Vec<Judgment>, JudgmentError> {
        let aggregates = aggregate_events(source, &self.parameters, cancel)?;
        Ok(self.score_aggregates(&aggregates))
    }

    pub fn score_aggregates(&self, aggregates: &ClickAggregates) -> Vec<Judgment> {
        let expected = expected_click_rates(&aggregates.ranks);
        let mut summary = ScoreSummary::default();

        let judgments: Vec<Judgment> = aggregates
            .queries
            .iter()
            .filter_map(|query| {
                let scored = score_pairs(
                    &query.pairs,
                    &expected,
                    self.parameters.rounding_digits(),
                    &mut summary,
                );
                assemble_judgment(&query.query_id, scored)
            })
            .collect();

        info!(
            pairs_scored = summary.pairs_scored,
            skipped_without_impressions = summary.skipped_without_impressions,
            skipped_undefined_expectation = summary.skipped_undefined_expectation,
            queries_observed = aggregates.queries.len(),
            judgments = judgments.len(),
            "scored click model judgments"
        );

        judgments
    }
}
