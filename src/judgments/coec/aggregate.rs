use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;

use tracing::info;

use super::params::ClickModelParameters;
use crate::error::JudgmentError;
use crate::events::EventSource;
use crate::judgments::cancellation::CancellationToken;
use crate::model::{BehavioralEvent, EventType};

/// Corpus-wide tallies for one rank position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankStatistic {
    pub impressions: u64,
    pub clicks: u64,
}

impl RankStatistic {
    fn record(&mut self, event_type: EventType) {
        match event_type {
            EventType::Impression => self.impressions += 1,
            EventType::Click => self.clicks += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairStatistic {
    pub document_id: String,
    pub impressions: u64,
    pub clicks: u64,
    rank_counts: BTreeMap<u32, u64>,
}

impl PairStatistic {
    fn new(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            impressions: 0,
            clicks: 0,
            rank_counts: BTreeMap::new(),
        }
    }

    fn record(&mut self, event: &BehavioralEvent) {
        match event.event_type {
            EventType::Impression => self.impressions += 1,
            EventType::Click => self.clicks += 1,
        }
        *self.rank_counts.entry(event.rank).or_insert(0) += 1;
    }

    /// The most frequently observed rank; ties go to the most prominent rank.
    pub fn observed_rank(&self) -> Option<u32> {
        let mut best: Option<(u32, u64)> = None;
        for (&rank, &count) in &self.rank_counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((rank, count));
            }
        }
        best.map(|(rank, _)| rank)
    }
}

/// Pairs of one query in first-observed order.
#[derive(Debug, Clone)]
pub struct QueryPairs {
    pub query_id: String,
    pub pairs: Vec<PairStatistic>,
    pair_index: HashMap<String, usize>,
}

impl QueryPairs {
    fn new(query_id: &str) -> Self {
        Self {
            query_id: query_id.to_string(),
            pairs: Vec::new(),
            pair_index: HashMap::new(),
        }
    }

    fn pair_mut(&mut self, document_id: &str) -> &mut PairStatistic {
        let index = match self.pair_index.get(document_id) {
            Some(&index) => index,
            None => {
                self.pairs.push(PairStatistic::new(document_id));
                self.pair_index
                    .insert(document_id.to_string(), self.pairs.len() - 1);
                self.pairs.len() - 1
            }
        };
        &mut self.pairs[index]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    pub events_seen: u64,
    pub events_aggregated: u64,
    pub outside_window: u64,
    pub beyond_max_rank: u64,
    pub invalid_rank: u64,
    pub invalid_identity: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ClickAggregates {
    pub ranks: BTreeMap<u32, RankStatistic>,
    pub queries: Vec<QueryPairs>,
    pub summary: AggregationSummary,
}

impl ClickAggregates {
    pub fn pair_count(&self) -> usize {
        self.queries.iter().map(|query| query.pairs.len()).sum()
    }
}

/// Streaming accumulator; one per generation call.
#[derive(Debug)]
pub struct ClickAggregator<'a> {
    parameters: &'a ClickModelParameters,
    aggregates: ClickAggregates,
    query_index: HashMap<String, usize>,
}

impl<'a> ClickAggregator<'a> {
    pub fn new(parameters: &'a ClickModelParameters) -> Self {
        Self {
            parameters,
            aggregates: ClickAggregates::default(),
            query_index: HashMap::new(),
        }
    }

    pub fn observe(&mut self, event: &BehavioralEvent) {
        let summary = &mut self.aggregates.summary;
        summary.events_seen += 1;

        if event.rank == 0 {
            summary.invalid_rank += 1;
            return;
        }
        if event.query_id.trim().is_empty() || event.document_id.trim().is_empty() {
            summary.invalid_identity += 1;
            return;
        }
        if event.rank > self.parameters.max_rank() {
            summary.beyond_max_rank += 1;
            return;
        }
        if !self.parameters.admits_date(event.timestamp.date_naive()) {
            summary.outside_window += 1;
            return;
        }
        summary.events_aggregated += 1;

        self.aggregates
            .ranks
            .entry(event.rank)
            .or_default()
            .record(event.event_type);

        let index = match self.query_index.get(&event.query_id) {
            Some(&index) => index,
            None => {
                self.aggregates.queries.push(QueryPairs::new(&event.query_id));
                let index = self.aggregates.queries.len() - 1;
                self.query_index.insert(event.query_id.clone(), index);
                index
            }
        };
        self.aggregates.queries[index]
            .pair_mut(&event.document_id)
            .record(event);
    }

    pub fn finish(self) -> ClickAggregates {
        self.aggregates
    }
}

/// Single pass over `source`. A source failure or cancellation discards
/// everything aggregated so far.
pub fn aggregate_events(
    source: &dyn EventSource,
    parameters: &ClickModelParameters,
    cancel: &CancellationToken,
) -> Result<ClickAggregates, JudgmentError> {
    let mut aggregator = ClickAggregator::new(parameters);
    let mut cancelled = false;

    source.scan(&parameters.event_filter(), &mut |event| {
        if cancel.is_cancelled() {
            cancelled = true;
            return ControlFlow::Break(());
        }
        aggregator.observe(&event);
        ControlFlow::Continue(())
    })?;

    if cancelled || cancel.is_cancelled() {
        return Err(JudgmentError::Cancelled);
    }

    let aggregates = aggregator.finish();
    let summary = aggregates.summary;
    info!(
        source = %source.describe(),
        events_seen = summary.events_seen,
        events_aggregated = summary.events_aggregated,
        outside_window = summary.outside_window,
        beyond_max_rank = summary.beyond_max_rank,
        invalid_rank = summary.invalid_rank,
        invalid_identity = summary.invalid_identity,
        ranks = aggregates.ranks.len(),
        pairs = aggregates.pair_count(),
        "aggregated behavioral events"
    );

    Ok(aggregates)
}
