mod jsonl;
mod sqlite;

#[cfg(test)]
pub mod testing;

use std::ops::ControlFlow;

use chrono::NaiveDate;

use crate::error::EventSourceError;
use crate::model::BehavioralEvent;

pub use jsonl::JsonLinesEventSource;
pub use sqlite::SqliteEventSource;

/// Pushdown hints for a scan. Sources may ignore them; the aggregator
/// re-applies every bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_rank: Option<u32>,
}

/// A lazily read, restartable sequence of behavioral events.
///
/// Each call to `scan` starts a fresh pass and feeds events to `visit` in
/// source order until the source is exhausted or `visit` breaks.
pub trait EventSource: Send + Sync {
    fn describe(&self) -> String;

    fn scan(
        &self,
        filter: &EventFilter,
        visit: &mut dyn FnMut(BehavioralEvent) -> ControlFlow<()>,
    ) -> Result<(), EventSourceError>;
}
