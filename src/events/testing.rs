use std::ops::ControlFlow;

use chrono::{DateTime, TimeZone, Utc};

use super::{EventFilter, EventSource};
use crate::error::EventSourceError;
use crate::model::{BehavioralEvent, EventType};

pub fn timestamp(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid test timestamp")
}

pub fn event(query: &str, doc: &str, rank: u32, event_type: EventType) -> BehavioralEvent {
    BehavioralEvent {
        query_id: query.to_string(),
        document_id: doc.to_string(),
        rank,
        event_type,
        timestamp: timestamp(2024, 3, 15),
    }
}

/// `impressions` impression events followed by `clicks` click events.
pub fn repeated(
    query: &str,
    doc: &str,
    rank: u32,
    impressions: usize,
    clicks: usize,
) -> Vec<BehavioralEvent> {
    let mut events = vec![event(query, doc, rank, EventType::Impression); impressions];
    events.extend(vec![event(query, doc, rank, EventType::Click); clicks]);
    events
}

/// In-memory events; ignores pushdown filters.
#[derive(Debug, Clone, Default)]
pub struct VecEventSource {
    pub events: Vec<BehavioralEvent>,
}

impl VecEventSource {
    pub fn new(events: Vec<BehavioralEvent>) -> Self {
        Self { events }
    }
}

impl EventSource for VecEventSource {
    fn describe(&self) -> String {
        format!("memory:{}", self.events.len())
    }

    fn scan(
        &self,
        _filter: &EventFilter,
        visit: &mut dyn FnMut(BehavioralEvent) -> ControlFlow<()>,
    ) -> Result<(), EventSourceError> {
        for event in &self.events {
            if visit(event.clone()).is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// Yields `fail_after` events, then fails as a dropped connection would.
#[derive(Debug, Clone)]
pub struct FailingEventSource {
    pub fail_after: usize,
}

impl EventSource for FailingEventSource {
    fn describe(&self) -> String {
        "failing".to_string()
    }

    fn scan(
        &self,
        _filter: &EventFilter,
        visit: &mut dyn FnMut(BehavioralEvent) -> ControlFlow<()>,
    ) -> Result<(), EventSourceError> {
        for _ in 0..self.fail_after {
            if visit(event("q", "d", 1, EventType::Impression)).is_break() {
                return Ok(());
            }
        }
        Err(EventSourceError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "event store connection reset",
        )))
    }
}

/// Never runs dry; only a breaking visitor ends the scan.
#[derive(Debug, Clone, Default)]
pub struct EndlessEventSource;

impl EventSource for EndlessEventSource {
    fn describe(&self) -> String {
        "endless".to_string()
    }

    fn scan(
        &self,
        _filter: &EventFilter,
        visit: &mut dyn FnMut(BehavioralEvent) -> ControlFlow<()>,
    ) -> Result<(), EventSourceError> {
        loop {
            if visit(event("q", "d", 1, EventType::Impression)).is_break() {
                return Ok(());
            }
        }
    }
}
