use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;

use super::{EventFilter, EventSource};
use crate::error::EventSourceError;
use crate::model::{BehavioralEvent, EventType};

/// Behavioral events stored in the `ubi_events` table of a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteEventSource {
    db_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventStoreSummary {
    pub events_total: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub distinct_queries: i64,
    pub distinct_pairs: i64,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

impl SqliteEventSource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Appends every event produced by `from` in a single transaction.
    pub fn load_from(&self, from: &dyn EventSource) -> Result<usize, EventSourceError> {
        let mut connection = Connection::open(&self.db_path)?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;

        let tx = connection.transaction()?;
        let mut inserted = 0_usize;
        let mut insert_error = None;
        {
            let mut statement = tx.prepare(
                "
                INSERT INTO ubi_events(query_id, document_id, rank, event_type, timestamp)
                VALUES(?1, ?2, ?3, ?4, ?5)
                ",
            )?;

            from.scan(&EventFilter::default(), &mut |event| {
                let result = statement.execute(params![
                    event.query_id,
                    event.document_id,
                    i64::from(event.rank),
                    event.event_type.as_str(),
                    event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                ]);
                match result {
                    Ok(_) => {
                        inserted += 1;
                        ControlFlow::Continue(())
                    }
                    Err(err) => {
                        insert_error = Some(err);
                        ControlFlow::Break(())
                    }
                }
            })?;
        }

        if let Some(err) = insert_error {
            return Err(err.into());
        }
        tx.commit()?;

        Ok(inserted)
    }

    pub fn summary(&self) -> Result<EventStoreSummary, EventSourceError> {
        let connection = open_read_only(&self.db_path)?;
        let summary = connection.query_row(
            "
            SELECT
              COUNT(*),
              COALESCE(SUM(CASE WHEN event_type = 'impression' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN event_type = 'click' THEN 1 ELSE 0 END), 0),
              COUNT(DISTINCT query_id),
              COUNT(DISTINCT query_id || char(31) || document_id),
              MIN(timestamp),
              MAX(timestamp)
            FROM ubi_events
            ",
            [],
            |row| {
                Ok(EventStoreSummary {
                    events_total: row.get(0)?,
                    impressions: row.get(1)?,
                    clicks: row.get(2)?,
                    distinct_queries: row.get(3)?,
                    distinct_pairs: row.get(4)?,
                    first_timestamp: row.get(5)?,
                    last_timestamp: row.get(6)?,
                })
            },
        )?;

        Ok(summary)
    }
}

impl EventSource for SqliteEventSource {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }

    fn scan(
        &self,
        filter: &EventFilter,
        visit: &mut dyn FnMut(BehavioralEvent) -> ControlFlow<()>,
    ) -> Result<(), EventSourceError> {
        let connection = open_read_only(&self.db_path)?;
        let mut statement = connection.prepare(
            "
            SELECT event_seq, query_id, document_id, rank, event_type, timestamp
            FROM ubi_events
            WHERE (?1 IS NULL OR date(timestamp) >= ?1)
              AND (?2 IS NULL OR date(timestamp) <= ?2)
              AND (?3 IS NULL OR rank <= ?3)
            ORDER BY event_seq ASC
            ",
        )?;

        let max_rank = filter.max_rank.map(i64::from);
        let mut rows = statement.query(params![filter.start_date, filter.end_date, max_rank])?;

        while let Some(row) = rows.next()? {
            let event_seq: i64 = row.get(0)?;
            let rank: i64 = row.get(3)?;
            let event_type: String = row.get(4)?;
            let timestamp: String = row.get(5)?;

            let event = BehavioralEvent {
                query_id: row.get(1)?,
                document_id: row.get(2)?,
                rank: u32::try_from(rank).map_err(|_| EventSourceError::InvalidRow {
                    row: event_seq,
                    message: format!("rank {rank} is out of range"),
                })?,
                event_type: event_type.parse::<EventType>().map_err(|message| {
                    EventSourceError::InvalidRow {
                        row: event_seq,
                        message,
                    }
                })?,
                timestamp: parse_timestamp(&timestamp).ok_or_else(|| {
                    EventSourceError::InvalidRow {
                        row: event_seq,
                        message: format!("invalid timestamp '{timestamp}'"),
                    }
                })?,
            };

            if visit(event).is_break() {
                break;
            }
        }

        Ok(())
    }
}

fn open_read_only(db_path: &Path) -> Result<Connection, EventSourceError> {
    let connection = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<(), EventSourceError> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<(), EventSourceError> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ubi_events (
          event_seq INTEGER PRIMARY KEY AUTOINCREMENT,
          query_id TEXT NOT NULL,
          document_id TEXT NOT NULL,
          rank INTEGER NOT NULL,
          event_type TEXT NOT NULL,
          timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ubi_events_rank ON ubi_events(rank);
        CREATE INDEX IF NOT EXISTS idx_ubi_events_timestamp ON ubi_events(timestamp);
        ",
    )?;
    Ok(())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    struct FixedEvents(Vec<BehavioralEvent>);

    impl EventSource for FixedEvents {
        fn describe(&self) -> String {
            "fixed".to_string()
        }

        fn scan(
            &self,
            _filter: &EventFilter,
            visit: &mut dyn FnMut(BehavioralEvent) -> ControlFlow<()>,
        ) -> Result<(), EventSourceError> {
            for event in &self.0 {
                if visit(event.clone()).is_break() {
                    break;
                }
            }
            Ok(())
        }
    }

    fn event(query: &str, doc: &str, rank: u32, event_type: EventType, day: u32) -> BehavioralEvent {
        BehavioralEvent {
            query_id: query.to_string(),
            document_id: doc.to_string(),
            rank,
            event_type,
            timestamp: Utc
                .with_ymd_and_hms(2024, 3, day, 23, 59, 59)
                .single()
                .expect("valid timestamp"),
        }
    }

    fn collect(source: &SqliteEventSource, filter: &EventFilter) -> Vec<BehavioralEvent> {
        let mut events = Vec::new();
        source
            .scan(filter, &mut |event| {
                events.push(event);
                ControlFlow::Continue(())
            })
            .expect("scan should succeed");
        events
    }

    fn seeded_store(dir: &tempfile::TempDir) -> SqliteEventSource {
        let source = SqliteEventSource::new(dir.path().join("events.sqlite"));
        let events = FixedEvents(vec![
            event("q1", "d1", 1, EventType::Impression, 1),
            event("q1", "d1", 1, EventType::Click, 1),
            event("q1", "d2", 2, EventType::Impression, 2),
            event("q2", "d3", 5, EventType::Impression, 3),
            event("q2", "d3", 5, EventType::Click, 4),
        ]);
        let inserted = source.load_from(&events).expect("load should succeed");
        assert_eq!(inserted, 5);
        source
    }

    #[test]
    fn scan_round_trips_events_in_insertion_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = seeded_store(&dir);

        let events = collect(&source, &EventFilter::default());
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], event("q1", "d1", 1, EventType::Impression, 1));
        assert_eq!(events[4], event("q2", "d3", 5, EventType::Click, 4));
    }

    #[test]
    fn scan_pushes_rank_and_inclusive_date_bounds_into_sql() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = seeded_store(&dir);

        let filter = EventFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 3),
            max_rank: Some(2),
        };
        let events = collect(&source, &filter);
        let ranks: Vec<u32> = events.iter().map(|event| event.rank).collect();
        assert_eq!(ranks, vec![1, 1, 2]);
    }

    #[test]
    fn date_bounds_compare_utc_days_for_offset_timestamps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = seeded_store(&dir);
        let connection = Connection::open(source.db_path()).expect("open store");
        connection
            .execute(
                "INSERT INTO ubi_events(query_id, document_id, rank, event_type, timestamp)
                 VALUES('q3', 'd4', 1, 'impression', '2024-03-01T23:30:00-02:00')",
                [],
            )
            .expect("insert offset row");

        let day = |day: u32| NaiveDate::from_ymd_opt(2024, 3, day);
        let on_second = EventFilter {
            start_date: day(2),
            end_date: day(2),
            max_rank: None,
        };
        let events = collect(&source, &on_second);
        let queries: Vec<&str> = events.iter().map(|event| event.query_id.as_str()).collect();
        assert_eq!(queries, vec!["q1", "q3"]);
        assert_eq!(events[1].timestamp.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 2).expect("date"));

        let on_first = EventFilter {
            start_date: day(1),
            end_date: day(1),
            max_rank: None,
        };
        assert!(
            collect(&source, &on_first)
                .iter()
                .all(|event| event.query_id != "q3")
        );
    }

    #[test]
    fn summary_counts_events_by_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = seeded_store(&dir);

        let summary = source.summary().expect("summary should succeed");
        assert_eq!(summary.events_total, 5);
        assert_eq!(summary.impressions, 3);
        assert_eq!(summary.clicks, 2);
        assert_eq!(summary.distinct_queries, 2);
        assert_eq!(summary.distinct_pairs, 3);
        assert_eq!(
            summary.first_timestamp.as_deref(),
            Some("2024-03-01T23:59:59.000Z")
        );
    }

    #[test]
    fn scan_of_missing_database_is_a_source_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = SqliteEventSource::new(dir.path().join("missing.sqlite"));
        let err = source
            .scan(&EventFilter::default(), &mut |_| ControlFlow::Continue(()))
            .expect_err("missing database should fail");
        assert!(matches!(err, EventSourceError::Sqlite(_)));
    }
}
