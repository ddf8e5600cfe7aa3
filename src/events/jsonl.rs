use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::PathBuf;

use super::{EventFilter, EventSource};
use crate::error::EventSourceError;
use crate::model::BehavioralEvent;

/// One JSON-encoded event per line. Filters are not pushed down.
#[derive(Debug, Clone)]
pub struct JsonLinesEventSource {
    path: PathBuf,
}

impl JsonLinesEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventSource for JsonLinesEventSource {
    fn describe(&self) -> String {
        format!("jsonl:{}", self.path.display())
    }

    fn scan(
        &self,
        _filter: &EventFilter,
        visit: &mut dyn FnMut(BehavioralEvent) -> ControlFlow<()>,
    ) -> Result<(), EventSourceError> {
        let reader = BufReader::new(File::open(&self.path)?);

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let event: BehavioralEvent =
                serde_json::from_str(&line).map_err(|source| EventSourceError::Decode {
                    line: index + 1,
                    source,
                })?;

            if visit(event).is_break() {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_lines(dir: &tempfile::TempDir, lines: &[&str]) -> PathBuf {
        let path = dir.path().join("events.jsonl");
        let mut file = File::create(&path).expect("create events file");
        for line in lines {
            writeln!(file, "{line}").expect("write event line");
        }
        path
    }

    #[test]
    fn scan_streams_events_in_file_order_and_skips_blank_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_lines(
            &dir,
            &[
                r#"{"query_id":"q1","document_id":"d1","rank":1,"event_type":"impression","timestamp":"2024-03-01T10:00:00Z"}"#,
                "",
                r#"{"query_id":"q1","document_id":"d1","rank":1,"event_type":"click","timestamp":"2024-03-01T10:00:05Z"}"#,
            ],
        );

        let source = JsonLinesEventSource::new(&path);
        let mut seen = Vec::new();
        source
            .scan(&EventFilter::default(), &mut |event| {
                seen.push(event.event_type);
                ControlFlow::Continue(())
            })
            .expect("scan should succeed");

        assert_eq!(
            seen,
            vec![crate::model::EventType::Impression, crate::model::EventType::Click]
        );
    }

    #[test]
    fn scan_reports_the_line_of_a_malformed_event() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_lines(
            &dir,
            &[
                r#"{"query_id":"q1","document_id":"d1","rank":1,"event_type":"impression","timestamp":"2024-03-01T10:00:00Z"}"#,
                r#"{"query_id":"q1","document_id":"d1","rank":"top"}"#,
            ],
        );

        let err = JsonLinesEventSource::new(&path)
            .scan(&EventFilter::default(), &mut |_| ControlFlow::Continue(()))
            .expect_err("malformed line should fail");
        assert!(matches!(err, EventSourceError::Decode { line: 2, .. }));
    }

    #[test]
    fn scan_stops_when_visitor_breaks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let line = r#"{"query_id":"q","document_id":"d","rank":2,"event_type":"click","timestamp":"2024-03-01T10:00:00Z"}"#;
        let path = write_lines(&dir, &[line, line, line]);

        let mut visited = 0;
        JsonLinesEventSource::new(&path)
            .scan(&EventFilter::default(), &mut |_| {
                visited += 1;
                ControlFlow::Break(())
            })
            .expect("scan should succeed");
        assert_eq!(visited, 1);
    }
}
