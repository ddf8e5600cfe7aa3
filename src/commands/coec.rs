use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map, Value, json};
use tracing::info;

use super::generate::{GenerationJob, run_generation};
use crate::cli::{CoecArgs, default_events_db};
use crate::events::{EventSource, JsonLinesEventSource, SqliteEventSource};
use crate::model::JudgmentType;

pub fn run(args: CoecArgs, stats_enabled: bool) -> Result<()> {
    let source = event_source(
        &args.cache_root,
        args.events_db.as_deref(),
        args.events_jsonl.as_deref(),
    );
    let metadata = click_model_metadata(&args);

    info!(source = %source.describe(), "using behavioral event source");

    run_generation(GenerationJob {
        cache_root: &args.cache_root,
        judgment_type: JudgmentType::ClickModel,
        metadata,
        source: Some(source),
        run: &args.run,
        stats_enabled,
    })
}

/// JSON lines when given, otherwise the SQLite store (under `cache_root`
/// unless `events_db` names one).
pub(super) fn event_source(
    cache_root: &Path,
    events_db: Option<&Path>,
    events_jsonl: Option<&Path>,
) -> Arc<dyn EventSource> {
    match events_jsonl {
        Some(path) => Arc::new(JsonLinesEventSource::new(path)),
        None => Arc::new(SqliteEventSource::new(
            events_db.map_or_else(|| default_events_db(cache_root), PathBuf::from),
        )),
    }
}

/// Flags are forwarded as metadata so they pass through the same checks as
/// any other caller.
fn click_model_metadata(args: &CoecArgs) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("clickModel".to_string(), json!(args.click_model));
    metadata.insert("maxRank".to_string(), json!(args.max_rank));
    metadata.insert("roundingDigits".to_string(), json!(args.rounding_digits));
    if let Some(start_date) = &args.start_date {
        metadata.insert("startDate".to_string(), json!(start_date));
    }
    if let Some(end_date) = &args.end_date {
        metadata.insert("endDate".to_string(), json!(end_date));
    }
    metadata
}
