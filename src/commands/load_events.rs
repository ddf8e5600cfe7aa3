use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{LoadEventsArgs, default_events_db};
use crate::events::{EventSource, JsonLinesEventSource, SqliteEventSource};
use crate::util::ensure_directory;

pub fn run(args: LoadEventsArgs) -> Result<()> {
    let db_path = args
        .events_db
        .clone()
        .unwrap_or_else(|| default_events_db(&args.cache_root));
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let input = JsonLinesEventSource::new(&args.input);
    let store = SqliteEventSource::new(db_path);

    info!(from = %input.describe(), to = %store.describe(), "loading behavioral events");
    let inserted = store
        .load_from(&input)
        .with_context(|| format!("failed to load events into {}", store.db_path().display()))?;

    let summary = store.summary()?;
    info!(
        inserted,
        events_total = summary.events_total,
        distinct_queries = summary.distinct_queries,
        "behavioral events loaded"
    );

    Ok(())
}
