use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::info;

use super::coec::event_source;
use super::generate::{GenerationJob, run_generation};
use crate::cli::RunArgs;
use crate::model::JudgmentType;
use crate::util::read_json;

pub fn run(args: RunArgs, stats_enabled: bool) -> Result<()> {
    let judgment_type = args
        .judgment_type
        .parse::<JudgmentType>()
        .context("cannot start judgment generation")?;

    let metadata = match read_json(&args.metadata)? {
        Value::Object(map) => map,
        other => bail!(
            "expected a metadata object in {}, got {other}",
            args.metadata.display()
        ),
    };

    let source = match judgment_type {
        JudgmentType::Import => None,
        JudgmentType::ClickModel => Some(event_source(
            &args.cache_root,
            args.events_db.as_deref(),
            args.events_jsonl.as_deref(),
        )),
    };

    info!(
        judgment_type = %judgment_type,
        metadata = %args.metadata.display(),
        "loaded generation metadata"
    );

    run_generation(GenerationJob {
        cache_root: &args.cache_root,
        judgment_type,
        metadata,
        source,
        run: &args.run,
        stats_enabled,
    })
}
