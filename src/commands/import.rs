use anyhow::{Result, bail};
use serde_json::{Map, Value};
use tracing::info;

use super::generate::{GenerationJob, run_generation};
use crate::cli::ImportArgs;
use crate::model::JudgmentType;
use crate::util::read_json;

pub fn run(args: ImportArgs, stats_enabled: bool) -> Result<()> {
    let raw: Value = read_json(&args.input)?;
    let metadata = import_metadata(raw)?;

    info!(input = %args.input.display(), "loaded judgment ratings");

    run_generation(GenerationJob {
        cache_root: &args.cache_root,
        judgment_type: JudgmentType::Import,
        metadata,
        source: None,
        run: &args.run,
        stats_enabled,
    })
}

/// A bare list is shorthand for `{"judgmentRatings": [...]}`.
fn import_metadata(raw: Value) -> Result<Map<String, Value>> {
    match raw {
        Value::Object(map) => Ok(map),
        Value::Array(entries) => {
            let mut map = Map::new();
            map.insert("judgmentRatings".to_string(), Value::Array(entries));
            Ok(map)
        }
        other => bail!("expected a list of query ratings or a metadata object, got {other}"),
    }
}
