use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::cli::{StatusArgs, default_events_db};
use crate::events::SqliteEventSource;
use crate::model::GenerationRunManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = args
        .events_db
        .clone()
        .unwrap_or_else(|| default_events_db(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: GenerationRunManifest = read_json(&path)?;
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                judgment_type = %manifest.judgment_type,
                name = %manifest.name,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                queries = manifest.counts.queries,
                ratings = manifest.counts.ratings,
                output_path = %manifest.output_path.unwrap_or_default(),
                output_sha256 = %manifest.output_sha256.unwrap_or_default(),
                failure_reason = %manifest.failure_reason.unwrap_or_default(),
                "loaded latest generation run manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no generation run manifests found"),
    }

    if db_path.exists() {
        let summary = SqliteEventSource::new(&db_path)
            .summary()
            .with_context(|| format!("failed to summarize {}", db_path.display()))?;
        info!(
            path = %db_path.display(),
            events = summary.events_total,
            impressions = summary.impressions,
            clicks = summary.clicks,
            distinct_queries = summary.distinct_queries,
            distinct_pairs = summary.distinct_pairs,
            first_timestamp = %summary.first_timestamp.unwrap_or_default(),
            last_timestamp = %summary.last_timestamp.unwrap_or_default(),
            "event store status"
        );
    } else {
        warn!(path = %db_path.display(), "event store missing");
    }

    Ok(())
}

/// Manifest names embed a compact UTC timestamp, so the lexically greatest
/// match is the newest run.
fn latest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let pattern = Regex::new(r"^generation_run_(\d{8}T\d{6}Z)\.json$")
        .context("failed to compile manifest filename regex")?;

    let mut latest: Option<(String, PathBuf)> = None;
    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read {}", manifest_dir.display()))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(captures) = pattern.captures(name) else {
            continue;
        };
        let stamp = captures[1].to_string();
        if latest.as_ref().is_none_or(|(current, _)| stamp > *current) {
            latest = Some((stamp, entry.path()));
        }
    }

    Ok(latest.map(|(_, path)| path))
}
