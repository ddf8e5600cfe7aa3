use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{Map, Value, json};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cli::RunDescriptorArgs;
use crate::error::JudgmentError;
use crate::events::EventSource;
use crate::judgments::{GenerationRequest, GenerationResult, JudgmentEngine};
use crate::model::{GenerationCounts, GenerationRunManifest, Judgment, JudgmentType};
use crate::stats::EventStats;
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};
use crate::validation::{validate_description, validate_name};

pub struct GenerationJob<'a> {
    pub cache_root: &'a Path,
    pub judgment_type: JudgmentType,
    pub metadata: Map<String, Value>,
    pub source: Option<Arc<dyn EventSource>>,
    pub run: &'a RunDescriptorArgs,
    pub stats_enabled: bool,
}

pub fn run_generation(job: GenerationJob<'_>) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let output_path = job.run.output.clone().unwrap_or_else(|| {
        job.cache_root
            .join("judgments")
            .join(format!("judgments_{}.json", utc_compact_string(started_ts)))
    });
    let manifest_path = job.run.manifest_path.clone().unwrap_or_else(|| {
        job.cache_root.join("manifests").join(format!(
            "generation_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    let mut manifest = GenerationRunManifest {
        manifest_version: 1,
        run_id,
        judgment_type: job.judgment_type,
        name: job.run.name.clone(),
        description: job.run.description.clone(),
        status: "running".to_string(),
        started_at: now_utc_string(),
        updated_at: now_utc_string(),
        parameters: Value::Null,
        output_path: None,
        output_sha256: None,
        failure_reason: None,
        counts: GenerationCounts::default(),
    };

    info!(
        run_id = %manifest.run_id,
        judgment_type = %job.judgment_type,
        name = %job.run.name,
        "starting judgment generation"
    );

    let prepared = validate_run_descriptor(&job.run.name, &job.run.description).and_then(|()| {
        let mut metadata = job.metadata;
        GenerationRequest::from_metadata(job.judgment_type, &mut metadata, job.source)
    });
    let result = match prepared {
        Ok(request) => {
            manifest.parameters = describe_parameters(&request);
            execute(request, Arc::new(EventStats::new(job.stats_enabled)))?
        }
        Err(err) => Err(err),
    };

    let judgments = match result {
        Ok(judgments) => judgments,
        Err(err) => {
            manifest.status = "failed".to_string();
            manifest.updated_at = now_utc_string();
            manifest.failure_reason = Some(err.to_string());
            write_json_pretty(&manifest_path, &manifest)?;
            warn!(
                path = %manifest_path.display(),
                kind = ?err.kind(),
                status_code = err.status_code(),
                "wrote failed generation manifest"
            );
            return Err(err).context("judgment generation failed");
        }
    };

    write_json_pretty(&output_path, &judgments)?;
    let output_sha256 = sha256_file(&output_path)?;
    info!(path = %output_path.display(), sha256 = %output_sha256, "wrote judgments");

    manifest.status = "completed".to_string();
    manifest.updated_at = now_utc_string();
    manifest.output_path = Some(output_path.display().to_string());
    manifest.output_sha256 = Some(output_sha256);
    manifest.counts = count_judgments(&judgments);
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote generation run manifest");
    info!(
        queries = manifest.counts.queries,
        ratings = manifest.counts.ratings,
        "judgment generation completed"
    );

    Ok(())
}

/// Runs one generation on a dedicated runtime. Ctrl-C cancels the scan; the
/// cancellation still arrives through the completion callback.
fn execute(request: GenerationRequest, stats: Arc<EventStats>) -> Result<GenerationResult> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    let engine = JudgmentEngine::new(runtime.handle().clone(), stats);
    let (tx, mut rx) = oneshot::channel::<GenerationResult>();
    let handle = engine.generate(request, move |result| {
        let _ = tx.send(result);
    });

    let result = runtime.block_on(async move {
        tokio::select! {
            result = &mut rx => return result.context("generation finished without a result"),
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupt received, cancelling judgment generation");
                handle.cancel();
            }
        }
        rx.await.context("generation finished without a result")
    })?;

    let stats = engine.stats();
    if stats.is_enabled() {
        let snapshot = stats.snapshot();
        info!(
            import_generations = snapshot.import_judgment_rating_generations,
            ubi_generations = snapshot.ubi_judgment_rating_generations,
            "event stats"
        );
    }

    Ok(result)
}

fn validate_run_descriptor(name: &str, description: &str) -> Result<(), JudgmentError> {
    let name_check = validate_name(Some(name));
    if !name_check.valid {
        return Err(JudgmentError::InvalidInput(format!(
            "Invalid name: {}",
            name_check.message()
        )));
    }

    let description_check = validate_description(Some(description));
    if !description_check.valid {
        return Err(JudgmentError::InvalidInput(format!(
            "Invalid description: {}",
            description_check.message()
        )));
    }

    Ok(())
}

fn describe_parameters(request: &GenerationRequest) -> Value {
    match request {
        GenerationRequest::Import(import) => json!({
            "queries": import.judgment_ratings.len(),
        }),
        GenerationRequest::ClickModel(click) => {
            let mut parameters = click.parameters.to_metadata();
            if let Value::Object(map) = &mut parameters {
                map.insert("clickModel".to_string(), json!(click.click_model.as_str()));
                map.insert("source".to_string(), json!(click.source.describe()));
            }
            parameters
        }
    }
}

fn count_judgments(judgments: &[Judgment]) -> GenerationCounts {
    GenerationCounts {
        queries: judgments.len(),
        ratings: judgments.iter().map(|judgment| judgment.ratings.len()).sum(),
    }
}
