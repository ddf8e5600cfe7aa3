use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{info, warn};

use super::cancellation::CancellationToken;
use super::request::GenerationRequest;
use super::strategy::StrategyRegistry;
use crate::error::JudgmentError;
use crate::model::Judgment;
use crate::stats::{EventStatName, EventStats};

pub type GenerationResult = Result<Vec<Judgment>, JudgmentError>;

/// Handle to an in-flight generation. Dropping it does not cancel the work.
#[derive(Debug, Clone)]
pub struct GenerationHandle {
    cancel: CancellationToken,
}

impl GenerationHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Dispatches generation requests onto a tokio runtime and reports each
/// outcome through a completion callback.
#[derive(Debug, Clone)]
pub struct JudgmentEngine {
    registry: StrategyRegistry,
    stats: Arc<EventStats>,
    runtime: Handle,
}

impl JudgmentEngine {
    pub fn new(runtime: Handle, stats: Arc<EventStats>) -> Self {
        Self {
            registry: StrategyRegistry::new(),
            stats,
            runtime,
        }
    }

    pub fn stats(&self) -> &EventStats {
        &self.stats
    }

    /// Never blocks the caller. `on_complete` runs exactly once with either
    /// the judgments or the failure, including panics inside a strategy.
    pub fn generate<F>(&self, request: GenerationRequest, on_complete: F) -> GenerationHandle
    where
        F: FnOnce(GenerationResult) + Send + 'static,
    {
        let judgment_type = request.judgment_type();
        let strategy = self.registry.resolve(judgment_type);
        self.stats
            .increment(EventStatName::for_judgment_type(judgment_type));

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        info!(judgment_type = %judgment_type, "dispatching judgment generation");

        let task = self
            .runtime
            .spawn_blocking(move || strategy.generate(request, &token));

        self.runtime.spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => {
                    warn!(error = %err, "judgment generation task failed");
                    Err(JudgmentError::Internal(err.to_string()))
                }
            };

            match &result {
                Ok(judgments) => info!(
                    judgment_type = %judgment_type,
                    judgments = judgments.len(),
                    "judgment generation completed"
                ),
                Err(err) => warn!(
                    judgment_type = %judgment_type,
                    status = %err.status(),
                    error = %err,
                    "judgment generation failed"
                ),
            }

            on_complete(result);
        });

        GenerationHandle { cancel }
    }
}
