use tracing::info;

use super::cancellation::CancellationToken;
use super::coec::CoecClickModel;
use super::import::ImportJudgments;
use super::request::{ClickModelKind, ClickModelRequest, GenerationRequest};
use crate::error::JudgmentError;
use crate::model::{Judgment, JudgmentType};

#[derive(Debug, Clone, Copy, Default)]
pub struct ClickModelJudgments;

impl ClickModelJudgments {
    pub fn generate(
        &self,
        request: ClickModelRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Judgment>, JudgmentError> {
        match request.click_model {
            ClickModelKind::Coec => {
                let model = CoecClickModel::new(request.parameters);
                let parameters = model.parameters();
                info!(
                    click_model = %request.click_model,
                    source = %request.source.describe(),
                    max_rank = parameters.max_rank(),
                    rounding_digits = parameters.rounding_digits(),
                    start_date = ?parameters.start_date(),
                    end_date = ?parameters.end_date(),
                    "calculating click model judgments"
                );
                model.calculate_judgments(request.source.as_ref(), cancel)
            }
        }
    }
}

/// One variant per supported judgment type.
#[derive(Debug, Clone, Copy)]
pub enum JudgmentStrategy {
    Import(ImportJudgments),
    ClickModel(ClickModelJudgments),
}

impl JudgmentStrategy {
    pub fn judgment_type(&self) -> JudgmentType {
        match self {
            Self::Import(_) => JudgmentType::Import,
            Self::ClickModel(_) => JudgmentType::ClickModel,
        }
    }

    pub fn generate(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Judgment>, JudgmentError> {
        match (self, request) {
            (Self::Import(strategy), GenerationRequest::Import(request)) => {
                strategy.normalize(&request.judgment_ratings)
            }
            (Self::ClickModel(strategy), GenerationRequest::ClickModel(request)) => {
                strategy.generate(request, cancel)
            }
            (strategy, request) => Err(JudgmentError::Configuration(format!(
                "{} strategy cannot handle a {} request",
                strategy.judgment_type(),
                request.judgment_type()
            ))),
        }
    }
}

/// Resolves each judgment type to its strategy; built once per engine.
#[derive(Debug, Clone, Copy)]
pub struct StrategyRegistry {
    import: JudgmentStrategy,
    click_model: JudgmentStrategy,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            import: JudgmentStrategy::Import(ImportJudgments),
            click_model: JudgmentStrategy::ClickModel(ClickModelJudgments),
        }
    }

    pub fn resolve(&self, judgment_type: JudgmentType) -> JudgmentStrategy {
        match judgment_type {
            JudgmentType::Import => self.import,
            JudgmentType::ClickModel => self.click_model,
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
