use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::coec::ClickModelParameters;
use crate::error::JudgmentError;
use crate::events::EventSource;
use crate::model::JudgmentType;

pub const JUDGMENT_RATINGS_KEY: &str = "judgmentRatings";
pub const CLICK_MODEL_KEY: &str = "clickModel";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClickModelKind {
    Coec,
}

impl ClickModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coec => "coec",
        }
    }
}

impl fmt::Display for ClickModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClickModelKind {
    type Err = JudgmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "coec" => Ok(Self::Coec),
            _ => Err(JudgmentError::Configuration(format!(
                "unsupported click model '{value}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub judgment_ratings: Vec<Value>,
}

#[derive(Clone)]
pub struct ClickModelRequest {
    pub click_model: ClickModelKind,
    pub parameters: ClickModelParameters,
    pub source: Arc<dyn EventSource>,
}

impl fmt::Debug for ClickModelRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickModelRequest")
            .field("click_model", &self.click_model)
            .field("parameters", &self.parameters)
            .field("source", &self.source.describe())
            .finish()
    }
}

/// Strongly typed per-strategy configuration.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Import(ImportRequest),
    ClickModel(ClickModelRequest),
}

impl GenerationRequest {
    /// Validates loosely typed metadata once, before any work is scheduled.
    /// The import payload key is removed from `metadata`; every other key is
    /// left in place for the caller.
    pub fn from_metadata(
        judgment_type: JudgmentType,
        metadata: &mut Map<String, Value>,
        source: Option<Arc<dyn EventSource>>,
    ) -> Result<Self, JudgmentError> {
        match judgment_type {
            JudgmentType::Import => {
                let judgment_ratings = match metadata.remove(JUDGMENT_RATINGS_KEY) {
                    Some(Value::Array(entries)) => entries,
                    None | Some(Value::Null) => {
                        return Err(JudgmentError::InvalidInput(format!(
                            "{JUDGMENT_RATINGS_KEY} is required for imported judgments"
                        )));
                    }
                    Some(_) => {
                        return Err(JudgmentError::InvalidInput(format!(
                            "{JUDGMENT_RATINGS_KEY} must be a list of query ratings"
                        )));
                    }
                };
                Ok(Self::Import(ImportRequest { judgment_ratings }))
            }
            JudgmentType::ClickModel => {
                let click_model = match metadata.get(CLICK_MODEL_KEY) {
                    None | Some(Value::Null) => ClickModelKind::Coec,
                    Some(Value::String(name)) => name.parse()?,
                    Some(other) => {
                        return Err(JudgmentError::Configuration(format!(
                            "unsupported click model '{other}'"
                        )));
                    }
                };
                let parameters = ClickModelParameters::from_metadata(metadata)?;
                let source = source.ok_or_else(|| {
                    JudgmentError::Configuration(
                        "click model judgments require a behavioral event source".to_string(),
                    )
                })?;

                Ok(Self::ClickModel(ClickModelRequest {
                    click_model,
                    parameters,
                    source,
                }))
            }
        }
    }

    pub fn judgment_type(&self) -> JudgmentType {
        match self {
            Self::Import(_) => JudgmentType::Import,
            Self::ClickModel(_) => JudgmentType::ClickModel,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::events::testing::VecEventSource;

    fn metadata(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn import_metadata_extracts_and_removes_ratings() {
        let mut metadata = metadata(json!({
            "judgmentRatings": [{"query": "q", "ratings": []}],
            "name": "imported",
        }));

        let request = GenerationRequest::from_metadata(JudgmentType::Import, &mut metadata, None)
            .expect("valid import metadata");
        let GenerationRequest::Import(import) = request else {
            panic!("expected import request");
        };
        assert_eq!(import.judgment_ratings.len(), 1);
        assert!(!metadata.contains_key(JUDGMENT_RATINGS_KEY));
        assert!(metadata.contains_key("name"));
    }

    #[test]
    fn import_metadata_requires_a_list() {
        let mut metadata = metadata(json!({"judgmentRatings": "oops"}));
        let err = GenerationRequest::from_metadata(JudgmentType::Import, &mut metadata, None)
            .expect_err("should reject");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn click_model_metadata_defaults_to_coec() {
        let mut metadata = metadata(json!({"maxRank": 5}));
        let source: Arc<dyn EventSource> = Arc::new(VecEventSource::default());
        let request =
            GenerationRequest::from_metadata(JudgmentType::ClickModel, &mut metadata, Some(source))
                .expect("valid click model metadata");

        assert_eq!(request.judgment_type(), JudgmentType::ClickModel);
        let GenerationRequest::ClickModel(click) = request else {
            panic!("expected click model request");
        };
        assert_eq!(click.click_model, ClickModelKind::Coec);
        assert_eq!(click.parameters.max_rank(), 5);
    }

    #[test]
    fn click_model_metadata_rejects_unknown_models_and_missing_sources() {
        let mut unknown = metadata(json!({"maxRank": 5, "clickModel": "dbn"}));
        let source: Arc<dyn EventSource> = Arc::new(VecEventSource::default());
        let err =
            GenerationRequest::from_metadata(JudgmentType::ClickModel, &mut unknown, Some(source))
                .expect_err("should reject");
        assert_eq!(err.to_string(), "unsupported click model 'dbn'");

        let mut no_source = metadata(json!({"maxRank": 5}));
        let err = GenerationRequest::from_metadata(JudgmentType::ClickModel, &mut no_source, None)
            .expect_err("should reject");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn click_model_metadata_rejects_max_rank_below_one() {
        let mut metadata = metadata(json!({"maxRank": 0}));
        let source: Arc<dyn EventSource> = Arc::new(VecEventSource::default());
        let err =
            GenerationRequest::from_metadata(JudgmentType::ClickModel, &mut metadata, Some(source))
                .expect_err("should reject");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unknown_judgment_types_are_configuration_errors() {
        let err = "LLM_JUDGMENT".parse::<JudgmentType>().expect_err("should reject");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "unsupported judgment type 'LLM_JUDGMENT'");

        assert_eq!("import".parse::<JudgmentType>().ok(), Some(JudgmentType::Import));
        assert_eq!(
            "CLICK_MODEL_COEC".parse::<JudgmentType>().ok(),
            Some(JudgmentType::ClickModel)
        );
    }
}
