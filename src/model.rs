use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JudgmentError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum JudgmentType {
    #[serde(rename = "IMPORT_JUDGMENT")]
    Import,
    #[serde(rename = "UBI_JUDGMENT")]
    ClickModel,
}

impl JudgmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "IMPORT_JUDGMENT",
            Self::ClickModel => "UBI_JUDGMENT",
        }
    }
}

impl fmt::Display for JudgmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JudgmentType {
    type Err = JudgmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IMPORT_JUDGMENT" | "IMPORT" => Ok(Self::Import),
            "UBI_JUDGMENT" | "CLICK_MODEL_COEC" | "UBI" => Ok(Self::ClickModel),
            _ => Err(JudgmentError::Configuration(format!(
                "unsupported judgment type '{value}'"
            ))),
        }
    }
}

/// A single document rating within a judgment. The rating is kept as text so
/// imported values are emitted exactly as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRating {
    #[serde(rename = "docId")]
    pub doc_id: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub query: String,
    pub ratings: Vec<DocRating>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Impression,
    Click,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::Click => "click",
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "impression" => Ok(Self::Impression),
            "click" => Ok(Self::Click),
            other => Err(format!("unknown event type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralEvent {
    pub query_id: String,
    pub document_id: String,
    pub rank: u32,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationCounts {
    pub queries: usize,
    pub ratings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub judgment_type: JudgmentType,
    pub name: String,
    pub description: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub parameters: serde_json::Value,
    pub output_path: Option<String>,
    pub output_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub counts: GenerationCounts,
}
