use chrono::NaiveDate;
use serde_json::{Map, Value, json};

use crate::error::JudgmentError;
use crate::events::EventFilter;
use crate::validation::{parse_date, validate_date};

pub const DEFAULT_ROUNDING_DIGITS: u32 = 3;

pub const MAX_RANK_KEY: &str = "maxRank";
pub const ROUNDING_DIGITS_KEY: &str = "roundingDigits";
pub const START_DATE_KEY: &str = "startDate";
pub const END_DATE_KEY: &str = "endDate";

/// Parameters for a COEC judgment calculation. Constructed through the
/// validating constructors only, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickModelParameters {
    max_rank: u32,
    rounding_digits: u32,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl ClickModelParameters {
    pub fn new(max_rank: i64) -> Result<Self, JudgmentError> {
        if max_rank < 1 {
            return Err(JudgmentError::Configuration(format!(
                "maxRank must be at least 1, got {max_rank}"
            )));
        }
        let max_rank = u32::try_from(max_rank).map_err(|_| {
            JudgmentError::Configuration(format!("maxRank {max_rank} is too large"))
        })?;

        Ok(Self {
            max_rank,
            rounding_digits: DEFAULT_ROUNDING_DIGITS,
            start_date: None,
            end_date: None,
        })
    }

    pub fn with_rounding_digits(self, rounding_digits: i64) -> Result<Self, JudgmentError> {
        let rounding_digits = u32::try_from(rounding_digits).map_err(|_| {
            JudgmentError::Configuration(format!(
                "roundingDigits must be a non-negative integer, got {rounding_digits}"
            ))
        })?;

        Ok(Self {
            rounding_digits,
            ..self
        })
    }

    pub fn with_date_range(
        self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, JudgmentError> {
        let start_date = parse_bound(START_DATE_KEY, start_date)?;
        let end_date = parse_bound(END_DATE_KEY, end_date)?;

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(JudgmentError::InvalidInput(format!(
                    "startDate {start} must not be after endDate {end}"
                )));
            }
        }

        Ok(Self {
            start_date,
            end_date,
            ..self
        })
    }

    pub fn from_metadata(metadata: &Map<String, Value>) -> Result<Self, JudgmentError> {
        let max_rank = match metadata.get(MAX_RANK_KEY) {
            None | Some(Value::Null) => {
                return Err(JudgmentError::Configuration(format!(
                    "{MAX_RANK_KEY} is required for click model judgments"
                )));
            }
            Some(value) => integer_field(MAX_RANK_KEY, value)?,
        };

        let mut parameters = Self::new(max_rank)?;
        if let Some(value) = metadata.get(ROUNDING_DIGITS_KEY).filter(|value| !value.is_null()) {
            parameters = parameters.with_rounding_digits(integer_field(ROUNDING_DIGITS_KEY, value)?)?;
        }

        let start_date = text_field(START_DATE_KEY, metadata.get(START_DATE_KEY))?;
        let end_date = text_field(END_DATE_KEY, metadata.get(END_DATE_KEY))?;
        parameters.with_date_range(start_date, end_date)
    }

    pub fn max_rank(&self) -> u32 {
        self.max_rank
    }

    pub fn rounding_digits(&self) -> u32 {
        self.rounding_digits
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Inclusive on both ends; an absent bound is unbounded.
    pub fn admits_date(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }

    pub fn event_filter(&self) -> EventFilter {
        EventFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            max_rank: Some(self.max_rank),
        }
    }

    pub fn to_metadata(&self) -> Value {
        json!({
            MAX_RANK_KEY: self.max_rank,
            ROUNDING_DIGITS_KEY: self.rounding_digits,
            START_DATE_KEY: self.start_date.map(|date| date.to_string()),
            END_DATE_KEY: self.end_date.map(|date| date.to_string()),
        })
    }
}

fn parse_bound(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, JudgmentError> {
    let validation = validate_date(value);
    if !validation.valid {
        return Err(JudgmentError::InvalidInput(format!(
            "Invalid {field}: {}",
            validation.message()
        )));
    }

    Ok(value.filter(|text| !text.is_empty()).and_then(parse_date))
}

fn integer_field(field: &str, value: &Value) -> Result<i64, JudgmentError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        JudgmentError::InvalidInput(format!("{field} must be an integer, got {value}"))
    })
}

fn text_field<'a>(field: &str, value: Option<&'a Value>) -> Result<Option<&'a str>, JudgmentError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.as_str())),
        Some(other) => Err(JudgmentError::InvalidInput(format!(
            "{field} must be a date string, got {other}"
        ))),
    }
}
