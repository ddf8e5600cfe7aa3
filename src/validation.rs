use chrono::NaiveDate;

pub const DEFAULT_MAX_TEXT_LENGTH: usize = 2000;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 250;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const FORBIDDEN_CHARS: [char; 4] = ['"', '\\', '<', '>'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error_message: Option<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            valid: true,
            error_message: None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: Some(message.into()),
        }
    }

    pub fn message(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }
}

/// `max_length` defaults to [`DEFAULT_MAX_TEXT_LENGTH`].
pub fn validate_text(text: Option<&str>, max_length: Option<usize>) -> ValidationResult {
    let max_length = max_length.unwrap_or(DEFAULT_MAX_TEXT_LENGTH);
    let Some(text) = text else {
        return ValidationResult::invalid("Text cannot be null");
    };

    if text.is_empty() {
        return ValidationResult::invalid("Text cannot be empty");
    }

    if text.chars().count() > max_length {
        return ValidationResult::invalid(format!(
            "Text exceeds maximum length of {max_length} characters"
        ));
    }

    if text.contains(FORBIDDEN_CHARS) {
        return ValidationResult::invalid(
            "Text contains invalid characters (quotes, backslashes, or HTML tags are not allowed)",
        );
    }

    ValidationResult::ok()
}

pub fn validate_name(name: Option<&str>) -> ValidationResult {
    validate_text(name, Some(MAX_NAME_LENGTH))
}

pub fn validate_description(description: Option<&str>) -> ValidationResult {
    validate_text(description, Some(MAX_DESCRIPTION_LENGTH))
}

/// Absent and empty dates are valid; date filters are optional.
pub fn validate_date(date: Option<&str>) -> ValidationResult {
    match date {
        None | Some("") => ValidationResult::ok(),
        Some(value) => match parse_date(value) {
            Some(_) => ValidationResult::ok(),
            None => ValidationResult::invalid(format!(
                "failed to parse date field [{value}] with format [yyyy-MM-dd]"
            )),
        },
    }
}

/// Strict `yyyy-MM-dd`: four digit year, two digit month and day.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }

    let digits_only = bytes
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != 4 && *index != 7)
        .all(|(_, byte)| byte.is_ascii_digit());
    if !digits_only {
        return None;
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}
