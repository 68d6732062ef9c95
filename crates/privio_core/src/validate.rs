use crate::error::AppError;
use crate::task_utils::local_offset;
use std::collections::BTreeMap;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_DUE_DATE: &str = "due_date";

const TITLE_MESSAGE: &str = "Title is required and must be less than 200 characters";
const DESCRIPTION_MESSAGE: &str = "Description must be less than 1000 characters";
const DUE_DATE_MESSAGE: &str = "Due date must be a valid date";

pub fn validate_title(title: &str) -> bool {
    let trimmed = title.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= TITLE_MAX_CHARS
}

pub fn validate_description(description: &str) -> bool {
    description.chars().count() <= DESCRIPTION_MAX_CHARS
}

/// Absent or blank due dates are valid.
pub fn validate_due_date(due_date: Option<&str>) -> bool {
    match due_date {
        None => true,
        Some(value) if value.trim().is_empty() => true,
        Some(value) => parse_due_date(value).is_ok(),
    }
}

/// Parses user-entered due dates. Offset-less inputs are read in local time.
pub fn parse_due_date(raw: &str) -> Result<OffsetDateTime, AppError> {
    parse_due_date_with_offset(raw, local_offset())
}

pub fn parse_due_date_with_offset(
    raw: &str,
    offset: UtcOffset,
) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("due date is required"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    let datetime_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in datetime_formats {
        if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, format) {
            return Ok(parsed.assume_offset(offset));
        }
    }

    if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset));
    }

    Err(AppError::invalid_input(format!(
        "due date '{trimmed}' must be RFC3339, YYYY-MM-DD HH:MM[:SS] or YYYY-MM-DD"
    )))
}

/// Field name to message for every failing field. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, &'static str>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.errors.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.errors.iter().map(|(field, message)| (*field, *message))
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid_input(self.to_string()))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, message)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// Checks only the fields that are present, for partial edits.
pub fn validate_fields(
    title: Option<&str>,
    description: Option<&str>,
    due_date: Option<&str>,
) -> ValidationErrors {
    let mut errors = BTreeMap::new();
    if title.is_some_and(|value| !validate_title(value)) {
        errors.insert(FIELD_TITLE, TITLE_MESSAGE);
    }
    if description.is_some_and(|value| !validate_description(value)) {
        errors.insert(FIELD_DESCRIPTION, DESCRIPTION_MESSAGE);
    }
    if !validate_due_date(due_date) {
        errors.insert(FIELD_DUE_DATE, DUE_DATE_MESSAGE);
    }
    ValidationErrors { errors }
}

pub fn validate_draft(title: &str, description: &str, due_date: Option<&str>) -> ValidationErrors {
    validate_fields(Some(title), Some(description), due_date)
}

#[cfg(test)]
mod tests {
    use super::{
        FIELD_DESCRIPTION, FIELD_DUE_DATE, FIELD_TITLE, parse_due_date_with_offset,
        validate_description, validate_draft, validate_due_date, validate_fields,
        validate_title,
    };
    use time::UtcOffset;
    use time::macros::{datetime, offset};

    #[test]
    fn whitespace_title_is_invalid() {
        assert!(!validate_title("   "));
        assert!(!validate_title(""));
    }

    #[test]
    fn title_length_boundary() {
        assert!(validate_title(&"a".repeat(200)));
        assert!(!validate_title(&"a".repeat(201)));
        assert!(validate_title(&format!("  {}  ", "a".repeat(200))));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        assert!(validate_title(&"é".repeat(200)));
    }

    #[test]
    fn description_length_boundary() {
        assert!(validate_description(""));
        assert!(validate_description(&"d".repeat(1000)));
        assert!(!validate_description(&"d".repeat(1001)));
    }

    #[test]
    fn due_date_accepts_absent_blank_and_parseable_values() {
        assert!(validate_due_date(None));
        assert!(validate_due_date(Some("  ")));
        assert!(validate_due_date(Some("2026-10-18T09:00:00Z")));
        assert!(validate_due_date(Some("2026-10-18")));
        assert!(!validate_due_date(Some("next tuesday")));
        assert!(!validate_due_date(Some("2026-13-40")));
    }

    #[test]
    fn parse_due_date_reads_supported_formats() {
        let offset = offset!(+2);
        assert_eq!(
            parse_due_date_with_offset("2026-10-18T09:00:00Z", offset).unwrap(),
            datetime!(2026-10-18 09:00 UTC)
        );
        assert_eq!(
            parse_due_date_with_offset("2026-10-18T09:15", offset).unwrap(),
            datetime!(2026-10-18 09:15 +2)
        );
        assert_eq!(
            parse_due_date_with_offset("2026-10-18 09:15:30", offset).unwrap(),
            datetime!(2026-10-18 09:15:30 +2)
        );
        assert_eq!(
            parse_due_date_with_offset(" 2026-10-18 ", UtcOffset::UTC).unwrap(),
            datetime!(2026-10-18 00:00 UTC)
        );
    }

    #[test]
    fn parse_due_date_rejects_garbage() {
        let err = parse_due_date_with_offset("soon", UtcOffset::UTC).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn validate_draft_reports_each_failing_field() {
        let errors = validate_draft("  ", &"x".repeat(1001), Some("not a date"));

        assert_eq!(errors.len(), 3);
        assert!(errors.get(FIELD_TITLE).is_some());
        assert!(errors.get(FIELD_DESCRIPTION).is_some());
        assert!(errors.get(FIELD_DUE_DATE).is_some());
        assert!(errors.to_string().starts_with("description: "));
    }

    #[test]
    fn validate_draft_accepts_valid_input() {
        let errors = validate_draft("Buy groceries", "", None);
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn validate_fields_skips_absent_fields() {
        let errors = validate_fields(None, None, None);
        assert!(errors.is_empty());

        let err = validate_fields(Some(""), None, None)
            .into_result()
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(err.message().contains("Title is required"));
    }
}
