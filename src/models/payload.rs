//! Book payload validation.
//!
//! Incoming create/update bodies arrive as untyped JSON. Presence and type
//! are checked against the raw value first (numeric text and `"true"`/`"false"`
//! are converted), then the value rules are run through `validator` on the
//! extracted draft. Messages follow the wording
//! clients of the book API already rely on.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use utoipa::ToSchema;
use validator::Validate;

const READ_PAGE_MESSAGE: &str = "readPage tidak boleh lebih besar dari pageCount";

/// Largest integer a JSON client can represent exactly (2^53 - 1)
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Recognized payload keys, in reporting order: (JSON key, draft field)
const FIELDS: [(&str, &str); 8] = [
    ("name", "name"),
    ("year", "year"),
    ("author", "author"),
    ("summary", "summary"),
    ("publisher", "publisher"),
    ("pageCount", "page_count"),
    ("readPage", "read_page"),
    ("reading", "reading"),
];

/// How many violations a validation run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReporting {
    /// Collect every violation
    All,
    /// Stop at the first violation in field order
    First,
}

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON key the violation refers to (`"value"` for the whole body)
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn type_mismatch(field: &'static str, expected: &str) -> Self {
        Self::new(field, format!("\"{}\" must be {}", field, expected))
    }

    fn position(&self) -> usize {
        FIELDS
            .iter()
            .position(|(key, _)| *key == self.field)
            .unwrap_or(0)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Normalized book fields, produced only by [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub name: String,
    pub year: i64,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub publisher: String,
    pub page_count: u64,
    pub read_page: u64,
    pub reading: bool,
}

/// Fields as found in the raw body; `None` when absent or mistyped
#[derive(Debug, Default, Validate)]
struct BookDraft {
    #[validate(
        required(message = "Mohon isi nama buku"),
        length(min = 1, message = "Mohon isi nama buku")
    )]
    name: Option<String>,
    #[validate(required(message = "\"year\" is required"))]
    year: Option<i64>,
    #[validate(
        required(message = "\"author\" is required"),
        length(min = 1, message = "\"author\" is not allowed to be empty")
    )]
    author: Option<String>,
    #[validate(length(min = 1, message = "\"summary\" is not allowed to be empty"))]
    summary: Option<String>,
    #[validate(
        required(message = "\"publisher\" is required"),
        length(min = 1, message = "\"publisher\" is not allowed to be empty")
    )]
    publisher: Option<String>,
    #[validate(
        required(message = "\"pageCount\" is required"),
        range(min = 0, message = "\"pageCount\" must be greater than or equal to 0")
    )]
    page_count: Option<i64>,
    #[validate(
        required(message = "\"readPage\" is required"),
        range(min = 0, message = "\"readPage\" must be greater than or equal to 0")
    )]
    read_page: Option<i64>,
    #[validate(required(message = "\"reading\" is required"))]
    reading: Option<bool>,
}

impl BookDraft {
    fn extract(object: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Self {
        Self {
            name: string_field(object, "name", errors),
            year: integer_field(object, "year", errors),
            author: string_field(object, "author", errors),
            summary: string_field(object, "summary", errors),
            publisher: string_field(object, "publisher", errors),
            page_count: integer_field(object, "pageCount", errors),
            read_page: integer_field(object, "readPage", errors),
            reading: bool_field(object, "reading", errors),
        }
    }

    fn read_page_within_page_count(&self) -> bool {
        match (self.page_count, self.read_page) {
            (Some(pages), Some(read)) if pages >= 0 && read >= 0 => read <= pages,
            _ => true,
        }
    }

    fn into_payload(self) -> Option<BookPayload> {
        Some(BookPayload {
            name: self.name?,
            year: self.year?,
            author: self.author?,
            summary: self.summary,
            publisher: self.publisher?,
            page_count: u64::try_from(self.page_count?).ok()?,
            read_page: u64::try_from(self.read_page?).ok()?,
            reading: self.reading?,
        })
    }
}

/// Validate an untyped book body.
///
/// Unknown keys are ignored and dropped. An empty `name` is reported exactly
/// like a missing one.
pub fn validate(input: &Value, reporting: ErrorReporting) -> Result<BookPayload, Vec<FieldError>> {
    let Some(object) = input.as_object() else {
        return Err(vec![FieldError::new(
            "value",
            "\"value\" must be of type object",
        )]);
    };

    let mut errors = Vec::new();
    let draft = BookDraft::extract(object, &mut errors);
    let mistyped: HashSet<&str> = errors.iter().map(|e| e.field).collect();

    if let Err(rule_errors) = draft.validate() {
        let by_field = rule_errors.field_errors();
        for (key, field) in FIELDS {
            if mistyped.contains(key) {
                continue;
            }
            if let Some(violations) = by_field.get(field) {
                errors.extend(violations.iter().map(|violation| {
                    let message = violation
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| violation.code.to_string());
                    FieldError::new(key, message)
                }));
            }
        }
    }

    if !draft.read_page_within_page_count() {
        errors.push(FieldError::new("readPage", READ_PAGE_MESSAGE));
    }

    if !errors.is_empty() {
        errors.sort_by_key(FieldError::position);
        errors.dedup();
        if reporting == ErrorReporting::First {
            errors.truncate(1);
        }
        return Err(errors);
    }

    draft
        .into_payload()
        .ok_or_else(|| vec![FieldError::new("value", "\"value\" is invalid")])
}

/// Join violation messages the way failure responses present them.
pub fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn string_field(
    object: &Map<String, Value>,
    key: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        _ => {
            errors.push(FieldError::type_mismatch(key, "a string"));
            None
        }
    }
}

fn integer_field(
    object: &Map<String, Value>,
    key: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let result = match object.get(key)? {
        Value::Number(n) => integer_value(key, n),
        Value::String(s) => numeric_string(s)
            .ok_or_else(|| FieldError::type_mismatch(key, "a number"))
            .and_then(|n| integer_value(key, &n)),
        _ => Err(FieldError::type_mismatch(key, "a number")),
    };
    result.map_err(|e| errors.push(e)).ok()
}

/// Numeric text such as `"2020"`, `" 100 "` or `"1e3"`; `None` if it is not a finite number.
fn numeric_string(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    // `f64::from_str` also takes "inf" and "NaN"; only plain decimal notation counts.
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

fn integer_value(key: &'static str, n: &Number) -> Result<i64, FieldError> {
    if let Some(i) = n.as_i64() {
        if i.unsigned_abs() > MAX_SAFE_INTEGER as u64 {
            return Err(FieldError::type_mismatch(key, "a safe number"));
        }
        return Ok(i);
    }
    match n.as_f64() {
        Some(f) if f.abs() > MAX_SAFE_INTEGER as f64 => {
            Err(FieldError::type_mismatch(key, "a safe number"))
        }
        Some(f) if f.fract() != 0.0 => Err(FieldError::type_mismatch(key, "an integer")),
        Some(f) => Ok(f as i64),
        None => Err(FieldError::type_mismatch(key, "a number")),
    }
}

fn bool_field(
    object: &Map<String, Value>,
    key: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<bool> {
    let value = match object.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    };
    if value.is_none() {
        errors.push(FieldError::type_mismatch(key, "a boolean"));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME_MESSAGE: &str = "Mohon isi nama buku";

    fn valid_body() -> Value {
        json!({
            "name": "A",
            "year": 2020,
            "author": "X",
            "summary": "S",
            "publisher": "P",
            "pageCount": 100,
            "readPage": 25,
            "reading": false
        })
    }

    fn messages(result: Result<BookPayload, Vec<FieldError>>) -> Vec<String> {
        result
            .unwrap_err()
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_valid_body() {
        let payload = validate(&valid_body(), ErrorReporting::All).unwrap();
        assert_eq!(payload.name, "A");
        assert_eq!(payload.year, 2020);
        assert_eq!(payload.summary.as_deref(), Some("S"));
        assert_eq!(payload.page_count, 100);
        assert_eq!(payload.read_page, 25);
        assert!(!payload.reading);
    }

    #[test]
    fn test_summary_is_optional_and_extra_keys_ignored() {
        let mut body = valid_body();
        let object = body.as_object_mut().unwrap();
        object.remove("summary");
        object.insert("finished".to_string(), json!(true));
        object.insert("color".to_string(), json!("red"));

        let payload = validate(&body, ErrorReporting::All).unwrap();
        assert_eq!(payload.summary, None);
        let normalized = serde_json::to_value(&payload).unwrap();
        assert!(normalized.get("color").is_none());
        assert!(normalized.get("finished").is_none());
    }

    #[test]
    fn test_missing_and_empty_name_share_message() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("name");
        assert_eq!(messages(validate(&body, ErrorReporting::All)), vec![NAME_MESSAGE]);

        body["name"] = json!("");
        assert_eq!(messages(validate(&body, ErrorReporting::All)), vec![NAME_MESSAGE]);
    }

    #[test]
    fn test_read_page_above_page_count() {
        let mut body = valid_body();
        body["pageCount"] = json!(50);
        body["readPage"] = json!(60);
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec![READ_PAGE_MESSAGE]
        );
    }

    #[test]
    fn test_read_page_equal_page_count_is_valid() {
        let mut body = valid_body();
        body["readPage"] = json!(100);
        assert!(validate(&body, ErrorReporting::All).is_ok());
    }

    #[test]
    fn test_collects_all_violations_in_field_order() {
        let body = json!({
            "year": "twenty",
            "author": "X",
            "publisher": "",
            "pageCount": 10,
            "readPage": 20
        });
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec![
                NAME_MESSAGE,
                "\"year\" must be a number",
                "\"publisher\" is not allowed to be empty",
                READ_PAGE_MESSAGE,
                "\"reading\" is required",
            ]
        );
    }

    #[test]
    fn test_first_only_reporting() {
        let body = json!({ "year": true, "reading": "yes" });
        assert_eq!(
            messages(validate(&body, ErrorReporting::First)),
            vec![NAME_MESSAGE]
        );
    }

    #[test]
    fn test_type_errors() {
        let mut body = valid_body();
        body["reading"] = json!("yes");
        body["pageCount"] = json!(10.5);
        body["author"] = Value::Null;
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec![
                "\"author\" must be a string",
                "\"pageCount\" must be an integer",
                "\"reading\" must be a boolean",
            ]
        );
    }

    #[test]
    fn test_negative_page_count() {
        let mut body = valid_body();
        body["pageCount"] = json!(-1);
        body["readPage"] = json!(0);
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec!["\"pageCount\" must be greater than or equal to 0"]
        );
    }

    #[test]
    fn test_non_object_body() {
        for body in [Value::Null, json!([1, 2]), json!("book")] {
            assert_eq!(
                messages(validate(&body, ErrorReporting::All)),
                vec!["\"value\" must be of type object"]
            );
        }
    }

    #[test]
    fn test_join_messages() {
        let errors = vec![
            FieldError::new("name", NAME_MESSAGE),
            FieldError::new("readPage", READ_PAGE_MESSAGE),
        ];
        assert_eq!(
            join_messages(&errors),
            "Mohon isi nama buku,readPage tidak boleh lebih besar dari pageCount"
        );
    }

    #[test]
    fn test_converts_numeric_and_boolean_text() {
        let mut body = valid_body();
        body["year"] = json!("2020");
        body["pageCount"] = json!(" 100 ");
        body["readPage"] = json!("1e2");
        body["reading"] = json!("TRUE");

        let payload = validate(&body, ErrorReporting::All).unwrap();
        assert_eq!(payload.year, 2020);
        assert_eq!(payload.page_count, 100);
        assert_eq!(payload.read_page, 100);
        assert!(payload.reading);

        body["reading"] = json!("false");
        assert!(!validate(&body, ErrorReporting::All).unwrap().reading);
    }

    #[test]
    fn test_rejects_unconvertible_text() {
        let mut body = valid_body();
        body["year"] = json!("");
        body["pageCount"] = json!("inf");
        body["readPage"] = json!("12abc");
        body["reading"] = json!("1");
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec![
                "\"year\" must be a number",
                "\"pageCount\" must be a number",
                "\"readPage\" must be a number",
                "\"reading\" must be a boolean",
            ]
        );
    }

    #[test]
    fn test_converted_text_keeps_integer_and_range_rules() {
        let mut body = valid_body();
        body["pageCount"] = json!("-5");
        body["readPage"] = json!("2.5");
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec![
                "\"pageCount\" must be greater than or equal to 0",
                "\"readPage\" must be an integer",
            ]
        );

        body["pageCount"] = json!("50");
        body["readPage"] = json!("60");
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec![READ_PAGE_MESSAGE]
        );
    }

    #[test]
    fn test_unsafe_integers() {
        let mut body = valid_body();
        body["year"] = json!(9_007_199_254_740_992_i64);
        body["pageCount"] = json!(u64::MAX);
        body["readPage"] = json!(9_007_199_254_740_991_i64);
        assert_eq!(
            messages(validate(&body, ErrorReporting::All)),
            vec![
                "\"year\" must be a safe number",
                "\"pageCount\" must be a safe number",
            ]
        );
    }
}
