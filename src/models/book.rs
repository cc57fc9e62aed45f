//! Book record model and related types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use utoipa::{IntoParams, ToSchema};

use super::payload::BookPayload;

/// Full book record as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque identifier generated on creation
    pub id: String,
    pub name: String,
    /// Publication year
    pub year: i64,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub publisher: String,
    pub page_count: u64,
    pub read_page: u64,
    /// True exactly when every page has been read
    pub finished: bool,
    /// Whether the book is currently being read
    pub reading: bool,
    #[serde(with = "iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub inserted_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Build a fresh record from validated fields.
    pub fn new(id: String, payload: BookPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            finished: payload.page_count == payload.read_page,
            name: payload.name,
            year: payload.year,
            author: payload.author,
            summary: payload.summary,
            publisher: payload.publisher,
            page_count: payload.page_count,
            read_page: payload.read_page,
            reading: payload.reading,
            inserted_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field with the payload values.
    ///
    /// `id` and `inserted_at` are kept; `finished` is recomputed and
    /// `updated_at` is set to `now`.
    pub fn apply(&mut self, payload: BookPayload, now: DateTime<Utc>) {
        *self = Self {
            id: std::mem::take(&mut self.id),
            inserted_at: self.inserted_at,
            ..Self::new(String::new(), payload, now)
        };
    }
}

/// List projection of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: String,
    pub name: String,
    pub publisher: String,
}

impl From<&Book> for BookShort {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            publisher: book.publisher.clone(),
        }
    }
}

/// Query filters for listing books.
///
/// A key given more than once keeps every value joined with `,`, so a
/// repeated `reading` or `finished` never equals `"1"`.
#[derive(Debug, Clone, Default, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive substring of the book name
    pub name: Option<String>,
    /// "1" selects books being read, any other value selects the rest
    pub reading: Option<String>,
    /// "1" selects finished books, any other value selects the rest
    pub finished: Option<String>,
}

impl BookQuery {
    pub fn name_filter(&self) -> Option<String> {
        non_empty(&self.name).map(str::to_lowercase)
    }

    pub fn reading_filter(&self) -> Option<bool> {
        non_empty(&self.reading).map(flag)
    }

    pub fn finished_filter(&self) -> Option<bool> {
        non_empty(&self.finished).map(flag)
    }

    /// Whether a record passes every present filter.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(name) = self.name_filter() {
            if !book.name.to_lowercase().contains(&name) {
                return false;
            }
        }
        if let Some(reading) = self.reading_filter() {
            if book.reading != reading {
                return false;
            }
        }
        if let Some(finished) = self.finished_filter() {
            if book.finished != finished {
                return false;
            }
        }
        true
    }
}

impl<'de> Deserialize<'de> for BookQuery {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct QueryVisitor;

        impl<'de> Visitor<'de> for QueryVisitor {
            type Value = BookQuery;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("book list query parameters")
            }

            fn visit_map<A>(self, mut map: A) -> Result<BookQuery, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut query = BookQuery::default();
                while let Some(key) = map.next_key::<String>()? {
                    let slot = match key.as_str() {
                        "name" => &mut query.name,
                        "reading" => &mut query.reading,
                        "finished" => &mut query.finished,
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                            continue;
                        }
                    };
                    let value: String = map.next_value()?;
                    *slot = Some(match slot.take() {
                        Some(existing) => format!("{existing},{value}"),
                        None => value,
                    });
                }
                Ok(query)
            }
        }

        deserializer.deserialize_map(QueryVisitor)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// Only the literal "1" is true; anything else (including "true") is false.
fn flag(value: &str) -> bool {
    value == "1"
}

/// ISO-8601 timestamps with millisecond precision, e.g. `2024-03-01T10:00:00.000Z`
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(name: &str, reading: bool, finished: bool) -> Book {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        Book {
            id: "b-1".to_string(),
            name: name.to_string(),
            year: 2020,
            author: "X".to_string(),
            summary: None,
            publisher: "P".to_string(),
            page_count: 100,
            read_page: if finished { 100 } else { 10 },
            finished,
            reading,
            inserted_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_query_flags() {
        let query = BookQuery {
            name: None,
            reading: Some("1".to_string()),
            finished: Some("true".to_string()),
        };
        assert_eq!(query.reading_filter(), Some(true));
        assert_eq!(query.finished_filter(), Some(false));
    }

    #[test]
    fn test_empty_filter_is_absent() {
        let query = BookQuery {
            name: Some(String::new()),
            reading: Some(String::new()),
            finished: None,
        };
        assert_eq!(query.name_filter(), None);
        assert_eq!(query.reading_filter(), None);
        assert!(query.matches(&sample("Anything", false, false)));
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let book = sample("Foobar", false, false);
        for needle in ["foo", "FOO", "oBa"] {
            let query = BookQuery {
                name: Some(needle.to_string()),
                ..Default::default()
            };
            assert!(query.matches(&book), "{needle} should match");
        }
        let query = BookQuery {
            name: Some("baz".to_string()),
            ..Default::default()
        };
        assert!(!query.matches(&book));
    }

    #[test]
    fn test_serialized_shape() {
        let book = sample("A", true, true);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["pageCount"], 100);
        assert_eq!(json["readPage"], 100);
        assert_eq!(json["insertedAt"], "2024-03-01T10:00:00.000Z");
        assert!(json.get("summary").is_none());

        let short = serde_json::to_value(BookShort::from(&book)).unwrap();
        assert_eq!(short.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_repeated_keys_are_joined() {
        let query: BookQuery = serde_json::from_str(
            r#"{"reading": "1", "reading": "0", "name": "foo", "page": "2"}"#,
        )
        .unwrap();
        assert_eq!(query.reading.as_deref(), Some("1,0"));
        assert_eq!(query.reading_filter(), Some(false));
        assert_eq!(query.name.as_deref(), Some("foo"));
        assert_eq!(query.finished, None);
    }
}
