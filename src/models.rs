//! Entities stored in the record store, request payloads, and the response
//! envelopes shared by the catalog endpoints.

use crate::config::PAGE_SIZE;
use crate::error::{ApiError, FieldErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Language {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Translation {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub language_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// List-endpoint shape for translations: the row plus its attached tags.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationWithTags {
    #[serde(flatten)]
    pub translation: Translation,
    pub tags: Vec<Tag>,
}

// ==================== Request payloads ====================

/// Create/update body for a language. Fields are optional at the parse stage
/// so that missing ones surface as per-field validation messages instead of a
/// deserialization failure.
#[derive(Debug, Deserialize)]
pub struct LanguagePayload {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl LanguagePayload {
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut missing = Vec::new();
        if self.code.as_deref().map_or(true, str::is_empty) {
            missing.push("code");
        }
        if self.name.as_deref().map_or(true, str::is_empty) {
            missing.push("name");
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(&missing));
        }
        Ok((self.code.unwrap(), self.name.unwrap()))
    }
}

/// Create/update body for a translation.
#[derive(Debug, Deserialize)]
pub struct TranslationPayload {
    pub key: Option<String>,
    pub value: Option<String>,
    pub language_id: Option<i64>,
}

impl TranslationPayload {
    pub fn validate(self) -> Result<(String, String, i64), ApiError> {
        let mut missing = Vec::new();
        if self.key.as_deref().map_or(true, str::is_empty) {
            missing.push("key");
        }
        if self.value.as_deref().map_or(true, str::is_empty) {
            missing.push("value");
        }
        if self.language_id.is_none() {
            missing.push("language_id");
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(&missing));
        }
        Ok((
            self.key.unwrap(),
            self.value.unwrap(),
            self.language_id.unwrap(),
        ))
    }
}

// ==================== Pagination ====================

/// One page of results plus the metadata needed to navigate adjacent pages.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    /// 1-based index of the first item on this page, null when the page is empty
    pub from: Option<u64>,
    /// 1-based index of the last item on this page, null when the page is empty
    pub to: Option<u64>,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: u32, total: u64) -> Self {
        let last_page = (total.div_ceil(u64::from(PAGE_SIZE)) as u32).max(1);
        let from = if data.is_empty() {
            None
        } else {
            Some(u64::from(page - 1) * u64::from(PAGE_SIZE) + 1)
        };
        let to = from.map(|f| f + data.len() as u64 - 1);

        Self {
            current_page: page,
            per_page: PAGE_SIZE,
            total,
            last_page,
            from,
            to,
            next_page: (page < last_page).then(|| page + 1),
            prev_page: (page > 1).then(|| page - 1),
            data,
        }
    }
}

/// Clamp a raw `page` query parameter to a usable 1-indexed page number.
pub fn normalize_page(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

// ==================== Response envelope ====================

/// `{success, data, message}` envelope used by every non-export endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.to_string(),
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope with no payload (deletes).
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: message.to_string(),
        }
    }
}

/// Convenience for building a uniqueness-violation error on a field.
pub fn taken(field: &str) -> ApiError {
    let mut errors = FieldErrors::new();
    errors.insert(
        field.to_string(),
        vec![format!("The {} has already been taken.", field)],
    );
    ApiError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math_full_pages() {
        let page: Paginated<i32> = Paginated::new((1..=10).collect(), 1, 25);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.per_page, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.from, Some(1));
        assert_eq!(page.to, Some(10));
        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.prev_page, None);
    }

    #[test]
    fn test_pagination_math_last_partial_page() {
        let page: Paginated<i32> = Paginated::new((21..=25).collect(), 3, 25);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.from, Some(21));
        assert_eq!(page.to, Some(25));
        assert_eq!(page.next_page, None);
        assert_eq!(page.prev_page, Some(2));
    }

    #[test]
    fn test_pagination_empty_result() {
        let page: Paginated<i32> = Paginated::new(vec![], 1, 0);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.from, None);
        assert_eq!(page.to, None);
        assert_eq!(page.next_page, None);
        assert_eq!(page.prev_page, None);
    }

    #[test]
    fn test_pagination_past_the_end_page() {
        let page: Paginated<i32> = Paginated::new(vec![], 5, 25);
        assert_eq!(page.current_page, 5);
        assert!(page.data.is_empty());
        assert_eq!(page.from, None);
        assert_eq!(page.prev_page, Some(4));
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_normalize_page() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(0)), 1);
        assert_eq!(normalize_page(Some(7)), 7);
    }

    #[test]
    fn test_language_payload_missing_fields() {
        let payload = LanguagePayload {
            code: Some("en".to_string()),
            name: None,
        };
        match payload.validate() {
            Err(ApiError::Validation(errors)) => {
                assert!(errors.contains_key("name"));
                assert!(!errors.contains_key("code"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_translation_payload_empty_strings_are_missing() {
        let payload = TranslationPayload {
            key: Some("".to_string()),
            value: None,
            language_id: Some(1),
        };
        match payload.validate() {
            Err(ApiError::Validation(errors)) => {
                assert!(errors.contains_key("key"));
                assert!(errors.contains_key("value"));
                assert!(!errors.contains_key("language_id"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_translation_payload_valid() {
        let payload = TranslationPayload {
            key: Some("greeting".to_string()),
            value: Some("Hello".to_string()),
            language_id: Some(3),
        };
        let (key, value, language_id) = payload.validate().expect("valid payload");
        assert_eq!(key, "greeting");
        assert_eq!(value, "Hello");
        assert_eq!(language_id, 3);
    }

    #[test]
    fn test_envelope_omits_empty_data() {
        let body = serde_json::to_value(ApiResponse::message("Language deleted successfully"))
            .expect("serialize");
        assert_eq!(body["success"], true);
        assert!(body.get("data").is_none());
    }
}
