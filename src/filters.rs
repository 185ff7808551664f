//! Filter engine: explicit, testable composition of optional query
//! parameters into store predicates.
//!
//! Each filter struct is parsed from raw query-string values and appended to
//! a `sqlx::QueryBuilder` as `AND` conditions with bound arguments. Absent
//! filters impose no constraint. Malformed values (a non-numeric tag id) are
//! dropped rather than rejected; a supplied filter left with nothing valid
//! matches no rows, keeping the endpoints resilient to bad client input.

use sqlx::{QueryBuilder, Sqlite};

/// Split a comma-separated parameter into trimmed, non-empty tokens.
///
/// A `None`, empty, or whitespace-only raw value means the filter was not
/// supplied at all.
fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Escape `%`, `_` and the escape character itself so a user-supplied needle
/// matches literally inside a LIKE pattern.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

// ==================== Translation filters ====================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationFilter {
    /// Match-any over the tag join relation. `Some(vec![])` records that the
    /// parameter was supplied but contained no valid id: matches nothing.
    pub tag_ids: Option<Vec<i64>>,
    /// Exact-match set membership on the translation key.
    pub keys: Option<Vec<String>>,
    /// Case-insensitive substring on the translation value.
    pub value: Option<String>,
}

impl TranslationFilter {
    pub fn from_params(
        tag_ids: Option<&str>,
        keys: Option<&str>,
        value: Option<&str>,
    ) -> Self {
        Self {
            tag_ids: split_list(tag_ids)
                .map(|tokens| tokens.iter().filter_map(|t| t.parse().ok()).collect()),
            keys: split_list(keys),
            value: non_empty(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tag_ids.is_none() && self.keys.is_none() && self.value.is_none()
    }

    /// Append this filter's conditions to a query that already has a WHERE
    /// clause open (the store starts from `WHERE 1 = 1`).
    pub fn apply(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(tag_ids) = &self.tag_ids {
            if tag_ids.is_empty() {
                qb.push(" AND 0 = 1");
            } else {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM tag_translation tt \
                     WHERE tt.translation_id = translations.id AND tt.tag_id IN (",
                );
                let mut separated = qb.separated(", ");
                for id in tag_ids {
                    separated.push_bind(*id);
                }
                separated.push_unseparated("))");
            }
        }

        if let Some(keys) = &self.keys {
            if keys.is_empty() {
                qb.push(" AND 0 = 1");
            } else {
                qb.push(" AND translations.key IN (");
                let mut separated = qb.separated(", ");
                for key in keys {
                    separated.push_bind(key.clone());
                }
                separated.push_unseparated(")");
            }
        }

        if let Some(value) = &self.value {
            qb.push(" AND LOWER(translations.value) LIKE ")
                .push_bind(format!("%{}%", escape_like(&value.to_lowercase())))
                .push(" ESCAPE '\\'");
        }
    }
}

// ==================== Language filters ====================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageFilter {
    /// Exact match on the locale code.
    pub code: Option<String>,
    /// Case-insensitive substring on the display name.
    pub name: Option<String>,
}

impl LanguageFilter {
    pub fn from_params(code: Option<&str>, name: Option<&str>) -> Self {
        Self {
            code: non_empty(code),
            name: non_empty(name),
        }
    }

    pub fn apply(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(code) = &self.code {
            qb.push(" AND code = ").push_bind(code.clone());
        }
        if let Some(name) = &self.name {
            qb.push(" AND LOWER(name) LIKE ")
                .push_bind(format!("%{}%", escape_like(&name.to_lowercase())))
                .push(" ESCAPE '\\'");
        }
    }
}
