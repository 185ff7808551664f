//! Export pipeline: locale code → complete key→value mapping for that
//! language, served from the cache and recomputed from the store on miss.

use crate::cache::{ExportCache, Snapshot};
use crate::config::Config;
use crate::error::ApiError;
use crate::store::Store;
use std::collections::BTreeMap;
use tracing::info;

/// Resolve `locale` and return the language's full translation snapshot.
///
/// Duplicate keys within a language are permitted by the data model; the
/// mapping keeps the value of the highest-id row (rows arrive in ascending id
/// order and later inserts overwrite).
pub async fn export_locale(
    store: &Store,
    cache: &ExportCache,
    config: &Config,
    locale: &str,
) -> Result<Snapshot, ApiError> {
    let language = store
        .find_language_by_code(locale)
        .await?
        .ok_or_else(|| ApiError::NotFound("Language not found".to_string()))?;
    let language_id = language.id;

    cache
        .get_or_fill(language_id, config.cache_ttl, || async move {
            info!(language_id, locale, "export cache miss, recomputing snapshot");
            let pairs = tokio::time::timeout(
                config.store_timeout,
                store.export_pairs(language_id),
            )
            .await
            .map_err(|_| ApiError::StoreTimeout)??;

            let mut mapping = BTreeMap::new();
            for (key, value) in pairs {
                mapping.insert(key, value);
            }
            Ok(mapping)
        })
        .await
}
