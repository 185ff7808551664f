//! Catalog API handlers: CRUD over languages and translations, plus the
//! export endpoint and the bearer-token middleware.
//!
//! Handlers stay thin: parse/validate input, call the store, invalidate the
//! export cache on translation writes, wrap the result in the response
//! envelope. Every write invalidates after the durable write and before the
//! response is produced, so an acknowledged write is always visible to the
//! next export.

use crate::cache::ExportCache;
use crate::config::Config;
use crate::error::ApiError;
use crate::export::export_locale;
use crate::filters::{LanguageFilter, TranslationFilter};
use crate::models::{
    normalize_page, ApiResponse, Language, LanguagePayload, Paginated, Translation,
    TranslationPayload, TranslationWithTags,
};
use crate::security::{bearer_token, constant_time_compare};
use crate::store::Store;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Process-wide state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub cache: Arc<ExportCache>,
    pub config: Arc<Config>,
}

// ==================== Auth middleware ====================

/// Reject requests without the configured bearer token. When no token is
/// configured, authentication is disabled.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.config.api_token {
        let provided = bearer_token(request.headers()).ok_or(ApiError::Unauthorized)?;
        if !constant_time_compare(provided, expected) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

// ==================== Health ====================

pub async fn health(State(state): State<AppState>) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.store.ping().await?;
    Ok(Json(ApiResponse::message("ok")))
}

// ==================== Languages ====================

#[derive(Debug, Deserialize)]
pub struct LanguageListParams {
    page: Option<u32>,
    code: Option<String>,
    name: Option<String>,
}

pub async fn list_languages(
    State(state): State<AppState>,
    Query(params): Query<LanguageListParams>,
) -> Result<Json<Paginated<Language>>, ApiError> {
    let filter = LanguageFilter::from_params(params.code.as_deref(), params.name.as_deref());
    let page = state
        .store
        .list_languages(&filter, normalize_page(params.page))
        .await?;
    Ok(Json(page))
}

pub async fn get_language(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Language>>, ApiError> {
    let language = state.store.get_language(id).await?;
    Ok(Json(ApiResponse::success(
        language,
        "Language successfully fetched",
    )))
}

pub async fn create_language(
    State(state): State<AppState>,
    Json(payload): Json<LanguagePayload>,
) -> Result<(StatusCode, Json<ApiResponse<Language>>), ApiError> {
    let (code, name) = payload.validate()?;
    let language = state.store.create_language(&code, &name).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(language, "Language created successfully")),
    ))
}

pub async fn update_language(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<LanguagePayload>,
) -> Result<Json<ApiResponse<Language>>, ApiError> {
    let (code, name) = payload.validate()?;
    let language = state.store.update_language(id, &code, &name).await?;
    Ok(Json(ApiResponse::success(
        language,
        "Language updated successfully",
    )))
}

pub async fn delete_language(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_language(id).await?;
    // The language's translations went with it; drop any cached snapshot too
    state.cache.invalidate(id).await;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Translations ====================

#[derive(Debug, Deserialize)]
pub struct TranslationListParams {
    page: Option<u32>,
    tag_ids: Option<String>,
    keys: Option<String>,
    value: Option<String>,
}

pub async fn list_translations(
    State(state): State<AppState>,
    Query(params): Query<TranslationListParams>,
) -> Result<Json<Paginated<TranslationWithTags>>, ApiError> {
    let filter = TranslationFilter::from_params(
        params.tag_ids.as_deref(),
        params.keys.as_deref(),
        params.value.as_deref(),
    );
    let page = state
        .store
        .list_translations(&filter, normalize_page(params.page))
        .await?;
    Ok(Json(page))
}

pub async fn get_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Translation>>, ApiError> {
    let translation = state.store.get_translation(id).await?;
    Ok(Json(ApiResponse::success(
        translation,
        "Translation fetched successfully",
    )))
}

pub async fn create_translation(
    State(state): State<AppState>,
    Json(payload): Json<TranslationPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Translation>>), ApiError> {
    let (key, value, language_id) = payload.validate()?;
    let translation = state
        .store
        .create_translation(&key, &value, language_id)
        .await?;
    state.cache.invalidate(translation.language_id).await;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            translation,
            "Translation created successfully",
        )),
    ))
}

pub async fn update_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TranslationPayload>,
) -> Result<Json<ApiResponse<Translation>>, ApiError> {
    let (key, value, language_id) = payload.validate()?;
    let (previous_language_id, translation) = state
        .store
        .update_translation(id, &key, &value, language_id)
        .await?;

    state.cache.invalidate(previous_language_id).await;
    if translation.language_id != previous_language_id {
        state.cache.invalidate(translation.language_id).await;
    }

    Ok(Json(ApiResponse::success(
        translation,
        "Translation updated successfully",
    )))
}

pub async fn delete_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let translation = state.store.delete_translation(id).await?;
    state.cache.invalidate(translation.language_id).await;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Export ====================

/// Flat `{key: value}` object, no envelope, so clients can consume it as-is.
pub async fn export_translations(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let snapshot = export_locale(&state.store, &state.cache, &state.config, &locale).await?;
    Ok(Json((*snapshot).clone()))
}
