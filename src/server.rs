use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::cache::TranslationMap;
use crate::translations::{TranslationError, TranslationService, DEFAULT_NAMESPACE};

#[derive(Clone)]
pub struct AppState {
    pub translations: Arc<TranslationService>,
}

#[derive(Debug, Deserialize)]
pub struct TranslationQuery {
    pub lang: Option<String>,
    pub ns: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    MissingLanguage,
    Retrieval(TranslationError),
}

impl From<TranslationError> for ApiError {
    fn from(e: TranslationError) -> Self {
        ApiError::Retrieval(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingLanguage => (
                StatusCode::BAD_REQUEST,
                "Language parameter (lang) is required.".to_string(),
            ),
            ApiError::Retrieval(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/translations", get(get_translations))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_translations(
    State(state): State<AppState>,
    Query(query): Query<TranslationQuery>,
) -> Result<Json<Arc<TranslationMap>>, ApiError> {
    let Some(lang) = query.lang.filter(|l| !l.is_empty()) else {
        warn!("Rejected translations request without lang");
        return Err(ApiError::MissingLanguage);
    };
    let ns = query
        .ns
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    let translations = state.translations.get_translations(&lang, &ns).await?;
    Ok(Json(translations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryStore;
    use crate::sheets::{DocumentClient, DocumentMetadata, Sheet};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct EmptyDocument;

    #[async_trait]
    impl DocumentClient for EmptyDocument {
        async fn load_metadata(&self) -> anyhow::Result<DocumentMetadata> {
            Ok(DocumentMetadata::default())
        }

        async fn load_sheet(&self, title: &str) -> anyhow::Result<Sheet> {
            Ok(Sheet::from_values(title, Vec::new()))
        }
    }

    fn create_app() -> Router {
        router(AppState {
            translations: Arc::new(TranslationService::new(
                Arc::new(EmptyDocument),
                Arc::new(InMemoryStore::new()),
            )),
        })
    }

    async fn send(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn test_missing_language_response() {
        let response = ApiError::MissingLanguage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_retrieval_error_response() {
        let response = ApiError::from(TranslationError::RetrievalFailed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = ApiError::MissingLanguage.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Language parameter (lang) is required.");
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(create_app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_lang_is_rejected() {
        let response = send(create_app(), "/translations?lang=&ns=common").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_namespace_is_500() {
        let response = send(create_app(), "/translations?lang=en").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Failed to retrieve translations");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = send(create_app(), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
