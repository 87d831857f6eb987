use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::entry::StoredEntry;
use crate::normalize::{normalize_entry, NormalizeOptions};
use crate::server::AppState;
use crate::storage::StoreDiagnostics;
use crate::{Error, ErrorKind};

#[derive(Deserialize)]
pub struct RecentParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: Error) -> ApiError {
    let status = if err.kind() == ErrorKind::InvalidEntry {
        StatusCode::UNPROCESSABLE_ENTITY
    } else if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(error = %err, "score store request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse { error: err.to_string() }))
}

pub async fn get_scores(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<StoredEntry>>, ApiError> {
    let limit = params.limit.unwrap_or(state.default_limit);
    let store = state.store.lock().await;
    let entries = store.read_recent(limit).map_err(api_error)?;
    Ok(Json(entries))
}

pub async fn post_score(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // Decoded here so malformed bodies get the same error shape as the rest
    let payload: Value = serde_json::from_slice(&body).map_err(|e| api_error(e.into()))?;
    let entry = normalize_entry(&payload, NormalizeOptions::default())
        .map_err(|rejected| api_error(Error::InvalidEntry(rejected.reason)))?;

    let mut store = state.store.lock().await;
    store.write_entry(&entry).map_err(api_error)?;

    let body = serde_json::to_value(&entry).map_err(|e| api_error(e.into()))?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn get_diagnostics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoreDiagnostics>, ApiError> {
    let store = state.store.lock().await;
    let diagnostics = store.diagnostics().map_err(api_error)?;
    Ok(Json(diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use crate::storage::open_backend;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(cap: usize) -> axum::Router {
        let store = open_backend("memory", "", cap).unwrap();
        router(Arc::new(AppState::new(store, 10)))
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/scores")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_then_list() {
        let app = app(5);
        let response = app
            .clone()
            .oneshot(post(
                r#"{"name":"ada","timeMs":40000,"attempts":12,"difficultyId":"easy","emojiSetId":"animals","scoreValue":700}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(Request::builder().uri("/scores?limit=3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "ada");
        assert!(body[0]["id"].is_i64());
    }

    #[tokio::test]
    async fn test_rejected_entry_is_unprocessable() {
        let response = app(5)
            .oneshot(post(r#"{"timeMs":40000}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("missing name"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app(5).oneshot(post(r#"{"name": "ada""#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_store_failure_is_server_error() {
        let (status, Json(body)) = api_error(Error::Storage(rusqlite::Error::InvalidQuery));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.is_empty());

        let (status, _) = api_error(Error::Configuration("bad limit".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_diagnostics_endpoint() {
        let response = app(7)
            .oneshot(Request::builder().uri("/diagnostics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "memory");
        assert_eq!(body["retention_cap"], 7);
    }
}
