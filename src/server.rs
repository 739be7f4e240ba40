use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::email_parser::EmailParser;
use crate::i18n::{self, Language};
use crate::pipeline::Pipeline;
use crate::text_parser::TextParser;

pub struct AppState {
    pub config: Config,
    pub pipeline: Pipeline,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze/text", post(analyze_text))
        .route("/api/v1/analyze/eml", post(analyze_eml))
        .route("/api/v1/translations/:lang", get(translations))
        .with_state(state)
}

pub async fn serve(config: Config, pipeline: Pipeline) -> anyhow::Result<()> {
    let addr = config.listen_addr.clone();
    let state = Arc::new(AppState { config, pipeline });
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

/// Auth is disabled when no token is configured.
fn authorized(config: &Config, headers: &HeaderMap) -> bool {
    let Some(expected) = config.auth_token.as_deref() else {
        return true;
    };
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "apis_configured": state.config.configured_services(),
    }))
    .into_response()
}

async fn analyze_text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeTextRequest>,
) -> Response {
    if !authorized(&state.config, &headers) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid or missing token");
    }
    if request.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text must not be empty");
    }
    let language = Language::from_code(request.language.as_deref().unwrap_or("en"));
    let document = TextParser::parse(&request.text);
    let report = state.pipeline.run(&document, language).await;
    Json(report).into_response()
}

async fn analyze_eml(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&state.config, &headers) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid or missing token");
    }

    let mut raw: Option<Vec<u8>> = None;
    let mut language = Language::En;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name().map(str::to_string).as_deref() {
                Some("language") => {
                    if let Ok(code) = field.text().await {
                        language = Language::from_code(&code);
                    }
                }
                _ => {
                    let eml_name = field
                        .file_name()
                        .map(|n| n.to_lowercase().ends_with(".eml"))
                        .unwrap_or(false);
                    if !eml_name {
                        return error_response(StatusCode::BAD_REQUEST, "file must be .eml");
                    }
                    match field.bytes().await {
                        Ok(bytes) => raw = Some(bytes.to_vec()),
                        Err(e) => {
                            return error_response(
                                StatusCode::BAD_REQUEST,
                                &format!("failed to read upload: {e}"),
                            )
                        }
                    }
                }
            },
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("malformed multipart body: {e}"),
                )
            }
        }
    }

    let Some(raw) = raw else {
        return error_response(StatusCode::BAD_REQUEST, "missing file field");
    };
    let document = match EmailParser::parse(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("rejected eml upload: {e}");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };
    let report = state.pipeline.run(&document, language).await;
    Json(report).into_response()
}

async fn translations(Path(lang): Path<String>) -> Response {
    match i18n::ui_catalog(&lang) {
        Some(catalog) => Json(catalog).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "unsupported language"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_auth_disabled_without_token() {
        let config = Config::default();
        assert!(authorized(&config, &HeaderMap::new()));
    }

    #[test]
    fn test_auth_accepts_matching_bearer() {
        let config = Config {
            auth_token: Some("sekrit".to_string()),
            ..Config::default()
        };
        assert!(authorized(&config, &headers_with_token("sekrit")));
    }

    #[test]
    fn test_auth_rejects_mismatch_and_missing() {
        let config = Config {
            auth_token: Some("sekrit".to_string()),
            ..Config::default()
        };
        assert!(!authorized(&config, &headers_with_token("wrong")));
        assert!(!authorized(&config, &HeaderMap::new()));
    }

    #[test]
    fn test_translations_catalog_lookup() {
        assert!(i18n::ui_catalog("es").is_some());
        assert!(i18n::ui_catalog("de").is_none());
    }
}
