use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use qualstat_engine::{dispatch_from_store, EngineError, NumericService, ProjectStore};
use qualstat_protocol::{serialize_json, ErrorEnvelope, TestRequest};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProjectStore>,
    pub service: Arc<dyn NumericService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chi-square", post(chi_square))
        .route("/health", get(health))
        .with_state(state)
}

/// `POST /chi-square`: validation report or post-processed service result.
pub async fn chi_square(State(state): State<AppState>, body: Bytes) -> Response {
    let request: TestRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                format!("Invalid request body: {err}"),
            )
        }
    };

    log::info!(
        "chi-square {} (project {}, validateOnly={})",
        request.subtype,
        request.project_id.as_deref().unwrap_or("-"),
        request.validate_only
    );

    let outcome = dispatch_from_store(&request, state.store.as_ref(), state.service.as_ref())
        .await
        .and_then(|outcome| outcome.into_json());
    match outcome {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(err) => engine_error_response(&err),
    }
}

pub async fn health() -> Response {
    json_response(StatusCode::OK, &json!({"status": "ok"}))
}

fn engine_error_response(err: &EngineError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        log::error!("chi-square request failed: {err}");
    } else {
        log::debug!("chi-square request rejected: {err}");
    }
    error_response(status, err.code(), err.to_string())
}

pub(crate) fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    let hint = match code {
        "invalid_request" => Some(
            "Check testType, subtype, codeCombinations and the selection fields against `qualstat schema`.",
        ),
        "not_found" => Some("Verify projectId and ownerId."),
        "upstream_error" => Some("Check that the numeric service is reachable (service.endpoint)."),
        _ => None,
    };
    let envelope = ErrorEnvelope {
        code: code.to_string(),
        message,
        details: None,
        hint: hint.map(str::to_string),
    };
    json_response(status, &envelope)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    match serialize_json(body) {
        Ok(bytes) => (status, [(CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(err) => {
            log::error!("failed to serialize response: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use qualstat_engine::{AnnotationRecord, CodeDefinition, InMemoryProjectStore, ProjectSnapshot};
    use qualstat_protocol::{EntityRef, ServicePayload};
    use serde_json::Value;

    struct FixedService(Value);

    #[async_trait]
    impl NumericService for FixedService {
        async fn compute(&self, _payload: &ServicePayload) -> qualstat_engine::Result<Value> {
            Ok(self.0.clone())
        }
    }

    struct DownService;

    #[async_trait]
    impl NumericService for DownService {
        async fn compute(&self, _payload: &ServicePayload) -> qualstat_engine::Result<Value> {
            Err(EngineError::upstream(None, "connection refused"))
        }
    }

    fn state(service: Arc<dyn NumericService>) -> AppState {
        let segments = (0..6)
            .map(|i| AnnotationRecord {
                id: None,
                file_id: Some(EntityRef::from(if i % 2 == 0 { "d1" } else { "d2" })),
                code_definition: Some(EntityRef::from(if i < 3 { "A" } else { "B" })),
                start_index: 0,
                end_index: 1,
            })
            .collect();
        let project = ProjectSnapshot {
            id: "p1".to_string(),
            owner: Some("u1".to_string()),
            code_definitions: ["A", "B"]
                .into_iter()
                .map(|id| CodeDefinition {
                    id: id.into(),
                    name: id.to_string(),
                    color: None,
                    description: None,
                })
                .collect(),
            coded_segments: segments,
            ..Default::default()
        };
        let store: InMemoryProjectStore = std::iter::once(project).collect();
        AppState {
            store: Arc::new(store),
            service,
        }
    }

    async fn call(state: AppState, body: Value) -> (StatusCode, Value) {
        let response = chi_square(State(state), Bytes::from(body.to_string())).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    fn request(validate_only: bool) -> Value {
        json!({
            "projectId": "p1",
            "ownerId": "u1",
            "testType": "chi-square",
            "subtype": "independence",
            "validateOnly": validate_only,
            "indepCodes": ["A", "B"],
            "indepDocs": ["d1", "d2"]
        })
    }

    #[tokio::test]
    async fn validate_only_returns_the_report() {
        let (status, body) = call(state(Arc::new(DownService)), request(true)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["expectedFrequency"]["status"], "warning");
        assert_eq!(body["expectedFrequency"]["details"]["grandTotal"], 6);
        assert_eq!(body["canProceed"], false);
    }

    #[tokio::test]
    async fn run_returns_the_processed_result() {
        let service = FixedService(json!({"statistic": 0.67, "pValue": 0.41, "df": 1}));
        let (status, body) = call(state(Arc::new(service)), request(false)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pValue"], 0.41);
        assert_eq!(body["preparation"]["rowLabels"], json!(["A", "B"]));
    }

    #[tokio::test]
    async fn errors_use_the_envelope() {
        let (status, body) = call(
            state(Arc::new(DownService)),
            json!({"testType": "t-test", "subtype": "independence", "projectId": "p1"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["message"], "Unsupported test type: t-test");

        let mut foreign = request(true);
        foreign["ownerId"] = json!("u2");
        let (status, body) = call(state(Arc::new(DownService)), foreign).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");

        let (status, body) = call(state(Arc::new(DownService)), request(false)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "upstream_error");
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let response = chi_square(State(state(Arc::new(DownService))), Bytes::from("{")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = health().await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(bytes.as_ref(), br#"{"status":"ok"}"#);
    }
}
