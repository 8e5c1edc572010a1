//! Async HTTP Server Module
//!
//! Serves the loan risk model over HTTP using axum.
//!
//! # Features
//!
//! - Risk assessment endpoint (`POST /calculate`)
//! - Application form at `/` (built-in, or a configured HTML file)
//! - Health endpoint with build information
//! - CORS support for browser clients
//! - Request tracing
//! - Graceful shutdown
//!
//! # Example
//!
//! ```rust,ignore
//! use credit_risk::credit::CreditModel;
//! use credit_risk::fuzzy::DefuzzificationMethod;
//! use credit_risk::server::{run_server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let model = CreditModel::new(DefuzzificationMethod::Centroid).unwrap();
//!     run_server(model, ServerConfig::default()).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ConfigError;
pub use crate::config::ServerConfig;
use crate::credit::{Assessment, CreditModel, RiskCategory};
use crate::error::{ErrorCode, ErrorResponse, RiskError, RiskResult};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the server
pub struct AppState {
    /// The loan risk model; immutable, so no lock is needed
    pub model: CreditModel,
    /// Server configuration
    pub config: ServerConfig,
    /// Contents of the configured index page, if any
    pub index_html: Option<String>,
}

impl AppState {
    /// Create new application state
    pub fn new(model: CreditModel, config: ServerConfig) -> Self {
        Self {
            model,
            config,
            index_html: None,
        }
    }

    pub fn with_index_html(mut self, html: impl Into<String>) -> Self {
        self.index_html = Some(html.into());
        self
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A loan application as submitted to `/calculate`
#[derive(Debug, Clone, PartialEq)]
pub struct CalculateRequest {
    pub name: Option<String>,
    pub income: f64,
    pub debt: f64,
    pub experience: f64,
}

impl CalculateRequest {
    /// Parse a JSON body. Numeric fields may be JSON numbers or numeric strings.
    pub fn from_json(body: &[u8]) -> RiskResult<Self> {
        let value: Value = serde_json::from_slice(body)?;
        let fields = value
            .as_object()
            .ok_or_else(|| RiskError::invalid_input("request body must be a JSON object"))?;

        Ok(Self {
            name: text_field(fields, "name"),
            income: numeric_field(fields, "income")?,
            debt: numeric_field(fields, "debt")?,
            experience: numeric_field(fields, "experience")?,
        })
    }
}

fn numeric_field(fields: &Map<String, Value>, field: &str) -> RiskResult<f64> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(RiskError::missing_field(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| RiskError::non_numeric(field)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RiskError::non_numeric(field).with_context("value", s.as_str())),
        Some(_) => Err(RiskError::non_numeric(field)),
    }
}

fn text_field(fields: &Map<String, Value>, field: &str) -> Option<String> {
    match fields.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Body returned by `/calculate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub name: Option<String>,
    /// Human-readable decision, e.g. "Approved (LOW risk: 0.153)"
    pub decision: String,
    pub risk: Option<f64>,
    pub category: Option<RiskCategory>,
    pub debt_ratio: Option<f64>,
}

impl CalculateResponse {
    pub fn new(name: Option<String>, assessment: &Assessment) -> Self {
        Self {
            name,
            decision: assessment.label(),
            risk: assessment.risk,
            category: assessment.category(),
            debt_ratio: assessment.debt_ratio,
        }
    }
}

impl IntoResponse for RiskError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.code.code(), "{}", self.message);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Handle POST /calculate
async fn calculate(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<CalculateResponse>, RiskError> {
    let request = CalculateRequest::from_json(&body).map_err(|e| {
        warn!(code = e.code.code(), "rejected request: {}", e.message);
        e
    })?;

    let assessment = state
        .model
        .assess(request.income, request.debt, request.experience)?;

    Ok(Json(CalculateResponse::new(request.name, &assessment)))
}

/// Serve the application form at /
async fn index_page(State(state): State<SharedState>) -> Html<String> {
    match &state.index_html {
        Some(html) => Html(html.clone()),
        None => Html(INDEX_HTML.to_string()),
    }
}

/// Health check endpoint
async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CREDIT_RISK_VERSION"),
        "target": env!("CREDIT_RISK_TARGET"),
        "defuzzification": state.model.system().defuzzification().as_str(),
    }))
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Loan Risk Assessment</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
               max-width: 640px; margin: 50px auto; padding: 20px; }
        h1 { color: #333; }
        label { display: block; margin-top: 12px; }
        input { width: 100%; padding: 6px; font-size: 15px; }
        button { background: #007bff; color: white; padding: 10px 20px; border: none;
                 cursor: pointer; font-size: 16px; margin-top: 16px; }
        button:hover { background: #0056b3; }
        pre { background: #f5f5f5; padding: 15px; overflow-x: auto; }
    </style>
</head>
<body>
    <h1>Loan Risk Assessment</h1>
    <form id="application">
        <label>Name <input name="name" type="text"></label>
        <label>Monthly income <input name="income" type="number" step="any" required></label>
        <label>Monthly debt <input name="debt" type="number" step="any" required></label>
        <label>Work experience (months) <input name="experience" type="number" step="any" required></label>
        <button type="submit">Assess</button>
    </form>
    <h3 id="decision"></h3>
    <pre id="details"></pre>
    <script>
        document.getElementById('application').addEventListener('submit', async (event) => {
            event.preventDefault();
            const body = Object.fromEntries(new FormData(event.target).entries());
            const response = await fetch('/calculate', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(body),
            });
            const result = await response.json();
            document.getElementById('decision').textContent =
                response.ok ? result.decision : 'Error: ' + result.message;
            document.getElementById('details').textContent = JSON.stringify(result, null, 2);
        });
    </script>
    <h3>Endpoints</h3>
    <ul>
        <li><code>POST /calculate</code> - Assess an application (JSON body)</li>
        <li><code>GET /health</code> - Health check</li>
    </ul>
</body>
</html>"#;

// ============================================================================
// Server Setup
// ============================================================================

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let cors_enabled = state.config.cors_enabled;
    let body_limit = state.config.max_body_size;

    let router = Router::new()
        .route("/", get(index_page))
        .route("/calculate", post(calculate))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_origin(Any)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);
        router.layer(cors)
    } else {
        router
    }
}

/// Run the async HTTP server
///
/// Blocks until the server is shut down (via Ctrl+C). The configured
/// index page, if any, is read once at startup.
pub async fn run_server(model: CreditModel, config: ServerConfig) -> RiskResult<()> {
    let addr = config.socket_addr()?;

    let index_html = match &config.index_page {
        Some(path) => {
            let html = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
            info!(path = %path.display(), "serving custom index page");
            Some(html)
        }
        None => None,
    };

    let mut state = AppState::new(model, config);
    state.index_html = index_html;
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        RiskError::internal(format!("cannot bind {}: {}", addr, e)).with_context("addr", addr.to_string())
    })?;
    info!(%addr, "loan risk service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RiskError::internal(format!("server error: {}", e)))?;

    info!("server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C)
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::DefuzzificationMethod;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn create_test_app(config: ServerConfig) -> Router {
        let model = CreditModel::new(DefuzzificationMethod::Centroid).unwrap();
        create_router(Arc::new(AppState::new(model, config)))
    }

    async fn post_calculate(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app(ServerConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["defuzzification"], "centroid");
    }

    #[tokio::test]
    async fn test_calculate_approved() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) = post_calculate(
            app,
            r#"{"name": "Ada", "income": 8000, "debt": 200, "experience": 24}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["decision"], "Approved (LOW risk: 0.153)");
        assert_eq!(json["risk"], 0.153);
        assert_eq!(json["category"], "low");
        assert_eq!(json["debt_ratio"], 2.5);
    }

    #[tokio::test]
    async fn test_calculate_accepts_numeric_strings() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) = post_calculate(
            app,
            r#"{"name": "Bo", "income": "3500", "debt": " 1400.0 ", "experience": "12"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["decision"], "Guarantor required (MEDIUM risk: 0.5)");
        assert_eq!(json["category"], "medium");
    }

    #[tokio::test]
    async fn test_calculate_short_experience() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) =
            post_calculate(app, r#"{"income": 2000, "debt": 0, "experience": 3}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["name"].is_null());
        assert!(json["risk"].is_null());
        assert!(json["category"].is_null());
        assert_eq!(json["decision"], "Rejected — insufficient work experience");
    }

    #[tokio::test]
    async fn test_calculate_missing_field() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) = post_calculate(app, r#"{"income": 2000, "experience": 12}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MissingField");
        assert_eq!(json["details"]["field"], "debt");
    }

    #[tokio::test]
    async fn test_calculate_non_numeric_field() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) = post_calculate(
            app,
            r#"{"income": "lots", "debt": 100, "experience": 12}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code_num"], 1002);

        let app = create_test_app(ServerConfig::default());
        let (status, _) =
            post_calculate(app, r#"{"income": [1], "debt": 100, "experience": 12}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_calculate_non_finite_string() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) =
            post_calculate(app, r#"{"income": "inf", "debt": 100, "experience": 12}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "NonFiniteInput");
    }

    #[tokio::test]
    async fn test_calculate_malformed_body() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) = post_calculate(app, "income=8000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MalformedBody");

        let app = create_test_app(ServerConfig::default());
        let (status, json) = post_calculate(app, "[8000, 200, 24]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "InvalidInput");
    }

    #[tokio::test]
    async fn test_calculate_degenerate_is_server_error() {
        let app = create_test_app(ServerConfig::default());
        let (status, json) =
            post_calculate(app, r#"{"income": 500, "debt": 0, "experience": 12}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "DegenerateInference");
        assert!(json.get("risk").is_none());
    }

    #[tokio::test]
    async fn test_body_limit() {
        let app = create_test_app(ServerConfig {
            max_body_size: 16,
            ..ServerConfig::default()
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .body(Body::from(
                        r#"{"income": 8000, "debt": 200, "experience": 24}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let request = || {
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap()
        };

        let app = create_test_app(ServerConfig::default());
        let response = app.oneshot(request()).await.unwrap();
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let app = create_test_app(ServerConfig::default().with_cors(false));
        let response = app.oneshot(request()).await.unwrap();
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_index_page() {
        let app = create_test_app(ServerConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("/calculate"));
    }

    #[tokio::test]
    async fn test_custom_index_page() {
        let model = CreditModel::new(DefuzzificationMethod::Centroid).unwrap();
        let state = AppState::new(model, ServerConfig::default())
            .with_index_html("<h1>Branch office</h1>");
        let app = create_router(Arc::new(state));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        assert_eq!(&body[..], b"<h1>Branch office</h1>");
    }

    #[tokio::test]
    async fn test_run_server_rejects_bad_host() {
        let model = CreditModel::new(DefuzzificationMethod::Centroid).unwrap();
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        let err = run_server(model, config).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
        assert_eq!(err.context.get("key").map(String::as_str), Some("server.host"));
    }

    #[tokio::test]
    async fn test_run_server_rejects_missing_index_page() {
        let model = CreditModel::new(DefuzzificationMethod::Centroid).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            index_page: Some(dir.path().join("missing.html")),
            ..ServerConfig::default()
        };
        let err = run_server(model, config).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
        assert!(err.context.contains_key("path"));
    }

    #[tokio::test]
    async fn test_run_server_reports_bind_failure() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let model = CreditModel::new(DefuzzificationMethod::Centroid).unwrap();
        let config = ServerConfig {
            port,
            ..ServerConfig::default()
        };
        let err = run_server(model, config).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.context.get("addr"), Some(&format!("127.0.0.1:{}", port)));
    }

    #[test]
    fn test_parse_request() {
        let request = CalculateRequest::from_json(
            br#"{"name": 42, "income": 1e3, "debt": "25.5", "experience": 6}"#,
        )
        .unwrap();
        assert_eq!(request.name.as_deref(), Some("42"));
        assert_eq!(request.income, 1000.0);
        assert_eq!(request.debt, 25.5);
        assert_eq!(request.experience, 6.0);

        let err = CalculateRequest::from_json(br#"{"income": null, "debt": 1, "experience": 6}"#)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
    }
}
