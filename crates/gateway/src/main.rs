//! PactForge API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and role checks
//! - Rate limiting
//! - Request routing to layout generation, templates and contracts
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    extract::{FromRef, Request},
    middleware::{from_fn, Next},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimit};
use crate::middleware::request_metrics::track_requests;
use pactforge_common::{
    auth::JwtManager,
    config::AppConfig,
    errors::{AppError, Result},
    metrics,
};
use pactforge_workflow::Workflow;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub workflow: Workflow,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, workflow: Workflow) -> Result<Self> {
        let secret = config
            .auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "auth.jwt_secret is required".to_string(),
            })?;
        let jwt = Arc::new(JwtManager::new(secret, config.auth.jwt_expiration_secs));

        Ok(Self {
            config,
            workflow,
            jwt,
        })
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config);
    info!("Starting PactForge API Gateway v{}", pactforge_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!("Metrics exporter listening on {}", addr);
    }
    metrics::register_metrics();

    let workflow = Workflow::connect(&config).await?;
    let state = AppState::new(config.clone(), workflow)?;

    // Build the router
    let app = create_router(state)?;

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Result<Router> {
    let config = state.config.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Layout generation
        .route("/layouts", post(handlers::layouts::generate_layout))
        .route("/layouts/figma", post(handlers::layouts::generate_figma))
        .route(
            "/document-templates",
            get(handlers::layouts::list_document_templates),
        )
        .route(
            "/document-templates/{name}/fill",
            post(handlers::layouts::fill_document_template),
        )
        // Template endpoints
        .route(
            "/templates",
            post(handlers::templates::create_template).get(handlers::templates::list_templates),
        )
        .route(
            "/templates/{id}",
            get(handlers::templates::get_template).put(handlers::templates::update_template),
        )
        .route("/templates/{id}/versions", get(handlers::templates::list_versions))
        .route("/templates/{id}/versions/compare", get(handlers::templates::compare_versions))
        .route(
            "/templates/{id}/versions/{version_id}/restore",
            post(handlers::templates::restore_version),
        )
        .route("/templates/{id}/submit", post(handlers::templates::submit_template))
        .route("/templates/{id}/approve", post(handlers::templates::approve_template))
        .route("/templates/{id}/reject", post(handlers::templates::reject_template))
        .route("/templates/{id}/activity", get(handlers::templates::template_activity))
        // Contract endpoints
        .route(
            "/contracts",
            post(handlers::contracts::create_contract).get(handlers::contracts::list_contracts),
        )
        .route("/contracts/{id}", get(handlers::contracts::get_contract))
        .route("/contracts/{id}/submit", post(handlers::contracts::submit_contract))
        .route("/contracts/{id}/approve", post(handlers::contracts::approve_contract))
        .route("/contracts/{id}/reject", post(handlers::contracts::reject_contract))
        .route("/contracts/{id}/activity", get(handlers::contracts::contract_activity))
        // Reminder scheduler
        .route("/reminders/run", post(handlers::reminders::run_reminders));

    if config.rate_limit.enabled {
        let limit = RateLimit::new(&config.rate_limit)?;
        api_routes = api_routes.layer(from_fn(move |request: Request, next: Next| {
            rate_limit_middleware(request, next, limit.clone())
        }));
    }
    // Wraps the rate limiter, so rejected requests are counted
    let api_routes = api_routes.route_layer(from_fn(track_requests));

    // Compose the app
    Ok(Router::new()
        .nest("/v1", api_routes)
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, StatusCode};
    use pactforge_common::auth::{ConfigDirectory, Role};
    use pactforge_common::mail::LogMailer;
    use pactforge_workflow::Stores;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    struct TestApp {
        router: Router,
        jwt: JwtManager,
    }

    impl TestApp {
        fn new(rate_limit: bool) -> Self {
            let mut config = AppConfig::default();
            config.auth.jwt_secret = Some(SECRET.to_string());
            config.rate_limit.enabled = rate_limit;
            config.rate_limit.requests_per_second = 1;
            config.rate_limit.burst = 2;

            let workflow = Workflow::assemble(
                &config,
                Stores::memory(),
                Arc::new(LogMailer),
                Arc::new(ConfigDirectory::from_emails(["approver@example.com".to_string()])),
                None,
            );
            let state = AppState::new(Arc::new(config), workflow).unwrap();
            Self {
                router: create_router(state).unwrap(),
                jwt: JwtManager::new(SECRET, 3600),
            }
        }

        fn token(&self, email: &str, role: Role) -> String {
            self.jwt.generate_token(email, email, role).unwrap()
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = axum::http::Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => request.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = TestApp::new(false);
        let (status, body) = app.call(Method::GET, "/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = app.call(Method::GET, "/v1/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"]["status"], "skipped");
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let app = TestApp::new(false);
        let (status, _) = app.call(Method::GET, "/v1/templates", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .call(Method::GET, "/v1/templates", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_template_approval_over_http() {
        let app = TestApp::new(false);
        let owner = app.token("owner@example.com", Role::User);
        let manager = app.token("manager@example.com", Role::Manager);

        let (status, created) = app
            .call(
                Method::POST,
                "/v1/templates",
                Some(&owner),
                Some(json!({"name": "Promoter NDA", "contractType": "nda"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["version"], 1);
        assert_eq!(created["approvalStatus"], "draft");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, submitted) = app
            .call(Method::POST, &format!("/v1/templates/{}/submit", id), Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(submitted["approvalStatus"], "pending_approval");

        // Plain users cannot decide
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/templates/{}/approve", id),
                Some(&owner),
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, approved) = app
            .call(
                Method::POST,
                &format!("/v1/templates/{}/approve", id),
                Some(&manager),
                Some(json!({"comments": "Looks good"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["approvalStatus"], "approved");
        assert_eq!(approved["approvedBy"], "manager@example.com");
        assert_eq!(approved["isPublished"], true);

        // Approving twice is an invalid transition
        let (status, body) = app
            .call(
                Method::POST,
                &format!("/v1/templates/{}/approve", id),
                Some(&manager),
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"]["message"].as_str().unwrap().contains("approved"));

        let (status, activity) = app
            .call(Method::GET, &format!("/v1/templates/{}/activity", id), Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(activity.as_array().unwrap().len() >= 3);
    }

    #[tokio::test]
    async fn test_edit_compare_and_restore() {
        let app = TestApp::new(false);
        let owner = app.token("owner@example.com", Role::User);

        let (_, created) = app
            .call(
                Method::POST,
                "/v1/templates",
                Some(&owner),
                Some(json!({"name": "Services", "contractType": "services"})),
            )
            .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, edited) = app
            .call(
                Method::PUT,
                &format!("/v1/templates/{}", id),
                Some(&owner),
                Some(json!({"name": "Services v2", "changeNotes": "Rename"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["version"], 2);

        let (_, versions) = app
            .call(Method::GET, &format!("/v1/templates/{}/versions", id), Some(&owner), None)
            .await;
        let versions = versions.as_array().unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0]["name"], "Services");
        let version_id = versions[0]["id"].as_str().unwrap().to_string();

        let (status, diff) = app
            .call(
                Method::GET,
                &format!("/v1/templates/{}/versions/compare?from={}&to=current", id, version_id),
                Some(&owner),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(diff["name"]["changed"], true);
        assert_eq!(diff["contractType"]["changed"], false);

        let (status, restored) = app
            .call(
                Method::POST,
                &format!("/v1/templates/{}/versions/{}/restore", id, version_id),
                Some(&owner),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restored["name"], "Services");
        assert_eq!(restored["version"], 3);

        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/templates/{}/versions/{}/restore", id, uuid::Uuid::new_v4()),
                Some(&owner),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_layout_endpoints() {
        let app = TestApp::new(false);
        let user = app.token("user@example.com", Role::User);
        let data = json!({
            "first_party_name_en": "Acme LLC",
            "second_party_name_en": "Falcon Trading",
            "promoter_name_en": "Sara Ali",
            "start_date": "2024-01-01",
            "end_date": "2024-12-31",
            "template_type": "promoterAssignment"
        });

        let (status, layout) = app
            .call(Method::POST, "/v1/layouts", Some(&user), Some(data.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(layout["version"], "2.0");

        let (status, figma) = app
            .call(Method::POST, "/v1/layouts/figma", Some(&user), Some(data.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(figma["type"], "contract");
        assert!(figma["figmaDocument"].is_object());

        let (status, body) = app
            .call(
                Method::POST,
                "/v1/layouts",
                Some(&user),
                Some(json!({"first_party_name_en": ""})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_object());

        let (status, templates) = app
            .call(Method::GET, "/v1/document-templates", Some(&user), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(templates["templates"][0]["name"], "promoterAssignment");

        let (status, _) = app
            .call(
                Method::POST,
                "/v1/document-templates/unknown/fill",
                Some(&user),
                Some(json!({"data": data})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contract_lifecycle_over_http() {
        let app = TestApp::new(false);
        let owner = app.token("owner@example.com", Role::User);
        let admin = app.token("admin@example.com", Role::Admin);

        let (status, contract) = app
            .call(
                Method::POST,
                "/v1/contracts",
                Some(&owner),
                Some(json!({"first_party_name_en": "Acme LLC", "ref_number": "PAC-1"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(contract["refNumber"], "PAC-1");
        let id = contract["id"].as_str().unwrap().to_string();

        app.call(Method::POST, &format!("/v1/contracts/{}/submit", id), Some(&owner), None)
            .await;
        let (status, rejected) = app
            .call(
                Method::POST,
                &format!("/v1/contracts/{}/reject", id),
                Some(&admin),
                Some(json!({"comments": "Wrong party"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rejected["approvalStatus"], "rejected");
        assert_eq!(rejected["approvalComments"], "Wrong party");

        let (status, listed) = app
            .call(Method::GET, "/v1/contracts?status=rejected", Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = app
            .call(Method::GET, "/v1/contracts?status=bogus", Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reminder_run_is_admin_only() {
        let app = TestApp::new(false);
        let manager = app.token("manager@example.com", Role::Manager);
        let admin = app.token("admin@example.com", Role::Admin);

        let (status, _) = app
            .call(Method::POST, "/v1/reminders/run", Some(&manager), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, report) = app
            .call(Method::POST, "/v1/reminders/run", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["escalation"]["templates"]["total"], 0);
        assert_eq!(report["cadences"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_excess_requests() {
        let app = TestApp::new(true);
        let mut statuses = Vec::new();
        for _ in 0..3 {
            let (status, _) = app.call(Method::GET, "/v1/health", None, None).await;
            statuses.push(status);
        }
        assert_eq!(statuses[0], StatusCode::OK);
        assert_eq!(statuses[2], StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_missing_jwt_secret_is_configuration_error() {
        let config = AppConfig::default();
        let workflow = Workflow::assemble(
            &config,
            Stores::memory(),
            Arc::new(LogMailer),
            Arc::new(ConfigDirectory::from_emails(Vec::<String>::new())),
            None,
        );
        assert!(matches!(
            AppState::new(Arc::new(config), workflow),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_requests_are_counted_by_route_template() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let app = TestApp::new(false);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let path = format!("/v1/templates/{}", uuid::Uuid::new_v4());
        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(app.call(Method::GET, &path, None, None));
        });

        let rendered = handle.render();
        assert!(rendered.contains("pactforge_requests_total"));
        assert!(rendered.contains(r#"endpoint="/v1/templates/{id}""#));
        assert!(rendered.contains(r#"status="401""#));
        assert!(!rendered.contains(&path));
    }
}
