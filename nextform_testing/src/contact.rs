use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use nextform_models::{contact::ContactFormData, email_address::is_valid_email};
use serde::Serialize;
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use uuid::Uuid;

pub const CONTACT_ROUTE: &str = "/api/contact";

const ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:4200",
    "http://localhost",
    "http://localhost:80",
];

/// In-memory stand-in for the contact backend.
#[derive(Debug, Default)]
pub struct ContactBackend {
    failure: Option<String>,
    submissions: Mutex<Vec<StoredSubmission>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSubmission {
    pub id: Uuid,
    #[serde(flatten)]
    pub form: ContactFormData,
}

impl ContactBackend {
    /// If `failure` is set, every submission is answered with an internal
    /// server error mentioning it.
    pub fn new(failure: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            failure,
            submissions: Default::default(),
        })
    }

    pub async fn submissions(&self) -> Vec<StoredSubmission> {
        self.submissions.lock().await.clone()
    }
}

pub fn router(backend: Arc<ContactBackend>) -> Router<()> {
    let cors = CorsLayer::new()
        .allow_origin(ALLOWED_ORIGINS.map(HeaderValue::from_static))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", routing::get(welcome))
        .route("/healthy", routing::get(healthy))
        .route(CONTACT_ROUTE, routing::get(preflight).post(submit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(backend)
}

pub async fn start_server(
    host: IpAddr,
    port: u16,
    failure: Option<String>,
) -> anyhow::Result<()> {
    info!("Starting contact testing server on {host}:{port}");
    info!("Contact endpoint: http://{host}:{port}{CONTACT_ROUTE}");
    if let Some(failure) = &failure {
        info!("Every submission will fail with: {failure:?}");
    }

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(ContactBackend::new(failure)))
        .await
        .context("Failed to start HTTP server")
}

/// Serve `backend` on a random local port in the background and return the
/// bound address.
pub async fn spawn(backend: Arc<ContactBackend>) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .context("Failed to bind to a local port")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router(backend)).await {
            error!("Contact testing server stopped: {err}");
        }
    });

    Ok(addr)
}

async fn welcome() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to Next Form App API",
        "version": "1.0.0",
    }))
}

async fn healthy() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

async fn preflight() -> Json<serde_json::Value> {
    Json(json!({ "message": "OK" }))
}

async fn submit(
    backend: State<Arc<ContactBackend>>,
    payload: Result<Json<ContactFormData>, JsonRejection>,
) -> Response {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(rejection) => {
            return validation_error("json_invalid", &["body"], rejection.body_text());
        }
    };

    if !is_valid_email(&form.email) {
        return validation_error(
            "value_error",
            &["body", "email"],
            "value is not a valid email address",
        );
    }

    if let Some(failure) = &backend.failure {
        error!("Error saving contact form {failure}");
        return detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save contact form {failure}"),
        );
    }

    let id = Uuid::new_v4();
    info!(
        %id,
        "Received contact form from: {} {} <{}>",
        form.name, form.surname, form.email
    );

    let data = json!({
        "id": id,
        "name": form.name,
        "surname": form.surname,
        "email": form.email,
    });
    backend
        .submissions
        .lock()
        .await
        .push(StoredSubmission { id, form });

    Json(json!({
        "status": "success",
        "message": "Contact form submitted successfully",
        "data": data,
    }))
    .into_response()
}

fn detail(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": detail.into() }))).into_response()
}

/// Request validation failures carry a list of issues instead of a message.
fn validation_error(kind: &str, loc: &[&str], msg: impl Into<String>) -> Response {
    let issue = json!({ "type": kind, "loc": loc, "msg": msg.into() });
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": [issue] })),
    )
        .into_response()
}
