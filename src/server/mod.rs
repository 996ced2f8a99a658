//! HTTP server module
//!
//! Accepts connections, resolves the caller's identity through the
//! authentication gate, and dispatches parsed operations to their
//! handlers. Route policy lives here: operations on protected paths are
//! refused with 401 when the gate left the request anonymous.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use crate::auth::gate::AuthGate;
use crate::auth::password::Argon2Matcher;
use crate::auth::service::AuthService;
use crate::auth::AuthError;
use crate::config::Config;
use crate::directory::{DirectoryError, MemoryDirectory};
use crate::metrics;
use crate::router::{ApiOperation, ApiRequestParser, RouterError};
use crate::token::TokenCodec;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Failed to build user directory: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Login request body
#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Shared per-process state, immutable after startup
struct AppState {
    gate: AuthGate,
    service: AuthService,
    metrics_enabled: bool,
}

/// HTTP Server
pub struct Server {
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Server {
    /// Create a new server instance
    ///
    /// Validates the configuration, hashes the configured users into the
    /// in-memory directory, and wires the codec, verifier and gate.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config.validate()?;

        let addr: SocketAddr = config
            .server
            .address
            .parse()
            .map_err(|e| ServerError::BindError(format!("{}", e)))?;

        let codec = Arc::new(TokenCodec::from_config(&config.token));
        let directory = Arc::new(MemoryDirectory::from_config(&config.users)?);
        let service = AuthService::new(directory, Arc::new(Argon2Matcher), codec.clone());
        let gate = AuthGate::from_config(codec, &config.token);

        Ok(Self {
            addr,
            state: Arc::new(AppState {
                gate,
                service,
                metrics_enabled: config.metrics.enabled,
            }),
            shutdown_tx: None,
            server_handle: None,
        })
    }

    /// Start the server
    ///
    /// Returns the actual bound address (useful when using port 0)
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(self.addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            run_server(listener, shutdown_rx, state).await;
        });

        self.server_handle = Some(handle);

        info!("Listening on {}", addr);
        Ok(addr)
    }

    /// Shutdown the server
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }

    /// Run until interrupted
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.start().await?;

        tokio::signal::ctrl_c().await?;

        info!("Shutting down server");
        self.shutdown().await;
        Ok(())
    }
}

/// Run the HTTP server loop
async fn run_server(
    listener: TcpListener,
    mut shutdown_rx: oneshot::Receiver<()>,
    state: Arc<AppState>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                handle_request(state.clone(), req)
                            });
                            let _ = http1::Builder::new()
                                .serve_connection(io, service)
                                .await;
                        });
                    }
                    Err(_) => continue,
                }
            }
        }
    }
}

/// Handle HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();

    let response = match ApiRequestParser::parse(req.method().as_str(), &path) {
        Ok(op) => dispatch(&state, op, req).await,
        Err(RouterError::NotFound(_)) => failure(StatusCode::NOT_FOUND, "Not found"),
        Err(RouterError::MethodNotAllowed(_)) => {
            failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
    };

    metrics::record_http_request(&path, response.status().as_u16());
    Ok(response)
}

/// Dispatch a parsed operation
///
/// The gate runs on every request; protected operations additionally
/// require that it resolved an identity.
async fn dispatch(
    state: &AppState,
    op: ApiOperation,
    req: Request<hyper::body::Incoming>,
) -> Response<Full<Bytes>> {
    let identity = state.gate.resolve(req.headers());

    match op {
        ApiOperation::Login => handle_login(state, req).await,
        ApiOperation::Logout => {
            // Stateless tokens: the client discards its copy, nothing to do.
            success(Value::Null)
        }
        ApiOperation::Refresh => success(json!("Token refreshed")),
        ApiOperation::AccessCodes => match identity.user_id() {
            Some(user_id) => match state.service.access_codes(user_id).await {
                Ok(codes) => success(json!(codes)),
                Err(e) => auth_failure(&e),
            },
            None => failure(StatusCode::UNAUTHORIZED, "Authentication required"),
        },
        ApiOperation::UserInfo => match identity.user_id() {
            Some(user_id) => match state.service.user_info(user_id).await {
                Ok(user_info) => success(json!(user_info)),
                Err(e) => auth_failure(&e),
            },
            None => failure(StatusCode::UNAUTHORIZED, "Authentication required"),
        },
        ApiOperation::Health => success(json!({
            "status": "UP",
            "application": "kitsune-authr",
        })),
        ApiOperation::Metrics => {
            if state.metrics_enabled {
                metrics_response()
            } else {
                failure(StatusCode::NOT_FOUND, "Not found")
            }
        }
    }
}

/// Handle POST /auth/login
async fn handle_login(
    state: &AppState,
    req: Request<hyper::body::Incoming>,
) -> Response<Full<Bytes>> {
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return failure(StatusCode::BAD_REQUEST, "Failed to read request body"),
    };

    let login: LoginRequest = match serde_json::from_slice(&body) {
        Ok(login) => login,
        Err(_) => return failure(StatusCode::BAD_REQUEST, "Invalid login payload"),
    };

    if login.username.trim().is_empty() || login.password.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Username and password are required");
    }

    match state.service.login(&login.username, &login.password).await {
        Ok(token) => success(json!({ "accessToken": token })),
        Err(e) => auth_failure(&e),
    }
}

/// Map an authentication error onto the uniform failure envelope
fn auth_failure(error: &AuthError) -> Response<Full<Bytes>> {
    match error {
        AuthError::InvalidCredentials | AuthError::AccountDisabled => {
            failure(StatusCode::UNAUTHORIZED, &error.to_string())
        }
        AuthError::UserNotFound => failure(StatusCode::NOT_FOUND, &error.to_string()),
        AuthError::Token(_) => failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

/// Uniform response envelope
fn envelope(status: StatusCode, code: i32, data: Value, message: &str) -> Response<Full<Bytes>> {
    let body = json!({
        "code": code,
        "data": data,
        "message": message,
    });

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn success(data: Value) -> Response<Full<Bytes>> {
    envelope(StatusCode::OK, 0, data, "ok")
}

fn failure(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    envelope(status, -1, Value::Null, message)
}

/// Handle GET /metrics
fn metrics_response() -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics");
    }

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", encoder.format_type())
        .body(Full::new(Bytes::from(buffer)))
        .unwrap()
}
