//! Metrics module
//!
//! Prometheus counters for login attempts and token verification outcomes,
//! exposed on `GET /metrics` when enabled.

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

use crate::auth::AuthError;
use crate::token::TokenError;

lazy_static! {
    // Login metrics
    pub static ref LOGIN_ATTEMPTS: CounterVec = register_counter_vec!(
        "kitsune_login_attempts_total",
        "Login attempts",
        &["status"]  // "success", "invalid_credentials", "account_disabled", "error"
    ).unwrap();

    // Gate metrics
    pub static ref TOKEN_VERIFICATIONS: CounterVec = register_counter_vec!(
        "kitsune_token_verifications_total",
        "Token verifications performed by the authentication gate",
        &["outcome"]  // "accepted", "expired", "bad_signature", "malformed"
    ).unwrap();

    // Request metrics
    pub static ref HTTP_REQUESTS: CounterVec = register_counter_vec!(
        "kitsune_http_requests_total",
        "HTTP requests by path and status",
        &["path", "status"]
    ).unwrap();
}

/// Record a successful login
pub fn record_login_success() {
    LOGIN_ATTEMPTS.with_label_values(&["success"]).inc();
}

/// Record a failed login
pub fn record_login_failure(error: &AuthError) {
    let status = match error {
        AuthError::InvalidCredentials => "invalid_credentials",
        AuthError::AccountDisabled => "account_disabled",
        _ => "error",
    };
    LOGIN_ATTEMPTS.with_label_values(&[status]).inc();
}

/// Record a token the gate accepted
pub fn record_token_accepted() {
    TOKEN_VERIFICATIONS.with_label_values(&["accepted"]).inc();
}

/// Record a token the gate rejected
pub fn record_token_rejected(error: &TokenError) {
    let outcome = match error {
        TokenError::Expired => "expired",
        TokenError::BadSignature => "bad_signature",
        TokenError::Malformed(_) => "malformed",
    };
    TOKEN_VERIFICATIONS.with_label_values(&[outcome]).inc();
}

/// Record a handled HTTP request
pub fn record_http_request(path: &str, status: u16) {
    HTTP_REQUESTS
        .with_label_values(&[path, &status.to_string()])
        .inc();
}
