//! API Router
//!
//! Parses incoming requests into API operations. Routing is a pure
//! function of method and path; the server layer dispatches the parsed
//! operation to its handler.

use thiserror::Error;

/// Router errors
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

/// API operations
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOperation {
    /// POST /auth/login
    Login,
    /// POST /auth/logout
    Logout,
    /// POST /auth/refresh
    Refresh,
    /// GET /auth/codes
    AccessCodes,
    /// GET /user/info
    UserInfo,
    /// GET /api/health
    Health,
    /// GET /metrics
    Metrics,
}

/// Request parser
pub struct ApiRequestParser;

impl ApiRequestParser {
    /// Parse an HTTP request into an API operation
    pub fn parse(method: &str, path: &str) -> Result<ApiOperation, RouterError> {
        let expected = match path {
            "/auth/login" => ("POST", ApiOperation::Login),
            "/auth/logout" => ("POST", ApiOperation::Logout),
            "/auth/refresh" => ("POST", ApiOperation::Refresh),
            "/auth/codes" => ("GET", ApiOperation::AccessCodes),
            "/user/info" => ("GET", ApiOperation::UserInfo),
            "/api/health" => ("GET", ApiOperation::Health),
            "/metrics" => ("GET", ApiOperation::Metrics),
            _ => return Err(RouterError::NotFound(path.to_string())),
        };

        if method != expected.0 {
            return Err(RouterError::MethodNotAllowed(format!(
                "{} not allowed for {}",
                method, path
            )));
        }

        Ok(expected.1)
    }
}
