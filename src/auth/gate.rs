//! Authentication gate
//!
//! Per-request hook that turns a bearer token into a resolved identity.
//! The gate never rejects a request: a missing, malformed, expired, or
//! forged token leaves the request anonymous, and route-level policy
//! downstream decides whether an anonymous caller may proceed.

use std::collections::HashSet;
use std::sync::Arc;

use hyper::HeaderMap;
use tracing::debug;

use crate::config::TokenConfig;
use crate::metrics;
use crate::token::TokenCodec;

/// Marker prepended to role codes when they become request authorities
pub const ROLE_PREFIX: &str = "ROLE_";

/// Identity resolved for a single request
///
/// Owned by the request's processing lifetime; never shared across
/// requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestIdentity {
    Anonymous,
    Authenticated {
        user_id: i64,
        username: String,
        /// Role codes prefixed with [`ROLE_PREFIX`]
        authorities: HashSet<String>,
    },
}

impl RequestIdentity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, RequestIdentity::Authenticated { .. })
    }

    /// Resolved user id, if any
    pub fn user_id(&self) -> Option<i64> {
        match self {
            RequestIdentity::Authenticated { user_id, .. } => Some(*user_id),
            RequestIdentity::Anonymous => None,
        }
    }

    /// Whether this identity carries the given authority
    pub fn has_authority(&self, authority: &str) -> bool {
        match self {
            RequestIdentity::Authenticated { authorities, .. } => {
                authorities.contains(authority)
            }
            RequestIdentity::Anonymous => false,
        }
    }
}

/// Authentication gate
///
/// Extracts a candidate token from the configured header, strips the
/// configured prefix, and delegates to the token codec.
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    header_name: String,
    token_prefix: String,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, header_name: &str, token_prefix: &str) -> Self {
        Self {
            codec,
            header_name: header_name.to_string(),
            token_prefix: token_prefix.to_string(),
        }
    }

    pub fn from_config(codec: Arc<TokenCodec>, config: &TokenConfig) -> Self {
        Self::new(codec, &config.header_name, &config.token_prefix)
    }

    /// Extract the candidate token from request headers
    ///
    /// A missing header, a non-UTF8 value, or a value not carrying the
    /// configured prefix all yield `None`.
    fn extract_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get(self.header_name.as_str())?
            .to_str()
            .ok()?
            .strip_prefix(self.token_prefix.as_str())
    }

    /// Resolve the identity for one request
    ///
    /// Verification failures are logged and counted, never surfaced.
    pub fn resolve(&self, headers: &HeaderMap) -> RequestIdentity {
        let Some(token) = self.extract_token(headers) else {
            return RequestIdentity::Anonymous;
        };

        match self.codec.verify(token) {
            Ok(claims) => {
                metrics::record_token_accepted();
                debug!(username = %claims.sub, "request authenticated");

                RequestIdentity::Authenticated {
                    user_id: claims.uid,
                    username: claims.sub,
                    authorities: claims
                        .roles
                        .iter()
                        .map(|role| format!("{ROLE_PREFIX}{role}"))
                        .collect(),
                }
            }
            Err(e) => {
                metrics::record_token_rejected(&e);
                debug!(error = %e, "token rejected, continuing anonymously");
                RequestIdentity::Anonymous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn gate(secret: &str) -> AuthGate {
        AuthGate::new(
            Arc::new(TokenCodec::new(secret, 3600)),
            "Authorization",
            "Bearer ",
        )
    }

    #[test]
    fn test_no_header_resolves_anonymous() {
        let identity = gate("gate-secret").resolve(&HeaderMap::new());
        assert_eq!(identity, RequestIdentity::Anonymous);
    }

    #[test]
    fn test_wrong_prefix_resolves_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc"));

        let identity = gate("gate-secret").resolve(&headers);
        assert_eq!(identity, RequestIdentity::Anonymous);
    }

    #[test]
    fn test_valid_token_resolves_authorities() {
        let codec = Arc::new(TokenCodec::new("gate-secret", 3600));
        let gate = AuthGate::new(codec.clone(), "Authorization", "Bearer ");

        let roles = HashSet::from(["admin".to_string()]);
        let token = codec.issue(3, "carol", &roles).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let identity = gate.resolve(&headers);
        assert_eq!(identity.user_id(), Some(3));
        assert!(identity.has_authority("ROLE_admin"));
        assert!(!identity.has_authority("admin"));
    }
}
