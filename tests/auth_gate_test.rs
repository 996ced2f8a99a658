//! Authentication Gate Integration Tests
//!
//! The gate never errors: every failure mode leaves the request anonymous,
//! and a valid token binds the subject and prefixed authorities.

#[cfg(test)]
mod tests {
    use hyper::header::HeaderValue;
    use hyper::HeaderMap;
    use kitsune_authr::auth::gate::{AuthGate, RequestIdentity};
    use kitsune_authr::token::TokenCodec;
    use std::collections::HashSet;
    use std::sync::Arc;

    // ========================================================================
    // Helpers
    // ========================================================================

    const SECRET: &str = "auth-gate-test-signing-secret";

    fn roles(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn gate() -> (Arc<TokenCodec>, AuthGate) {
        let codec = Arc::new(TokenCodec::new(SECRET, 3600));
        let gate = AuthGate::new(codec.clone(), "Authorization", "Bearer ");
        (codec, gate)
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    // ========================================================================
    // TEST: Anonymous outcomes
    // ========================================================================

    #[test]
    fn test_missing_header_is_anonymous() {
        let (_, gate) = gate();
        let identity = gate.resolve(&HeaderMap::new());

        assert_eq!(identity, RequestIdentity::Anonymous);
        assert!(!identity.is_authenticated());
        assert_eq!(identity.user_id(), None);
    }

    #[test]
    fn test_unprefixed_header_is_anonymous() {
        let (codec, gate) = gate();
        let token = codec.issue(1, "admin", &roles(&["admin"])).unwrap();

        let mut headers = HeaderMap::new();
        // Valid token, but no scheme marker in front of it
        headers.insert("authorization", HeaderValue::from_str(&token).unwrap());

        assert_eq!(gate.resolve(&headers), RequestIdentity::Anonymous);
    }

    #[test]
    fn test_garbage_token_is_anonymous() {
        let (_, gate) = gate();
        let identity = gate.resolve(&bearer_headers("not-a-valid-token"));
        assert_eq!(identity, RequestIdentity::Anonymous);
    }

    #[test]
    fn test_forged_token_is_anonymous() {
        let (_, gate) = gate();
        let forged = TokenCodec::new("some-other-signing-secret", 3600)
            .issue(1, "admin", &roles(&["admin"]))
            .unwrap();

        assert_eq!(gate.resolve(&bearer_headers(&forged)), RequestIdentity::Anonymous);
    }

    #[test]
    fn test_expired_token_is_anonymous() {
        let (codec, gate) = gate();
        let issued_at = chrono::Utc::now().timestamp() - 7200;
        let expired = codec
            .issue_at(1, "admin", &roles(&["admin"]), issued_at)
            .unwrap();

        assert_eq!(gate.resolve(&bearer_headers(&expired)), RequestIdentity::Anonymous);
    }

    // ========================================================================
    // TEST: Authenticated outcome
    // ========================================================================

    #[test]
    fn test_valid_token_binds_identity_and_authorities() {
        let (codec, gate) = gate();
        let token = codec.issue(5, "vben", &roles(&["admin", "user"])).unwrap();

        let identity = gate.resolve(&bearer_headers(&token));
        assert!(identity.is_authenticated());
        assert_eq!(identity.user_id(), Some(5));
        assert!(identity.has_authority("ROLE_admin"));
        assert!(identity.has_authority("ROLE_user"));
        // Raw role codes are not authorities
        assert!(!identity.has_authority("admin"));
    }

    #[test]
    fn test_configured_header_and_empty_prefix() {
        let codec = Arc::new(TokenCodec::new(SECRET, 3600));
        let gate = AuthGate::new(codec.clone(), "X-Auth-Token", "");

        let token = codec.issue(9, "jack", &roles(&["user"])).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-auth-token", HeaderValue::from_str(&token).unwrap());

        let identity = gate.resolve(&headers);
        assert_eq!(identity.user_id(), Some(9));
    }
}
