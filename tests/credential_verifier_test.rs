//! Credential Verifier Integration Tests
//!
//! Covers username enumeration resistance, the disabled-account case, and
//! the login-to-token composition.

#[cfg(test)]
mod tests {
    use kitsune_authr::auth::password::{hash_password, Argon2Matcher};
    use kitsune_authr::auth::service::AuthService;
    use kitsune_authr::auth::{AuthError, UserRecord};
    use kitsune_authr::directory::MemoryDirectory;
    use kitsune_authr::token::TokenCodec;
    use std::collections::HashSet;
    use std::sync::Arc;

    // ========================================================================
    // Helpers
    // ========================================================================

    const SECRET: &str = "credential-test-signing-secret";

    fn record(id: i64, username: &str, password: &str, enabled: bool) -> UserRecord {
        UserRecord {
            id,
            username: username.into(),
            password_hash: hash_password(password).unwrap(),
            real_name: username.to_uppercase(),
            home_path: "/dashboard".into(),
            roles: HashSet::from(["user".to_string()]),
            enabled,
        }
    }

    fn service() -> AuthService {
        let directory = MemoryDirectory::from_records(vec![
            record(1, "realuser", "correcthorse", true),
            record(2, "disableduser", "correcthorse", false),
        ]);

        AuthService::new(
            Arc::new(directory),
            Arc::new(Argon2Matcher),
            Arc::new(TokenCodec::new(SECRET, 3600)),
        )
    }

    // ========================================================================
    // TEST: Enumeration resistance
    // ========================================================================

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_fail_identically() {
        let service = service();

        let ghost = service.authenticate("ghost", "anything").await;
        let mismatch = service.authenticate("realuser", "wrongpassword").await;

        let ghost_err = ghost.expect_err("unknown user must fail");
        let mismatch_err = mismatch.expect_err("wrong password must fail");

        assert!(matches!(ghost_err, AuthError::InvalidCredentials));
        assert!(matches!(mismatch_err, AuthError::InvalidCredentials));
        // Rendered messages must carry no distinguishing signal either
        assert_eq!(ghost_err.to_string(), mismatch_err.to_string());
    }

    // ========================================================================
    // TEST: Disabled accounts
    // ========================================================================

    #[tokio::test]
    async fn test_disabled_account_with_correct_password() {
        let service = service();

        let result = service.authenticate("disableduser", "correcthorse").await;
        assert!(matches!(result, Err(AuthError::AccountDisabled)));
    }

    #[tokio::test]
    async fn test_disabled_account_with_wrong_password_reads_as_invalid() {
        // The enabled flag is only revealed once the password matches
        let service = service();

        let result = service.authenticate("disableduser", "wrongpassword").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    // ========================================================================
    // TEST: Success path
    // ========================================================================

    #[tokio::test]
    async fn test_authenticate_returns_full_record() {
        let service = service();

        let user = service
            .authenticate("realuser", "correcthorse")
            .await
            .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.username, "realuser");
        assert!(user.roles.contains("user"));
    }

    #[tokio::test]
    async fn test_login_token_carries_identity() {
        let service = service();

        let token = service.login("realuser", "correcthorse").await.unwrap();
        let claims = TokenCodec::new(SECRET, 3600).verify(&token).unwrap();

        assert_eq!(claims.uid, 1);
        assert_eq!(claims.sub, "realuser");
        assert!(claims.roles.contains("user"));
    }
}
