use domain::ActorContext;
use park_auth::{AuthError, JwtManager};

fn admin() -> ActorContext {
    ActorContext::new("user-admin", "admin", vec!["admin".to_string()])
}

#[test]
fn jwt_issue_and_decode() {
    let jwt = JwtManager::new("secret".to_string(), 3600, 7200);
    let tokens = jwt.issue_tokens(&admin()).expect("tokens");

    let access_ctx = jwt.decode_access(&tokens.access_token).expect("access");
    let refresh_ctx = jwt.decode_refresh(&tokens.refresh_token).expect("refresh");

    assert_eq!(access_ctx.user_id, "user-admin");
    assert_eq!(access_ctx.username, "admin");
    assert_eq!(access_ctx.roles, vec!["admin".to_string()]);
    assert_eq!(refresh_ctx.user_id, "user-admin");
}

#[test]
fn token_types_are_not_interchangeable() {
    let jwt = JwtManager::new("secret".to_string(), 3600, 7200);
    let tokens = jwt.issue_tokens(&admin()).expect("tokens");

    assert!(matches!(
        jwt.decode_access(&tokens.refresh_token),
        Err(AuthError::TokenInvalid)
    ));
    assert!(matches!(
        jwt.decode_refresh(&tokens.access_token),
        Err(AuthError::TokenInvalid)
    ));
}

#[test]
fn foreign_secret_is_rejected() {
    let issuer = JwtManager::new("secret".to_string(), 3600, 7200);
    let verifier = JwtManager::new("other".to_string(), 3600, 7200);
    let tokens = issuer.issue_tokens(&admin()).expect("tokens");

    assert!(matches!(
        verifier.decode_access(&tokens.access_token),
        Err(AuthError::TokenInvalid)
    ));
    assert!(matches!(
        verifier.decode_access("not-a-token"),
        Err(AuthError::TokenInvalid)
    ));
}
