//! Unit tests for token verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use crate::auth::Claims;
use crate::config::JwtConfig;
use crate::jwt::{JwtError, JwtService};

fn create_test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        ..JwtConfig::default()
    })
}

fn sign(secret: &str, claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_issue_and_validate() {
    let service = create_test_service();
    let user_id = Uuid::new_v4();

    let token = service.issue(user_id, Some("me@example.com")).unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.email.as_deref(), Some("me@example.com"));
    assert_eq!(claims.role, "authenticated");
    assert_eq!(claims.aud.as_deref(), Some("authenticated"));
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    let result = service.validate_token("invalid.token.here");
    assert!(matches!(result, Err(JwtError::DecodingError(_))));
}

#[test]
fn test_wrong_secret_rejected() {
    let service = create_test_service();
    let claims = Claims::new(Uuid::new_v4(), None, "authenticated", Utc::now() + Duration::hours(1))
        .with_audience("authenticated");
    let token = sign("some-other-secret", &claims);

    assert!(matches!(
        service.validate_token(&token),
        Err(JwtError::DecodingError(_))
    ));
}

#[test]
fn test_expired_token_rejected() {
    let service = create_test_service();
    let claims = Claims::new(
        Uuid::new_v4(),
        None,
        "authenticated",
        Utc::now() - Duration::hours(2),
    )
    .with_audience("authenticated");
    let token = sign("test-secret-key-for-testing", &claims);

    assert!(matches!(service.validate_token(&token), Err(JwtError::Expired)));
}

#[test]
fn test_wrong_audience_rejected() {
    let service = create_test_service();
    let claims = Claims::new(Uuid::new_v4(), None, "anon", Utc::now() + Duration::hours(1))
        .with_audience("anon");
    let token = sign("test-secret-key-for-testing", &claims);

    assert!(matches!(
        service.validate_token(&token),
        Err(JwtError::InvalidAudience)
    ));
}

#[test]
fn test_audience_not_checked_when_unset() {
    let service = JwtService::new(JwtConfig {
        secret: "s".to_string(),
        audience: None,
        ..JwtConfig::default()
    });
    let claims = Claims::new(Uuid::new_v4(), None, "authenticated", Utc::now() + Duration::hours(1));
    let token = sign("s", &claims);

    assert!(service.validate_token(&token).is_ok());
}
