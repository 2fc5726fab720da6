//! Token issuance and verification tests

mod common;

use campus_access::auth::jwt::JwtService;
use common::create_test_config;

fn service() -> JwtService {
    JwtService::from_config(&create_test_config()).expect("JWT service should build")
}

#[test]
fn test_access_token_round_trip() {
    let jwt = service();

    let token = jwt
        .issue_access_token(
            7,
            "docente@campus.edu",
            "instructor",
            vec!["instructor".to_string()],
            vec!["crear_evento".to_string(), "crear_noticia".to_string()],
        )
        .unwrap();

    let claims = jwt.verify_access_token(&token).unwrap();
    assert_eq!(claims.sub, "7");
    assert_eq!(claims.email, "docente@campus.edu");
    assert_eq!(claims.role, "instructor");
    assert_eq!(claims.permissions.len(), 2);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_refresh_token_round_trip() {
    let jwt = service();

    let token = jwt.issue_refresh_token(7).unwrap();
    assert_eq!(jwt.verify_refresh_token(&token).unwrap(), 7);
}

#[test]
fn test_token_classes_are_not_interchangeable() {
    let jwt = service();

    let access = jwt
        .issue_access_token(7, "a@x.com", "applicant", vec![], vec![])
        .unwrap();
    let refresh = jwt.issue_refresh_token(7).unwrap();

    // Signed with independent secrets; neither verifies as the other
    assert!(jwt.verify_refresh_token(&access).is_err());
    assert!(jwt.verify_access_token(&refresh).is_err());
}

#[test]
fn test_tampered_token_is_rejected() {
    let jwt = service();

    let mut token = jwt
        .issue_access_token(7, "a@x.com", "applicant", vec![], vec![])
        .unwrap();
    token.push('x');

    assert!(jwt.verify_access_token(&token).is_err());
}

#[test]
fn test_token_pair_reports_access_expiry() {
    let jwt = service();

    let pair = jwt
        .issue_token_pair(7, "a@x.com", "staff", vec!["staff".to_string()], vec![])
        .unwrap();

    assert_eq!(pair.expires_in, 300);
    assert!(!pair.access_token.is_empty());
    assert!(!pair.refresh_token.is_empty());
}
