//! DTO serialization and domain model tests

use campus_access::models::{
    role::{AssignPermissionsRequest, PermissionRef},
    user::{LoginResponse, RegisterRequest, UserRole},
};
use campus_access::services::grant_service::parse_expiry;

#[test]
fn test_register_request_accepts_camel_case() {
    let req: RegisterRequest = serde_json::from_str(
        r#"{
            "firstName": "Ana",
            "lastName": "Lopez",
            "email": "ana@campus.edu",
            "password": "secret123",
            "document": "1002003004",
            "role": "instructor"
        }"#,
    )
    .unwrap();

    assert_eq!(req.first_name, "Ana");
    assert_eq!(req.role.as_deref(), Some("instructor"));
}

#[test]
fn test_register_request_role_is_optional() {
    let req: RegisterRequest = serde_json::from_str(
        r#"{
            "firstName": "Ana",
            "lastName": "Lopez",
            "email": "ana@campus.edu",
            "password": "secret123",
            "document": "1002003004"
        }"#,
    )
    .unwrap();

    assert!(req.role.is_none());
}

#[test]
fn test_permission_refs_mix_ids_and_names() {
    let req: AssignPermissionsRequest = serde_json::from_str(
        r#"{
            "userId": 9,
            "permissions": [1, "crear_noticia", 3],
            "expiresAt": "2030-06-01T00:00:00Z"
        }"#,
    )
    .unwrap();

    assert_eq!(req.permissions[0], PermissionRef::ById(1));
    assert_eq!(
        req.permissions[1],
        PermissionRef::ByName("crear_noticia".to_string())
    );
    assert_eq!(req.permissions[2], PermissionRef::ById(3));
}

#[test]
fn test_permission_ref_path_parse() {
    assert_eq!(PermissionRef::parse("17"), PermissionRef::ById(17));
    assert_eq!(
        PermissionRef::parse("crear_evento"),
        PermissionRef::ByName("crear_evento".to_string())
    );
}

#[test]
fn test_role_semantics() {
    assert!(UserRole::Instructor.requires_validation());
    assert!(UserRole::Staff.requires_validation());
    assert!(!UserRole::Applicant.requires_validation());
    assert_eq!(UserRole::parse("Administrator"), Some(UserRole::Administrator));
    assert_eq!(UserRole::parse("root"), None);
}

#[test]
fn test_expiry_accepts_all_wire_shapes() {
    assert!(parse_expiry("2030-01-15T10:00:00Z").is_ok());
    assert!(parse_expiry("2030-01-15 10:00:00").is_ok());
    assert!(parse_expiry("2030-01-15").is_ok());
    assert!(parse_expiry("next week").is_err());
}

#[test]
fn test_login_response_serializes_camel_case() {
    use campus_access::models::user::{User, UserWithAccess};
    use chrono::Utc;

    let user = User {
        id: 1,
        first_name: "Ana".to_string(),
        last_name: "Lopez".to_string(),
        email: "ana@campus.edu".to_string(),
        document: "1002003004".to_string(),
        password_hash: "$argon2id$secret".to_string(),
        role: "applicant".to_string(),
        status: "active".to_string(),
        photo_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let response = LoginResponse {
        access_token: "at".to_string(),
        refresh_token: "rt".to_string(),
        expires_in: 28800,
        user: UserWithAccess {
            user: user.into(),
            roles: vec!["applicant".to_string()],
            permissions: vec![],
        },
    };

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["accessToken"], "at");
    assert_eq!(json["refreshToken"], "rt");
    assert_eq!(json["expiresIn"], 28800);
    assert_eq!(json["user"]["firstName"], "Ana");
    // The stored hash never leaves the server
    assert!(json["user"].get("passwordHash").is_none());
    assert!(json["user"].get("password_hash").is_none());
}
