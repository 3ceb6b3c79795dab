use super::*;
use serde_json::json;

fn session(display_name: Option<&str>, email: Option<&str>) -> Session {
    Session {
        uid: "uid-1".to_owned(),
        display_name: display_name.map(str::to_owned),
        email: email.map(str::to_owned),
        photo_url: Some("https://img.test/a.png".to_owned()),
    }
}

// =============================================================
// UserRole
// =============================================================

#[test]
fn user_role_deserializes_known_values() {
    let roles: Vec<UserRole> = serde_json::from_value(json!(["user", "instructor", "admin"])).unwrap();
    assert_eq!(roles, vec![UserRole::User, UserRole::Instructor, UserRole::Admin]);
}

#[test]
fn user_role_rejects_unknown_value() {
    let err = serde_json::from_value::<UserRole>(json!("superuser"));
    assert!(err.is_err());
}

#[test]
fn user_role_display_matches_wire_name() {
    assert_eq!(UserRole::Instructor.to_string(), "instructor");
    assert_eq!(UserRole::default(), UserRole::User);
}

// =============================================================
// UserRecord
// =============================================================

#[test]
fn user_record_optional_fields_default_to_none() {
    let record: UserRecord = serde_json::from_value(json!({
        "id": "u1",
        "email": "a@b.test",
        "name": "Ann",
        "user_type": "instructor"
    }))
    .unwrap();
    assert_eq!(record.user_type, UserRole::Instructor);
    assert!(record.profile_image.is_none());
    assert!(record.description.is_none());
}

#[test]
fn user_record_rejects_unknown_role() {
    let result = serde_json::from_value::<UserRecord>(json!({
        "id": "u1",
        "email": "a@b.test",
        "name": "Ann",
        "user_type": "owner"
    }));
    assert!(result.is_err());
}

// =============================================================
// CreateUserPayload
// =============================================================

#[test]
fn payload_from_session_uses_display_name() {
    let payload = CreateUserPayload::from_session(&session(Some("Nok Swim"), Some("nok@pool.test")));
    assert_eq!(payload.id, "uid-1");
    assert_eq!(payload.name, "Nok Swim");
    assert_eq!(payload.email, "nok@pool.test");
    assert_eq!(payload.profile_image.as_deref(), Some("https://img.test/a.png"));
    assert_eq!(payload.user_type, UserRole::User);
}

#[test]
fn payload_from_session_falls_back_to_email_local_part() {
    let payload = CreateUserPayload::from_session(&session(Some("  "), Some("nok@pool.test")));
    assert_eq!(payload.name, "nok");
}

#[test]
fn payload_from_session_without_name_or_email() {
    let payload = CreateUserPayload::from_session(&session(None, None));
    assert_eq!(payload.name, FALLBACK_DISPLAY_NAME);
    assert_eq!(payload.email, "");
}

#[test]
fn payload_serialization_skips_absent_optionals() {
    let mut payload = CreateUserPayload::from_session(&session(Some("Ann"), Some("a@b.test")));
    payload.profile_image = None;
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        value,
        json!({ "id": "uid-1", "email": "a@b.test", "name": "Ann", "user_type": "user" })
    );
}
