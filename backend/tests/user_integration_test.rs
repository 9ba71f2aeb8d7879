//! Integration tests for user and teacher lookups

mod common;

use axum::http::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_find_user() {
    let app = common::TestApp::new().await;
    let (id, token) = app.signup("toto@mail.com").await;

    let (status, response) = app.get(&format!("/api/user/{}", id), Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(response["email"], "toto@mail.com");
    assert_eq!(response["firstName"], "toto");
}

#[tokio::test]
async fn test_find_user_absent_and_malformed() {
    let app = common::TestApp::new().await;
    let (_, token) = app.signup("toto@mail.com").await;

    let (status, _) = app.get("/api/user/99", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/user/abc", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_other_account_is_forbidden() {
    let app = common::TestApp::new().await;
    let (_, token) = app.signup("toto@mail.com").await;

    let (status, _) = app.delete("/api/user/1", Some(&token)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_own_account_removes_enrollments() {
    let app = common::TestApp::new().await;
    let (_, admin) = app.admin_login().await;
    let (id, token) = app.signup("toto@mail.com").await;
    let session_id = app.create_session(&admin, &[id]).await;

    let (status, _) = app.delete(&format!("/api/user/{}", id), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/user/{}", id), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.roster(session_id, &admin).await.is_empty());
}

#[tokio::test]
async fn test_teacher_directory() {
    let app = common::TestApp::new().await;
    let (_, token) = app.signup("toto@mail.com").await;

    let (status, response) = app.get("/api/teacher", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let teachers: Vec<Value> = serde_json::from_str(&response).unwrap();
    assert_eq!(teachers.len(), 2);
    assert_eq!(teachers[0]["lastName"], "DELAHAYE");

    let (status, response) = app.get("/api/teacher/2", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let teacher: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(teacher["firstName"], "Hélène");

    let (status, _) = app.get("/api/teacher/9", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/teacher/x", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
