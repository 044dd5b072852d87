//! Integration tests for login.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_login_after_create_issues_token_for_the_new_user(pool: PgPool) {
    // Arrange
    let app = common::build_test_app(pool).await;
    let (_, created) = common::post_json(
        &app,
        "/api/v1/user",
        &json!({ "nickname": "test", "email": "user@test.com", "password": "123" }),
    )
    .await;

    // Act
    let (status, json) = common::post_json(
        &app,
        "/api/v1/auth/token",
        &json!({ "nickname": "test", "password": "123" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let claims = app.tokens.verify(json["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, created["data"]["id"].as_str().unwrap());
    assert_eq!(claims.nick_name, "test");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_login_with_wrong_password_is_401(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    common::post_json(
        &app,
        "/api/v1/user",
        &json!({ "nickname": "test", "email": "user@test.com", "password": "123" }),
    )
    .await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/token",
        &json!({ "nickname": "test", "password": "wrong" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
