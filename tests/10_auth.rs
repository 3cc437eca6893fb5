mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, PASSWORD};

#[tokio::test]
async fn root_and_health_are_public() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.request(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_token() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/api/projects", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.get("/api/me", "not-a-token").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_returns_a_working_token_pair() -> Result<()> {
    let app = TestApp::new();
    app.admin("root").await?;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "root", "password": PASSWORD })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["access"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh"].as_str().unwrap().to_string();

    let (status, me) = app.get("/api/me", &access).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["username"], "root");
    assert_eq!(me["data"]["role"], "admin");
    assert!(me["data"].get("password_hash").is_none());

    // refresh tokens are not access tokens
    let (status, _) = app.get("/api/me", &refresh).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::POST, "/api/token/refresh", None, Some(json!({ "refresh": refresh })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let renewed = body["data"]["access"].as_str().unwrap();
    let (status, _) = app.get("/api/me", renewed).await?;
    assert_eq!(status, StatusCode::OK);

    // ...and access tokens are not refresh tokens
    let (status, _) = app
        .request(Method::POST, "/api/token/refresh", None, Some(json!({ "refresh": access })))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let app = TestApp::new();
    app.admin("root").await?;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "root", "password": "nope-nope-nope" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn malformed_json_uses_the_error_envelope() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app
        .request(Method::POST, "/api/login", None, Some(json!({ "username": 42 })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn user_tasks_lists_only_assigned_work() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin("root").await?;
    let (alice_id, alice) = app.account(&admin, "alice", "user").await?;
    let (_, manager) = app.account(&admin, "boss", "manager").await?;

    let project = app.project(&admin, "Launch").await?;
    let milestone = app.milestone(&admin, &project).await?;
    let (status, _) = app
        .post(
            "/api/tasks",
            &admin,
            json!({ "title": "Hers", "milestone": milestone, "assignee": alice_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    app.task(&admin, &milestone, "todo").await?;

    let (status, body) = app.get("/api/user/tasks", &alice).await?;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Hers");

    let (_, body) = app.get("/api/user/tasks", &manager).await?;
    assert!(body["data"].as_array().unwrap().is_empty());

    Ok(())
}
