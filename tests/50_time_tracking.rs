mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

async fn setup(app: &TestApp) -> Result<(String, String)> {
    let admin = app.admin("root").await?;
    let project = app.project(&admin, "Hours").await?;
    let milestone = app.milestone(&admin, &project).await?;
    let task = app.task(&admin, &milestone, "in_progress").await?;
    Ok((admin, task))
}

#[tokio::test]
async fn hours_accumulate() -> Result<()> {
    let app = TestApp::new();
    let (admin, task) = setup(&app).await?;
    let uri = format!("/api/tasks/{task}/log_time");

    let (status, body) = app.post(&uri, &admin, json!({ "hours": 1 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["logged_hours"], 1.0);

    let (status, body) = app.post(&uri, &admin, json!({ "hours": "2.5" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["logged_hours"], 3.5);

    let (_, body) = app.get(&format!("/api/tasks/{task}"), &admin).await?;
    assert_eq!(body["data"]["logged_hours"], 3.5);
    Ok(())
}

#[tokio::test]
async fn invalid_hours_are_rejected() -> Result<()> {
    let app = TestApp::new();
    let (admin, task) = setup(&app).await?;
    let uri = format!("/api/tasks/{task}/log_time");

    for body in [json!({ "hours": 0 }), json!({ "hours": -1 }), json!({}), json!({ "hours": "abc" })] {
        let (status, res) = app.post(&uri, &admin, body.clone()).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(res["field_errors"]["hours"].is_string(), "{body}");
    }

    let (_, res) = app.post(&uri, &admin, json!({ "hours": -1 })).await?;
    assert_eq!(res["field_errors"]["hours"], "Hours must be greater than 0");

    // positive but finer than the column allows
    let (status, res) = app.post(&uri, &admin, json!({ "hours": 0.004 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["field_errors"]["hours"], "Hours can have at most 2 decimal places.");

    let (_, body) = app.get(&format!("/api/tasks/{task}"), &admin).await?;
    assert_eq!(body["data"]["logged_hours"], 0.0);
    Ok(())
}

#[tokio::test]
async fn total_cannot_exceed_column_capacity() -> Result<()> {
    let app = TestApp::new();
    let (admin, task) = setup(&app).await?;
    let uri = format!("/api/tasks/{task}/log_time");

    let (status, _) = app.post(&uri, &admin, json!({ "hours": 999.99 })).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post(&uri, &admin, json!({ "hours": 0.01 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/tasks/{task}"), &admin).await?;
    assert_eq!(body["data"]["logged_hours"], 999.99);
    Ok(())
}

#[tokio::test]
async fn updates_cannot_touch_logged_hours() -> Result<()> {
    let app = TestApp::new();
    let (admin, task) = setup(&app).await?;

    app.post(&format!("/api/tasks/{task}/log_time"), &admin, json!({ "hours": 4 }))
        .await?;

    let (status, body) = app
        .patch(&format!("/api/tasks/{task}"), &admin, json!({ "logged_hours": 40, "status": "done" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "done");
    assert_eq!(body["data"]["logged_hours"], 4.0);
    Ok(())
}

#[tokio::test]
async fn members_can_log_time_strangers_cannot() -> Result<()> {
    let app = TestApp::new();
    let (admin, task) = setup(&app).await?;
    let (_, stranger) = app.account(&admin, "stranger", "user").await?;

    let (status, _) = app
        .post(&format!("/api/tasks/{task}/log_time"), &stranger, json!({ "hours": 1 }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
