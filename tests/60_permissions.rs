mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

struct Team {
    admin: String,
    owner: String,
    member_id: String,
    member: String,
    stranger: String,
    project: String,
    milestone: String,
}

async fn team(app: &TestApp) -> Result<Team> {
    let admin = app.admin("root").await?;
    let (_, owner) = app.account(&admin, "owner", "user").await?;
    let (member_id, member) = app.account(&admin, "member", "user").await?;
    let (_, stranger) = app.account(&admin, "stranger", "user").await?;

    let project = app.project(&owner, "Team project").await?;
    let (status, _) = app
        .post(&format!("/api/projects/{project}/members"), &admin, json!({ "user_id": member_id }))
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "member add failed: {status}");
    let milestone = app.milestone(&owner, &project).await?;

    Ok(Team { admin, owner, member_id, member, stranger, project, milestone })
}

#[tokio::test]
async fn milestones_belong_to_project_owners() -> Result<()> {
    let app = TestApp::new();
    let t = team(&app).await?;
    let uri = format!("/api/milestones/{}", t.milestone);

    let (status, body) = app.get(&uri, &t.member).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PERMISSION_DENIED");
    let (status, _) = app.get(&uri, &t.owner).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.patch(&uri, &t.member, json!({ "title": "Renamed" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, &t.member).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&uri, &t.stranger).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.patch(&uri, &t.owner, json!({ "title": "Renamed" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Renamed");

    let (_, body) = app.get("/api/milestones", &t.stranger).await?;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (_, body) = app.get("/api/milestones", &t.member).await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn participants_work_on_tasks() -> Result<()> {
    let app = TestApp::new();
    let t = team(&app).await?;

    let task = app.task(&t.member, &t.milestone, "todo").await?;
    let (status, body) = app
        .patch(&format!("/api/tasks/{task}"), &t.member, json!({ "status": "in_progress" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in_progress");

    let (status, _) = app.get(&format!("/api/tasks/{task}"), &t.stranger).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/api/tasks", &t.stranger, json!({ "title": "Intruder", "milestone": t.milestone }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["milestone"].is_string());

    let (status, _) = app.delete(&format!("/api/tasks/{task}"), &t.owner).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn users_assign_only_themselves() -> Result<()> {
    let app = TestApp::new();
    let t = team(&app).await?;
    let (manager_id, manager) = app.account(&t.admin, "boss", "manager").await?;

    let (status, _) = app
        .post(
            "/api/tasks",
            &t.owner,
            json!({ "title": "Delegated", "milestone": t.milestone, "assignee": t.member_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/tasks",
            &t.member,
            json!({ "title": "Mine", "milestone": t.milestone, "assignee": t.member_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let task = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .patch(&format!("/api/tasks/{task}"), &t.member, json!({ "assignee": manager_id }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(&format!("/api/tasks/{task}"), &manager, json!({ "assignee": manager_id }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assignee"], manager_id.as_str());
    Ok(())
}

#[tokio::test]
async fn comment_and_attachment_authors_are_the_caller() -> Result<()> {
    let app = TestApp::new();
    let t = team(&app).await?;
    let (_, me) = app.get("/api/me", &t.owner).await?;
    let owner_id = me["data"]["id"].as_str().unwrap().to_string();
    let task = app.task(&t.owner, &t.milestone, "todo").await?;

    let (status, body) = app
        .post(
            "/api/comments",
            &t.member,
            json!({ "task": task, "content": "On it", "user": owner_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"], t.member_id.as_str());

    let (status, body) = app
        .post(
            "/api/attachments",
            &t.member,
            json!({
                "task": task,
                "file_name": "plan.pdf",
                "file_url": "https://files.example.com/plan.pdf",
                "uploaded_by": owner_id
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["uploaded_by"], t.member_id.as_str());
    let attachment = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post("/api/comments", &t.stranger, json!({ "task": task, "content": "Hi" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["task"].is_string());

    let (status, _) = app.get(&format!("/api/attachments/{attachment}"), &t.stranger).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/comments", &t.stranger).await?;
    assert!(body["data"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn staff_see_everything() -> Result<()> {
    let app = TestApp::new();
    let t = team(&app).await?;
    let (_, manager) = app.account(&t.admin, "boss", "manager").await?;

    let (status, _) = app.get(&format!("/api/projects/{}", t.project), &manager).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .patch(&format!("/api/milestones/{}", t.milestone), &manager, json!({ "title": "Staff edit" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/projects/not-a-uuid", &manager).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
