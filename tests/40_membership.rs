mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

fn usernames(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn only_plain_users_can_join() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin("root").await?;
    let (manager_id, _) = app.account(&admin, "boss", "manager").await?;
    let (other_admin_id, _) = app.account(&admin, "second", "admin").await?;

    let project = app.project(&admin, "Roles").await?;
    let uri = format!("/api/projects/{project}/members");

    for candidate in [&manager_id, &other_admin_id] {
        let (status, body) = app.post(&uri, &admin, json!({ "user_id": candidate })).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["user_id"].is_string());
    }

    let (status, body) = app
        .post(&uri, &admin, json!({ "user_id": "00000000-0000-0000-0000-000000000000" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["user_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn a_user_joins_at_most_two_projects() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin("root").await?;
    let (alice_id, _) = app.account(&admin, "alice", "user").await?;

    let mut projects = Vec::new();
    for name in ["One", "Two", "Three"] {
        projects.push(app.project(&admin, name).await?);
    }

    for project in &projects[..2] {
        let (status, _) = app
            .post(&format!("/api/projects/{project}/members"), &admin, json!({ "user_id": alice_id }))
            .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .post(&format!("/api/projects/{}/members", projects[2]), &admin, json!({ "user_id": alice_id }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["user_id"].as_str().unwrap().contains("maximum"));

    // leaving a project frees a slot
    let (status, _) = app
        .delete(&format!("/api/projects/{}/members/{alice_id}", projects[0]), &admin)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .post(&format!("/api/projects/{}/members", projects[2]), &admin, json!({ "user_id": alice_id }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn duplicates_and_owners_are_rejected() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin("root").await?;
    let (alice_id, alice) = app.account(&admin, "alice", "user").await?;
    let (bob_id, _) = app.account(&admin, "bob", "user").await?;

    let project = app.project(&alice, "Alice's").await?;
    let uri = format!("/api/projects/{project}/members");

    let (status, body) = app.post(&uri, &admin, json!({ "user_id": alice_id })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["user_id"].as_str().unwrap().contains("owner"));

    let (status, _) = app.post(&uri, &admin, json!({ "user_id": bob_id })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.post(&uri, &admin, json!({ "user_id": bob_id })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["user_id"].as_str().unwrap().contains("already a member"));

    let (status, body) = app.get(&uri, &admin).await?;
    assert_eq!(status, StatusCode::OK);
    let members = body["data"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user"]["username"], "bob");
    Ok(())
}

#[tokio::test]
async fn available_users_excludes_members_owner_staff_and_full_users() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin("root").await?;
    let (_, owner) = app.account(&admin, "owner", "user").await?;
    let (member_id, _) = app.account(&admin, "member", "user").await?;
    let (busy_id, _) = app.account(&admin, "busy", "user").await?;
    app.account(&admin, "free", "user").await?;
    app.account(&admin, "boss", "manager").await?;

    let project = app.project(&owner, "Target").await?;
    app.post(&format!("/api/projects/{project}/members"), &admin, json!({ "user_id": member_id }))
        .await?;
    for name in ["Elsewhere A", "Elsewhere B"] {
        let other = app.project(&admin, name).await?;
        app.post(&format!("/api/projects/{other}/members"), &admin, json!({ "user_id": busy_id }))
            .await?;
    }

    let (status, body) = app
        .get(&format!("/api/projects/{project}/available-users"), &admin)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usernames(&body), vec!["free"]);
    Ok(())
}

#[tokio::test]
async fn membership_management_is_staff_only() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin("root").await?;
    let (_, owner) = app.account(&admin, "owner", "user").await?;
    let (bob_id, _) = app.account(&admin, "bob", "user").await?;
    let (_, manager) = app.account(&admin, "boss", "manager").await?;

    let project = app.project(&owner, "Owned").await?;
    let uri = format!("/api/projects/{project}/members");

    // owning the project is not enough
    let (status, body) = app.post(&uri, &owner, json!({ "user_id": bob_id })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PERMISSION_DENIED");
    let (status, _) = app.get(&uri, &owner).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post(&uri, &manager, json!({ "user_id": bob_id })).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.delete(&format!("{uri}/{bob_id}"), &manager).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("{uri}/{bob_id}"), &manager).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
