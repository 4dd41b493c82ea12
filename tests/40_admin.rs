mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{project_body, TestApp};

#[tokio::test]
async fn admin_routes_refuse_students() {
    let app = TestApp::new().await;
    let (_, student) = app.user("ada", "student").await;

    let (status, body) = app.post("/api/admin/roles", &student, json!({ "name": "mentor" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn role_in_use_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (_, admin) = app.user("root", "admin").await;
    let (ada, _) = app.user("ada", "student").await;

    let (status, body) = app.post("/api/admin/roles", &admin, json!({ "name": "Mentor" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "mentor");
    let role_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{}/role", ada),
            Some(admin.as_str()),
            Some(json!({ "role": "mentor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "mentor");

    let (status, _) = app.delete(&format!("/api/admin/roles/{}", role_id), &admin).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn promoted_user_gains_admin_rights_without_new_token() {
    let app = TestApp::new().await;
    let (_, admin) = app.user("root", "admin").await;
    let (ada, ada_token) = app.user("ada", "student").await;

    app.request(
        Method::PUT,
        &format!("/api/admin/users/{}/role", ada),
        Some(admin.as_str()),
        Some(json!({ "role": "admin" })),
    )
    .await;

    let (status, _) = app.post("/api/cohorts", &ada_token, json!({ "name": "Spring" })).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn deleting_a_user_hands_projects_to_the_admin() {
    let app = TestApp::new().await;
    let (admin_id, admin) = app.user("root", "admin").await;
    let (ada_id, ada) = app.user("ada", "student").await;

    let (_, project) = app.post("/api/projects", &ada, project_body("Tracker")).await;
    let project_id = project["data"]["id"].as_i64().unwrap();
    app.post("/api/project_members", &ada, json!({ "project_id": project_id, "user_id": ada_id }))
        .await;

    let (status, body) = app.delete(&format!("/api/admin/users/{}", ada_id), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reassigned_projects"], 1);
    assert_eq!(body["data"]["removed_memberships"], 1);

    let (_, project) = app.get(&format!("/api/projects/{}", project_id), &admin).await;
    assert_eq!(project["data"]["owner_id"], admin_id);

    let (status, _) = app.get("/api/auth/whoami", &ada).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admins_cannot_delete_themselves() {
    let app = TestApp::new().await;
    let (admin_id, admin) = app.user("root", "admin").await;

    let (status, _) = app.delete(&format!("/api/admin/users/{}", admin_id), &admin).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
