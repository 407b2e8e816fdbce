/// End-to-end tests for the HTTP API
///
/// Every test drives the real router against PostgreSQL and is skipped when
/// `DATABASE_URL` is not set.

mod common;

use axum::http::StatusCode;
use common::{id_of, TestContext};
use serde_json::json;
use uuid::Uuid;

fn task_body(project_id: Uuid, title: &str) -> serde_json::Value {
    json!({
        "project_id": project_id,
        "title": title,
        "description": "Something to do"
    })
}

#[tokio::test]
async fn test_health() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let response = ctx.send("GET", "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "connected");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let response = ctx.send("GET", "/v1/projects", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "unauthorized");

    let response = ctx
        .send("GET", "/v1/tasks", Some("not-a-jwt"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_refresh() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let name = format!("  newcomer-{}  ", Uuid::new_v4());
    let trimmed = name.trim().to_string();

    let response = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"name": name, "password": "correct horse"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["name"], trimmed.as_str());
    assert!(response.body["access_token"].is_string());

    let response = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"name": trimmed, "password": "another password"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = ctx
        .send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"name": trimmed, "password": "wrong password"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let wrong_password_message = response.body["message"].clone();

    let response = ctx
        .send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"name": format!("nobody-{}", Uuid::new_v4()), "password": "whatever1"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], wrong_password_message);

    let response = ctx
        .send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"name": trimmed, "password": "correct horse"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let access_token = response.body["access_token"].as_str().unwrap().to_string();
    let refresh_token = response.body["refresh_token"].as_str().unwrap().to_string();

    let response = ctx
        .send("GET", "/v1/users/me", Some(&access_token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], trimmed.as_str());

    // A refresh token is not accepted as an access token
    let response = ctx
        .send("GET", "/v1/users/me", Some(&refresh_token), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = ctx
        .send(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({"refresh_token": refresh_token})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["access_token"].is_string());
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let response = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"name": format!("short-{}", Uuid::new_v4()), "password": "short"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_member_can_create_task_after_being_added() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let a = ctx.user("alice").await;
    let b = ctx.user("bob").await;

    let response = ctx
        .post("/v1/projects", &a, json!({"name": "P1"}))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let p1 = id_of(&response.body, "id");

    let response = ctx.post("/v1/tasks", &b, task_body(p1, "Sneaky")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "forbidden");

    let response = ctx
        .patch(
            &format!("/v1/projects/{}", p1),
            &a,
            json!({"member_ids": [b.id()]}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["members"][0]["id"], b.id().to_string());

    let response = ctx.post("/v1/tasks", &b, task_body(p1, "Welcome")).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["created_by"]["id"], b.id().to_string());
    assert_eq!(response.body["status"], "TODO");
    assert_eq!(response.body["priority"], "MEDIUM");

    let response = ctx
        .patch(&format!("/v1/projects/{}", p1), &b, json!({"name": "Taken over"}))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_empty_assignee_list_clears_assignees() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let a = ctx.user("alice").await;
    let helper = ctx.user("helper").await;

    let response = ctx.post("/v1/projects", &a, json!({"name": "P2"})).await;
    let p2 = id_of(&response.body, "id");

    let mut body = task_body(p2, "Assigned");
    body["assignee_ids"] = json!([helper.id()]);
    body["due_date"] = json!("2030-01-01T00:00:00Z");
    let response = ctx.post("/v1/tasks", &a, body).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["assignees"].as_array().unwrap().len(), 1);
    let task_id = id_of(&response.body, "id");

    let response = ctx
        .patch(&format!("/v1/tasks/{}", task_id), &a, json!({"assignee_ids": []}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["assignees"].as_array().unwrap().is_empty());
    assert_eq!(response.body["title"], "Assigned");
    assert!(response.body["due_date"].is_string());

    let response = ctx
        .patch(&format!("/v1/tasks/{}", task_id), &a, json!({"due_date": null}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["due_date"].is_null());
}

#[tokio::test]
async fn test_task_validation_and_unknown_assignee() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let a = ctx.user("alice").await;
    let response = ctx.post("/v1/projects", &a, json!({"name": "Checks"})).await;
    let project_id = id_of(&response.body, "id");

    let response = ctx
        .post("/v1/tasks", &a, task_body(project_id, &"x".repeat(51)))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["details"][0]["field"], "title");

    let mut body = task_body(project_id, "Ghost");
    body["assignee_ids"] = json!([Uuid::new_v4()]);
    let response = ctx.post("/v1/tasks", &a, body).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["details"][0]["field"], "assignee_ids");

    let response = ctx
        .get(&format!("/v1/tasks?project_id={}", project_id), &a)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_sort_and_board() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let a = ctx.user("alice").await;
    let response = ctx.post("/v1/projects", &a, json!({"name": "Board"})).await;
    let project_id = id_of(&response.body, "id");

    let mut ids = Vec::new();
    for title in ["beta", "alpha", "gamma"] {
        let response = ctx.post("/v1/tasks", &a, task_body(project_id, title)).await;
        ids.push(id_of(&response.body, "id"));
    }

    let response = ctx
        .put(&format!("/v1/tasks/{}/status", ids[2]), &a, json!({"status": "INPROGRESS"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "INPROGRESS");

    let response = ctx
        .get(
            &format!(
                "/v1/tasks?project_id={}&sort_by=title&sort_order=DESC&status=ALL&priority=ALL",
                project_id
            ),
            &a,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let titles: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["gamma", "beta", "alpha"]);

    let response = ctx
        .get(&format!("/v1/tasks?project_id={}&status=TODO", project_id), &a)
        .await;
    assert_eq!(response.body.as_array().unwrap().len(), 2);

    let response = ctx
        .get(&format!("/v1/tasks/board?project_id={}", project_id), &a)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let columns = response.body["columns"].as_array().unwrap();
    let statuses: Vec<&str> = columns.iter().map(|c| c["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["TODO", "INPROGRESS", "COMPLETED"]);
    assert_eq!(columns[0]["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(columns[1]["tasks"].as_array().unwrap().len(), 1);
    assert!(columns[2]["tasks"].as_array().unwrap().is_empty());

    let response = ctx
        .get(&format!("/v1/tasks?project_id={}&status=BLOCKED", project_id), &a)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_task_and_missing_task() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let a = ctx.user("alice").await;
    let outsider = ctx.user("outsider").await;
    let response = ctx.post("/v1/projects", &a, json!({"name": "Cleanup"})).await;
    let project_id = id_of(&response.body, "id");
    let response = ctx.post("/v1/tasks", &a, task_body(project_id, "Doomed")).await;
    let task_id = id_of(&response.body, "id");

    let response = ctx.delete(&format!("/v1/tasks/{}", task_id), &outsider).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.delete(&format!("/v1/tasks/{}", task_id), &a).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = ctx.delete(&format!("/v1/tasks/{}", task_id), &a).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = ctx
        .put(&format!("/v1/tasks/{}/status", task_id), &a, json!({"status": "COMPLETED"}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_search_and_profile() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let owner = ctx.user("owner").await;
    let member = ctx.user("searchable").await;
    let outsider = ctx.user("searchable").await;

    let response = ctx
        .post(
            "/v1/projects",
            &owner,
            json!({"name": "Search", "member_ids": [member.id()]}),
        )
        .await;
    let project_id = id_of(&response.body, "id");

    let response = ctx
        .get(
            &format!("/v1/projects/{}/users?search_term=SEARCHABLE", project_id),
            &owner,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let found: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(found, vec![member.id().to_string()]);

    let response = ctx
        .get(&format!("/v1/projects/{}/users?limit=50", project_id), &owner)
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .get(&format!("/v1/projects/{}/users", project_id), &outsider)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.get("/v1/users/me/stats", &member).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["member_projects"], 1);
    assert_eq!(response.body["assigned_tasks"], 0);

    let response = ctx.get("/v1/projects", &member).await;
    let listed: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert!(listed.contains(&project_id.to_string().as_str()));

    let response = ctx
        .patch("/v1/users/me", &member, json!({"name": outsider.user.name}))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}
