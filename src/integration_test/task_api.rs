use super::test_util::{prepare_db_and_test, test_router};
use crate::api::test_util::deserialize_body;
use crate::routing_utils::USER_ID_HEADER;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Drives one request through the real router, returning the response status
/// and its parsed JSON body
async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    user_id: Option<i32>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request_builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        request_builder = request_builder.header(USER_ID_HEADER, id.to_string());
    }
    let request = match body {
        Some(json_body) => request_builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string())),
        None => request_builder.body(Body::empty()),
    }
    .expect("Failed to build test request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Request did not produce a response");
    let status = response.status();
    let response_body: Value = deserialize_body(response.into_body()).await;

    (status, response_body)
}

async fn create_list(router: &Router, user_id: i32, title: &str) -> i32 {
    let (status, body) = send(
        router,
        "POST",
        "/lists",
        Some(user_id),
        Some(json!({ "title": title })),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status, "list create failed: {body}");

    body["id"].as_i64().expect("list id missing") as i32
}

async fn create_task(
    router: &Router,
    user_id: i32,
    list_id: i32,
    title: &str,
    is_completed: bool,
) -> i32 {
    let (status, body) = send(
        router,
        "POST",
        "/tasks",
        Some(user_id),
        Some(json!({
            "list_id": list_id,
            "title": title,
            "is_completed": is_completed,
        })),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status, "task create failed: {body}");

    body["id"].as_i64().expect("task id missing") as i32
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn tasks_can_be_created_filtered_and_cascade_deleted() {
    prepare_db_and_test(|test_db| async move {
        let router = test_router(test_db);

        let list_id = create_list(&router, 1, "Groceries").await;
        let milk_task = create_task(&router, 1, list_id, "Buy milk", false).await;
        create_task(&router, 1, list_id, "Mop floor", true).await;

        let (status, pending_page) =
            send(&router, "GET", "/tasks?filter=pending", Some(1), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, pending_page["tasks"]["data"].as_array().unwrap().len());
        assert_eq!("Buy milk", pending_page["tasks"]["data"][0]["title"]);
        assert_eq!("Groceries", pending_page["tasks"]["data"][0]["list"]["title"]);

        let (status, dashboard) = send(&router, "GET", "/dashboard", Some(1), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, dashboard["stats"]["totalLists"]);
        assert_eq!(2, dashboard["stats"]["totalTasks"]);
        assert_eq!(1, dashboard["stats"]["completedTasks"]);
        assert_eq!(1, dashboard["stats"]["pendingTasks"]);
        assert_eq!(2, dashboard["recentActivities"].as_array().unwrap().len());

        // Completing the milk task moves it to the completed partition
        let (status, _) = send(
            &router,
            "PUT",
            format!("/tasks/{milk_task}").as_str(),
            Some(1),
            Some(json!({
                "list_id": list_id,
                "title": "Buy milk",
                "is_completed": true,
            })),
        )
        .await;
        assert_eq!(StatusCode::OK, status);

        let (_, completed_page) =
            send(&router, "GET", "/tasks?filter=completed", Some(1), None).await;
        assert_eq!(2, completed_page["tasks"]["total"]);

        // Deleting the list takes its tasks with it
        let (status, delete_confirmation) = send(
            &router,
            "DELETE",
            format!("/lists/{list_id}").as_str(),
            Some(1),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(
            "List deleted successfully.",
            delete_confirmation["flash"]["success"]
        );

        let (_, empty_page) = send(&router, "GET", "/tasks", Some(1), None).await;
        assert_eq!(0, empty_page["tasks"]["total"]);
        let (_, empty_dashboard) = send(&router, "GET", "/dashboard", Some(1), None).await;
        assert_eq!(0, empty_dashboard["stats"]["totalTasks"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn users_cannot_see_or_modify_each_others_data() {
    prepare_db_and_test(|test_db| async move {
        let router = test_router(test_db);

        let list_id = create_list(&router, 1, "Groceries").await;
        let task_id = create_task(&router, 1, list_id, "Buy milk", false).await;

        let (_, other_users_lists) = send(&router, "GET", "/lists", Some(2), None).await;
        assert_eq!(0, other_users_lists["lists"].as_array().unwrap().len());
        let (_, other_users_tasks) = send(&router, "GET", "/tasks", Some(2), None).await;
        assert_eq!(0, other_users_tasks["tasks"]["total"]);

        let (status, not_found_body) = send(
            &router,
            "PUT",
            format!("/lists/{list_id}").as_str(),
            Some(2),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("not_found", not_found_body["error_code"]);

        let (status, _) = send(
            &router,
            "DELETE",
            format!("/tasks/{task_id}").as_str(),
            Some(2),
            None,
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);

        // Tasks can't be created on (or moved to) somebody else's list
        let (status, _) = send(
            &router,
            "POST",
            "/tasks",
            Some(2),
            Some(json!({ "list_id": list_id, "title": "Sneaky task" })),
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);

        // The original owner is unaffected
        let (_, owners_tasks) = send(&router, "GET", "/tasks", Some(1), None).await;
        assert_eq!(1, owners_tasks["tasks"]["total"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn search_matches_title_substrings_case_insensitively() {
    prepare_db_and_test(|test_db| async move {
        let router = test_router(test_db);

        let list_id = create_list(&router, 1, "Groceries").await;
        create_task(&router, 1, list_id, "Buy milk", false).await;
        create_task(&router, 1, list_id, "Buy 100% juice", false).await;
        create_task(&router, 1, list_id, "Sweep", false).await;

        let (_, buy_page) = send(&router, "GET", "/tasks?search=BUY", Some(1), None).await;
        assert_eq!(2, buy_page["tasks"]["total"]);

        // A literal percent sign in the search term is not a wildcard
        let (_, percent_page) = send(&router, "GET", "/tasks?search=100%25", Some(1), None).await;
        assert_eq!(1, percent_page["tasks"]["total"]);
        assert_eq!("Buy 100% juice", percent_page["tasks"]["data"][0]["title"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn search_results_paginate_ten_at_a_time() {
    prepare_db_and_test(|test_db| async move {
        let router = test_router(test_db);

        let list_id = create_list(&router, 1, "Chores").await;
        for task_number in 1..=12 {
            create_task(&router, 1, list_id, format!("Chore {task_number}").as_str(), false).await;
        }

        let (_, first_page) = send(&router, "GET", "/tasks", Some(1), None).await;
        assert_eq!(10, first_page["tasks"]["data"].as_array().unwrap().len());
        assert_eq!(12, first_page["tasks"]["total"]);
        assert_eq!(2, first_page["tasks"]["last_page"]);
        assert!(first_page["tasks"]["prev_page_url"].is_null());
        assert!(first_page["tasks"]["next_page_url"].is_string());

        let (_, second_page) = send(&router, "GET", "/tasks?page=2", Some(1), None).await;
        assert_eq!(2, second_page["tasks"]["data"].as_array().unwrap().len());
        assert_eq!(11, second_page["tasks"]["from"]);
        assert_eq!(12, second_page["tasks"]["to"]);
        assert!(second_page["tasks"]["prev_page_url"].is_string());
        assert!(second_page["tasks"]["next_page_url"].is_null());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn requests_without_a_user_identity_are_rejected() {
    prepare_db_and_test(|test_db| async move {
        let router = test_router(test_db);

        let (status, body) = send(&router, "GET", "/lists", None, None).await;
        assert_eq!(StatusCode::UNAUTHORIZED, status);
        assert_eq!("unauthenticated", body["error_code"]);
    });
}
