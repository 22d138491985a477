use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::error_handler::ServiceError;
use crate::models::{
    Acknowledgement, CompletedValue, CreateTaskPayload, UpdateCompletedPayload, UpdateTaskPayload,
};
use crate::store::task_store;
use crate::view::TaskTable;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

// Query parameters of the list page filters
#[derive(Deserialize, Debug)]
pub struct TableQueryParams {
    pub search: Option<String>,
    #[serde(default)]
    pub hide_completed: bool,
}

#[post("")]
pub async fn create_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<CreateTaskPayload>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let task = task_store::create_task(&mut conn, authenticated_user.id, payload.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(task))
}

#[get("")]
pub async fn list_tasks_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let task_list = task_store::list_tasks(&mut conn, authenticated_user.id).await?;

    Ok(HttpResponse::Ok().json(task_list))
}

/// Rows of the list page in display column order, filtered the same way the
/// page filters them.
#[get("/table")]
pub async fn task_table_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<TableQueryParams>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let task_list = task_store::list_tasks(&mut conn, authenticated_user.id).await?;

    let mut table = TaskTable::new(&task_list);
    if let Some(search) = &query.search {
        table.set_search(search);
    }
    if query.hide_completed {
        table.toggle_completed();
    }

    Ok(HttpResponse::Ok().json(table.snapshot()))
}

#[get("/{task_id_path}")]
pub async fn get_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let task =
        task_store::get_task(&mut conn, authenticated_user.id, task_id_path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(task))
}

#[put("/{task_id_path}")]
pub async fn update_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<i32>,
    payload: web::Json<UpdateTaskPayload>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let updated_task = task_store::update_task(
        &mut conn,
        authenticated_user.id,
        task_id_path.into_inner(),
        payload.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated_task))
}

#[delete("/{task_id_path}")]
pub async fn delete_task_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let task_to_delete_id = task_id_path.into_inner();

    let mut conn = pool.get().await?;

    task_store::delete_task(&mut conn, authenticated_user.id, task_to_delete_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Task with id {} deleted successfully", task_to_delete_id)
    })))
}

/// Asynchronous completion update sent by the list page dropdown.
#[post("/{task_id_path}/update_completed")]
pub async fn update_completed_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    task_id_path: web::Path<i32>,
    payload: web::Json<UpdateCompletedPayload>,
) -> Result<HttpResponse, ServiceError> {
    let task_to_update_id = task_id_path.into_inner();

    let target = payload
        .completed
        .parse::<CompletedValue>()
        .map_err(|e| {
            log::warn!(
                "Invalid completed value for task {}: {}",
                task_to_update_id,
                e
            );
            ServiceError::BadRequest(e.to_string())
        })?;

    let mut conn = pool.get().await?;

    task_store::set_completed(
        &mut conn,
        authenticated_user.id,
        task_to_update_id,
        target.into(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(Acknowledgement::success("Task updated")))
}

#[cfg(test)]
mod tests {
    use crate::auth_utils::USER_ID_HEADER;
    use crate::db::test_pool;
    use crate::models::{Acknowledgement, CompletedValue, TaskWithCategory};
    use crate::view::{Column, CompletionDropdown};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    const OWNER: &str = "1";
    const STRANGER: &str = "2";

    #[actix_web::test]
    async fn create_list_and_fetch() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"title": "Test Task", "description": "This is a test task"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: TaskWithCategory = test::read_body_json(resp).await;
        assert!(!created.completed);

        let req = test::TestRequest::get()
            .uri("/tasks")
            .insert_header((USER_ID_HEADER, OWNER))
            .to_request();
        let listed: Vec<TaskWithCategory> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Test Task");

        let req = test::TestRequest::get()
            .uri(&format!("/tasks/{}", created.id))
            .insert_header((USER_ID_HEADER, STRANGER))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn missing_owner_header_is_rejected() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::get().uri("/tasks").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn empty_title_is_a_validation_error() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"title": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
    }

    #[actix_web::test]
    async fn update_completed_yes_marks_task_done() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"title": "Test Task"}))
            .to_request();
        let created: TaskWithCategory = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/tasks/{}/update_completed", created.id))
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"completed": "Yes"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Acknowledgement = test::read_body_json(resp).await;
        assert!(ack.is_success());

        let req = test::TestRequest::get()
            .uri(&format!("/tasks/{}", created.id))
            .insert_header((USER_ID_HEADER, OWNER))
            .to_request();
        let fetched: TaskWithCategory = test::call_and_read_body_json(&app, req).await;
        assert!(fetched.completed);
    }

    #[actix_web::test]
    async fn update_completed_reports_each_failure() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"title": "Mine"}))
            .to_request();
        let created: TaskWithCategory = test::call_and_read_body_json(&app, req).await;

        let cases = [
            (999, OWNER, json!({"completed": "Yes"}), StatusCode::NOT_FOUND),
            (created.id, STRANGER, json!({"completed": "Yes"}), StatusCode::FORBIDDEN),
            (created.id, OWNER, json!({"completed": "Maybe"}), StatusCode::BAD_REQUEST),
            (created.id, OWNER, json!({"done": true}), StatusCode::BAD_REQUEST),
        ];

        for (task_id, user, body, expected) in cases {
            let req = test::TestRequest::post()
                .uri(&format!("/tasks/{}/update_completed", task_id))
                .insert_header((USER_ID_HEADER, user))
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
            let ack: Acknowledgement = test::read_body_json(resp).await;
            assert!(!ack.is_success());
            assert!(ack.message.is_some());
        }

        let req = test::TestRequest::get()
            .uri(&format!("/tasks/{}", created.id))
            .insert_header((USER_ID_HEADER, OWNER))
            .to_request();
        let fetched: TaskWithCategory = test::call_and_read_body_json(&app, req).await;
        assert!(!fetched.completed);
    }

    #[actix_web::test]
    async fn failed_toggle_reverts_the_dropdown() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let mut dropdown = CompletionDropdown::new(CompletedValue::No);
        let sent = dropdown.select(CompletedValue::Yes).unwrap();

        let req = test::TestRequest::post()
            .uri("/tasks/12345/update_completed")
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"completed": sent.as_str()}))
            .to_request();
        let ack: Acknowledgement = test::call_and_read_body_json(&app, req).await;

        dropdown.acknowledge(&ack);
        assert_eq!(dropdown.value(), CompletedValue::No);
    }

    #[actix_web::test]
    async fn table_applies_search_and_completed_filters() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        for title in ["Buy milk", "Walk dog"] {
            let req = test::TestRequest::post()
                .uri("/tasks")
                .insert_header((USER_ID_HEADER, OWNER))
                .set_json(json!({"title": title}))
                .to_request();
            let created: TaskWithCategory = test::call_and_read_body_json(&app, req).await;
            if title == "Walk dog" {
                let req = test::TestRequest::post()
                    .uri(&format!("/tasks/{}/update_completed", created.id))
                    .insert_header((USER_ID_HEADER, OWNER))
                    .set_json(json!({"completed": "Yes"}))
                    .to_request();
                test::call_service(&app, req).await;
            }
        }

        let req = test::TestRequest::get()
            .uri("/tasks/table?search=MILK")
            .insert_header((USER_ID_HEADER, OWNER))
            .to_request();
        let table: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(table["rows"].as_array().unwrap().len(), 1);
        assert_eq!(table["rows"][0]["cells"][0], "Buy milk");

        let req = test::TestRequest::get()
            .uri("/tasks/table?hide_completed=true")
            .insert_header((USER_ID_HEADER, OWNER))
            .to_request();
        let table: Value = test::call_and_read_body_json(&app, req).await;
        let rows = table["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["cells"][Column::Completed.index()], "No");

        let req = test::TestRequest::get()
            .uri("/tasks/table")
            .insert_header((USER_ID_HEADER, OWNER))
            .to_request();
        let table: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(table["columns"][0], "Title");
        assert_eq!(table["rows"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn delete_then_delete_again() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"title": "Temp"}))
            .to_request();
        let created: TaskWithCategory = test::call_and_read_body_json(&app, req).await;

        for expected in [StatusCode::OK, StatusCode::NOT_FOUND] {
            let req = test::TestRequest::delete()
                .uri(&format!("/tasks/{}", created.id))
                .insert_header((USER_ID_HEADER, OWNER))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn update_through_put() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"title": "Draft", "priority": "low"}))
            .to_request();
        let created: TaskWithCategory = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/tasks/{}", created.id))
            .insert_header((USER_ID_HEADER, OWNER))
            .set_json(json!({"title": "Final", "priority": null, "due_date": "2026-12-24"}))
            .to_request();
        let updated: TaskWithCategory = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.priority, None);
        assert_eq!(updated.due_date.map(|d| d.to_string()).as_deref(), Some("2026-12-24"));
    }
}
