use crate::db::DbPool;
use crate::error_handler::ServiceError;
use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{web, HttpRequest, HttpResponse};

// Builds the full app around a pool for handler tests.
#[cfg(test)]
macro_rules! test_app {
    ($pool:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .configure(crate::handlers::configure),
        )
        .await
    };
}

pub mod category_handlers;
pub mod task_handlers;

async fn health_check_handler(pool: web::Data<DbPool>) -> Result<HttpResponse, ServiceError> {
    match pool.get().await {
        Ok(_conn) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "message": "Backend is running and DB pool accessible"
        }))),
        Err(e) => {
            log::error!("Failed to get connection from pool: {:?}", e);
            Err(ServiceError::InternalServerError(
                "Failed to check DB pool".to_string(),
            ))
        }
    }
}

// Extractor failures answer with the same JSON envelope as every other error.
fn json_error_handler(error: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Invalid JSON payload for {}: {}", req.path(), error);
    ServiceError::BadRequest(format!("Invalid request: {}", error)).into()
}

fn path_error_handler(error: PathError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Unroutable path {}: {}", req.path(), error);
    ServiceError::NotFound(format!("No resource at {}", req.path())).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(web::resource("/health").route(web::get().to(health_check_handler)))
        .service(
            web::scope("/tasks")
                .service(task_handlers::create_task_handler)
                .service(task_handlers::list_tasks_handler)
                // before "/{id}" so "table" is not read as an id
                .service(task_handlers::task_table_handler)
                .service(task_handlers::get_task_handler)
                .service(task_handlers::update_task_handler)
                .service(task_handlers::delete_task_handler)
                .service(task_handlers::update_completed_handler),
        )
        .service(
            web::scope("/categories")
                .service(category_handlers::create_category_handler)
                .service(category_handlers::list_categories_handler)
                .service(category_handlers::get_category_handler)
                .service(category_handlers::update_category_handler)
                .service(category_handlers::delete_category_handler),
        );
}
