use crate::auth_utils::AuthenticatedUser;
use crate::db::DbPool;
use crate::error_handler::ServiceError;
use crate::models::{CreateCategoryPayload, UpdateCategoryPayload};
use crate::store::category_store;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

#[post("")]
pub async fn create_category_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<CreateCategoryPayload>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let category =
        category_store::create_category(&mut conn, authenticated_user.id, &payload.name).await?;

    Ok(HttpResponse::Created().json(category))
}

#[get("")]
pub async fn list_categories_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let category_list = category_store::list_categories(&mut conn, authenticated_user.id).await?;

    Ok(HttpResponse::Ok().json(category_list))
}

#[get("/{category_id_path}")]
pub async fn get_category_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    category_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let category = category_store::get_category(
        &mut conn,
        authenticated_user.id,
        category_id_path.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(category))
}

#[put("/{category_id_path}")]
pub async fn update_category_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    category_id_path: web::Path<i32>,
    payload: web::Json<UpdateCategoryPayload>,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = pool.get().await?;

    let updated_category = category_store::update_category(
        &mut conn,
        authenticated_user.id,
        category_id_path.into_inner(),
        &payload.name,
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated_category))
}

#[delete("/{category_id_path}")]
pub async fn delete_category_handler(
    pool: web::Data<DbPool>,
    authenticated_user: AuthenticatedUser,
    category_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let category_to_delete_id = category_id_path.into_inner();

    let mut conn = pool.get().await?;

    category_store::delete_category(&mut conn, authenticated_user.id, category_to_delete_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Category with id {} deleted successfully", category_to_delete_id)
    })))
}
