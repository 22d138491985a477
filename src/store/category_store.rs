use crate::db::DbConnection;
use crate::error_handler::ServiceError;
use crate::models::{Category, NewCategory, UpdateCategoryChangeset};
use crate::schema::{categories, tasks};
use crate::store::require_text;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

pub async fn list_categories(
    conn: &mut DbConnection,
    owner: i32,
) -> Result<Vec<Category>, ServiceError> {
    let category_list = categories::table
        .filter(categories::user_id.eq(owner))
        .order(categories::id.asc())
        .select(Category::as_select())
        .load::<Category>(conn)
        .await
        .map_err(ServiceError::from)?;

    Ok(category_list)
}

pub async fn get_category(
    conn: &mut DbConnection,
    owner: i32,
    category_id: i32,
) -> Result<Category, ServiceError> {
    let category_option = categories::table
        .filter(categories::user_id.eq(owner))
        .filter(categories::id.eq(category_id))
        .select(Category::as_select())
        .first::<Category>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?;

    category_option.ok_or_else(|| not_found(category_id))
}

/// Fails with `NotFound` unless `category_id` belongs to `owner`.
pub async fn ensure_owned(
    conn: &mut DbConnection,
    owner: i32,
    category_id: i32,
) -> Result<(), ServiceError> {
    let found = categories::table
        .filter(categories::user_id.eq(owner))
        .filter(categories::id.eq(category_id))
        .select(categories::id)
        .first::<i32>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?;

    match found {
        Some(_) => Ok(()),
        None => Err(not_found(category_id)),
    }
}

async fn name_taken(
    conn: &mut DbConnection,
    owner: i32,
    candidate: &str,
    except: Option<i32>,
) -> Result<bool, ServiceError> {
    let mut query = categories::table
        .filter(categories::user_id.eq(owner))
        .filter(categories::name.eq(candidate))
        .into_boxed();

    if let Some(except_id) = except {
        query = query.filter(categories::id.ne(except_id));
    }

    let existing = query
        .select(categories::id)
        .first::<i32>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?;

    Ok(existing.is_some())
}

pub async fn create_category(
    conn: &mut DbConnection,
    owner: i32,
    name: &str,
) -> Result<Category, ServiceError> {
    let name = require_text("Category name", name)?;

    if name_taken(conn, owner, &name, None).await? {
        return Err(duplicate_name(&name));
    }

    let new_category = NewCategory {
        user_id: owner,
        name,
    };

    let category = diesel::insert_into(categories::table)
        .values(&new_category)
        .get_result::<Category>(conn)
        .await
        .map_err(ServiceError::from)?;

    log::info!("User {} created category {}", owner, category.id);
    Ok(category)
}

pub async fn update_category(
    conn: &mut DbConnection,
    owner: i32,
    category_id: i32,
    name: &str,
) -> Result<Category, ServiceError> {
    let name = require_text("Category name", name)?;

    ensure_owned(conn, owner, category_id).await?;

    if name_taken(conn, owner, &name, Some(category_id)).await? {
        return Err(duplicate_name(&name));
    }

    let changes = UpdateCategoryChangeset {
        name: Some(name),
        updated_at: Some(Utc::now().naive_utc()),
    };

    let updated = diesel::update(
        categories::table
            .filter(categories::id.eq(category_id))
            .filter(categories::user_id.eq(owner)),
    )
    .set(&changes)
    .get_result::<Category>(conn)
    .await
    .map_err(ServiceError::from)?;

    log::info!("User {} renamed category {}", owner, category_id);
    Ok(updated)
}

/// Deletes the category and detaches its tasks; the tasks themselves survive.
pub async fn delete_category(
    conn: &mut DbConnection,
    owner: i32,
    category_id: i32,
) -> Result<(), ServiceError> {
    let detached = conn
        .transaction::<_, ServiceError, _>(move |conn| {
            async move {
                let detached = diesel::update(
                    tasks::table
                        .filter(tasks::user_id.eq(owner))
                        .filter(tasks::category_id.eq(category_id)),
                )
                .set(tasks::category_id.eq(None::<i32>))
                .execute(conn)
                .await?;

                let num_deleted = diesel::delete(
                    categories::table
                        .filter(categories::user_id.eq(owner))
                        .filter(categories::id.eq(category_id)),
                )
                .execute(conn)
                .await?;

                if num_deleted == 0 {
                    return Err(not_found(category_id));
                }

                Ok(detached)
            }
            .scope_boxed()
        })
        .await?;

    log::info!(
        "User {} deleted category {} ({} task(s) detached)",
        owner,
        category_id,
        detached
    );
    Ok(())
}

fn not_found(category_id: i32) -> ServiceError {
    ServiceError::NotFound(format!(
        "Category with id {} not found or not owned by user",
        category_id
    ))
}

fn duplicate_name(name: &str) -> ServiceError {
    ServiceError::Validation(format!("A category named '{}' already exists.", name))
}
