use crate::db::DbConnection;
use crate::error_handler::ServiceError;
use crate::models::{
    CategoryRef, CreateTaskPayload, NewTask, Priority, Task, TaskWithCategory,
    UpdateTaskChangeset, UpdateTaskPayload,
};
use crate::schema::{categories, tasks};
use crate::store::{category_store, optional_text, require_text};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// All tasks of `owner` with their categories, oldest first.
pub async fn list_tasks(
    conn: &mut DbConnection,
    owner: i32,
) -> Result<Vec<TaskWithCategory>, ServiceError> {
    let rows = tasks::table
        .left_join(categories::table)
        .filter(tasks::user_id.eq(owner))
        .order(tasks::id.asc())
        .select((Task::as_select(), Option::<CategoryRef>::as_select()))
        .load::<(Task, Option<CategoryRef>)>(conn)
        .await
        .map_err(ServiceError::from)?;

    Ok(rows.into_iter().map(TaskWithCategory::from).collect())
}

pub async fn get_task(
    conn: &mut DbConnection,
    owner: i32,
    task_id: i32,
) -> Result<TaskWithCategory, ServiceError> {
    let row = tasks::table
        .left_join(categories::table)
        .filter(tasks::user_id.eq(owner))
        .filter(tasks::id.eq(task_id))
        .select((Task::as_select(), Option::<CategoryRef>::as_select()))
        .first::<(Task, Option<CategoryRef>)>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?;

    row.map(TaskWithCategory::from)
        .ok_or_else(|| not_found(task_id))
}

pub async fn create_task(
    conn: &mut DbConnection,
    owner: i32,
    payload: CreateTaskPayload,
) -> Result<TaskWithCategory, ServiceError> {
    let title = require_text("Title", &payload.title)?;

    if let Some(category_id) = payload.category_id {
        category_store::ensure_owned(conn, owner, category_id).await?;
    }

    let new_task = NewTask {
        user_id: owner,
        category_id: payload.category_id,
        title,
        description: optional_text(payload.description),
        due_date: payload.due_date,
        priority: payload.priority.map(Priority::level),
        completed: false,
    };

    let task = diesel::insert_into(tasks::table)
        .values(&new_task)
        .get_result::<Task>(conn)
        .await
        .map_err(ServiceError::from)?;

    log::info!("User {} created task {}", owner, task.id);
    get_task(conn, owner, task.id).await
}

/// Applies the fields present in `payload`. Ownership is checked before the
/// fields, and nothing is written when any of them is invalid.
pub async fn update_task(
    conn: &mut DbConnection,
    owner: i32,
    task_id: i32,
    payload: UpdateTaskPayload,
) -> Result<TaskWithCategory, ServiceError> {
    let owned = tasks::table
        .filter(tasks::user_id.eq(owner))
        .filter(tasks::id.eq(task_id))
        .select(tasks::id)
        .first::<i32>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?;

    if owned.is_none() {
        return Err(not_found(task_id));
    }

    let title = payload
        .title
        .as_deref()
        .map(|raw| require_text("Title", raw))
        .transpose()?;

    if let Some(Some(category_id)) = payload.category_id {
        category_store::ensure_owned(conn, owner, category_id).await?;
    }

    let task_changes = UpdateTaskChangeset {
        category_id: payload.category_id,
        title,
        description: payload.description.map(optional_text),
        due_date: payload.due_date,
        priority: payload.priority.map(|p| p.map(Priority::level)),
        completed: payload.completed,
        updated_at: Some(Utc::now().naive_utc()),
    };

    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task_id))
            .filter(tasks::user_id.eq(owner)),
    )
    .set(&task_changes)
    .get_result::<Task>(conn)
    .await
    .optional()
    .map_err(ServiceError::from)?;

    match updated {
        Some(task) => {
            log::info!("User {} updated task {}", owner, task.id);
            get_task(conn, owner, task.id).await
        }
        None => Err(not_found(task_id)),
    }
}

pub async fn delete_task(
    conn: &mut DbConnection,
    owner: i32,
    task_id: i32,
) -> Result<(), ServiceError> {
    let num_deleted = diesel::delete(
        tasks::table
            .filter(tasks::user_id.eq(owner))
            .filter(tasks::id.eq(task_id)),
    )
    .execute(conn)
    .await
    .map_err(ServiceError::from)?;

    if num_deleted == 0 {
        return Err(not_found(task_id));
    }

    log::info!("User {} deleted task {}", owner, task_id);
    Ok(())
}

/// Sets only the completed flag. Unlike the other operations this one tells
/// a missing task (`NotFound`) apart from someone else's task (`Forbidden`).
pub async fn set_completed(
    conn: &mut DbConnection,
    owner: i32,
    task_id: i32,
    completed: bool,
) -> Result<Task, ServiceError> {
    let task_owner = tasks::table
        .filter(tasks::id.eq(task_id))
        .select(tasks::user_id)
        .first::<i32>(conn)
        .await
        .optional()
        .map_err(ServiceError::from)?;

    match task_owner {
        None => {
            return Err(ServiceError::NotFound(format!(
                "Task with id {} not found",
                task_id
            )))
        }
        Some(actual_owner) if actual_owner != owner => {
            log::warn!(
                "User {} tried to change completion of task {} owned by user {}",
                owner,
                task_id,
                actual_owner
            );
            return Err(ServiceError::Forbidden(format!(
                "Task with id {} belongs to another user",
                task_id
            )));
        }
        Some(_) => {}
    }

    let task_changes = UpdateTaskChangeset {
        completed: Some(completed),
        updated_at: Some(Utc::now().naive_utc()),
        ..Default::default()
    };

    // Last write wins; a concurrent delete surfaces as NotFound.
    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task_id))
            .filter(tasks::user_id.eq(owner)),
    )
    .set(&task_changes)
    .get_result::<Task>(conn)
    .await
    .map_err(ServiceError::from)?;

    log::info!(
        "Updated task {} completed status to {}",
        task_id,
        updated.completed
    );
    Ok(updated)
}

fn not_found(task_id: i32) -> ServiceError {
    ServiceError::NotFound(format!(
        "Task with id {} not found or not owned by user",
        task_id
    ))
}
