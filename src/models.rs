use crate::schema::{categories, tasks};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// Absent key -> None, JSON null -> Some(None), value -> Some(Some(v)).
fn deserialize_opt_opt<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Priority ---

/// Ordered task priority, stored as its level (1..=3).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn level(self) -> i32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn from_level(level: i32) -> Option<Priority> {
        match level {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            _ => None,
        }
    }
}

// --- Completed dropdown value ---

/// The two literal values of the completion dropdown.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedValue {
    Yes,
    No,
}

impl CompletedValue {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletedValue::Yes => "Yes",
            CompletedValue::No => "No",
        }
    }
}

impl From<bool> for CompletedValue {
    fn from(completed: bool) -> Self {
        if completed {
            CompletedValue::Yes
        } else {
            CompletedValue::No
        }
    }
}

impl From<CompletedValue> for bool {
    fn from(value: CompletedValue) -> Self {
        value == CompletedValue::Yes
    }
}

impl fmt::Display for CompletedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidCompletedValue(pub String);

impl fmt::Display for InvalidCompletedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "completed must be \"Yes\" or \"No\", got {:?}", self.0)
    }
}

impl FromStr for CompletedValue {
    type Err = InvalidCompletedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(CompletedValue::Yes),
            "No" => Ok(CompletedValue::No),
            other => Err(InvalidCompletedValue(other.to_string())),
        }
    }
}

// --- Category Model ---
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Category {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The slice of a category shown next to a task.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub user_id: i32,
    pub name: String,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = categories)]
pub struct UpdateCategoryChangeset {
    pub name: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

// --- Task Model (Diesel Queryable) ---
// Row as stored; the category is resolved separately.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Task {
    pub id: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<i32>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A task together with its resolved category, as the frontend receives it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskWithCategory {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub completed: bool,
    pub category: Option<CategoryRef>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<(Task, Option<CategoryRef>)> for TaskWithCategory {
    fn from((task_db, category): (Task, Option<CategoryRef>)) -> Self {
        let priority = task_db.priority.and_then(|level| {
            let parsed = Priority::from_level(level);
            if parsed.is_none() {
                log::warn!("Task {} has unknown priority level {}", task_db.id, level);
            }
            parsed
        });

        TaskWithCategory {
            id: task_db.id,
            user_id: task_db.user_id,
            title: task_db.title,
            description: task_db.description,
            due_date: task_db.due_date,
            priority,
            completed: task_db.completed,
            category,
            created_at: task_db.created_at,
            updated_at: task_db.updated_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<i32>,
    pub completed: bool,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = tasks)]
pub struct UpdateTaskChangeset {
    pub category_id: Option<Option<i32>>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Option<i32>>,
    pub completed: Option<bool>,
    pub updated_at: Option<NaiveDateTime>,
}

// --- PAYLOAD DTOs ---

#[derive(Deserialize, Debug, Clone)]
pub struct CreateCategoryPayload {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateCategoryPayload {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub category_id: Option<i32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub priority: Option<Option<Priority>>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub category_id: Option<Option<i32>>,
    pub completed: Option<bool>,
}

/// Body of `POST /tasks/{id}/update_completed`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UpdateCompletedPayload {
    pub completed: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Error,
}

/// Acknowledgement of an asynchronous mutation. Error bodies produced by
/// `ServiceError` deserialize into this too.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Acknowledgement {
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Acknowledgement {
    pub fn success(message: impl Into<String>) -> Self {
        Acknowledgement {
            status: AckStatus::Success,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AckStatus::Success
    }
}
