//! Task table as the list page renders it, plus the row filters the page
//! applies without reloading.
//!
//! The column order is fixed: the page script addresses the title and the
//! completion cell by position.

use crate::models::{Acknowledgement, CompletedValue, TaskWithCategory};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Title,
    Description,
    Category,
    Completed,
    Actions,
}

impl Column {
    pub const ORDER: [Column; 5] = [
        Column::Title,
        Column::Description,
        Column::Category,
        Column::Completed,
        Column::Actions,
    ];

    pub fn index(self) -> usize {
        match self {
            Column::Title => 0,
            Column::Description => 1,
            Column::Category => 2,
            Column::Completed => 3,
            Column::Actions => 4,
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::Title => "Title",
            Column::Description => "Description",
            Column::Category => "Category",
            Column::Completed => "Completed",
            Column::Actions => "Actions",
        }
    }
}

const NO_CATEGORY: &str = "None";

/// The completion `<select>` of one row.
///
/// A change is optimistic: the new value shows at once and the prior one is
/// kept until the server answers. A failed answer puts the prior value back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionDropdown {
    value: CompletedValue,
    prior: Option<CompletedValue>,
}

impl CompletionDropdown {
    pub fn new(value: CompletedValue) -> Self {
        CompletionDropdown { value, prior: None }
    }

    pub fn value(&self) -> CompletedValue {
        self.value
    }

    pub fn is_pending(&self) -> bool {
        self.prior.is_some()
    }

    /// Records a user selection. Returns the value to send, or `None` when the
    /// selection did not change anything.
    pub fn select(&mut self, selected: CompletedValue) -> Option<CompletedValue> {
        if selected == self.value {
            return None;
        }
        // While a request is in flight the committed value is still `prior`.
        if self.prior.is_none() {
            self.prior = Some(self.value);
        }
        self.value = selected;
        Some(selected)
    }

    /// Applies the server's answer to the last selection.
    pub fn acknowledge(&mut self, ack: &Acknowledgement) {
        let Some(prior) = self.prior.take() else {
            return;
        };
        if !ack.is_success() {
            log::warn!(
                "Completion update failed ({}); reverting to {}",
                ack.message.as_deref().unwrap_or("no message"),
                prior
            );
            self.value = prior;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub task_id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub completed: CompletionDropdown,
}

impl TableRow {
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Title => self.title.clone(),
            Column::Description => self.description.clone(),
            Column::Category => self.category.clone(),
            Column::Completed => self.completed.value().as_str().to_string(),
            Column::Actions => format!("/tasks/{}", self.task_id),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        Column::ORDER.iter().map(|column| self.cell(*column)).collect()
    }
}

impl From<&TaskWithCategory> for TableRow {
    fn from(task: &TaskWithCategory) -> Self {
        TableRow {
            task_id: task.id,
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            category: task
                .category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| NO_CATEGORY.to_string()),
            completed: CompletionDropdown::new(CompletedValue::from(task.completed)),
        }
    }
}

/// Case-insensitive substring match against the title column. An empty query
/// matches every row.
pub fn matches_search(row: &TableRow, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    row.cell(Column::Title)
        .to_uppercase()
        .contains(&query.to_uppercase())
}

/// The list page state. Search and completed-row hiding are independent
/// predicates; a row shows only when both let it through.
#[derive(Debug, Clone, Default)]
pub struct TaskTable {
    rows: Vec<TableRow>,
    search: String,
    hide_completed: bool,
}

impl TaskTable {
    pub fn new(tasks: &[TaskWithCategory]) -> Self {
        TaskTable {
            rows: tasks.iter().map(TableRow::from).collect(),
            search: String::new(),
            hide_completed: false,
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row_mut(&mut self, task_id: i32) -> Option<&mut TableRow> {
        self.rows.iter_mut().find(|row| row.task_id == task_id)
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    /// The "toggle completed" button: each press flips whether rows marked
    /// "Yes" are hidden.
    pub fn toggle_completed(&mut self) {
        self.hide_completed = !self.hide_completed;
    }

    pub fn hides_completed(&self) -> bool {
        self.hide_completed
    }

    pub fn is_visible(&self, row: &TableRow) -> bool {
        let completed_shown =
            !(self.hide_completed && row.completed.value() == CompletedValue::Yes);
        completed_shown && matches_search(row, &self.search)
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(move |row| self.is_visible(row))
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            columns: Column::ORDER.iter().map(|c| c.header()).collect(),
            rows: self
                .visible_rows()
                .map(|row| RowSnapshot {
                    task_id: row.task_id,
                    cells: row.cells(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RowSnapshot {
    pub task_id: i32,
    pub cells: Vec<String>,
}

/// The visible part of the table, serialized for the list page.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub columns: Vec<&'static str>,
    pub rows: Vec<RowSnapshot>,
}
