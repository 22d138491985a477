//! Owner-scoped task and category service with a completion toggle endpoint
//! and the list page's filtering model.

pub mod auth_utils;
pub mod config;
pub mod db;
pub mod error_handler;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod store;
pub mod view;
