//! Core library surface for the RP Contacts TUI application.
//!
//! The `bin` target glues these pieces together; tests and other tooling can
//! reuse the model without the terminal front-end.
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod ui;

/// Persistence entry points used by `main.rs` and the integration tests.
pub use db::{open_database, open_in_memory, ContactsModel};

pub use config::Config;
pub use models::{Contact, ContactDraft, ContactField, ValidationError};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
