//! Ratatui front-end: one page per contact, a table overview, and the modal
//! forms that feed the model.

mod app;
mod forms;
mod helpers;
mod pager;
mod terminal;

pub use app::App;
pub use terminal::run_app;
