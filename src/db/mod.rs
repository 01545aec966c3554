//! Persistence module split across logical submodules.

mod connection;
mod contacts;

pub use connection::{default_database_path, ensure_schema, open_database, open_in_memory};
pub use contacts::ContactsModel;

#[cfg(test)]
pub(crate) use contacts::tests::seeded_model;
