use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::models::{Contact, ContactDraft};

/// Column headers shown by the table overview, in `SELECT` order.
const HEADERS: [&str; 4] = ["ID", "Name", "Phone", "Email"];

/// Thin data-access wrapper around the `contacts` table. Every method runs a
/// single statement; callers re-fetch afterwards to refresh their view.
pub struct ContactsModel {
    conn: Connection,
}

impl ContactsModel {
    /// Wrap a connection whose schema has already been ensured.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn headers() -> [&'static str; 4] {
        HEADERS
    }

    /// Load every contact in insertion order. The UI pages over this list.
    pub fn fetch_contacts(&self) -> Result<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, phone, email FROM contacts ORDER BY id")
            .context("failed to prepare contacts query")?;

        let contacts = stmt
            .query_map([], |row| {
                Ok(Contact {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    email: row.get(3)?,
                })
            })
            .context("failed to load contacts")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect contacts")?;

        debug!(count = contacts.len(), "fetched contacts");
        Ok(contacts)
    }

    /// Insert a new row and hand back the hydrated contact so the caller can
    /// focus its page.
    pub fn add_contact(&self, draft: &ContactDraft) -> Result<Contact> {
        self.conn
            .execute(
                "INSERT INTO contacts (name, phone, email) VALUES (?1, ?2, ?3)",
                params![draft.name, draft.phone, draft.email],
            )
            .context("failed to insert contact")?;

        let id = self.conn.last_insert_rowid();
        info!(id, "added contact");
        Ok(Contact {
            id,
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            email: draft.email.clone(),
        })
    }

    /// Overwrite every editable field of the contact with `id`.
    pub fn update_contact(&self, id: i64, draft: &ContactDraft) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE contacts SET name = ?1, phone = ?2, email = ?3 WHERE id = ?4",
                params![draft.name, draft.phone, draft.email, id],
            )
            .context("failed to update contact")?;

        if updated == 0 {
            Err(anyhow!("Contact not found"))
        } else {
            info!(id, "updated contact");
            Ok(())
        }
    }

    pub fn delete_contact(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1", params![id])
            .context("failed to delete contact")?;

        if deleted == 0 {
            Err(anyhow!("Contact not found"))
        } else {
            info!(id, "deleted contact");
            Ok(())
        }
    }

    /// Remove every row, returning how many were dropped. An empty table is
    /// not an error.
    pub fn clear_contacts(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM contacts", [])
            .context("failed to clear contacts")?;

        info!(removed, "cleared contacts");
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
            .context("failed to count contacts")?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
