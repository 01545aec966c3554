//! Binary entry point: load settings, start file logging, open the contacts
//! database, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use rp_contacts::{logging, open_database, run_app, App, Config, ContactsModel};
use tracing::{error, info};

/// Fatal startup problems (bad config, unreachable database) are returned to
/// the terminal instead of opening a half-working UI.
fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = logging::init(&config.log_dir()?, &config.log_filter)?;

    let db_path = config.database_path()?;
    let conn = open_database(&db_path).map_err(|err| {
        error!(error = %format!("{err:#}"), "database connection failed");
        err
    })?;

    let model = ContactsModel::new(conn);
    let contacts = model.fetch_contacts()?;
    info!(count = contacts.len(), "starting contacts UI");

    let mut app = App::new(model, contacts);
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "UI exited with an error");
    }
    result
}
