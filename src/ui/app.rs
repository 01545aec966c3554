use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::db::ContactsModel;
use crate::models::{Contact, ContactDraft, ContactField};

use super::forms::{field_prefix, ConfirmClearAll, ConfirmDelete, ContactForm};
use super::helpers::{centered_rect, surface_error};
use super::pager::Pager;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown in the table overview.
const TABLE_PAGE_STEP: isize = 5;
/// Field order used by every form and page.
const FIELDS: [ContactField; 3] = [ContactField::Name, ContactField::Phone, ContactField::Email];

/// Top-level views.
enum Screen {
    /// One contact per page.
    Pages,
    /// Every contact in a single table with its own row cursor.
    Table(TableScreen),
}

struct TableScreen {
    selected: usize,
}

impl TableScreen {
    fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            return;
        }
        let new = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = new as usize;
    }

    fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Fine-grained modes layered on top of the current screen.
enum Mode {
    Normal,
    AddingContact(ContactForm),
    /// Inline editing of the contact shown on the current page.
    EditingContact {
        id: i64,
        form: ContactForm,
    },
    ConfirmDelete(ConfirmDelete),
    ConfirmClearAll(ConfirmClearAll),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    model: ContactsModel,
    contacts: Vec<Contact>,
    pager: Pager,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(model: ContactsModel, contacts: Vec<Contact>) -> Self {
        let pager = Pager::new(contacts.len());
        Self {
            model,
            contacts,
            pager,
            screen: Screen::Pages,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Dispatch a key press. Returns `true` once the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingContact(form) => self.handle_add_contact(code, form)?,
            Mode::EditingContact { id, form } => self.handle_edit_contact(code, id, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ConfirmClearAll(confirm) => self.handle_confirm_clear_all(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        // Shortcuts that behave the same on both screens.
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Ok(Mode::Normal);
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::AddingContact(ContactForm::default()));
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                let count = match self.model.count() {
                    Ok(count) => count,
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        return Ok(Mode::Normal);
                    }
                };
                if count == 0 {
                    self.set_status("There are no contacts to clear.", StatusKind::Error);
                    return Ok(Mode::Normal);
                }
                self.clear_status();
                return Ok(Mode::ConfirmClearAll(ConfirmClearAll { count }));
            }
            _ => {}
        }

        match self.screen {
            Screen::Pages => match code {
                KeyCode::Esc => *exit = true,
                KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => {
                    if !self.pager.next() && !self.pager.is_empty() {
                        self.set_status("Already on the last contact.", StatusKind::Info);
                    } else {
                        self.clear_status();
                    }
                }
                KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
                    if !self.pager.previous() && !self.pager.is_empty() {
                        self.set_status("Already on the first contact.", StatusKind::Info);
                    } else {
                        self.clear_status();
                    }
                }
                KeyCode::Home => {
                    self.clear_status();
                    self.pager.first();
                }
                KeyCode::End => {
                    self.clear_status();
                    self.pager.last();
                }
                KeyCode::Char('t') | KeyCode::Char('T') => {
                    self.clear_status();
                    let selected = self.pager.current().unwrap_or(0);
                    self.screen = Screen::Table(TableScreen { selected });
                }
                KeyCode::Char('-') | KeyCode::Char('d') => {
                    if let Some(contact) = self.current_contact() {
                        let confirm = ConfirmDelete::from(contact);
                        self.clear_status();
                        return Ok(Mode::ConfirmDelete(confirm));
                    }
                    self.set_status("No contact selected to delete.", StatusKind::Error);
                }
                KeyCode::Char('e') | KeyCode::Char('E') => return Ok(self.start_editing()),
                KeyCode::Char('m') | KeyCode::Char('M') => self.compose_email(),
                _ => {}
            },
            Screen::Table(ref mut table) => {
                let len = self.contacts.len();
                match code {
                    KeyCode::Esc | KeyCode::Char('t') | KeyCode::Char('T') => {
                        self.screen = Screen::Pages;
                    }
                    KeyCode::Up => table.move_selection(-1, len),
                    KeyCode::Down => table.move_selection(1, len),
                    KeyCode::PageUp => table.move_selection(-TABLE_PAGE_STEP, len),
                    KeyCode::PageDown => table.move_selection(TABLE_PAGE_STEP, len),
                    KeyCode::Home => table.move_selection(-(len as isize), len),
                    KeyCode::End => table.move_selection(len as isize, len),
                    KeyCode::Enter => {
                        let selected = table.selected;
                        self.screen = Screen::Pages;
                        self.pager.go_to(selected);
                    }
                    KeyCode::Char('-') | KeyCode::Char('d') => {
                        if let Some(contact) = self.contacts.get(table.selected) {
                            let confirm = ConfirmDelete::from(contact);
                            self.clear_status();
                            return Ok(Mode::ConfirmDelete(confirm));
                        }
                        self.set_status("No contact selected to delete.", StatusKind::Error);
                    }
                    KeyCode::Char('e') | KeyCode::Char('E') => {
                        let selected = table.selected;
                        self.screen = Screen::Pages;
                        self.pager.go_to(selected);
                        return Ok(self.start_editing());
                    }
                    _ => {}
                }
            }
        }

        Ok(Mode::Normal)
    }

    fn handle_add_contact(&mut self, code: KeyCode, mut form: ContactForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add contact cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_contact(&form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingContact(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_contact(&mut self, code: KeyCode, id: i64, mut form: ContactForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_contact(id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingContact { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_confirm_clear_all(
        &mut self,
        code: KeyCode,
        confirm: ConfirmClearAll,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Clear all cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_clear_all() {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmClearAll(confirm)),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Pages => self.draw_page(frame, content_area),
            Screen::Table(table) => self.draw_table(frame, content_area, table),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingContact(form) => self.draw_add_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ConfirmClearAll(confirm) => self.draw_confirm_clear_all(frame, area, confirm),
            // Inline editing is drawn by the page itself.
            Mode::EditingContact { .. } | Mode::Normal => {}
        }
    }

    fn draw_page(&self, frame: &mut Frame, area: Rect) {
        let Some(contact) = self.current_contact() else {
            let message = Paragraph::new("No contacts yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(message, area);
            return;
        };

        let editing = match &self.mode {
            Mode::EditingContact { id, form } if *id == contact.id => Some(form),
            _ => None,
        };

        let title = if editing.is_some() {
            format!("Editing Contact #{}", contact.id)
        } else {
            format!("Contact #{}", contact.id)
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_bottom(Line::from(self.pager.label()).right_aligned());
        if editing.is_some() {
            block = block.style(Style::default().fg(Color::Yellow));
        }
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let mut lines = vec![Line::from(format!("ID: {}", contact.id)), Line::from("")];
        match editing {
            Some(form) => {
                lines.extend(FIELDS.iter().map(|&field| form.build_line(field)));
                lines.push(Line::from(""));
                lines.push(form_hint(form));
            }
            None => {
                let value_style = Style::default().add_modifier(Modifier::BOLD);
                let values = [
                    contact.name.as_str(),
                    contact.phone_display(),
                    contact.email.as_str(),
                ];
                for (field, value) in FIELDS.iter().zip(values) {
                    lines.push(Line::from(vec![
                        Span::raw(field_prefix(*field)),
                        Span::styled(value.to_string(), value_style),
                    ]));
                }
            }
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if let Some(form) = editing {
            // Field lines start below the ID line and its spacer.
            set_form_cursor(frame, inner, 2, form);
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect, table: &TableScreen) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Contacts ({})", self.contacts.len()));

        if self.contacts.is_empty() {
            let message = Paragraph::new("No contacts yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(ContactsModel::headers().to_vec()).style(header_style);
        let rows = self.contacts.iter().map(|contact| {
            Row::new(vec![
                contact.id.to_string(),
                contact.name.clone(),
                contact.phone_display().to_string(),
                contact.email.clone(),
            ])
        });
        let widths = [
            Constraint::Length(6),
            Constraint::Percentage(30),
            Constraint::Length(12),
            Constraint::Min(10),
        ];

        let widget = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = TableState::default().with_selected(Some(table.selected));
        frame.render_stateful_widget(widget, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::AddingContact(_)) | (_, Mode::EditingContact { .. }) => &[
                ("[Tab]", " Next Field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::ConfirmDelete(_)) | (_, Mode::ConfirmClearAll(_)) => {
                &[("[y]", " Confirm   "), ("[n]", " Cancel")]
            }
            (Screen::Table(_), _) => &[
                ("[↑↓]", " Select   "),
                ("[Enter]", " Open   "),
                ("[+]", " Add   "),
                ("[-]", " Delete   "),
                ("[e]", " Edit   "),
                ("[c]", " Clear All   "),
                ("[t]", " Pages   "),
                ("[q]", " Quit"),
            ],
            (Screen::Pages, _) => &[
                ("[←→]", " Page   "),
                ("[+]", " Add   "),
                ("[-]", " Delete   "),
                ("[e]", " Edit   "),
                ("[c]", " Clear All   "),
                ("[m]", " Email   "),
                ("[t]", " Table   "),
                ("[q]", " Quit"),
            ],
        };

        Line::from(
            keys.iter()
                .flat_map(|(key, label)| [Span::styled(*key, key_style), Span::raw(*label)])
                .collect::<Vec<_>>(),
        )
    }

    fn draw_add_form(&self, frame: &mut Frame, area: Rect, form: &ContactForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Contact").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = FIELDS.iter().map(|&field| form.build_line(field)).collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        set_form_cursor(frame, inner, 0, form);
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let lines = vec![
            Line::from(format!("Delete {} (#{})?", confirm.name, confirm.id)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];
        draw_confirm(frame, area, "Confirm Deletion", lines);
    }

    fn draw_confirm_clear_all(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmClearAll) {
        let noun = if confirm.count == 1 { "contact" } else { "contacts" };
        let lines = vec![
            Line::from(format!("Remove all {} {noun}?", confirm.count)),
            Line::from("This cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];
        draw_confirm(frame, area, "Clear All Contacts", lines);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn start_editing(&mut self) -> Mode {
        match self.current_contact() {
            Some(contact) => {
                let mode = Mode::EditingContact {
                    id: contact.id,
                    form: ContactForm::from_contact(contact),
                };
                self.clear_status();
                mode
            }
            None => {
                self.set_status("No contact selected to edit.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn compose_email(&mut self) {
        let Some(contact) = self.current_contact().cloned() else {
            self.set_status("No contact selected.", StatusKind::Error);
            return;
        };
        match open_link(contact.mailto()) {
            Ok(()) => self.set_status(format!("Composing email to {contact}."), StatusKind::Info),
            Err(err) => {
                warn!(error = %err, "failed to open mail client");
                self.set_status(format!("Failed to open mail client: {err}"), StatusKind::Error);
            }
        }
    }

    /// Errors from validation or the INSERT keep the form open. Once the row is
    /// stored the form closes even if the re-fetch fails, so a retry cannot
    /// insert the same contact twice.
    fn save_new_contact(&mut self, form: &ContactForm) -> Result<()> {
        let draft: ContactDraft = form.parse_inputs()?;
        let contact = self.model.add_contact(&draft)?;
        match self.reload_contacts(Some(contact.id)) {
            Ok(()) => self.set_status(format!("Added {}.", contact.name), StatusKind::Info),
            Err(err) => self.report_reload_failure(&err),
        }
        Ok(())
    }

    fn save_existing_contact(&mut self, id: i64, form: &ContactForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        self.model.update_contact(id, &draft)?;
        match self.reload_contacts(Some(id)) {
            Ok(()) => self.set_status(format!("Updated {}.", draft.name), StatusKind::Info),
            Err(err) => self.report_reload_failure(&err),
        }
        Ok(())
    }

    fn report_reload_failure(&mut self, err: &anyhow::Error) {
        warn!(error = %format!("{err:#}"), "saved contact but failed to reload");
        self.set_status(
            format!("Saved, but failed to refresh contacts: {}", surface_error(err)),
            StatusKind::Error,
        );
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<()> {
        self.model.delete_contact(confirm.id)?;
        self.reload_contacts(None)?;
        self.set_status(format!("Deleted {}.", confirm.name), StatusKind::Info);
        Ok(())
    }

    fn perform_clear_all(&mut self) -> Result<()> {
        let removed = self.model.clear_contacts()?;
        self.reload_contacts(None)?;
        self.set_status(format!("Removed {removed} contacts."), StatusKind::Info);
        Ok(())
    }

    /// Re-fetch every row and resynchronize the pager and table cursor. When
    /// `focus_id` is still present its page becomes the visible one.
    fn reload_contacts(&mut self, focus_id: Option<i64>) -> Result<()> {
        self.contacts = self.model.fetch_contacts()?;
        let focus = focus_id.and_then(|id| self.contacts.iter().position(|c| c.id == id));
        self.pager.sync(self.contacts.len(), focus);

        if let Screen::Table(ref mut table) = self.screen {
            if let Some(index) = focus {
                table.selected = index;
            }
            table.clamp(self.contacts.len());
        }

        info!(count = self.contacts.len(), "reloaded contacts");
        Ok(())
    }

    fn current_contact(&self) -> Option<&Contact> {
        self.pager.current().and_then(|index| self.contacts.get(index))
    }

    #[cfg(test)]
    pub(crate) fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    #[cfg(test)]
    pub(crate) fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }
}

/// Red validation error, or the key hint when the form is clean.
fn form_hint(form: &ContactForm) -> Line<'static> {
    match &form.error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}

/// Park the terminal cursor at the end of the focused field. `first_row` is the
/// offset of the Name line inside `inner`.
fn set_form_cursor(frame: &mut Frame, inner: Rect, first_row: u16, form: &ContactForm) {
    let row = FIELDS
        .iter()
        .position(|&field| field == form.active)
        .unwrap_or(0) as u16;
    let prefix = field_prefix(form.active).len() as u16;
    let x = inner.x + prefix + form.value_len(form.active) as u16;
    let y = inner.y + first_row + row;
    if x < inner.right() && y < inner.bottom() {
        frame.set_cursor_position((x, y));
    }
}

fn draw_confirm(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, seeded_model};
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn seeded_app() -> App {
        let model = seeded_model();
        let contacts = model.fetch_contacts().unwrap();
        App::new(model, contacts)
    }

    fn empty_app() -> App {
        App::new(ContactsModel::new(open_in_memory().unwrap()), Vec::new())
    }

    fn press(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(*code).unwrap();
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn current_name(app: &App) -> Option<String> {
        app.current_contact().map(|c| c.name.clone())
    }

    #[test]
    fn paging_moves_between_contacts_and_stops_at_ends() {
        let mut app = seeded_app();
        assert_eq!(current_name(&app).as_deref(), Some("Linda"));

        press(&mut app, &[KeyCode::Right, KeyCode::Right]);
        assert_eq!(current_name(&app).as_deref(), Some("Lara"));

        press(&mut app, &[KeyCode::Left]);
        assert_eq!(current_name(&app).as_deref(), Some("Joe"));

        press(&mut app, &[KeyCode::End, KeyCode::Right]);
        assert_eq!(current_name(&app).as_deref(), Some("Jane"));
        assert_eq!(app.status_text(), Some("Already on the last contact."));

        press(&mut app, &[KeyCode::Home]);
        assert_eq!(current_name(&app).as_deref(), Some("Linda"));
    }

    #[test]
    fn adding_a_contact_jumps_to_its_page() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Char('+')]);
        type_text(&mut app, "Ann");
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        type_text(&mut app, "ann@example.com");
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.contacts().len(), 6);
        assert_eq!(current_name(&app).as_deref(), Some("Ann"));
        assert_eq!(app.current_contact().unwrap().phone, None);
        assert_eq!(app.status_text(), Some("Added Ann."));
    }

    #[test]
    fn add_form_stays_open_on_validation_error() {
        let mut app = empty_app();
        press(&mut app, &[KeyCode::Char('a')]);
        type_text(&mut app, "Ann");
        press(&mut app, &[KeyCode::Enter]);

        match &app.mode {
            Mode::AddingContact(form) => assert_eq!(
                form.error.as_deref(),
                Some("You must provide a contact's Email")
            ),
            _ => panic!("add form should remain open"),
        }
        assert!(app.contacts().is_empty());

        press(&mut app, &[KeyCode::Esc]);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.status_text(), Some("Add contact cancelled."));
    }

    #[test]
    fn delete_requires_confirmation_and_keeps_index() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Right, KeyCode::Char('-'), KeyCode::Char('n')]);
        assert_eq!(app.contacts().len(), 5);

        press(&mut app, &[KeyCode::Char('-'), KeyCode::Char('y')]);
        assert_eq!(app.contacts().len(), 4);
        assert_eq!(current_name(&app).as_deref(), Some("Lara"));
        assert_eq!(app.status_text(), Some("Deleted Joe."));
    }

    #[test]
    fn deleting_the_last_page_clamps_back() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::End, KeyCode::Char('d'), KeyCode::Enter]);
        assert_eq!(current_name(&app).as_deref(), Some("David"));
    }

    #[test]
    fn clear_all_empties_every_page() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Char('c')]);
        assert!(matches!(app.mode, Mode::ConfirmClearAll(ConfirmClearAll { count: 5 })));

        press(&mut app, &[KeyCode::Char('y')]);
        assert!(app.contacts().is_empty());
        assert_eq!(app.current_contact(), None);
        assert_eq!(app.status_text(), Some("Removed 5 contacts."));

        press(&mut app, &[KeyCode::Char('c')]);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.status_text(), Some("There are no contacts to clear."));
    }

    #[test]
    fn inline_edit_updates_the_current_contact() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Right, KeyCode::Char('e')]);
        // Replace "Joe" with "Joey" and blank the phone.
        type_text(&mut app, "y");
        press(&mut app, &[KeyCode::Tab]);
        for _ in 0..10 {
            press(&mut app, &[KeyCode::Backspace]);
        }
        press(&mut app, &[KeyCode::Enter]);

        let joey = app.current_contact().unwrap().clone();
        assert_eq!(joey.name, "Joey");
        assert_eq!(joey.phone, None);
        assert_eq!(joey.email, "joe@example.com");
        assert_eq!(app.pager.current(), Some(1));
    }

    #[test]
    fn escape_discards_inline_edit() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Char('e')]);
        type_text(&mut app, "zzz");
        press(&mut app, &[KeyCode::Esc]);

        assert_eq!(current_name(&app).as_deref(), Some("Linda"));
        assert_eq!(app.status_text(), Some("Edit cancelled."));
    }

    #[test]
    fn table_enter_opens_the_selected_page() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Char('t'), KeyCode::Down, KeyCode::Down, KeyCode::Down]);
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.screen, Screen::Pages));
        assert_eq!(current_name(&app).as_deref(), Some("David"));
    }

    #[test]
    fn quit_keys_request_exit() {
        let mut app = seeded_app();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(app.handle_key(KeyCode::Esc).unwrap());

        press(&mut app, &[KeyCode::Char('t')]);
        assert!(!app.handle_key(KeyCode::Esc).unwrap());
    }

    #[test]
    fn page_render_shows_fields_and_caption() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Right]);
        let screen = render(&app);

        assert!(screen.contains("Contact #2"));
        assert!(screen.contains("Name: Joe"));
        assert!(screen.contains("Phone: 1111111111"));
        assert!(screen.contains("Email: joe@example.com"));
        assert!(screen.contains("Page 2 of 5"));
    }

    #[test]
    fn table_render_lists_headers_and_rows() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Char('t')]);
        let screen = render(&app);

        for header in ContactsModel::headers() {
            assert!(screen.contains(header), "missing header {header}");
        }
        assert!(screen.contains("lara@example.com"));
        assert!(screen.contains("Contacts (5)"));
    }

    #[test]
    fn empty_render_prompts_to_add() {
        let app = empty_app();
        assert!(render(&app).contains("No contacts yet. Press '+' to add one."));
    }

    /// Build an app whose re-fetch fails after every write matching `event`:
    /// the trigger plants a row whose BLOB name cannot be read as text.
    fn app_with_unreadable_row_after(event: &str, seed: &[ContactDraft]) -> App {
        let conn = open_in_memory().unwrap();
        let model = ContactsModel::new(conn);
        for draft in seed {
            model.add_contact(draft).unwrap();
        }
        let contacts = model.fetch_contacts().unwrap();
        model
            .conn()
            .execute_batch(&format!(
                "CREATE TRIGGER plant_blob AFTER {event} ON contacts
                 BEGIN
                     INSERT INTO contacts (name, phone, email)
                     VALUES (x'00ff', NULL, 'blob@example.com');
                 END;"
            ))
            .unwrap();
        App::new(model, contacts)
    }

    #[test]
    fn failed_reload_after_insert_closes_form_without_duplicating() {
        let mut app = app_with_unreadable_row_after("INSERT", &[]);
        press(&mut app, &[KeyCode::Char('+')]);
        type_text(&mut app, "Ann");
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        type_text(&mut app, "a@x");
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app
            .status_text()
            .unwrap()
            .starts_with("Saved, but failed to refresh contacts:"));

        // A second Enter must not reach the model again.
        press(&mut app, &[KeyCode::Enter]);
        let ann_rows: i64 = app
            .model
            .conn()
            .query_row("SELECT COUNT(*) FROM contacts WHERE name = 'Ann'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(ann_rows, 1);
    }

    #[test]
    fn failed_reload_after_update_closes_inline_edit() {
        let seed = [ContactDraft::new("Joe", None, "joe@example.com")];
        let mut app = app_with_unreadable_row_after("UPDATE", &seed);
        press(&mut app, &[KeyCode::Char('e')]);
        type_text(&mut app, "y");
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app
            .status_text()
            .unwrap()
            .starts_with("Saved, but failed to refresh contacts:"));
        let joey_rows: i64 = app
            .model
            .conn()
            .query_row("SELECT COUNT(*) FROM contacts WHERE name = 'Joey'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(joey_rows, 1);
    }

    #[test]
    fn clear_all_dialog_counts_stored_rows() {
        let mut app = seeded_app();
        app.model
            .add_contact(&ContactDraft::new("Ann", None, "ann@example.com"))
            .unwrap();

        press(&mut app, &[KeyCode::Char('c')]);
        assert!(matches!(app.mode, Mode::ConfirmClearAll(ConfirmClearAll { count: 6 })));
        press(&mut app, &[KeyCode::Char('y')]);
        assert_eq!(app.status_text(), Some("Removed 6 contacts."));
    }

    #[test]
    fn table_delete_removes_the_selected_row() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::Char('t'), KeyCode::Down, KeyCode::Char('d')]);
        assert!(matches!(&app.mode, Mode::ConfirmDelete(confirm) if confirm.name == "Joe"));
        press(&mut app, &[KeyCode::Char('y')]);

        let names: Vec<&str> = app.contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Linda", "Lara", "David", "Jane"]);
        assert!(matches!(app.screen, Screen::Table(TableScreen { selected: 1 })));
    }

    #[test]
    fn table_edit_opens_inline_form_on_the_selected_page() {
        let mut app = seeded_app();
        let joe_id = app.contacts()[1].id;
        press(&mut app, &[KeyCode::Char('t'), KeyCode::Down, KeyCode::Char('e')]);

        assert!(matches!(app.screen, Screen::Pages));
        assert_eq!(current_name(&app).as_deref(), Some("Joe"));
        match &app.mode {
            Mode::EditingContact { id, form } => {
                assert_eq!(*id, joe_id);
                assert_eq!(form.name, "Joe");
            }
            _ => panic!("inline edit should be active"),
        }
    }

    #[test]
    fn home_and_end_clear_the_boundary_message() {
        let mut app = seeded_app();
        press(&mut app, &[KeyCode::End, KeyCode::Right]);
        assert_eq!(app.status_text(), Some("Already on the last contact."));
        press(&mut app, &[KeyCode::Home]);
        assert_eq!(app.status_text(), None);

        press(&mut app, &[KeyCode::Left]);
        assert_eq!(app.status_text(), Some("Already on the first contact."));
        press(&mut app, &[KeyCode::End]);
        assert_eq!(app.status_text(), None);
    }
}
