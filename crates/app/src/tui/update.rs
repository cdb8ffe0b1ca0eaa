use super::model::{TuiModel, ViewMode};
use crossterm::event::{KeyCode, KeyModifiers};
use tagwatch_core::app::Command;
use tagwatch_core::domain::Event;
use tracing::debug;

/// The Update function - maps input and runtime events onto the model.
/// Returned commands are side effects for the runtime to carry out.
pub struct TuiUpdate;

impl TuiUpdate {
    pub fn handle_key(model: &mut TuiModel, key: KeyCode, modifiers: KeyModifiers) -> Vec<Command> {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return model.dashboard.quit();
        }

        match model.mode {
            ViewMode::Dashboard => Self::handle_dashboard_keys(model, key, modifiers),
            ViewMode::AddRepo => Self::handle_form_keys(model, key, modifiers),
        }
    }

    pub fn handle_event(model: &mut TuiModel, event: Event) -> Vec<Command> {
        model.dashboard.handle_event(event)
    }

    fn handle_dashboard_keys(
        model: &mut TuiModel,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Vec<Command> {
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return Vec::new();
        }

        let dashboard = &mut model.dashboard;
        match key {
            KeyCode::Char('q') => dashboard.quit(),

            KeyCode::Char('j') | KeyCode::Down => {
                dashboard.move_down();
                Vec::new()
            }
            KeyCode::Char('k') | KeyCode::Up => {
                dashboard.move_up();
                Vec::new()
            }
            KeyCode::Char('g') | KeyCode::Home => {
                dashboard.select_first();
                Vec::new()
            }
            KeyCode::Char('G') | KeyCode::End => {
                dashboard.select_last();
                Vec::new()
            }

            KeyCode::Enter | KeyCode::Char(' ') => {
                dashboard.toggle_selected();
                Vec::new()
            }
            KeyCode::Char('E') => {
                dashboard.expand_all();
                Vec::new()
            }
            KeyCode::Char('C') => {
                dashboard.collapse_all();
                Vec::new()
            }

            KeyCode::Char('r') => dashboard.refresh_all(),
            KeyCode::Char('R') => dashboard.refresh_selected(),

            KeyCode::Char('a') => {
                model.open_form();
                Vec::new()
            }
            KeyCode::Char('d') => dashboard.delete_selected(),
            KeyCode::Char('o') => dashboard.open_selected(&model.web_url),
            KeyCode::Char('?') => {
                dashboard.show_help();
                Vec::new()
            }

            _ => Vec::new(),
        }
    }

    fn handle_form_keys(model: &mut TuiModel, key: KeyCode, modifiers: KeyModifiers) -> Vec<Command> {
        match key {
            KeyCode::Esc => {
                model.close_form();
                Vec::new()
            }
            KeyCode::Tab | KeyCode::Down => {
                model.form.focus_next();
                Vec::new()
            }
            KeyCode::BackTab | KeyCode::Up => {
                model.form.focus_prev();
                Vec::new()
            }
            KeyCode::Enter => Self::submit_form(model),
            KeyCode::Backspace => {
                model.form.pop();
                Vec::new()
            }
            KeyCode::Char(c)
                if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                model.form.push(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Keep the form open on the first blank required field, otherwise hand
    /// the values to the dashboard
    fn submit_form(model: &mut TuiModel) -> Vec<Command> {
        if let Some(field) = model.form.missing_field() {
            debug!("Add form incomplete, focusing {:?}", field);
            model.form.focused = field;
            return Vec::new();
        }

        let form = std::mem::take(&mut model.form);
        model.close_form();
        model
            .dashboard
            .add_repository(&form.owner, &form.repo, &form.notes)
    }
}
