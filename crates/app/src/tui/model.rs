use tagwatch_core::app::Dashboard;
use tagwatch_core::domain::{RepoEntry, StatusState};

/// Braille spinner shown on rows that are being resolved
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// The TUI Model: the dashboard state machine plus presentation-only state
pub struct TuiModel {
    /// Core state; every mutation goes through its operations
    pub dashboard: Dashboard,

    /// Current view mode
    pub mode: ViewMode,

    /// Add-repository form, meaningful while `mode` is `AddRepo`
    pub form: AddRepoForm,

    /// Advanced on every tick
    pub spinner_frame: usize,

    /// Whether an API token was found
    pub authenticated: bool,

    /// Base URL used for "open in browser"
    pub web_url: String,

    /// Whether the application should quit
    pub should_quit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Dashboard,
    AddRepo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Owner,
    Repo,
    Notes,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::Owner, FormField::Repo, FormField::Notes];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Owner => "Owner",
            FormField::Repo => "Repo",
            FormField::Notes => "Notes (optional)",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FormField::Owner => "e.g. your-org",
            FormField::Repo => "e.g. your-app",
            FormField::Notes => "e.g. Production API",
        }
    }

    fn next(self) -> Self {
        match self {
            FormField::Owner => FormField::Repo,
            FormField::Repo => FormField::Notes,
            FormField::Notes => FormField::Owner,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Owner => FormField::Notes,
            FormField::Repo => FormField::Owner,
            FormField::Notes => FormField::Repo,
        }
    }
}

/// Field input is capped per field
pub const FORM_FIELD_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddRepoForm {
    pub owner: String,
    pub repo: String,
    pub notes: String,
    pub focused: FormField,
}

impl AddRepoForm {
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Owner => &self.owner,
            FormField::Repo => &self.repo,
            FormField::Notes => &self.notes,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focused {
            FormField::Owner => &mut self.owner,
            FormField::Repo => &mut self.repo,
            FormField::Notes => &mut self.notes,
        }
    }

    pub fn push(&mut self, c: char) {
        let value = self.focused_mut();
        if value.chars().count() < FORM_FIELD_LIMIT {
            value.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.focused_mut().pop();
    }

    pub fn focus_next(&mut self) {
        self.focused = self.focused.next();
    }

    pub fn focus_prev(&mut self) {
        self.focused = self.focused.prev();
    }

    /// First required field left blank, if any
    pub fn missing_field(&self) -> Option<FormField> {
        if self.owner.trim().is_empty() {
            Some(FormField::Owner)
        } else if self.repo.trim().is_empty() {
            Some(FormField::Repo)
        } else {
            None
        }
    }
}

impl TuiModel {
    pub fn new(dashboard: Dashboard, authenticated: bool, web_url: impl Into<String>) -> Self {
        Self {
            dashboard,
            mode: ViewMode::Dashboard,
            form: AddRepoForm::default(),
            spinner_frame: 0,
            authenticated,
            web_url: web_url.into(),
            should_quit: false,
        }
    }

    pub fn tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn open_form(&mut self) {
        self.form = AddRepoForm::default();
        self.mode = ViewMode::AddRepo;
    }

    pub fn close_form(&mut self) {
        self.form = AddRepoForm::default();
        self.mode = ViewMode::Dashboard;
    }
}

/// Terminal lines taken by one repository row. Expanded rows that are
/// behind list their commits under the header, plus one line when some
/// commits were cut off.
pub fn row_height(dashboard: &Dashboard, entry: &RepoEntry) -> usize {
    let key = entry.key();
    if !dashboard.is_expanded(&key) {
        return 1;
    }
    match dashboard.status(&key) {
        Some(status) if status.state == StatusState::Behind && !status.recent_commits.is_empty() => {
            let more = usize::from(status.hidden_commits() > 0);
            1 + status.recent_commits.len() + more
        }
        _ => 1,
    }
}

/// Half-open range of row indices to draw in `height` lines so that the
/// cursor row is visible, roughly centred when possible
pub fn scroll_window(dashboard: &Dashboard, cursor: usize, height: usize) -> (usize, usize) {
    let entries = dashboard.entries();
    if entries.is_empty() {
        return (0, 0);
    }

    let fill = |start: usize| {
        let mut used = 0;
        let mut end = start;
        while end < entries.len() && used < height {
            used += row_height(dashboard, &entries[end]);
            end += 1;
        }
        end
    };

    let mut start = cursor.saturating_sub(height / 2);
    let mut end = fill(start);
    if cursor >= end {
        start = cursor;
        end = fill(start).max(cursor + 1).min(entries.len());
    }
    (start, end)
}
