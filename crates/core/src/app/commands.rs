use crate::domain::{RepoRef, Ticket};

/// Side effects the dashboard asks its runtime to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve the status of a repository in the background
    Resolve { ticket: Ticket, target: RepoRef },

    /// Open a repository page in the user's browser
    OpenInBrowser { url: String },

    /// Quit the application
    Quit,
}
