//! The dashboard state machine.
//!
//! Owns the registry, the status projection and the view intent (cursor,
//! expanded rows, status line). Every method runs on the single control
//! loop; background work is requested by returning [`Command`]s and its
//! results come back through [`Dashboard::handle_event`].

use super::commands::Command;
use super::queries::{Completion, Overview, ReadProjection};
use super::registry::{Registry, SaveOutcome};
use crate::domain::{Event, RepoEntry, RepoKey, RepoRef, RepoStatus, StatusState, Ticket};
use crate::error::CoreError;
use std::collections::HashSet;
use tracing::{debug, info};

pub const HELP_TEXT: &str = "enter/space=expand  E=expand all  C=collapse all  r=refresh all  \
                             R=refresh row  a=add  d=delete  o=browser  j/k=move  q=quit";

pub struct Dashboard {
    registry: Registry,
    projection: ReadProjection,
    cursor: usize,
    expanded: HashSet<RepoKey>,
    status_message: Option<String>,
    next_ticket: u64,
}

impl Dashboard {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            projection: ReadProjection::new(),
            cursor: 0,
            expanded: HashSet::new(),
            status_message: None,
            next_ticket: 1,
        }
    }

    // --- queries -------------------------------------------------------

    pub fn entries(&self) -> &[RepoEntry] {
        self.registry.list()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&RepoEntry> {
        self.registry.get(self.cursor)
    }

    pub fn status(&self, key: &RepoKey) -> Option<&RepoStatus> {
        self.projection.status(key)
    }

    pub fn is_loading(&self, key: &RepoKey) -> bool {
        self.projection.is_loading(key)
    }

    pub fn state(&self, key: &RepoKey) -> Option<StatusState> {
        self.projection.state(key)
    }

    pub fn is_expanded(&self, key: &RepoKey) -> bool {
        self.expanded.contains(key)
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn overview(&self) -> Overview {
        self.projection.overview(self.registry.list())
    }

    // --- refresh -------------------------------------------------------

    /// Initial fan-out: one resolution per tracked repository
    pub fn start(&mut self) -> Vec<Command> {
        info!("Starting {} resolutions", self.registry.len());
        self.launch_all()
    }

    pub fn refresh_all(&mut self) -> Vec<Command> {
        self.status_message = Some("Refreshing all...".to_string());
        self.launch_all()
    }

    pub fn refresh_selected(&mut self) -> Vec<Command> {
        let Some(target) = self.selected().map(|e| e.target.clone()) else {
            return Vec::new();
        };
        self.status_message = Some(format!("Refreshing {}...", target));
        self.launch(target).into_iter().collect()
    }

    fn launch_all(&mut self) -> Vec<Command> {
        let targets: Vec<RepoRef> = self
            .registry
            .list()
            .iter()
            .map(|e| e.target.clone())
            .collect();
        targets.into_iter().filter_map(|t| self.launch(t)).collect()
    }

    /// Mark `target` loading and hand out a resolve command, unless a
    /// resolution for it is already running (then one follow-up is queued)
    fn launch(&mut self, target: RepoRef) -> Option<Command> {
        let ticket = Ticket(self.next_ticket);
        if !self.projection.begin(target.key(), ticket) {
            debug!("{} already in flight, queued follow-up", target);
            return None;
        }
        self.next_ticket += 1;
        Some(Command::Resolve { ticket, target })
    }

    /// Fold an event from the runtime into the state
    pub fn handle_event(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::StatusResolved { ticket, status } => {
                let target = status.target.clone();
                match self.projection.complete(ticket, status) {
                    Completion::Applied { follow_up: true } => {
                        self.launch(target).into_iter().collect()
                    }
                    Completion::Applied { follow_up: false } => Vec::new(),
                    Completion::Stale => {
                        debug!("Dropping stale result {} for {}", ticket, target);
                        Vec::new()
                    }
                }
            }
            Event::AutoRefreshDue => self.launch_all(),
        }
    }

    // --- navigation ----------------------------------------------------

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.select(self.cursor + 1);
    }

    pub fn select_first(&mut self) {
        self.cursor = 0;
    }

    pub fn select_last(&mut self) {
        self.cursor = self.registry.len().saturating_sub(1);
    }

    /// Move the cursor to `index`, clamped to the list
    pub fn select(&mut self, index: usize) {
        self.cursor = index.min(self.registry.len().saturating_sub(1));
    }

    // --- expansion -----------------------------------------------------

    pub fn toggle_selected(&mut self) {
        let Some(key) = self.selected().map(|e| e.key()) else {
            return;
        };
        if !self.expanded.remove(&key) {
            self.expanded.insert(key);
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.registry.list().iter().map(|e| e.key()).collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    // --- registry mutation ---------------------------------------------

    /// Validate and track a new repository, then resolve it right away
    pub fn add_repository(&mut self, owner: &str, repo: &str, notes: &str) -> Vec<Command> {
        let (owner, repo) = (owner.trim(), repo.trim());
        if owner.is_empty() || repo.is_empty() {
            self.report(CoreError::InvalidRepository {
                reason: "owner and repo are required".to_string(),
            });
            return Vec::new();
        }

        let target = RepoRef::new(owner, repo);
        match self
            .registry
            .add(RepoEntry::new(target.clone(), notes.trim()))
        {
            Ok(outcome) => {
                self.status_message = Some(match outcome {
                    SaveOutcome::Saved => format!("Added {}", target),
                    SaveOutcome::Unsaved(e) => format!("Added {} (not saved: {})", target, e),
                });
                self.launch(target).into_iter().collect()
            }
            Err(e) => {
                self.report(e);
                Vec::new()
            }
        }
    }

    /// Stop tracking the selected repository and drop its derived state
    pub fn delete_selected(&mut self) -> Vec<Command> {
        if self.registry.is_empty() {
            return Vec::new();
        }

        match self.registry.remove(self.cursor) {
            Ok((entry, outcome)) => {
                let key = entry.key();
                self.projection.forget(&key);
                self.expanded.remove(&key);
                self.select(self.cursor);
                self.status_message = Some(match outcome {
                    SaveOutcome::Saved => format!("Removed {}", key),
                    SaveOutcome::Unsaved(e) => format!("Removed {} (not saved: {})", key, e),
                });
            }
            Err(e) => self.report(e),
        }
        Vec::new()
    }

    // --- misc ----------------------------------------------------------

    pub fn open_selected(&self, web_base: &str) -> Vec<Command> {
        self.selected()
            .map(|e| Command::OpenInBrowser {
                url: e.target.web_url(web_base),
            })
            .into_iter()
            .collect()
    }

    pub fn show_help(&mut self) {
        self.status_message = Some(HELP_TEXT.to_string());
    }

    pub fn quit(&self) -> Vec<Command> {
        vec![Command::Quit]
    }

    fn report(&mut self, err: CoreError) {
        info!("{}", err);
        self.status_message = Some(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::registry::tests::MemoryStore;
    use crate::domain::{CommitSummary, RefKind};
    use chrono::Utc;
    use std::sync::Arc;

    fn dashboard(repos: &[(&str, &str)]) -> (Dashboard, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_repos(repos));
        let registry = Registry::load(store.clone()).unwrap();
        (Dashboard::new(registry), store)
    }

    fn tickets(commands: &[Command]) -> Vec<(Ticket, String)> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Resolve { ticket, target } => Some((*ticket, target.key().0)),
                _ => None,
            })
            .collect()
    }

    fn behind(owner: &str, repo: &str, ahead: u32) -> RepoStatus {
        let commits = (0..ahead)
            .map(|i| CommitSummary::new(&format!("abcdef{}", i), "msg", None))
            .collect();
        RepoStatus::compared(
            RepoRef::new(owner, repo),
            "main",
            "v1",
            RefKind::Tag,
            ahead,
            commits,
            Utc::now(),
        )
    }

    fn key(s: &str) -> RepoKey {
        RepoKey(s.to_string())
    }

    #[test]
    fn test_start_fans_out_to_every_entry() {
        let (mut dash, _) = dashboard(&[("acme", "web"), ("acme", "api"), ("acme", "new")]);
        let launched = tickets(&dash.start());

        assert_eq!(launched.len(), 3);
        let tickets: HashSet<_> = launched.iter().map(|(t, _)| *t).collect();
        assert_eq!(tickets.len(), 3, "every launch gets its own ticket");
        assert!(dash.is_loading(&key("acme/api")));
        assert_eq!(dash.overview().loading, 3);
    }

    #[test]
    fn test_completions_apply_in_any_order() {
        let (mut dash, _) = dashboard(&[("acme", "web"), ("acme", "api")]);
        let launched = tickets(&dash.start());
        let (web_ticket, api_ticket) = (launched[0].0, launched[1].0);

        dash.handle_event(Event::StatusResolved {
            ticket: api_ticket,
            status: behind("acme", "api", 3),
        });
        assert!(dash.is_loading(&key("acme/web")));
        assert_eq!(dash.state(&key("acme/api")), Some(StatusState::Behind));

        dash.handle_event(Event::StatusResolved {
            ticket: web_ticket,
            status: behind("acme", "web", 0),
        });
        assert_eq!(dash.state(&key("acme/web")), Some(StatusState::Clean));
        assert_eq!(dash.status(&key("acme/api")).unwrap().commits_ahead, 3);
    }

    #[test]
    fn test_refresh_while_loading_queues_single_follow_up() {
        let (mut dash, _) = dashboard(&[("acme", "web")]);
        let first = tickets(&dash.start());
        assert!(dash.refresh_selected().is_empty());
        assert!(dash.refresh_all().is_empty());

        let follow_up = dash.handle_event(Event::StatusResolved {
            ticket: first[0].0,
            status: behind("acme", "web", 1),
        });
        let follow_up = tickets(&follow_up);
        assert_eq!(follow_up.len(), 1);
        assert_ne!(follow_up[0].0, first[0].0);
        assert!(dash.is_loading(&key("acme/web")));

        let nothing = dash.handle_event(Event::StatusResolved {
            ticket: follow_up[0].0,
            status: behind("acme", "web", 2),
        });
        assert!(nothing.is_empty());
        assert!(!dash.is_loading(&key("acme/web")));
    }

    #[test]
    fn test_late_result_for_deleted_repo_is_ignored() {
        let (mut dash, _) = dashboard(&[("acme", "web"), ("acme", "api")]);
        let launched = tickets(&dash.start());

        dash.delete_selected();
        dash.handle_event(Event::StatusResolved {
            ticket: launched[0].0,
            status: behind("acme", "web", 2),
        });

        assert!(dash.status(&key("acme/web")).is_none());
        assert_eq!(dash.entries().len(), 1);
        assert_eq!(dash.overview().behind, 0);
    }

    #[test]
    fn test_delete_cascades_and_clamps_cursor() {
        let (mut dash, store) = dashboard(&[("acme", "web"), ("acme", "api")]);
        let launched = tickets(&dash.start());
        dash.handle_event(Event::StatusResolved {
            ticket: launched[1].0,
            status: behind("acme", "api", 1),
        });
        dash.select_last();
        dash.toggle_selected();

        dash.delete_selected();

        assert_eq!(dash.entries().len(), 1);
        assert_eq!(dash.cursor(), 0);
        assert!(dash.status(&key("acme/api")).is_none());
        assert!(!dash.is_loading(&key("acme/api")));
        assert!(!dash.is_expanded(&key("acme/api")));
        assert_eq!(store.stored_keys(), vec!["acme/web"]);
        assert_eq!(dash.status_message(), Some("Removed acme/api"));
    }

    #[test]
    fn test_delete_last_entry_leaves_cursor_at_zero() {
        let (mut dash, _) = dashboard(&[("acme", "web")]);
        dash.delete_selected();
        assert_eq!(dash.cursor(), 0);
        assert!(dash.entries().is_empty());
        assert!(dash.delete_selected().is_empty());
    }

    #[test]
    fn test_add_launches_resolution() {
        let (mut dash, store) = dashboard(&[]);
        let launched = tickets(&dash.add_repository("  acme ", " web ", " Production "));

        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].1, "acme/web");
        assert_eq!(dash.entries()[0].notes, "Production");
        assert_eq!(store.stored_keys(), vec!["acme/web"]);
        assert_eq!(dash.status_message(), Some("Added acme/web"));
    }

    #[test]
    fn test_add_duplicate_reports_already_tracked() {
        let (mut dash, store) = dashboard(&[("acme", "web")]);
        let commands = dash.add_repository("acme", "web", "");

        assert!(commands.is_empty());
        assert_eq!(dash.entries().len(), 1);
        assert_eq!(store.save_count(), 0);
        assert!(dash.status_message().unwrap().contains("already tracked"));
    }

    #[test]
    fn test_add_requires_owner_and_repo() {
        let (mut dash, _) = dashboard(&[]);
        assert!(dash.add_repository("  ", "web", "").is_empty());
        assert!(dash.add_repository("acme", "", "").is_empty());
        assert!(dash.entries().is_empty());
        assert!(dash.status_message().unwrap().contains("required"));
    }

    #[test]
    fn test_add_with_failing_store_keeps_entry() {
        let store = Arc::new(MemoryStore::failing());
        let mut dash = Dashboard::new(Registry::load(store).unwrap());

        let launched = dash.add_repository("acme", "web", "");
        assert_eq!(launched.len(), 1);
        assert_eq!(dash.entries().len(), 1);
        assert!(dash.status_message().unwrap().contains("not saved"));
    }

    #[test]
    fn test_delete_with_failing_store_still_removes_entry() {
        let store = Arc::new(MemoryStore {
            fail_saves: true,
            ..MemoryStore::with_repos(&[("acme", "web"), ("acme", "api")])
        });
        let mut dash = Dashboard::new(Registry::load(store.clone()).unwrap());
        dash.start();

        assert!(dash.delete_selected().is_empty());

        assert_eq!(dash.entries().len(), 1);
        assert!(!dash.is_loading(&key("acme/web")));
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.stored_keys(), vec!["acme/web", "acme/api"]);
        let message = dash.status_message().unwrap();
        assert!(message.starts_with("Removed acme/web (not saved: "));
        assert!(message.contains("permission denied"));
    }

    #[test]
    fn test_cursor_is_clamped() {
        let (mut dash, _) = dashboard(&[("acme", "web"), ("acme", "api")]);
        dash.move_up();
        assert_eq!(dash.cursor(), 0);
        dash.move_down();
        dash.move_down();
        dash.move_down();
        assert_eq!(dash.cursor(), 1);
        dash.select_first();
        assert_eq!(dash.cursor(), 0);
        dash.select(10);
        assert_eq!(dash.cursor(), 1);

        let (mut empty, _) = dashboard(&[]);
        empty.move_down();
        empty.select_last();
        assert_eq!(empty.cursor(), 0);
    }

    #[test]
    fn test_expansion_is_presentational_only() {
        let (mut dash, _) = dashboard(&[("acme", "web"), ("acme", "api")]);
        dash.toggle_selected();
        assert!(dash.is_expanded(&key("acme/web")));
        dash.toggle_selected();
        assert!(!dash.is_expanded(&key("acme/web")));

        dash.expand_all();
        assert!(dash.is_expanded(&key("acme/api")));
        dash.collapse_all();
        assert!(!dash.is_expanded(&key("acme/api")));
        assert_eq!(dash.overview().loading, 0);
    }

    #[test]
    fn test_open_selected_builds_url() {
        let (dash, _) = dashboard(&[("acme", "web")]);
        assert_eq!(
            dash.open_selected("https://github.com"),
            vec![Command::OpenInBrowser {
                url: "https://github.com/acme/web".to_string()
            }]
        );

        let (empty, _) = dashboard(&[]);
        assert!(empty.open_selected("https://github.com").is_empty());
    }

    #[test]
    fn test_auto_refresh_relaunches_idle_repos() {
        let (mut dash, _) = dashboard(&[("acme", "web")]);
        let launched = tickets(&dash.start());
        dash.handle_event(Event::StatusResolved {
            ticket: launched[0].0,
            status: behind("acme", "web", 0),
        });

        let again = tickets(&dash.handle_event(Event::AutoRefreshDue));
        assert_eq!(again.len(), 1);
        assert!(dash.is_loading(&key("acme/web")));
        assert_eq!(dash.state(&key("acme/web")), Some(StatusState::Loading));
        assert!(dash.status(&key("acme/web")).is_some());
    }
}
