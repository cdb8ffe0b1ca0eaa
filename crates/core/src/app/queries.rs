use crate::domain::{RepoEntry, RepoKey, RepoStatus, StatusState, Ticket};
use std::collections::{HashMap, HashSet};

/// How a completed resolution was folded into the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Cache replaced; `follow_up` is set when another refresh was asked for
    /// while this one ran
    Applied { follow_up: bool },
    /// The ticket is no longer current for its key (deleted or superseded)
    Stale,
}

/// Last known statuses plus the set of keys currently being resolved
#[derive(Debug, Default)]
pub struct ReadProjection {
    statuses: HashMap<RepoKey, RepoStatus>,
    in_flight: HashMap<RepoKey, Ticket>,
    follow_ups: HashSet<RepoKey>,
}

/// Counters for the overview panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overview {
    pub total: usize,
    pub behind: usize,
    pub clean: usize,
    pub no_release: usize,
    pub errors: usize,
    pub loading: usize,
}

impl ReadProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, key: &RepoKey) -> Option<&RepoStatus> {
        self.statuses.get(key)
    }

    pub fn is_loading(&self, key: &RepoKey) -> bool {
        self.in_flight.contains_key(key)
    }

    /// State to display for `key`: `Loading` while in flight, otherwise the
    /// cached state; `None` if never resolved and not loading
    pub fn state(&self, key: &RepoKey) -> Option<StatusState> {
        if self.is_loading(key) {
            return Some(StatusState::Loading);
        }
        self.statuses.get(key).map(|s| s.state)
    }

    /// Mark `key` in flight under `ticket`. Returns `false` (and queues one
    /// follow-up) when a resolution for `key` is already running.
    pub fn begin(&mut self, key: RepoKey, ticket: Ticket) -> bool {
        if self.in_flight.contains_key(&key) {
            self.follow_ups.insert(key);
            return false;
        }
        self.in_flight.insert(key, ticket);
        true
    }

    /// Apply a completed resolution. Results for keys that are no longer in
    /// flight under `ticket` are dropped.
    pub fn complete(&mut self, ticket: Ticket, status: RepoStatus) -> Completion {
        let key = status.target.key();
        if self.in_flight.get(&key) != Some(&ticket) {
            return Completion::Stale;
        }

        self.in_flight.remove(&key);
        let follow_up = self.follow_ups.remove(&key);
        self.statuses.insert(key, status);
        Completion::Applied { follow_up }
    }

    /// Drop everything known about `key`
    pub fn forget(&mut self, key: &RepoKey) {
        self.statuses.remove(key);
        self.in_flight.remove(key);
        self.follow_ups.remove(key);
    }

    /// Overview counters over the given entries
    pub fn overview(&self, entries: &[RepoEntry]) -> Overview {
        let mut overview = Overview {
            total: entries.len(),
            loading: self.in_flight.len(),
            ..Overview::default()
        };

        for entry in entries {
            match self.statuses.get(&entry.key()).map(|s| s.state) {
                Some(StatusState::Behind) => overview.behind += 1,
                Some(StatusState::Clean) => overview.clean += 1,
                Some(StatusState::NoRelease) => overview.no_release += 1,
                Some(StatusState::Error) => overview.errors += 1,
                Some(StatusState::Loading) | None => {}
            }
        }

        overview
    }
}
