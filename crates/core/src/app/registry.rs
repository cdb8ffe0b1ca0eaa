use crate::domain::{RepoEntry, RepoKey};
use crate::error::{CoreError, Result};
use crate::ports::{AppConfig, ConfigStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Whether a registry mutation reached durable storage.
///
/// The in-memory change stands either way.
#[must_use]
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    Unsaved(CoreError),
}

/// The ordered list of tracked repositories, written through to the
/// config store on every mutation
pub struct Registry {
    config: AppConfig,
    store: Arc<dyn ConfigStore>,
}

impl Registry {
    /// Load the registry from `store`
    pub fn load(store: Arc<dyn ConfigStore>) -> Result<Self> {
        let config = store.load()?;
        info!("Loaded {} tracked repositories", config.repos.len());
        Ok(Self { config, store })
    }

    /// Wrap an already loaded config
    pub fn new(config: AppConfig, store: Arc<dyn ConfigStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn list(&self) -> &[RepoEntry] {
        &self.config.repos
    }

    pub fn len(&self) -> usize {
        self.config.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.repos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RepoEntry> {
        self.config.repos.get(index)
    }

    pub fn contains(&self, key: &RepoKey) -> bool {
        self.config.repos.iter().any(|e| &e.key() == key)
    }

    /// Append `entry` unless its key is already tracked
    pub fn add(&mut self, entry: RepoEntry) -> Result<SaveOutcome> {
        let key = entry.key();
        if self.contains(&key) {
            return Err(CoreError::DuplicateRepository { key });
        }

        info!("Tracking {}", key);
        self.config.repos.push(entry);
        Ok(self.save())
    }

    /// Remove the entry at `index`. Dropping any derived state for its key
    /// is the caller's job.
    pub fn remove(&mut self, index: usize) -> Result<(RepoEntry, SaveOutcome)> {
        if index >= self.config.repos.len() {
            return Err(CoreError::RepositoryNotFound { index });
        }

        let entry = self.config.repos.remove(index);
        info!("Stopped tracking {}", entry.key());
        Ok((entry, self.save()))
    }

    /// Persist the full registry
    pub fn save(&self) -> SaveOutcome {
        match self.store.save(&self.config) {
            Ok(()) => SaveOutcome::Saved,
            Err(e) => {
                warn!("Failed to save config: {}", e);
                SaveOutcome::Unsaved(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::RepoRef;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory store that records every save
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub config: Mutex<AppConfig>,
        pub saves: Mutex<usize>,
        pub fail_saves: bool,
    }

    impl MemoryStore {
        pub fn with_repos(repos: &[(&str, &str)]) -> Self {
            let config = AppConfig {
                repos: repos
                    .iter()
                    .map(|(o, r)| RepoEntry::new(RepoRef::new(*o, *r), ""))
                    .collect(),
                ..AppConfig::default()
            };
            Self {
                config: Mutex::new(config),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_saves: true,
                ..Self::default()
            }
        }

        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }

        pub fn stored_keys(&self) -> Vec<String> {
            self.config
                .lock()
                .unwrap()
                .repos
                .iter()
                .map(|e| e.key().0)
                .collect()
        }
    }

    impl ConfigStore for MemoryStore {
        fn load(&self) -> Result<AppConfig> {
            Ok(self.config.lock().unwrap().clone())
        }

        fn save(&self, config: &AppConfig) -> Result<()> {
            *self.saves.lock().unwrap() += 1;
            if self.fail_saves {
                return Err(CoreError::ConfigPersist {
                    path: PathBuf::from("/read-only/repos.toml"),
                    message: "permission denied".to_string(),
                });
            }
            *self.config.lock().unwrap() = config.clone();
            Ok(())
        }
    }

    fn entry(owner: &str, repo: &str) -> RepoEntry {
        RepoEntry::new(RepoRef::new(owner, repo), "")
    }

    #[test]
    fn test_load_keeps_order() -> Result<()> {
        let store = Arc::new(MemoryStore::with_repos(&[("acme", "web"), ("acme", "api")]));
        let registry = Registry::load(store)?;
        let keys: Vec<_> = registry.list().iter().map(|e| e.key().0).collect();
        assert_eq!(keys, vec!["acme/web", "acme/api"]);
        Ok(())
    }

    #[test]
    fn test_add_persists() -> Result<()> {
        let store = Arc::new(MemoryStore::default());
        let mut registry = Registry::load(store.clone())?;

        let outcome = registry.add(entry("acme", "web"))?;
        assert!(matches!(outcome, SaveOutcome::Saved));
        assert_eq!(registry.len(), 1);
        assert_eq!(store.stored_keys(), vec!["acme/web"]);
        Ok(())
    }

    #[test]
    fn test_add_duplicate_is_rejected_without_saving() -> Result<()> {
        let store = Arc::new(MemoryStore::with_repos(&[("acme", "web")]));
        let mut registry = Registry::load(store.clone())?;

        let err = registry.add(entry("acme", "web")).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRepository { .. }));
        assert!(err.to_string().contains("already tracked"));
        assert_eq!(registry.len(), 1);
        assert_eq!(store.save_count(), 0);
        Ok(())
    }

    #[test]
    fn test_remove_by_position() -> Result<()> {
        let store = Arc::new(MemoryStore::with_repos(&[("acme", "web"), ("acme", "api")]));
        let mut registry = Registry::load(store.clone())?;

        let (removed, outcome) = registry.remove(0)?;
        assert!(matches!(outcome, SaveOutcome::Saved));
        assert_eq!(removed.key().0, "acme/web");
        assert_eq!(store.stored_keys(), vec!["acme/api"]);
        Ok(())
    }

    #[test]
    fn test_remove_out_of_range() -> Result<()> {
        let store = Arc::new(MemoryStore::default());
        let mut registry = Registry::load(store)?;
        assert!(matches!(
            registry.remove(3),
            Err(CoreError::RepositoryNotFound { index: 3 })
        ));
        Ok(())
    }

    #[test]
    fn test_failed_save_keeps_in_memory_change() -> Result<()> {
        let store = Arc::new(MemoryStore::failing());
        let mut registry = Registry::load(store)?;

        let outcome = registry.add(entry("acme", "web"))?;
        assert!(matches!(outcome, SaveOutcome::Unsaved(CoreError::ConfigPersist { .. })));
        assert_eq!(registry.len(), 1);
        Ok(())
    }
}
