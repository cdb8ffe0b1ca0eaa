use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tagwatch_core::ports::{AppConfig, ConfigStore};
use tagwatch_core::CoreError;
use tracing::info;

const EXAMPLE_CONFIG: &str = r#"# tagwatch config - list of repositories to track
# Each entry must have owner and repo. notes is optional.

[[repos]]
owner = "your-org"
repo = "your-app"
notes = "Production app"

[[repos]]
owner = "your-org"
repo = "your-api"
notes = "Backend API"

# [remote]
# api_url = "https://api.github.com"
# web_url = "https://github.com"
# timeout_secs = 15

# [ui]
# auto_refresh_secs = 300
"#;

/// TOML file-based configuration store that implements ConfigStore
pub struct FileConfigStore {
    config_path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Result<Self> {
        let config_path = Self::get_default_config_path()?;
        Ok(Self { config_path })
    }

    pub fn with_path<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "tagwatch")
            .context("Failed to determine project directories")?;

        let config_dir = proj_dirs.config_dir();
        Ok(config_dir.join("repos.toml"))
    }

    /// Write a commented sample config. Refuses to replace an existing file
    /// unless `force` is set; returns whether the file was written.
    pub fn write_example(&self, force: bool) -> Result<bool> {
        if self.config_path.exists() && !force {
            return Ok(false);
        }
        self.write_atomically(EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to create {}", self.config_path.display()))?;
        info!("Wrote sample config to {}", self.config_path.display());
        Ok(true)
    }

    /// Replace the file via a sibling temp file and a rename
    fn write_atomically(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.config_path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.config_path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }

    fn persist_error(&self, message: impl ToString) -> CoreError {
        CoreError::ConfigPersist {
            path: self.config_path.clone(),
            message: message.to_string(),
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> tagwatch_core::Result<AppConfig> {
        let contents = match fs::read_to_string(&self.config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CoreError::ConfigMissing {
                    path: self.config_path.clone(),
                })
            }
            Err(e) => {
                return Err(CoreError::ConfigRead {
                    path: self.config_path.clone(),
                    message: e.to_string(),
                })
            }
        };

        toml::from_str(&contents).map_err(|e| CoreError::ConfigParse {
            path: self.config_path.clone(),
            message: e.to_string(),
        })
    }

    fn save(&self, config: &AppConfig) -> tagwatch_core::Result<()> {
        let contents = toml::to_string_pretty(config).map_err(|e| self.persist_error(e))?;

        self.write_atomically(&contents)
            .map_err(|e| self.persist_error(e))?;

        info!("Saved {} repositories to {}", config.repos.len(), self.config_path.display());
        Ok(())
    }
}
