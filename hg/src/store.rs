//! Local persistence of the active grid and the API credential

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::{debug, info};

use crate::domain::Grid;
use crate::generation::{GenerationError, GenerationEvent};

/// File holding the active grid document
pub const GRID_FILE: &str = "harada-grid.json";

/// File holding the stored API key
pub const CREDENTIAL_FILE: &str = "openai-api-key";

/// Key-value store rooted at the data directory
pub struct GridStore {
    base_path: PathBuf,
}

impl GridStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        debug!(path = %base_path.display(), "GridStore::open: called");
        fs::create_dir_all(&base_path)
            .context(format!("Failed to create data directory {}", base_path.display()))?;
        Ok(Self { base_path })
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn grid_path(&self) -> PathBuf {
        self.base_path.join(GRID_FILE)
    }

    fn credential_path(&self) -> PathBuf {
        self.base_path.join(CREDENTIAL_FILE)
    }

    /// The active grid, if any
    pub fn load_grid(&self) -> Result<Option<Grid>> {
        let path = self.grid_path();
        if !path.exists() {
            debug!("load_grid: no active grid");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
        let grid: Grid =
            serde_json::from_str(&content).context(format!("Failed to parse grid document {}", path.display()))?;
        grid.validate()
            .map_err(|e| eyre::eyre!("Stored grid is invalid: {}", e))?;
        Ok(Some(grid))
    }

    /// Persist the grid, replacing the previous document atomically
    pub fn save_grid(&self, grid: &Grid) -> Result<()> {
        debug!(goal = %grid.goal, "save_grid: called");
        let json = serde_json::to_string_pretty(grid).context("Failed to serialize grid")?;
        self.write_atomic(&self.grid_path(), json.as_bytes(), false)
    }

    /// Discard the active grid; returns whether one existed
    pub fn clear_grid(&self) -> Result<bool> {
        let path = self.grid_path();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).context(format!("Failed to remove {}", path.display()))?;
        info!("clear_grid: active grid discarded");
        Ok(true)
    }

    /// Write one generation event into the stored grid of the run that produced it
    ///
    /// Only the event's own slot is written, so cells edited while the run is
    /// going keep their edits. Returns `false` without writing when the active
    /// grid was reset or replaced since `run` started.
    pub fn sync_event(&self, run: &Grid, event: &GenerationEvent) -> Result<bool> {
        let Some(mut stored) = self.load_grid()? else {
            debug!("sync_event: active grid was reset");
            return Ok(false);
        };

        if stored.created_at != run.created_at || stored.goal != run.goal {
            debug!(stored_goal = %stored.goal, "sync_event: active grid belongs to another run");
            return Ok(false);
        }

        let changed = stored
            .apply(event)
            .map_err(|e| eyre::eyre!("Failed to apply {} event: {}", event.event_type(), e))?;
        if changed {
            self.save_grid(&stored)?;
        }
        Ok(true)
    }

    /// The stored API key, if any
    pub fn load_credential(&self) -> Result<Option<String>> {
        let path = self.credential_path();
        if !path.exists() {
            return Ok(None);
        }
        let key = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
        let key = key.trim().to_string();
        Ok(if key.is_empty() { None } else { Some(key) })
    }

    /// Store the API key verbatim (trimmed)
    pub fn save_credential(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(eyre::eyre!("API key must not be empty"));
        }
        self.write_atomic(&self.credential_path(), key.as_bytes(), true)?;
        info!("save_credential: API key stored");
        Ok(())
    }

    /// Remove the stored API key; returns whether one existed
    pub fn clear_credential(&self) -> Result<bool> {
        let path = self.credential_path();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).context(format!("Failed to remove {}", path.display()))?;
        Ok(true)
    }

    /// Write through a temp file and rename; `private` files are owner-only from creation
    fn write_atomic(&self, path: &Path, bytes: &[u8], private: bool) -> Result<()> {
        let tmp = path.with_extension("tmp");
        {
            let mut file = create_file(&tmp, private).context(format!("Failed to create {}", tmp.display()))?;
            file.write_all(bytes).context("Failed to write data")?;
            file.sync_all().context("Failed to sync data")?;
        }
        fs::rename(&tmp, path).context(format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// Create `path` fresh, replacing any leftover temp file
fn create_file(path: &Path, private: bool) -> io::Result<fs::File> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    restrict_mode(&mut options, private);
    options.open(path)
}

#[cfg(unix)]
fn restrict_mode(options: &mut fs::OpenOptions, private: bool) {
    use std::os::unix::fs::OpenOptionsExt;
    if private {
        options.mode(0o600);
    }
}

#[cfg(not(unix))]
fn restrict_mode(_options: &mut fs::OpenOptions, _private: bool) {}

/// Where the effective credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Flag,
    Stored,
    Environment,
}

/// Pick the API key: explicit flag, then stored key, then environment
///
/// Blank values at any level are skipped.
pub fn resolve_credential(
    flag: Option<&str>,
    stored: Option<&str>,
    env_var: &str,
) -> Result<(String, CredentialSource), GenerationError> {
    let env_value = std::env::var(env_var).ok();

    [
        (flag, CredentialSource::Flag),
        (stored, CredentialSource::Stored),
        (env_value.as_deref(), CredentialSource::Environment),
    ]
    .into_iter()
    .find_map(|(value, source)| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| (v.to_string(), source))
    })
    .ok_or_else(|| GenerationError::MissingCredential {
        env_var: env_var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, GridStore) {
        let dir = TempDir::new().unwrap();
        let store = GridStore::open(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_no_grid_initially() {
        let (_dir, store) = store();
        assert!(store.load_grid().unwrap().is_none());
        assert!(!store.clear_grid().unwrap());
    }

    #[test]
    fn test_save_load_clear_grid() {
        let (_dir, store) = store();
        let mut grid = Grid::new("Write a novel").unwrap();
        grid.set_pillar_title(0, "Craft").unwrap();

        store.save_grid(&grid).unwrap();
        let loaded = store.load_grid().unwrap().unwrap();
        assert_eq!(loaded, grid);

        assert!(store.clear_grid().unwrap());
        assert!(store.load_grid().unwrap().is_none());
    }

    fn started_run(store: &GridStore) -> Grid {
        let run = Grid::new("Write a novel").unwrap();
        store.save_grid(&run).unwrap();
        run
    }

    #[test]
    fn test_sync_event_writes_slot() {
        let (_dir, store) = store();
        let run = started_run(&store);

        let event = GenerationEvent::PillarReady {
            pillar: 2,
            title: "Craft".to_string(),
        };
        assert!(store.sync_event(&run, &event).unwrap());

        let stored = store.load_grid().unwrap().unwrap();
        assert_eq!(stored.pillars[2].title, "Craft");
        assert_eq!(stored.created_at, run.created_at);
    }

    #[test]
    fn test_sync_event_keeps_edits_to_other_cells() {
        let (_dir, store) = store();
        let mut run = started_run(&store);

        let pillar = GenerationEvent::PillarReady {
            pillar: 0,
            title: "Craft".to_string(),
        };
        run.apply(&pillar).unwrap();
        store.sync_event(&run, &pillar).unwrap();

        // The user renames the pillar generation already filled
        let mut edited = store.load_grid().unwrap().unwrap();
        edited.set_pillar_title(0, "My craft").unwrap();
        store.save_grid(&edited).unwrap();

        let task = GenerationEvent::TaskReady {
            pillar: 0,
            task: 0,
            text: "Write 500 words daily".to_string(),
        };
        run.apply(&task).unwrap();
        assert!(store.sync_event(&run, &task).unwrap());

        let stored = store.load_grid().unwrap().unwrap();
        assert_eq!(stored.pillars[0].title, "My craft");
        assert_eq!(stored.pillars[0].tasks[0], "Write 500 words daily");
    }

    #[test]
    fn test_sync_event_after_reset_does_not_recreate_grid() {
        let (_dir, store) = store();
        let run = started_run(&store);
        store.clear_grid().unwrap();

        let event = GenerationEvent::PillarReady {
            pillar: 0,
            title: "Craft".to_string(),
        };
        assert!(!store.sync_event(&run, &event).unwrap());
        assert!(store.load_grid().unwrap().is_none());
    }

    #[test]
    fn test_sync_event_leaves_replacing_grid_alone() {
        let (_dir, store) = store();
        let run = started_run(&store);
        store.save_grid(&Grid::example()).unwrap();

        let event = GenerationEvent::PillarReady {
            pillar: 0,
            title: "Craft".to_string(),
        };
        assert!(!store.sync_event(&run, &event).unwrap());
        let stored = store.load_grid().unwrap().unwrap();
        assert_eq!(stored.goal, Grid::example().goal);
        assert_eq!(stored.pillars[0].title, "Body Care");
    }

    #[test]
    fn test_load_rejects_malformed_document() {
        let (_dir, store) = store();
        fs::write(store.path().join(GRID_FILE), "{\"goal\": \"x\"}").unwrap();
        assert!(store.load_grid().is_err());
    }

    #[test]
    fn test_credential_round_trip() {
        let (_dir, store) = store();
        assert!(store.load_credential().unwrap().is_none());

        store.save_credential("  sk-test-123 \n").unwrap();
        assert_eq!(store.load_credential().unwrap().as_deref(), Some("sk-test-123"));

        assert!(store.clear_credential().unwrap());
        assert!(store.load_credential().unwrap().is_none());
    }

    #[test]
    fn test_empty_credential_rejected() {
        let (_dir, store) = store();
        assert!(store.save_credential("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_credential_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = store();
        store.save_credential("sk-secret").unwrap();
        let mode = fs::metadata(store.path().join(CREDENTIAL_FILE)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_private_temp_file_is_never_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = store();

        // A stale, world-readable temp file from an interrupted write
        let tmp = store.path().join(CREDENTIAL_FILE).with_extension("tmp");
        fs::write(&tmp, "old").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();

        let file = create_file(&tmp, true).unwrap();
        let mode = file.metadata().unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&tmp).unwrap(), "");
    }

    #[test]
    fn test_resolve_credential_precedence() {
        let env = "HARADA_TEST_UNSET_KEY_VAR";

        let (key, source) = resolve_credential(Some("sk-flag"), Some("sk-stored"), env).unwrap();
        assert_eq!((key.as_str(), source), ("sk-flag", CredentialSource::Flag));

        let (key, source) = resolve_credential(Some("  "), Some("sk-stored"), env).unwrap();
        assert_eq!((key.as_str(), source), ("sk-stored", CredentialSource::Stored));

        let err = resolve_credential(None, None, env).unwrap_err();
        assert_eq!(
            err,
            GenerationError::MissingCredential {
                env_var: env.to_string()
            }
        );
    }

    #[test]
    fn test_resolve_credential_from_environment() {
        // PATH is always set; any non-empty variable works as a stand-in
        let (key, source) = resolve_credential(None, None, "PATH").unwrap();
        assert!(!key.is_empty());
        assert_eq!(source, CredentialSource::Environment);
    }
}
