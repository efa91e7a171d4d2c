use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "dwellgrid") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("dwellgrid_config.json")
        }
    }

    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("dwellgrid"),
            )
        } else {
            ProjectDirs::from("", "", "dwellgrid").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("dwellgrid.log"))
    }

    /// Default root for per-player data folders
    pub fn player_data_dir() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("players"))
            .unwrap_or_else(|| PathBuf::from("player_data"))
    }
}

/// A freshly allocated player and the folder their rows go to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    pub id: u32,
    pub dir: PathBuf,
}

/// One numbered sub-directory per player under `root`.
#[derive(Debug, Clone)]
pub struct PlayerDirectory {
    root: PathBuf,
}

impl PlayerDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Highest numeric folder name, ignoring anything that isn't a number.
    pub fn last_id(&self) -> io::Result<Option<u32>> {
        if !self.root.exists() {
            return Ok(None);
        }
        let mut last = None;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) {
                last = last.max(Some(id));
            }
        }
        Ok(last)
    }

    /// Creates the next player's folder.
    pub fn allocate(&self) -> io::Result<PlayerSlot> {
        fs::create_dir_all(&self.root)?;
        let id = self.last_id()?.map_or(1, |last| last + 1);
        let dir = self.root.join(id.to_string());
        fs::create_dir_all(&dir)?;
        tracing::info!(player_id = id, dir = %dir.display(), "allocated player");
        Ok(PlayerSlot { id, dir })
    }
}
