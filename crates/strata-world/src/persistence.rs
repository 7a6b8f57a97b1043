//! World saves on disk.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::WorldResult;
use crate::world::World;

/// On-disk encoding of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveFormat {
    /// Line-based text records
    Text,
    /// Compressed binary snapshot
    Binary,
}

impl SaveFormat {
    /// File extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "world",
            Self::Binary => "stwd",
        }
    }

    /// Format for a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "world" => Some(Self::Text),
            "stwd" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// A save found in the save directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    /// Save name (file stem)
    pub name: String,
    /// Encoding
    pub format: SaveFormat,
}

/// Reads and writes world saves in one directory.
#[derive(Debug, Clone)]
pub struct SaveManager {
    save_dir: PathBuf,
}

impl SaveManager {
    /// Creates a manager for `save_dir`. The directory is created on the
    /// first save.
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// The save directory.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Returns the file path for a save.
    #[must_use]
    pub fn save_path(&self, name: &str, format: SaveFormat) -> PathBuf {
        self.save_dir.join(format!("{name}.{}", format.extension()))
    }

    /// Checks if a save exists.
    #[must_use]
    pub fn exists(&self, name: &str, format: SaveFormat) -> bool {
        self.save_path(name, format).is_file()
    }

    /// Writes `world` as `name`. The file is written next to its final
    /// location and renamed into place, so an interrupted save never
    /// clobbers the previous one.
    pub fn save(&self, world: &World, name: &str, format: SaveFormat) -> WorldResult<PathBuf> {
        std::fs::create_dir_all(&self.save_dir)?;
        let path = self.save_path(name, format);
        let tmp = path.with_extension(format!("{}.tmp", format.extension()));

        match format {
            SaveFormat::Text => {
                let writer = BufWriter::new(File::create(&tmp)?);
                world.save_text(writer)?;
            },
            SaveFormat::Binary => {
                std::fs::write(&tmp, world.to_snapshot()?)?;
            },
        }
        std::fs::rename(&tmp, &path)?;

        info!("Saved world to {}", path.display());
        Ok(path)
    }

    /// Loads save `name` into `world`. On failure the world keeps its
    /// current grid.
    pub fn load(&self, world: &mut World, name: &str, format: SaveFormat) -> WorldResult<()> {
        let path = self.save_path(name, format);
        debug!("Loading world from {}", path.display());
        match format {
            SaveFormat::Text => world.load_text(BufReader::new(File::open(&path)?))?,
            SaveFormat::Binary => world.load_snapshot(&std::fs::read(&path)?)?,
        }
        info!("Loaded world from {}", path.display());
        Ok(())
    }

    /// Deletes a save. Returns `false` when it did not exist.
    pub fn delete(&self, name: &str, format: SaveFormat) -> WorldResult<bool> {
        let path = self.save_path(name, format);
        if !path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        Ok(true)
    }

    /// Lists saves, sorted by name then format. A missing directory has no
    /// saves.
    pub fn list(&self) -> WorldResult<Vec<SaveEntry>> {
        if !self.save_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut saves = Vec::new();
        for entry in std::fs::read_dir(&self.save_dir)? {
            let path = entry?.path();
            let format = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(SaveFormat::from_extension);
            let name = path.file_stem().and_then(|stem| stem.to_str());
            if let (Some(format), Some(name), true) = (format, name, path.is_file()) {
                saves.push(SaveEntry {
                    name: name.to_string(),
                    format,
                });
            }
        }
        saves.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.format.extension().cmp(b.format.extension()))
        });
        Ok(saves)
    }
}
