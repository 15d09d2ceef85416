use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::storage_context;

/// Documents kept as files in one directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace `name` with `contents`; readers see the old or the new file, never a partial one
    pub fn write(&self, name: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory {}", self.dir.display()))?;

        let target = self.dir.join(name);
        let staging = self.dir.join(format!(".{}.tmp", name));
        fs::write(&staging, contents).with_context(|| storage_context("write", name))?;
        fs::rename(&staging, &target).with_context(|| storage_context("replace", name))?;

        info!("Saved {}", target.display());
        Ok(())
    }

    pub fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| storage_context("read", name)),
        }
    }
}
