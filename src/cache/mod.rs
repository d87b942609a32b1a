//! Local cache of fetched IDL documents
//!
//! Raw IDL JSON is stored per program so a cached document is normalized the
//! same way as a freshly downloaded one.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::errors::{ErrorContext, ViewerError, ViewerResult};

/// Cache of raw IDL documents keyed by program id
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    /// Cache rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.solana/idl_viewer_cache`, or a relative directory when there is no home
    pub fn default_dir() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".solana").join("idl_viewer_cache")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn cache_path(&self, program_id: &Pubkey) -> PathBuf {
        self.dir.join(format!("{}.json", program_id))
    }

    fn context(program_id: &Pubkey, operation: &str, path: &Path) -> ErrorContext {
        ErrorContext {
            program_id: Some(program_id.to_string()),
            component: "cache".to_string(),
            operation: operation.to_string(),
            details: Some(path.display().to_string()),
        }
    }

    /// Get the cached IDL for a program
    pub fn get(&self, program_id: &Pubkey) -> ViewerResult<Option<Value>> {
        let path = self.cache_path(program_id);

        if !path.exists() {
            debug!("No cache found for program: {}", program_id);
            return Ok(None);
        }

        debug!("Found cache for program: {}", program_id);
        let json = fs::read_to_string(&path)
            .map_err(|e| fail(Self::context(program_id, "reading cached IDL", &path), e))?;

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Save an IDL to the cache
    pub fn put(&self, program_id: &Pubkey, idl: &Value) -> ViewerResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| {
                fail(Self::context(program_id, "creating cache directory", &self.dir), e)
            })?;
        }

        let path = self.cache_path(program_id);
        let json = serde_json::to_string_pretty(idl)
            .map_err(|e| fail(Self::context(program_id, "serializing IDL", &path), e))?;

        fs::write(&path, json)
            .map_err(|e| fail(Self::context(program_id, "writing cached IDL", &path), e))?;

        debug!("Cached IDL for program: {}", program_id);
        Ok(())
    }

    /// Clear the cache for a program. Returns whether an entry was removed.
    pub fn clear(&self, program_id: &Pubkey) -> ViewerResult<bool> {
        let path = self.cache_path(program_id);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| fail(Self::context(program_id, "removing cached IDL", &path), e))?;
            debug!("Cleared cache for program: {}", program_id);
            Ok(true)
        } else {
            debug!("No cache to clear for program: {}", program_id);
            Ok(false)
        }
    }

    /// Clear all cached IDLs
    pub fn clear_all(&self) -> ViewerResult<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| {
                let context = ErrorContext {
                    program_id: None,
                    component: "cache".to_string(),
                    operation: "clearing cache directory".to_string(),
                    details: Some(self.dir.display().to_string()),
                };
                fail(context, e)
            })?;
            debug!("Cleared all cached IDLs");
        } else {
            debug!("No cache directory to clear");
        }

        Ok(())
    }
}

fn fail(context: ErrorContext, error: impl fmt::Display) -> ViewerError {
    ViewerError::Cache(format!("{}: {}", context, error))
}
