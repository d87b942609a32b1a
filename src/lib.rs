//! A viewer for Solana program IDLs
//!
//! Loads an Anchor-style IDL document, normalizes it into a [`ProgramModel`]
//! and renders text reports and mermaid diagrams over that model. IDLs can be
//! read from disk, looked up on the Solana explorer, or uploaded to the JSON
//! API server.

pub mod cache;
pub mod config;
pub mod discriminator;
pub mod errors;
pub mod fetch;
pub mod models;
pub mod normalizer;
pub mod server;
pub mod session;
pub mod views;

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde_json::Value;

pub use crate::cache::Cache;
pub use crate::config::{Cluster, ViewerConfig};
pub use crate::errors::{ErrorContext, ErrorExt, ViewerError, ViewerResult};
pub use crate::fetch::ExplorerClient;
pub use crate::models::ProgramModel;
pub use crate::normalizer::{normalize, normalize_with, NormalizeOptions};
pub use crate::session::SessionState;

/// Read and normalize an IDL file
pub fn load_idl(path: &Path) -> ViewerResult<ProgramModel> {
    load_idl_with(path, &NormalizeOptions::default())
}

/// Read and normalize an IDL file with explicit options
pub fn load_idl_with(path: &Path, options: &NormalizeOptions) -> ViewerResult<ProgramModel> {
    let text = fs::read_to_string(path).with_context(ErrorContext {
        program_id: None,
        component: "loader".to_string(),
        operation: "reading IDL file".to_string(),
        details: Some(path.display().to_string()),
    })?;

    let raw: Value = serde_json::from_str(&text).with_context(ErrorContext {
        program_id: None,
        component: "loader".to_string(),
        operation: "parsing IDL file".to_string(),
        details: Some(path.display().to_string()),
    })?;

    normalize_with(&raw, options)
}

/// Get the raw IDL of a program, from the cache when possible
///
/// A downloaded IDL is written back to the cache. Cache write failures are
/// logged and do not fail the lookup.
pub async fn fetch_idl(
    program_id: &str,
    config: &ViewerConfig,
    cache: Option<&Cache>,
) -> ViewerResult<Value> {
    let pubkey = fetch::validate_program_id(program_id)?;

    if let Some(cache) = cache {
        if let Some(idl) = cache.get(&pubkey)? {
            info!("Using cached IDL for program: {}", pubkey);
            return Ok(idl);
        }
    }

    let client = ExplorerClient::new(config)?;
    let idl = client.fetch_idl(&pubkey.to_string()).await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.put(&pubkey, &idl) {
            warn!("Failed to cache IDL for {}: {}", pubkey, e);
        } else {
            debug!("Saved IDL for {} to {}", pubkey, cache.dir().display());
        }
    }

    Ok(idl)
}

/// Version of the IDL viewer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
