//! Runtime configuration for the viewer

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};

/// Environment variable for the server bind address
pub const BIND_ADDR_ENV: &str = "IDL_VIEWER_BIND_ADDR";
/// Environment variable for the explorer cluster
pub const CLUSTER_ENV: &str = "IDL_VIEWER_CLUSTER";
/// Environment variable for the explorer base URL
pub const EXPLORER_URL_ENV: &str = "IDL_VIEWER_EXPLORER_URL";

/// Default explorer base URL
pub const DEFAULT_EXPLORER_URL: &str = "https://explorer.solana.com";
/// Default server bind address
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
/// Default timeout for explorer requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default lifetime of one API server connection
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Cluster the explorer is queried on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cluster {
    #[default]
    Devnet,
    Mainnet,
    Testnet,
}

impl Cluster {
    /// Name used in the explorer `cluster` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Mainnet => "mainnet-beta",
            Cluster::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            "testnet" => Ok(Cluster::Testnet),
            other => Err(format!(
                "unknown cluster '{}' (expected devnet, mainnet-beta or testnet)",
                other
            )),
        }
    }
}

/// Viewer configuration
///
/// Built from [`ViewerConfig::default`] or [`ViewerConfig::from_env`], then
/// adjusted by the CLI through the `with_*` setters.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Cluster passed to the explorer
    pub cluster: Cluster,
    /// Explorer base URL, without a trailing slash
    pub explorer_url: String,
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Whether fetched IDLs are read from and written to the local cache
    pub use_cache: bool,
    /// Timeout for each explorer request
    pub request_timeout: Duration,
    /// Longest time the API server keeps one connection open, headers included
    pub connection_timeout: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            use_cache: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from the process environment.
    ///
    /// Unset variables keep their defaults. Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(BIND_ADDR_ENV) {
            match value.parse::<SocketAddr>() {
                Ok(addr) => {
                    info!("Using bind address {} (from {})", addr, BIND_ADDR_ENV);
                    config.bind_addr = addr;
                }
                Err(e) => warn!(
                    "Invalid {} value '{}': {}. Using {}",
                    BIND_ADDR_ENV, value, e, DEFAULT_BIND_ADDR
                ),
            }
        }

        if let Some(value) = lookup(CLUSTER_ENV) {
            match value.parse::<Cluster>() {
                Ok(cluster) => config.cluster = cluster,
                Err(e) => warn!("Invalid {}: {}. Using {}", CLUSTER_ENV, e, config.cluster),
            }
        }

        if let Some(value) = lookup(EXPLORER_URL_ENV) {
            let trimmed = value.trim().trim_end_matches('/');
            if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                config.explorer_url = trimmed.to_string();
            } else {
                warn!(
                    "Invalid {} value '{}': expected an http(s) URL. Using {}",
                    EXPLORER_URL_ENV, value, DEFAULT_EXPLORER_URL
                );
            }
        }

        config
    }

    pub fn with_cluster(mut self, cluster: Cluster) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}
