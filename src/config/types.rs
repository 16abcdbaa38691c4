use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Enable the cache store. When disabled (or when the store cannot be
    /// initialized at startup) every lookup is a miss: each check
    /// re-resolves and handles only live for the response that minted them.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// TTL for minted download handles (short-lived).
    #[serde(default = "default_handle_ttl")]
    pub handle_ttl_secs: u64,

    /// TTL for cached check results (long-lived).
    #[serde(default = "default_response_ttl")]
    pub response_ttl_secs: u64,

    /// Maximum number of live entries before the oldest is evicted.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// How often the background janitor drops expired entries.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_handle_ttl() -> u64 {
    1800
}
fn default_response_ttl() -> u64 {
    7200
}
fn default_max_entries() -> usize {
    4096
}
fn default_cleanup_interval() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            handle_ttl_secs: default_handle_ttl(),
            response_ttl_secs: default_response_ttl(),
            max_entries: default_max_entries(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Path to the resolution engine binary.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Hard deadline for a single engine invocation.
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,

    /// Upstream filesize ceiling (in MB) baked into every format expression.
    #[serde(default = "default_filesize_cap")]
    pub filesize_cap_mb: u64,
}

fn default_binary() -> String {
    "yt-dlp".to_string()
}
fn default_engine_timeout() -> u64 {
    15
}
fn default_filesize_cap() -> u64 {
    200
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: default_engine_timeout(),
            filesize_cap_mb: default_filesize_cap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Single-response size ceiling imposed by the hosting tier, in bytes.
    /// Full-file downloads at or above this size are rejected with 400.
    #[serde(default = "default_max_response_size")]
    pub max_response_size: u64,

    /// Size of the byte window requested from the upstream origin per
    /// Range request, in bytes.
    #[serde(default = "default_range_window")]
    pub range_window: u64,

    /// Connect timeout for upstream fetches. Deliberately not a whole
    /// request timeout: that would cut off long-lived streaming bodies.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Deadline for the origin to send response headers. Covers the gap
    /// the connect timeout leaves open: an origin that accepts TCP but
    /// never answers. The body stream itself is unbounded.
    #[serde(default = "default_header_timeout")]
    pub header_timeout_secs: u64,
}

fn default_max_response_size() -> u64 {
    4_500_000
}
fn default_range_window() -> u64 {
    3_000_000
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_header_timeout() -> u64 {
    15
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_response_size: default_max_response_size(),
            range_window: default_range_window(),
            connect_timeout_secs: default_connect_timeout(),
            header_timeout_secs: default_header_timeout(),
        }
    }
}
