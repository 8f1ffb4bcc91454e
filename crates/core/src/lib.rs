//! MeteoRG Core Library
//!
//! Shared pieces for the feed service:
//! - Configuration loading (XDG-compliant)
//! - Service defaults and secret names

mod config;

pub use config::{find_config_file, load_config, ConfigSource};

/// Application name used for XDG paths
pub const APP_NAME: &str = "meteorg";

/// Default service port
pub const DEFAULT_PORT: u16 = 8080;

/// Default feed cache lifetime (5 minutes)
pub const DEFAULT_CACHE_TTL: u64 = 300;

/// Default timeout for every upstream request, in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT: u64 = 10;

/// Browser origin allowed by the CORS policy unless configured otherwise
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://meteorg-474500.web.app";

/// FIRMS bounding box (west,south,east,north) covering Chile
pub const DEFAULT_FIRMS_AREA: &str = "-80,-60,-60,-15";

/// Symbolic names looked up in the secret store
pub mod secret_names {
    pub const DMC_USER: &str = "USER_DMC";
    pub const DMC_API_KEY: &str = "DMC_API_KEY";
    pub const FIRMS_MAP_KEY: &str = "FIRMS_MAP_KEY";
}
