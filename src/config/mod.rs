use std::env;
use std::path::PathBuf;

/// Runtime configuration for the drop-store server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: "0.0.0.0", reachable from the LAN)
    pub host: String,

    /// Listen port (default: 3001)
    pub port: u16,

    /// Flat directory holding the stored files (default: "./uploads")
    pub storage_dir: PathBuf,

    /// Built client bundle served for non-API paths (default: none)
    pub static_dir: Option<PathBuf>,

    /// Overrides the URL reported by `/api/access-info` (default: none)
    pub public_base_url: Option<String>,

    /// Upload body limit in bytes (default: none, unlimited)
    pub max_upload_size: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            storage_dir: PathBuf::from("uploads"),
            static_dir: None,
            public_base_url: None,
            max_upload_size: None,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: non_empty("DROP_HOST").unwrap_or(default.host),

            port: non_empty("DROP_PORT")
                .or_else(|| non_empty("PORT"))
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            storage_dir: non_empty("DROP_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.storage_dir),

            static_dir: non_empty("DROP_STATIC_DIR").map(PathBuf::from),

            public_base_url: non_empty("DROP_PUBLIC_BASE_URL"),

            max_upload_size: non_empty("DROP_MAX_UPLOAD_SIZE").and_then(|v| v.parse().ok()),
        }
    }

    /// Loopback-only config rooted at `storage_dir`, used by tests and local runs
    pub fn development(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.storage_dir, PathBuf::from("uploads"));
        assert!(config.max_upload_size.is_none());
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn test_development_config() {
        let config = ServerConfig::development("/tmp/drop");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/drop"));
        assert_eq!(config.bind_address(), "127.0.0.1:3001");
    }
}
