use std::time::Duration;

/// Default backend base URL.
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:8000";

/// Default video host base URL (Cloudinary upload API).
pub const DEFAULT_VIDEO_HOST_BASE_URL: &str = "https://api.cloudinary.com";

/// Default bound on local duration probing.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Files at or above this size are uploaded in chunks (100 MiB).
pub const DEFAULT_UPLOAD_CHUNK_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

/// Size of one upload chunk (20 MiB).
pub const DEFAULT_UPLOAD_CHUNK_SIZE_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Editor collaborator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub backend_base_url: String,
    pub video_host_base_url: String,
    pub probe_timeout: Duration,
    pub upload_chunk_threshold_bytes: u64,
    pub upload_chunk_size_bytes: u64,
    pub ffprobe_path: String,
}

impl EditorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                      |
    /// |--------------------------------|------------------------------|
    /// | `BACKEND_BASE_URL`             | `http://localhost:8000`      |
    /// | `VIDEO_HOST_BASE_URL`          | `https://api.cloudinary.com` |
    /// | `PROBE_TIMEOUT_SECS`           | `10`                         |
    /// | `UPLOAD_CHUNK_THRESHOLD_BYTES` | `104857600`                  |
    /// | `UPLOAD_CHUNK_SIZE_BYTES`      | `20971520`                   |
    /// | `FFPROBE_PATH`                 | `ffprobe`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string = |var: &str, default: &str| {
            lookup(var)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let positive = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::Invalid {
                        var,
                        value: raw,
                        expected: "a positive integer",
                    }),
            }
        };

        Ok(Self {
            backend_base_url: string("BACKEND_BASE_URL", DEFAULT_BACKEND_BASE_URL),
            video_host_base_url: string("VIDEO_HOST_BASE_URL", DEFAULT_VIDEO_HOST_BASE_URL),
            probe_timeout: Duration::from_secs(positive(
                "PROBE_TIMEOUT_SECS",
                DEFAULT_PROBE_TIMEOUT_SECS,
            )?),
            upload_chunk_threshold_bytes: positive(
                "UPLOAD_CHUNK_THRESHOLD_BYTES",
                DEFAULT_UPLOAD_CHUNK_THRESHOLD_BYTES,
            )?,
            upload_chunk_size_bytes: positive(
                "UPLOAD_CHUNK_SIZE_BYTES",
                DEFAULT_UPLOAD_CHUNK_SIZE_BYTES,
            )?,
            ffprobe_path: string("FFPROBE_PATH", "ffprobe"),
        })
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BACKEND_BASE_URL.to_string(),
            video_host_base_url: DEFAULT_VIDEO_HOST_BASE_URL.to_string(),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            upload_chunk_threshold_bytes: DEFAULT_UPLOAD_CHUNK_THRESHOLD_BYTES,
            upload_chunk_size_bytes: DEFAULT_UPLOAD_CHUNK_SIZE_BYTES,
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<EditorConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EditorConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.backend_base_url, "http://localhost:8000");
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.upload_chunk_threshold_bytes, 104_857_600);
        assert_eq!(config.upload_chunk_size_bytes, 20_971_520);
        assert_eq!(config.ffprobe_path, "ffprobe");
    }

    #[test]
    fn overrides_are_read_and_trailing_slash_trimmed() {
        let config = load(&[
            ("BACKEND_BASE_URL", "https://api.example.com/"),
            ("PROBE_TIMEOUT_SECS", "3"),
            ("UPLOAD_CHUNK_SIZE_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(config.backend_base_url, "https://api.example.com");
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.upload_chunk_size_bytes, 1024);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        assert_matches!(
            load(&[("PROBE_TIMEOUT_SECS", "ten")]),
            Err(ConfigError::Invalid { var: "PROBE_TIMEOUT_SECS", .. })
        );
        assert_matches!(
            load(&[("UPLOAD_CHUNK_SIZE_BYTES", "0")]),
            Err(ConfigError::Invalid { .. })
        );
    }
}
