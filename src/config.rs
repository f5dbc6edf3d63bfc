//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;

/// What a submission produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Show the assembled record only.
    Collect,
    /// Also run the classifier and show the verdict.
    Diagnose,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collect => write!(f, "collect"),
            Self::Diagnose => write!(f, "diagnose"),
        }
    }
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
    File,
    Stdout,
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    /// Model directory or model file.
    pub model_path: PathBuf,
    /// Refuse models without an integrity manifest.
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    /// Per-line cap applied by the log sanitizer.
    pub sanitize_max_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Diagnose,
            model_path: PathBuf::from("models"),
            require_manifest: false,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("thyrodx.log"),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

/// Parse `1/true/yes` style flags.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// Optional environment variables:
    /// - `THYRODX_MODE`: `collect` or `diagnose` (default: `diagnose`)
    /// - `THYRODX_MODEL_PATH`: model directory or file (default: `models`)
    /// - `THYRODX_REQUIRE_MANIFEST`: refuse models without `manifest.json`
    /// - `THYRODX_LOG_MODE`: `auto`, `file` or `stdout` (default: `auto`)
    /// - `THYRODX_LOG_FILE`: log file path (default: `thyrodx.log`)
    /// - `THYRODX_SANITIZE_MAX_BYTES`: per-line log cap in bytes (default: 16 KiB)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unrecognized value.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unrecognized value.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("THYRODX_MODE") {
            config.mode = match mode.trim().to_ascii_lowercase().as_str() {
                "collect" => Mode::Collect,
                "diagnose" | "predict" => Mode::Diagnose,
                other => anyhow::bail!("THYRODX_MODE must be collect or diagnose, got {other:?}"),
            };
        }

        if let Some(path) = lookup("THYRODX_MODEL_PATH").filter(|p| !p.trim().is_empty()) {
            config.model_path = PathBuf::from(path.trim());
        }

        if let Some(flag) = lookup("THYRODX_REQUIRE_MANIFEST") {
            config.require_manifest = parse_bool(&flag);
        }

        if let Some(mode) = lookup("THYRODX_LOG_MODE") {
            config.log_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "auto" => LogMode::Auto,
                "file" => LogMode::File,
                "stdout" => LogMode::Stdout,
                other => {
                    anyhow::bail!("THYRODX_LOG_MODE must be auto, file or stdout, got {other:?}")
                }
            };
        }

        if let Some(path) = lookup("THYRODX_LOG_FILE").filter(|p| !p.trim().is_empty()) {
            config.log_file = PathBuf::from(path.trim());
        }

        if let Some(max) = lookup("THYRODX_SANITIZE_MAX_BYTES") {
            config.sanitize_max_bytes = match max.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => anyhow::bail!(
                    "THYRODX_SANITIZE_MAX_BYTES must be a positive byte count, got {max:?}"
                ),
            };
        }

        Ok(config)
    }

    /// Whether logs go to the file, given whether stdout is a terminal.
    #[must_use]
    pub fn log_to_file(&self, interactive: bool) -> bool {
        match self.log_mode {
            LogMode::File => true,
            LogMode::Stdout => false,
            LogMode::Auto => interactive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.mode, Mode::Diagnose);
        assert_eq!(config.model_path, PathBuf::from("models"));
        assert!(!config.require_manifest);
        assert_eq!(config.sanitize_max_bytes, 16 * 1024);
        assert!(config.log_to_file(true));
        assert!(!config.log_to_file(false));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("THYRODX_MODE", "Collect"),
            ("THYRODX_MODEL_PATH", "/srv/models/model.json"),
            ("THYRODX_REQUIRE_MANIFEST", "yes"),
            ("THYRODX_LOG_MODE", "stdout"),
            ("THYRODX_LOG_FILE", "/tmp/t.log"),
            ("THYRODX_SANITIZE_MAX_BYTES", " 4096 "),
        ]))
        .unwrap();
        assert_eq!(config.mode, Mode::Collect);
        assert_eq!(config.model_path, PathBuf::from("/srv/models/model.json"));
        assert!(config.require_manifest);
        assert!(!config.log_to_file(true));
        assert_eq!(config.log_file, PathBuf::from("/tmp/t.log"));
        assert_eq!(config.sanitize_max_bytes, 4096);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(AppConfig::from_lookup(lookup(&[("THYRODX_MODE", "train")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("THYRODX_LOG_MODE", "syslog")])).is_err());
    }

    #[test]
    fn test_rejects_bad_sanitize_cap() {
        for bad in ["0", "-1", "16k", ""] {
            let result = AppConfig::from_lookup(lookup(&[("THYRODX_SANITIZE_MAX_BYTES", bad)]));
            assert!(result.is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" yes "));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
