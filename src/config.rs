use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::extract::{ExtractOptions, DEFAULT_MAX_BYTES};
use crate::pipeline::RequestOptions;
use crate::telemetry::{TelemetryRecorder, DEFAULT_LOG_FILE};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: default_log_path(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// `plain`, `ansi`, `html`, or `json`. Unset means ANSI on a terminal,
    /// plain otherwise.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_html_tag")]
    pub html_tag: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            html_tag: default_html_tag(),
        }
    }
}

fn default_html_tag() -> String {
    "mark".to_string()
}

pub const OUTPUT_FORMATS: &[&str] = &["plain", "ansi", "html", "json"];

impl Config {
    /// Options for [`crate::pipeline::handle_request`] derived from this config.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            extract: ExtractOptions {
                max_bytes: self.extract.max_bytes,
            },
            recorder: self
                .telemetry
                .enabled
                .then(|| TelemetryRecorder::new(&self.telemetry.log_path)),
        }
    }
}

/// Load and validate a TOML config. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.extract.max_bytes == 0 {
        anyhow::bail!("extract.max_bytes must be > 0");
    }

    if config.telemetry.enabled && config.telemetry.log_path.as_os_str().is_empty() {
        anyhow::bail!("telemetry.log_path must not be empty when telemetry is enabled");
    }

    if let Some(format) = &config.output.format {
        if !OUTPUT_FORMATS.contains(&format.as_str()) {
            anyhow::bail!(
                "Unknown output format: '{}'. Must be plain, ansi, html, or json.",
                format
            );
        }
    }

    if config.output.html_tag.is_empty()
        || !config
            .output
            .html_tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        anyhow::bail!("output.html_tag must be a bare element name");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lsift.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert!(cfg.telemetry.enabled);
        assert_eq!(cfg.telemetry.log_path, PathBuf::from("noSpoon.log"));
        assert_eq!(cfg.extract.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(cfg.output.html_tag, "mark");
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let (_tmp, path) = write_config("[telemetry]\nenabled = true\n");
        let cfg = load_config(&path).unwrap();
        assert!(cfg.telemetry.enabled);
        assert_eq!(cfg.output.html_tag, "mark");
        assert!(cfg.output.format.is_none());
        assert_eq!(cfg.extract.max_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    fn default_config_has_valid_html_tag() {
        assert_eq!(Config::default().output.html_tag, "mark");
    }

    #[test]
    fn parses_all_sections() {
        let (_tmp, path) = write_config(
            r#"
[telemetry]
enabled = false
log_path = "/var/log/lsift.ndjson"

[extract]
max_bytes = 1024

[output]
format = "html"
html_tag = "em"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert!(!cfg.telemetry.enabled);
        assert_eq!(cfg.extract.max_bytes, 1024);
        assert_eq!(cfg.output.format.as_deref(), Some("html"));
        assert_eq!(cfg.output.html_tag, "em");

        let opts = cfg.request_options();
        assert!(opts.recorder.is_none());
        assert_eq!(opts.extract.max_bytes, 1024);
    }

    #[test]
    fn rejects_unknown_format() {
        let (_tmp, path) = write_config("[output]\nformat = \"xml\"\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown output format"));
    }

    #[test]
    fn rejects_zero_max_bytes() {
        let (_tmp, path) = write_config("[extract]\nmax_bytes = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_markup_in_html_tag() {
        let (_tmp, path) = write_config("[output]\nhtml_tag = \"span style='x'\"\n");
        assert!(load_config(&path).is_err());
    }
}
