use crate::error::{DemuxError, Result};
use crate::format::ts::sink::DEFAULT_EXTENSION;
use crate::format::ts::ContinuityMode;
use log::{debug, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Config files searched by [`DemuxConfig::load`], in order.
pub const CONFIG_PATHS: [&str; 2] = ["./tsdemux.toml", "./tsdemux_config.toml"];

const ENV_OUTPUT_DIR: &str = "TSDEMUX_OUTPUT_DIR";
const ENV_EXTENSION: &str = "TSDEMUX_EXTENSION";
const ENV_CONTINUITY: &str = "TSDEMUX_CONTINUITY";
const ENV_MAX_PACKETS: &str = "TSDEMUX_MAX_PACKETS";

/// Settings for a demux run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemuxConfig {
    /// Directory the per-PID output files are written to
    pub output_dir: PathBuf,
    /// Output file extension, without the dot
    pub extension: String,
    /// Continuity counter checking
    pub continuity: ContinuityMode,
    /// Stop after this many packets
    pub max_packets: Option<u64>,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            extension: DEFAULT_EXTENSION.to_string(),
            continuity: ContinuityMode::Disabled,
            max_packets: None,
        }
    }
}

impl DemuxConfig {
    /// Defaults, overlaid by the first config file found in
    /// [`CONFIG_PATHS`], overlaid by `TSDEMUX_*` environment variables.
    ///
    /// Invalid values are logged and skipped rather than failing the load.
    pub fn load() -> Self {
        let mut config = DemuxConfig::default();

        for path in &CONFIG_PATHS {
            let Ok(content) = fs::read_to_string(path) else {
                continue;
            };
            debug!("Loading config from {}", path);
            for (key, value) in entries(&content) {
                if let Err(e) = config.set(key, value) {
                    warn!("Ignoring {} in {}: {}", key, path, e);
                }
            }
            break;
        }

        config.apply_env();
        config
    }

    /// Reads a config file over the defaults; any invalid value is an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses `key = value` lines over the defaults.
    ///
    /// Blank lines, `#` comments and `[section]` headers are skipped.
    /// Values may be quoted. Unknown keys are ignored.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = DemuxConfig::default();
        for (key, value) in entries(content) {
            config.set(key, value)?;
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        let overrides = [
            (ENV_OUTPUT_DIR, "output_dir"),
            (ENV_EXTENSION, "extension"),
            (ENV_CONTINUITY, "continuity"),
            (ENV_MAX_PACKETS, "max_packets"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = env::var(var) {
                if let Err(e) = self.set(key, value.trim()) {
                    warn!("Ignoring {}: {}", var, e);
                }
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "output_dir" => {
                if value.is_empty() {
                    return Err(DemuxError::Config("output_dir is empty".into()));
                }
                self.output_dir = PathBuf::from(value);
            }
            "extension" => {
                let extension = value.trim_start_matches('.');
                if extension.is_empty() {
                    return Err(DemuxError::Config("extension is empty".into()));
                }
                self.extension = extension.to_string();
            }
            "continuity" => self.continuity = value.parse()?,
            "max_packets" => {
                self.max_packets = match value {
                    "" | "0" | "none" => None,
                    n => Some(n.parse().map_err(|_| {
                        DemuxError::Config(format!("invalid max_packets '{}'", n))
                    })?),
                };
            }
            _ => debug!("Unknown config key '{}'", key),
        }
        Ok(())
    }
}

fn entries(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        let value = value.trim().trim_matches('"').trim_matches('\'');
        Some((key.trim(), value))
    })
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# tsdemux configuration
# Environment variables TSDEMUX_OUTPUT_DIR, TSDEMUX_EXTENSION,
# TSDEMUX_CONTINUITY and TSDEMUX_MAX_PACKETS override these values.

# Directory for output_<pid>.<extension> files
output_dir = "./output"

# Extension of the elementary stream files
extension = "h264"

# Continuity counter checking: off, warn or strict
continuity = "off"

# Stop after this many packets (0 for no limit)
max_packets = 0
"#;
        fs::write(path, template)?;
    }
    Ok(())
}
