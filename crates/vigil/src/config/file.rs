use crate::config::{LogFormat, LogSpanEvents};
use anyhow::Context;
use etcetera::BaseStrategy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use vigil_core::defaults as report_defaults;
use vigil_probe::defaults as probe_defaults;

const DEFAULT_CONFIG_FILE: &str = "vigil.toml";
const DEFAULT_HIDDEN_CONFIG_FILE: &str = ".vigil.toml";

/// Read the config from the default location of user config for the platform.
///
/// Returns the parsed `Some(ConfigFile)` if the config file exists, `None` otherwise.
///
/// Vigil will attempt to locate a `vigil.toml` or `.vigil.toml` config file
/// in the current directory, the user home directory, the platform config
/// directory and the `vigil` sub directory of the platform config directory.
///
/// Only the first config file found is used.
pub fn read_default_config_file() -> anyhow::Result<Option<ConfigFile>> {
    use etcetera::base_strategy as base;
    if let Some(file) = read_files("")? {
        return Ok(Some(file));
    }
    let basedirs = base::choose_base_strategy()?;
    for dir in [
        basedirs.home_dir().to_path_buf(),
        basedirs.config_dir(),
        basedirs.config_dir().join("vigil"),
    ] {
        if let Some(file) = read_files(dir)? {
            return Ok(Some(file));
        }
    }
    Ok(None)
}

/// Read the config from the given path.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ConfigFile> {
    let contents = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("config file not found: {}", path.as_ref().display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("invalid config file: {}", path.as_ref().display()))
}

fn read_files<P: AsRef<Path>>(dir: P) -> anyhow::Result<Option<ConfigFile>> {
    for name in [DEFAULT_CONFIG_FILE, DEFAULT_HIDDEN_CONFIG_FILE] {
        let path = dir.as_ref().join(name);
        if path.exists() {
            return Ok(Some(read_config_file(path)?));
        }
    }
    Ok(None)
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub vigil: Option<ConfigVigil>,
    pub probe: Option<ConfigProbe>,
    pub report: Option<ConfigReport>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            vigil: Some(ConfigVigil::default()),
            probe: Some(ConfigProbe::default()),
            report: Some(ConfigReport::default()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigVigil {
    pub log_format: Option<LogFormat>,
    pub log_filter: Option<String>,
    pub log_span_events: Option<LogSpanEvents>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub stop_after: Option<Duration>,
}

impl Default for ConfigVigil {
    fn default() -> Self {
        Self {
            log_format: Some(super::constants::DEFAULT_LOG_FORMAT),
            log_filter: Some(String::from(super::constants::DEFAULT_LOG_FILTER)),
            log_span_events: Some(super::constants::DEFAULT_LOG_SPAN_EVENTS),
            stop_after: None,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigProbe {
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub ping_interval: Option<Duration>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub ping_timeout: Option<Duration>,
    pub payload_size: Option<usize>,
}

impl Default for ConfigProbe {
    fn default() -> Self {
        Self {
            ping_interval: Some(probe_defaults::DEFAULT_PING_INTERVAL),
            ping_timeout: Some(probe_defaults::DEFAULT_PING_TIMEOUT),
            payload_size: Some(probe_defaults::DEFAULT_PAYLOAD_SIZE),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigReport {
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub report_interval: Option<Duration>,
    pub tolerance: Option<bool>,
    pub summary: Option<bool>,
    pub ignore_no_loss: Option<bool>,
    pub syslog: Option<bool>,
    pub date_format: Option<String>,
}

impl Default for ConfigReport {
    fn default() -> Self {
        Self {
            report_interval: Some(report_defaults::DEFAULT_REPORT_INTERVAL),
            tolerance: Some(report_defaults::DEFAULT_TOLERANCE),
            summary: Some(report_defaults::DEFAULT_SUMMARY),
            ignore_no_loss: Some(report_defaults::DEFAULT_IGNORE_NO_LOSS),
            syslog: Some(report_defaults::DEFAULT_LOG_SINK),
            date_format: Some(String::from(report_defaults::DEFAULT_DATE_FORMAT)),
        }
    }
}

fn humantime_deser<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    humantime::parse_duration(&String::deserialize(deserializer)?)
        .map_err(serde::de::Error::custom)
        .map(Some)
}
