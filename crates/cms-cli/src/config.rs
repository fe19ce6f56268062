// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use cms_app::ChatDelays;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "cms";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_POLL_INTERVAL: &str = "5s";
const DEFAULT_TYPING_DELAY: &str = "2s";
const DEFAULT_STEP_DELAY: &str = "1500ms";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(cms_api::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub poll_interval: Option<String>,
    pub typing_delay: Option<String>,
    pub step_delay: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            poll_interval: Some(DEFAULT_POLL_INTERVAL.to_owned()),
            typing_delay: Some(DEFAULT_TYPING_DELAY.to_owned()),
            step_delay: Some(DEFAULT_STEP_DELAY.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("CMS_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set CMS_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [api], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        cms_api::ApiPaths::new(self.api_base_url())
            .with_context(|| format!("invalid [api] section in {}", path.display()))?;

        if self.api_timeout()? <= Duration::ZERO {
            bail!(
                "api.timeout in {} must be positive, got {:?}",
                path.display(),
                self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT)
            );
        }

        if self.poll_interval()? <= Duration::ZERO {
            bail!(
                "ui.poll_interval in {} must be positive, got {:?}",
                path.display(),
                self.ui.poll_interval.as_deref().unwrap_or(DEFAULT_POLL_INTERVAL)
            );
        }

        // Zero chat delays are fine; they only have to parse.
        self.chat_delays()?;

        let level = self.log_level();
        if !LOG_LEVELS.contains(&level) {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(cms_api::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .poll_interval
                .as_deref()
                .unwrap_or(DEFAULT_POLL_INTERVAL),
        )
    }

    pub fn chat_delays(&self) -> Result<ChatDelays> {
        Ok(ChatDelays {
            opening: parse_duration(
                self.ui.typing_delay.as_deref().unwrap_or(DEFAULT_TYPING_DELAY),
            )?,
            step: parse_duration(self.ui.step_delay.as_deref().unwrap_or(DEFAULT_STEP_DELAY))?,
        })
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join("cms.log")),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# cms config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n\n[ui]\n# How often dashboards refresh their summary counters.\npoll_interval = \"{DEFAULT_POLL_INTERVAL}\"\n# Assistant pauses in the remediation chat. \"0s\" disables them.\ntyping_delay = \"{DEFAULT_TYPING_DELAY}\"\nstep_delay = \"{DEFAULT_STEP_DELAY}\"\n\n[log]\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# Optional. Default is platform data dir (for example ~/.local/share/cms/cms.log)\n# file = \"/absolute/path/to/cms.log\"\n",
            path.display(),
            cms_api::DEFAULT_BASE_URL,
        )
    }
}

/// Platform data directory for the session file, exports, and logs.
pub fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set CMS_SESSION_PATH and log.file explicitly")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

pub fn session_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os("CMS_SESSION_PATH") {
        return Ok(PathBuf::from(path));
    }
    Ok(data_dir()?.join("session.json"))
}

/// Exports land in the user's download folder when the platform has one.
pub fn export_dir() -> Result<PathBuf> {
    match dirs::download_dir() {
        Some(dir) => Ok(dir),
        None => Ok(data_dir()?.join("exports")),
    }
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration, session_path};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.api_base_url(), cms_api::DEFAULT_BASE_URL);
        assert_eq!(config.api_timeout()?, Duration::from_secs(10));
        assert_eq!(config.poll_interval()?, Duration::from_secs(5));
        let delays = config.chat_delays()?;
        assert_eq!(delays.opening, Duration::from_secs(2));
        assert_eq!(delays.step, Duration::from_millis(1500));
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nbase_url=\"http://localhost:5000/api\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[api], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[api]\nbase_url = \"http://localhost:5000/api///\"\ntimeout = \"3s\"\n[ui]\npoll_interval = \"1m\"\ntyping_delay = \"0s\"\nstep_delay = \"0ms\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/cms-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.api_base_url(), "http://localhost:5000/api");
        assert_eq!(config.api_timeout()?, Duration::from_secs(3));
        assert_eq!(config.poll_interval()?, Duration::from_secs(60));
        assert_eq!(config.chat_delays()?.opening, Duration::ZERO);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file()?, PathBuf::from("/tmp/cms-test.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn invalid_base_url_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\nbase_url = \"ftp://example.com\"\n")?;
        let error = Config::load(&path).expect_err("ftp base url should fail");
        assert!(format!("{error:#}").contains("http or https"));
        Ok(())
    }

    #[test]
    fn non_positive_intervals_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));

        let (_temp, path) = write_config("version = 1\n[ui]\npoll_interval = \"0ms\"\n")?;
        let error = Config::load(&path).expect_err("zero poll interval should fail");
        assert!(error.to_string().contains("ui.poll_interval"));
        Ok(())
    }

    #[test]
    fn unknown_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"loud\"\n")?;
        let error = Config::load(&path).expect_err("unknown level should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        assert!(parse_duration("oops").is_err());
        assert!(parse_duration("-1s").is_err());
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("CMS_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("CMS_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn session_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("CMS_SESSION_PATH", "/tmp/cms-session.json");
        }
        let resolved = session_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("CMS_SESSION_PATH");
        }
        assert_eq!(resolved, PathBuf::from("/tmp/cms-session.json"));
        Ok(())
    }

    #[test]
    fn example_config_is_loadable() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[api]"));
        assert!(example.contains("[ui]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.poll_interval()?, Duration::from_secs(5));
        Ok(())
    }
}
