// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Routes tracing output to the log file. The terminal belongs to the UI,
/// so nothing is written to stdout or stderr. `RUST_LOG` wins over
/// `log.level` when set.
pub fn init(config: &Config) -> Result<()> {
    let path = config.log_file()?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level()))
        .with_context(|| format!("invalid log.level {:?}", config.log_level()))?;
    init_with(&path, filter)
}

fn init_with(path: &Path, filter: EnvFilter) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path and retry",
                path.display()
            )
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[cfg(test)]
mod tests {
    use super::init_with;
    use anyhow::Result;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn writes_events_to_the_log_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("cms.log");
        init_with(&path, EnvFilter::new("info"))?;

        tracing::info!(screen = "login", "log smoke test");
        tracing::debug!("filtered out");

        let contents = std::fs::read_to_string(&path)?;
        assert!(contents.contains("log smoke test"));
        assert!(contents.contains("screen=\"login\""));
        assert!(!contents.contains("filtered out"));
        Ok(())
    }
}
