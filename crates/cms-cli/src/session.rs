// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use cms_app::{Session, SessionStore};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Session kept as a JSON file so a sign-in survives restarts.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    session: Option<Session>,
}

impl FileSessionStore {
    /// Loads the stored session, if any. An unreadable file counts as signed
    /// out rather than an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let session = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %error,
                        "ignoring unreadable session file"
                    );
                    None
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => None,
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("read session file {}", path.display()));
            }
        };
        Ok(Self { path, session })
    }
}

impl SessionStore for FileSessionStore {
    fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn save(&mut self, session: Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create session directory {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&session).context("encode session")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("write session file {}", self.path.display()))?;
        self.session = Some(session);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.session = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => {
                Err(error).with_context(|| format!("remove session file {}", self.path.display()))
            }
        }
    }
}
