// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use cms_api::{Client, Poller, is_unauthorized};
use cms_app::{
    ChatDelays, FeedbackSubmission, IntakeBackend, LoginForm, PasswordResetForm, Profile,
    ProfileUpdate, QueueBackend, Role, Session, SessionStore, TrackedComplaint, UserId,
};
use cms_tui::InternalEvent;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

pub struct ApiRuntime<S: SessionStore> {
    client: Client,
    sessions: S,
    poll_interval: Duration,
    delays: ChatDelays,
    export_dir: PathBuf,
    poller: Option<Poller>,
}

impl<S: SessionStore> ApiRuntime<S> {
    /// Wraps the client and restores any stored token onto it.
    pub fn new(
        mut client: Client,
        sessions: S,
        poll_interval: Duration,
        delays: ChatDelays,
        export_dir: PathBuf,
    ) -> Self {
        client.set_token(sessions.token().map(str::to_owned));
        Self {
            client,
            sessions,
            poll_interval,
            delays,
            export_dir,
            poller: None,
        }
    }

    #[cfg(test)]
    fn sessions(&self) -> &S {
        &self.sessions
    }

    #[cfg(test)]
    fn is_polling(&self) -> bool {
        self.poller.is_some()
    }
}

impl<S: SessionStore> cms_tui::AppRuntime for ApiRuntime<S> {
    fn sign_in(&mut self, form: &LoginForm) -> Result<Session> {
        let session = self.client.login(form)?;
        self.sessions.save(session.clone())?;
        self.client.set_token(Some(session.token.clone()));
        tracing::info!(role = session.role.as_str(), "signed in");
        Ok(session)
    }

    fn reset_password(&mut self, form: &PasswordResetForm) -> Result<String> {
        self.client.reset_password(form)
    }

    fn sign_out(&mut self) -> Result<()> {
        self.stop_summary_poll();
        self.client.set_token(None);
        self.sessions.clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    fn user_id(&self) -> Option<UserId> {
        self.sessions.user_id()
    }

    fn chat_delays(&self) -> ChatDelays {
        self.delays
    }

    fn intake(&mut self) -> &mut dyn IntakeBackend {
        &mut self.client
    }

    fn track_complaints(&mut self) -> Result<Vec<TrackedComplaint>> {
        self.client.track_complaints()
    }

    fn submit_feedback(&mut self, feedback: &FeedbackSubmission) -> Result<()> {
        self.client.submit_feedback(feedback)
    }

    fn export_complaints(&mut self, csv: &str) -> Result<PathBuf> {
        write_export(&self.export_dir, csv, OffsetDateTime::now_utc())
    }

    fn start_summary_poll(&mut self, role: Role, tx: Sender<InternalEvent>) -> Result<()> {
        self.stop_summary_poll();
        let client = self.client.clone();
        self.poller = Some(Poller::spawn(
            self.poll_interval,
            move || client.dashboard_summary(role),
            move |result| {
                let event = match result {
                    Ok(summary) => InternalEvent::SummaryLoaded(summary),
                    Err(error) => {
                        tracing::warn!(error = %format!("{error:#}"), "dashboard summary failed");
                        InternalEvent::SummaryFailed {
                            unauthorized: is_unauthorized(&error),
                            message: error.to_string(),
                        }
                    }
                };
                let _ = tx.send(event);
            },
        ));
        tracing::debug!(role = role.as_str(), "summary polling started");
        Ok(())
    }

    fn stop_summary_poll(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
            tracing::debug!("summary polling stopped");
        }
    }

    fn is_unauthorized(&self, error: &anyhow::Error) -> bool {
        is_unauthorized(error)
    }

    fn queue(&mut self) -> &mut dyn QueueBackend {
        &mut self.client
    }

    fn load_profile(&mut self) -> Result<Profile> {
        self.client.profile()
    }

    fn save_profile(&mut self, update: &ProfileUpdate) -> Result<String> {
        self.client.update_profile(update)
    }

    fn reset_staff_password(&mut self, role: Role, form: &PasswordResetForm) -> Result<String> {
        self.client.reset_staff_password(role, form)
    }
}

fn write_export(dir: &Path, csv: &str, now: OffsetDateTime) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create export directory {}", dir.display()))?;
    let stamp = now
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("format export timestamp")?;
    let path = dir.join(format!("complaints-{stamp}.csv"));
    fs::write(&path, csv).with_context(|| format!("write export {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{ApiRuntime, write_export};
    use anyhow::{Result, anyhow};
    use cms_api::Client;
    use cms_app::{
        ChatDelays, LoginForm, MemorySessionStore, QueueKind, Role, Session, SessionStore, UserId,
    };
    use cms_tui::{AppRuntime, InternalEvent};
    use std::io::Read;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use time::macros::datetime;
    use tiny_http::{Header, Response, Server};

    /// Answers `count` requests with the same body and collects the
    /// Authorization header of each.
    fn serve(
        count: usize,
        status: u16,
        body: &'static str,
    ) -> Result<(String, thread::JoinHandle<Vec<Option<String>>>)> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}/api", server.server_addr());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..count {
                let mut request = server.recv().expect("request expected");
                let mut payload = String::new();
                let _ = request.as_reader().read_to_string(&mut payload);
                seen.push(
                    request
                        .headers()
                        .iter()
                        .find(|header| header.field.equiv("Authorization"))
                        .map(|header| header.value.as_str().to_owned()),
                );
                let header = Header::from_bytes("Content-Type", "application/json")
                    .expect("valid header");
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                request.respond(response).expect("response should succeed");
            }
            seen
        });
        Ok((addr, handle))
    }

    fn runtime(addr: &str, sessions: MemorySessionStore) -> Result<ApiRuntime<MemorySessionStore>> {
        let client = Client::new(addr, Duration::from_secs(2))?;
        let temp = std::env::temp_dir();
        Ok(ApiRuntime::new(
            client,
            sessions,
            Duration::from_secs(30),
            ChatDelays::default(),
            temp,
        ))
    }

    #[test]
    fn sign_in_persists_session_and_sign_out_clears_it() -> Result<()> {
        let (addr, handle) = serve(
            1,
            200,
            r#"{"token":"jwt-9","role":"admin","userId":9,"message":"ok"}"#,
        )?;
        let mut runtime = runtime(&addr, MemorySessionStore::new())?;

        let session = runtime.sign_in(&LoginForm {
            staff_no: "A1".to_owned(),
            password: "pw".to_owned(),
        })?;
        assert_eq!(session.role, Role::Admin);
        assert_eq!(runtime.sessions().token(), Some("jwt-9"));
        assert_eq!(runtime.user_id(), Some(UserId::new(9)));
        handle.join().expect("server thread should join");

        runtime.sign_out()?;
        assert!(runtime.sessions().current().is_none());
        assert_eq!(runtime.user_id(), None);
        Ok(())
    }

    #[test]
    fn restored_session_token_is_sent() -> Result<()> {
        let (addr, handle) = serve(1, 200, r#"{"complaints":[]}"#)?;
        let sessions = MemorySessionStore::with_session(Session {
            token: "stored".to_owned(),
            role: Role::User,
            user_id: UserId::new(1),
        });
        let mut runtime = runtime(&addr, sessions)?;

        assert!(runtime.track_complaints()?.is_empty());
        let seen = handle.join().expect("server thread should join");
        assert_eq!(seen[0].as_deref(), Some("Bearer stored"));
        Ok(())
    }

    #[test]
    fn summary_poll_delivers_results_until_stopped() -> Result<()> {
        let (addr, _handle) = serve(
            1,
            200,
            r#"{"success":true,"stats":{"total":3,"resolved":1,"unresolved":2,"thisMonth":1}}"#,
        )?;
        let mut runtime = runtime(&addr, MemorySessionStore::new())?;
        let (tx, rx) = mpsc::channel();

        runtime.start_summary_poll(Role::User, tx)?;
        assert!(runtime.is_polling());
        let event = rx.recv_timeout(Duration::from_secs(2))?;
        assert!(matches!(event, InternalEvent::SummaryLoaded(summary) if summary.role() == Role::User));

        runtime.stop_summary_poll();
        assert!(!runtime.is_polling());
        Ok(())
    }

    #[test]
    fn unauthorized_summary_is_flagged() -> Result<()> {
        let (addr, _handle) = serve(1, 401, r#"{"message":"jwt expired"}"#)?;
        let mut runtime = runtime(&addr, MemorySessionStore::new())?;
        let (tx, rx) = mpsc::channel();

        runtime.start_summary_poll(Role::SubAdmin, tx)?;
        let event = rx.recv_timeout(Duration::from_secs(2))?;
        runtime.stop_summary_poll();
        assert!(matches!(event, InternalEvent::SummaryFailed { unauthorized: true, .. }));
        Ok(())
    }

    #[test]
    fn refused_queue_request_reads_as_unauthorized() -> Result<()> {
        let (addr, handle) = serve(2, 401, r#"{"message":"jwt expired"}"#)?;
        let sessions = MemorySessionStore::with_session(Session {
            token: "stale".to_owned(),
            role: Role::SubAdmin,
            user_id: UserId::new(41),
        });
        let mut runtime = runtime(&addr, sessions)?;

        let error = runtime
            .queue()
            .queue(QueueKind::General)
            .expect_err("token refused");
        assert!(runtime.is_unauthorized(&error));
        let error = runtime.load_profile().expect_err("token refused");
        assert!(runtime.is_unauthorized(&error));

        let seen = handle.join().expect("server thread should join");
        assert_eq!(seen, vec![Some("Bearer stale".to_owned()); 2]);
        Ok(())
    }

    #[test]
    fn other_failures_are_not_unauthorized() -> Result<()> {
        let (addr, _handle) = serve(1, 500, r#"{"message":"database down"}"#)?;
        let mut runtime = runtime(&addr, MemorySessionStore::new())?;
        let error = runtime.load_profile().expect_err("server error");
        assert!(!runtime.is_unauthorized(&error));
        Ok(())
    }

    #[test]
    fn export_lands_in_timestamped_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path().join("exports");
        let path = write_export(&dir, "ID,Status\n1,Resolved\n", datetime!(2026-03-04 05:06:07 UTC))?;
        assert_eq!(path, dir.join("complaints-20260304-050607.csv"));
        assert_eq!(std::fs::read_to_string(&path)?, "ID,Status\n1,Resolved\n");
        Ok(())
    }
}
