// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod error;
mod paths;
mod poll;
mod wire;

pub use error::{ApiError, is_unauthorized};
pub use paths::{ApiPaths, DEFAULT_BASE_URL};
pub use poll::Poller;

use anyhow::{Context, Result, bail};
use cms_app::{
    Assignment, CategorizeUpdate, Classification, ComplaintId, ComplaintSubmission,
    DashboardSummary, FeedbackSubmission, IntakeBackend, LoginForm, MainIssue, MainIssueId,
    PasswordResetForm, Profile, ProfileUpdate, QueueBackend, QueueComplaint, QueueKind,
    RelatedIssue, RelatedIssueId, Role, Session, SessionId, SolutionSet, SolutionUpdate,
    StaffMember, SubRelatedIssue, SubRelatedIssueId, TrackedComplaint,
};
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::clean_error_response;
use crate::wire::{
    AdminSummaryResponse, ClassifyRequest, ClassifyResponse, Empty, Envelope, FeedbackRequest,
    LogResolutionRequest, LoginRequest, LoginResponse, MainIssuesResponse, ProfileResponse,
    QueueResponse, RelatedIssuesResponse, ResetPasswordRequest, SolutionsResponse,
    StaffResponse, SubAdminSummaryResponse, SubRelatedIssuesResponse, TakeResponse,
    TrackResponse, UserSummaryResponse,
};

const REJECTED_FALLBACK: &str = "request was rejected by the server";

/// Blocking client for the complaint backend. Cheap to clone; clones share
/// the connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    paths: ApiPaths,
    timeout: Duration,
    token: Option<String>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let paths = ApiPaths::new(base_url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            paths,
            timeout,
            token: None,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.paths.base_url()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn paths(&self) -> &ApiPaths {
        &self.paths
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn login(&self, form: &LoginForm) -> Result<Session> {
        form.validate()?;
        let request = LoginRequest {
            staff_no: form.staff_no.trim(),
            password: &form.password,
        };
        let response: Envelope<LoginResponse> =
            self.call(Method::POST, self.paths.login()?, Some(&request), "login response")?;
        let session = response.body.into_session()?;
        tracing::info!(role = session.role.as_str(), "signed in");
        Ok(session)
    }

    /// Resets an employee password. Returns the backend's confirmation
    /// message.
    pub fn reset_password(&self, form: &PasswordResetForm) -> Result<String> {
        self.reset_password_for(Role::User, form)
    }

    /// Admin-only reset of a subadmin or admin account.
    pub fn reset_staff_password(&self, role: Role, form: &PasswordResetForm) -> Result<String> {
        if role == Role::User {
            bail!("staff password reset needs a subadmin or admin role");
        }
        self.reset_password_for(role, form)
    }

    fn reset_password_for(&self, role: Role, form: &PasswordResetForm) -> Result<String> {
        form.validate()?;
        let request = ResetPasswordRequest {
            staff_no: form.staff_no.trim(),
            new_password: &form.new_password,
            confirm_password: &form.confirm_password,
        };
        let response: Envelope<Empty> = self.call(
            Method::POST,
            self.paths.reset_password(role)?,
            Some(&request),
            "password reset response",
        )?;
        tracing::info!(role = role.as_str(), "password reset");
        Ok(response
            .message
            .unwrap_or_else(|| "Password reset successfully".to_owned()))
    }

    pub fn profile(&self) -> Result<Profile> {
        let response: Envelope<ProfileResponse> =
            self.call(Method::GET, self.paths.profile()?, None::<&()>, "profile")?;
        Ok(Profile::from(response.body))
    }

    /// Sends the profile as a multipart form; contacts travel as a JSON list.
    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<String> {
        let contacts = serde_json::to_string(&update.contacts).context("encode contacts")?;
        let mut form = Form::new()
            .text("name", update.name.clone())
            .text("department", update.department.clone())
            .text("designation", update.designation.clone())
            .text("contacts", contacts);
        if let Some(photo) = &update.photo {
            form = form
                .file("photo", photo)
                .with_context(|| format!("read photo {}", photo.display()))?;
        }
        let url = self.paths.update_profile()?;
        let request = self.http.post(url.clone()).multipart(form);
        let response: Envelope<Empty> =
            self.finish(request, &Method::POST, &url, "profile update response")?;
        tracing::info!(photo = update.photo.is_some(), "profile updated");
        Ok(response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "Your profile has been updated successfully".to_owned()))
    }

    pub fn queue_complaints(&self, kind: QueueKind) -> Result<Vec<QueueComplaint>> {
        let response: Envelope<QueueResponse> = self.call(
            Method::GET,
            self.paths.queue(kind)?,
            None::<&()>,
            "complaint queue",
        )?;
        Ok(response
            .body
            .complaints
            .into_iter()
            .map(QueueComplaint::from)
            .collect())
    }

    pub fn take_complaint(&self, complaint: ComplaintId) -> Result<Assignment> {
        let response: Envelope<TakeResponse> = self.call(
            Method::POST,
            self.paths.take_complaint(complaint)?,
            Some(&Empty {}),
            "take response",
        )?;
        Ok(Assignment::from(response.body))
    }

    pub fn reject_complaint(&self, complaint: ComplaintId) -> Result<()> {
        let _: Envelope<Empty> = self.call(
            Method::POST,
            self.paths.reject_complaint(complaint)?,
            Some(&Empty {}),
            "reject response",
        )?;
        Ok(())
    }

    pub fn solve_complaint(&self, complaint: ComplaintId, update: &SolutionUpdate) -> Result<()> {
        let _: Envelope<Empty> = self.call(
            Method::POST,
            self.paths.solve_complaint(complaint)?,
            Some(update),
            "solution response",
        )?;
        Ok(())
    }

    pub fn categorize_complaint(
        &self,
        complaint: ComplaintId,
        update: &CategorizeUpdate,
    ) -> Result<()> {
        let _: Envelope<Empty> = self.call(
            Method::POST,
            self.paths.categorize_complaint(complaint)?,
            Some(update),
            "categorize response",
        )?;
        Ok(())
    }

    pub fn main_issue_list(&self) -> Result<Vec<MainIssue>> {
        let response: Envelope<MainIssuesResponse> = self.call(
            Method::GET,
            self.paths.main_issues()?,
            None::<&()>,
            "main issues",
        )?;
        Ok(response
            .body
            .main_issues
            .into_iter()
            .map(MainIssue::from)
            .collect())
    }

    pub fn related_issues_for(&self, main: MainIssueId) -> Result<Vec<RelatedIssue>> {
        let response: Envelope<RelatedIssuesResponse> = self.call(
            Method::GET,
            self.paths.related_issues_under(main)?,
            None::<&()>,
            "related issues",
        )?;
        Ok(response
            .body
            .related_issues
            .into_iter()
            .map(|wire| {
                let mut issue = RelatedIssue::from(wire);
                if issue.main_issue_id.get() == 0 {
                    issue.main_issue_id = main;
                }
                issue
            })
            .collect())
    }

    pub fn staff_members(&self, role: Role) -> Result<Vec<StaffMember>> {
        let response: Envelope<StaffResponse> =
            self.call(Method::GET, self.paths.staff(role)?, None::<&()>, "staff list")?;
        Ok(response
            .body
            .users
            .into_iter()
            .map(StaffMember::from)
            .collect())
    }

    pub fn dashboard_summary(&self, role: Role) -> Result<DashboardSummary> {
        let url = self.paths.dashboard_summary(role)?;
        let summary = match role {
            Role::User => {
                let response: Envelope<UserSummaryResponse> =
                    self.call(Method::GET, url, None::<&()>, "dashboard summary")?;
                DashboardSummary::from(response.body.stats)
            }
            Role::SubAdmin => {
                let response: Envelope<SubAdminSummaryResponse> =
                    self.call(Method::GET, url, None::<&()>, "dashboard summary")?;
                DashboardSummary::from(response.body)
            }
            Role::Admin => {
                let response: Envelope<AdminSummaryResponse> =
                    self.call(Method::GET, url, None::<&()>, "dashboard summary")?;
                DashboardSummary::from(response.body)
            }
        };
        Ok(summary)
    }

    pub fn track_complaints(&self) -> Result<Vec<TrackedComplaint>> {
        let response: Envelope<TrackResponse> = self.call(
            Method::GET,
            self.paths.track_complaints()?,
            None::<&()>,
            "complaint list",
        )?;
        Ok(response
            .body
            .complaints
            .into_iter()
            .map(TrackedComplaint::from)
            .collect())
    }

    pub fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<()> {
        let request = FeedbackRequest {
            complaint_id: feedback.complaint_id.get(),
            user_id: feedback.user_id.map(|id| id.get()),
            subadmin_id: feedback.subadmin_id.map(|id| id.get()),
            label: feedback.label.as_str(),
            comment: &feedback.comment,
        };
        let _: Envelope<Empty> = self.call(
            Method::POST,
            self.paths.submit_feedback()?,
            Some(&request),
            "feedback response",
        )?;
        Ok(())
    }

    pub fn classify_description(&self, description: &str) -> Result<Classification> {
        let response: Envelope<ClassifyResponse> = self.call(
            Method::POST,
            self.paths.classify()?,
            Some(&ClassifyRequest { description }),
            "classification",
        )?;
        response.body.into_classification()
    }

    pub fn all_related_issues(&self) -> Result<Vec<RelatedIssue>> {
        let response: Envelope<RelatedIssuesResponse> = self.call(
            Method::GET,
            self.paths.related_issues()?,
            None::<&()>,
            "related issues",
        )?;
        Ok(response
            .body
            .related_issues
            .into_iter()
            .map(RelatedIssue::from)
            .collect())
    }

    pub fn sub_related_issues_for(&self, related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>> {
        let response: Envelope<SubRelatedIssuesResponse> = self.call(
            Method::GET,
            self.paths.sub_related_issues(related)?,
            None::<&()>,
            "sub-related issues",
        )?;
        Ok(response
            .body
            .sub_related_issues
            .into_iter()
            .map(|sub| sub.into_domain(related))
            .collect())
    }

    pub fn solutions_for(&self, sub: SubRelatedIssueId) -> Result<SolutionSet> {
        let response: Envelope<SolutionsResponse> = self.call(
            Method::GET,
            self.paths.solutions(sub)?,
            None::<&()>,
            "solutions",
        )?;
        Ok(SolutionSet::from(response.body))
    }

    pub fn report_resolution(&self, session: SessionId, resolved: bool) -> Result<()> {
        let request = LogResolutionRequest {
            is_resolved: resolved,
            session_id: session,
        };
        let _: Envelope<Empty> = self.call(
            Method::POST,
            self.paths.log_resolution()?,
            Some(&request),
            "resolution log response",
        )?;
        Ok(())
    }

    pub fn submit(&self, submission: &ComplaintSubmission) -> Result<()> {
        let _: Envelope<Empty> = self.call(
            Method::POST,
            self.paths.submit_complaint()?,
            Some(submission),
            "submission response",
        )?;
        Ok(())
    }

    fn call<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        what: &'static str,
    ) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        self.finish(request, &method, &url, what)
    }

    fn finish<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &Method,
        url: &Url,
        what: &'static str,
    ) -> Result<Envelope<T>> {
        let response = self.send(request, method, url)?;
        let envelope: Envelope<T> = response
            .json()
            .map_err(|source| ApiError::Decode { what, source })?;
        if envelope.success == Some(false) {
            let message = envelope
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| REJECTED_FALLBACK.to_owned());
            return Err(ApiError::Rejected(message).into());
        }
        Ok(envelope)
    }

    fn send(&self, request: RequestBuilder, method: &Method, url: &Url) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().map_err(|source| ApiError::Connection {
            base_url: self.paths.base_url().to_owned(),
            source,
        })?;

        let status = response.status();
        tracing::debug!(
            method = method.as_str(),
            path = url.path(),
            status = status.as_u16(),
            "api request"
        );
        if status == StatusCode::UNAUTHORIZED && self.token.is_some() {
            return Err(ApiError::Unauthorized.into());
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body).into());
        }
        Ok(response)
    }
}

impl IntakeBackend for Client {
    fn classify(&mut self, description: &str) -> Result<Classification> {
        self.classify_description(description)
    }

    fn related_issues(&mut self) -> Result<Vec<RelatedIssue>> {
        self.all_related_issues()
    }

    fn sub_related_issues(&mut self, related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>> {
        self.sub_related_issues_for(related)
    }

    fn solutions(&mut self, sub: SubRelatedIssueId) -> Result<SolutionSet> {
        self.solutions_for(sub)
    }

    fn log_resolution(&mut self, session: SessionId, resolved: bool) -> Result<()> {
        self.report_resolution(session, resolved)
    }

    fn submit_complaint(&mut self, submission: &ComplaintSubmission) -> Result<()> {
        self.submit(submission)
    }
}

impl QueueBackend for Client {
    fn queue(&mut self, kind: QueueKind) -> Result<Vec<QueueComplaint>> {
        self.queue_complaints(kind)
    }

    fn take(&mut self, complaint: ComplaintId) -> Result<Assignment> {
        self.take_complaint(complaint)
    }

    fn reject(&mut self, complaint: ComplaintId) -> Result<()> {
        self.reject_complaint(complaint)
    }

    fn solve(&mut self, complaint: ComplaintId, update: &SolutionUpdate) -> Result<()> {
        self.solve_complaint(complaint, update)
    }

    fn categorize(&mut self, complaint: ComplaintId, update: &CategorizeUpdate) -> Result<()> {
        self.categorize_complaint(complaint, update)
    }

    fn main_issues(&mut self) -> Result<Vec<MainIssue>> {
        self.main_issue_list()
    }

    fn related_issues_under(&mut self, main: MainIssueId) -> Result<Vec<RelatedIssue>> {
        self.related_issues_for(main)
    }

    fn sub_issues_under(&mut self, related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>> {
        let response: Envelope<SubRelatedIssuesResponse> = self.call(
            Method::GET,
            self.paths.sub_issues_under(related)?,
            None::<&()>,
            "sub-related issues",
        )?;
        Ok(response
            .body
            .sub_related_issues
            .into_iter()
            .map(|sub| sub.into_domain(related))
            .collect())
    }

    fn staff(&mut self, role: Role) -> Result<Vec<StaffMember>> {
        self.staff_members(role)
    }
}
