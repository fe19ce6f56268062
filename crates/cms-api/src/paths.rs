// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use cms_app::{ComplaintId, MainIssueId, QueueKind, RelatedIssueId, Role, SubRelatedIssueId};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://cms-backend-ceyx.onrender.com/api";

/// Endpoint table relative to the configured API root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPaths {
    base: Url,
}

impl ApiPaths {
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("api.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?} -- fix the scheme and retry",
                base.scheme()
            );
        }
        Ok(Self { base })
    }

    /// Base URL without the trailing slash, for messages.
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    pub fn login(&self) -> Result<Url> {
        self.endpoint("auth/login")
    }

    /// Password reset endpoint for accounts of `role`.
    pub fn reset_password(&self, role: Role) -> Result<Url> {
        self.endpoint(&format!("auth/{}/reset-password", role.as_str()))
    }

    pub fn profile(&self) -> Result<Url> {
        self.endpoint("profile")
    }

    pub fn update_profile(&self) -> Result<Url> {
        self.endpoint("profile/update")
    }

    pub fn queue(&self, kind: QueueKind) -> Result<Url> {
        let list = match kind {
            QueueKind::General => "general",
            QueueKind::Uncategorized => "pending",
            QueueKind::Assigned => "assigned",
            QueueKind::Solved => "solved",
        };
        self.endpoint(&format!("subadmin/complaints/{list}"))
    }

    pub fn take_complaint(&self, complaint: ComplaintId) -> Result<Url> {
        self.endpoint(&format!("subadmin/complaints/{complaint}/take"))
    }

    pub fn reject_complaint(&self, complaint: ComplaintId) -> Result<Url> {
        self.endpoint(&format!("subadmin/complaints/{complaint}/reject"))
    }

    pub fn solve_complaint(&self, complaint: ComplaintId) -> Result<Url> {
        self.endpoint(&format!(
            "subadmin/complaints/{complaint}/update-general-solution"
        ))
    }

    pub fn categorize_complaint(&self, complaint: ComplaintId) -> Result<Url> {
        self.endpoint(&format!("subadmin/complaints/{complaint}/update-uncategorized"))
    }

    pub fn main_issues(&self) -> Result<Url> {
        self.endpoint("subadmin/main-issues")
    }

    pub fn related_issues_under(&self, main: MainIssueId) -> Result<Url> {
        let mut url = self.endpoint("subadmin/related-issues")?;
        url.query_pairs_mut()
            .append_pair("main_issue_id", &main.to_string());
        Ok(url)
    }

    pub fn sub_issues_under(&self, related: RelatedIssueId) -> Result<Url> {
        let mut url = self.endpoint("subadmin/sub-related-issues")?;
        url.query_pairs_mut()
            .append_pair("related_issue_id", &related.to_string());
        Ok(url)
    }

    pub fn staff(&self, role: Role) -> Result<Url> {
        self.endpoint(&format!("subadmin/all-{}s", role.as_str()))
    }

    pub fn dashboard_summary(&self, role: Role) -> Result<Url> {
        match role {
            Role::User => self.endpoint("complaints/dashboard/summary"),
            Role::SubAdmin => self.endpoint("subadmin/dashboard/summary"),
            Role::Admin => self.endpoint("admin/dashboard/summary"),
        }
    }

    pub fn classify(&self) -> Result<Url> {
        self.endpoint("complaints/classify-description")
    }

    pub fn solutions(&self, sub: SubRelatedIssueId) -> Result<Url> {
        let mut url = self.endpoint("complaints/solutions")?;
        url.query_pairs_mut()
            .append_pair("subRelatedIssueId", &sub.to_string());
        Ok(url)
    }

    pub fn log_resolution(&self) -> Result<Url> {
        self.endpoint("complaints/log-resolution")
    }

    pub fn submit_complaint(&self) -> Result<Url> {
        self.endpoint("complaints/submit")
    }

    pub fn track_complaints(&self) -> Result<Url> {
        self.endpoint("complaints/track-complaints")
    }

    pub fn submit_feedback(&self) -> Result<Url> {
        self.endpoint("complaints/submit-feedback")
    }

    pub fn related_issues(&self) -> Result<Url> {
        self.endpoint("complaints/related-issues/all")
    }

    pub fn sub_related_issues(&self, related: RelatedIssueId) -> Result<Url> {
        let mut url = self.endpoint("complaints/sub-related-issues")?;
        url.query_pairs_mut()
            .append_pair("related_issue_id", &related.to_string());
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("build URL for {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiPaths, DEFAULT_BASE_URL};
    use cms_app::{ComplaintId, MainIssueId, QueueKind, RelatedIssueId, Role, SubRelatedIssueId};

    #[test]
    fn endpoints_keep_base_path() {
        let paths = ApiPaths::new(DEFAULT_BASE_URL).expect("default base url");
        assert_eq!(paths.base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            paths.login().expect("login url").as_str(),
            "https://cms-backend-ceyx.onrender.com/api/auth/login"
        );
        assert_eq!(
            paths
                .dashboard_summary(Role::SubAdmin)
                .expect("summary url")
                .path(),
            "/api/subadmin/dashboard/summary"
        );
    }

    #[test]
    fn query_parameters_are_encoded() {
        let paths = ApiPaths::new("http://localhost:5000/api/").expect("local base url");
        assert_eq!(
            paths
                .solutions(SubRelatedIssueId::new(21))
                .expect("solutions url")
                .as_str(),
            "http://localhost:5000/api/complaints/solutions?subRelatedIssueId=21"
        );
        assert_eq!(
            paths
                .sub_related_issues(RelatedIssueId::new(5))
                .expect("sub issues url")
                .query(),
            Some("related_issue_id=5")
        );
    }

    #[test]
    fn staff_endpoints_follow_role_and_list() {
        let paths = ApiPaths::new("http://localhost:5000/api").expect("local base url");
        let path = |url: anyhow::Result<url::Url>| url.expect("endpoint").path().to_owned();
        assert_eq!(path(paths.reset_password(Role::User)), "/api/auth/user/reset-password");
        assert_eq!(
            path(paths.reset_password(Role::SubAdmin)),
            "/api/auth/subadmin/reset-password"
        );
        assert_eq!(
            path(paths.queue(QueueKind::Uncategorized)),
            "/api/subadmin/complaints/pending"
        );
        assert_eq!(
            path(paths.solve_complaint(ComplaintId::new(9))),
            "/api/subadmin/complaints/9/update-general-solution"
        );
        assert_eq!(path(paths.staff(Role::Admin)), "/api/subadmin/all-admins");
        assert_eq!(
            paths
                .related_issues_under(MainIssueId::new(3))
                .expect("related url")
                .query(),
            Some("main_issue_id=3")
        );
    }

    #[test]
    fn rejects_bad_base_urls() {
        assert!(ApiPaths::new("  ").is_err());
        assert!(ApiPaths::new("not a url").is_err());
        assert!(ApiPaths::new("ftp://example.com/api").is_err());
    }
}
