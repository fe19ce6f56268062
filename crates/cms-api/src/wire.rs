// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! JSON shapes exchanged with the complaint backend and their conversion
//! into domain values. The backend mixes camelCase and snake_case keys and
//! sometimes sends counters and ids as strings.

use anyhow::{Result, anyhow};
use cms_app::{
    AdminStats, Assignment, Classification, ComplaintId, DashboardSummary, MainIssue, MainIssueId,
    Priority, Profile, QueueComplaint, RelatedIssue, RelatedIssueId, Role, Session, SessionId,
    Severity, SolutionSet, StaffId, StaffMember, SubAdminStats, SubRelatedIssue,
    SubRelatedIssueId, TrackedComplaint, UserId, UserStats,
};
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) => Some(value.trunc() as i64),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Counter that tolerates null, strings, and floats; anything unreadable is 0.
fn count<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(value.and_then(|number| number.to_i64()).unwrap_or(0))
}

fn id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = LooseNumber::deserialize(deserializer)?;
    value
        .to_i64()
        .ok_or_else(|| serde::de::Error::custom("expected a numeric id"))
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(value.and_then(|number| number.to_i64()))
}

/// Common `{success, message}` wrapper around a response body.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub staff_no: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<i64>,
}

impl LoginResponse {
    pub fn into_session(self) -> Result<Session> {
        let token = self
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow!("login response did not include a token"))?;
        let role = self
            .role
            .as_deref()
            .and_then(Role::parse)
            .ok_or_else(|| anyhow!("Invalid role"))?;
        let user_id = self
            .user_id
            .ok_or_else(|| anyhow!("login response did not include a user id"))?;
        Ok(Session {
            token,
            role,
            user_id: UserId::new(user_id),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResetPasswordRequest<'a> {
    pub staff_no: &'a str,
    pub new_password: &'a str,
    pub confirm_password: &'a str,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Empty {}

#[derive(Debug, Deserialize)]
pub(crate) struct UserSummaryResponse {
    #[serde(default)]
    pub stats: WireUserStats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireUserStats {
    #[serde(default, deserialize_with = "count")]
    pub total: i64,
    #[serde(default, deserialize_with = "count")]
    pub resolved: i64,
    #[serde(default, deserialize_with = "count")]
    pub unresolved: i64,
    #[serde(default, deserialize_with = "count")]
    pub this_month: i64,
}

impl From<WireUserStats> for DashboardSummary {
    fn from(stats: WireUserStats) -> Self {
        Self::User(UserStats {
            total: stats.total,
            resolved: stats.resolved,
            unresolved: stats.unresolved,
            this_month: stats.this_month,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubAdminSummaryResponse {
    #[serde(default, deserialize_with = "count")]
    pub total_solved: i64,
    #[serde(default, deserialize_with = "count")]
    pub uncategorized: i64,
    #[serde(default, deserialize_with = "count")]
    pub total_assigned: i64,
    #[serde(default, deserialize_with = "count")]
    pub total_complaints: i64,
}

impl From<SubAdminSummaryResponse> for DashboardSummary {
    fn from(stats: SubAdminSummaryResponse) -> Self {
        Self::SubAdmin(SubAdminStats {
            total_solved: stats.total_solved,
            uncategorized: stats.uncategorized,
            total_assigned: stats.total_assigned,
            total_complaints: stats.total_complaints,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminSummaryResponse {
    #[serde(default, deserialize_with = "count")]
    pub total_complaints: i64,
    #[serde(default, deserialize_with = "count")]
    pub pending_complaints: i64,
    #[serde(default, deserialize_with = "count")]
    pub total_resolved: i64,
    #[serde(default, deserialize_with = "count")]
    pub ai_resolved: i64,
    #[serde(default, deserialize_with = "count")]
    pub high_priority: i64,
    #[serde(default, deserialize_with = "count")]
    pub total_users: i64,
    #[serde(default, deserialize_with = "count")]
    pub total_admins: i64,
    #[serde(default, deserialize_with = "count")]
    pub total_sub_admins: i64,
    #[serde(default, deserialize_with = "count")]
    pub active_this_month: i64,
}

impl From<AdminSummaryResponse> for DashboardSummary {
    fn from(stats: AdminSummaryResponse) -> Self {
        Self::Admin(AdminStats {
            total_complaints: stats.total_complaints,
            pending_complaints: stats.pending_complaints,
            total_resolved: stats.total_resolved,
            ai_resolved: stats.ai_resolved,
            high_priority: stats.high_priority,
            total_users: stats.total_users,
            total_admins: stats.total_admins,
            total_sub_admins: stats.total_sub_admins,
            active_this_month: stats.active_this_month,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassifyRequest<'a> {
    pub description: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClassifyResponse {
    #[serde(default)]
    pub main_issue: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub main_issue_id: Option<i64>,
    #[serde(default)]
    pub related_issue: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub related_issue_id: Option<i64>,
    #[serde(default)]
    pub sub_related_issues: Vec<WireSubRelatedIssue>,
}

impl ClassifyResponse {
    pub fn into_classification(self) -> Result<Classification> {
        let (Some(main_issue_id), Some(related_issue_id)) =
            (self.main_issue_id, self.related_issue_id)
        else {
            return Err(anyhow!(
                "classification response is missing issue ids -- try describing the issue differently"
            ));
        };
        let related_issue_id = RelatedIssueId::new(related_issue_id);
        Ok(Classification {
            main_issue: self.main_issue.unwrap_or_default(),
            main_issue_id: MainIssueId::new(main_issue_id),
            related_issue: self.related_issue.unwrap_or_default(),
            related_issue_id,
            sub_related_issues: self
                .sub_related_issues
                .into_iter()
                .map(|sub| sub.into_domain(related_issue_id))
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSubRelatedIssue {
    #[serde(deserialize_with = "id")]
    pub id: i64,
    #[serde(default, deserialize_with = "optional_id")]
    pub related_issue_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl WireSubRelatedIssue {
    pub fn into_domain(self, fallback_related: RelatedIssueId) -> SubRelatedIssue {
        SubRelatedIssue {
            id: SubRelatedIssueId::new(self.id),
            related_issue_id: self
                .related_issue_id
                .map(RelatedIssueId::new)
                .unwrap_or(fallback_related),
            name: self.name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelatedIssuesResponse {
    #[serde(default)]
    pub related_issues: Vec<WireRelatedIssue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRelatedIssue {
    #[serde(deserialize_with = "id")]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub main_issue_id: Option<i64>,
    #[serde(default)]
    pub main_issue_name: Option<String>,
}

impl From<WireRelatedIssue> for RelatedIssue {
    fn from(wire: WireRelatedIssue) -> Self {
        Self {
            id: RelatedIssueId::new(wire.id),
            name: wire.name.unwrap_or_default(),
            main_issue_id: MainIssueId::new(wire.main_issue_id.unwrap_or_default()),
            main_issue_name: wire.main_issue_name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubRelatedIssuesResponse {
    #[serde(default)]
    pub sub_related_issues: Vec<WireSubRelatedIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SolutionsResponse {
    #[serde(default)]
    pub issue_description: Option<String>,
    #[serde(default)]
    pub solutions: Vec<WireSolutionStep>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSolutionStep {
    #[serde(default, deserialize_with = "count")]
    pub step_number: i64,
    #[serde(default)]
    pub step_instruction: Option<String>,
}

impl From<SolutionsResponse> for SolutionSet {
    fn from(mut wire: SolutionsResponse) -> Self {
        wire.solutions.sort_by_key(|step| step.step_number);
        Self {
            issue_description: wire.issue_description,
            steps: wire
                .solutions
                .into_iter()
                .filter_map(|step| step.step_instruction)
                .filter(|text| !text.trim().is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogResolutionRequest {
    pub is_resolved: bool,
    pub session_id: SessionId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackResponse {
    #[serde(default)]
    pub complaints: Vec<WireComplaint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireComplaint {
    #[serde(deserialize_with = "id")]
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub main_issue: Option<String>,
    #[serde(default)]
    pub related_issue: Option<String>,
    #[serde(default)]
    pub sub_related_issue: Option<String>,
    #[serde(default)]
    pub issue_description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub assigned_to_id: Option<i64>,
    #[serde(default)]
    pub assigned_to_phone: Option<String>,
    #[serde(default)]
    pub done_by: Option<String>,
    #[serde(default)]
    pub direct_solution: Option<String>,
    #[serde(default)]
    pub solution_steps: Option<Vec<String>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub has_feedback: Option<bool>,
}

impl From<WireComplaint> for TrackedComplaint {
    fn from(wire: WireComplaint) -> Self {
        Self {
            id: ComplaintId::new(wire.id),
            description: wire.description.unwrap_or_default(),
            main_issue: wire.main_issue.unwrap_or_default(),
            related_issue: wire.related_issue.unwrap_or_default(),
            sub_related_issue: wire.sub_related_issue.unwrap_or_default(),
            issue_description: wire.issue_description.unwrap_or_default(),
            status: wire.status.unwrap_or_default(),
            assigned_to: wire.assigned_to.filter(|name| !name.trim().is_empty()),
            assigned_to_id: wire.assigned_to_id.map(StaffId::new),
            assigned_to_phone: wire.assigned_to_phone,
            done_by: wire.done_by,
            direct_solution: wire.direct_solution,
            solution_steps: wire.solution_steps.unwrap_or_default(),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            has_feedback: wire.has_feedback.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct FeedbackRequest<'a> {
    pub complaint_id: i64,
    pub user_id: Option<i64>,
    pub subadmin_id: Option<i64>,
    pub label: &'a str,
    pub comment: &'a str,
}

/// Contacts arrive as a list, a plain string, or a JSON-encoded list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireContacts {
    List(Vec<String>),
    Text(String),
}

impl WireContacts {
    fn into_list(self) -> Vec<String> {
        let list = match self {
            Self::List(list) => list,
            Self::Text(text) => serde_json::from_str::<Vec<String>>(&text).unwrap_or_default(),
        };
        list.into_iter()
            .filter(|contact| !contact.trim().is_empty())
            .collect()
    }

    fn into_line(self) -> Option<String> {
        let line = match self {
            Self::List(list) => list.join(", "),
            Self::Text(text) => text,
        };
        (!line.trim().is_empty()).then_some(line)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueueResponse {
    #[serde(default)]
    pub complaints: Vec<WireQueueComplaint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireQueueComplaint {
    #[serde(deserialize_with = "id")]
    pub complaint_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, rename = "user_staffNo")]
    pub user_staff_no: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub main_issue_id: Option<i64>,
    #[serde(default)]
    pub main_issue_name: Option<String>,
    #[serde(default)]
    pub related_issue_name: Option<String>,
    #[serde(default)]
    pub sub_related_issue_name: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub sub_related_issue_id: Option<i64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub assigned_to_id: Option<i64>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub done_by_id: Option<i64>,
    #[serde(default)]
    pub done_by_name: Option<String>,
    #[serde(default)]
    pub contacts: Option<WireContacts>,
}

impl From<WireQueueComplaint> for QueueComplaint {
    fn from(wire: WireQueueComplaint) -> Self {
        Self {
            id: ComplaintId::new(wire.complaint_id),
            description: wire.description.unwrap_or_default(),
            priority: wire
                .priority
                .as_deref()
                .and_then(Priority::parse)
                .unwrap_or_default(),
            severity: wire
                .severity
                .as_deref()
                .and_then(Severity::parse)
                .unwrap_or_default(),
            status: wire.status.unwrap_or_default(),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            user_name: wire.user_name.unwrap_or_default(),
            user_staff_no: wire.user_staff_no,
            main_issue_id: wire.main_issue_id.map(MainIssueId::new),
            main_issue: wire.main_issue_name,
            related_issue: wire.related_issue_name,
            sub_related_issue: wire.sub_related_issue_name,
            sub_related_issue_id: wire.sub_related_issue_id.map(SubRelatedIssueId::new),
            assigned_to_id: wire.assigned_to_id.map(StaffId::new),
            assigned_to: wire.assigned_to_name,
            done_by_id: wire.done_by_id.map(StaffId::new),
            done_by: wire.done_by_name,
            contacts: wire.contacts.and_then(WireContacts::into_line),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TakeResponse {
    #[serde(default, rename = "assigned_to_id", deserialize_with = "optional_id")]
    pub assigned_to_id: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl From<TakeResponse> for Assignment {
    fn from(wire: TakeResponse) -> Self {
        Self {
            assigned_to_id: wire.assigned_to_id.map(StaffId::new),
            assigned_to: wire.assigned_to.filter(|name| !name.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MainIssuesResponse {
    #[serde(default)]
    pub main_issues: Vec<WireNamed>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StaffResponse {
    #[serde(default)]
    pub users: Vec<WireNamed>,
}

/// `{id, name}` pair used by the main-issue and staff lists.
#[derive(Debug, Deserialize)]
pub(crate) struct WireNamed {
    #[serde(deserialize_with = "id")]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<WireNamed> for MainIssue {
    fn from(wire: WireNamed) -> Self {
        Self {
            id: MainIssueId::new(wire.id),
            name: wire.name.unwrap_or_default(),
        }
    }
}

impl From<WireNamed> for StaffMember {
    fn from(wire: WireNamed) -> Self {
        Self {
            id: StaffId::new(wire.id),
            name: wire.name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub staff_no: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub contacts: Option<WireContacts>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl From<ProfileResponse> for Profile {
    fn from(wire: ProfileResponse) -> Self {
        Self {
            staff_no: wire.staff_no.unwrap_or_default(),
            name: wire.name.unwrap_or_default(),
            department: wire.department.unwrap_or_default(),
            designation: wire.designation.unwrap_or_default(),
            contacts: wire
                .contacts
                .map(WireContacts::into_list)
                .unwrap_or_default(),
            photo_url: wire.photo_url.filter(|url| !url.trim().is_empty()),
        }
    }
}
