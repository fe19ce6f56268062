// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    SubAdmin,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::SubAdmin => "subadmin",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "subadmin" => Some(Self::SubAdmin),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::SubAdmin => "SubAdmin",
            Self::Admin => "Admin",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let current = Self::ALL
            .iter()
            .position(|priority| *priority == self)
            .unwrap_or(1) as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainIssue {
    pub id: MainIssueId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedIssue {
    pub id: RelatedIssueId,
    pub name: String,
    pub main_issue_id: MainIssueId,
    pub main_issue_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRelatedIssue {
    pub id: SubRelatedIssueId,
    pub related_issue_id: RelatedIssueId,
    pub name: String,
}

/// Categorisation returned by the remote classifier for a free-text description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub main_issue: String,
    pub main_issue_id: MainIssueId,
    pub related_issue: String,
    pub related_issue_id: RelatedIssueId,
    pub sub_related_issues: Vec<SubRelatedIssue>,
}

/// Remediation text for one sub-issue; `steps` are already in step order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionSet {
    pub issue_description: Option<String>,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintSubmission {
    pub description: String,
    pub main_issue_id: MainIssueId,
    pub related_issue_id: RelatedIssueId,
    pub sub_related_issue_id: Option<SubRelatedIssueId>,
    pub priority: Priority,
    pub is_resolved: bool,
    pub session_id: SessionId,
    pub issue_description: String,
    pub contact_number: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: i64,
    pub resolved: i64,
    pub unresolved: i64,
    pub this_month: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubAdminStats {
    pub total_solved: i64,
    pub uncategorized: i64,
    pub total_assigned: i64,
    pub total_complaints: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub total_complaints: i64,
    pub pending_complaints: i64,
    pub total_resolved: i64,
    pub ai_resolved: i64,
    pub high_priority: i64,
    pub total_users: i64,
    pub total_admins: i64,
    pub total_sub_admins: i64,
    pub active_this_month: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardSummary {
    User(UserStats),
    SubAdmin(SubAdminStats),
    Admin(AdminStats),
}

impl DashboardSummary {
    pub const fn empty_for(role: Role) -> Self {
        match role {
            Role::User => Self::User(UserStats {
                total: 0,
                resolved: 0,
                unresolved: 0,
                this_month: 0,
            }),
            Role::SubAdmin => Self::SubAdmin(SubAdminStats {
                total_solved: 0,
                uncategorized: 0,
                total_assigned: 0,
                total_complaints: 0,
            }),
            Role::Admin => Self::Admin(AdminStats {
                total_complaints: 0,
                pending_complaints: 0,
                total_resolved: 0,
                ai_resolved: 0,
                high_priority: 0,
                total_users: 0,
                total_admins: 0,
                total_sub_admins: 0,
                active_this_month: 0,
            }),
        }
    }

    pub const fn role(&self) -> Role {
        match self {
            Self::User(_) => Role::User,
            Self::SubAdmin(_) => Role::SubAdmin,
            Self::Admin(_) => Role::Admin,
        }
    }

    pub fn tiles(&self) -> Vec<(&'static str, i64)> {
        match self {
            Self::User(stats) => vec![
                ("Total complaints", stats.total),
                ("Resolved", stats.resolved),
                ("Unresolved", stats.unresolved),
                ("This month", stats.this_month),
            ],
            Self::SubAdmin(stats) => vec![
                ("Total complaints", stats.total_complaints),
                ("Assigned", stats.total_assigned),
                ("Solved", stats.total_solved),
                ("Uncategorized", stats.uncategorized),
            ],
            Self::Admin(stats) => vec![
                ("Total complaints", stats.total_complaints),
                ("Pending", stats.pending_complaints),
                ("Resolved", stats.total_resolved),
                ("AI resolved", stats.ai_resolved),
                ("High priority", stats.high_priority),
                ("Users", stats.total_users),
                ("Admins", stats.total_admins),
                ("SubAdmins", stats.total_sub_admins),
                ("Active this month", stats.active_this_month),
            ],
        }
    }
}

/// An admin or subadmin account that can be credited with a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLabel {
    Excellent,
    Good,
    Average,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl FeedbackLabel {
    pub const ALL: [Self; 5] = [
        Self::Excellent,
        Self::Good,
        Self::Average,
        Self::Poor,
        Self::VeryPoor,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSubmission {
    pub complaint_id: ComplaintId,
    pub user_id: Option<UserId>,
    pub subadmin_id: Option<StaffId>,
    pub label: FeedbackLabel,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::{DashboardSummary, FeedbackLabel, Priority, Role};

    #[test]
    fn role_round_trips_backend_strings() {
        for role in [Role::User, Role::SubAdmin, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn priority_defaults_to_medium_and_cycles() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::Medium.cycle(1), Priority::High);
        assert_eq!(Priority::High.cycle(1), Priority::Low);
        assert_eq!(Priority::Low.cycle(-1), Priority::High);
    }

    #[test]
    fn priority_serializes_as_title_case() {
        let json = serde_json::to_string(&Priority::High).expect("serialize priority");
        assert_eq!(json, "\"High\"");
    }

    #[test]
    fn feedback_label_parses_display_names() {
        assert_eq!(FeedbackLabel::parse("very poor"), Some(FeedbackLabel::VeryPoor));
        assert_eq!(FeedbackLabel::parse("Good"), Some(FeedbackLabel::Good));
        assert_eq!(FeedbackLabel::parse("meh"), None);
    }

    #[test]
    fn empty_summary_matches_role() {
        for role in [Role::User, Role::SubAdmin, Role::Admin] {
            let summary = DashboardSummary::empty_for(role);
            assert_eq!(summary.role(), role);
            assert!(summary.tiles().iter().all(|(_, value)| *value == 0));
        }
    }
}
