// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt::Write as _;

use anyhow::Result;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::forms::FeedbackForm;
use crate::ids::{ComplaintId, StaffId, UserId};
use crate::model::FeedbackSubmission;

const STATUS_CLOSED: &str = "Closed";
const STATUS_OPEN: &str = "Open";
const STATUS_REJECTED: &str = "Rejected";

/// One row of the signed-in user's complaint history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedComplaint {
    pub id: ComplaintId,
    pub description: String,
    pub main_issue: String,
    pub related_issue: String,
    pub sub_related_issue: String,
    pub issue_description: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub assigned_to_id: Option<StaffId>,
    pub assigned_to_phone: Option<String>,
    pub done_by: Option<String>,
    pub direct_solution: Option<String>,
    pub solution_steps: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub has_feedback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Rejected,
    Resolved,
    InProgress,
    Pending,
}

impl DisplayStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rejected => "Rejected",
            Self::Resolved => "Resolved",
            Self::InProgress => "In Progress",
            Self::Pending => "Pending",
        }
    }
}

impl TrackedComplaint {
    pub fn display_status(&self) -> DisplayStatus {
        match self.status.as_str() {
            STATUS_REJECTED => DisplayStatus::Rejected,
            STATUS_CLOSED => DisplayStatus::Resolved,
            STATUS_OPEN if self.is_assigned() => DisplayStatus::InProgress,
            _ => DisplayStatus::Pending,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_to
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    /// Elapsed time between creation and the last update, floored to whole
    /// hours or days.
    pub fn time_taken(&self) -> String {
        let Some(updated_at) = self.updated_at else {
            return "In progress".to_owned();
        };
        let hours = (updated_at - self.created_at).whole_hours();
        let days = hours.div_euclid(24);
        if days >= 1 {
            return format!("{days} day{}", if days > 1 { "s" } else { "" });
        }
        format!("{hours} hour{}", if hours > 1 { "s" } else { "" })
    }

    /// Feedback goes to whoever resolved the complaint.
    pub fn can_leave_feedback(&self) -> bool {
        !self.has_feedback && self.display_status() == DisplayStatus::Resolved
    }

    pub fn feedback(
        &self,
        user_id: Option<UserId>,
        form: &FeedbackForm,
    ) -> Result<FeedbackSubmission> {
        let label = form.validate()?;
        Ok(FeedbackSubmission {
            complaint_id: self.id,
            user_id,
            subadmin_id: self.assigned_to_id,
            label,
            comment: form.comment.trim().to_owned(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComplaintFilter {
    #[default]
    All,
    ThisMonth,
    Resolved,
    Unresolved,
}

impl ComplaintFilter {
    pub const ALL: [Self; 4] = [Self::All, Self::ThisMonth, Self::Resolved, Self::Unresolved];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ThisMonth => "month",
            Self::Resolved => "resolved",
            Self::Unresolved => "unresolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == value.trim().to_ascii_lowercase())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::ThisMonth => "This month",
            Self::Resolved => "Resolved",
            Self::Unresolved => "Unresolved",
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let current = Self::ALL
            .iter()
            .position(|filter| *filter == self)
            .unwrap_or(0) as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }

    pub fn matches(self, complaint: &TrackedComplaint, now: OffsetDateTime) -> bool {
        match self {
            Self::All => true,
            Self::ThisMonth => {
                let created = complaint.created_at.to_offset(now.offset());
                created.month() == now.month() && created.year() == now.year()
            }
            Self::Resolved => complaint.status == STATUS_CLOSED,
            Self::Unresolved => complaint.status == STATUS_OPEN,
        }
    }

    pub fn apply<'a>(
        self,
        complaints: &'a [TrackedComplaint],
        now: OffsetDateTime,
    ) -> Vec<&'a TrackedComplaint> {
        complaints
            .iter()
            .filter(|complaint| self.matches(complaint, now))
            .collect()
    }
}

/// Flags a complaint as rated after the backend accepted its feedback.
pub fn mark_feedback_given(complaints: &mut [TrackedComplaint], id: ComplaintId) -> bool {
    match complaints.iter_mut().find(|complaint| complaint.id == id) {
        Some(complaint) => {
            complaint.has_feedback = true;
            true
        }
        None => false,
    }
}

const CSV_HEADER: [&str; 10] = [
    "id",
    "created",
    "main_issue",
    "related_issue",
    "sub_issue",
    "description",
    "status",
    "assigned_to",
    "time_taken",
    "feedback",
];

pub fn export_csv<'a>(complaints: impl IntoIterator<Item = &'a TrackedComplaint>) -> String {
    let date_format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|field| (*field).to_owned()));

    for complaint in complaints {
        let created = complaint
            .created_at
            .format(date_format)
            .unwrap_or_else(|_| complaint.created_at.to_string());
        push_row(
            &mut out,
            [
                complaint.id.to_string(),
                created,
                complaint.main_issue.clone(),
                complaint.related_issue.clone(),
                complaint.sub_related_issue.clone(),
                complaint.description.clone(),
                complaint.display_status().label().to_owned(),
                complaint.assigned_to.clone().unwrap_or_default(),
                complaint.time_taken(),
                if complaint.has_feedback { "yes" } else { "no" }.to_owned(),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (index, field) in fields.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            let _ = write!(out, "\"{}\"", field.replace('"', "\"\""));
        } else {
            out.push_str(&field);
        }
    }
    out.push('\n');
}
