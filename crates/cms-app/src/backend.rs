// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::ids::{ComplaintId, MainIssueId, RelatedIssueId, SessionId, SubRelatedIssueId};
use crate::model::{
    Classification, ComplaintSubmission, MainIssue, RelatedIssue, Role, SolutionSet, StaffMember,
    SubRelatedIssue,
};
use crate::queue::{Assignment, CategorizeUpdate, QueueComplaint, QueueKind, SolutionUpdate};

/// Remote operations the intake wizard depends on.
pub trait IntakeBackend {
    fn classify(&mut self, description: &str) -> Result<Classification>;
    fn related_issues(&mut self) -> Result<Vec<RelatedIssue>>;
    fn sub_related_issues(&mut self, related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>>;
    fn solutions(&mut self, sub: SubRelatedIssueId) -> Result<SolutionSet>;
    fn log_resolution(&mut self, session: SessionId, resolved: bool) -> Result<()>;
    fn submit_complaint(&mut self, submission: &ComplaintSubmission) -> Result<()>;
}

/// Remote operations behind the subadmin work queues.
pub trait QueueBackend {
    /// Everything the list's endpoint returns; [`QueueKind::includes`]
    /// narrows it down.
    fn queue(&mut self, kind: QueueKind) -> Result<Vec<QueueComplaint>>;
    fn take(&mut self, complaint: ComplaintId) -> Result<Assignment>;
    fn reject(&mut self, complaint: ComplaintId) -> Result<()>;
    fn solve(&mut self, complaint: ComplaintId, update: &SolutionUpdate) -> Result<()>;
    fn categorize(&mut self, complaint: ComplaintId, update: &CategorizeUpdate) -> Result<()>;
    fn main_issues(&mut self) -> Result<Vec<MainIssue>>;
    fn related_issues_under(&mut self, main: MainIssueId) -> Result<Vec<RelatedIssue>>;
    fn sub_issues_under(&mut self, related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>>;
    fn staff(&mut self, role: Role) -> Result<Vec<StaffMember>>;
}
