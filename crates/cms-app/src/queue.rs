// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! SubAdmin work queues: which complaints land on which list, and the
//! take / reject / solve / categorize actions applied to them.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use time::OffsetDateTime;

use crate::backend::QueueBackend;
use crate::draft::{OTHERS_LABEL, OthersCategory};
use crate::ids::{ComplaintId, MainIssueId, RelatedIssueId, StaffId, SubRelatedIssueId};
use crate::model::Priority;
use crate::wizard::Notice;

const STATUS_PENDING: &str = "Pending";
const STATUS_OPEN: &str = "Open";
const STATUS_CLOSED: &str = "Closed";
const STATUS_REJECTED: &str = "Rejected";

pub const NOT_AVAILABLE: &str = "N/A";
pub const DIRECT_SOLUTION_MAX: usize = 1000;
pub const SUB_ISSUE_NAME_MAX: usize = 100;
pub const ISSUE_DESCRIPTION_MAX: usize = 1000;
pub const SOLUTION_STEP_MAX: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Major,
    #[default]
    Minor,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Major" => Some(Self::Major),
            "Minor" => Some(Self::Minor),
            _ => None,
        }
    }

    pub const fn toggle(self) -> Self {
        match self {
            Self::Major => Self::Minor,
            Self::Minor => Self::Major,
        }
    }
}

/// One complaint as the subadmin lists show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueComplaint {
    pub id: ComplaintId,
    pub description: String,
    pub priority: Priority,
    pub severity: Severity,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub user_name: String,
    pub user_staff_no: Option<String>,
    pub main_issue_id: Option<MainIssueId>,
    pub main_issue: Option<String>,
    pub related_issue: Option<String>,
    pub sub_related_issue: Option<String>,
    pub sub_related_issue_id: Option<SubRelatedIssueId>,
    pub assigned_to_id: Option<StaffId>,
    pub assigned_to: Option<String>,
    pub done_by_id: Option<StaffId>,
    pub done_by: Option<String>,
    pub contacts: Option<String>,
}

impl QueueComplaint {
    pub fn is_closed(&self) -> bool {
        matches!(self.status.as_str(), STATUS_CLOSED | STATUS_REJECTED)
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_to_id.is_some()
    }

    /// No main issue yet, or still parked under the reserved Others one.
    pub fn is_uncategorized(&self) -> bool {
        self.main_issue_id
            .is_none_or(|id| id == OthersCategory::RESERVED.main_issue_id)
    }

    pub fn can_take(&self) -> bool {
        !self.is_assigned() && !self.is_closed()
    }

    pub fn main_issue_label(&self) -> &str {
        label_or_na(self.main_issue.as_deref())
    }

    pub fn related_issue_label(&self) -> &str {
        label_or_na(self.related_issue.as_deref())
    }

    pub fn sub_related_issue_label(&self) -> &str {
        label_or_na(self.sub_related_issue.as_deref())
    }

    pub fn assignee_label(&self) -> &str {
        self.assigned_to
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Unassigned")
    }
}

fn label_or_na(value: Option<&str>) -> &str {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueKind {
    #[default]
    General,
    Uncategorized,
    Assigned,
    Solved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    Take,
    Reject,
    Solve,
    Categorize,
}

impl QueueAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Take => "take",
            Self::Reject => "reject",
            Self::Solve => "solve",
            Self::Categorize => "categorize",
        }
    }
}

impl QueueKind {
    pub const ALL: [Self; 4] = [Self::General, Self::Uncategorized, Self::Assigned, Self::Solved];

    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Uncategorized => "Uncategorized",
            Self::Assigned => "Assigned to me",
            Self::Solved => "Solved by me",
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or(0) as isize;
        Self::ALL[(index + delta).rem_euclid(len) as usize]
    }

    /// Whether `complaint` belongs on this list for the staff member `me`.
    pub fn includes(self, complaint: &QueueComplaint, me: Option<StaffId>) -> bool {
        match self {
            Self::General => complaint
                .main_issue
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty() && name.trim() != OTHERS_LABEL),
            Self::Uncategorized => {
                complaint.is_uncategorized()
                    && (complaint.status == STATUS_PENDING
                        || (complaint.status == STATUS_OPEN && complaint.is_assigned()))
            }
            Self::Assigned => me.is_some() && complaint.assigned_to_id == me,
            Self::Solved => {
                complaint.status == STATUS_CLOSED && me.is_some() && complaint.done_by_id == me
            }
        }
    }

    pub const fn allows(self, action: QueueAction) -> bool {
        match action {
            QueueAction::Take => !matches!(self, Self::Solved),
            QueueAction::Reject | QueueAction::Categorize => matches!(self, Self::Uncategorized),
            QueueAction::Solve => matches!(self, Self::General | Self::Assigned),
        }
    }
}

/// Result of taking a complaint, as the backend reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub assigned_to_id: Option<StaffId>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SolutionMode {
    #[default]
    Direct,
    Structured,
}

impl SolutionMode {
    pub const fn toggle(self) -> Self {
        match self {
            Self::Direct => Self::Structured,
            Self::Structured => Self::Direct,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct solution",
            Self::Structured => "new sub-issue with steps",
        }
    }
}

/// A solution for a categorised complaint: either free text, or a new
/// sub-issue under one of the complaint's related issues with its own
/// description and steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionForm {
    pub mode: SolutionMode,
    pub direct_solution: String,
    pub related_issue: Option<RelatedIssueId>,
    pub sub_issue_name: String,
    pub issue_description: String,
    pub steps: Vec<String>,
    pub severity: Severity,
    pub done_by: Option<StaffId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSubRelatedIssue {
    pub name: String,
    pub related_issue_id: RelatedIssueId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_related_issue: Option<NewSubRelatedIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_steps: Option<Vec<String>>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_by_id: Option<StaffId>,
}

impl SolutionForm {
    pub fn validate(&self) -> Result<SolutionUpdate> {
        let update = match self.mode {
            SolutionMode::Direct => {
                let text = self.direct_solution.trim();
                if text.is_empty() {
                    bail!("Direct solution is required.");
                }
                if text.chars().count() > DIRECT_SOLUTION_MAX {
                    bail!("Direct solution cannot exceed {DIRECT_SOLUTION_MAX} characters.");
                }
                SolutionUpdate {
                    direct_solution: Some(text.to_owned()),
                    sub_related_issue: None,
                    issue_description: None,
                    solution_steps: None,
                    severity: self.severity,
                    done_by_id: self.done_by,
                }
            }
            SolutionMode::Structured => {
                let name = self.sub_issue_name.trim();
                let Some(related_issue_id) = self.related_issue.filter(|_| !name.is_empty()) else {
                    bail!("Sub-related issue name and related issue selection are required.");
                };
                if name.chars().count() > SUB_ISSUE_NAME_MAX {
                    bail!("Sub-related issue name cannot exceed {SUB_ISSUE_NAME_MAX} characters.");
                }
                let (issue_description, solution_steps) =
                    description_and_steps(&self.issue_description, &self.steps)?;
                if issue_description.is_none() && solution_steps.is_none() {
                    bail!("Either issue description or at least one solution step is required.");
                }
                SolutionUpdate {
                    direct_solution: None,
                    sub_related_issue: Some(NewSubRelatedIssue {
                        name: name.to_owned(),
                        related_issue_id,
                    }),
                    issue_description,
                    solution_steps,
                    severity: self.severity,
                    done_by_id: self.done_by,
                }
            }
        };
        Ok(update)
    }
}

/// Existing taxonomy entry by id, or a new one by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IssuePick<Id> {
    Existing { id: Id },
    New { name: String },
}

impl<Id> IssuePick<Id> {
    /// Prefers the selected entry; a blank name counts as no pick.
    pub fn choose(selected: Option<Id>, typed: &str) -> Option<Self> {
        match selected {
            Some(id) => Some(Self::Existing { id }),
            None if typed.trim().is_empty() => None,
            None => Some(Self::New {
                name: typed.trim().to_owned(),
            }),
        }
    }
}

/// Files an uncategorised complaint under the taxonomy, optionally adding
/// a description and steps for its sub-issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizeForm {
    pub main_issue: Option<IssuePick<MainIssueId>>,
    pub related_issue: Option<IssuePick<RelatedIssueId>>,
    pub sub_related_issue: Option<IssuePick<SubRelatedIssueId>>,
    pub issue_description: String,
    pub steps: Vec<String>,
    pub severity: Severity,
    pub done_by: Option<StaffId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeUpdate {
    pub main_issue: IssuePick<MainIssueId>,
    pub related_issue: Option<IssuePick<RelatedIssueId>>,
    pub sub_related_issue: Option<IssuePick<SubRelatedIssueId>>,
    pub issue_description: Option<String>,
    pub solution_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_by_id: Option<StaffId>,
    pub severity: Severity,
}

impl CategorizeForm {
    pub fn validate(&self) -> Result<CategorizeUpdate> {
        let Some(main_issue) = self.main_issue.clone() else {
            bail!("Please select or provide a Main Issue.");
        };
        let (issue_description, solution_steps) =
            description_and_steps(&self.issue_description, &self.steps)?;
        if (issue_description.is_some() || solution_steps.is_some())
            && self.sub_related_issue.is_none()
        {
            bail!(
                "Sub-Related Issue is required when providing Issue Description or Solution Steps."
            );
        }
        Ok(CategorizeUpdate {
            main_issue,
            related_issue: self.related_issue.clone(),
            sub_related_issue: self.sub_related_issue.clone(),
            issue_description,
            solution_steps,
            done_by_id: self.done_by,
            severity: self.severity,
        })
    }
}

type DescriptionAndSteps = (Option<String>, Option<Vec<String>>);

/// Trims both, drops blank steps, and enforces the length limits.
fn description_and_steps(description: &str, steps: &[String]) -> Result<DescriptionAndSteps> {
    let description = description.trim();
    if description.chars().count() > ISSUE_DESCRIPTION_MAX {
        bail!("Issue description cannot exceed {ISSUE_DESCRIPTION_MAX} characters.");
    }
    let steps: Vec<String> = steps
        .iter()
        .map(|step| step.trim())
        .filter(|step| !step.is_empty())
        .map(str::to_owned)
        .collect();
    if steps.iter().any(|step| step.chars().count() > SOLUTION_STEP_MAX) {
        bail!("Solution step cannot exceed {SOLUTION_STEP_MAX} characters.");
    }
    Ok((
        (!description.is_empty()).then(|| description.to_owned()),
        (!steps.is_empty()).then_some(steps),
    ))
}

/// The list behind the subadmin screen. Every action leaves the list
/// untouched when the backend call fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueBoard {
    kind: QueueKind,
    me: Option<StaffId>,
    complaints: Vec<QueueComplaint>,
    selected: usize,
}

impl QueueBoard {
    pub fn new(kind: QueueKind, me: Option<StaffId>) -> Self {
        Self {
            kind,
            me,
            complaints: Vec::new(),
            selected: 0,
        }
    }

    pub const fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn complaints(&self) -> &[QueueComplaint] {
        &self.complaints
    }

    pub const fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_complaint(&self) -> Option<&QueueComplaint> {
        self.complaints.get(self.selected)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let last = self.complaints.len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    pub fn reload(&mut self, backend: &mut dyn QueueBackend) -> Result<()> {
        self.complaints = self.fetch(backend, self.kind)?;
        self.selected = self.selected.min(self.complaints.len().saturating_sub(1));
        Ok(())
    }

    /// Switches lists; the current list stays when the new one fails to load.
    pub fn switch(&mut self, backend: &mut dyn QueueBackend, kind: QueueKind) -> Result<()> {
        let complaints = self.fetch(backend, kind)?;
        self.kind = kind;
        self.complaints = complaints;
        self.selected = 0;
        Ok(())
    }

    fn fetch(&self, backend: &mut dyn QueueBackend, kind: QueueKind) -> Result<Vec<QueueComplaint>> {
        let complaints = backend
            .queue(kind)
            .with_context(|| format!("load {} complaints", kind.label().to_lowercase()))?;
        Ok(complaints
            .into_iter()
            .filter(|complaint| kind.includes(complaint, self.me))
            .collect())
    }

    /// The selected complaint, if `action` applies to it on this list.
    pub fn target(&self, action: QueueAction) -> Result<&QueueComplaint> {
        let Some(complaint) = self.selected_complaint() else {
            bail!("no complaint selected");
        };
        if !self.kind.allows(action) {
            bail!(
                "cannot {} complaints on the {} list",
                action.label(),
                self.kind.label()
            );
        }
        match action {
            QueueAction::Take if !complaint.can_take() => {
                bail!("complaint #{} is already taken or closed", complaint.id);
            }
            QueueAction::Solve | QueueAction::Categorize | QueueAction::Reject
                if complaint.is_closed() =>
            {
                bail!("complaint #{} is already closed", complaint.id);
            }
            _ => Ok(complaint),
        }
    }

    pub fn take(&mut self, backend: &mut dyn QueueBackend) -> Result<Notice> {
        let id = self.target(QueueAction::Take)?.id;
        let assignment = backend
            .take(id)
            .with_context(|| format!("take complaint #{id}"))?;
        let me = self.me;
        if let Some(complaint) = self.find_mut(id) {
            complaint.status = STATUS_OPEN.to_owned();
            complaint.assigned_to_id = assignment.assigned_to_id.or(me);
            complaint.assigned_to = assignment.assigned_to;
        }
        tracing::info!(complaint = %id, "complaint taken");
        Ok(Notice::success(format!("Complaint #{id} taken.")))
    }

    pub fn reject(&mut self, backend: &mut dyn QueueBackend) -> Result<Notice> {
        let id = self.target(QueueAction::Reject)?.id;
        backend
            .reject(id)
            .with_context(|| format!("reject complaint #{id}"))?;
        self.remove(id);
        tracing::info!(complaint = %id, "complaint rejected");
        Ok(Notice::success(format!("Complaint #{id} rejected")))
    }

    pub fn solve(&mut self, backend: &mut dyn QueueBackend, form: &SolutionForm) -> Result<Notice> {
        let id = self.target(QueueAction::Solve)?.id;
        let update = form.validate()?;
        backend
            .solve(id, &update)
            .with_context(|| format!("submit solution for complaint #{id}"))?;
        if let Some(complaint) = self.find_mut(id) {
            complaint.status = STATUS_CLOSED.to_owned();
            complaint.updated_at = Some(OffsetDateTime::now_utc());
            complaint.severity = update.severity;
        }
        tracing::info!(complaint = %id, severity = update.severity.as_str(), "solution submitted");
        Ok(Notice::success(format!(
            "Solution submitted for complaint #{id}. View details in the track section."
        )))
    }

    pub fn categorize(
        &mut self,
        backend: &mut dyn QueueBackend,
        form: &CategorizeForm,
    ) -> Result<Notice> {
        let id = self.target(QueueAction::Categorize)?.id;
        let update = form.validate()?;
        backend
            .categorize(id, &update)
            .with_context(|| format!("update complaint #{id}"))?;
        self.remove(id);
        tracing::info!(complaint = %id, "uncategorized complaint resolved");
        Ok(Notice::success(format!("Complaint #{id} updated and resolved")))
    }

    fn find_mut(&mut self, id: ComplaintId) -> Option<&mut QueueComplaint> {
        self.complaints.iter_mut().find(|complaint| complaint.id == id)
    }

    fn remove(&mut self, id: ComplaintId) {
        self.complaints.retain(|complaint| complaint.id != id);
        self.selected = self.selected.min(self.complaints.len().saturating_sub(1));
    }
}
