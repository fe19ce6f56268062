// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::*;
use crate::model::{Classification, RelatedIssue, SubRelatedIssue};

/// Wire id the backend and the sub-issue picker use for the "Others" leaf.
pub const OTHERS_SUB_ISSUE_ID: i64 = -1;
pub const OTHERS_LABEL: &str = "Others";
pub const NO_DESCRIPTION: &str = "No description available";

/// The reserved uncategorised category. Any draft that lands here skips the
/// classification-dependent steps and goes straight to priority selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OthersCategory {
    pub main_issue_id: MainIssueId,
    pub related_issue_id: RelatedIssueId,
}

impl OthersCategory {
    pub const RESERVED: Self = Self {
        main_issue_id: MainIssueId::new(1),
        related_issue_id: RelatedIssueId::new(1),
    };

    /// Looks up the "Others" entry in the backend's related-issue list,
    /// keeping the reserved ids when the list does not carry one. The
    /// reserved ids stay recognised either way, see [`Self::matches`].
    pub fn resolve(related_issues: &[RelatedIssue]) -> Self {
        related_issues
            .iter()
            .find(|issue| issue.name.trim().eq_ignore_ascii_case(OTHERS_LABEL))
            .map(|issue| Self {
                main_issue_id: issue.main_issue_id,
                related_issue_id: issue.id,
            })
            .unwrap_or(Self::RESERVED)
    }

    /// True for the reserved 1/1 pair and for the pair the backend names
    /// "Others", whichever the classifier returns.
    pub fn matches(self, main: Option<MainIssueId>, related: Option<RelatedIssueId>) -> bool {
        let hit = |category: Self| {
            main == Some(category.main_issue_id) && related == Some(category.related_issue_id)
        };
        hit(Self::RESERVED) || hit(self)
    }
}

impl Default for OthersCategory {
    fn default() -> Self {
        Self::RESERVED
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef<Id> {
    pub name: String,
    pub id: Option<Id>,
}

impl<Id> IssueRef<Id> {
    pub fn unset() -> Self {
        Self {
            name: String::new(),
            id: None,
        }
    }

    pub fn new(name: impl Into<String>, id: Id) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubIssueChoice {
    Concrete {
        id: SubRelatedIssueId,
        label: String,
    },
    Others,
}

impl SubIssueChoice {
    pub fn from_wire(id: i64, label: impl Into<String>) -> Self {
        if id == OTHERS_SUB_ISSUE_ID {
            return Self::Others;
        }
        let label = label.into();
        if label == OTHERS_LABEL {
            return Self::Others;
        }
        Self::Concrete {
            id: SubRelatedIssueId::new(id),
            label,
        }
    }

    pub const fn wire_id(&self) -> i64 {
        match self {
            Self::Concrete { id, .. } => id.get(),
            Self::Others => OTHERS_SUB_ISSUE_ID,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Concrete { label, .. } => label,
            Self::Others => OTHERS_LABEL,
        }
    }

    pub const fn is_others(&self) -> bool {
        matches!(self, Self::Others)
    }
}

/// Client-only state of one intake attempt. Mutated by step completions and
/// thrown away (never persisted) when the attempt ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintDraft {
    pub original_description: String,
    pub main_issue: IssueRef<MainIssueId>,
    pub related_issue: IssueRef<RelatedIssueId>,
    pub selected_sub_issue: Option<SubIssueChoice>,
    pub sub_related_issues: Vec<SubRelatedIssue>,
    pub sub_issue_description: String,
    pub solutions: Vec<String>,
    pub contact_number: String,
    pub session_id: SessionId,
}

impl ComplaintDraft {
    pub fn new() -> Self {
        Self::with_session(SessionId::generate())
    }

    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            original_description: String::new(),
            main_issue: IssueRef::unset(),
            related_issue: IssueRef::unset(),
            selected_sub_issue: None,
            sub_related_issues: Vec::new(),
            sub_issue_description: String::new(),
            solutions: Vec::new(),
            contact_number: String::new(),
            session_id,
        }
    }

    /// True when every field except the session id is in its initial state.
    pub fn is_blank(&self) -> bool {
        *self == Self::with_session(self.session_id)
    }

    pub fn is_others(&self, others: OthersCategory) -> bool {
        others.matches(self.main_issue.id, self.related_issue.id)
    }

    /// Others for submission purposes: either the reserved category or the
    /// Others leaf picked on the sub-issue step.
    pub fn submits_as_others(&self, others: OthersCategory) -> bool {
        self.is_others(others)
            || self
                .selected_sub_issue
                .as_ref()
                .is_some_and(SubIssueChoice::is_others)
    }

    pub fn apply_classification(&mut self, description: &str, classification: Classification) {
        self.original_description = description.to_owned();
        self.main_issue = IssueRef::new(classification.main_issue, classification.main_issue_id);
        self.related_issue = IssueRef::new(
            classification.related_issue,
            classification.related_issue_id,
        );
        self.sub_related_issues = classification.sub_related_issues;
        self.selected_sub_issue = None;
        self.sub_issue_description.clear();
        self.solutions.clear();
        self.contact_number.clear();
    }

    pub fn apply_manual_selection(
        &mut self,
        related: &RelatedIssue,
        sub: &SubRelatedIssue,
        contact_number: &str,
    ) {
        self.original_description.clear();
        self.main_issue = IssueRef::new(related.main_issue_name.clone(), related.main_issue_id);
        self.related_issue = IssueRef::new(related.name.clone(), related.id);
        self.sub_related_issues = vec![SubRelatedIssue {
            id: sub.id,
            related_issue_id: related.id,
            name: sub.name.clone(),
        }];
        self.selected_sub_issue = Some(SubIssueChoice::from_wire(sub.id.get(), sub.name.clone()));
        self.sub_issue_description.clear();
        self.solutions.clear();
        self.contact_number = contact_number.trim().to_owned();
    }

    pub fn find_sub_issue(&self, id: SubRelatedIssueId) -> Option<&SubRelatedIssue> {
        self.sub_related_issues.iter().find(|sub| sub.id == id)
    }
}

impl Default for ComplaintDraft {
    fn default() -> Self {
        Self::new()
    }
}
