// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::model::{FeedbackLabel, Priority, RelatedIssue, SubRelatedIssue};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub staff_no: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<()> {
        if self.staff_no.trim().is_empty() {
            bail!("staff number is required -- enter your staff number and retry");
        }
        if self.password.is_empty() {
            bail!("password is required -- enter your password and retry");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordResetForm {
    pub staff_no: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordResetForm {
    pub fn validate(&self) -> Result<()> {
        if self.staff_no.trim().is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            bail!("all fields are required");
        }
        if self.new_password != self.confirm_password {
            bail!("passwords must match");
        }
        Ok(())
    }
}

/// Manual-mode categorisation picked on the first wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualSelection {
    pub related: Option<RelatedIssue>,
    pub sub: Option<SubRelatedIssue>,
    pub contact_number: String,
}

impl ManualSelection {
    pub fn validate(&self) -> Result<(&RelatedIssue, &SubRelatedIssue)> {
        let (Some(related), Some(sub)) = (&self.related, &self.sub) else {
            bail!("please fill all required fields -- choose a related issue and sub-issue");
        };
        if self.contact_number.trim().is_empty() {
            bail!("please fill all required fields -- enter a contact number");
        }
        if sub.related_issue_id != related.id {
            bail!("invalid issue selection -- the sub-issue belongs to another related issue");
        }
        Ok((related, sub))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityForm {
    pub priority: Priority,
    pub contact_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackForm {
    pub label: Option<FeedbackLabel>,
    pub comment: String,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<FeedbackLabel> {
        match self.label {
            Some(label) => Ok(label),
            None => bail!("please select a rating"),
        }
    }
}
