// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};

use crate::backend::IntakeBackend;
use crate::chat::{ChatDelays, RemediationChat};
use crate::draft::{
    ComplaintDraft, NO_DESCRIPTION, OTHERS_LABEL, OTHERS_SUB_ISSUE_ID, OthersCategory,
    SubIssueChoice,
};
use crate::forms::{ManualSelection, PriorityForm};
use crate::ids::SubRelatedIssueId;
use crate::model::{ComplaintSubmission, Priority, RelatedIssue, SubRelatedIssue};
use crate::schedule::{Scheduler, TaskToken};

const NO_SUB_ISSUE_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    ProblemDescription,
    IssueConfirmation,
    SubIssueSelection,
    SubIssueDetail,
    RemediationChat,
    PriorityContact,
}

impl WizardStep {
    pub const ALL: [Self; 6] = [
        Self::ProblemDescription,
        Self::IssueConfirmation,
        Self::SubIssueSelection,
        Self::SubIssueDetail,
        Self::RemediationChat,
        Self::PriorityContact,
    ];

    pub const fn number(self) -> u8 {
        match self {
            Self::ProblemDescription => 1,
            Self::IssueConfirmation => 2,
            Self::SubIssueSelection => 3,
            Self::SubIssueDetail => 4,
            Self::RemediationChat => 5,
            Self::PriorityContact => 6,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::ProblemDescription => "Problem Description",
            Self::IssueConfirmation => "Issue Confirmation",
            Self::SubIssueSelection => "Sub-Issue Selection",
            Self::SubIssueDetail => "Sub-Issue Detail",
            Self::RemediationChat => "Issue Resolution",
            Self::PriorityContact => "Priority & Contact",
        }
    }

    /// Step reached by "Back". The chat and priority steps have no back edge.
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::IssueConfirmation => Some(Self::ProblemDescription),
            Self::SubIssueSelection => Some(Self::IssueConfirmation),
            Self::SubIssueDetail => Some(Self::SubIssueSelection),
            Self::ProblemDescription | Self::RemediationChat | Self::PriorityContact => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntakeMode {
    #[default]
    Analyze,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubIssuePick {
    Concrete(SubRelatedIssueId),
    Others,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardExit {
    Submitted,
    Resolved,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    StepChanged(WizardStep),
    Notice(Notice),
    Finished(WizardExit),
}

/// Complaint-intake step controller. Every operation either applies fully
/// or returns an error and leaves the step and draft where they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    step: WizardStep,
    mode: IntakeMode,
    draft: ComplaintDraft,
    others: OthersCategory,
    chat: Option<RemediationChat>,
    delays: ChatDelays,
}

impl Wizard {
    pub fn new(delays: ChatDelays) -> Self {
        Self {
            step: WizardStep::ProblemDescription,
            mode: IntakeMode::Analyze,
            draft: ComplaintDraft::new(),
            others: OthersCategory::RESERVED,
            chat: None,
            delays,
        }
    }

    pub const fn step(&self) -> WizardStep {
        self.step
    }

    pub const fn mode(&self) -> IntakeMode {
        self.mode
    }

    pub const fn draft(&self) -> &ComplaintDraft {
        &self.draft
    }

    pub const fn others(&self) -> OthersCategory {
        self.others
    }

    pub const fn chat(&self) -> Option<&RemediationChat> {
        self.chat.as_ref()
    }

    pub fn set_others_category(&mut self, others: OthersCategory) {
        self.others = others;
    }

    pub fn set_mode(&mut self, mode: IntakeMode) -> Result<()> {
        self.ensure_step(WizardStep::ProblemDescription, "switching intake mode")?;
        self.mode = mode;
        Ok(())
    }

    pub fn analyze(
        &mut self,
        backend: &mut dyn IntakeBackend,
        description: &str,
    ) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::ProblemDescription, "analyzing a description")?;
        let description = description.trim();
        if description.is_empty() {
            bail!("please enter a description of your issue");
        }

        let classification = backend
            .classify(description)
            .context("classify issue description")?;
        self.draft.apply_classification(description, classification);

        let next = if self.draft.is_others(self.others) {
            WizardStep::PriorityContact
        } else {
            WizardStep::IssueConfirmation
        };
        Ok(vec![
            WizardEvent::Notice(Notice::success("Issue analyzed successfully!")),
            self.go(next),
        ])
    }

    /// Related issues for the manual picker, "Others" included. Also
    /// refreshes the Others category from the same list.
    pub fn load_manual_catalog(
        &mut self,
        backend: &mut dyn IntakeBackend,
    ) -> Result<Vec<RelatedIssue>> {
        let related = backend.related_issues().context("load related issues")?;
        self.others = OthersCategory::resolve(&related);
        Ok(related)
    }

    /// Sub-issues for one related issue. The Others category gets a single
    /// Others leaf when the backend lists none, so it stays selectable.
    pub fn load_manual_sub_issues(
        &self,
        backend: &mut dyn IntakeBackend,
        related: &RelatedIssue,
    ) -> Result<Vec<SubRelatedIssue>> {
        let mut subs = backend.sub_related_issues(related.id).with_context(|| {
            format!("load sub-related issues for related issue {}", related.id)
        })?;
        if subs.is_empty() && self.others.matches(Some(related.main_issue_id), Some(related.id)) {
            subs.push(SubRelatedIssue {
                id: SubRelatedIssueId::new(OTHERS_SUB_ISSUE_ID),
                related_issue_id: related.id,
                name: OTHERS_LABEL.to_owned(),
            });
        }
        Ok(subs)
    }

    /// Manual mode skips classification. A concrete sub-issue is submitted
    /// right away; the Others category goes to priority selection.
    pub fn submit_manual(
        &mut self,
        backend: &mut dyn IntakeBackend,
        selection: &ManualSelection,
    ) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::ProblemDescription, "submitting a manual selection")?;
        let (related, sub) = selection.validate()?;

        let mut draft = self.draft.clone();
        draft.apply_manual_selection(related, sub, &selection.contact_number);
        if draft.is_others(self.others) {
            self.draft = draft;
            return Ok(vec![self.go(WizardStep::PriorityContact)]);
        }

        let submission = manual_submission(&draft)?;
        backend
            .submit_complaint(&submission)
            .context("submit complaint")?;
        tracing::info!(session_id = %draft.session_id, "manual complaint submitted");
        Ok(self.finish(
            WizardExit::Submitted,
            Notice::success("Complaint submitted successfully!"),
        ))
    }

    pub fn confirm_issue(&mut self) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::IssueConfirmation, "confirming issues")?;
        if self.draft.main_issue.id.is_none()
            || self.draft.related_issue.id.is_none()
            || self.draft.is_others(self.others)
        {
            bail!("cannot confirm issues -- ensure valid issues are selected");
        }
        Ok(vec![
            WizardEvent::Notice(Notice::success("Issues confirmed successfully.")),
            self.go(WizardStep::SubIssueSelection),
        ])
    }

    /// Sub-issue choices in display order, with the Others leaf last.
    pub fn sub_issue_options(&self) -> Vec<(SubIssuePick, String)> {
        self.draft
            .sub_related_issues
            .iter()
            .map(|sub| (SubIssuePick::Concrete(sub.id), sub.name.clone()))
            .chain(std::iter::once((SubIssuePick::Others, OTHERS_LABEL.to_owned())))
            .collect()
    }

    pub fn select_sub_issue(
        &mut self,
        backend: &mut dyn IntakeBackend,
        pick: SubIssuePick,
    ) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::SubIssueSelection, "selecting a sub-issue")?;
        match pick {
            SubIssuePick::Others => {
                self.draft.selected_sub_issue = Some(SubIssueChoice::Others);
                self.draft.sub_issue_description.clear();
                self.draft.solutions.clear();
                Ok(vec![
                    WizardEvent::Notice(Notice::info("Selected: Others")),
                    self.go(WizardStep::PriorityContact),
                ])
            }
            SubIssuePick::Concrete(id) => {
                let sub = self
                    .draft
                    .find_sub_issue(id)
                    .cloned()
                    .ok_or_else(|| anyhow!("sub-issue {id} is not one of the listed options"))?;
                let solutions = backend
                    .solutions(id)
                    .with_context(|| format!("fetch solution for {}", sub.name))?;

                self.draft.selected_sub_issue = Some(SubIssueChoice::Concrete {
                    id,
                    label: sub.name.clone(),
                });
                self.draft.sub_issue_description = solutions
                    .issue_description
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| NO_SUB_ISSUE_DESCRIPTION.to_owned());
                self.draft.solutions = solutions.steps;
                Ok(vec![
                    WizardEvent::Notice(Notice::info(format!(
                        "Selected sub-issue: {}",
                        sub.name
                    ))),
                    self.go(WizardStep::SubIssueDetail),
                ])
            }
        }
    }

    pub fn raise_complaint(&mut self) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::SubIssueDetail, "raising a complaint")?;
        let label = self.selected_label();
        Ok(vec![
            WizardEvent::Notice(Notice::success(format!(
                "Confirmed issue: {label}. Proceeding to submit complaint."
            ))),
            self.go(WizardStep::PriorityContact),
        ])
    }

    pub fn preview_solution(&mut self, scheduler: &mut dyn Scheduler) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::SubIssueDetail, "previewing a solution")?;
        let label = self.selected_label();
        self.chat = Some(RemediationChat::start(
            &label,
            self.draft.solutions.clone(),
            self.delays,
            scheduler,
        ));
        Ok(vec![
            WizardEvent::Notice(Notice::info(format!("Viewing solution for: {label}."))),
            self.go(WizardStep::RemediationChat),
        ])
    }

    pub fn acknowledge_step(&mut self, scheduler: &mut dyn Scheduler) -> Result<()> {
        self.ensure_step(WizardStep::RemediationChat, "acknowledging a step")?;
        self.chat_mut()?.acknowledge(scheduler)
    }

    /// Routes a fired scheduler token to the chat. Returns false when
    /// nothing was waiting for it.
    pub fn on_timer(&mut self, token: TaskToken) -> bool {
        self.chat
            .as_mut()
            .is_some_and(|chat| chat.on_timer(token))
    }

    pub fn mark_resolved(&mut self, backend: &mut dyn IntakeBackend) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::RemediationChat, "marking the issue resolved")?;
        let session_id = self.draft.session_id;
        let chat = self.chat_mut()?;
        chat.ensure_can_report(true)?;
        backend
            .log_resolution(session_id, true)
            .context("failed to log resolution status")?;
        chat.record_report(true);
        tracing::info!(%session_id, resolved = true, "resolution outcome reported");

        Ok(self.finish(
            WizardExit::Resolved,
            Notice::success("Issue resolved successfully!"),
        ))
    }

    pub fn request_human_support(
        &mut self,
        backend: &mut dyn IntakeBackend,
    ) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::RemediationChat, "requesting human support")?;
        let session_id = self.draft.session_id;
        let chat = self.chat_mut()?;
        chat.ensure_can_report(false)?;
        backend
            .log_resolution(session_id, false)
            .context("failed to log resolution status")?;
        chat.record_report(false);
        tracing::info!(%session_id, resolved = false, "resolution outcome reported");

        Ok(vec![
            WizardEvent::Notice(Notice::info("Proceeding to priority selection.")),
            self.go(WizardStep::PriorityContact),
        ])
    }

    /// Submission payload for the priority step, without sending it.
    pub fn submission(&self, form: &PriorityForm) -> Result<ComplaintSubmission> {
        let (Some(main_issue_id), Some(related_issue_id)) =
            (self.draft.main_issue.id, self.draft.related_issue.id)
        else {
            bail!("missing required fields to submit the complaint");
        };

        let is_others = self.draft.is_others(self.others);
        let sub_related_issue_id = match (&self.draft.selected_sub_issue, is_others) {
            (Some(SubIssueChoice::Concrete { id, .. }), false) => Some(*id),
            _ => None,
        };
        let issue_description = match (&self.draft.selected_sub_issue, is_others) {
            (Some(choice), false) => choice.label().to_owned(),
            _ => OTHERS_LABEL.to_owned(),
        };
        let description = if self.draft.original_description.trim().is_empty() {
            NO_DESCRIPTION.to_owned()
        } else {
            self.draft.original_description.clone()
        };
        let contact_number = if form.contact_number.trim().is_empty() {
            self.draft.contact_number.clone()
        } else {
            form.contact_number.trim().to_owned()
        };

        Ok(ComplaintSubmission {
            description,
            main_issue_id,
            related_issue_id,
            sub_related_issue_id,
            priority: form.priority,
            is_resolved: false,
            session_id: self.draft.session_id,
            issue_description,
            contact_number,
        })
    }

    pub fn submit(
        &mut self,
        backend: &mut dyn IntakeBackend,
        form: &PriorityForm,
    ) -> Result<Vec<WizardEvent>> {
        self.ensure_step(WizardStep::PriorityContact, "submitting a complaint")?;
        let submission = self.submission(form)?;
        backend
            .submit_complaint(&submission)
            .context("submit complaint")?;
        tracing::info!(
            session_id = %submission.session_id,
            priority = submission.priority.as_str(),
            "complaint submitted"
        );

        let message = if self.draft.submits_as_others(self.others) {
            "Complaint submitted as \"Others\" and is pending subadmin review.".to_owned()
        } else {
            format!(
                "Complaint submitted successfully for sub-issue: {}!",
                submission.issue_description
            )
        };
        Ok(self.finish(WizardExit::Submitted, Notice::success(message)))
    }

    pub fn back(&mut self) -> Result<Vec<WizardEvent>> {
        let Some(previous) = self.step.previous() else {
            bail!(
                "cannot go back from step {} ({})",
                self.step.number(),
                self.step.title()
            );
        };
        Ok(vec![self.go(previous)])
    }

    /// Leaves the wizard for the dashboard, discarding the draft.
    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) -> Vec<WizardEvent> {
        if let Some(chat) = self.chat.as_mut() {
            chat.cancel(scheduler);
        }
        self.reset();
        vec![WizardEvent::Finished(WizardExit::Cancelled)]
    }

    fn finish(&mut self, exit: WizardExit, notice: Notice) -> Vec<WizardEvent> {
        self.reset();
        vec![WizardEvent::Notice(notice), WizardEvent::Finished(exit)]
    }

    fn reset(&mut self) {
        self.step = WizardStep::ProblemDescription;
        self.mode = IntakeMode::Analyze;
        self.draft = ComplaintDraft::new();
        self.chat = None;
    }

    fn go(&mut self, next: WizardStep) -> WizardEvent {
        tracing::debug!(
            from = self.step.number(),
            to = next.number(),
            "wizard step changed"
        );
        self.step = next;
        WizardEvent::StepChanged(next)
    }

    fn ensure_step(&self, expected: WizardStep, action: &str) -> Result<()> {
        if self.step != expected {
            bail!(
                "{action} is only possible on step {} ({}); the wizard is on step {}",
                expected.number(),
                expected.title(),
                self.step.number()
            );
        }
        Ok(())
    }

    fn chat_mut(&mut self) -> Result<&mut RemediationChat> {
        self.chat
            .as_mut()
            .ok_or_else(|| anyhow!("the remediation chat has not been started"))
    }

    fn selected_label(&self) -> String {
        self.draft
            .selected_sub_issue
            .as_ref()
            .map(|choice| choice.label().to_owned())
            .unwrap_or_else(|| OTHERS_LABEL.to_owned())
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(ChatDelays::default())
    }
}

fn manual_submission(draft: &ComplaintDraft) -> Result<ComplaintSubmission> {
    let (Some(main_issue_id), Some(related_issue_id)) =
        (draft.main_issue.id, draft.related_issue.id)
    else {
        bail!("missing required fields to submit the complaint");
    };
    let choice = draft
        .selected_sub_issue
        .as_ref()
        .ok_or_else(|| anyhow!("missing sub-issue for manual submission"))?;
    let sub_related_issue_id = match choice {
        SubIssueChoice::Concrete { id, .. } => Some(*id),
        SubIssueChoice::Others => None,
    };

    Ok(ComplaintSubmission {
        description: NO_DESCRIPTION.to_owned(),
        main_issue_id,
        related_issue_id,
        sub_related_issue_id,
        priority: Priority::Medium,
        is_resolved: false,
        session_id: draft.session_id,
        issue_description: choice.label().to_owned(),
        contact_number: draft.contact_number.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::{Wizard, WizardStep};
    use crate::{
        Classification, ComplaintSubmission, IntakeBackend, PriorityForm, RelatedIssue,
        RelatedIssueId, SessionId, SolutionSet, SubRelatedIssue, SubRelatedIssueId,
    };
    use anyhow::{Result, bail};

    struct OfflineBackend;

    impl IntakeBackend for OfflineBackend {
        fn classify(&mut self, _description: &str) -> Result<Classification> {
            bail!("offline")
        }

        fn related_issues(&mut self) -> Result<Vec<RelatedIssue>> {
            bail!("offline")
        }

        fn sub_related_issues(&mut self, _related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>> {
            bail!("offline")
        }

        fn solutions(&mut self, _sub: SubRelatedIssueId) -> Result<SolutionSet> {
            bail!("offline")
        }

        fn log_resolution(&mut self, _session: SessionId, _resolved: bool) -> Result<()> {
            bail!("offline")
        }

        fn submit_complaint(&mut self, _submission: &ComplaintSubmission) -> Result<()> {
            bail!("offline")
        }
    }

    #[test]
    fn step_numbers_follow_declaration_order() {
        for (index, step) in WizardStep::ALL.iter().enumerate() {
            assert_eq!(usize::from(step.number()), index + 1);
        }
    }

    #[test]
    fn only_middle_steps_have_back_edges() {
        assert_eq!(WizardStep::ProblemDescription.previous(), None);
        assert_eq!(
            WizardStep::SubIssueDetail.previous(),
            Some(WizardStep::SubIssueSelection)
        );
        assert_eq!(WizardStep::RemediationChat.previous(), None);
        assert_eq!(WizardStep::PriorityContact.previous(), None);
    }

    #[test]
    fn blank_description_is_rejected_before_any_request() {
        let mut wizard = Wizard::default();
        let error = wizard
            .analyze(&mut OfflineBackend, "   ")
            .expect_err("blank description should fail");
        assert!(error.to_string().contains("please enter a description"));
        assert_eq!(wizard.step(), WizardStep::ProblemDescription);
    }

    #[test]
    fn backend_failure_keeps_current_step() {
        let mut wizard = Wizard::default();
        let before = wizard.draft().clone();
        let error = wizard
            .analyze(&mut OfflineBackend, "printer jammed")
            .expect_err("offline backend should fail");
        assert!(format!("{error:#}").contains("offline"));
        assert_eq!(wizard.step(), WizardStep::ProblemDescription);
        assert_eq!(wizard.draft(), &before);
    }

    #[test]
    fn operations_outside_their_step_are_refused() {
        let mut wizard = Wizard::default();
        assert!(wizard.confirm_issue().is_err());
        assert!(wizard.raise_complaint().is_err());
        assert!(wizard.back().is_err());
        assert!(
            wizard
                .submit(&mut OfflineBackend, &PriorityForm::default())
                .is_err()
        );
    }
}
