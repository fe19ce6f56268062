// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use cms_app::{
    ChatDelays, ChatPhase, ComplaintSubmission, IntakeMode, MainIssueId, ManualScheduler,
    ManualSelection, NO_DESCRIPTION, OthersCategory, Priority, PriorityForm, RelatedIssueId,
    SubIssueChoice, SubIssuePick, SubRelatedIssueId, Wizard, WizardEvent, WizardExit, WizardStep,
};
use cms_testkit::{BackendCall, RecordingBackend, related_issue, sub_related_issue};
use std::time::Duration;

fn wizard() -> Wizard {
    Wizard::new(ChatDelays::default())
}

fn fire(wizard: &mut Wizard, scheduler: &mut ManualScheduler) {
    for token in scheduler.fire_all() {
        wizard.on_timer(token);
    }
}

fn finished(events: &[WizardEvent]) -> Option<WizardExit> {
    events.iter().find_map(|event| match event {
        WizardEvent::Finished(exit) => Some(*exit),
        _ => None,
    })
}

fn only_submission(backend: &RecordingBackend) -> ComplaintSubmission {
    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1, "expected exactly one submission");
    submissions[0].clone()
}

/// Walks a classified draft up to the sub-issue detail of `sub`.
fn reach_detail(wizard: &mut Wizard, backend: &mut RecordingBackend, sub: i64) -> Result<()> {
    wizard.analyze(backend, "printer jammed")?;
    wizard.confirm_issue()?;
    wizard.select_sub_issue(backend, SubIssuePick::Concrete(SubRelatedIssueId::new(sub)))?;
    Ok(())
}

#[test]
fn printer_scenario_routes_others_leaf_to_priority() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut wizard = wizard();

    let events = wizard.analyze(&mut backend, "printer jammed")?;
    assert!(events.contains(&WizardEvent::StepChanged(WizardStep::IssueConfirmation)));
    assert_eq!(wizard.draft().main_issue.id, Some(MainIssueId::new(3)));
    assert_eq!(wizard.draft().related_issue.id, Some(RelatedIssueId::new(7)));

    wizard.confirm_issue()?;
    assert_eq!(wizard.step(), WizardStep::SubIssueSelection);
    let options = wizard.sub_issue_options();
    assert_eq!(options.last().map(|(pick, _)| *pick), Some(SubIssuePick::Others));

    wizard.select_sub_issue(&mut backend, SubIssuePick::Others)?;
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    assert_eq!(
        wizard.draft().selected_sub_issue,
        Some(SubIssueChoice::Others)
    );
    assert!(
        !backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::Solutions(_))),
        "others must not fetch solutions"
    );

    let events = wizard.submit(
        &mut backend,
        &PriorityForm {
            priority: Priority::High,
            contact_number: "9123456780".to_owned(),
        },
    )?;
    assert_eq!(finished(&events), Some(WizardExit::Submitted));

    let submission = only_submission(&backend);
    assert_eq!(submission.description, "printer jammed");
    assert_eq!(submission.sub_related_issue_id, None);
    assert_eq!(submission.issue_description, "Others");
    assert_eq!(submission.priority, Priority::High);
    assert!(!submission.is_resolved);
    Ok(())
}

#[test]
fn reserved_classification_skips_to_priority() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(1);
    let mut wizard = wizard();

    let events = wizard.analyze(&mut backend, "something odd")?;
    assert_eq!(
        events.last(),
        Some(&WizardEvent::StepChanged(WizardStep::PriorityContact))
    );
    assert!(wizard.confirm_issue().is_err());

    wizard.submit(&mut backend, &PriorityForm::default())?;
    let submission = only_submission(&backend);
    assert_eq!(submission.main_issue_id, MainIssueId::new(1));
    assert_eq!(submission.related_issue_id, RelatedIssueId::new(1));
    assert_eq!(submission.sub_related_issue_id, None);
    assert_eq!(submission.priority, Priority::Medium);
    Ok(())
}

#[test]
fn manual_concrete_selection_submits_immediately() -> Result<()> {
    let mut backend = RecordingBackend::new();
    let mut wizard = wizard();
    wizard.set_mode(IntakeMode::Manual)?;

    let catalog = wizard.load_manual_catalog(&mut backend)?;
    assert!(catalog.iter().any(|issue| issue.name == "Others"));
    let network = catalog
        .iter()
        .find(|issue| issue.id == RelatedIssueId::new(5))
        .expect("fixture lists Network");
    let subs = wizard.load_manual_sub_issues(&mut backend, network)?;
    assert_eq!(subs.len(), 2);

    let events = wizard.submit_manual(
        &mut backend,
        &ManualSelection {
            related: related_issue(5),
            sub: sub_related_issue(12),
            contact_number: "9876543210".to_owned(),
        },
    )?;
    assert_eq!(finished(&events), Some(WizardExit::Submitted));
    assert!(
        !events.iter().any(|event| matches!(event, WizardEvent::StepChanged(_))),
        "manual submission must not visit steps 2 to 5"
    );

    let submission = only_submission(&backend);
    assert_eq!(submission.sub_related_issue_id, Some(SubRelatedIssueId::new(12)));
    assert_eq!(submission.priority, Priority::Medium);
    assert_eq!(submission.description, NO_DESCRIPTION);
    assert_eq!(submission.issue_description, "No internet");
    assert_eq!(submission.contact_number, "9876543210");

    let json = serde_json::to_value(&submission)?;
    assert_eq!(json["subRelatedIssueId"], 12);
    assert_eq!(json["priority"], "Medium");
    assert_eq!(json["isResolved"], false);
    Ok(())
}

#[test]
fn manual_validation_failure_sends_nothing() {
    let mut backend = RecordingBackend::new();
    let mut wizard = wizard();

    let result = wizard.submit_manual(
        &mut backend,
        &ManualSelection {
            related: related_issue(5),
            sub: sub_related_issue(12),
            contact_number: String::new(),
        },
    );
    assert!(result.is_err());
    assert!(backend.calls().is_empty());
    assert_eq!(wizard.step(), WizardStep::ProblemDescription);
}

#[test]
fn manual_others_category_goes_to_priority_with_contact() -> Result<()> {
    let mut backend = RecordingBackend::new();
    let mut wizard = wizard();
    wizard.set_mode(IntakeMode::Manual)?;
    let catalog = wizard.load_manual_catalog(&mut backend)?;
    assert_eq!(wizard.others(), OthersCategory::RESERVED);

    let others = catalog
        .into_iter()
        .find(|issue| issue.name == "Others")
        .expect("catalog keeps the Others entry");
    let subs = wizard.load_manual_sub_issues(&mut backend, &others)?;
    assert_eq!(subs.len(), 1, "Others gets a single synthetic leaf");
    assert_eq!(subs[0].id, SubRelatedIssueId::new(-1));

    wizard.submit_manual(
        &mut backend,
        &ManualSelection {
            related: Some(others),
            sub: subs.into_iter().next(),
            contact_number: "9000011111".to_owned(),
        },
    )?;
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    assert!(backend.submissions().is_empty());

    wizard.submit(&mut backend, &PriorityForm::default())?;
    let submission = only_submission(&backend);
    assert_eq!(submission.contact_number, "9000011111");
    assert_eq!(submission.description, NO_DESCRIPTION);
    assert_eq!(submission.main_issue_id, MainIssueId::new(1));
    assert_eq!(submission.related_issue_id, RelatedIssueId::new(1));
    assert_eq!(submission.sub_related_issue_id, None);
    Ok(())
}

#[test]
fn concrete_related_issue_gets_no_synthetic_leaf() -> Result<()> {
    let mut backend = RecordingBackend::new();
    let mut wizard = wizard();
    wizard.load_manual_catalog(&mut backend)?;
    let printer = related_issue(7).expect("fixture lists Printer");
    let subs = wizard.load_manual_sub_issues(&mut backend, &printer)?;
    assert!(subs.iter().all(|sub| sub.id.get() > 0));
    Ok(())
}

#[test]
fn failed_manual_submission_keeps_step_and_draft() -> Result<()> {
    let mut backend = RecordingBackend::new();
    let mut wizard = wizard();
    wizard.set_mode(IntakeMode::Manual)?;
    let before = wizard.draft().clone();

    backend.fail_next("gateway timeout");
    let result = wizard.submit_manual(
        &mut backend,
        &ManualSelection {
            related: related_issue(5),
            sub: sub_related_issue(12),
            contact_number: "9876543210".to_owned(),
        },
    );
    let error = result.expect_err("submission should fail");
    assert!(format!("{error:#}").contains("gateway timeout"));
    assert_eq!(wizard.step(), WizardStep::ProblemDescription);
    assert_eq!(wizard.mode(), IntakeMode::Manual);
    assert_eq!(wizard.draft(), &before);
    assert_eq!(backend.submissions().len(), 1, "the failed attempt was sent once");
    Ok(())
}

#[test]
fn failed_priority_submission_keeps_step_and_draft() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(1);
    let mut wizard = wizard();
    wizard.analyze(&mut backend, "something odd")?;
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    let before = wizard.draft().clone();
    let form = PriorityForm {
        priority: Priority::High,
        contact_number: "9123456780".to_owned(),
    };

    backend.fail_next("service unavailable");
    let error = wizard
        .submit(&mut backend, &form)
        .expect_err("submission should fail");
    assert!(format!("{error:#}").contains("service unavailable"));
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    assert_eq!(wizard.draft(), &before);

    let events = wizard.submit(&mut backend, &form)?;
    assert_eq!(finished(&events), Some(WizardExit::Submitted));
    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0], submissions[1], "retry resends the same complaint");
    Ok(())
}

#[test]
fn reset_after_submission_starts_a_fresh_session() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut wizard = wizard();
    let first_session = wizard.draft().session_id;

    reach_detail(&mut wizard, &mut backend, 21)?;
    wizard.raise_complaint()?;
    wizard.submit(&mut backend, &PriorityForm::default())?;

    assert_eq!(wizard.step(), WizardStep::ProblemDescription);
    assert_eq!(wizard.mode(), IntakeMode::Analyze);
    assert!(wizard.draft().is_blank());
    assert_ne!(wizard.draft().session_id, first_session);
    assert!(wizard.chat().is_none());

    let submission = only_submission(&backend);
    assert_eq!(submission.session_id, first_session);
    assert_eq!(submission.sub_related_issue_id, Some(SubRelatedIssueId::new(21)));
    assert_eq!(submission.issue_description, "Paper jam");
    Ok(())
}

#[test]
fn sub_issue_detail_carries_solution_text() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut wizard = wizard();
    reach_detail(&mut wizard, &mut backend, 21)?;

    assert_eq!(wizard.step(), WizardStep::SubIssueDetail);
    assert_eq!(wizard.draft().sub_issue_description, "Paper jam reported");
    assert_eq!(wizard.draft().solutions.len(), 3);

    wizard.back()?;
    assert_eq!(wizard.step(), WizardStep::SubIssueSelection);
    wizard.back()?;
    wizard.back()?;
    assert_eq!(wizard.step(), WizardStep::ProblemDescription);
    assert!(wizard.back().is_err());
    Ok(())
}

#[test]
fn unknown_sub_issue_is_rejected_without_request() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut wizard = wizard();
    wizard.analyze(&mut backend, "printer jammed")?;
    wizard.confirm_issue()?;
    let calls_before = backend.calls().len();

    let result =
        wizard.select_sub_issue(&mut backend, SubIssuePick::Concrete(SubRelatedIssueId::new(12)));
    assert!(result.is_err());
    assert_eq!(backend.calls().len(), calls_before);
    assert_eq!(wizard.step(), WizardStep::SubIssueSelection);
    Ok(())
}

#[test]
fn failed_solution_fetch_keeps_selection_step() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut wizard = wizard();
    wizard.analyze(&mut backend, "printer jammed")?;
    wizard.confirm_issue()?;

    backend.fail_next("service unavailable");
    let result =
        wizard.select_sub_issue(&mut backend, SubIssuePick::Concrete(SubRelatedIssueId::new(21)));
    assert!(result.is_err());
    assert_eq!(wizard.step(), WizardStep::SubIssueSelection);
    assert!(wizard.draft().selected_sub_issue.is_none());
    Ok(())
}

#[test]
fn chat_walks_every_step_and_reports_resolution_once() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut scheduler = ManualScheduler::new();
    let mut wizard = wizard();
    reach_detail(&mut wizard, &mut backend, 21)?;
    let session = wizard.draft().session_id;

    wizard.preview_solution(&mut scheduler)?;
    assert_eq!(wizard.step(), WizardStep::RemediationChat);
    assert!(wizard.acknowledge_step(&mut scheduler).is_err());
    assert!(wizard.mark_resolved(&mut backend).is_err());

    fire(&mut wizard, &mut scheduler);
    for _ in 0..3 {
        assert!(wizard.mark_resolved(&mut backend).is_err());
        wizard.acknowledge_step(&mut scheduler)?;
        fire(&mut wizard, &mut scheduler);
    }
    assert_eq!(
        wizard.chat().map(|chat| chat.phase()),
        Some(ChatPhase::AwaitingOutcome)
    );
    assert_eq!(
        scheduler.requested_delays(),
        &[
            Duration::from_secs(2),
            Duration::from_millis(1500),
            Duration::from_millis(1500),
            Duration::from_millis(1500),
        ]
    );

    let events = wizard.mark_resolved(&mut backend)?;
    assert_eq!(finished(&events), Some(WizardExit::Resolved));
    assert_eq!(backend.resolution_reports(), vec![(session, true)]);
    assert!(backend.submissions().is_empty());
    assert!(wizard.mark_resolved(&mut backend).is_err());
    assert_eq!(backend.resolution_reports().len(), 1);
    Ok(())
}

#[test]
fn human_support_logs_unresolved_then_submits() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut scheduler = ManualScheduler::new();
    let mut wizard = wizard();
    reach_detail(&mut wizard, &mut backend, 21)?;
    wizard.preview_solution(&mut scheduler)?;
    fire(&mut wizard, &mut scheduler);

    wizard.request_human_support(&mut backend)?;
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    assert!(wizard.back().is_err());

    wizard.submit(&mut backend, &PriorityForm::default())?;
    let reports = backend.resolution_reports();
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].1);
    assert_eq!(only_submission(&backend).priority, Priority::Medium);
    Ok(())
}

#[test]
fn failed_resolution_log_allows_retry() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut scheduler = ManualScheduler::new();
    let mut wizard = wizard();
    reach_detail(&mut wizard, &mut backend, 23)?;
    wizard.preview_solution(&mut scheduler)?;
    assert_eq!(
        wizard.chat().map(|chat| chat.phase()),
        Some(ChatPhase::NoSolutions)
    );

    backend.fail_next("timeout");
    assert!(wizard.request_human_support(&mut backend).is_err());
    assert_eq!(wizard.step(), WizardStep::RemediationChat);

    wizard.request_human_support(&mut backend)?;
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    Ok(())
}

#[test]
fn cancel_discards_pending_chat_reply() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(7);
    let mut scheduler = ManualScheduler::new();
    let mut wizard = wizard();
    reach_detail(&mut wizard, &mut backend, 21)?;
    wizard.preview_solution(&mut scheduler)?;
    assert_eq!(scheduler.pending(), 1);

    let events = wizard.cancel(&mut scheduler);
    assert_eq!(events, vec![WizardEvent::Finished(WizardExit::Cancelled)]);
    assert_eq!(scheduler.pending(), 0);
    assert!(wizard.draft().is_blank());
    Ok(())
}

#[test]
fn others_category_follows_backend_catalog() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(9);
    let mut wizard = wizard();
    wizard.set_others_category(OthersCategory {
        main_issue_id: MainIssueId::new(6),
        related_issue_id: RelatedIssueId::new(9),
    });

    wizard.analyze(&mut backend, "mailbox full")?;
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    Ok(())
}

#[test]
fn reserved_pair_still_skips_after_catalog_names_others_elsewhere() -> Result<()> {
    let mut backend = RecordingBackend::new().classify_as(1);
    let mut wizard = wizard();
    wizard.set_others_category(OthersCategory {
        main_issue_id: MainIssueId::new(6),
        related_issue_id: RelatedIssueId::new(9),
    });

    wizard.analyze(&mut backend, "something odd")?;
    assert_eq!(wizard.step(), WizardStep::PriorityContact);
    assert!(wizard.confirm_issue().is_err());
    Ok(())
}
