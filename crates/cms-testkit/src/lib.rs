// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use cms_app::{
    Assignment, CategorizeUpdate, Classification, ComplaintId, ComplaintSubmission,
    IntakeBackend, MainIssue, MainIssueId, Priority, QueueBackend, QueueComplaint, QueueKind,
    RelatedIssue, RelatedIssueId, Role, SessionId, Severity, SolutionSet, SolutionUpdate,
    StaffId, StaffMember, SubRelatedIssue, SubRelatedIssueId, TrackedComplaint,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const REFERENCE_YEAR: i32 = 2026;

/// (related id, related name, main id, main name, sub-issues)
type TaxonomyRow = (i64, &'static str, i64, &'static str, &'static [(i64, &'static str)]);

const TAXONOMY: [TaxonomyRow; 4] = [
    (1, "Others", 1, "Others", &[]),
    (
        5,
        "Network",
        4,
        "Connectivity",
        &[(12, "No internet"), (13, "Slow Wi-Fi")],
    ),
    (
        7,
        "Printer",
        3,
        "Hardware",
        &[(21, "Paper jam"), (22, "Toner low"), (23, "Offline printer")],
    ),
    (9, "Email", 6, "Software", &[(31, "Mailbox full")]),
];

const SOLUTION_STEPS: [(i64, &[&str]); 4] = [
    (12, &["Restart the router", "Reconnect the network cable"]),
    (21, &["Open the paper tray", "Remove the jammed sheet", "Close the tray"]),
    (22, &["Replace the toner cartridge"]),
    (23, &[]),
];

const ASSIGNEES: [(i64, &str, &str); 4] = [
    (41, "Ravi Kumar", "9000000041"),
    (42, "Meera Iyer", "9000000042"),
    (43, "Arjun Das", "9000000043"),
    (44, "Leela Nair", "9000000044"),
];

const STATUSES: [&str; 4] = ["Open", "Open", "Closed", "Rejected"];

/// All related issues known to the fake backend, "Others" included.
pub fn related_issues() -> Vec<RelatedIssue> {
    TAXONOMY
        .iter()
        .map(|(id, name, main_id, main_name, _)| RelatedIssue {
            id: RelatedIssueId::new(*id),
            name: (*name).to_owned(),
            main_issue_id: MainIssueId::new(*main_id),
            main_issue_name: (*main_name).to_owned(),
        })
        .collect()
}

pub fn sub_related_issues(related: RelatedIssueId) -> Vec<SubRelatedIssue> {
    TAXONOMY
        .iter()
        .filter(|row| row.0 == related.get())
        .flat_map(|row| row.4.iter())
        .map(|(id, name)| SubRelatedIssue {
            id: SubRelatedIssueId::new(*id),
            related_issue_id: related,
            name: (*name).to_owned(),
        })
        .collect()
}

pub fn related_issue(id: i64) -> Option<RelatedIssue> {
    related_issues()
        .into_iter()
        .find(|issue| issue.id.get() == id)
}

pub fn sub_related_issue(id: i64) -> Option<SubRelatedIssue> {
    TAXONOMY
        .iter()
        .flat_map(|row| {
            row.4.iter().map(move |(sub_id, name)| SubRelatedIssue {
                id: SubRelatedIssueId::new(*sub_id),
                related_issue_id: RelatedIssueId::new(row.0),
                name: (*name).to_owned(),
            })
        })
        .find(|sub| sub.id.get() == id)
}

/// Classifier answer pointing at one related issue of the fixture taxonomy.
pub fn classification_for(related: i64) -> Option<Classification> {
    let issue = related_issue(related)?;
    Some(Classification {
        main_issue: issue.main_issue_name.clone(),
        main_issue_id: issue.main_issue_id,
        related_issue: issue.name.clone(),
        related_issue_id: issue.id,
        sub_related_issues: sub_related_issues(issue.id),
    })
}

pub fn solutions_for(sub: SubRelatedIssueId) -> Option<SolutionSet> {
    SOLUTION_STEPS
        .iter()
        .find(|(id, _)| *id == sub.get())
        .map(|(_, steps)| SolutionSet {
            issue_description: sub_related_issue(sub.get())
                .map(|sub| format!("{} reported", sub.name)),
            steps: steps.iter().map(|step| (*step).to_owned()).collect(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Classify(String),
    RelatedIssues,
    SubRelatedIssues(RelatedIssueId),
    Solutions(SubRelatedIssueId),
    LogResolution { session: SessionId, resolved: bool },
    Submit(ComplaintSubmission),
}

/// In-memory intake backend over the fixture taxonomy. Records every call
/// and can be told to fail the next one.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    classifications: VecDeque<Classification>,
    calls: Vec<BackendCall>,
    fail_next: Option<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the related issue the next `classify` call resolves to.
    pub fn classify_as(mut self, related: i64) -> Self {
        if let Some(classification) = classification_for(related) {
            self.classifications.push_back(classification);
        }
        self
    }

    pub fn push_classification(&mut self, classification: Classification) {
        self.classifications.push_back(classification);
    }

    pub fn fail_next(&mut self, message: &str) {
        self.fail_next = Some(message.to_owned());
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn submissions(&self) -> Vec<&ComplaintSubmission> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Submit(submission) => Some(submission),
                _ => None,
            })
            .collect()
    }

    pub fn resolution_reports(&self) -> Vec<(SessionId, bool)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::LogResolution { session, resolved } => Some((*session, *resolved)),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, call: BackendCall) -> Result<()> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}

impl IntakeBackend for RecordingBackend {
    fn classify(&mut self, description: &str) -> Result<Classification> {
        self.record(BackendCall::Classify(description.to_owned()))?;
        self.classifications
            .pop_front()
            .ok_or_else(|| anyhow!("no classification queued for {description:?}"))
    }

    fn related_issues(&mut self) -> Result<Vec<RelatedIssue>> {
        self.record(BackendCall::RelatedIssues)?;
        Ok(related_issues())
    }

    fn sub_related_issues(&mut self, related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>> {
        self.record(BackendCall::SubRelatedIssues(related))?;
        Ok(sub_related_issues(related))
    }

    fn solutions(&mut self, sub: SubRelatedIssueId) -> Result<SolutionSet> {
        self.record(BackendCall::Solutions(sub))?;
        Ok(solutions_for(sub).unwrap_or_default())
    }

    fn log_resolution(&mut self, session: SessionId, resolved: bool) -> Result<()> {
        self.record(BackendCall::LogResolution { session, resolved })
    }

    fn submit_complaint(&mut self, submission: &ComplaintSubmission) -> Result<()> {
        self.record(BackendCall::Submit(submission.clone()))
    }
}

/// Staff id the queue fixtures treat as the signed-in subadmin.
pub const QUEUE_STAFF_ID: i64 = 41;

/// (id, status, main issue, assignee, done by)
type QueueRow = (i64, &'static str, Option<(i64, &'static str)>, Option<i64>, Option<i64>);

const QUEUE: [QueueRow; 6] = [
    (101, "Pending", Some((3, "Hardware")), None, None),
    (102, "Pending", Some((1, "Others")), None, None),
    (103, "Open", None, Some(42), None),
    (104, "Closed", Some((3, "Hardware")), Some(41), Some(41)),
    (105, "Open", Some((4, "Connectivity")), Some(41), None),
    (106, "Rejected", Some((1, "Others")), None, None),
];

fn staff_name(id: i64) -> Option<&'static str> {
    ASSIGNEES
        .iter()
        .find(|(staff, _, _)| *staff == id)
        .map(|(_, name, _)| *name)
}

/// Every complaint the fake queue endpoints return, across all lists.
pub fn queue_complaints() -> Vec<QueueComplaint> {
    QUEUE
        .iter()
        .map(|(id, status, main, assignee, done_by)| {
            let related = main.and_then(|(main_id, _)| {
                TAXONOMY
                    .iter()
                    .find(|row| row.2 == main_id && row.2 != 1)
            });
            QueueComplaint {
                id: ComplaintId::new(*id),
                description: format!("complaint {id} from the fixture queue"),
                priority: Priority::Medium,
                severity: Severity::Minor,
                status: (*status).to_owned(),
                created_at: reference_now() + Duration::hours(*id - 100),
                updated_at: done_by.map(|_| reference_now() + Duration::days(1)),
                user_name: "Asha Rao".to_owned(),
                user_staff_no: Some(format!("S{id}")),
                main_issue_id: main.map(|(main_id, _)| MainIssueId::new(main_id)),
                main_issue: main.map(|(_, name)| name.to_owned()),
                related_issue: related.map(|row| row.1.to_owned()),
                sub_related_issue: None,
                sub_related_issue_id: None,
                assigned_to_id: assignee.map(StaffId::new),
                assigned_to: assignee.and_then(staff_name).map(str::to_owned),
                done_by_id: done_by.map(StaffId::new),
                done_by: done_by.and_then(staff_name).map(str::to_owned),
                contacts: Some("9000011111".to_owned()),
            }
        })
        .collect()
}

pub fn queue_complaint(id: i64) -> Option<QueueComplaint> {
    queue_complaints()
        .into_iter()
        .find(|complaint| complaint.id.get() == id)
}

pub fn main_issues() -> Vec<MainIssue> {
    let mut issues: Vec<MainIssue> = Vec::new();
    for row in &TAXONOMY {
        if !issues.iter().any(|issue| issue.id.get() == row.2) {
            issues.push(MainIssue {
                id: MainIssueId::new(row.2),
                name: row.3.to_owned(),
            });
        }
    }
    issues
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCall {
    List(QueueKind),
    Take(ComplaintId),
    Reject(ComplaintId),
    Solve(ComplaintId, SolutionUpdate),
    Categorize(ComplaintId, CategorizeUpdate),
    MainIssues,
    RelatedIssues(MainIssueId),
    SubIssues(RelatedIssueId),
    Staff(Role),
}

/// In-memory queue backend over [`queue_complaints`]. Records every call
/// and can be told to fail the next one.
#[derive(Debug, Default)]
pub struct RecordingQueueBackend {
    calls: Vec<QueueCall>,
    fail_next: Option<String>,
}

impl RecordingQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&mut self, message: &str) {
        self.fail_next = Some(message.to_owned());
    }

    pub fn calls(&self) -> &[QueueCall] {
        &self.calls
    }

    /// Calls that change a complaint, in order.
    pub fn actions(&self) -> Vec<&QueueCall> {
        self.calls
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    QueueCall::Take(_)
                        | QueueCall::Reject(_)
                        | QueueCall::Solve(..)
                        | QueueCall::Categorize(..)
                )
            })
            .collect()
    }

    fn record(&mut self, call: QueueCall) -> Result<()> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}

impl QueueBackend for RecordingQueueBackend {
    fn queue(&mut self, kind: QueueKind) -> Result<Vec<QueueComplaint>> {
        self.record(QueueCall::List(kind))?;
        Ok(queue_complaints())
    }

    fn take(&mut self, complaint: ComplaintId) -> Result<Assignment> {
        self.record(QueueCall::Take(complaint))?;
        Ok(Assignment {
            assigned_to_id: Some(StaffId::new(QUEUE_STAFF_ID)),
            assigned_to: staff_name(QUEUE_STAFF_ID).map(str::to_owned),
        })
    }

    fn reject(&mut self, complaint: ComplaintId) -> Result<()> {
        self.record(QueueCall::Reject(complaint))
    }

    fn solve(&mut self, complaint: ComplaintId, update: &SolutionUpdate) -> Result<()> {
        self.record(QueueCall::Solve(complaint, update.clone()))
    }

    fn categorize(&mut self, complaint: ComplaintId, update: &CategorizeUpdate) -> Result<()> {
        self.record(QueueCall::Categorize(complaint, update.clone()))
    }

    fn main_issues(&mut self) -> Result<Vec<MainIssue>> {
        self.record(QueueCall::MainIssues)?;
        Ok(main_issues())
    }

    fn related_issues_under(&mut self, main: MainIssueId) -> Result<Vec<RelatedIssue>> {
        self.record(QueueCall::RelatedIssues(main))?;
        Ok(related_issues()
            .into_iter()
            .filter(|issue| issue.main_issue_id == main)
            .collect())
    }

    fn sub_issues_under(&mut self, related: RelatedIssueId) -> Result<Vec<SubRelatedIssue>> {
        self.record(QueueCall::SubIssues(related))?;
        Ok(sub_related_issues(related))
    }

    fn staff(&mut self, role: Role) -> Result<Vec<StaffMember>> {
        self.record(QueueCall::Staff(role))?;
        let members = match role {
            Role::SubAdmin => &ASSIGNEES[..2],
            Role::Admin => &ASSIGNEES[2..],
            Role::User => &ASSIGNEES[..0],
        };
        Ok(members
            .iter()
            .map(|(id, name, _)| StaffMember {
                id: StaffId::new(*id),
                name: (*name).to_owned(),
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of tracked-complaint rows.
#[derive(Debug, Clone)]
pub struct ComplaintFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl ComplaintFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn complaint(&mut self) -> TrackedComplaint {
        let status = STATUSES[self.rng.int_n(STATUSES.len())];
        self.complaint_with_status(status)
    }

    pub fn complaint_with_status(&mut self, status: &str) -> TrackedComplaint {
        let related = &TAXONOMY[1 + self.rng.int_n(TAXONOMY.len() - 1)];
        let (sub_id, sub_name) = match related.4 {
            [] => (0, "Others"),
            subs => subs[self.rng.int_n(subs.len())],
        };
        let assignee = (status != "Open" || self.rng.int_n(2) == 1)
            .then(|| ASSIGNEES[self.rng.int_n(ASSIGNEES.len())]);

        let created_at = reference_now() + Duration::hours(self.rng.int_n(24 * 60) as i64);
        let updated_at = (status != "Open")
            .then(|| created_at + Duration::hours(self.rng.int_n(24 * 5) as i64));
        let id = self.next_id;
        self.next_id += 1;

        TrackedComplaint {
            id: ComplaintId::new(id),
            description: format!("{} since this morning", sub_name.to_lowercase()),
            main_issue: related.3.to_owned(),
            related_issue: related.1.to_owned(),
            sub_related_issue: sub_name.to_owned(),
            issue_description: sub_name.to_owned(),
            status: status.to_owned(),
            assigned_to: assignee.map(|(_, name, _)| name.to_owned()),
            assigned_to_id: assignee.map(|(id, _, _)| StaffId::new(id)),
            assigned_to_phone: assignee.map(|(_, _, phone)| phone.to_owned()),
            done_by: (status == "Closed")
                .then(|| assignee.map(|(_, name, _)| name.to_owned()))
                .flatten(),
            direct_solution: None,
            solution_steps: solutions_for(SubRelatedIssueId::new(sub_id))
                .map(|set| set.steps)
                .unwrap_or_default(),
            created_at,
            updated_at,
            has_feedback: false,
        }
    }

    pub fn complaints(&mut self, count: usize) -> Vec<TrackedComplaint> {
        (0..count).map(|_| self.complaint()).collect()
    }
}

pub fn temp_session_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("session.json");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn reference_now() -> OffsetDateTime {
    let date =
        Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1).expect("valid calendar date");
    date.with_time(Time::MIDNIGHT).assume_utc()
}
