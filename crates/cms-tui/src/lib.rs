// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use cms_app::{
    AppCommand, AppEvent, AppState, CategorizeForm, ChatDelays, ChatPhase, ChatSpeaker,
    ComplaintFilter, ComplaintId, DashboardSummary, FeedbackForm, FeedbackLabel,
    FeedbackSubmission, IntakeBackend, IntakeMode, IssuePick, LoginForm, MainIssueId, Notice,
    NoticeLevel, PasswordResetForm, PriorityForm, Profile, ProfileForm, ProfileUpdate,
    QueueAction, QueueBackend, QueueBoard, QueueComplaint, QueueKind, RelatedIssue, RelatedIssueId,
    RemediationChat, Role, Scheduler, Screen, Session, Severity, SolutionForm, SolutionMode,
    StaffId, StaffMember, SubRelatedIssue, SubRelatedIssueId, TaskToken, TrackedComplaint, UserId,
    Wizard, WizardEvent, WizardExit, WizardStep, export_csv, mark_feedback_given,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const PASSWORD_MASK: char = '*';
const CURSOR_MARK: &str = "›";

/// Everything the terminal front-end needs from the outside world.
pub trait AppRuntime {
    /// Signs in and persists the session so later requests carry its token.
    fn sign_in(&mut self, form: &LoginForm) -> Result<Session>;
    fn reset_password(&mut self, form: &PasswordResetForm) -> Result<String>;
    fn sign_out(&mut self) -> Result<()>;
    fn user_id(&self) -> Option<UserId>;
    fn chat_delays(&self) -> ChatDelays;
    fn intake(&mut self) -> &mut dyn IntakeBackend;
    fn track_complaints(&mut self) -> Result<Vec<TrackedComplaint>>;
    fn submit_feedback(&mut self, feedback: &FeedbackSubmission) -> Result<()>;
    /// Writes an exported complaint list and returns where it landed.
    fn export_complaints(&mut self, csv: &str) -> Result<PathBuf>;
    /// Starts refreshing the role's dashboard summary; results arrive as
    /// `InternalEvent::SummaryLoaded` or `InternalEvent::SummaryFailed`.
    fn start_summary_poll(&mut self, role: Role, tx: Sender<InternalEvent>) -> Result<()>;
    fn stop_summary_poll(&mut self);
    /// Whether `error` means the backend refused the session token.
    fn is_unauthorized(&self, error: &anyhow::Error) -> bool;
    fn queue(&mut self) -> &mut dyn QueueBackend;
    fn load_profile(&mut self) -> Result<Profile>;
    /// Saves the signed-in account's profile and returns the backend's message.
    fn save_profile(&mut self, update: &ProfileUpdate) -> Result<String>;
    fn reset_staff_password(&mut self, role: Role, form: &PasswordResetForm) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Timer { token: TaskToken },
    SummaryLoaded(DashboardSummary),
    SummaryFailed { message: String, unauthorized: bool },
}

/// Delivers chat timers through the UI event channel. Each scheduled delay
/// sleeps on its own thread; cancelled tokens are dropped on arrival.
#[derive(Debug)]
pub struct ThreadScheduler {
    tx: Sender<InternalEvent>,
    next_token: u64,
    cancelled: BTreeSet<TaskToken>,
}

impl ThreadScheduler {
    pub fn new(tx: Sender<InternalEvent>) -> Self {
        Self {
            tx,
            next_token: 0,
            cancelled: BTreeSet::new(),
        }
    }

    fn take_cancelled(&mut self, token: TaskToken) -> bool {
        self.cancelled.remove(&token)
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&mut self, delay: Duration) -> TaskToken {
        self.next_token = self.next_token.saturating_add(1);
        let token = TaskToken::new(self.next_token);
        let sender = self.tx.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            let _ = sender.send(InternalEvent::Timer { token });
        });
        token
    }

    fn cancel(&mut self, token: TaskToken) {
        self.cancelled.insert(token);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LoginUiState {
    form: LoginForm,
    field: usize,
}

impl LoginUiState {
    fn active_field(&mut self) -> &mut String {
        match self.field {
            0 => &mut self.form.staff_no,
            _ => &mut self.form.password,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ResetUiState {
    form: PasswordResetForm,
    field: usize,
}

impl ResetUiState {
    const FIELDS: usize = 3;

    fn active_field(&mut self) -> &mut String {
        match self.field {
            0 => &mut self.form.staff_no,
            1 => &mut self.form.new_password,
            _ => &mut self.form.confirm_password,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ManualField {
    #[default]
    Related,
    Sub,
    Contact,
}

impl ManualField {
    const fn next(self) -> Self {
        match self {
            Self::Related => Self::Sub,
            Self::Sub => Self::Contact,
            Self::Contact => Self::Related,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::Related => Self::Contact,
            Self::Sub => Self::Related,
            Self::Contact => Self::Sub,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ManualUiState {
    catalog: Vec<RelatedIssue>,
    related_cursor: Option<usize>,
    subs: Vec<SubRelatedIssue>,
    sub_cursor: Option<usize>,
    contact_number: String,
    field: ManualField,
}

impl ManualUiState {
    fn selected_related(&self) -> Option<&RelatedIssue> {
        self.related_cursor.and_then(|index| self.catalog.get(index))
    }

    fn selected_sub(&self) -> Option<&SubRelatedIssue> {
        self.sub_cursor.and_then(|index| self.subs.get(index))
    }

    fn selection(&self) -> cms_app::ManualSelection {
        cms_app::ManualSelection {
            related: self.selected_related().cloned(),
            sub: self.selected_sub().cloned(),
            contact_number: self.contact_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IntakeUiState {
    wizard: Wizard,
    description: String,
    manual: ManualUiState,
    sub_cursor: usize,
    priority: PriorityForm,
}

impl IntakeUiState {
    fn new(delays: ChatDelays) -> Self {
        Self {
            wizard: Wizard::new(delays),
            description: String::new(),
            manual: ManualUiState::default(),
            sub_cursor: 0,
            priority: PriorityForm::default(),
        }
    }

    /// Drops typed input but keeps the wizard and its resolved categories.
    fn clear_inputs(&mut self) {
        self.description.clear();
        self.manual = ManualUiState::default();
        self.sub_cursor = 0;
        self.priority = PriorityForm::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FeedbackUiState {
    complaint: ComplaintId,
    form: FeedbackForm,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TrackingUiState {
    complaints: Vec<TrackedComplaint>,
    filter: ComplaintFilter,
    selected: usize,
    feedback: Option<FeedbackUiState>,
}

impl TrackingUiState {
    fn visible(&self, now: OffsetDateTime) -> Vec<&TrackedComplaint> {
        self.filter.apply(&self.complaints, now)
    }

    fn selected_complaint(&self, now: OffsetDateTime) -> Option<&TrackedComplaint> {
        self.visible(now).get(self.selected).copied()
    }

    fn clamp_selection(&mut self, now: OffsetDateTime) {
        let len = self.visible(now).len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// `(id, name)` choices behind an "add new" slot; while that slot is
/// selected the typed name is used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IssuePicker<Id> {
    options: Vec<(Id, String)>,
    cursor: Option<usize>,
    typed: String,
}

impl<Id> Default for IssuePicker<Id> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            cursor: None,
            typed: String::new(),
        }
    }
}

impl<Id: Copy> IssuePicker<Id> {
    fn with_options(options: Vec<(Id, String)>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    fn selected(&self) -> Option<Id> {
        self.cursor
            .and_then(|index| self.options.get(index))
            .map(|(id, _)| *id)
    }

    fn pick(&self) -> Option<IssuePick<Id>> {
        IssuePick::choose(self.selected(), &self.typed)
    }

    /// Returns whether the choice moved.
    fn step(&mut self, delta: isize) -> bool {
        let last = self.options.len() as isize - 1;
        let current = self.cursor.map_or(-1, |index| index as isize);
        let cursor = usize::try_from((current + delta).clamp(-1, last)).ok();
        let moved = cursor != self.cursor;
        self.cursor = cursor;
        moved
    }

    fn label(&self) -> String {
        match self.cursor.and_then(|index| self.options.get(index)) {
            Some((_, name)) => format!("< {name} >"),
            None if self.typed.is_empty() => "< add new: type a name >".to_owned(),
            None => format!("< new: {} >", self.typed),
        }
    }
}

const DONE_BY_ROLES: [Option<Role>; 3] = [None, Some(Role::SubAdmin), Some(Role::Admin)];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DoneByPicker {
    role: Option<Role>,
    staff: Vec<StaffMember>,
    cursor: Option<usize>,
}

impl DoneByPicker {
    fn selected(&self) -> Option<StaffId> {
        self.cursor
            .and_then(|index| self.staff.get(index))
            .map(|member| member.id)
    }

    fn next_role(&self, delta: isize) -> Option<Role> {
        let len = DONE_BY_ROLES.len() as isize;
        let index = DONE_BY_ROLES
            .iter()
            .position(|role| *role == self.role)
            .unwrap_or(0) as isize;
        DONE_BY_ROLES[(index + delta).rem_euclid(len) as usize]
    }

    /// Switches the staff list to the next role; nothing changes when the
    /// list fails to load.
    fn cycle_role(&mut self, queue: &mut dyn QueueBackend, delta: isize) -> Result<()> {
        let role = self.next_role(delta);
        let staff = match role {
            Some(role) => queue
                .staff(role)
                .with_context(|| format!("Failed to fetch {}s", role.as_str()))?,
            None => Vec::new(),
        };
        let cursor = (!staff.is_empty()).then_some(0);
        *self = Self {
            role,
            staff,
            cursor,
        };
        Ok(())
    }

    fn label(&self) -> String {
        let Some(role) = self.role else {
            return "< me >".to_owned();
        };
        let name = self
            .cursor
            .and_then(|index| self.staff.get(index))
            .map_or("nobody listed", |member| member.name.as_str());
        format!("< {} > {name}", role.label())
    }
}

fn edit_steps(steps: &mut Vec<String>, key: KeyEvent) {
    if is_ctrl(key, 'n') {
        steps.push(String::new());
        return;
    }
    if steps.is_empty() {
        steps.push(String::new());
    }
    let len = steps.len();
    if let Some(last) = steps.last_mut() {
        if key.code == KeyCode::Backspace && last.is_empty() && len > 1 {
            steps.pop();
            return;
        }
        edit_text(last, key);
    }
}

fn steps_lines(steps: &[String]) -> Vec<String> {
    if steps.is_empty() {
        return vec!["    (none)".to_owned()];
    }
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| format!("    {}. {step}", index + 1))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SolveField {
    Mode,
    Direct,
    Related,
    SubName,
    Description,
    Steps,
    Severity,
    DoneBy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SolveUiState {
    complaint: Option<ComplaintId>,
    main_issue: Option<MainIssueId>,
    form: SolutionForm,
    related: Vec<RelatedIssue>,
    related_cursor: Option<usize>,
    done_by: DoneByPicker,
    field: usize,
}

impl SolveUiState {
    fn for_complaint(complaint: &QueueComplaint) -> Self {
        Self {
            complaint: Some(complaint.id),
            main_issue: complaint.main_issue_id,
            ..Self::default()
        }
    }

    fn fields(&self) -> &'static [SolveField] {
        match self.form.mode {
            SolutionMode::Direct => &[
                SolveField::Mode,
                SolveField::Direct,
                SolveField::Severity,
                SolveField::DoneBy,
            ],
            SolutionMode::Structured => &[
                SolveField::Mode,
                SolveField::Related,
                SolveField::SubName,
                SolveField::Description,
                SolveField::Steps,
                SolveField::Severity,
                SolveField::DoneBy,
            ],
        }
    }

    fn active(&self) -> SolveField {
        let fields = self.fields();
        fields[self.field.min(fields.len() - 1)]
    }

    fn selected_related(&self) -> Option<&RelatedIssue> {
        self.related_cursor.and_then(|index| self.related.get(index))
    }

    fn form(&self) -> SolutionForm {
        SolutionForm {
            related_issue: self.selected_related().map(|issue| issue.id),
            done_by: self.done_by.selected(),
            ..self.form.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum CategorizeField {
    #[default]
    Main,
    Related,
    Sub,
    Description,
    Steps,
    Severity,
    DoneBy,
}

impl CategorizeField {
    const ALL: [Self; 7] = [
        Self::Main,
        Self::Related,
        Self::Sub,
        Self::Description,
        Self::Steps,
        Self::Severity,
        Self::DoneBy,
    ];

    fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0) as isize;
        Self::ALL[(index + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CategorizeUiState {
    complaint: Option<ComplaintId>,
    main: IssuePicker<MainIssueId>,
    related: IssuePicker<RelatedIssueId>,
    sub: IssuePicker<SubRelatedIssueId>,
    description: String,
    steps: Vec<String>,
    severity: Severity,
    done_by: DoneByPicker,
    field: CategorizeField,
}

impl CategorizeUiState {
    fn form(&self) -> CategorizeForm {
        CategorizeForm {
            main_issue: self.main.pick(),
            related_issue: self.related.pick(),
            sub_related_issue: self.sub.pick(),
            issue_description: self.description.clone(),
            steps: self.steps.clone(),
            severity: self.severity,
            done_by: self.done_by.selected(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueueDialog {
    Solve(SolveUiState),
    Categorize(CategorizeUiState),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct QueueUiState {
    board: QueueBoard,
    confirm: Option<QueueAction>,
    dialog: Option<QueueDialog>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ProfileUiState {
    staff_no: String,
    department: String,
    photo_url: Option<String>,
    form: ProfileForm,
    field: usize,
}

impl ProfileUiState {
    const FIELDS: usize = 4;

    fn from_profile(profile: &Profile) -> Self {
        Self {
            staff_no: profile.staff_no.clone(),
            department: profile.department.clone(),
            photo_url: profile.photo_url.clone(),
            form: ProfileForm::from_profile(profile),
            field: 0,
        }
    }

    fn active_field(&mut self) -> &mut String {
        match self.field {
            0 => &mut self.form.name,
            1 => &mut self.form.designation,
            2 => &mut self.form.contacts,
            _ => &mut self.form.photo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StaffResetUiState {
    role: Role,
    form: PasswordResetForm,
    field: usize,
}

impl Default for StaffResetUiState {
    fn default() -> Self {
        Self {
            role: Role::SubAdmin,
            form: PasswordResetForm::default(),
            field: 1,
        }
    }
}

impl StaffResetUiState {
    const FIELDS: usize = 4;

    fn active_field(&mut self) -> Option<&mut String> {
        match self.field {
            1 => Some(&mut self.form.staff_no),
            2 => Some(&mut self.form.new_password),
            3 => Some(&mut self.form.confirm_password),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct ViewData {
    status_token: u64,
    status_level: NoticeLevel,
    scheduler: ThreadScheduler,
    polling: Option<Role>,
    login: LoginUiState,
    reset: ResetUiState,
    intake: IntakeUiState,
    tracking: TrackingUiState,
    queue: QueueUiState,
    profile: ProfileUiState,
    staff_reset: StaffResetUiState,
}

impl ViewData {
    fn new(delays: ChatDelays, internal_tx: Sender<InternalEvent>) -> Self {
        Self {
            status_token: 0,
            status_level: NoticeLevel::Info,
            scheduler: ThreadScheduler::new(internal_tx),
            polling: None,
            login: LoginUiState::default(),
            reset: ResetUiState::default(),
            intake: IntakeUiState::new(delays),
            tracking: TrackingUiState::default(),
            queue: QueueUiState::default(),
            profile: ProfileUiState::default(),
            staff_reset: StaffResetUiState::default(),
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let (internal_tx, internal_rx) = mpsc::channel();
    let mut view_data = ViewData::new(runtime.chat_delays(), internal_tx.clone());
    sync_polling(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    if view_data.polling.take().is_some() {
        runtime.stop_summary_poll();
    }
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        handle_internal_event(state, runtime, view_data, tx, event);
    }
}

fn handle_internal_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: InternalEvent,
) {
    match event {
        InternalEvent::ClearStatus { token } if token == view_data.status_token => {
            state.dispatch(AppCommand::ClearStatus);
        }
        InternalEvent::ClearStatus { .. } => {}
        InternalEvent::Timer { token } => {
            if !view_data.scheduler.take_cancelled(token) {
                view_data.intake.wizard.on_timer(token);
            }
        }
        InternalEvent::SummaryLoaded(summary) => {
            state.dispatch(AppCommand::SummaryLoaded(summary));
        }
        InternalEvent::SummaryFailed { unauthorized, .. }
            if unauthorized && state.screen == Screen::Dashboard =>
        {
            expire_session(state, runtime, view_data, tx);
        }
        InternalEvent::SummaryFailed { message, .. } => {
            if state.screen == Screen::Dashboard {
                emit_notice(
                    state,
                    view_data,
                    tx,
                    Notice::error(format!("dashboard refresh failed: {message}")),
                );
            }
        }
    }
}

/// Drops the refused session and everything loaded under it, then returns
/// to the login screen.
fn expire_session<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    if let Err(error) = runtime.sign_out() {
        tracing::warn!(error = %error, "clearing expired session failed");
    }
    view_data.intake.wizard.cancel(&mut view_data.scheduler);
    view_data.intake.clear_inputs();
    view_data.tracking = TrackingUiState::default();
    view_data.queue = QueueUiState::default();
    view_data.profile = ProfileUiState::default();
    view_data.staff_reset = StaffResetUiState::default();
    dispatch_with_status(state, view_data, tx, AppCommand::SessionExpired);
    sync_polling(state, runtime, view_data, tx);
}

/// Shows a failed request; a refused token expires the session instead.
fn report_failure<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    context: Option<&str>,
    error: &anyhow::Error,
) {
    if runtime.is_unauthorized(error) {
        tracing::info!(error = %format!("{error:#}"), "request refused, session expired");
        expire_session(state, runtime, view_data, tx);
        return;
    }
    let message = match context {
        Some(context) => format!("{context}: {error:#}"),
        None => format!("{error:#}"),
    };
    emit_notice(state, view_data, tx, Notice::error(message));
}

/// Runs the summary poll exactly while a dashboard is on screen.
fn sync_polling<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let wanted = if state.screen == Screen::Dashboard {
        state.role
    } else {
        None
    };
    if wanted == view_data.polling {
        return;
    }
    if view_data.polling.take().is_some() {
        runtime.stop_summary_poll();
    }
    if let Some(role) = wanted {
        view_data.polling = Some(role);
        if let Err(error) = runtime.start_summary_poll(role, tx.clone()) {
            emit_notice(
                state,
                view_data,
                tx,
                Notice::error(format!("dashboard refresh failed: {error:#}")),
            );
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn emit_notice(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    notice: Notice,
) {
    view_data.status_level = notice.level;
    emit_status(state, view_data, internal_tx, notice.message);
}

fn dispatch_with_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) -> Vec<AppEvent> {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_level = NoticeLevel::Info;
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
    events
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match state.screen {
        Screen::Login => handle_login_key(state, runtime, view_data, internal_tx, key),
        Screen::ResetPassword => handle_reset_key(state, runtime, view_data, internal_tx, key),
        Screen::Dashboard => {
            if key.code == KeyCode::Char('q') {
                return true;
            }
            handle_dashboard_key(state, runtime, view_data, internal_tx, key);
        }
        Screen::CreateComplaint => handle_intake_key(state, runtime, view_data, internal_tx, key),
        Screen::TrackComplaints => {
            handle_tracking_key(state, runtime, view_data, internal_tx, key);
        }
        Screen::WorkQueue => handle_queue_key(state, runtime, view_data, internal_tx, key),
        Screen::Profile => handle_profile_key(state, runtime, view_data, internal_tx, key),
        Screen::StaffPassword => {
            handle_staff_reset_key(state, runtime, view_data, internal_tx, key);
        }
    }

    sync_polling(state, runtime, view_data, internal_tx);
    false
}

/// Applies plain typing and backspace to a text field.
fn edit_text(buffer: &mut String, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            buffer.pop();
            true
        }
        KeyCode::Char(ch) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            buffer.push(ch);
            true
        }
        _ => false,
    }
}

fn is_ctrl(key: KeyEvent, ch: char) -> bool {
    key.code == KeyCode::Char(ch) && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn step_cursor(cursor: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match cursor {
        None => 0,
        Some(index) => index.saturating_add_signed(delta).min(len - 1),
    };
    Some(next)
}

fn handle_login_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if is_ctrl(key, 'r') {
        dispatch_with_status(state, view_data, internal_tx, AppCommand::OpenResetPassword);
        return;
    }
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            view_data.login.field = 1 - view_data.login.field.min(1);
        }
        KeyCode::Enter => submit_login(state, runtime, view_data, internal_tx),
        _ => {
            edit_text(view_data.login.active_field(), key);
        }
    }
}

fn submit_login<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.sign_in(&view_data.login.form) {
        Ok(session) => {
            view_data.login = LoginUiState::default();
            view_data.intake.clear_inputs();
            view_data.tracking = TrackingUiState::default();
            dispatch_with_status(
                state,
                view_data,
                internal_tx,
                AppCommand::SignedIn(session.role),
            );
        }
        Err(error) => emit_notice(state, view_data, internal_tx, Notice::error(format!("{error:#}"))),
    }
}

fn handle_reset_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.reset = ResetUiState::default();
            dispatch_with_status(state, view_data, internal_tx, AppCommand::BackToLogin);
        }
        KeyCode::Tab | KeyCode::Down => {
            view_data.reset.field = (view_data.reset.field + 1) % ResetUiState::FIELDS;
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_data.reset.field =
                (view_data.reset.field + ResetUiState::FIELDS - 1) % ResetUiState::FIELDS;
        }
        KeyCode::Enter => match runtime.reset_password(&view_data.reset.form) {
            Ok(message) => {
                view_data.reset = ResetUiState::default();
                state.dispatch(AppCommand::BackToLogin);
                emit_notice(state, view_data, internal_tx, Notice::success(message));
            }
            Err(error) => {
                emit_notice(state, view_data, internal_tx, Notice::error(format!("{error:#}")));
            }
        },
        _ => {
            edit_text(view_data.reset.active_field(), key);
        }
    }
}

fn handle_dashboard_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('c') => {
            let events =
                dispatch_with_status(state, view_data, internal_tx, AppCommand::OpenCreateComplaint);
            if events.contains(&AppEvent::ScreenChanged(Screen::CreateComplaint)) {
                view_data.intake.clear_inputs();
            }
        }
        KeyCode::Char('t') => {
            let events =
                dispatch_with_status(state, view_data, internal_tx, AppCommand::OpenTrackComplaints);
            if events.contains(&AppEvent::ScreenChanged(Screen::TrackComplaints)) {
                view_data.tracking = TrackingUiState::default();
                reload_tracking(state, runtime, view_data, internal_tx);
            }
        }
        KeyCode::Char('w') => {
            let events =
                dispatch_with_status(state, view_data, internal_tx, AppCommand::OpenWorkQueue);
            if events.contains(&AppEvent::ScreenChanged(Screen::WorkQueue)) {
                let me = runtime.user_id().map(|id| StaffId::new(id.get()));
                view_data.queue = QueueUiState {
                    board: QueueBoard::new(QueueKind::General, me),
                    ..QueueUiState::default()
                };
                reload_queue(state, runtime, view_data, internal_tx);
            }
        }
        KeyCode::Char('p') => {
            let events =
                dispatch_with_status(state, view_data, internal_tx, AppCommand::OpenProfile);
            if events.contains(&AppEvent::ScreenChanged(Screen::Profile)) {
                view_data.profile = ProfileUiState::default();
                match runtime.load_profile() {
                    Ok(profile) => view_data.profile = ProfileUiState::from_profile(&profile),
                    Err(error) => report_failure(
                        state,
                        runtime,
                        view_data,
                        internal_tx,
                        Some("failed to load profile"),
                        &error,
                    ),
                }
            }
        }
        KeyCode::Char('R') => {
            let events =
                dispatch_with_status(state, view_data, internal_tx, AppCommand::OpenStaffPassword);
            if events.contains(&AppEvent::ScreenChanged(Screen::StaffPassword)) {
                view_data.staff_reset = StaffResetUiState::default();
            }
        }
        KeyCode::Char('L') => match runtime.sign_out() {
            Ok(()) => {
                dispatch_with_status(state, view_data, internal_tx, AppCommand::SignOut);
            }
            Err(error) => emit_notice(
                state,
                view_data,
                internal_tx,
                Notice::error(format!("sign out failed: {error:#}")),
            ),
        },
        _ => {}
    }
}

fn handle_intake_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if key.code == KeyCode::Esc {
        let events = view_data.intake.wizard.cancel(&mut view_data.scheduler);
        apply_wizard_events(state, view_data, internal_tx, events);
        return;
    }

    let intake = &mut view_data.intake;
    let result = match intake.wizard.step() {
        WizardStep::ProblemDescription => match intake.wizard.mode() {
            IntakeMode::Analyze => handle_analyze_key(runtime, intake, key),
            IntakeMode::Manual => handle_manual_key(runtime, intake, key),
        },
        WizardStep::IssueConfirmation => match key.code {
            KeyCode::Enter => intake.wizard.confirm_issue(),
            KeyCode::Char('b') => intake.wizard.back(),
            _ => Ok(Vec::new()),
        },
        WizardStep::SubIssueSelection => handle_sub_issue_key(runtime, intake, key),
        WizardStep::SubIssueDetail => match key.code {
            KeyCode::Char('p') => intake.wizard.preview_solution(&mut view_data.scheduler),
            KeyCode::Char('r') | KeyCode::Enter => intake.wizard.raise_complaint(),
            KeyCode::Char('b') => intake.wizard.back(),
            _ => Ok(Vec::new()),
        },
        WizardStep::RemediationChat => match key.code {
            KeyCode::Enter => intake
                .wizard
                .acknowledge_step(&mut view_data.scheduler)
                .map(|()| Vec::new()),
            KeyCode::Char('y') => intake.wizard.mark_resolved(runtime.intake()),
            KeyCode::Char('h') => intake.wizard.request_human_support(runtime.intake()),
            _ => Ok(Vec::new()),
        },
        WizardStep::PriorityContact => match key.code {
            KeyCode::Left | KeyCode::Up => {
                intake.priority.priority = intake.priority.priority.cycle(-1);
                Ok(Vec::new())
            }
            KeyCode::Right | KeyCode::Down => {
                intake.priority.priority = intake.priority.priority.cycle(1);
                Ok(Vec::new())
            }
            KeyCode::Enter => intake.wizard.submit(runtime.intake(), &intake.priority),
            _ => {
                edit_text(&mut intake.priority.contact_number, key);
                Ok(Vec::new())
            }
        },
    };

    // The wizard never expires the session; a refused token is just a notice.
    match result {
        Ok(events) => apply_wizard_events(state, view_data, internal_tx, events),
        Err(error) => emit_notice(state, view_data, internal_tx, Notice::error(format!("{error:#}"))),
    }
}

fn handle_analyze_key<R: AppRuntime>(
    runtime: &mut R,
    intake: &mut IntakeUiState,
    key: KeyEvent,
) -> Result<Vec<WizardEvent>> {
    if is_ctrl(key, 't') {
        let catalog = intake.wizard.load_manual_catalog(runtime.intake())?;
        intake.wizard.set_mode(IntakeMode::Manual)?;
        intake.manual = ManualUiState {
            catalog,
            ..ManualUiState::default()
        };
        return Ok(Vec::new());
    }
    if key.code == KeyCode::Enter {
        return intake.wizard.analyze(runtime.intake(), &intake.description);
    }
    edit_text(&mut intake.description, key);
    Ok(Vec::new())
}

fn handle_manual_key<R: AppRuntime>(
    runtime: &mut R,
    intake: &mut IntakeUiState,
    key: KeyEvent,
) -> Result<Vec<WizardEvent>> {
    if is_ctrl(key, 't') {
        intake.wizard.set_mode(IntakeMode::Analyze)?;
        return Ok(Vec::new());
    }

    let manual = &mut intake.manual;
    match key.code {
        KeyCode::Tab => manual.field = manual.field.next(),
        KeyCode::BackTab => manual.field = manual.field.previous(),
        KeyCode::Up | KeyCode::Down => {
            let delta = if key.code == KeyCode::Up { -1 } else { 1 };
            match manual.field {
                ManualField::Related => {
                    let cursor = step_cursor(manual.related_cursor, manual.catalog.len(), delta);
                    if cursor != manual.related_cursor {
                        manual.related_cursor = cursor;
                        manual.subs.clear();
                        manual.sub_cursor = None;
                        if let Some(related) = manual.selected_related().cloned() {
                            manual.subs =
                                intake.wizard.load_manual_sub_issues(runtime.intake(), &related)?;
                        }
                    }
                }
                ManualField::Sub => {
                    manual.sub_cursor = step_cursor(manual.sub_cursor, manual.subs.len(), delta);
                }
                ManualField::Contact => {}
            }
        }
        KeyCode::Enter => {
            let selection = manual.selection();
            return intake.wizard.submit_manual(runtime.intake(), &selection);
        }
        _ if manual.field == ManualField::Contact => {
            edit_text(&mut manual.contact_number, key);
        }
        _ => {}
    }
    Ok(Vec::new())
}

fn handle_sub_issue_key<R: AppRuntime>(
    runtime: &mut R,
    intake: &mut IntakeUiState,
    key: KeyEvent,
) -> Result<Vec<WizardEvent>> {
    let options = intake.wizard.sub_issue_options();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            intake.sub_cursor = intake.sub_cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            intake.sub_cursor = (intake.sub_cursor + 1).min(options.len().saturating_sub(1));
        }
        KeyCode::Char('b') => return intake.wizard.back(),
        KeyCode::Enter => {
            if let Some((pick, _)) = options.get(intake.sub_cursor) {
                return intake.wizard.select_sub_issue(runtime.intake(), *pick);
            }
        }
        _ => {}
    }
    Ok(Vec::new())
}

fn apply_wizard_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<WizardEvent>,
) {
    for event in events {
        match event {
            WizardEvent::StepChanged(_) => view_data.intake.sub_cursor = 0,
            WizardEvent::Notice(notice) => emit_notice(state, view_data, internal_tx, notice),
            WizardEvent::Finished(exit) => {
                view_data.intake.clear_inputs();
                state.dispatch(AppCommand::BackToDashboard);
                if exit == WizardExit::Cancelled {
                    emit_status(state, view_data, internal_tx, "complaint discarded");
                }
            }
        }
    }
}

fn reload_tracking<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.track_complaints() {
        Ok(complaints) => {
            view_data.tracking.complaints = complaints;
            view_data.tracking.clamp_selection(OffsetDateTime::now_utc());
        }
        Err(error) => report_failure(
            state,
            runtime,
            view_data,
            internal_tx,
            Some("failed to load complaints"),
            &error,
        ),
    }
}

fn handle_tracking_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if view_data.tracking.feedback.is_some() {
        handle_feedback_key(state, runtime, view_data, internal_tx, key);
        return;
    }

    let now = OffsetDateTime::now_utc();
    let tracking = &mut view_data.tracking;
    match key.code {
        KeyCode::Esc => {
            dispatch_with_status(state, view_data, internal_tx, AppCommand::BackToDashboard);
        }
        KeyCode::Up | KeyCode::Char('k') => tracking.selected = tracking.selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => {
            tracking.selected = tracking.selected.saturating_add(1);
            tracking.clamp_selection(now);
        }
        KeyCode::Char('f') | KeyCode::Char('F') => {
            let delta = if key.code == KeyCode::Char('f') { 1 } else { -1 };
            tracking.filter = tracking.filter.cycle(delta);
            tracking.selected = 0;
            let label = tracking.filter.label();
            emit_status(state, view_data, internal_tx, format!("filter: {label}"));
        }
        KeyCode::Char('r') => reload_tracking(state, runtime, view_data, internal_tx),
        KeyCode::Char('e') => {
            let csv = export_csv(tracking.visible(now));
            let count = tracking.visible(now).len();
            match runtime.export_complaints(&csv) {
                Ok(path) => emit_notice(
                    state,
                    view_data,
                    internal_tx,
                    Notice::success(format!("exported {count} complaints to {}", path.display())),
                ),
                Err(error) => emit_notice(
                    state,
                    view_data,
                    internal_tx,
                    Notice::error(format!("export failed: {error:#}")),
                ),
            }
        }
        KeyCode::Enter => match tracking
            .selected_complaint(now)
            .map(|complaint| (complaint.id, complaint.can_leave_feedback()))
        {
            Some((complaint, true)) => {
                tracking.feedback = Some(FeedbackUiState {
                    complaint,
                    form: FeedbackForm::default(),
                });
            }
            Some((_, false)) => emit_status(
                state,
                view_data,
                internal_tx,
                "feedback is only available for resolved complaints without feedback",
            ),
            None => {}
        },
        _ => {}
    }
}

fn handle_feedback_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(feedback) = view_data.tracking.feedback.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => view_data.tracking.feedback = None,
        KeyCode::Up => feedback.form.label = Some(cycle_label(feedback.form.label, -1)),
        KeyCode::Down => feedback.form.label = Some(cycle_label(feedback.form.label, 1)),
        KeyCode::Enter => {
            let complaint_id = feedback.complaint;
            let submission = view_data
                .tracking
                .complaints
                .iter()
                .find(|complaint| complaint.id == complaint_id)
                .map(|complaint| complaint.feedback(runtime.user_id(), &feedback.form));
            let result = match submission {
                Some(Ok(submission)) => runtime.submit_feedback(&submission),
                Some(Err(error)) => Err(error),
                None => Err(anyhow::anyhow!("complaint {complaint_id} is no longer listed")),
            };
            match result {
                Ok(()) => {
                    mark_feedback_given(&mut view_data.tracking.complaints, complaint_id);
                    view_data.tracking.feedback = None;
                    emit_notice(
                        state,
                        view_data,
                        internal_tx,
                        Notice::success("Feedback submitted successfully!"),
                    );
                }
                Err(error) => {
                    report_failure(state, runtime, view_data, internal_tx, None, &error);
                }
            }
        }
        _ => {
            edit_text(&mut feedback.form.comment, key);
        }
    }
}

fn reload_queue<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = view_data.queue.board.reload(runtime.queue()) {
        report_failure(state, runtime, view_data, internal_tx, None, &error);
    }
}

fn handle_queue_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if let Some(action) = view_data.queue.confirm.take() {
        if key.code != KeyCode::Char('y') {
            emit_status(state, view_data, internal_tx, format!("{} cancelled", action.label()));
            return;
        }
        let board = &mut view_data.queue.board;
        let result = match action {
            QueueAction::Take => board.take(runtime.queue()),
            _ => board.reject(runtime.queue()),
        }
        .map(Some);
        finish_queue_action(state, runtime, view_data, internal_tx, result);
        return;
    }
    if view_data.queue.dialog.is_some() {
        let result = handle_queue_dialog_key(runtime, &mut view_data.queue, key);
        finish_queue_action(state, runtime, view_data, internal_tx, result);
        return;
    }

    let queue = &mut view_data.queue;
    match key.code {
        KeyCode::Esc => {
            dispatch_with_status(state, view_data, internal_tx, AppCommand::BackToDashboard);
        }
        KeyCode::Up | KeyCode::Char('k') => queue.board.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => queue.board.move_selection(1),
        KeyCode::Char('f') | KeyCode::Char('F') => {
            let delta = if key.code == KeyCode::Char('f') { 1 } else { -1 };
            let kind = queue.board.kind().cycle(delta);
            match queue.board.switch(runtime.queue(), kind) {
                Ok(()) => emit_status(state, view_data, internal_tx, format!("list: {}", kind.label())),
                Err(error) => report_failure(state, runtime, view_data, internal_tx, None, &error),
            }
        }
        KeyCode::Char('r') => reload_queue(state, runtime, view_data, internal_tx),
        KeyCode::Char('t') | KeyCode::Char('x') => {
            let action = if key.code == KeyCode::Char('t') {
                QueueAction::Take
            } else {
                QueueAction::Reject
            };
            let prompt = queue.board.target(action).map(|complaint| {
                format!(
                    "Are you sure you want to {} complaint #{}? (y/n)",
                    action.label(),
                    complaint.id
                )
            });
            match prompt {
                Ok(prompt) => {
                    queue.confirm = Some(action);
                    emit_status(state, view_data, internal_tx, prompt);
                }
                Err(error) => emit_notice(state, view_data, internal_tx, Notice::error(error.to_string())),
            }
        }
        KeyCode::Char('s') => {
            let dialog = queue
                .board
                .target(QueueAction::Solve)
                .map(|complaint| QueueDialog::Solve(SolveUiState::for_complaint(complaint)));
            match dialog {
                Ok(dialog) => queue.dialog = Some(dialog),
                Err(error) => emit_notice(state, view_data, internal_tx, Notice::error(error.to_string())),
            }
        }
        KeyCode::Char('u') => {
            let complaint = match queue.board.target(QueueAction::Categorize) {
                Ok(complaint) => complaint.id,
                Err(error) => {
                    emit_notice(state, view_data, internal_tx, Notice::error(error.to_string()));
                    return;
                }
            };
            match runtime.queue().main_issues() {
                Ok(issues) => {
                    let options = issues.into_iter().map(|issue| (issue.id, issue.name)).collect();
                    queue.dialog = Some(QueueDialog::Categorize(CategorizeUiState {
                        complaint: Some(complaint),
                        main: IssuePicker::with_options(options),
                        ..CategorizeUiState::default()
                    }));
                }
                Err(error) => report_failure(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    Some("Failed to fetch main issues"),
                    &error,
                ),
            }
        }
        _ => {}
    }
}

fn finish_queue_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    result: Result<Option<Notice>>,
) {
    match result {
        Ok(Some(notice)) => emit_notice(state, view_data, internal_tx, notice),
        Ok(None) => {}
        Err(error) => report_failure(state, runtime, view_data, internal_tx, None, &error),
    }
}

/// Edits the open dialog; returns the outcome notice once it is submitted.
fn handle_queue_dialog_key<R: AppRuntime>(
    runtime: &mut R,
    queue: &mut QueueUiState,
    key: KeyEvent,
) -> Result<Option<Notice>> {
    if key.code == KeyCode::Esc {
        queue.dialog = None;
        return Ok(None);
    }
    let notice = match queue.dialog.as_mut() {
        Some(QueueDialog::Solve(solve)) => {
            if key.code != KeyCode::Enter {
                edit_solve_dialog(runtime.queue(), solve, key)?;
                return Ok(None);
            }
            let form = solve.form();
            queue.board.solve(runtime.queue(), &form)?
        }
        Some(QueueDialog::Categorize(categorize)) => {
            if key.code != KeyCode::Enter {
                edit_categorize_dialog(runtime.queue(), categorize, key)?;
                return Ok(None);
            }
            let form = categorize.form();
            queue.board.categorize(runtime.queue(), &form)?
        }
        None => return Ok(None),
    };
    queue.dialog = None;
    Ok(Some(notice))
}

fn edit_solve_dialog(
    backend: &mut dyn QueueBackend,
    solve: &mut SolveUiState,
    key: KeyEvent,
) -> Result<()> {
    let fields = solve.fields().len();
    match key.code {
        KeyCode::Tab => {
            solve.field = (solve.field + 1) % fields;
            return Ok(());
        }
        KeyCode::BackTab => {
            solve.field = (solve.field + fields - 1) % fields;
            return Ok(());
        }
        _ => {}
    }
    let delta = match key.code {
        KeyCode::Left | KeyCode::Up => Some(-1),
        KeyCode::Right | KeyCode::Down => Some(1),
        _ => None,
    };
    match (solve.active(), delta) {
        (SolveField::Mode, Some(_)) => {
            if solve.form.mode == SolutionMode::Direct && solve.related.is_empty() {
                let Some(main) = solve.main_issue else {
                    anyhow::bail!("complaint has no main issue to add a sub-issue under");
                };
                solve.related = backend
                    .related_issues_under(main)
                    .context("Failed to fetch related issues")?;
                solve.related_cursor = (!solve.related.is_empty()).then_some(0);
            }
            solve.form.mode = solve.form.mode.toggle();
            solve.field = 0;
        }
        (SolveField::Related, Some(delta)) => {
            solve.related_cursor = step_cursor(solve.related_cursor, solve.related.len(), delta);
        }
        (SolveField::Severity, Some(_)) => solve.form.severity = solve.form.severity.toggle(),
        (SolveField::DoneBy, Some(delta)) if matches!(key.code, KeyCode::Left | KeyCode::Right) => {
            solve.done_by.cycle_role(backend, delta)?;
        }
        (SolveField::DoneBy, Some(delta)) => {
            let picker = &mut solve.done_by;
            picker.cursor = step_cursor(picker.cursor, picker.staff.len(), delta);
        }
        (SolveField::Direct, _) => {
            edit_text(&mut solve.form.direct_solution, key);
        }
        (SolveField::SubName, _) => {
            edit_text(&mut solve.form.sub_issue_name, key);
        }
        (SolveField::Description, _) => {
            edit_text(&mut solve.form.issue_description, key);
        }
        (SolveField::Steps, _) => edit_steps(&mut solve.form.steps, key),
        _ => {}
    }
    Ok(())
}

fn edit_categorize_dialog(
    backend: &mut dyn QueueBackend,
    categorize: &mut CategorizeUiState,
    key: KeyEvent,
) -> Result<()> {
    match key.code {
        KeyCode::Tab => {
            categorize.field = categorize.field.cycle(1);
            return Ok(());
        }
        KeyCode::BackTab => {
            categorize.field = categorize.field.cycle(-1);
            return Ok(());
        }
        _ => {}
    }
    let delta = match key.code {
        KeyCode::Left | KeyCode::Up => Some(-1),
        KeyCode::Right | KeyCode::Down => Some(1),
        _ => None,
    };
    match (categorize.field, delta) {
        (CategorizeField::Main, Some(delta)) => {
            if categorize.main.step(delta) {
                let options = match categorize.main.selected() {
                    Some(main) => backend
                        .related_issues_under(main)
                        .context("Failed to fetch related issues")?
                        .into_iter()
                        .map(|issue| (issue.id, issue.name))
                        .collect(),
                    None => Vec::new(),
                };
                categorize.related = IssuePicker::with_options(options);
                categorize.sub = IssuePicker::default();
            }
        }
        (CategorizeField::Related, Some(delta)) => {
            if categorize.related.step(delta) {
                let options = match categorize.related.selected() {
                    Some(related) => backend
                        .sub_issues_under(related)
                        .context("Failed to fetch sub-related issues")?
                        .into_iter()
                        .map(|sub| (sub.id, sub.name))
                        .collect(),
                    None => Vec::new(),
                };
                categorize.sub = IssuePicker::with_options(options);
            }
        }
        (CategorizeField::Sub, Some(delta)) => {
            categorize.sub.step(delta);
        }
        (CategorizeField::Severity, Some(_)) => categorize.severity = categorize.severity.toggle(),
        (CategorizeField::DoneBy, Some(delta))
            if matches!(key.code, KeyCode::Left | KeyCode::Right) =>
        {
            categorize.done_by.cycle_role(backend, delta)?;
        }
        (CategorizeField::DoneBy, Some(delta)) => {
            let picker = &mut categorize.done_by;
            picker.cursor = step_cursor(picker.cursor, picker.staff.len(), delta);
        }
        (CategorizeField::Main, None) if categorize.main.cursor.is_none() => {
            edit_text(&mut categorize.main.typed, key);
        }
        (CategorizeField::Related, None) if categorize.related.cursor.is_none() => {
            edit_text(&mut categorize.related.typed, key);
        }
        (CategorizeField::Sub, None) if categorize.sub.cursor.is_none() => {
            edit_text(&mut categorize.sub.typed, key);
        }
        (CategorizeField::Description, _) => {
            edit_text(&mut categorize.description, key);
        }
        (CategorizeField::Steps, _) => edit_steps(&mut categorize.steps, key),
        _ => {}
    }
    Ok(())
}

fn handle_profile_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let profile = &mut view_data.profile;
    match key.code {
        KeyCode::Esc => {
            dispatch_with_status(state, view_data, internal_tx, AppCommand::BackToDashboard);
        }
        KeyCode::Tab | KeyCode::Down => {
            profile.field = (profile.field + 1) % ProfileUiState::FIELDS;
        }
        KeyCode::BackTab | KeyCode::Up => {
            profile.field = (profile.field + ProfileUiState::FIELDS - 1) % ProfileUiState::FIELDS;
        }
        KeyCode::Enter => {
            let result = profile
                .form
                .validate()
                .and_then(|update| runtime.save_profile(&update));
            match result {
                Ok(message) => {
                    view_data.profile.form.photo.clear();
                    emit_notice(state, view_data, internal_tx, Notice::success(message));
                }
                Err(error) => report_failure(state, runtime, view_data, internal_tx, None, &error),
            }
        }
        _ => {
            edit_text(profile.active_field(), key);
        }
    }
}

fn handle_staff_reset_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let reset = &mut view_data.staff_reset;
    match key.code {
        KeyCode::Esc => {
            dispatch_with_status(state, view_data, internal_tx, AppCommand::BackToDashboard);
        }
        KeyCode::Tab | KeyCode::Down => {
            reset.field = (reset.field + 1) % StaffResetUiState::FIELDS;
        }
        KeyCode::BackTab | KeyCode::Up => {
            reset.field = (reset.field + StaffResetUiState::FIELDS - 1) % StaffResetUiState::FIELDS;
        }
        KeyCode::Left | KeyCode::Right if reset.field == 0 => {
            reset.role = match reset.role {
                Role::SubAdmin => Role::Admin,
                _ => Role::SubAdmin,
            };
        }
        KeyCode::Enter => {
            let role = reset.role;
            match runtime.reset_staff_password(role, &reset.form) {
                Ok(message) => {
                    view_data.staff_reset = StaffResetUiState {
                        role,
                        ..StaffResetUiState::default()
                    };
                    emit_notice(state, view_data, internal_tx, Notice::success(message));
                }
                Err(error) => report_failure(state, runtime, view_data, internal_tx, None, &error),
            }
        }
        _ => {
            if let Some(field) = reset.active_field() {
                edit_text(field, key);
            }
        }
    }
}

fn cycle_label(current: Option<FeedbackLabel>, delta: isize) -> FeedbackLabel {
    let Some(current) = current else {
        return FeedbackLabel::ALL[0];
    };
    let len = FeedbackLabel::ALL.len() as isize;
    let index = FeedbackLabel::ALL
        .iter()
        .position(|label| *label == current)
        .unwrap_or(0) as isize;
    FeedbackLabel::ALL[(index + delta).rem_euclid(len) as usize]
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().title("cms").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let body_title = state.screen.title();
    match state.screen {
        Screen::Login => render_paragraph(frame, layout[1], body_title, render_login_text(view_data)),
        Screen::ResetPassword => {
            render_paragraph(frame, layout[1], body_title, render_reset_text(view_data));
        }
        Screen::Dashboard => {
            render_paragraph(frame, layout[1], body_title, render_dashboard_text(state));
        }
        Screen::CreateComplaint => {
            let wizard = &view_data.intake.wizard;
            let title = format!(
                "{body_title} | step {} of {}: {}",
                wizard.step().number(),
                WizardStep::ALL.len(),
                wizard.step().title()
            );
            render_paragraph(frame, layout[1], &title, render_wizard_text(&view_data.intake));
        }
        Screen::TrackComplaints => render_tracking(frame, layout[1], view_data),
        Screen::WorkQueue => render_queue(frame, layout[1], &view_data.queue),
        Screen::Profile => {
            render_paragraph(frame, layout[1], body_title, render_profile_text(&view_data.profile));
        }
        Screen::StaffPassword => {
            render_paragraph(
                frame,
                layout[1],
                body_title,
                render_staff_reset_text(&view_data.staff_reset),
            );
        }
    }

    let status_color = match view_data.status_level {
        NoticeLevel::Info => Color::Yellow,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Error => Color::Red,
    };
    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(status_color))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if state.screen == Screen::TrackComplaints
        && let Some(feedback) = &view_data.tracking.feedback
    {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_feedback_text(feedback))
            .block(Block::default().title("feedback").borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }

    if state.screen == Screen::WorkQueue
        && let Some(dialog) = &view_data.queue.dialog
    {
        let (title, body) = match dialog {
            QueueDialog::Solve(solve) => ("solve complaint", render_solve_text(solve)),
            QueueDialog::Categorize(categorize) => {
                ("categorize complaint", render_categorize_text(categorize))
            }
        };
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let overlay =
            Paragraph::new(body).block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }
}

fn render_paragraph(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str, body: String) {
    let widget = Paragraph::new(body).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_owned()),
    );
    frame.render_widget(widget, area);
}

fn header_text(state: &AppState) -> String {
    match state.role {
        Some(role) => format!("{} | {}", state.screen.title(), role.label()),
        None => state.screen.title().to_owned(),
    }
}

fn field_line(label: &str, value: &str, active: bool) -> String {
    let marker = if active { CURSOR_MARK } else { " " };
    format!("{marker} {label:<18} {value}")
}

fn masked(value: &str) -> String {
    std::iter::repeat_n(PASSWORD_MASK, value.chars().count()).collect()
}

fn render_login_text(view_data: &ViewData) -> String {
    let login = &view_data.login;
    [
        field_line("staff number", &login.form.staff_no, login.field == 0),
        field_line("password", &masked(&login.form.password), login.field == 1),
    ]
    .join("\n")
}

fn render_reset_text(view_data: &ViewData) -> String {
    let reset = &view_data.reset;
    [
        field_line("staff number", &reset.form.staff_no, reset.field == 0),
        field_line("new password", &masked(&reset.form.new_password), reset.field == 1),
        field_line(
            "confirm password",
            &masked(&reset.form.confirm_password),
            reset.field == 2,
        ),
    ]
    .join("\n")
}

fn render_dashboard_text(state: &AppState) -> String {
    let Some(summary) = &state.summary else {
        return "loading summary...".to_owned();
    };
    summary
        .tiles()
        .into_iter()
        .map(|(label, value)| format!("{label:<20} {value:>6}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_wizard_text(intake: &IntakeUiState) -> String {
    let wizard = &intake.wizard;
    let draft = wizard.draft();
    match wizard.step() {
        WizardStep::ProblemDescription => match wizard.mode() {
            IntakeMode::Analyze => format!(
                "mode: analyze (ctrl+t for manual)\n\nDescribe your issue:\n> {}",
                intake.description
            ),
            IntakeMode::Manual => render_manual_text(&intake.manual),
        },
        WizardStep::IssueConfirmation => format!(
            "Main issue:     {}\nRelated issue:  {}\n\nIs this categorisation correct?",
            draft.main_issue.name, draft.related_issue.name
        ),
        WizardStep::SubIssueSelection => wizard
            .sub_issue_options()
            .iter()
            .enumerate()
            .map(|(index, (_, label))| {
                let marker = if index == intake.sub_cursor { CURSOR_MARK } else { " " };
                format!("{marker} {label}")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        WizardStep::SubIssueDetail => {
            let label = draft
                .selected_sub_issue
                .as_ref()
                .map(|choice| choice.label().to_owned())
                .unwrap_or_default();
            format!(
                "Sub-issue: {label}\n\n{}\n\n{} solution step(s) available",
                draft.sub_issue_description,
                draft.solutions.len()
            )
        }
        WizardStep::RemediationChat => wizard
            .chat()
            .map(render_chat_text)
            .unwrap_or_default(),
        WizardStep::PriorityContact => {
            let contact = if intake.priority.contact_number.is_empty() && !draft.contact_number.is_empty() {
                format!("{} (from manual selection)", draft.contact_number)
            } else {
                intake.priority.contact_number.clone()
            };
            [
                format!("Issue: {}", draft.related_issue.name),
                String::new(),
                field_line("priority", &format!("< {} >", intake.priority.priority.as_str()), false),
                field_line("contact number", &contact, true),
            ]
            .join("\n")
        }
    }
}

fn render_manual_text(manual: &ManualUiState) -> String {
    let related = manual
        .selected_related()
        .map(|issue| format!("{} ({})", issue.name, issue.main_issue_name))
        .unwrap_or_else(|| "choose with up/down".to_owned());
    let sub = match manual.selected_sub() {
        Some(sub) => sub.name.clone(),
        None if manual.subs.is_empty() => "choose a related issue first".to_owned(),
        None => "choose with up/down".to_owned(),
    };
    [
        "mode: manual (ctrl+t for analyze)".to_owned(),
        String::new(),
        field_line("related issue", &related, manual.field == ManualField::Related),
        field_line("sub-issue", &sub, manual.field == ManualField::Sub),
        field_line(
            "contact number",
            &manual.contact_number,
            manual.field == ManualField::Contact,
        ),
    ]
    .join("\n")
}

fn render_chat_text(chat: &RemediationChat) -> String {
    let mut lines = Vec::new();
    for message in chat.transcript() {
        let speaker = match message.speaker {
            ChatSpeaker::Bot => "assistant",
            ChatSpeaker::User => "you",
        };
        lines.push(format!("{speaker}: {}", message.text));
        for option in &message.options {
            lines.push(format!("    [{}]", option.label()));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn render_tracking(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8)])
        .split(area);

    let now = OffsetDateTime::now_utc();
    let tracking = &view_data.tracking;
    let visible = tracking.visible(now);

    let header = Row::new(
        ["id", "created", "issue", "status", "assigned", "time taken", "feedback"]
            .into_iter()
            .map(|label| {
                Cell::from(label).style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            }),
    );
    let rows = visible.iter().enumerate().map(|(index, complaint)| {
        let style = if index == tracking.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        Row::new(tracking_cells(complaint)).style(style)
    });
    let widths = [
        Constraint::Length(6),
        Constraint::Length(11),
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(10),
    ];
    let title = format!(
        "{} | filter: {} | {} of {}",
        Screen::TrackComplaints.title(),
        tracking.filter.label(),
        visible.len(),
        tracking.complaints.len()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, layout[0]);

    let detail = visible
        .get(tracking.selected)
        .map(|complaint| render_complaint_detail(complaint))
        .unwrap_or_default();
    render_paragraph(frame, layout[1], "details", detail);
}

fn tracking_cells(complaint: &TrackedComplaint) -> Vec<String> {
    let created = complaint
        .created_at
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();
    let feedback = if complaint.has_feedback {
        "given"
    } else if complaint.can_leave_feedback() {
        "available"
    } else {
        ""
    };
    vec![
        complaint.id.to_string(),
        created,
        format!("{} / {}", complaint.related_issue, complaint.sub_related_issue),
        complaint.display_status().label().to_owned(),
        complaint.assigned_to.clone().unwrap_or_default(),
        complaint.time_taken(),
        feedback.to_owned(),
    ]
}

fn render_complaint_detail(complaint: &TrackedComplaint) -> String {
    let mut lines = vec![
        format!("description: {}", complaint.description),
        format!(
            "category: {} / {} / {}",
            complaint.main_issue, complaint.related_issue, complaint.sub_related_issue
        ),
    ];
    if let Some(phone) = &complaint.assigned_to_phone {
        lines.push(format!("assignee phone: {phone}"));
    }
    if let Some(done_by) = &complaint.done_by {
        lines.push(format!("resolved by: {done_by}"));
    }
    if let Some(solution) = &complaint.direct_solution {
        lines.push(format!("solution: {solution}"));
    }
    for (index, step) in complaint.solution_steps.iter().enumerate() {
        lines.push(format!("step {}: {step}", index + 1));
    }
    lines.join("\n")
}

fn render_queue(frame: &mut ratatui::Frame<'_>, area: Rect, queue: &QueueUiState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8)])
        .split(area);

    let board = &queue.board;
    let header = Row::new(
        ["id", "created", "priority", "category", "status", "assigned"]
            .into_iter()
            .map(|label| {
                Cell::from(label).style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            }),
    );
    let rows = board.complaints().iter().enumerate().map(|(index, complaint)| {
        let style = if index == board.selected() {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        Row::new(queue_cells(complaint)).style(style)
    });
    let widths = [
        Constraint::Length(6),
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(16),
    ];
    let title = format!(
        "{} | {} | {} complaints",
        Screen::WorkQueue.title(),
        board.kind().label(),
        board.complaints().len()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, layout[0]);

    let detail = board
        .selected_complaint()
        .map(render_queue_detail)
        .unwrap_or_default();
    render_paragraph(frame, layout[1], "details", detail);
}

fn queue_cells(complaint: &QueueComplaint) -> Vec<String> {
    let created = complaint
        .created_at
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();
    vec![
        complaint.id.to_string(),
        created,
        complaint.priority.as_str().to_owned(),
        format!(
            "{} / {}",
            complaint.main_issue_label(),
            complaint.related_issue_label()
        ),
        complaint.status.clone(),
        complaint.assignee_label().to_owned(),
    ]
}

fn render_queue_detail(complaint: &QueueComplaint) -> String {
    let staff_no = complaint
        .user_staff_no
        .as_deref()
        .unwrap_or(cms_app::NOT_AVAILABLE);
    let mut lines = vec![
        format!("description: {}", complaint.description),
        format!("raised by: {} ({staff_no})", complaint.user_name),
        format!(
            "sub-issue: {} | severity: {}",
            complaint.sub_related_issue_label(),
            complaint.severity.as_str()
        ),
    ];
    if let Some(contacts) = &complaint.contacts {
        lines.push(format!("contact: {contacts}"));
    }
    if let Some(done_by) = &complaint.done_by {
        lines.push(format!("resolved by: {done_by}"));
    }
    lines.join("\n")
}

fn render_solve_text(solve: &SolveUiState) -> String {
    let active = solve.active();
    let mut lines = vec![
        format!(
            "complaint #{}",
            solve.complaint.map(|id| id.to_string()).unwrap_or_default()
        ),
        String::new(),
        field_line(
            "mode",
            &format!("< {} >", solve.form.mode.label()),
            active == SolveField::Mode,
        ),
    ];
    match solve.form.mode {
        SolutionMode::Direct => lines.push(field_line(
            "solution",
            &solve.form.direct_solution,
            active == SolveField::Direct,
        )),
        SolutionMode::Structured => {
            let related = solve
                .selected_related()
                .map_or_else(|| "none available".to_owned(), |issue| format!("< {} >", issue.name));
            lines.push(field_line("related issue", &related, active == SolveField::Related));
            lines.push(field_line(
                "new sub-issue",
                &solve.form.sub_issue_name,
                active == SolveField::SubName,
            ));
            lines.push(field_line(
                "description",
                &solve.form.issue_description,
                active == SolveField::Description,
            ));
            lines.push(field_line("steps", "", active == SolveField::Steps));
            lines.extend(steps_lines(&solve.form.steps));
        }
    }
    lines.push(field_line(
        "severity",
        &format!("< {} >", solve.form.severity.as_str()),
        active == SolveField::Severity,
    ));
    lines.push(field_line("done by", &solve.done_by.label(), active == SolveField::DoneBy));
    lines.join("\n")
}

fn render_categorize_text(categorize: &CategorizeUiState) -> String {
    let active = categorize.field;
    let mut lines = vec![
        format!(
            "complaint #{}",
            categorize
                .complaint
                .map(|id| id.to_string())
                .unwrap_or_default()
        ),
        String::new(),
        field_line("main issue", &categorize.main.label(), active == CategorizeField::Main),
        field_line(
            "related issue",
            &categorize.related.label(),
            active == CategorizeField::Related,
        ),
        field_line("sub-issue", &categorize.sub.label(), active == CategorizeField::Sub),
        field_line(
            "description",
            &categorize.description,
            active == CategorizeField::Description,
        ),
        field_line("steps", "", active == CategorizeField::Steps),
    ];
    lines.extend(steps_lines(&categorize.steps));
    lines.push(field_line(
        "severity",
        &format!("< {} >", categorize.severity.as_str()),
        active == CategorizeField::Severity,
    ));
    lines.push(field_line(
        "done by",
        &categorize.done_by.label(),
        active == CategorizeField::DoneBy,
    ));
    lines.join("\n")
}

fn render_profile_text(profile: &ProfileUiState) -> String {
    let photo = profile.photo_url.as_deref().unwrap_or("none");
    [
        field_line("staff number", &profile.staff_no, false),
        field_line("department", &profile.department, false),
        field_line("name", &profile.form.name, profile.field == 0),
        field_line("designation", &profile.form.designation, profile.field == 1),
        field_line("contacts", &profile.form.contacts, profile.field == 2),
        field_line("new photo path", &profile.form.photo, profile.field == 3),
        String::new(),
        format!("current photo: {photo}"),
    ]
    .join("\n")
}

fn render_staff_reset_text(reset: &StaffResetUiState) -> String {
    [
        field_line(
            "account type",
            &format!("< {} >", reset.role.label()),
            reset.field == 0,
        ),
        field_line("staff number", &reset.form.staff_no, reset.field == 1),
        field_line("new password", &masked(&reset.form.new_password), reset.field == 2),
        field_line(
            "confirm password",
            &masked(&reset.form.confirm_password),
            reset.field == 3,
        ),
    ]
    .join("\n")
}

fn render_feedback_text(feedback: &FeedbackUiState) -> String {
    let rating = feedback
        .form
        .label
        .map(|label| format!("< {} >", label.as_str()))
        .unwrap_or_else(|| "choose with up/down".to_owned());
    [
        format!("complaint #{}", feedback.complaint),
        String::new(),
        field_line("rating", &rating, false),
        field_line("comment", &feedback.form.comment, true),
        String::new(),
        "enter submit | esc close".to_owned(),
    ]
    .join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let hints = match state.screen {
        Screen::Login => "tab field | enter sign in | ctrl+r reset password | ctrl+q quit",
        Screen::ResetPassword => "tab field | enter reset | esc back",
        Screen::Dashboard => match state.role {
            Some(Role::User) => {
                "c create complaint | t track complaints | p profile | L sign out | q quit"
            }
            Some(Role::SubAdmin) => "w work queue | p profile | L sign out | q quit",
            Some(Role::Admin) => "R reset staff password | p profile | L sign out | q quit",
            None => "q quit",
        },
        Screen::CreateComplaint => intake_hints(&view_data.intake),
        Screen::TrackComplaints if view_data.tracking.feedback.is_some() => {
            "up/down rating | type comment | enter submit | esc close"
        }
        Screen::TrackComplaints => {
            "j/k move | f/F filter | enter feedback | e export csv | r reload | esc back"
        }
        Screen::WorkQueue => queue_hints(&view_data.queue),
        Screen::Profile => "tab field | type to edit | enter save | esc back",
        Screen::StaffPassword => "tab field | left/right account type | enter reset | esc back",
    };
    match &state.status_line {
        Some(status) => format!("{status} | {hints}"),
        None => hints.to_owned(),
    }
}

fn queue_hints(queue: &QueueUiState) -> &'static str {
    if queue.confirm.is_some() {
        return "y confirm | any other key cancel";
    }
    match &queue.dialog {
        Some(_) => {
            "tab field | left/right change | up/down choose | ctrl+n new step | enter submit | esc close"
        }
        None => "j/k move | f/F list | t take | x reject | s solve | u categorize | r reload | esc back",
    }
}

fn intake_hints(intake: &IntakeUiState) -> &'static str {
    match intake.wizard.step() {
        WizardStep::ProblemDescription => match intake.wizard.mode() {
            IntakeMode::Analyze => "type description | enter analyze | ctrl+t manual | esc cancel",
            IntakeMode::Manual => {
                "tab field | up/down choose | enter submit | ctrl+t analyze | esc cancel"
            }
        },
        WizardStep::IssueConfirmation => "enter confirm | b back | esc cancel",
        WizardStep::SubIssueSelection => "j/k move | enter select | b back | esc cancel",
        WizardStep::SubIssueDetail => "p preview solution | r raise complaint | b back | esc cancel",
        WizardStep::RemediationChat => match intake.wizard.chat().map(RemediationChat::phase) {
            Some(ChatPhase::AwaitingAck { .. }) => {
                "enter step completed | h request human support | esc cancel"
            }
            Some(ChatPhase::AwaitingOutcome) => {
                "y issue resolved | h request human support | esc cancel"
            }
            Some(ChatPhase::NoSolutions) => "h proceed to complaint | esc cancel",
            _ => "esc cancel",
        },
        WizardStep::PriorityContact => "left/right priority | type contact | enter submit | esc cancel",
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
