// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{DashboardSummary, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    ResetPassword,
    Dashboard,
    CreateComplaint,
    TrackComplaints,
    WorkQueue,
    Profile,
    StaffPassword,
}

impl Screen {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::ResetPassword => "Reset password",
            Self::Dashboard => "Dashboard",
            Self::CreateComplaint => "Create complaint",
            Self::TrackComplaints => "Track complaints",
            Self::WorkQueue => "Work queue",
            Self::Profile => "Profile",
            Self::StaffPassword => "Reset staff password",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub role: Option<Role>,
    pub summary: Option<DashboardSummary>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            role: None,
            summary: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SignedIn(Role),
    SignOut,
    SessionExpired,
    OpenResetPassword,
    OpenCreateComplaint,
    OpenTrackComplaints,
    OpenWorkQueue,
    OpenProfile,
    OpenStaffPassword,
    BackToDashboard,
    BackToLogin,
    SummaryLoaded(DashboardSummary),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(Screen),
    SummaryUpdated,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    /// Starts on the dashboard when a stored session already carries a role.
    pub fn resume(role: Option<Role>) -> Self {
        match role {
            Some(role) => Self {
                screen: Screen::Dashboard,
                role: Some(role),
                summary: Some(DashboardSummary::empty_for(role)),
                status_line: None,
            },
            None => Self::default(),
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SignedIn(role) => {
                self.role = Some(role);
                self.summary = Some(DashboardSummary::empty_for(role));
                vec![
                    self.switch(Screen::Dashboard),
                    self.set_status("Logged in successfully!"),
                ]
            }
            AppCommand::SignOut => {
                self.forget_session();
                vec![self.switch(Screen::Login), self.set_status("signed out")]
            }
            AppCommand::SessionExpired => {
                self.forget_session();
                vec![
                    self.switch(Screen::Login),
                    self.set_status("session expired -- sign in again"),
                ]
            }
            AppCommand::OpenResetPassword => {
                if self.screen != Screen::Login {
                    return Vec::new();
                }
                vec![self.switch(Screen::ResetPassword)]
            }
            AppCommand::BackToLogin => {
                if self.screen != Screen::ResetPassword {
                    return Vec::new();
                }
                vec![self.switch(Screen::Login)]
            }
            AppCommand::OpenCreateComplaint => self.open_user_screen(Screen::CreateComplaint),
            AppCommand::OpenTrackComplaints => self.open_user_screen(Screen::TrackComplaints),
            AppCommand::OpenWorkQueue => self.open_role_screen(
                Screen::WorkQueue,
                Role::SubAdmin,
                "only subadmins work the complaint queues",
            ),
            AppCommand::OpenStaffPassword => self.open_role_screen(
                Screen::StaffPassword,
                Role::Admin,
                "only admins can reset staff passwords",
            ),
            AppCommand::OpenProfile => {
                if self.role.is_none() || self.screen != Screen::Dashboard {
                    return Vec::new();
                }
                vec![self.switch(Screen::Profile)]
            }
            AppCommand::BackToDashboard => {
                if self.role.is_none() {
                    return Vec::new();
                }
                vec![self.switch(Screen::Dashboard)]
            }
            AppCommand::SummaryLoaded(summary) => {
                // Late poll responses can land after a role change.
                if self.role != Some(summary.role()) {
                    return Vec::new();
                }
                self.summary = Some(summary);
                vec![AppEvent::SummaryUpdated]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn open_user_screen(&mut self, screen: Screen) -> Vec<AppEvent> {
        self.open_role_screen(screen, Role::User, "only users can manage their own complaints")
    }

    fn open_role_screen(&mut self, screen: Screen, role: Role, denied: &str) -> Vec<AppEvent> {
        if self.role != Some(role) {
            return vec![self.set_status(denied)];
        }
        vec![self.switch(screen)]
    }

    fn forget_session(&mut self) {
        self.role = None;
        self.summary = None;
    }

    fn switch(&mut self, screen: Screen) -> AppEvent {
        self.screen = screen;
        AppEvent::ScreenChanged(screen)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
