// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::time::Duration;

use crate::schedule::{Scheduler, TaskToken};

const THINKING_TEXT: &str = "Analyzing your issue...";
const NO_SOLUTION_TEXT: &str = "No solution available for this issue. Please select \"Request Human Support\" or proceed to raise a complaint.";
const EXHAUSTED_TEXT: &str = "You've completed all the steps. Please select \"Issue Resolved\" if your issue is fixed, or \"Request Human Support\" if you need further assistance.";
const HANDOFF_TEXT: &str = "Let's proceed to set the priority and submit your complaint.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSpeaker {
    Bot,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOption {
    StepCompleted,
    ProceedToComplaint,
}

impl ChatOption {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StepCompleted => "Step Completed",
            Self::ProceedToComplaint => "Proceed to Complaint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: ChatSpeaker,
    pub text: String,
    pub options: Vec<ChatOption>,
    pub thinking: bool,
}

impl ChatMessage {
    fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: ChatSpeaker::Bot,
            text: text.into(),
            options: Vec::new(),
            thinking: false,
        }
    }

    fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: ChatSpeaker::User,
            text: text.into(),
            options: Vec::new(),
            thinking: false,
        }
    }

    fn with_option(mut self, option: ChatOption) -> Self {
        self.options.push(option);
        self
    }
}

/// Artificial "typing" pauses before each bot reply. Zero delays are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatDelays {
    pub opening: Duration,
    pub step: Duration,
}

impl Default for ChatDelays {
    fn default() -> Self {
        Self {
            opening: Duration::from_secs(2),
            step: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingReply {
    Step(usize),
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Thinking,
    AwaitingAck { index: usize },
    AwaitingOutcome,
    NoSolutions,
    Reported { resolved: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationChat {
    sub_issue: String,
    steps: Vec<String>,
    delays: ChatDelays,
    transcript: Vec<ChatMessage>,
    phase: ChatPhase,
    pending: Option<(TaskToken, PendingReply)>,
}

impl RemediationChat {
    pub fn start(
        sub_issue: &str,
        steps: Vec<String>,
        delays: ChatDelays,
        scheduler: &mut dyn Scheduler,
    ) -> Self {
        let mut chat = Self {
            sub_issue: sub_issue.to_owned(),
            steps,
            delays,
            transcript: Vec::new(),
            phase: ChatPhase::NoSolutions,
            pending: None,
        };

        if chat.steps.is_empty() {
            chat.transcript.push(
                ChatMessage::bot(NO_SOLUTION_TEXT).with_option(ChatOption::ProceedToComplaint),
            );
        } else {
            chat.think(scheduler, delays.opening, PendingReply::Step(0));
        }
        chat
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub const fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn pending_token(&self) -> Option<TaskToken> {
        self.pending.map(|(token, _)| token)
    }

    /// The user confirms they carried out the instruction currently shown.
    pub fn acknowledge(&mut self, scheduler: &mut dyn Scheduler) -> Result<()> {
        let ChatPhase::AwaitingAck { index } = self.phase else {
            bail!("no instruction is waiting for acknowledgement");
        };
        self.transcript
            .push(ChatMessage::user(ChatOption::StepCompleted.label()));

        let next = if index + 1 < self.steps.len() {
            PendingReply::Step(index + 1)
        } else {
            PendingReply::Exhausted
        };
        self.think(scheduler, self.delays.step, next);
        Ok(())
    }

    /// Delivers the bot reply scheduled under `token`. Returns false for
    /// stale or unknown tokens.
    pub fn on_timer(&mut self, token: TaskToken) -> bool {
        match self.pending {
            Some((expected, reply)) if expected == token => {
                self.pending = None;
                self.transcript.retain(|message| !message.thinking);
                self.deliver(reply);
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some((token, _)) = self.pending.take() {
            scheduler.cancel(token);
            self.transcript.retain(|message| !message.thinking);
        }
    }

    /// Checks whether an outcome may be reported now. Nothing is recorded
    /// until `record_report` runs after the backend accepted the report.
    pub fn ensure_can_report(&self, resolved: bool) -> Result<()> {
        match self.phase {
            ChatPhase::Reported { .. } => {
                bail!("resolution outcome was already reported for this session")
            }
            ChatPhase::Thinking => bail!("wait for the assistant to finish its reply"),
            ChatPhase::AwaitingOutcome => Ok(()),
            ChatPhase::AwaitingAck { .. } | ChatPhase::NoSolutions if resolved => {
                bail!("complete every step before marking the issue resolved")
            }
            ChatPhase::AwaitingAck { .. } | ChatPhase::NoSolutions => Ok(()),
        }
    }

    pub fn record_report(&mut self, resolved: bool) {
        if resolved {
            self.transcript.push(ChatMessage::user("Issue Resolved"));
        } else {
            let label = if self.phase == ChatPhase::NoSolutions {
                ChatOption::ProceedToComplaint.label()
            } else {
                "Request Human Support"
            };
            self.transcript.push(ChatMessage::user(label));
            self.transcript.push(ChatMessage::bot(HANDOFF_TEXT));
        }
        self.phase = ChatPhase::Reported { resolved };
    }

    fn think(&mut self, scheduler: &mut dyn Scheduler, delay: Duration, reply: PendingReply) {
        let token = scheduler.schedule(delay);
        self.transcript.push(ChatMessage {
            thinking: true,
            ..ChatMessage::bot(THINKING_TEXT)
        });
        self.pending = Some((token, reply));
        self.phase = ChatPhase::Thinking;
    }

    fn deliver(&mut self, reply: PendingReply) {
        match reply {
            PendingReply::Step(0) => {
                let text = format!(
                    "Let's resolve \"{}\". Please follow this step:\n\nStep 1: {}",
                    self.sub_issue, self.steps[0]
                );
                self.transcript
                    .push(ChatMessage::bot(text).with_option(ChatOption::StepCompleted));
                self.phase = ChatPhase::AwaitingAck { index: 0 };
            }
            PendingReply::Step(index) => {
                let text = format!(
                    "Great! Now try this:\n\nStep {}: {}",
                    index + 1,
                    self.steps[index]
                );
                self.transcript
                    .push(ChatMessage::bot(text).with_option(ChatOption::StepCompleted));
                self.phase = ChatPhase::AwaitingAck { index };
            }
            PendingReply::Exhausted => {
                self.transcript.push(ChatMessage::bot(EXHAUSTED_TEXT));
                self.phase = ChatPhase::AwaitingOutcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatDelays, ChatOption, ChatPhase, ChatSpeaker, RemediationChat};
    use crate::schedule::{ManualScheduler, Scheduler};
    use std::time::Duration;

    fn steps() -> Vec<String> {
        vec!["Open the tray".to_owned(), "Remove the paper".to_owned()]
    }

    fn fire(chat: &mut RemediationChat, scheduler: &mut ManualScheduler) {
        for token in scheduler.fire_all() {
            chat.on_timer(token);
        }
    }

    #[test]
    fn opening_reply_waits_for_timer() {
        let mut scheduler = ManualScheduler::new();
        let mut chat =
            RemediationChat::start("Paper jam", steps(), ChatDelays::default(), &mut scheduler);

        assert_eq!(chat.phase(), ChatPhase::Thinking);
        assert!(chat.transcript()[0].thinking);
        assert_eq!(scheduler.requested_delays(), &[Duration::from_secs(2)]);

        fire(&mut chat, &mut scheduler);
        assert_eq!(chat.phase(), ChatPhase::AwaitingAck { index: 0 });
        assert_eq!(chat.transcript().len(), 1);
        let opening = &chat.transcript()[0];
        assert!(opening.text.contains("\"Paper jam\""));
        assert!(opening.text.contains("Step 1: Open the tray"));
        assert_eq!(opening.options, vec![ChatOption::StepCompleted]);
    }

    #[test]
    fn acknowledging_walks_steps_then_asks_for_outcome() {
        let mut scheduler = ManualScheduler::new();
        let mut chat =
            RemediationChat::start("Paper jam", steps(), ChatDelays::default(), &mut scheduler);
        assert!(chat.acknowledge(&mut scheduler).is_err());
        fire(&mut chat, &mut scheduler);

        chat.acknowledge(&mut scheduler).expect("first ack");
        assert_eq!(chat.phase(), ChatPhase::Thinking);
        assert!(chat.acknowledge(&mut scheduler).is_err());
        fire(&mut chat, &mut scheduler);
        assert_eq!(chat.phase(), ChatPhase::AwaitingAck { index: 1 });
        assert!(
            chat.transcript()
                .last()
                .is_some_and(|message| message.text.contains("Step 2: Remove the paper"))
        );

        chat.acknowledge(&mut scheduler).expect("second ack");
        fire(&mut chat, &mut scheduler);
        assert_eq!(chat.phase(), ChatPhase::AwaitingOutcome);
        let user_turns = chat
            .transcript()
            .iter()
            .filter(|message| message.speaker == ChatSpeaker::User)
            .count();
        assert_eq!(user_turns, 2);
    }

    #[test]
    fn stale_tokens_are_ignored() {
        let mut scheduler = ManualScheduler::new();
        let mut chat =
            RemediationChat::start("Paper jam", steps(), ChatDelays::default(), &mut scheduler);
        let token = chat.pending_token().expect("opening reply scheduled");
        chat.cancel(&mut scheduler);

        assert!(!chat.on_timer(token));
        assert_eq!(scheduler.pending(), 0);
        assert!(chat.transcript().is_empty());
    }

    #[test]
    fn resolved_requires_all_steps_and_reports_once() {
        let mut scheduler = ManualScheduler::new();
        let mut chat =
            RemediationChat::start("Paper jam", steps(), ChatDelays::default(), &mut scheduler);
        assert!(chat.ensure_can_report(true).is_err());
        fire(&mut chat, &mut scheduler);
        assert!(chat.ensure_can_report(true).is_err());
        assert!(chat.ensure_can_report(false).is_ok());

        for _ in 0..2 {
            chat.acknowledge(&mut scheduler).expect("ack");
            fire(&mut chat, &mut scheduler);
        }
        chat.ensure_can_report(true).expect("outcome prompt reached");
        chat.record_report(true);

        assert_eq!(chat.phase(), ChatPhase::Reported { resolved: true });
        assert!(chat.ensure_can_report(true).is_err());
        assert!(chat.ensure_can_report(false).is_err());
    }

    #[test]
    fn empty_solution_list_offers_complaint() {
        let mut scheduler = ManualScheduler::new();
        let mut chat =
            RemediationChat::start("Paper jam", Vec::new(), ChatDelays::default(), &mut scheduler);

        assert_eq!(chat.phase(), ChatPhase::NoSolutions);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(
            chat.transcript()[0].options,
            vec![ChatOption::ProceedToComplaint]
        );
        chat.ensure_can_report(false).expect("human support allowed");
        chat.record_report(false);
        assert_eq!(
            chat.transcript()[1].text,
            ChatOption::ProceedToComplaint.label()
        );
    }

    #[test]
    fn scheduler_trait_object_is_usable() {
        let mut scheduler = ManualScheduler::new();
        let dyn_scheduler: &mut dyn Scheduler = &mut scheduler;
        let chat = RemediationChat::start(
            "Paper jam",
            steps(),
            ChatDelays {
                opening: Duration::ZERO,
                step: Duration::ZERO,
            },
            dyn_scheduler,
        );
        assert!(chat.pending_token().is_some());
    }
}
