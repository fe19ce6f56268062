// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskToken(u64);

impl TaskToken {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Deferred wake-ups. The owner of a token is told when it fires and must
/// ignore tokens it no longer expects.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TaskToken;
    fn cancel(&mut self, token: TaskToken);
}

/// Records scheduled tokens and fires them only when asked.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pending: BTreeSet<TaskToken>,
    delays: Vec<Duration>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains every pending token in schedule order.
    pub fn fire_all(&mut self) -> Vec<TaskToken> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn requested_delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TaskToken {
        self.next += 1;
        let token = TaskToken(self.next);
        self.pending.insert(token);
        self.delays.push(delay);
        token
    }

    fn cancel(&mut self, token: TaskToken) {
        self.pending.remove(&token);
    }
}
