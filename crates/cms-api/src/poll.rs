// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const STOP_CHECK: Duration = Duration::from_millis(50);

/// Fixed-interval refresher. Every tick runs the fetch on its own thread, so
/// a slow response never delays the next tick and several requests may be
/// in flight at once. Each result is handed to `deliver` as it arrives.
#[derive(Debug)]
pub struct Poller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Fetches immediately, then once per `interval` until stopped.
    pub fn spawn<T, F, D>(interval: Duration, fetch: F, deliver: D) -> Self
    where
        T: Send + 'static,
        F: Fn() -> Result<T> + Send + Sync + 'static,
        D: Fn(Result<T>) + Send + Sync + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let fetch = Arc::new(fetch);
        let deliver = Arc::new(deliver);
        let timer_stop = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            while !timer_stop.load(Ordering::Relaxed) {
                let fetch = Arc::clone(&fetch);
                let deliver = Arc::clone(&deliver);
                let tick_stop = Arc::clone(&timer_stop);
                thread::spawn(move || {
                    let result = fetch();
                    if !tick_stop.load(Ordering::Relaxed) {
                        deliver(result);
                    }
                });

                let next_tick = Instant::now() + interval;
                while !timer_stop.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    if now >= next_tick {
                        break;
                    }
                    thread::sleep(STOP_CHECK.min(next_tick - now));
                }
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops scheduling new ticks. Requests already in flight finish but
    /// their results are dropped.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
