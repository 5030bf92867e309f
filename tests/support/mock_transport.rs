//! Scriptable transport stub for dispatch scenarios
//!
//! The mock plays back a script of per-attempt outcomes and then falls
//! through to a default (success, or a fixed error), while counting every
//! attempt for verification.
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use lettre::Message;
use parking_lot::Mutex;
use postage::{Transport, TransportError};

pub struct MockTransport {
    script: Mutex<VecDeque<Result<String, TransportError>>>,
    fallback_error: Option<TransportError>,
    hang: bool,
    attempts: AtomicUsize,
}

impl MockTransport {
    /// Every attempt succeeds with a generated message id (`mock-1`,
    /// `mock-2`, ...).
    pub fn succeeding() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback_error: None,
            hang: false,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Every attempt fails with a clone of `error`.
    pub fn always_failing(error: TransportError) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback_error: Some(error),
            hang: false,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Play back `outcomes` one per attempt, then succeed.
    pub fn scripted(outcomes: impl IntoIterator<Item = Result<String, TransportError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            fallback_error: None,
            hang: false,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Every attempt is counted, then never completes.
    pub fn hanging() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback_error: None,
            hang: true,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of send attempts observed so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, _message: &Message) -> Result<String, TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self.hang {
            std::future::pending::<()>().await;
        }

        if let Some(outcome) = self.script.lock().pop_front() {
            return outcome;
        }

        match &self.fallback_error {
            Some(error) => Err(error.clone()),
            None => Ok(format!("mock-{attempt}")),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
