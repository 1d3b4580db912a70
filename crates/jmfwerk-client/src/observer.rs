// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission observers.
//
// The dispatcher reports every step of a submission to an injected observer
// instead of logging on its own.  Observers are purely observational: they
// cannot change the outcome.  `TracingObserver` is the default and forwards
// everything to `tracing`.

use tracing::{debug, info, warn};

use jmfwerk_core::error::JmfError;
use jmfwerk_core::{Response, SubmissionAttempt};

/// Receives the progress of a submission.  All methods default to no-ops.
pub trait SubmissionObserver: Send + Sync {
    /// About to send `payload` for attempt `attempt` (1-based).
    fn attempt_started(&self, _attempt: u32, _url: &str, _content_type: &str, _payload: &[u8]) {}

    /// An attempt ended, successfully or not.
    fn attempt_finished(&self, _attempt: &SubmissionAttempt) {}

    /// A failed attempt will be followed by another one.
    fn retrying(&self, _failed: &SubmissionAttempt, _remaining: u32) {}

    /// The submission returned a validated response.
    fn succeeded(&self, _response: &Response, _attempts: u32) {}

    /// The submission ended with `error`.
    fn failed(&self, _error: &JmfError) {}
}

/// Forwards submission progress to `tracing`.
///
/// Payloads and raw responses go out at debug level; retries at warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SubmissionObserver for TracingObserver {
    fn attempt_started(&self, attempt: u32, url: &str, content_type: &str, payload: &[u8]) {
        debug!(
            attempt,
            url,
            content_type,
            payload = %String::from_utf8_lossy(payload),
            "sending JMF payload"
        );
    }

    fn attempt_finished(&self, attempt: &SubmissionAttempt) {
        let response = attempt.response_text().unwrap_or_default();
        debug!(
            attempt = attempt.index,
            outcome = ?attempt.outcome,
            response = %response,
            "JMF attempt finished"
        );
    }

    fn retrying(&self, failed: &SubmissionAttempt, remaining: u32) {
        warn!(
            attempt = failed.index,
            outcome = ?failed.outcome,
            detail = %failed.detail,
            remaining,
            "JMF attempt failed, retrying"
        );
    }

    fn succeeded(&self, response: &Response, attempts: u32) {
        info!(
            return_code = response.return_code(),
            attempts,
            "JMF submission accepted"
        );
    }

    fn failed(&self, error: &JmfError) {
        warn!(error = %error, "JMF submission failed");
    }
}
