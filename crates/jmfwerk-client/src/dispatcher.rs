// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JMF submission: stamp, choose the payload, send with bounded retry,
// validate the answer.
//
// Each attempt ends in one of four states:
//
//   Sent -> TransportFailed   no bytes came back       -> Submission error
//        -> ParseFailed       bytes are not a Response -> ResponseParse error
//        -> ReturnCodeFailed  ReturnCode > 0           -> ReturnCode error
//        -> Succeeded         ReturnCode <= 0          -> returned at once
//
// Failures are absorbed while the retry budget lasts; only the last
// attempt's failure reaches the caller.

use tracing::instrument;

use jmfwerk_core::error::{JmfError, Result};
use jmfwerk_core::types::JMF_MEDIA_TYPE;
use jmfwerk_core::{
    AttemptOutcome, ClientConfig, Envelope, Response, ResponseValidator, SubmissionAttempt,
    Verdict,
};

use crate::mime::MimePackager;
use crate::observer::{SubmissionObserver, TracingObserver};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transport::{HttpTransport, Transport, TransportError};

/// A successful submission with the history of every attempt.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub response: Response,
    pub attempts: Vec<SubmissionAttempt>,
}

/// Request body and its Content-Type, fixed for the whole retry loop.
struct Payload {
    body: Vec<u8>,
    content_type: String,
}

/// Sends JMF envelopes to a server.
///
/// One `Dispatcher` can serve many sequential submissions.  A submission
/// borrows its envelope exclusively, so no two submissions can mutate the
/// same envelope at once.
pub struct Dispatcher<T = HttpTransport> {
    transport: T,
    config: ClientConfig,
    policy: RetryPolicy,
    packager: MimePackager,
    observer: Box<dyn SubmissionObserver>,
}

impl Dispatcher<HttpTransport> {
    /// Dispatcher over HTTP, configured from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Dispatcher over any transport.  Logging goes to `tracing` until
    /// [`with_observer`](Self::with_observer) says otherwise.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::from_config(&config),
            packager: MimePackager::from_config(&config),
            observer: Box::new(TracingObserver),
            config,
        }
    }

    /// Replace the observer that receives submission progress.
    pub fn with_observer(mut self, observer: impl SubmissionObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit `envelope` and return the validated response.
    ///
    /// `target` overrides the configured default URL.  With
    /// `reinitialize_after`, the envelope is reset to an empty message of
    /// the same family after every attempt, whatever its outcome.
    pub fn submit(
        &self,
        envelope: &mut Envelope,
        target: Option<&str>,
        reinitialize_after: bool,
    ) -> Result<Response> {
        self.submit_with_report(envelope, target, reinitialize_after)
            .map(|report| report.response)
    }

    /// Like [`submit`](Self::submit), but also returns every attempt made.
    #[instrument(skip_all, fields(message_type = envelope.message_type().unwrap_or("-")))]
    pub fn submit_with_report(
        &self,
        envelope: &mut Envelope,
        target: Option<&str>,
        reinitialize_after: bool,
    ) -> Result<SubmissionReport> {
        let url = self.config.resolve_url(target)?.to_owned();

        if envelope.device_id().is_none() {
            if let Some(device_id) = &self.config.device_id {
                envelope.set_device(device_id);
            }
        }
        envelope.stamp();
        let family = envelope.family();

        // Built once.  Retries resend these exact bytes even when the
        // envelope has been reinitialized in between.
        let payload = match self.prepare_payload(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                self.observer.failed(&e);
                return Err(e);
            }
        };

        let mut attempts = Vec::new();
        let mut index = 0;
        loop {
            index += 1;
            self.observer
                .attempt_started(index, &url, &payload.content_type, &payload.body);
            let sent = self
                .transport
                .post(&url, &payload.content_type, &payload.body);

            if reinitialize_after {
                envelope.reinitialize(family);
            }

            let (attempt, result) = evaluate(index, sent);
            self.observer.attempt_finished(&attempt);

            match result {
                Ok(response) => {
                    attempts.push(attempt);
                    self.observer.succeeded(&response, index);
                    return Ok(SubmissionReport { response, attempts });
                }
                Err(error) => match self.policy.after_failure(index) {
                    RetryDecision::Retry { remaining } => {
                        self.observer.retrying(&attempt, remaining);
                        attempts.push(attempt);
                    }
                    RetryDecision::Exhausted => {
                        self.observer.failed(&error);
                        return Err(error);
                    }
                },
            }
        }
    }

    /// Multipart container for `cid://` SubmitQueueEntry commands, the bare
    /// envelope for everything else.
    fn prepare_payload(&self, envelope: &mut Envelope) -> Result<Payload> {
        if envelope.is_submit_queue_entry() && envelope.references_local_file() {
            let package = self.packager.package(envelope)?;
            Ok(Payload {
                content_type: package.content_type(),
                body: package.body,
            })
        } else {
            Ok(Payload {
                body: envelope.serialize(),
                content_type: JMF_MEDIA_TYPE.to_owned(),
            })
        }
    }
}

/// Classify one attempt.  The error is what the caller sees if this turns
/// out to be the last attempt.
fn evaluate(
    index: u32,
    sent: std::result::Result<Vec<u8>, TransportError>,
) -> (SubmissionAttempt, Result<Response>) {
    let raw = match sent {
        Ok(raw) => raw,
        Err(TransportError(detail)) => {
            let attempt = SubmissionAttempt {
                index,
                outcome: AttemptOutcome::TransportFailed,
                raw_response: None,
                detail: detail.clone(),
            };
            let error = JmfError::Submission {
                attempts: index,
                detail,
            };
            return (attempt, Err(error));
        }
    };

    let response = match ResponseValidator::parse(&raw) {
        Ok(response) => response,
        Err(error) => {
            let attempt = SubmissionAttempt {
                index,
                outcome: AttemptOutcome::ParseFailed,
                raw_response: Some(raw),
                detail: error.to_string(),
            };
            return (attempt, Err(error));
        }
    };

    match ResponseValidator::classify(&response) {
        Verdict::Success => {
            let attempt = SubmissionAttempt {
                index,
                outcome: AttemptOutcome::Succeeded,
                raw_response: Some(raw),
                detail: String::new(),
            };
            (attempt, Ok(response))
        }
        Verdict::Failure(message) => {
            let attempt = SubmissionAttempt {
                index,
                outcome: AttemptOutcome::ReturnCodeFailed,
                raw_response: Some(raw),
                detail: message.clone(),
            };
            let error = JmfError::ReturnCode {
                code: response.return_code(),
                message,
            };
            (attempt, Err(error))
        }
    }
}
