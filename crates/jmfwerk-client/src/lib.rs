// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// jmfwerk Client — blocking submission of JMF envelopes to a print workflow
// server.  Bridges the envelope and response types of `jmfwerk-core` with
// the HTTP transport, MIME packaging of `cid://` job tickets, and the bounded
// retry loop.

pub mod dispatcher;
pub mod mime;
pub mod observer;
pub mod retry;
pub mod transport;

pub use dispatcher::{Dispatcher, SubmissionReport};
pub use mime::{MimePackager, MimePart, Package};
pub use observer::{SubmissionObserver, TracingObserver};
pub use retry::{RetryDecision, RetryPolicy};
pub use transport::{HttpTransport, Transport, TransportError};
