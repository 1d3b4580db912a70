// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the JMF job-messaging client.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// XML namespace of JMF/JDF 1.x documents.
pub const JMF_NAMESPACE: &str = "http://www.CIP4.org/JDFSchema_1_1";

/// Protocol version written on every envelope root.
pub const JMF_VERSION: &str = "1.3";

/// Media type of a bare JMF message.
pub const JMF_MEDIA_TYPE: &str = "application/vnd.cip4-jmf+xml";

/// Media type of a JDF job ticket.
pub const JDF_MEDIA_TYPE: &str = "application/vnd.cip4-jdf+xml";

/// Media type of the container bundling a message with its job ticket.
pub const MULTIPART_RELATED: &str = "multipart/related";

/// URL scheme marking content carried in the same multipart transmission.
pub const LOCAL_REFERENCE_SCHEME: &str = "cid://";

/// Command type that submits a job ticket to the device queue.
pub const SUBMIT_QUEUE_ENTRY: &str = "SubmitQueueEntry";

/// Which kind of message node an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageFamily {
    Command,
    Query,
}

impl MessageFamily {
    /// Element name of the message node.
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::Command => "Command",
            Self::Query => "Query",
        }
    }

    /// Inverse of [`element_name`](Self::element_name), matched on local name.
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "Command" => Some(Self::Command),
            "Query" => Some(Self::Query),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Opaque submission identifier assigned to the message node's `ID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// A fresh identifier. XML IDs may not start with a digit, hence the
    /// leading letter.
    pub fn new() -> Self {
        Self(format!("M{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a single transmission attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// No response bytes were obtained (connect, timeout, read failure).
    TransportFailed,
    /// Bytes arrived but were not a well-formed JMF response.
    ParseFailed,
    /// Well-formed response with a positive `ReturnCode`.
    ReturnCodeFailed,
    /// Well-formed response with `ReturnCode <= 0`.
    Succeeded,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Record of one transmission attempt.
#[derive(Debug, Clone)]
pub struct SubmissionAttempt {
    /// 1-based attempt ordinal.
    pub index: u32,
    pub outcome: AttemptOutcome,
    /// Raw response body, absent on transport failure.
    pub raw_response: Option<Vec<u8>>,
    /// Failure description (transport error text, parse error, or server
    /// comment). Empty on success.
    pub detail: String,
}

impl SubmissionAttempt {
    /// Response body rendered lossily as text, for logging.
    pub fn response_text(&self) -> Option<String> {
        self.raw_response
            .as_deref()
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
    }
}
