// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for jmfwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all jmfwerk operations.
#[derive(Debug, Error)]
pub enum JmfError {
    // -- Submission outcomes (raised after the retry budget is spent) --
    #[error("JMF submission failed after {attempts} attempt(s): {detail}")]
    Submission { attempts: u32, detail: String },

    #[error("JMF response could not be parsed: {detail}")]
    ResponseParse { detail: String, raw: Vec<u8> },

    #[error("JMF server returned code {code}: {message}")]
    ReturnCode { code: i32, message: String },

    // -- Environment (never retried) --
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot read referenced file {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -- Message content --
    #[error("malformed JMF envelope: {0}")]
    Envelope(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JmfError {
    /// Whether this error comes from the environment (missing URL, unusable
    /// transport, unreadable attachment) rather than from the server.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Attachment { .. } | Self::Io(_) | Self::Serialization(_)
        )
    }

    /// Raw response bytes attached to a parse failure, if any.
    pub fn raw_response(&self) -> Option<&[u8]> {
        match self {
            Self::ResponseParse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, JmfError>;
