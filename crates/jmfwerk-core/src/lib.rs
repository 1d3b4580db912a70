// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// jmfwerk — Core types shared by the JMF client: the message envelope, the
// response validator, the error taxonomy and client configuration.

pub mod config;
pub mod envelope;
pub mod error;
pub mod response;
pub mod types;
pub mod xml;

pub use config::ClientConfig;
pub use envelope::Envelope;
pub use error::JmfError;
pub use response::{Response, ResponseValidator, Verdict};
pub use types::*;
