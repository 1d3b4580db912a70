// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP transport for JMF messages.
//
// JMF is a plain request/response protocol over HTTP POST.  The dispatcher
// only needs "send these bytes with this Content-Type, give me the body
// back", so that is the whole `Transport` seam; tests substitute scripted
// transports behind it.

use thiserror::Error;
use tracing::{debug, instrument};

use jmfwerk_core::ClientConfig;
use jmfwerk_core::error::{JmfError, Result};

/// No response body could be obtained (connect, timeout, read failure).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Blocking request/response channel to a JMF endpoint.
pub trait Transport {
    /// POST `body` to `url` and return the raw response body.
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &[u8],
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &[u8],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).post(url, content_type, body)
    }
}

/// `reqwest` blocking client bound to the configured timeout.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build the HTTP client.  Failure here means the TLS backend or system
    /// configuration is unusable, which is a configuration error.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| JmfError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, body), fields(len = body.len()))]
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &[u8],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body.to_vec())
            .send()
            .map_err(|e| TransportError(format!("POST {url}: {e}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| TransportError(format!("reading response from {url}: {e}")))?;
        debug!(status = %status, received = bytes.len(), "HTTP response");

        // An error status with a body is still handed to the validator; an
        // error status with nothing to validate counts as no response.
        if !status.is_success() && bytes.is_empty() {
            return Err(TransportError(format!(
                "POST {url} returned HTTP {status} with an empty body"
            )));
        }
        Ok(bytes.to_vec())
    }
}
