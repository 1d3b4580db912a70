// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JMF response parsing and classification.
//
// A server answers every message with a `Response` element.  Its
// `ReturnCode` decides the outcome: zero or negative is success, positive is
// a protocol-level failure whose human-readable reason sits in
// `Notification/Comment`.

use crate::error::{JmfError, Result};
use crate::types::{JMF_NAMESPACE, JMF_VERSION};
use crate::xml::{self, Element};

/// A validated JMF response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    return_code: i32,
    response_type: Option<String>,
    ref_id: Option<String>,
    comment: Option<String>,
    raw: Vec<u8>,
}

/// Outcome of classifying a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    /// Carries the server comment, empty when the server sent none.
    Failure(String),
}

impl Response {
    pub fn new(return_code: i32) -> Self {
        Self {
            return_code,
            response_type: None,
            ref_id: None,
            comment: None,
            raw: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    pub fn return_code(&self) -> i32 {
        self.return_code
    }

    pub fn response_type(&self) -> Option<&str> {
        self.response_type.as_deref()
    }

    /// ID of the message this response answers.
    pub fn ref_id(&self) -> Option<&str> {
        self.ref_id.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Bytes the response was parsed from (empty for constructed responses).
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_success(&self) -> bool {
        self.return_code <= 0
    }

    /// Render as a JMF document, e.g. for test servers and fixtures.
    pub fn serialize(&self) -> Vec<u8> {
        let mut response =
            Element::new("Response").with_attr("ReturnCode", self.return_code.to_string());
        if let Some(response_type) = &self.response_type {
            response.set_attr("Type", response_type.as_str());
        }
        if let Some(ref_id) = &self.ref_id {
            response.set_attr("refID", ref_id.as_str());
        }
        if let Some(comment) = &self.comment {
            let class = if self.is_success() { "Information" } else { "Error" };
            response.push_child(
                Element::new("Notification")
                    .with_attr("Class", class)
                    .with_child(Element::new("Comment").with_text(comment.as_str())),
            );
        }

        Element::new("JMF")
            .with_attr("xmlns", JMF_NAMESPACE)
            .with_attr("Version", JMF_VERSION)
            .with_child(response)
            .to_document()
    }
}

/// Parses raw response bodies and classifies them.
pub struct ResponseValidator;

impl ResponseValidator {
    /// Parse `bytes` into a [`Response`].
    ///
    /// Fails with [`JmfError::ResponseParse`], carrying the raw bytes, when
    /// the body is not well-formed XML, holds no `Response` element, or the
    /// `ReturnCode` is not an integer.  A missing `ReturnCode` reads as 0.
    pub fn parse(bytes: &[u8]) -> Result<Response> {
        let fail = |detail: String| JmfError::ResponseParse {
            detail,
            raw: bytes.to_vec(),
        };

        let root = xml::parse(bytes).map_err(|e| fail(e.to_string()))?;
        let element = root
            .find("Response")
            .ok_or_else(|| fail(format!("no Response element under <{}>", root.name())))?;

        let return_code = match element.attr("ReturnCode") {
            Some(code) => code
                .trim()
                .parse::<i32>()
                .map_err(|_| fail(format!("ReturnCode {code:?} is not an integer")))?,
            None => 0,
        };

        let comment = element
            .child("Notification")
            .and_then(|n| n.child("Comment"))
            .map(Element::text);

        Ok(Response {
            return_code,
            response_type: element.attr("Type").map(str::to_owned),
            ref_id: element.attr("refID").map(str::to_owned),
            comment,
            raw: bytes.to_vec(),
        })
    }

    /// Success when `ReturnCode <= 0`, otherwise failure with the comment.
    pub fn classify(response: &Response) -> Verdict {
        if response.is_success() {
            Verdict::Success
        } else {
            Verdict::Failure(response.comment().unwrap_or_default().to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_failure_with_comment() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
            <JMF xmlns="http://www.CIP4.org/JDFSchema_1_1" Version="1.3">
              <Response ID="R1" refID="M42" Type="SubmitQueueEntry" ReturnCode="5">
                <Notification Class="Error"><Comment>Queue full</Comment></Notification>
              </Response>
            </JMF>"#;
        let response = ResponseValidator::parse(body).expect("parse");
        assert_eq!(response.return_code(), 5);
        assert_eq!(response.ref_id(), Some("M42"));
        assert_eq!(response.response_type(), Some("SubmitQueueEntry"));
        assert_eq!(
            ResponseValidator::classify(&response),
            Verdict::Failure("Queue full".into())
        );
        assert_eq!(response.raw(), &body[..]);
    }

    #[test]
    fn negative_return_code_is_success() {
        let response = ResponseValidator::parse(br#"<JMF><Response ReturnCode="-1"/></JMF>"#)
            .expect("parse");
        assert_eq!(ResponseValidator::classify(&response), Verdict::Success);
    }

    #[test]
    fn missing_return_code_defaults_to_success() {
        let response = ResponseValidator::parse(b"<JMF><Response Type=\"Status\"/></JMF>")
            .expect("parse");
        assert_eq!(response.return_code(), 0);
        assert!(response.is_success());
    }

    #[test]
    fn failure_without_comment_has_empty_message() {
        let response =
            ResponseValidator::parse(br#"<JMF><Response ReturnCode="3"/></JMF>"#).expect("parse");
        assert_eq!(
            ResponseValidator::classify(&response),
            Verdict::Failure(String::new())
        );
    }

    #[test]
    fn malformed_bodies_keep_raw_bytes() {
        for body in [
            &b"<html><body>502 Bad Gateway"[..],
            &b"<JMF><Signal/></JMF>"[..],
            &b"<JMF><Response ReturnCode=\"five\"/></JMF>"[..],
            &b""[..],
        ] {
            match ResponseValidator::parse(body) {
                Err(JmfError::ResponseParse { raw, .. }) => assert_eq!(raw, body),
                other => panic!("expected parse error for {body:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn serialize_then_parse_recovers_code_and_comment() {
        let cases = [
            Response::new(0),
            Response::new(5).with_comment("Queue full"),
            Response::new(-2).with_comment("held <for> review & later"),
            Response::new(112)
                .with_type("SubmitQueueEntry")
                .with_ref_id("M1")
                .with_comment("Unknown device"),
            Response::new(7).with_comment("  padded  "),
            Response::new(8).with_comment("\n\tline one\nline two\n"),
            Response::new(9).with_comment("   "),
        ];
        for original in cases {
            let parsed = ResponseValidator::parse(&original.serialize()).expect("parse");
            assert_eq!(parsed.return_code(), original.return_code());
            assert_eq!(parsed.comment(), original.comment());
            assert_eq!(parsed.response_type(), original.response_type());
            assert_eq!(parsed.ref_id(), original.ref_id());
        }
    }
}
