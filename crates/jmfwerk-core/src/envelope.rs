// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The JMF envelope: one message (a Command or a Query) under a `JMF` root
// that carries the device identity and submission timestamp.
//
// The envelope is an exclusively-owned builder.  Everything that mutates it
// (stamping, reference rewriting during packaging, reinitialization after a
// submission attempt) takes `&mut self`, so those steps cannot interleave.

use chrono::{SecondsFormat, Utc};

use crate::error::{JmfError, Result};
use crate::types::{
    JMF_NAMESPACE, JMF_VERSION, LOCAL_REFERENCE_SCHEME, MessageFamily, MessageId,
    SUBMIT_QUEUE_ENTRY,
};
use crate::xml::{self, Element};

const ROOT: &str = "JMF";
const DEVICE_ID: &str = "DeviceID";
const TIME_STAMP: &str = "TimeStamp";
const ID: &str = "ID";
const TYPE: &str = "Type";
const QUEUE_SUBMISSION_PARAMS: &str = "QueueSubmissionParams";
const URL: &str = "URL";

/// A single JMF message plus root-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    family: MessageFamily,
    root: Element,
}

impl Envelope {
    /// An empty envelope for the given family, with no message node yet.
    pub fn new(family: MessageFamily) -> Self {
        Self {
            family,
            root: empty_root(),
        }
    }

    /// An envelope holding a `Command` of the given type.
    pub fn command(message_type: &str) -> Self {
        Self::with_message(MessageFamily::Command, message_type)
    }

    /// An envelope holding a `Query` of the given type.
    pub fn query(message_type: &str) -> Self {
        Self::with_message(MessageFamily::Query, message_type)
    }

    fn with_message(family: MessageFamily, message_type: &str) -> Self {
        let mut envelope = Self::new(family);
        envelope.set_message(message_type);
        envelope
    }

    /// Parse an envelope prepared elsewhere.
    ///
    /// The root must be `JMF` and may hold at most one Command or Query.
    /// An envelope without a message node is treated as an empty Command.
    pub fn from_xml(bytes: &[u8]) -> Result<Self> {
        let root = xml::parse(bytes).map_err(|e| JmfError::Envelope(e.to_string()))?;
        if root.local_name() != ROOT {
            return Err(JmfError::Envelope(format!(
                "root element is <{}>, expected <{ROOT}>",
                root.name()
            )));
        }

        let family = {
            let mut families = root
                .elements()
                .filter_map(|el| MessageFamily::from_element_name(el.local_name()));
            let family = families.next().unwrap_or(MessageFamily::Command);
            if families.next().is_some() {
                return Err(JmfError::Envelope(
                    "envelope holds more than one Command/Query".into(),
                ));
            }
            family
        };

        Ok(Self { family, root })
    }

    pub fn family(&self) -> MessageFamily {
        self.family
    }

    /// The `JMF` root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The single Command or Query node, if present.
    pub fn message(&self) -> Option<&Element> {
        self.root
            .elements()
            .find(|el| MessageFamily::from_element_name(el.local_name()).is_some())
    }

    /// Mutable access to the message node, for collaborators that fill in
    /// command-specific content.
    pub fn message_mut(&mut self) -> Option<&mut Element> {
        self.root
            .elements_mut()
            .find(|el| MessageFamily::from_element_name(el.local_name()).is_some())
    }

    /// Install a fresh message node of the envelope's family, replacing any
    /// existing Command or Query.  Used to refill a reinitialized envelope.
    pub fn set_message(&mut self, message_type: &str) {
        self.root
            .retain_elements(|el| MessageFamily::from_element_name(el.local_name()).is_none());
        self.root
            .push_child(Element::new(self.family.element_name()).with_attr(TYPE, message_type));
    }

    pub fn message_type(&self) -> Option<&str> {
        self.message().and_then(|m| m.attr(TYPE))
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message().and_then(|m| m.attr(ID))
    }

    pub fn device_id(&self) -> Option<&str> {
        self.root.attr(DEVICE_ID)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.root.attr(TIME_STAMP)
    }

    /// Set `DeviceID`, overwriting any previous value.
    pub fn set_device(&mut self, device_id: &str) {
        self.root.set_attr(DEVICE_ID, device_id);
    }

    /// Stamp the submission metadata: `TimeStamp` on the root and a fresh
    /// `ID` on the message node.
    ///
    /// Returns the assigned ID, or `None` when there is no message node.
    pub fn stamp(&mut self) -> Option<MessageId> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        self.root.set_attr(TIME_STAMP, now);

        let message = self.message_mut()?;
        let id = MessageId::new();
        message.set_attr(ID, id.as_str());
        Some(id)
    }

    /// Canonical XML bytes of the envelope.
    pub fn serialize(&self) -> Vec<u8> {
        self.root.to_document()
    }

    /// Drop all content and start over as an empty envelope of `family`.
    pub fn reinitialize(&mut self, family: MessageFamily) {
        self.family = family;
        self.root = empty_root();
    }

    /// Whether the message is a `SubmitQueueEntry` command.
    pub fn is_submit_queue_entry(&self) -> bool {
        self.family == MessageFamily::Command
            && self.message().is_some_and(|m| {
                m.local_name() == "Command" && m.attr(TYPE) == Some(SUBMIT_QUEUE_ENTRY)
            })
    }

    /// `QueueSubmissionParams/@URL` of a `SubmitQueueEntry` command.
    pub fn submission_url(&self) -> Option<&str> {
        if !self.is_submit_queue_entry() {
            return None;
        }
        self.message()?.child(QUEUE_SUBMISSION_PARAMS)?.attr(URL)
    }

    /// Point the submission parameters at `url`, creating the
    /// `QueueSubmissionParams` element if needed.
    ///
    /// Returns `false` (and changes nothing) unless the envelope carries a
    /// `SubmitQueueEntry` command.
    pub fn set_submission_url(&mut self, url: &str) -> bool {
        if !self.is_submit_queue_entry() {
            return false;
        }
        let Some(message) = self.message_mut() else {
            return false;
        };
        match message.child_mut(QUEUE_SUBMISSION_PARAMS) {
            Some(params) => params.set_attr(URL, url),
            None => message.push_child(Element::new(QUEUE_SUBMISSION_PARAMS).with_attr(URL, url)),
        }
        true
    }

    /// Whether the submission references a job ticket by `cid://`, i.e. the
    /// ticket must travel in the same multipart body.
    pub fn references_local_file(&self) -> bool {
        self.submission_url()
            .is_some_and(|url| url.starts_with(LOCAL_REFERENCE_SCHEME))
    }
}

fn empty_root() -> Element {
    Element::new(ROOT)
        .with_attr("xmlns", JMF_NAMESPACE)
        .with_attr("Version", JMF_VERSION)
}
