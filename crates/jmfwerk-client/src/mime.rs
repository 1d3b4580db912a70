// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// multipart/related packaging of a SubmitQueueEntry with its job ticket.
//
// When the submission parameters reference the ticket as `cid://<path>`, the
// ticket travels in the same HTTP body as the message.  The container has
// two base64 parts: the JMF envelope, then the JDF ticket under the fixed
// Content-ID `1.JDF`, which the envelope's reference is rewritten to.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use jmfwerk_core::error::{JmfError, Result};
use jmfwerk_core::types::{
    JDF_MEDIA_TYPE, JMF_MEDIA_TYPE, LOCAL_REFERENCE_SCHEME, MULTIPART_RELATED,
};
use jmfwerk_core::{ClientConfig, Envelope};

/// Content-ID of the job ticket part.
pub const TICKET_CONTENT_ID: &str = "1.JDF";

/// Content-ID of the message part when the envelope carries no ID.
const FALLBACK_MESSAGE_CID: &str = "message.jmf";

/// base64 line width (RFC 2045).
pub const LINE_WIDTH: usize = 76;

const CRLF: &[u8] = b"\r\n";

/// One body part of the container.  Transfer encoding is always base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimePart {
    pub content_id: String,
    pub media_type: String,
    pub payload: Vec<u8>,
}

impl MimePart {
    fn write_to(&self, out: &mut Vec<u8>, boundary: &str) {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(format!("Content-Type: {}\r\n", self.media_type).as_bytes());
        out.extend_from_slice(b"Content-Transfer-Encoding: base64\r\n");
        out.extend_from_slice(format!("Content-ID: <{}>\r\n", self.content_id).as_bytes());
        out.extend_from_slice(CRLF);
        write_base64(out, &self.payload);
    }
}

/// A finished container ready to be POSTed.
#[derive(Debug, Clone)]
pub struct Package {
    pub body: Vec<u8>,
    pub boundary: String,
}

impl Package {
    /// HTTP `Content-Type` for the container.
    pub fn content_type(&self) -> String {
        content_type(&self.boundary)
    }
}

fn content_type(boundary: &str) -> String {
    format!("{MULTIPART_RELATED}; boundary=\"{boundary}\"; type=\"{JMF_MEDIA_TYPE}\"")
}

/// Builds multipart containers for `cid://` submissions.
#[derive(Debug, Clone, Default)]
pub struct MimePackager {
    /// Base directory for relative references.
    attachment_dir: Option<PathBuf>,
}

impl MimePackager {
    pub fn new(attachment_dir: Option<PathBuf>) -> Self {
        Self { attachment_dir }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.attachment_dir.clone())
    }

    /// File-system path a `cid://` reference points at.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let reference = url.strip_prefix(LOCAL_REFERENCE_SCHEME)?;
        if reference.is_empty() {
            return None;
        }
        let path = Path::new(reference);
        Some(match &self.attachment_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        })
    }

    /// Package the envelope and its referenced job ticket.
    ///
    /// The ticket is read before anything is changed, so a failed read leaves
    /// the envelope untouched.  On success the envelope's reference points
    /// at `cid://1.JDF`, and the serialized envelope inside the container
    /// already carries that rewritten reference.
    #[instrument(skip_all, fields(message_id = envelope.message_id().unwrap_or("-")))]
    pub fn package(&self, envelope: &mut Envelope) -> Result<Package> {
        let url = envelope
            .submission_url()
            .filter(|url| url.starts_with(LOCAL_REFERENCE_SCHEME))
            .ok_or_else(|| {
                JmfError::Envelope("submission does not reference a cid:// job ticket".into())
            })?
            .to_owned();
        let path = self
            .resolve(&url)
            .ok_or_else(|| JmfError::Envelope(format!("empty local reference {url:?}")))?;

        let boundary = new_boundary();

        let ticket = std::fs::read(&path).map_err(|source| JmfError::Attachment {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), size = ticket.len(), "read job ticket");

        envelope.set_submission_url(&format!("{LOCAL_REFERENCE_SCHEME}{TICKET_CONTENT_ID}"));

        let message_part = MimePart {
            content_id: envelope
                .message_id()
                .unwrap_or(FALLBACK_MESSAGE_CID)
                .to_owned(),
            media_type: JMF_MEDIA_TYPE.to_owned(),
            payload: envelope.serialize(),
        };
        let ticket_part = MimePart {
            content_id: TICKET_CONTENT_ID.to_owned(),
            media_type: JDF_MEDIA_TYPE.to_owned(),
            payload: ticket,
        };

        let description = format!(
            "JMF {} with JDF job ticket",
            envelope.message_type().unwrap_or("message")
        );
        let body = encode(&boundary, &description, &[message_part, ticket_part]);
        debug!(size = body.len(), "built multipart container");

        Ok(Package { body, boundary })
    }
}

/// 32 random alphanumeric characters.
fn new_boundary() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Serialize a complete container, closing boundary included.
pub fn encode(boundary: &str, description: &str, parts: &[MimePart]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"MIME-Version: 1.0\r\n");
    out.extend_from_slice(format!("Content-Description: {description}\r\n").as_bytes());
    out.extend_from_slice(format!("Content-Type: {}\r\n", content_type(boundary)).as_bytes());
    out.extend_from_slice(CRLF);
    for part in parts {
        part.write_to(&mut out, boundary);
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

fn write_base64(out: &mut Vec<u8>, payload: &[u8]) {
    let encoded = STANDARD.encode(payload);
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.extend_from_slice(line);
        out.extend_from_slice(CRLF);
    }
}

/// The container could not be read back.
#[derive(Debug, Clone, Error)]
#[error("malformed multipart container: {0}")]
pub struct MimeError(pub String);

/// Read a container produced by [`encode`] back into its parts.
///
/// Only the features this crate writes are understood: a top-level header
/// block naming the boundary, and base64 parts.
pub fn decode(body: &[u8]) -> std::result::Result<Vec<MimePart>, MimeError> {
    let text = std::str::from_utf8(body).map_err(|e| MimeError(format!("not ASCII: {e}")))?;
    let (headers, rest) = text
        .split_once("\r\n\r\n")
        .ok_or_else(|| MimeError("no header block".into()))?;
    let boundary = header(headers, "Content-Type")
        .and_then(boundary_param)
        .ok_or_else(|| MimeError("no boundary parameter".into()))?;

    let delimiter = format!("--{boundary}");
    let mut sections = rest.split(delimiter.as_str());
    // Preamble before the first delimiter.
    sections.next();

    let mut parts = Vec::new();
    let mut closed = false;
    for section in sections {
        if section.starts_with("--") {
            closed = true;
            break;
        }
        let section = section.trim_start_matches("\r\n");
        let (part_headers, encoded) = section
            .split_once("\r\n\r\n")
            .ok_or_else(|| MimeError("part without header block".into()))?;

        let content_id = header(part_headers, "Content-ID")
            .map(|id| id.trim_start_matches('<').trim_end_matches('>').to_owned())
            .ok_or_else(|| MimeError("part without Content-ID".into()))?;
        let media_type = header(part_headers, "Content-Type")
            .ok_or_else(|| MimeError(format!("part <{content_id}> without Content-Type")))?
            .to_owned();
        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let payload = STANDARD
            .decode(compact)
            .map_err(|e| MimeError(format!("part <{content_id}>: {e}")))?;

        parts.push(MimePart {
            content_id,
            media_type,
            payload,
        });
    }

    if !closed {
        return Err(MimeError("missing closing boundary".into()));
    }
    Ok(parts)
}

fn header<'a>(block: &'a str, name: &str) -> Option<&'a str> {
    block.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

fn boundary_param(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        (key.trim() == "boundary").then(|| value.trim().trim_matches('"'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmfwerk_core::types::SUBMIT_QUEUE_ENTRY;

    fn submit_envelope(url: &str) -> Envelope {
        let mut envelope = Envelope::command(SUBMIT_QUEUE_ENTRY);
        envelope.set_device("PRESS1");
        envelope.set_submission_url(url);
        envelope.stamp();
        envelope
    }

    #[test]
    fn ticket_part_matches_rewritten_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("ticket.xml"), b"abc").expect("write ticket");

        let packager = MimePackager::new(Some(dir.path().to_path_buf()));
        let mut envelope = submit_envelope("cid://ticket.xml");
        let package = packager.package(&mut envelope).expect("package");

        assert_eq!(envelope.submission_url(), Some("cid://1.JDF"));
        let text = String::from_utf8(package.body.clone()).expect("ascii");
        assert!(text.contains("YWJj"));

        let parts = decode(&package.body).expect("decode");
        assert_eq!(parts.len(), 2);
        let rewritten = envelope
            .submission_url()
            .and_then(|url| url.strip_prefix(LOCAL_REFERENCE_SCHEME))
            .expect("cid reference");
        let ticket = parts
            .iter()
            .find(|part| part.content_id == rewritten)
            .expect("part for rewritten reference");
        assert_eq!(ticket.content_id, "1.JDF");
        assert_eq!(ticket.payload, b"abc");
        assert_eq!(ticket.media_type, JDF_MEDIA_TYPE);
    }

    #[test]
    fn message_part_is_the_rewritten_envelope() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("job.jdf"), b"<JDF/>").expect("write ticket");

        let packager = MimePackager::new(Some(dir.path().to_path_buf()));
        let mut envelope = submit_envelope("cid://job.jdf");
        let package = packager.package(&mut envelope).expect("package");

        let parts = decode(&package.body).expect("decode");
        let message = &parts[0];
        assert_eq!(Some(message.content_id.as_str()), envelope.message_id());
        assert_eq!(message.media_type, JMF_MEDIA_TYPE);
        assert_eq!(message.payload, envelope.serialize());
    }

    #[test]
    fn container_is_closed_and_lines_are_wrapped() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("big.jdf"), vec![b'x'; 1000]).expect("write ticket");

        let packager = MimePackager::new(Some(dir.path().to_path_buf()));
        let mut envelope = submit_envelope("cid://big.jdf");
        let package = packager.package(&mut envelope).expect("package");
        let text = String::from_utf8(package.body.clone()).expect("ascii");

        assert!(text.ends_with(&format!("--{}--\r\n", package.boundary)));
        let body_lines: Vec<&str> = text.split("\r\n").filter(|line| !line.contains(':')).collect();
        assert!(body_lines.iter().all(|line| line.len() <= LINE_WIDTH));
        assert!(body_lines.iter().any(|line| line.len() == LINE_WIDTH));
        assert!(package.content_type().starts_with("multipart/related; boundary=\""));
        assert!(package.content_type().contains(&package.boundary));
    }

    #[test]
    fn boundary_is_fixed_length_alphanumeric() {
        let a = new_boundary();
        let b = new_boundary();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn unreadable_ticket_leaves_envelope_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let packager = MimePackager::new(Some(dir.path().to_path_buf()));
        let mut envelope = submit_envelope("cid://missing.jdf");
        let before = envelope.clone();

        let err = packager.package(&mut envelope).unwrap_err();
        assert!(matches!(err, JmfError::Attachment { .. }));
        assert!(err.is_configuration());
        assert_eq!(envelope, before);
    }

    #[test]
    fn non_local_reference_is_rejected() {
        let packager = MimePackager::default();
        let mut envelope = submit_envelope("http://files.example/job.jdf");
        assert!(matches!(
            packager.package(&mut envelope),
            Err(JmfError::Envelope(_))
        ));
    }

    #[test]
    fn absolute_references_ignore_attachment_dir() {
        let packager = MimePackager::new(Some(PathBuf::from("/srv/tickets")));
        assert_eq!(
            packager.resolve("cid:///tmp/job.jdf"),
            Some(PathBuf::from("/tmp/job.jdf"))
        );
        assert_eq!(
            packager.resolve("cid://job.jdf"),
            Some(PathBuf::from("/srv/tickets/job.jdf"))
        );
        assert_eq!(packager.resolve("cid://"), None);
        assert_eq!(packager.resolve("file:///tmp/job.jdf"), None);
    }

    #[test]
    fn decode_requires_closing_boundary() {
        let part = MimePart {
            content_id: "a".into(),
            media_type: "text/plain".into(),
            payload: b"hello".to_vec(),
        };
        let body = encode("XYZ", "test", &[part]);
        assert!(decode(&body).is_ok());

        let truncated = &body[..body.len() - "--XYZ--\r\n".len()];
        assert!(decode(truncated).is_err());
    }
}
