//! Draining a FETCH response stream into raw messages

use async_imap::imap_proto::{AttributeValue, Response, Status};
use futures::{Stream, StreamExt, pin_mut};
use std::fmt;
use std::io;
use tracing::{debug, warn};

/// Data item requested for every message: the full, unparsed message.
pub const BODY_QUERY: &str = "BODY[]";

/// A fetched message's raw bytes. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    /// Wrap a buffer, or `None` if it is empty.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        (!bytes.is_empty()).then_some(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// How the FETCH command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Completed,
    /// The server ended the command with NO or BAD.
    Failed(String),
    /// The connection went away before the command completed.
    Aborted,
}

impl FetchStatus {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    fn from_tagged(status: &Status, information: Option<&str>) -> Self {
        match status {
            Status::Ok => Self::Completed,
            other => Self::Failed(
                information.map_or_else(|| format!("{other:?}"), str::to_string),
            ),
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("Fetch completed"),
            Self::Failed(info) => write!(f, "Fetch error: {info}"),
            Self::Aborted => f.write_str("Fetch command aborted"),
        }
    }
}

/// One server response, reduced to what the drain loop needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FetchEvent {
    /// Body bytes for message `seq`. Empty when the response had none.
    Body { seq: u32, bytes: Vec<u8> },
    /// Tagged completion of some command.
    Done { tag: String, status: FetchStatus },
    Other,
}

impl FetchEvent {
    pub(crate) fn from_response(response: &Response<'_>) -> Self {
        match response {
            Response::Fetch(seq, attrs) => Self::Body {
                seq: *seq,
                bytes: body_bytes(attrs),
            },
            Response::Done {
                tag,
                status,
                information,
                ..
            } => Self::Done {
                tag: tag.0.clone(),
                status: FetchStatus::from_tagged(status, information.as_deref()),
            },
            _ => Self::Other,
        }
    }
}

fn body_bytes(attrs: &[AttributeValue<'_>]) -> Vec<u8> {
    attrs
        .iter()
        .filter_map(|attr| match attr {
            AttributeValue::BodySection {
                section: None,
                data: Some(body),
                ..
            }
            | AttributeValue::Rfc822(Some(body)) => Some(body.as_ref()),
            _ => None,
        })
        .flatten()
        .copied()
        .collect()
}

/// Messages gathered from one FETCH, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub messages: Vec<RawMessage>,
    pub status: FetchStatus,
}

impl Collected {
    /// Nothing fetched, nothing failed (empty mailbox).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            messages: Vec::new(),
            status: FetchStatus::Completed,
        }
    }
}

/// Read the responses to the FETCH tagged `tag` until its completion.
///
/// Body bytes are concatenated per sequence number in order of first
/// arrival. Messages whose buffer stays empty are dropped. If the
/// responses end, or an I/O error occurs, before the tagged completion,
/// the collected messages are kept and the status is
/// [`FetchStatus::Aborted`].
pub(crate) async fn drain<S>(responses: S, tag: &str) -> Collected
where
    S: Stream<Item = io::Result<FetchEvent>>,
{
    pin_mut!(responses);

    let mut buffers: Vec<(u32, Vec<u8>)> = Vec::new();
    let mut status = FetchStatus::Aborted;

    while let Some(event) = responses.next().await {
        match event {
            Ok(FetchEvent::Body { seq, bytes }) => {
                match buffers.iter_mut().find(|(s, _)| *s == seq) {
                    Some((_, buffer)) => buffer.extend_from_slice(&bytes),
                    None => buffers.push((seq, bytes)),
                }
            }
            Ok(FetchEvent::Done { tag: done, status: done_status }) if done == tag => {
                status = done_status;
                break;
            }
            Ok(FetchEvent::Done { tag: other, .. }) => {
                debug!("Ignoring completion of unrelated command {other}");
            }
            Ok(FetchEvent::Other) => {}
            Err(e) => {
                warn!("Reading FETCH responses failed: {e}");
                break;
            }
        }
    }

    if !status.is_success() {
        warn!("{status}");
    }

    let received = buffers.len();
    let messages: Vec<RawMessage> = buffers
        .into_iter()
        .filter_map(|(_, bytes)| RawMessage::new(bytes))
        .collect();
    if messages.len() < received {
        debug!(
            "Skipped {} response(s) without a body",
            received - messages.len()
        );
    }

    Collected { messages, status }
}
