//! IMAP mailbox downloader
//!
//! Connects to an IMAP server over TLS (implicit or STARTTLS), logs
//! in, opens a mailbox read-only and fetches the raw `BODY[]` of at
//! most the first [`FETCH_LIMIT`] messages. The bodies are returned
//! unparsed and can be written out one file per message with
//! [`write_messages`].

mod client;
mod config;
mod connection;
mod error;
mod fetch;
mod output;
mod sequence;

pub use client::MailboxClient;
pub use config::{DEFAULT_PORT, ImapConfig, Security, parse_server, require};
pub use error::{Error, Result};
pub use fetch::{BODY_QUERY, Collected, FetchStatus, RawMessage};
pub use output::{ensure_dest_dir, write_messages};
pub use sequence::{FETCH_LIMIT, FetchRange};
