//! Mailbox download client

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use crate::fetch::{self, BODY_QUERY, Collected, FetchEvent};
use crate::sequence::FetchRange;
use futures::stream;
use tracing::info;

/// Read-only client that downloads the first messages of a mailbox
pub struct MailboxClient {
    config: ImapConfig,
}

impl MailboxClient {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }

    /// Fetch the raw bodies of the first [`FETCH_LIMIT`] messages (or
    /// all of them, if there are fewer) from `mailbox`.
    ///
    /// A FETCH that ends with a tagged NO/BAD, or with the connection
    /// dropping before its completion, is not an error: whatever arrived
    /// before is returned, with the outcome in [`Collected::status`]. The session is logged out before
    /// returning, whether or not the download succeeded.
    ///
    /// [`FETCH_LIMIT`]: crate::FETCH_LIMIT
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, login, EXAMINE, or issuing
    /// the FETCH command fails.
    pub async fn download(&self, mailbox: &str) -> Result<Collected> {
        let mut session = connection::connect(&self.config).await?;

        let result = fetch_first(&mut session, mailbox).await;

        session.logout().await.ok();
        result
    }
}

async fn fetch_first(session: &mut ImapSession, mailbox: &str) -> Result<Collected> {
    let exists = connection::examine(session, mailbox).await?;

    let Some(range) = FetchRange::for_mailbox(exists) else {
        info!("Mailbox {} is empty, nothing to fetch", mailbox);
        return Ok(Collected::empty());
    };

    info!(
        "Fetching {} message(s) ({})",
        range.len_for(exists),
        range
    );

    let tag = session
        .run_command(format!("FETCH {range} {BODY_QUERY}"))
        .await
        .map_err(|e| Error::Imap(format!("FETCH error: {e}")))?;

    let responses = stream::unfold(session, |session| async move {
        let response = session.read_response().await.transpose()?;
        Some((
            response.map(|r| FetchEvent::from_response(r.parsed())),
            session,
        ))
    });

    let collected = fetch::drain(responses, &tag.0).await;
    info!("Fetched {} message(s)", collected.messages.len());
    Ok(collected)
}
