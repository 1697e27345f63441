//! EXAMINE command handler.
//!
//! EXAMINE is SELECT in read-only mode (RFC 3501 Section 6.3.2). The
//! client only relies on `* N EXISTS`, the number of messages it may
//! fetch. The tagged OK carries `[READ-ONLY]`.
//!
//! Returns the examined folder name (or `None` if not found).

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the EXAMINE command. Returns the selected folder name.
pub async fn handle_examine<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> Option<String> {
    let Some(folder) = mailbox.get_folder(folder_name) else {
        let _ = write_line(stream, &format!("{tag} NO Folder not found\r\n")).await;
        return None;
    };

    let lines = [
        "* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n".to_string(),
        format!("* {} EXISTS\r\n", folder.messages.len()),
        "* 0 RECENT\r\n".to_string(),
        "* OK [UIDVALIDITY 1]\r\n".to_string(),
        "* OK [PERMANENTFLAGS ()] Read-only mailbox\r\n".to_string(),
        format!("{tag} OK [READ-ONLY] EXAMINE completed\r\n"),
    ];
    for line in &lines {
        if write_line(stream, line).await.is_err() {
            return None;
        }
    }

    Some(folder_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, folder_name: &str, mailbox: &Mailbox) -> (String, Option<String>) {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        let selected = handle_examine(tag, folder_name, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        (String::from_utf8(buf).unwrap(), selected)
    }

    #[tokio::test]
    async fn reports_message_count_read_only() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .message(b"one")
            .message(b"two")
            .message(b"three")
            .build();

        let (output, selected) = run("A3", "INBOX", &mailbox).await;

        assert_eq!(selected.as_deref(), Some("INBOX"));
        assert!(output.contains("* 3 EXISTS"));
        assert!(output.contains("A3 OK [READ-ONLY] EXAMINE completed"));
    }

    #[tokio::test]
    async fn empty_folder_has_zero_exists() {
        let mailbox = MailboxBuilder::new().folder("Empty").build();
        let (output, _) = run("A3", "Empty", &mailbox).await;
        assert!(output.contains("* 0 EXISTS"));
    }

    #[tokio::test]
    async fn returns_none_for_missing_folder() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let (output, selected) = run("A3", "NoSuchFolder", &mailbox).await;

        assert!(selected.is_none());
        assert!(output.contains("A3 NO Folder not found"));
    }
}
