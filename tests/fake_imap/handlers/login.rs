//! LOGIN command handler.
//!
//! Credentials arrive as two IMAP strings, either atoms or quoted
//! strings with `\"` and `\\` escapes:
//!
//! ```text
//! A0001 LOGIN "testuser" "testpass"
//! ```
//!
//! The server checks them against the mailbox's configured
//! credentials and answers NO on a mismatch.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Parse one atom or quoted string, returning it and the rest of the
/// input.
fn take_string(input: &str) -> Option<(String, &str)> {
    let input = input.trim_start();
    if let Some(rest) = input.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => value.push(chars.next()?.1),
                '"' => return Some((value, &rest[i + 1..])),
                _ => value.push(c),
            }
        }
        None
    } else {
        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        if end == 0 {
            return None;
        }
        Some((input[..end].to_string(), &input[end..]))
    }
}

/// Extract `(username, password)` from a raw `<tag> LOGIN u p` line.
fn login_args(line: &str) -> Option<(String, String)> {
    let mut parts = line.trim_end().splitn(3, ' ');
    let _tag = parts.next()?;
    if !parts.next()?.eq_ignore_ascii_case("LOGIN") {
        return None;
    }
    let (username, rest) = take_string(parts.next()?)?;
    let (password, _) = take_string(rest)?;
    Some((username, password))
}

/// Handle the LOGIN command. Returns `false` if the connection broke.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    line: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    let accepted = login_args(line).is_some_and(|(user, pass)| mailbox.accepts(&user, &pass));

    let resp = if accepted {
        format!("{tag} OK LOGIN completed\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
    };
    write_line(stream, &resp).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, line: &str) -> (String, bool) {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let ok = handle_login(tag, line, &mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        (String::from_utf8(buf).unwrap(), ok)
    }

    #[test]
    fn parses_quoted_and_atom_arguments() {
        assert_eq!(
            login_args("A1 LOGIN \"testuser\" \"testpass\"\r\n"),
            Some(("testuser".to_string(), "testpass".to_string()))
        );
        assert_eq!(
            login_args("A1 login bob hunter2\r\n"),
            Some(("bob".to_string(), "hunter2".to_string()))
        );
        assert_eq!(
            login_args("A1 LOGIN \"a \\\"b\\\"\" \"c\\\\d\"\r\n"),
            Some(("a \"b\"".to_string(), "c\\d".to_string()))
        );
        assert_eq!(login_args("A1 LOGIN onlyuser\r\n"), None);
    }

    #[tokio::test]
    async fn accepts_configured_credentials() {
        let (output, ok) = run("A0001", "A0001 LOGIN \"testuser\" \"testpass\"\r\n").await;
        assert!(ok);
        assert_eq!(output, "A0001 OK LOGIN completed\r\n");
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let (output, ok) = run("A0001", "A0001 LOGIN \"testuser\" \"nope\"\r\n").await;
        assert!(ok);
        assert!(output.starts_with("A0001 NO "));
    }
}
