#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that saves the first messages of an IMAP mailbox as raw files

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mailbox_dump::{
    ImapConfig, MailboxClient, Security, ensure_dest_dir, require, write_messages,
};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Long flags that take a value. Each may also be written with a single
/// dash, Go style (`-imap_user bob` or `-imap_user=bob`).
const VALUE_FLAGS: &[&str] = &[
    "imap_mailbox",
    "imap_user",
    "imap_password",
    "imap_server",
    "dest_dir",
];

/// Long switches accepted with a single dash.
const SWITCHES: &[&str] = &["starttls", "insecure", "help", "version"];

#[derive(Parser)]
#[command(name = "mailbox-dump", version)]
#[command(
    about = "Save the first 100 messages of an IMAP mailbox, one raw file per message"
)]
struct Args {
    /// IMAP mailbox to open [env: IMAP_MAILBOX]
    #[arg(long = "imap_mailbox")]
    imap_mailbox: Option<String>,

    /// IMAP user [env: IMAP_USER]
    #[arg(long = "imap_user")]
    imap_user: Option<String>,

    /// IMAP password [env: IMAP_PASSWORD]
    #[arg(long = "imap_password", allow_hyphen_values = true)]
    imap_password: Option<String>,

    /// IMAP server as host[:port], port defaults to 993 [env: IMAP_SERVER]
    #[arg(long = "imap_server")]
    imap_server: Option<String>,

    /// Existing directory the messages are written to [env: DEST_DIR]
    #[arg(long = "dest_dir")]
    dest_dir: Option<String>,

    /// Connect in plain text and upgrade with STARTTLS
    #[arg(long)]
    starttls: bool,

    /// Accept invalid or self-signed server certificates
    #[arg(long)]
    insecure: bool,
}

/// Rewrite `-flag` into `--flag` for the known long flags.
///
/// The argument following a value flag is its value and is never
/// rewritten, so `-imap_password -insecure` keeps `-insecure` as the
/// password.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    let mut value_next = false;
    args.into_iter()
        .map(|arg| {
            if passthrough || std::mem::take(&mut value_next) {
                return arg;
            }
            let Some(s) = arg.to_str() else {
                return arg;
            };
            if s == "--" {
                passthrough = true;
                return arg;
            }
            let Some(rest) = s.strip_prefix('-') else {
                return arg;
            };
            let (dashes, rest) = match rest.strip_prefix('-') {
                Some(long) => ("", long),
                None => ("-", rest),
            };
            let (name, inline_value) = match rest.split_once('=') {
                Some((name, _)) => (name, true),
                None => (rest, false),
            };
            if VALUE_FLAGS.contains(&name) {
                value_next = !inline_value;
            } else if !SWITCHES.contains(&name) {
                return arg;
            }
            OsString::from(format!("{dashes}{s}"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse_from(normalize_args(std::env::args_os()));

    let mailbox = require(args.imap_mailbox, "IMAP_MAILBOX", "imap_mailbox")?;
    let user = require(args.imap_user, "IMAP_USER", "imap_user")?;
    let password = require(args.imap_password, "IMAP_PASSWORD", "imap_password")?;
    let server = require(args.imap_server, "IMAP_SERVER", "imap_server")?;
    let dest_dir = PathBuf::from(require(args.dest_dir, "DEST_DIR", "dest_dir")?);

    ensure_dest_dir(&dest_dir).await?;

    let security = if args.starttls {
        Security::StartTls
    } else {
        Security::Tls
    };
    let config = ImapConfig::new(&server, user, password)?
        .with_security(security)
        .accept_invalid_certs(args.insecure);

    println!("Connecting to {server}");
    let client = MailboxClient::new(config);
    let collected = client.download(&mailbox).await?;

    println!("{}", collected.status);

    let bar = ProgressBar::new(collected.messages.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);

    let written = write_messages(&dest_dir, &collected.messages, &bar).await?;
    bar.finish_and_clear();

    println!("Done: {written} message(s) written to {}", dest_dir.display());
    Ok(())
}
