//! IMAP connection and TLS helpers
//!
//! Provides `connect()`, which returns an authenticated session over
//! implicit TLS or STARTTLS, and `examine()` for read-only mailbox
//! selection.

use crate::config::{ImapConfig, Security};
use crate::error::{Error, Result};
use async_imap::imap_proto::{Capability, Response, ResponseCode};
use async_imap::types::UnsolicitedResponse;
use async_imap::{Client, Session};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info};

/// A TLS-wrapped IMAP session.
pub type ImapSession = Session<Compat<TlsStream<TcpStream>>>;

/// Build a TLS connector.
///
/// Verifies the server against the Mozilla root store unless
/// `accept_invalid_certs` is set, in which case any certificate is
/// accepted.
fn tls_connector(accept_invalid_certs: bool) -> TlsConnector {
    let builder = rustls::ClientConfig::builder();
    let config = if accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
            .with_no_client_auth()
    } else {
        let root_store = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder
            .with_root_certificates(root_store)
            .with_no_client_auth()
    };
    TlsConnector::from(Arc::new(config))
}

/// Whether a response lists STARTTLS among the server capabilities,
/// either as a CAPABILITY response or a `[CAPABILITY ...]` code.
fn offers_starttls(response: &Response<'_>) -> bool {
    let capabilities = match response {
        Response::Capabilities(caps)
        | Response::Data {
            code: Some(ResponseCode::Capabilities(caps)),
            ..
        } => caps,
        _ => return false,
    };
    capabilities
        .iter()
        .any(|cap| matches!(cap, Capability::Atom(atom) if atom.eq_ignore_ascii_case("STARTTLS")))
}

/// Open an authenticated IMAP session.
///
/// With [`Security::Tls`] the TLS handshake happens right after the TCP
/// connect, so the session starts out upgraded and STARTTLS is never
/// attempted. With [`Security::StartTls`] the plain connection is
/// upgraded if, and only if, the server advertises STARTTLS.
///
/// # Errors
///
/// Returns [`Error::Io`] if the TCP connection fails, [`Error::Tls`]
/// if the upgrade or handshake fails, and [`Error::Imap`] if LOGIN is
/// rejected.
pub async fn connect(config: &ImapConfig) -> Result<ImapSession> {
    let addr = config.addr();
    debug!("Connecting to IMAP server at {}", addr);

    let tcp_stream = TcpStream::connect(&addr).await?;

    let tcp_stream = match config.security {
        Security::Tls => tcp_stream,
        Security::StartTls => starttls(tcp_stream).await?,
    };

    let connector = tls_connector(config.accept_invalid_certs);
    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| Error::Tls(e.to_string()))?;

    let tls_client = Client::new(tls_stream.compat());

    let session = tls_client
        .login(&config.username, &config.password)
        .await
        .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

    info!("Connected to IMAP server {}", addr);
    Ok(session)
}

/// Negotiate STARTTLS on a plain connection and hand back the raw TCP
/// stream, ready for the TLS handshake.
async fn starttls(tcp_stream: TcpStream) -> Result<TcpStream> {
    let mut client = Client::new(tcp_stream.compat());

    // The greeting and the CAPABILITY data arrive as untagged responses.
    let (tx, rx) = async_channel::unbounded();
    client
        .run_command_and_check_ok("CAPABILITY", Some(tx))
        .await
        .map_err(|e| Error::Imap(format!("CAPABILITY failed: {e}")))?;

    let mut advertised = false;
    while let Ok(response) = rx.try_recv() {
        if let UnsolicitedResponse::Other(data) = response {
            advertised |= offers_starttls(data.parsed());
        }
    }
    if !advertised {
        return Err(Error::Tls("Server does not advertise STARTTLS".into()));
    }

    debug!("Upgrading connection with STARTTLS");
    client
        .run_command_and_check_ok("STARTTLS", None)
        .await
        .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;

    Ok(client.into_inner().into_inner())
}

/// Select a mailbox read-only (EXAMINE) and return its message count.
///
/// # Errors
///
/// Returns [`Error::Imap`] if the server rejects the mailbox.
pub async fn examine(session: &mut ImapSession, mailbox: &str) -> Result<u32> {
    let selected = session
        .examine(mailbox)
        .await
        .map_err(|e| Error::Imap(format!("Failed to select {mailbox}: {e}")))?;
    info!("Selected {} read-only ({} messages)", mailbox, selected.exists);
    Ok(selected.exists)
}

/// Certificate verifier that accepts all certificates
/// (for self-signed servers and local bridges).
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
