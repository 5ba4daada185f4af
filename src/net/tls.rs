//! TLS context construction from PEM material.
//!
//! One [`TlsContext`] is built at server startup and shared (via `Arc`) by
//! every accepted connection for the lifetime of the process -- the Rust
//! equivalent of the original's once-initialized, reference-counted TLS
//! context plus its now-unnecessary dyn-lock callbacks (`rustls` manages its
//! own internal locking; there is no global libcrypto state left to
//! serialize).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Once};

use rustls::{ClientConfig, RootCertStore, ServerConfig};

use crate::config::TlsMaterial;
use crate::error::Error;

static INSTALL_CRYPTO_PROVIDER: Once = Once::new();

/// Installs the process-wide default `rustls` crypto provider exactly once,
/// the Rust equivalent of the original's one-time dyn-lock/id-callback init.
fn ensure_crypto_provider() {
    INSTALL_CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Shared TLS material: a server-side acceptor config, and, when a CA
/// directory is configured, a client-side config for outbound connections
/// that verify the peer.
#[derive(Clone)]
pub struct TlsContext {
    pub server_config: Arc<ServerConfig>,
    pub client_config: Arc<ClientConfig>,
}

impl TlsContext {
    /// Builds a context from PEM-encoded certificate chain, private key, and
    /// an optional directory of trusted issuer certificates.
    pub fn from_material(material: &TlsMaterial) -> crate::error::Result<Self> {
        ensure_crypto_provider();

        let cert_path = material
            .cert_chain_file
            .as_ref()
            .ok_or_else(|| Error::configuration("missing cert_chain_file"))?;
        let key_path = material
            .private_key_file
            .as_ref()
            .ok_or_else(|| Error::configuration("missing private_key_file"))?;

        let certs = load_certs(cert_path)?;
        let key = load_private_key(key_path)?;

        let server_config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| Error::configuration(format!("invalid TLS cert/key pair: {e}")))?;

        let mut roots = RootCertStore::empty();
        if let Some(dir) = &material.ca_directory {
            add_ca_directory(&mut roots, dir)?;
        }
        let client_config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            server_config: Arc::new(server_config),
            client_config: Arc::new(client_config),
        })
    }
}

fn load_certs(path: &Path) -> crate::error::Result<Vec<rustls::pki_types::CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| Error::with_source(crate::error::ErrorKind::Configuration, "open cert chain", e))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::with_source(crate::error::ErrorKind::Configuration, "parse cert chain", e))
}

fn load_private_key(path: &Path) -> crate::error::Result<rustls::pki_types::PrivateKeyDer<'static>> {
    let file = File::open(path)
        .map_err(|e| Error::with_source(crate::error::ErrorKind::Configuration, "open private key", e))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| Error::with_source(crate::error::ErrorKind::Configuration, "parse private key", e))?
        .ok_or_else(|| Error::configuration("no private key found in file"))
}

fn add_ca_directory(roots: &mut RootCertStore, dir: &Path) -> crate::error::Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::with_source(crate::error::ErrorKind::Configuration, "read ca_directory", e))?;
    for entry in entries {
        let entry = entry
            .map_err(|e| Error::with_source(crate::error::ErrorKind::Configuration, "read ca_directory entry", e))?;
        let path = entry.path();
        let is_cert = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("pem") | Some("crt")
        );
        if !is_cert {
            continue;
        }
        for cert in load_certs(&path)? {
            let _ = roots.add(cert);
        }
    }
    Ok(())
}
