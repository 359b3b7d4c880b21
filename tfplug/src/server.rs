//! Server module for running Terraform providers
//!
//! Implements the go-plugin side of the handshake: check the magic cookie,
//! bind a loopback listener, set up AutoMTLS against the certificate Terraform
//! passed in `PLUGIN_CLIENT_CERT`, and announce the listener on stdout.

use crate::error::{Result, TfplugError};
use crate::grpc::ProviderService;
use crate::provider::Provider;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, KeyUsagePurpose,
};
use std::net::SocketAddr;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};

pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";
const CLIENT_CERT_ENV: &str = "PLUGIN_CLIENT_CERT";

const CORE_PROTOCOL_VERSION: u32 = 1;
const APP_PROTOCOL_VERSION: u32 = 6;

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Full registry address, used as the key in `TF_REATTACH_PROVIDERS`
    pub registry_address: String,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Run unmanaged: plaintext, no cookie check, print reattach config
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            registry_address: String::new(),
            max_message_size: 256 << 20, // 256MB
            debug: false,
        }
    }
}

impl ServerConfig {
    pub fn new(registry_address: &str) -> Self {
        Self {
            registry_address: registry_address.to_string(),
            ..Self::default()
        }
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Main entry point for running a provider
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    // Both aws-lc-rs and ring may be linked; pick one explicitly
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    if !config.debug {
        check_magic_cookie(std::env::var(MAGIC_COOKIE_KEY).ok().as_deref())?;
    }

    let service = ProviderService::new(provider).into_server(config.max_message_size);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let mut builder = Server::builder();
    let mut server_cert = None;

    if !config.debug {
        if let Ok(client_pem) = std::env::var(CLIENT_CERT_ENV) {
            let tls = AutoMtls::generate()?;
            builder = builder.tls_config(tls.server_config(client_pem.as_bytes()))?;
            server_cert = Some(tls.cert_der);
        } else {
            tracing::warn!("{} not set, serving without TLS", CLIENT_CERT_ENV);
        }
    }

    if config.debug {
        println!(
            "Provider started. To attach Terraform, set:\n\n\tTF_REATTACH_PROVIDERS='{}'\n",
            reattach_config(&config.registry_address, addr, std::process::id())
        );
    } else {
        println!("{}", handshake_line(addr, server_cert.as_deref()));
    }

    tracing::info!(%addr, debug = config.debug, "provider listening");

    builder
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

fn check_magic_cookie(value: Option<&str>) -> Result<()> {
    if value == Some(MAGIC_COOKIE_VALUE) {
        return Ok(());
    }
    Err(TfplugError::HandshakeError(
        "This binary is a plugin. These are not meant to be executed directly. \
         Please execute the program that consumes these plugins, which will \
         load any plugins automatically"
            .to_string(),
    ))
}

/// `CORE|APP|NETWORK|ADDR|PROTOCOL[|CERT]` as read by go-plugin
fn handshake_line(addr: SocketAddr, server_cert: Option<&[u8]>) -> String {
    let mut line = format!(
        "{}|{}|tcp|{}|grpc",
        CORE_PROTOCOL_VERSION, APP_PROTOCOL_VERSION, addr
    );
    if let Some(der) = server_cert {
        line.push('|');
        line.push_str(&STANDARD_NO_PAD.encode(der));
    }
    line
}

fn reattach_config(registry_address: &str, addr: SocketAddr, pid: u32) -> String {
    let entry = serde_json::json!({
        "Protocol": "grpc",
        "ProtocolVersion": APP_PROTOCOL_VERSION,
        "Pid": pid,
        "Test": true,
        "Addr": {
            "Network": "tcp",
            "String": addr.to_string(),
        }
    });
    let mut providers = serde_json::Map::new();
    providers.insert(registry_address.to_string(), entry);
    serde_json::Value::Object(providers).to_string()
}

/// Ephemeral self-signed server certificate for one plugin session
struct AutoMtls {
    cert_pem: String,
    cert_der: Vec<u8>,
    key_pem: String,
}

impl AutoMtls {
    fn generate() -> Result<Self> {
        let tls_err = |e: rcgen::Error| TfplugError::TlsError(e.to_string());

        let mut params = CertificateParams::new(vec!["localhost".to_string()]).map_err(tls_err)?;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
            KeyUsagePurpose::KeyCertSign,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "localhost");
        params.distinguished_name = dn;

        let key_pair = KeyPair::generate().map_err(tls_err)?;
        let cert = params.self_signed(&key_pair).map_err(tls_err)?;

        Ok(Self {
            cert_pem: cert.pem(),
            cert_der: cert.der().to_vec(),
            key_pem: key_pair.serialize_pem(),
        })
    }

    fn server_config(&self, client_pem: &[u8]) -> ServerTlsConfig {
        ServerTlsConfig::new()
            .identity(Identity::from_pem(&self.cert_pem, &self.key_pem))
            .client_ca_root(Certificate::from_pem(client_pem))
    }
}
