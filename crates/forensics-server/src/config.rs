//! CLI flags layered over environment secrets (spec §6 Config, SPEC_FULL §B).

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Email forensics engine HTTP service.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Opt {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Base directory for the local-disk object store and sqlite catalog.
    #[arg(long, default_value = "/var/spool/forensics")]
    base_dir: PathBuf,
}

pub struct ServerConfig {
    pub listen: SocketAddr,
    pub base_dir: PathBuf,
    pub admin_username: String,
    /// sha256 hex of the admin password, compared against at login time.
    pub admin_password_hash: String,
    pub hmac_secret: Vec<u8>,
    pub doh_base_url: String,
}

impl ServerConfig {
    /// Parses CLI flags and reads the required secrets from the
    /// environment. Fails before a socket is ever bound if a required
    /// secret is missing (SPEC_FULL §B: "fails fast").
    pub fn load() -> anyhow::Result<Self> {
        let opt = Opt::parse();

        let admin_username = std::env::var("ADMIN_USERNAME")
            .map_err(|_| anyhow::anyhow!("ADMIN_USERNAME must be set"))?;
        let admin_password_hash = std::env::var("ADMIN_PASSWORD_HASH")
            .map_err(|_| anyhow::anyhow!("ADMIN_PASSWORD_HASH must be set"))?;

        // Reuse of the password hash as the HMAC secret is acceptable
        // (spec §6 Config) when a dedicated secret isn't provided.
        let hmac_secret = match std::env::var("HMAC_SECRET") {
            Ok(s) if !s.is_empty() => s.into_bytes(),
            _ => admin_password_hash.clone().into_bytes(),
        };

        let doh_base_url = std::env::var("DOH_BASE_URL")
            .unwrap_or_else(|_| "https://cloudflare-dns.com/dns-query".to_string());

        Ok(Self {
            listen: opt.listen,
            base_dir: opt.base_dir,
            admin_username,
            admin_password_hash,
            hmac_secret,
            doh_base_url,
        })
    }
}
