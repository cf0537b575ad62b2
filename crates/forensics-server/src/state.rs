use crate::config::ServerConfig;
use dns_resolver::Resolver;
use forensics_audit::AuditStore;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub resolver: Arc<dyn Resolver>,
    pub audit: Arc<AuditStore>,
    pub started_at: Instant,
}
