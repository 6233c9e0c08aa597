use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    pub proxy_endpoint: String,
    pub proxy_api_key: String,
    pub map_provider_api_keys: Vec<String>,
    pub embedding_api_key: String,
    pub content_store_url: String,
    pub content_store_key: Option<String>,
    pub admin_session_secret: String,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub http_request_timeout_secs: u64,
    pub platform_max_attempts: u32,
    pub orchestrator_deadline_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("proxy_endpoint", &self.proxy_endpoint)
            .field("proxy_api_key", &"[redacted]")
            .field("map_provider_api_keys", &"[redacted]")
            .field("embedding_api_key", &"[redacted]")
            .field("content_store_url", &"[redacted]")
            .field(
                "content_store_key",
                &self.content_store_key.as_ref().map(|_| "[redacted]"),
            )
            .field("admin_session_secret", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "http_request_timeout_secs",
                &self.http_request_timeout_secs,
            )
            .field("platform_max_attempts", &self.platform_max_attempts)
            .field(
                "orchestrator_deadline_secs",
                &self.orchestrator_deadline_secs,
            )
            .finish()
    }
}
