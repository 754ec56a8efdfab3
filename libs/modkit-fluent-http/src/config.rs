use std::time::Duration;

/// Default User-Agent sent by [`HyperTransport`](crate::HyperTransport)
pub const DEFAULT_USER_AGENT: &str = concat!("modkit-fluent-http/", env!("CARGO_PKG_VERSION"));

/// Which URL schemes the transport accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// Only `https://` targets are sent
    #[default]
    TlsOnly,
    /// `http://` targets are sent as well (mock servers, local testing)
    AllowInsecureHttp,
}

/// Settings consumed by [`HyperTransportBuilder`](crate::HyperTransportBuilder).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for a single exchange, headers included (default: 30s)
    pub request_timeout: Duration,

    /// User-Agent added to requests that do not carry one
    pub user_agent: String,

    /// Accepted URL schemes (default: TLS only)
    pub transport: TransportSecurity,

    /// Limit on buffered response content, after decompression (default: 10 MiB)
    pub max_body_size: usize,

    /// How long an idle pooled connection is kept; `None` keeps it forever (default: 90s)
    pub pool_idle_timeout: Option<Duration>,

    /// Idle connections kept per host (default: 32)
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            max_body_size: 10 * 1024 * 1024,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl TransportConfig {
    /// Small footprint for short-lived, low-volume callers.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024,
            pool_idle_timeout: Some(Duration::from_secs(30)),
            pool_max_idle_per_host: 8,
            ..Self::default()
        }
    }
}
