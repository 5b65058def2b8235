//! Per-invocation probe configuration.

use crate::probe::{http::StatusApiProbe, raknet::RakNetProbe, tcp::TcpProbe, Probe};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// Default public status-aggregation service.
pub const DEFAULT_STATUS_API: &str = "https://api.mcstatus.io";

/// How long a probe may take unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Which probing technique to use. Exactly one runs per probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Time a TCP connect.
    Tcp,
    /// RakNet unconnected ping over UDP.
    #[default]
    NativeUdp,
    /// Ask a third-party HTTP status API.
    #[serde(alias = "http")]
    HttpStatusApi,
}

impl Strategy {
    /// Build the probe implementing this strategy.
    #[must_use]
    pub fn build(self) -> Box<dyn Probe> {
        match self {
            Self::Tcp => Box::new(TcpProbe),
            Self::NativeUdp => Box::new(RakNetProbe),
            Self::HttpStatusApi => Box::new(StatusApiProbe),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "native-udp" | "udp" | "raknet" => Ok(Self::NativeUdp),
            "http" | "http-status-api" => Ok(Self::HttpStatusApi),
            other => Err(format!("unknown strategy `{other}`")),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::NativeUdp => "native-udp",
            Self::HttpStatusApi => "http-status-api",
        })
    }
}

/// Game edition, which selects the status API variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// Java edition (TCP).
    Java,
    /// Bedrock edition (RakNet over UDP).
    #[default]
    Bedrock,
}

impl Edition {
    /// Path segment used by the status API.
    #[must_use]
    pub fn api_variant(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Bedrock => "bedrock",
        }
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(Self::Java),
            "bedrock" => Ok(Self::Bedrock),
            other => Err(format!("unknown edition `{other}`")),
        }
    }
}

/// Where and how to reach the HTTP status API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusApiConfig {
    /// Scheme and authority, without a trailing path.
    pub base_url: String,
    /// Which status variant to request.
    pub edition: Edition,
}

impl Default for StatusApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STATUS_API.to_string(),
            edition: Edition::default(),
        }
    }
}

/// Configuration supplied with each probe.
///
/// Every field has a default, so a JSON config file may set only what it
/// needs:
///
/// ```
/// use mc_probe::{ProbeConfig, Strategy};
/// use std::time::Duration;
///
/// let config: ProbeConfig = serde_json::from_str(r#"{"strategy": "tcp", "timeout_ms": 1500}"#).unwrap();
/// assert_eq!(config.strategy, Strategy::Tcp);
/// assert_eq!(config.timeout, Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Hard upper bound on the time spent in a probe.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// The strategy to run.
    pub strategy: Strategy,

    /// For [`Strategy::Tcp`], follow the connect with one Server List Ping
    /// round trip.
    pub tcp_echo: bool,

    /// Settings for [`Strategy::HttpStatusApi`].
    pub status_api: StatusApiConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            strategy: Strategy::default(),
            tcp_echo: false,
            status_api: StatusApiConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// A default config using the given strategy.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the TCP echo round trip.
    #[must_use]
    pub fn with_tcp_echo(mut self, echo: bool) -> Self {
        self.tcp_echo = echo;
        self
    }

    /// Point the HTTP strategy at another status API.
    #[must_use]
    pub fn with_status_api(mut self, base_url: impl Into<String>, edition: Edition) -> Self {
        self.status_api = StatusApiConfig {
            base_url: base_url.into(),
            edition,
        };
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(dur: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(dur.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
