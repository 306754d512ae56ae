//! pulse.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::duration::parse_duration;

pub const DEFAULT_PORT: u16 = 8443;
pub const DEFAULT_DATA_DIR: &str = "/var/lib/pulsegrid";
pub const DEFAULT_PROBE_PATH: &str = "/health";
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_UPTIME_WINDOW: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    pub server: Option<ServerConfig>,
    pub probe: Option<ProbeConfig>,
    pub uptime: Option<UptimeConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
}

/// Where and how often the prober checks the monitored service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// `host:port` of the monitored service.
    pub target: Option<String>,
    pub path: Option<String>,
    pub interval: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UptimeConfig {
    /// Trailing window reported on `/metrics`.
    pub window: Option<String>,
}

impl PulseConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PulseConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.server
            .as_ref()
            .and_then(|s| s.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// The probe target, if probing is enabled at all.
    pub fn probe_target(&self) -> Option<&str> {
        self.probe.as_ref().and_then(|p| p.target.as_deref())
    }

    pub fn probe_path(&self) -> &str {
        self.probe
            .as_ref()
            .and_then(|p| p.path.as_deref())
            .unwrap_or(DEFAULT_PROBE_PATH)
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe
            .as_ref()
            .and_then(|p| p.interval.as_deref())
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_PROBE_INTERVAL)
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe
            .as_ref()
            .and_then(|p| p.timeout.as_deref())
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn uptime_window(&self) -> Duration {
        self.uptime
            .as_ref()
            .and_then(|u| u.window.as_deref())
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_UPTIME_WINDOW)
    }

    /// Scaffold a config probing `target` with default timings.
    pub fn scaffold(target: &str) -> Self {
        PulseConfig {
            server: Some(ServerConfig {
                port: Some(DEFAULT_PORT),
                data_dir: Some(PathBuf::from(DEFAULT_DATA_DIR)),
            }),
            probe: Some(ProbeConfig {
                target: Some(target.to_string()),
                path: Some(DEFAULT_PROBE_PATH.to_string()),
                interval: Some("30s".to_string()),
                timeout: Some("5s".to_string()),
            }),
            uptime: Some(UptimeConfig {
                window: Some("24h".to_string()),
            }),
        }
    }
}
