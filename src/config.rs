use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::device::http::HttpScannerConfig;
use crate::models::{RangeDescriptor, RangeSet};
use crate::poller::{DEFAULT_BATCH_SIZE, DEFAULT_FETCH_CONCURRENCY, PollerConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
    /// File this config was read from; `reload_ranges` re-reads it.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Seconds between scheduled polling cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Ranges scanned concurrently; batches run one after another.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    /// How often to log fleet stats (cycles, devices, ws clients) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
    /// Max fleet events kept in the broadcast channel for /ws/fleet (slow clients may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_interval_secs() -> u64 {
    300
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

fn default_fetch_concurrency() -> usize {
    DEFAULT_FETCH_CONCURRENCY
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

fn default_broadcast_capacity() -> usize {
    16
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            fetch_concurrency: default_fetch_concurrency(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Device adapter tunables, passed through untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_probe_retries")]
    pub probe_retries: u32,
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,
}

fn default_probe_port() -> u16 {
    80
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_probe_retries() -> u32 {
    1
}

fn default_scan_concurrency() -> usize {
    100
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_telemetry_path() -> String {
    "/api/telemetry".into()
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            probe_port: default_probe_port(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_retries: default_probe_retries(),
            scan_concurrency: default_scan_concurrency(),
            request_timeout_ms: default_request_timeout_ms(),
            telemetry_path: default_telemetry_path(),
        }
    }
}

/// One `[[locations]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub name: String,
    pub subnet: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)?;
        let mut config = Self::load_from_str(&s)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Re-reads the source file and returns its location list. Nothing else is reloaded.
    pub fn reload_ranges(&self) -> anyhow::Result<RangeSet> {
        let Some(path) = &self.source else {
            anyhow::bail!("config was not loaded from a file; cannot reload ranges");
        };
        Self::load_from_path(path)?.range_set()
    }

    pub fn range_set(&self) -> anyhow::Result<RangeSet> {
        let ranges = self
            .locations
            .iter()
            .map(|l| RangeDescriptor::new(l.name.trim(), l.subnet.trim()))
            .collect();
        Ok(RangeSet::from_descriptors(ranges)?)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            batch_size: self.polling.batch_size,
            fetch_timeout: Duration::from_millis(self.polling.fetch_timeout_ms),
            fetch_concurrency: self.polling.fetch_concurrency,
        }
    }

    pub fn scanner_config(&self) -> HttpScannerConfig {
        HttpScannerConfig {
            probe_port: self.scanner.probe_port,
            probe_timeout: Duration::from_millis(self.scanner.probe_timeout_ms),
            probe_retries: self.scanner.probe_retries,
            scan_concurrency: self.scanner.scan_concurrency,
            request_timeout: Duration::from_millis(self.scanner.request_timeout_ms),
            telemetry_path: self.scanner.telemetry_path.clone(),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.batch_size > 0,
            "polling.batch_size must be > 0, got {}",
            self.polling.batch_size
        );
        anyhow::ensure!(
            self.polling.fetch_timeout_ms > 0,
            "polling.fetch_timeout_ms must be > 0, got {}",
            self.polling.fetch_timeout_ms
        );
        anyhow::ensure!(
            self.polling.fetch_concurrency > 0,
            "polling.fetch_concurrency must be > 0, got {}",
            self.polling.fetch_concurrency
        );
        anyhow::ensure!(
            self.polling.stats_log_interval_secs > 0,
            "polling.stats_log_interval_secs must be > 0, got {}",
            self.polling.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.polling.broadcast_capacity > 0,
            "polling.broadcast_capacity must be > 0, got {}",
            self.polling.broadcast_capacity
        );
        anyhow::ensure!(
            self.scanner.probe_port > 0,
            "scanner.probe_port must be between 1 and 65535, got {}",
            self.scanner.probe_port
        );
        anyhow::ensure!(
            self.scanner.probe_timeout_ms > 0,
            "scanner.probe_timeout_ms must be > 0, got {}",
            self.scanner.probe_timeout_ms
        );
        anyhow::ensure!(
            self.scanner.scan_concurrency > 0,
            "scanner.scan_concurrency must be > 0, got {}",
            self.scanner.scan_concurrency
        );
        anyhow::ensure!(
            self.scanner.request_timeout_ms > 0,
            "scanner.request_timeout_ms must be > 0, got {}",
            self.scanner.request_timeout_ms
        );
        for (i, location) in self.locations.iter().enumerate() {
            anyhow::ensure!(
                !location.name.trim().is_empty(),
                "locations[{}].name must be non-empty",
                i
            );
            anyhow::ensure!(
                !location.subnet.trim().is_empty(),
                "locations[{}].subnet must be non-empty",
                i
            );
        }
        self.range_set()
            .map_err(|e| anyhow::anyhow!("locations: {}", e))?;
        Ok(())
    }
}
