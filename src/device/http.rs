// TCP-probe discovery plus JSON-over-HTTP telemetry via reqwest

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::{DeviceClient, DeviceHandle, SubnetScanner, subnet};
use crate::error::DiscoveryError;
use crate::models::TelemetryRecord;

#[derive(Debug, Clone)]
pub struct HttpScannerConfig {
    pub probe_port: u16,
    pub probe_timeout: Duration,
    /// Extra probe attempts after the first one fails.
    pub probe_retries: u32,
    pub scan_concurrency: usize,
    pub request_timeout: Duration,
    pub telemetry_path: String,
}

pub struct HttpScanner {
    config: HttpScannerConfig,
    client: reqwest::Client,
}

impl HttpScanner {
    pub fn new(config: HttpScannerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// The address back when its port accepts a connection within the retry budget.
    async fn probe(&self, ip: Ipv4Addr) -> Option<Ipv4Addr> {
        for _ in 0..=self.config.probe_retries {
            let connect = TcpStream::connect((ip, self.config.probe_port));
            if let Ok(Ok(_)) = timeout(self.config.probe_timeout, connect).await {
                return Some(ip);
            }
        }
        None
    }

    fn telemetry_url(&self, ip: Ipv4Addr) -> String {
        let path = self.config.telemetry_path.trim_start_matches('/');
        format!("http://{}:{}/{}", ip, self.config.probe_port, path)
    }
}

#[async_trait]
impl SubnetScanner for HttpScanner {
    async fn scan_subnet(&self, spec: &str) -> Result<Vec<DeviceHandle>, DiscoveryError> {
        let hosts = subnet::parse_subnet(spec)?;
        let probed = hosts.len();
        let probes: Vec<_> = hosts.into_iter().map(|ip| self.probe(ip)).collect();
        let reachable: Vec<Ipv4Addr> = stream::iter(probes)
            .buffer_unordered(self.config.scan_concurrency.max(1))
            .filter_map(std::future::ready)
            .collect()
            .await;
        debug!(
            subnet = spec,
            probed,
            reachable = reachable.len(),
            "subnet probe complete"
        );

        Ok(reachable
            .into_iter()
            .map(|ip| {
                Arc::new(HttpDeviceClient {
                    ip: ip.to_string(),
                    url: self.telemetry_url(ip),
                    client: self.client.clone(),
                }) as DeviceHandle
            })
            .collect())
    }
}

pub struct HttpDeviceClient {
    ip: String,
    url: String,
    client: reqwest::Client,
}

#[async_trait]
impl DeviceClient for HttpDeviceClient {
    fn ip(&self) -> &str {
        &self.ip
    }

    async fn fetch_telemetry(&self) -> anyhow::Result<TelemetryRecord> {
        let mut record: TelemetryRecord = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if record.ip.as_deref().is_none_or(str::is_empty) {
            record.ip = Some(self.ip.clone());
        }
        Ok(record)
    }
}
