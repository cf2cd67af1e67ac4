use fieldkit_core::{Compaction, Observation, SoilColor, Vegetation, Waterlogging, WhiteDeposits};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_TABLE: &str = "soil_samples";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote store answered {0}")]
    Status(StatusCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL of the REST backend, without the `/rest/v1` suffix.
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
}

impl SyncConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }
}

/// Flattened row for the remote `create observation` call.
#[derive(Debug, Serialize)]
pub struct SyncRecord<'a> {
    pub point_number: u32,
    pub grid_ref: &'a str,
    pub lat: f64,
    pub lon: f64,
    pub white_deposits: Option<&'a WhiteDeposits>,
    pub soil_color: Option<&'a SoilColor>,
    pub waterlogging: Option<&'a Waterlogging>,
    pub compaction: Option<&'a Compaction>,
    pub vegetation: Option<&'a Vegetation>,
    pub notes: &'a str,
    pub created_at: String,
}

impl<'a> From<&'a Observation> for SyncRecord<'a> {
    fn from(obs: &'a Observation) -> Self {
        Self {
            point_number: obs.point_number,
            grid_ref: &obs.grid_ref,
            lat: obs.lat,
            lon: obs.lon,
            white_deposits: obs.white_deposits.as_ref(),
            soil_color: obs.soil_color.as_ref(),
            waterlogging: obs.waterlogging.as_ref(),
            compaction: obs.compaction.as_ref(),
            vegetation: obs.vegetation.as_ref(),
            notes: &obs.notes,
            created_at: obs.created_at_text(),
        }
    }
}

/// Best-effort mirror of observations to a remote REST table.
///
/// Local persistence is authoritative; nothing here can fail a recording.
#[derive(Debug, Clone)]
pub struct RemoteSync {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RemoteSync {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(SyncError::Client)?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One POST, no retry. The response body is not read.
    pub async fn submit(&self, observation: &Observation) -> Result<(), SyncError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&SyncRecord::from(observation))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SyncError::Status(resp.status()));
        }
        Ok(())
    }

    /// Spawns `submit` on the current runtime and returns immediately.
    ///
    /// Do not await the handle on a user-facing path: the result is only
    /// logged. The handle is returned so shutdown can drain in-flight
    /// requests. Returns `None` when no tokio runtime is running.
    pub fn publish(&self, observation: Observation) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            warn!(
                event = "sync_skipped",
                reason = "no_runtime",
                point = observation.point_number
            );
            return None;
        };

        let sync = self.clone();
        Some(handle.spawn(async move {
            debug!(event = "sync_started", id = %observation.id);
            match sync.submit(&observation).await {
                Ok(()) => info!(
                    event = "sync_ok",
                    id = %observation.id,
                    point = observation.point_number
                ),
                Err(err) => warn!(
                    event = "sync_failed",
                    id = %observation.id,
                    point = observation.point_number,
                    error = %err
                ),
            }
        }))
    }
}
