// File: rotator/src/cloud/client.rs
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{
    CloudApi, Instance, InstanceFilter, Reservation, Snapshot, SnapshotFilter, Volume, VolumeFilter,
};
use crate::config::Config;
use crate::constants::{filters, http};
use crate::errors::{BackupError, CloudError};

#[derive(Debug, Deserialize)]
struct InstancesResponse {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    volumes: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct SnapshotsResponse {
    #[serde(default)]
    snapshots: Vec<Snapshot>,
}

/// JSON compute API client scoped to a single region
pub struct HttpCloudClient {
    client: Client,
    base_url: String,
    region: String,
    api_key: Option<String>,
}

impl HttpCloudClient {
    pub fn new(config: &Config) -> Result<Self, CloudError> {
        let timeout = config
            .request_timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(http::REQUEST_TIMEOUT);

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(http::CONNECT_TIMEOUT)
            .build()
            .map_err(|e| CloudError::transport("client setup", e))?;

        let base_url = format!(
            "{}/v1/regions/{}",
            config.api_endpoint.trim_end_matches('/'),
            config.region
        );

        Ok(Self {
            client,
            base_url,
            region: config.region.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Build a client and verify the region answers before any work starts
    pub async fn connect(config: &Config) -> Result<Self, BackupError> {
        let connection_error = |source| BackupError::Connection {
            region: config.region.clone(),
            source,
        };

        let client = Self::new(config).map_err(connection_error)?;
        client
            .send("connect", client.client.get(&client.base_url))
            .await
            .map_err(connection_error)?;

        info!("Connected to cloud region {}", client.region);
        Ok(client)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, CloudError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| CloudError::transport(operation, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(body);

        Err(CloudError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CloudError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} GET {} {:?}", operation, url, query);

        let response = self.send(operation, self.client.get(&url).query(query)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CloudError::decode(operation, e))
    }
}

#[async_trait]
impl CloudApi for HttpCloudClient {
    async fn list_instances(&self, filter: InstanceFilter<'_>) -> Result<Vec<Instance>, CloudError> {
        let mut query = Vec::new();
        if let Some(tag) = filter.tag {
            query.push((filters::TAG_KEY, tag.key));
            query.push((filters::TAG_VALUE, tag.value));
        }

        let response: InstancesResponse = self.get_json("list_instances", "/instances", &query).await?;
        Ok(response
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .collect())
    }

    async fn list_volumes(&self, filter: VolumeFilter<'_>) -> Result<Vec<Volume>, CloudError> {
        let query = [(filters::ATTACHMENT_INSTANCE_ID, filter.attached_instance_id)];
        let response: VolumesResponse = self.get_json("list_volumes", "/volumes", &query).await?;
        Ok(response.volumes)
    }

    async fn list_snapshots(&self, filter: SnapshotFilter<'_>) -> Result<Vec<Snapshot>, CloudError> {
        let query = [
            (filters::VOLUME_ID, filter.volume_id),
            (filters::TAG_KEY, filter.tag.key),
            (filters::TAG_VALUE, filter.tag.value),
        ];
        let response: SnapshotsResponse = self.get_json("list_snapshots", "/snapshots", &query).await?;
        Ok(response.snapshots)
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), CloudError> {
        let url = format!("{}/snapshots/{}", self.base_url, snapshot_id);
        self.send("delete_snapshot", self.client.delete(&url)).await?;
        Ok(())
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot, CloudError> {
        let url = format!("{}/snapshots", self.base_url);
        let payload = json!({
            "volume_id": volume_id,
            "description": description,
        });

        let response = self
            .send("create_snapshot", self.client.post(&url).json(&payload))
            .await?;
        response
            .json::<Snapshot>()
            .await
            .map_err(|e| CloudError::decode("create_snapshot", e))
    }

    async fn add_tag(&self, snapshot_id: &str, key: &str, value: &str) -> Result<(), CloudError> {
        let url = format!("{}/snapshots/{}/tags", self.base_url, snapshot_id);
        let payload = json!({ "key": key, "value": value });
        self.send("add_tag", self.client.post(&url).json(&payload)).await?;
        Ok(())
    }
}
