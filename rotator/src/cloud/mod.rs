// File: rotator/src/cloud/mod.rs
//! Cloud compute API access
//!
//! The backup run only needs six provider calls. They are expressed as the
//! [`CloudApi`] trait so the run can be driven by the HTTP client in
//! production and by an in-memory fake in tests.
//!
//! # Resources
//!
//! ```text
//! Instance ──attached──► Volume ──snapshot──► Snapshot (tag backup=<cadence>)
//! ```
//!
//! Instances and volumes carry an optional `Name` tag. Snapshots carry the
//! cadence that created them in the `backup` tag; a run only ever lists and
//! deletes snapshots of its own cadence.

pub mod client;

pub use client::HttpCloudClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::tags;
use crate::errors::CloudError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl Instance {
    pub fn name(&self) -> Option<&str> {
        self.tags.get(tags::NAME).map(String::as_str)
    }
}

/// Provider grouping of instances launched together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default)]
    pub reservation_id: Option<String>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub attached_instance_id: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl Volume {
    pub fn name(&self) -> Option<&str> {
        self.tags.get(tags::NAME).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    /// RFC 3339 timestamp as reported by the provider
    pub start_time: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFilter<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceFilter<'a> {
    pub tag: Option<TagFilter<'a>>,
}

impl<'a> InstanceFilter<'a> {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: &'a str) -> Self {
        Self {
            tag: Some(TagFilter {
                key: tags::NAME,
                value: name,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeFilter<'a> {
    pub attached_instance_id: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotFilter<'a> {
    pub volume_id: &'a str,
    pub tag: TagFilter<'a>,
}

/// Provider operations used by the backup run
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Instances matching the filter, flattened across reservations
    async fn list_instances(&self, filter: InstanceFilter<'_>) -> Result<Vec<Instance>, CloudError>;

    async fn list_volumes(&self, filter: VolumeFilter<'_>) -> Result<Vec<Volume>, CloudError>;

    async fn list_snapshots(&self, filter: SnapshotFilter<'_>) -> Result<Vec<Snapshot>, CloudError>;

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), CloudError>;

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot, CloudError>;

    async fn add_tag(&self, snapshot_id: &str, key: &str, value: &str) -> Result<(), CloudError>;
}
