//! In-memory cloud provider
//!
//! Holds instances, volumes and snapshots in memory, records every call in
//! order and can be told to fail specific operations.

use async_trait::async_trait;
use chrono::Utc;
use rotator::cloud::{
    CloudApi, Instance, InstanceFilter, Snapshot, SnapshotFilter, Volume, VolumeFilter,
};
use rotator::CloudError;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListInstances { name: Option<String> },
    ListVolumes { instance_id: String },
    ListSnapshots { volume_id: String, cadence: String },
    DeleteSnapshot { snapshot_id: String },
    CreateSnapshot { volume_id: String, description: String },
    AddTag { snapshot_id: String, key: String, value: String },
}

#[derive(Default)]
struct State {
    instances: Vec<Instance>,
    volumes: Vec<Volume>,
    snapshots: Vec<Snapshot>,
    calls: Vec<Call>,
    /// (operation, target) pairs; a `None` target fails every call of the operation
    failures: HashSet<(String, Option<String>)>,
    next_snapshot: usize,
}

#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<State>,
}

fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().instances.push(Instance {
            id: id.to_string(),
            tags: tags(&[("Name", name)]),
        });
        self
    }

    pub fn with_volume(self, id: &str, instance_id: &str, name: Option<&str>) -> Self {
        let volume_tags = match name {
            Some(name) => tags(&[("Name", name)]),
            None => HashMap::new(),
        };
        self.state.lock().unwrap().volumes.push(Volume {
            id: id.to_string(),
            attached_instance_id: Some(instance_id.to_string()),
            tags: volume_tags,
        });
        self
    }

    pub fn with_snapshot(self, id: &str, volume_id: &str, start_time: &str, cadence: &str) -> Self {
        self.state.lock().unwrap().snapshots.push(Snapshot {
            id: id.to_string(),
            volume_id: volume_id.to_string(),
            start_time: start_time.to_string(),
            description: None,
            tags: tags(&[("backup", cadence)]),
        });
        self
    }

    /// Fail every call of `operation`
    pub fn failing(self, operation: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((operation.to_string(), None));
        self
    }

    /// Fail `operation` only when it targets `target`
    pub fn failing_for(self, operation: &str, target: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((operation.to_string(), Some(target.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn snapshot_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn snapshots_for(&self, volume_id: &str) -> Vec<Snapshot> {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .iter()
            .filter(|s| s.volume_id == volume_id)
            .cloned()
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteSnapshot { snapshot_id } => Some(snapshot_id),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateSnapshot {
                    volume_id,
                    description,
                } => Some((volume_id, description)),
                _ => None,
            })
            .collect()
    }

    /// Every volume or instance id any call targeted
    pub fn touched_ids(&self) -> HashSet<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ListVolumes { instance_id } => Some(instance_id),
                Call::ListSnapshots { volume_id, .. } => Some(volume_id),
                Call::CreateSnapshot { volume_id, .. } => Some(volume_id),
                _ => None,
            })
            .collect()
    }

    fn check(state: &State, operation: &str, target: &str) -> Result<(), CloudError> {
        let fails = state.failures.contains(&(operation.to_string(), None))
            || state
                .failures
                .contains(&(operation.to_string(), Some(target.to_string())));
        if fails {
            return Err(CloudError::Api {
                operation: operation.to_string(),
                status: 503,
                message: format!("injected failure for {}", target),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CloudApi for FakeCloud {
    async fn list_instances(&self, filter: InstanceFilter<'_>) -> Result<Vec<Instance>, CloudError> {
        let mut state = self.state.lock().unwrap();
        let name = filter.tag.map(|t| t.value.to_string());
        state.calls.push(Call::ListInstances { name: name.clone() });
        Self::check(&state, "list_instances", name.as_deref().unwrap_or("*"))?;

        Ok(state
            .instances
            .iter()
            .filter(|i| match filter.tag {
                Some(tag) => i.tags.get(tag.key).map(String::as_str) == Some(tag.value),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn list_volumes(&self, filter: VolumeFilter<'_>) -> Result<Vec<Volume>, CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListVolumes {
            instance_id: filter.attached_instance_id.to_string(),
        });
        Self::check(&state, "list_volumes", filter.attached_instance_id)?;

        Ok(state
            .volumes
            .iter()
            .filter(|v| v.attached_instance_id.as_deref() == Some(filter.attached_instance_id))
            .cloned()
            .collect())
    }

    async fn list_snapshots(&self, filter: SnapshotFilter<'_>) -> Result<Vec<Snapshot>, CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListSnapshots {
            volume_id: filter.volume_id.to_string(),
            cadence: filter.tag.value.to_string(),
        });
        Self::check(&state, "list_snapshots", filter.volume_id)?;

        Ok(state
            .snapshots
            .iter()
            .filter(|s| s.volume_id == filter.volume_id)
            .filter(|s| s.tags.get(filter.tag.key).map(String::as_str) == Some(filter.tag.value))
            .cloned()
            .collect())
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteSnapshot {
            snapshot_id: snapshot_id.to_string(),
        });
        Self::check(&state, "delete_snapshot", snapshot_id)?;

        let before = state.snapshots.len();
        state.snapshots.retain(|s| s.id != snapshot_id);
        if state.snapshots.len() == before {
            return Err(CloudError::Api {
                operation: "delete_snapshot".to_string(),
                status: 404,
                message: format!("snapshot {} does not exist", snapshot_id),
            });
        }
        Ok(())
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot, CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateSnapshot {
            volume_id: volume_id.to_string(),
            description: description.to_string(),
        });
        Self::check(&state, "create_snapshot", volume_id)?;

        state.next_snapshot += 1;
        let snapshot = Snapshot {
            id: format!("snap-new-{}", state.next_snapshot),
            volume_id: volume_id.to_string(),
            start_time: Utc::now().to_rfc3339(),
            description: Some(description.to_string()),
            tags: HashMap::new(),
        };
        state.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn add_tag(&self, snapshot_id: &str, key: &str, value: &str) -> Result<(), CloudError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::AddTag {
            snapshot_id: snapshot_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        Self::check(&state, "add_tag", snapshot_id)?;

        match state.snapshots.iter_mut().find(|s| s.id == snapshot_id) {
            Some(snapshot) => {
                snapshot.tags.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(CloudError::Api {
                operation: "add_tag".to_string(),
                status: 404,
                message: format!("snapshot {} does not exist", snapshot_id),
            }),
        }
    }
}
