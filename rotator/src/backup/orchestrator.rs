// File: rotator/src/backup/orchestrator.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::RunResult;
use crate::cloud::{CloudApi, Instance, InstanceFilter, Snapshot, SnapshotFilter, TagFilter, Volume, VolumeFilter};
use crate::config::Config;
use crate::constants::tags;
use crate::errors::BackupError;
use crate::retention::{cutoff_date, Cadence};

pub struct BackupOrchestrator {
    config: Arc<Config>,
    cloud: Arc<dyn CloudApi>,
}

impl BackupOrchestrator {
    pub fn new(config: Arc<Config>, cloud: Arc<dyn CloudApi>) -> Self {
        Self { config, cloud }
    }

    /// Run a full rotation for `cadence` using today's date in the configured timezone
    pub async fn run(&self, cadence: Cadence) -> Result<RunResult, BackupError> {
        let today = self.config.today()?;
        self.run_on(cadence, today).await
    }

    /// Run a full rotation as if today were `today`
    pub async fn run_on(&self, cadence: Cadence, today: NaiveDate) -> Result<RunResult, BackupError> {
        let cutoff = cutoff_date(cadence, today, &self.config.retention)?;
        let mut result = RunResult::new(cadence, cutoff);

        info!(
            "Starting backup run {} for {} backups (today {}, purging before {})",
            result.run_id, cadence, today, cutoff
        );

        let instances = self.instances_for_backup(&mut result).await?;
        result.eligible_instances = instances.len();

        let volumes = self.volumes_for_instances(&instances, &mut result).await;
        result.volumes = volumes.len();

        for (volume, instance_id) in &volumes {
            debug!("Processing volume {} attached to {}", volume.id, instance_id);
            self.purge_old_snapshots(volume, cadence, cutoff, &mut result).await;
            self.create_snapshot(volume, cadence, &mut result).await;
        }

        info!(
            "Backup run {} finished: {} instances, {} volumes, {} created, {} deleted, {} retained, {} instances skipped, {} failed operations",
            result.run_id,
            result.eligible_instances,
            result.volumes,
            result.snapshots_created,
            result.snapshots_deleted,
            result.snapshots_retained,
            result.instances_skipped,
            result.failed_operations
        );

        Ok(result)
    }

    /// Ids of the instances named in the exclusion list.
    ///
    /// Every name must match exactly one instance, otherwise the run stops.
    pub async fn resolve_exclusions(&self) -> Result<HashSet<String>, BackupError> {
        let mut excluded = HashSet::new();

        for name in &self.config.excluded_instances {
            let matches = self
                .cloud
                .list_instances(InstanceFilter::by_name(name))
                .await
                .map_err(|e| BackupError::ExclusionResolution {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;

            let ids: HashSet<&str> = matches.iter().map(|i| i.id.as_str()).collect();
            match ids.len() {
                0 => {
                    return Err(BackupError::ExclusionResolution {
                        name: name.clone(),
                        reason: "Unrecognized instance".to_string(),
                    })
                }
                1 => {
                    let id = matches[0].id.clone();
                    debug!("Excluded instance {} resolved to {}", name, id);
                    excluded.insert(id);
                }
                n => {
                    return Err(BackupError::ExclusionResolution {
                        name: name.clone(),
                        reason: format!("Instance name tag is not unique ({} instances)", n),
                    })
                }
            }
        }

        Ok(excluded)
    }

    /// All instances except the excluded ones, deduplicated by id in listing order.
    ///
    /// A failed fleet listing backs up nothing and counts as a failed operation.
    async fn instances_for_backup(&self, result: &mut RunResult) -> Result<Vec<Instance>, BackupError> {
        let excluded = self.resolve_exclusions().await?;

        let all_instances = match self.cloud.list_instances(InstanceFilter::all()).await {
            Ok(instances) => instances,
            Err(e) => {
                error!("Failed to list instances: {}", e);
                result.failed_operations += 1;
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let instances: Vec<Instance> = all_instances
            .into_iter()
            .filter(|instance| seen.insert(instance.id.clone()))
            .filter(|instance| !excluded.contains(&instance.id))
            .collect();

        info!(
            "{} instances eligible for backup ({} excluded)",
            instances.len(),
            excluded.len()
        );
        Ok(instances)
    }

    async fn volumes_for_instances(
        &self,
        instances: &[Instance],
        result: &mut RunResult,
    ) -> Vec<(Volume, String)> {
        let mut backup_volumes = Vec::new();

        for instance in instances {
            let filter = VolumeFilter {
                attached_instance_id: &instance.id,
            };
            match self.cloud.list_volumes(filter).await {
                Ok(volumes) => {
                    debug!(
                        "Instance {} ({}) has {} attached volumes",
                        instance.id,
                        instance.name().unwrap_or("unnamed"),
                        volumes.len()
                    );
                    backup_volumes.extend(volumes.into_iter().map(|v| (v, instance.id.clone())));
                }
                Err(e) => {
                    error!("Skipping instance {}: failed to list volumes: {}", instance.id, e);
                    result.instances_skipped += 1;
                }
            }
        }

        backup_volumes
    }

    async fn purge_old_snapshots(
        &self,
        volume: &Volume,
        cadence: Cadence,
        cutoff: NaiveDate,
        result: &mut RunResult,
    ) {
        let filter = SnapshotFilter {
            volume_id: &volume.id,
            tag: TagFilter {
                key: tags::BACKUP,
                value: cadence.as_tag(),
            },
        };

        let snapshots = match self.cloud.list_snapshots(filter).await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!("Failed to list {} snapshots for volume {}: {}", cadence, volume.id, e);
                result.failed_operations += 1;
                return;
            }
        };

        for snapshot in snapshots {
            let Some(started) = snapshot_date(&snapshot) else {
                warn!(
                    "Snapshot {} has unparseable start time '{}', leaving it alone",
                    snapshot.id, snapshot.start_time
                );
                result.snapshots_retained += 1;
                continue;
            };

            if started >= cutoff {
                debug!("Keeping snapshot {} from {}", snapshot.id, started);
                result.snapshots_retained += 1;
                continue;
            }

            info!("Deleting snapshot {} from {}", snapshot.id, started);
            match self.cloud.delete_snapshot(&snapshot.id).await {
                Ok(()) => result.snapshots_deleted += 1,
                Err(e) => {
                    error!("Failed to delete snapshot {}: {}", snapshot.id, e);
                    result.failed_operations += 1;
                }
            }
        }
    }

    async fn create_snapshot(&self, volume: &Volume, cadence: Cadence, result: &mut RunResult) {
        let description = snapshot_description(volume);
        info!("Creating {} snapshot for {}", cadence, description);

        let snapshot = match self.cloud.create_snapshot(&volume.id, &description).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Failed to create snapshot for volume {}: {}", volume.id, e);
                result.failed_operations += 1;
                return;
            }
        };
        result.snapshots_created += 1;

        if let Err(e) = self
            .cloud
            .add_tag(&snapshot.id, tags::BACKUP, cadence.as_tag())
            .await
        {
            // An untagged snapshot is invisible to every future purge
            error!(
                "Failed to tag snapshot {} with {}={}: {}",
                snapshot.id,
                tags::BACKUP,
                cadence,
                e
            );
            result.failed_operations += 1;
        }
    }
}

/// Description for a new snapshot: the volume's `Name` tag or a placeholder
pub fn snapshot_description(volume: &Volume) -> String {
    match volume.name() {
        Some(name) => name.to_string(),
        None => format!("No name instance: {}", volume.id),
    }
}

/// Calendar date a snapshot was started, in the offset the provider reported.
///
/// Timestamps without an offset are taken as UTC.
pub fn snapshot_date(snapshot: &Snapshot) -> Option<NaiveDate> {
    let raw = snapshot.start_time.trim();

    if let Ok(started) = DateTime::parse_from_rfc3339(raw) {
        return Some(started.date_naive());
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|started| started.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}
