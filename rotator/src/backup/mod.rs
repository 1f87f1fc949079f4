// File: rotator/src/backup/mod.rs

//! Snapshot rotation run
//!
//! One run handles one cadence and walks the fleet exactly once:
//!
//! 1. Resolve every excluded `Name` tag to a single instance (fatal on failure)
//! 2. List all instances, dedupe by id, drop the excluded ones
//! 3. Collect the volumes attached to each remaining instance
//! 4. Per volume, in order: purge expired snapshots of this cadence, then
//!    create one new snapshot tagged `backup=<cadence>`
//!
//! Provider failures after step 1 are logged and the run keeps going. Nothing
//! is persisted between runs; rerunning after a crash is safe because purge
//! only removes snapshots older than the cutoff.

pub mod orchestrator;

pub use orchestrator::BackupOrchestrator;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::retention::Cadence;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub cadence: Cadence,
    pub cutoff: NaiveDate,
    pub eligible_instances: usize,
    pub volumes: usize,
    pub snapshots_created: usize,
    pub snapshots_deleted: usize,
    pub snapshots_retained: usize,
    /// Instances whose volumes could not be listed
    pub instances_skipped: usize,
    /// Swallowed provider failures during purge and create
    pub failed_operations: usize,
}

impl RunResult {
    fn new(cadence: Cadence, cutoff: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cadence,
            cutoff,
            eligible_instances: 0,
            volumes: 0,
            snapshots_created: 0,
            snapshots_deleted: 0,
            snapshots_retained: 0,
            instances_skipped: 0,
            failed_operations: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.instances_skipped == 0 && self.failed_operations == 0
    }
}
