pub mod backup;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod constants;
pub mod errors;
pub mod retention;

// Re-export commonly used types
pub use backup::{BackupOrchestrator, RunResult};
pub use cloud::{CloudApi, HttpCloudClient};
pub use config::{Config, ConfigManager};
pub use errors::{exit_code_for, BackupError, CloudError, ConfigError, RetentionError};
pub use retention::{cutoff_date, month_subtract, Cadence, RetentionPolicy};
