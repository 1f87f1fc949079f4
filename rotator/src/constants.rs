//! Constants shared by the configuration loader, the cloud client and the
//! backup run: tag names, defaults and exit codes.

use std::time::Duration;

/// Tag keys used on provider resources
pub mod tags {
    /// Display name of instances and volumes
    pub const NAME: &str = "Name";

    /// Snapshot tag holding the cadence that created it
    pub const BACKUP: &str = "backup";
}

/// Provider-side filter names
pub mod filters {
    pub const TAG_KEY: &str = "tag-key";
    pub const TAG_VALUE: &str = "tag-value";
    pub const ATTACHMENT_INSTANCE_ID: &str = "attachment.instance-id";
    pub const VOLUME_ID: &str = "volume-id";
}

/// HTTP client constants
pub mod http {
    use super::Duration;

    /// Default timeout for cloud API requests
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Timeout for establishing connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Default configuration values
pub mod defaults {
    /// Directory holding main.toml and friends
    pub const CONFIG_DIR: &str = "config";

    /// Environment variable overriding the configuration directory
    pub const CONFIG_DIR_ENV: &str = "ROTATOR_CONFIG_DIR";

    pub const RETAIN_DAILY_DAYS: u32 = 4;
    pub const RETAIN_WEEKLY_WEEKS: u32 = 16;
    pub const RETAIN_MONTHLY_MONTHS: u32 = 1;

    pub const TIMEZONE: &str = "UTC";
}

/// Process exit codes
pub mod exit {
    pub const SUCCESS: u8 = 0;
    pub const UNEXPECTED: u8 = 1;

    /// Usage, configuration, connection and exclusion failures
    pub const FATAL: u8 = 2;
}
