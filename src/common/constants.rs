/// Commerce defaults shared between configuration and tests
// Download attempts allowed per completed order unless configured otherwise
pub const DEFAULT_MAX_DOWNLOADS: u32 = 5;

// Days from purchase until the download window closes
pub const DEFAULT_ENTITLEMENT_DAYS: i64 = 365;

// HTTP API port when no config file overrides it
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// Prefix for human-referenceable order numbers
pub const ORDER_NUMBER_PREFIX: &str = "ORD";
