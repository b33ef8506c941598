//! Device-wide tunables.

/// Local time zone of the appliance (UTC+8).
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;
pub const DEFAULT_DEVICE_ID: &str = "esp32";
pub const DEFAULT_ENDPOINT: &str = "http://medbox.local/exec";

pub const DEFAULT_RETRY_ATTEMPTS: u8 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u32 = 2_000;
pub const DEFAULT_BANNER_MS: u32 = 2_000;
pub const DEFAULT_LOG_BANNER_MS: u32 = 1_000;
pub const DEFAULT_JOIN_TIMEOUT_SECS: u8 = 15;

pub const CLOCK_FRAME_MS: u64 = 1_000;
pub const RING_FLASH_MS: u64 = 500;

/// Debounce windows for the physical inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InputTiming {
    pub rotary_guard_ms: u64,
    pub press_guard_ms: u64,
    pub press_settle_ms: u64,
    pub lid_confirm_ms: u64,
}

impl Default for InputTiming {
    fn default() -> Self {
        Self {
            rotary_guard_ms: 5,
            press_guard_ms: 250,
            press_settle_ms: 20,
            lid_confirm_ms: 500,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceConfig {
    pub utc_offset_secs: i32,
    pub device_id: &'static str,
    pub endpoint: &'static str,
    pub retry_attempts: u8,
    pub retry_backoff_ms: u32,
    pub banner_ms: u32,
    pub log_banner_ms: u32,
    pub join_timeout_secs: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            utc_offset_secs: DEFAULT_UTC_OFFSET_SECS,
            device_id: DEFAULT_DEVICE_ID,
            endpoint: DEFAULT_ENDPOINT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            banner_ms: DEFAULT_BANNER_MS,
            log_banner_ms: DEFAULT_LOG_BANNER_MS,
            join_timeout_secs: DEFAULT_JOIN_TIMEOUT_SECS,
        }
    }
}

impl DeviceConfig {
    pub const fn with_utc_offset_secs(mut self, utc_offset_secs: i32) -> Self {
        self.utc_offset_secs = utc_offset_secs;
        self
    }

    pub const fn with_device_id(mut self, device_id: &'static str) -> Self {
        self.device_id = device_id;
        self
    }

    pub const fn with_endpoint(mut self, endpoint: &'static str) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub const fn with_retry(mut self, attempts: u8, backoff_ms: u32) -> Self {
        self.retry_attempts = attempts;
        self.retry_backoff_ms = backoff_ms;
        self
    }

    pub const fn with_banner_ms(mut self, banner_ms: u32, log_banner_ms: u32) -> Self {
        self.banner_ms = banner_ms;
        self.log_banner_ms = log_banner_ms;
        self
    }

    pub const fn with_join_timeout_secs(mut self, join_timeout_secs: u8) -> Self {
        self.join_timeout_secs = join_timeout_secs;
        self
    }
}
