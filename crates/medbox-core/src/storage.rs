//! Persisted device records and the best-effort storage facade.

use heapless::String;
use log::warn;

use crate::alarm::AlarmConfig;

pub const SSID_MAX_BYTES: usize = 32;
pub const PASSWORD_MAX_BYTES: usize = 64;
pub const USER_ID_MAX_BYTES: usize = 64;

pub type Ssid = String<SSID_MAX_BYTES>;
pub type Password = String<PASSWORD_MAX_BYTES>;
pub type UserId = String<USER_ID_MAX_BYTES>;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WifiCredentials {
    pub ssid: Ssid,
    pub password: Password,
}

impl WifiCredentials {
    /// `None` when either field does not fit its record.
    pub fn new(ssid: &str, password: &str) -> Option<Self> {
        Some(Self {
            ssid: String::try_from(ssid).ok()?,
            password: String::try_from(password).ok()?,
        })
    }
}

/// Abstract record storage backend. Each record is independent; the last
/// successful write wins.
pub trait DeviceStore {
    type Error: core::fmt::Debug;

    fn load_wifi_credentials(&mut self) -> Result<Option<WifiCredentials>, Self::Error>;
    fn save_wifi_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error>;
    fn load_alarm_config(&mut self) -> Result<Option<AlarmConfig>, Self::Error>;
    fn save_alarm_config(&mut self, alarm: &AlarmConfig) -> Result<(), Self::Error>;
    fn load_user_id(&mut self) -> Result<Option<UserId>, Self::Error>;
    fn save_user_id(&mut self, user_id: &str) -> Result<(), Self::Error>;
}

/// Read and write helpers that never fail: read errors read as absent,
/// write errors are logged and dropped.
pub struct BestEffort<'a, S>(pub &'a mut S);

impl<S> BestEffort<'_, S>
where
    S: DeviceStore,
{
    pub fn wifi_credentials(&mut self) -> Option<WifiCredentials> {
        self.0
            .load_wifi_credentials()
            .map_err(|err| warn!("storage: wifi read failed err={err:?}"))
            .ok()
            .flatten()
    }

    pub fn save_wifi_credentials(&mut self, credentials: &WifiCredentials) {
        if let Err(err) = self.0.save_wifi_credentials(credentials) {
            warn!("storage: wifi write failed err={err:?}");
        }
    }

    pub fn alarm_config(&mut self) -> AlarmConfig {
        self.0
            .load_alarm_config()
            .map_err(|err| warn!("storage: alarm read failed err={err:?}"))
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    pub fn save_alarm_config(&mut self, alarm: &AlarmConfig) {
        if let Err(err) = self.0.save_alarm_config(alarm) {
            warn!("storage: alarm write failed err={err:?}");
        }
    }

    pub fn user_id(&mut self) -> Option<UserId> {
        self.0
            .load_user_id()
            .map_err(|err| warn!("storage: user read failed err={err:?}"))
            .ok()
            .flatten()
            .filter(|user_id| !user_id.is_empty())
    }

    pub fn save_user_id(&mut self, user_id: &str) {
        if let Err(err) = self.0.save_user_id(user_id) {
            warn!("storage: user write failed err={err:?}");
        }
    }
}

/// Volatile store used when no flash partition is available, and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    wifi: Option<WifiCredentials>,
    alarm: Option<AlarmConfig>,
    user_id: Option<UserId>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemoryStoreError {
    RecordTooLarge,
}

impl MemoryStore {
    pub const fn new() -> Self {
        Self {
            wifi: None,
            alarm: None,
            user_id: None,
        }
    }

    pub fn with_wifi(mut self, credentials: WifiCredentials) -> Self {
        self.wifi = Some(credentials);
        self
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = String::try_from(user_id).ok();
        self
    }

    pub fn with_alarm(mut self, alarm: AlarmConfig) -> Self {
        self.alarm = Some(alarm);
        self
    }
}

impl DeviceStore for MemoryStore {
    type Error = MemoryStoreError;

    fn load_wifi_credentials(&mut self) -> Result<Option<WifiCredentials>, Self::Error> {
        Ok(self.wifi.clone())
    }

    fn save_wifi_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error> {
        self.wifi = Some(credentials.clone());
        Ok(())
    }

    fn load_alarm_config(&mut self) -> Result<Option<AlarmConfig>, Self::Error> {
        Ok(self.alarm)
    }

    fn save_alarm_config(&mut self, alarm: &AlarmConfig) -> Result<(), Self::Error> {
        self.alarm = Some(*alarm);
        Ok(())
    }

    fn load_user_id(&mut self) -> Result<Option<UserId>, Self::Error> {
        Ok(self.user_id.clone())
    }

    fn save_user_id(&mut self, user_id: &str) -> Result<(), Self::Error> {
        let user_id = String::try_from(user_id).map_err(|_| MemoryStoreError::RecordTooLarge)?;
        self.user_id = Some(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl DeviceStore for BrokenStore {
        type Error = ();

        fn load_wifi_credentials(&mut self) -> Result<Option<WifiCredentials>, ()> {
            Err(())
        }

        fn save_wifi_credentials(&mut self, _: &WifiCredentials) -> Result<(), ()> {
            Err(())
        }

        fn load_alarm_config(&mut self) -> Result<Option<AlarmConfig>, ()> {
            Err(())
        }

        fn save_alarm_config(&mut self, _: &AlarmConfig) -> Result<(), ()> {
            Err(())
        }

        fn load_user_id(&mut self) -> Result<Option<UserId>, ()> {
            Err(())
        }

        fn save_user_id(&mut self, _: &str) -> Result<(), ()> {
            Err(())
        }
    }

    #[test]
    fn read_failures_look_absent() {
        let mut broken = BrokenStore;
        let mut store = BestEffort(&mut broken);
        assert_eq!(store.wifi_credentials(), None);
        assert_eq!(store.user_id(), None);
        assert_eq!(store.alarm_config(), AlarmConfig::default());
        store.save_user_id("u-1");
    }

    #[test]
    fn memory_store_keeps_last_write() {
        let mut memory = MemoryStore::new();
        let mut store = BestEffort(&mut memory);
        store.save_user_id("first");
        store.save_user_id("second");
        assert_eq!(store.user_id().as_deref(), Some("second"));

        store.save_user_id("");
        assert_eq!(store.user_id(), None);
    }

    #[test]
    fn credentials_reject_oversized_ssid() {
        assert!(WifiCredentials::new("a-very-long-network-name-over-32-bytes", "pw").is_none());
        assert!(WifiCredentials::new("Home", "abc123").is_some());
    }
}
