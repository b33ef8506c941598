use medbox_core::{
    alarm::AlarmConfig,
    storage::{DeviceStore, MemoryStore, MemoryStoreError, UserId, WifiCredentials},
};
use medbox_hal_esp32::storage::flash_store::{FlashStore, FlashStoreError};

/// Flash-backed records, or a volatile stand-in when the partition is
/// unusable so the device still runs for the session.
pub enum BoardStore {
    Flash(FlashStore),
    Volatile(MemoryStore),
}

#[derive(Debug)]
pub enum BoardStoreError {
    Flash(FlashStoreError),
    Volatile(MemoryStoreError),
}

impl BoardStore {
    pub fn open() -> Self {
        match FlashStore::new() {
            Ok(store) => Self::Flash(store),
            Err(err) => {
                log::warn!("storage: flash unavailable err={err:?}; records will not persist");
                Self::Volatile(MemoryStore::new())
            }
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            BoardStore::Flash($store) => $call.map_err(BoardStoreError::Flash),
            BoardStore::Volatile($store) => $call.map_err(BoardStoreError::Volatile),
        }
    };
}

impl DeviceStore for BoardStore {
    type Error = BoardStoreError;

    fn load_wifi_credentials(&mut self) -> Result<Option<WifiCredentials>, Self::Error> {
        dispatch!(self, store => store.load_wifi_credentials())
    }

    fn save_wifi_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error> {
        dispatch!(self, store => store.save_wifi_credentials(credentials))
    }

    fn load_alarm_config(&mut self) -> Result<Option<AlarmConfig>, Self::Error> {
        dispatch!(self, store => store.load_alarm_config())
    }

    fn save_alarm_config(&mut self, alarm: &AlarmConfig) -> Result<(), Self::Error> {
        dispatch!(self, store => store.save_alarm_config(alarm))
    }

    fn load_user_id(&mut self) -> Result<Option<UserId>, Self::Error> {
        dispatch!(self, store => store.load_user_id())
    }

    fn save_user_id(&mut self, user_id: &str) -> Result<(), Self::Error> {
        dispatch!(self, store => store.save_user_id(user_id))
    }
}
