//! Remote service and network collaborators, plus the effect orchestrator.

#[cfg(test)]
pub(crate) mod fakes;
pub mod orchestrator;
pub mod protocol;
pub mod request;

use core::fmt::{Debug, Write};

use heapless::{String, Vec};
use thiserror::Error;

use crate::storage::Ssid;

pub const MAX_NETWORKS: usize = 16;
pub const NETWORK_LABEL_BYTES: usize = 48;

pub type NetworkLabel = String<NETWORK_LABEL_BYTES>;

/// Failure taxonomy of a remote operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum SyncError {
    #[error("transport failed after {attempts} attempts")]
    Transport { attempts: u8 },
    #[error("response is not a structured payload")]
    Malformed,
    #[error("field `{field}` failed validation")]
    Validation { field: &'static str },
    #[error("no user bound")]
    NotBound,
    #[error("remote reported failure")]
    Rejected,
    #[error("wifi join timed out")]
    JoinTimeout,
}

/// One GET round-trip to the remote service.
///
/// `params` are appended to `endpoint` as a query string; the response body
/// is copied into `body` and its length returned.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Error: Debug;

    async fn get(
        &mut self,
        endpoint: &str,
        params: &[(&str, &str)],
        body: &mut [u8],
    ) -> Result<usize, Self::Error>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanEntry {
    pub ssid: Ssid,
    pub rssi: i8,
}

/// Wi-Fi association and wall-clock source.
#[allow(async_fn_in_trait)]
pub trait Association {
    type Error: Debug;

    async fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_secs: u32,
    ) -> Result<(), Self::Error>;
    async fn scan_networks(&mut self) -> Result<Vec<ScanEntry, MAX_NETWORKS>, Self::Error>;
    async fn sync_wall_clock(&mut self) -> Result<(), Self::Error>;
    /// Seconds since the Unix epoch, once the clock has been set.
    fn now_utc(&self) -> Option<i64>;
}

/// `"<ssid> (<rssi>dBm)"`, or `None` for hidden networks.
pub fn scan_label(entry: &ScanEntry) -> Option<NetworkLabel> {
    if entry.ssid.is_empty() {
        return None;
    }
    let mut label = NetworkLabel::new();
    write!(label, "{} ({}dBm)", entry.ssid, entry.rssi).ok()?;
    Some(label)
}

/// SSID part of a scan label.
pub fn ssid_from_label(label: &str) -> &str {
    label.split(" (").next().unwrap_or(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_to_ssid() {
        let entry = ScanEntry {
            ssid: Ssid::try_from("Home").unwrap(),
            rssi: -50,
        };
        let label = scan_label(&entry).unwrap();
        assert_eq!(label.as_str(), "Home (-50dBm)");
        assert_eq!(ssid_from_label(&label), "Home");
    }

    #[test]
    fn hidden_networks_are_skipped() {
        let entry = ScanEntry {
            ssid: Ssid::new(),
            rssi: -40,
        };
        assert!(scan_label(&entry).is_none());
    }
}
