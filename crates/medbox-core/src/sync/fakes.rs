//! Collaborator doubles shared by the sync tests.

use std::{collections::VecDeque, string::String, vec::Vec};

use embedded_hal_async::delay::DelayNs;

use super::{Association, MAX_NETWORKS, ScanEntry, Transport, protocol};
use crate::storage::Ssid;

/// Transport replaying canned bodies; `Err(())` entries and an exhausted
/// script fail the attempt.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub replies: VecDeque<Result<&'static str, ()>>,
    pub calls: Vec<String>,
}

impl ScriptedTransport {
    pub fn with_replies(replies: impl IntoIterator<Item = Result<&'static str, ()>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            calls: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    type Error = ();

    async fn get(
        &mut self,
        _endpoint: &str,
        params: &[(&str, &str)],
        body: &mut [u8],
    ) -> Result<usize, Self::Error> {
        self.calls.push(protocol::encode_query(params));
        let reply = self.replies.pop_front().unwrap_or(Err(()))?;
        let len = reply.len().min(body.len());
        body[..len].copy_from_slice(&reply.as_bytes()[..len]);
        Ok(len)
    }
}

#[derive(Default)]
pub(crate) struct RecordingDelay {
    pub delays_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

#[derive(Default)]
pub(crate) struct FakeAssociation {
    pub networks: Vec<(&'static str, i8)>,
    pub accept_password: Option<&'static str>,
    pub joins: Vec<(String, String)>,
    pub clock_syncs: u32,
    pub now_utc: Option<i64>,
}

impl Association for FakeAssociation {
    type Error = &'static str;

    async fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        _timeout_secs: u32,
    ) -> Result<(), Self::Error> {
        self.joins.push((ssid.into(), password.into()));
        match self.accept_password {
            Some(accepted) if accepted == password => Ok(()),
            _ => Err("join timeout"),
        }
    }

    async fn scan_networks(&mut self) -> Result<heapless::Vec<ScanEntry, MAX_NETWORKS>, Self::Error> {
        let mut entries = heapless::Vec::new();
        for (ssid, rssi) in &self.networks {
            let entry = ScanEntry {
                ssid: Ssid::try_from(*ssid).map_err(|_| "ssid too long")?,
                rssi: *rssi,
            };
            entries.push(entry).map_err(|_| "too many networks")?;
        }
        Ok(entries)
    }

    async fn sync_wall_clock(&mut self) -> Result<(), Self::Error> {
        self.clock_syncs += 1;
        Ok(())
    }

    fn now_utc(&self) -> Option<i64> {
        self.now_utc
    }
}
