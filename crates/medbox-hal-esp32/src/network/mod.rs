//! Wi-Fi station association, network scanning and the SNTP wall clock.

pub mod http;

use embassy_net::{
    IpEndpoint, Stack,
    dns::{self, DnsQueryType},
    udp::{PacketMetadata, UdpSocket},
};
use embassy_time::{Duration as EmbassyDuration, Instant, WithTimeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, ScanConfig, WifiController, WifiError};
use heapless::Vec;
use log::{info, warn};
use medbox_core::{
    clock::{SNTP_PACKET_BYTES, SNTP_PORT, sntp_request, unix_from_sntp_reply},
    storage::Ssid,
    sync::{Association, MAX_NETWORKS, ScanEntry},
};

const NTP_HOST: &str = "pool.ntp.org";
const NTP_LOCAL_PORT: u16 = 12_300;
const NTP_REPLY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug)]
pub enum StationError {
    Radio(WifiError),
    Timeout,
    NoAddress,
    Dns(dns::Error),
    Udp,
    BadTimeReply,
}

impl From<WifiError> for StationError {
    fn from(err: WifiError) -> Self {
        Self::Radio(err)
    }
}

/// Unix time captured at the last successful sync, advanced by the
/// monotonic timer.
#[derive(Clone, Copy, Debug, Default)]
struct WallClock {
    synced: Option<(i64, Instant)>,
}

impl WallClock {
    fn set(&mut self, unix_secs: i64) {
        self.synced = Some((unix_secs, Instant::now()));
    }

    fn now(&self) -> Option<i64> {
        self.synced
            .map(|(unix_secs, at)| unix_secs + at.elapsed().as_secs() as i64)
    }
}

/// Station-mode radio plus the IP stack it feeds.
pub struct WifiStation<'d> {
    controller: WifiController<'d>,
    stack: Stack<'d>,
    clock: WallClock,
}

impl<'d> WifiStation<'d> {
    pub fn new(controller: WifiController<'d>, stack: Stack<'d>) -> Self {
        Self {
            controller,
            stack,
            clock: WallClock::default(),
        }
    }

    pub fn stack(&self) -> Stack<'d> {
        self.stack
    }

    async fn ensure_started(&mut self) -> Result<(), StationError> {
        if self.controller.is_started().unwrap_or(false) {
            return Ok(());
        }
        self.controller
            .set_config(&ModeConfig::Client(ClientConfig::default()))?;
        self.controller.start_async().await?;
        Ok(())
    }
}

impl Association for WifiStation<'_> {
    type Error = StationError;

    async fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_secs: u32,
    ) -> Result<(), Self::Error> {
        // Association and DHCP share one budget.
        let deadline = Instant::now() + EmbassyDuration::from_secs(timeout_secs as u64);

        if matches!(self.controller.is_connected(), Ok(true)) {
            let _ = self.controller.disconnect_async().await;
        }

        let client_config = ClientConfig::default()
            .with_ssid(ssid.into())
            .with_password(password.into());
        self.controller
            .set_config(&ModeConfig::Client(client_config))?;
        if !self.controller.is_started().unwrap_or(false) {
            self.controller.start_async().await?;
        }

        info!("wifi: connecting ssid={ssid}");
        match self.controller.connect_async().with_deadline(deadline).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = self.controller.disconnect_async().await;
                return Err(StationError::Radio(err));
            }
            Err(_) => {
                let _ = self.controller.disconnect_async().await;
                return Err(StationError::Timeout);
            }
        }

        if self
            .stack
            .wait_config_up()
            .with_deadline(deadline)
            .await
            .is_err()
        {
            warn!("wifi: dhcp not ready after {timeout_secs}s");
            let _ = self.controller.disconnect_async().await;
            return Err(StationError::Timeout);
        }

        if let Some(config) = self.stack.config_v4() {
            info!("wifi: connected ip={}", config.address.address());
        }
        Ok(())
    }

    async fn scan_networks(&mut self) -> Result<Vec<ScanEntry, MAX_NETWORKS>, Self::Error> {
        self.ensure_started().await?;

        let found = self
            .controller
            .scan_with_config_async(ScanConfig::default())
            .await?;

        let mut entries = Vec::new();
        for ap in found.iter() {
            let Ok(ssid) = Ssid::try_from(ap.ssid.as_str()) else {
                continue;
            };
            let entry = ScanEntry {
                ssid,
                rssi: ap.signal_strength,
            };
            if entries.push(entry).is_err() {
                break;
            }
        }
        info!("wifi: scan found={} kept={}", found.len(), entries.len());
        Ok(entries)
    }

    async fn sync_wall_clock(&mut self) -> Result<(), Self::Error> {
        let addresses = self
            .stack
            .dns_query(NTP_HOST, DnsQueryType::A)
            .await
            .map_err(StationError::Dns)?;
        let server = addresses.first().copied().ok_or(StationError::NoAddress)?;

        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut tx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buf = [0u8; 128];
        let mut tx_buf = [0u8; 128];
        let mut socket = UdpSocket::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buf,
            &mut tx_meta,
            &mut tx_buf,
        );
        socket.bind(NTP_LOCAL_PORT).map_err(|_| StationError::Udp)?;

        socket
            .send_to(&sntp_request(), IpEndpoint::new(server, SNTP_PORT))
            .await
            .map_err(|_| StationError::Udp)?;

        let mut reply = [0u8; SNTP_PACKET_BYTES];
        let (len, _) = socket
            .recv_from(&mut reply)
            .with_timeout(EmbassyDuration::from_secs(NTP_REPLY_TIMEOUT_SECS))
            .await
            .map_err(|_| StationError::Timeout)?
            .map_err(|_| StationError::Udp)?;

        let unix_secs = unix_from_sntp_reply(&reply[..len]).ok_or(StationError::BadTimeReply)?;
        self.clock.set(unix_secs);
        info!("sntp: clock set unix={unix_secs}");
        Ok(())
    }

    fn now_utc(&self) -> Option<i64> {
        self.clock.now()
    }
}
