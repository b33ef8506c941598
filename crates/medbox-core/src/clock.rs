//! Wall-clock helpers: UTC seconds to device-local calendar fields.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};

/// Local broken-down time, weekday indexed Mon=0..Sun=6.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LocalTime {
    pub date: NaiveDate,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    /// `None` when the offset or timestamp is out of chrono's range.
    pub fn from_utc(utc_secs: i64, utc_offset_secs: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(utc_offset_secs)?;
        let local = DateTime::from_timestamp(utc_secs, 0)?.with_timezone(&offset);

        Some(Self {
            date: local.date_naive(),
            weekday: local.weekday().num_days_from_monday() as u8,
            hour: local.hour() as u8,
            minute: local.minute() as u8,
            second: local.second() as u8,
        })
    }

    /// Identity of the calendar minute this instant falls in.
    pub fn minute_stamp(&self) -> MinuteStamp {
        MinuteStamp {
            date: self.date,
            hour: self.hour,
            minute: self.minute,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MinuteStamp {
    pub date: NaiveDate,
    pub hour: u8,
    pub minute: u8,
}

pub const SNTP_PACKET_BYTES: usize = 48;
pub const SNTP_PORT: u16 = 123;

/// Seconds between the NTP era 0 epoch (1900) and the Unix epoch.
const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;
const SNTP_MODE_CLIENT: u8 = 3;
const SNTP_MODE_SERVER: u8 = 4;
const SNTP_VERSION: u8 = 4;
const TRANSMIT_TIMESTAMP_OFFSET: usize = 40;

/// Client request: LI=0, VN=4, Mode=3, everything else zero.
pub fn sntp_request() -> [u8; SNTP_PACKET_BYTES] {
    let mut packet = [0u8; SNTP_PACKET_BYTES];
    packet[0] = (SNTP_VERSION << 3) | SNTP_MODE_CLIENT;
    packet
}

/// Unix seconds from a server reply's transmit timestamp.
///
/// Rejects short packets, non-server modes, kiss-o'-death (stratum 0) and
/// unsynchronised (LI=3) replies.
pub fn unix_from_sntp_reply(reply: &[u8]) -> Option<i64> {
    if reply.len() < SNTP_PACKET_BYTES {
        return None;
    }

    let leap = reply[0] >> 6;
    let mode = reply[0] & 0x07;
    let stratum = reply[1];
    if mode != SNTP_MODE_SERVER || stratum == 0 || leap == 3 {
        return None;
    }

    let seconds = u32::from_be_bytes([
        reply[TRANSMIT_TIMESTAMP_OFFSET],
        reply[TRANSMIT_TIMESTAMP_OFFSET + 1],
        reply[TRANSMIT_TIMESTAMP_OFFSET + 2],
        reply[TRANSMIT_TIMESTAMP_OFFSET + 3],
    ]);
    if seconds == 0 {
        return None;
    }

    Some(seconds as i64 - NTP_UNIX_OFFSET_SECS)
}
