//! Medication box state machine: setup screens, menu editing, clock view
//! and the ringing alarm.

use core::fmt::Debug;

use heapless::{String, Vec};
use log::{debug, info, warn};

use crate::{
    alarm::{AlarmConfig, AlarmScheduler},
    charset::{CharRing, Control, Entry, rotate_ccw, rotate_cw},
    clock::LocalTime,
    config::{CLOCK_FRAME_MS, DeviceConfig, RING_FLASH_MS},
    input::{InputEvent, InputProvider},
    outbox::{Effect, Outbox},
    render::{ClockFace, Screen, WeekdaySlot},
    storage::WifiCredentials,
    sync::{MAX_NETWORKS, NetworkLabel, ssid_from_label},
};

pub const INPUT_BUFFER_BYTES: usize = 64;
const WEEKDAY_SLOTS: u8 = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UiState {
    ScanView,
    PasswordInput,
    ClockView,
    MenuSelect,
    SetHour,
    SetMinute,
    SetWeekday,
    AlarmRinging,
    BindInput,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MenuItem {
    SetTime,
    SetDays,
    SyncCloud,
    BindUser,
    LogNow,
    Back,
}

impl MenuItem {
    pub const ALL: [MenuItem; 6] = [
        MenuItem::SetTime,
        MenuItem::SetDays,
        MenuItem::SyncCloud,
        MenuItem::BindUser,
        MenuItem::LogNow,
        MenuItem::Back,
    ];

    pub const LABELS: [&'static str; 6] = [
        "Set Time",
        "Set Days",
        "Sync Cloud",
        "Bind User",
        "Log Now",
        "Back",
    ];

    fn from_index(index: u8) -> Self {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(MenuItem::Back)
    }
}

/// Which flow a character-entry screen feeds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum EntryFlow {
    WifiPassword,
    BindCode,
}

impl EntryFlow {
    const fn ring(self) -> CharRing {
        match self {
            Self::WifiPassword => CharRing::PASSWORD,
            Self::BindCode => CharRing::NUMERIC,
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::WifiPassword => "Enter WiFi Pass",
            Self::BindCode => "Enter Bind Code",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AckSource {
    Button,
    Lid,
}

pub struct MedboxApp<IN>
where
    IN: InputProvider,
{
    input: IN,
    config: DeviceConfig,
    ui: UiState,
    alarm: AlarmConfig,
    scheduler: AlarmScheduler,
    outbox: Outbox,
    networks: Vec<NetworkLabel, MAX_NETWORKS>,
    network_cursor: u16,
    menu_cursor: u8,
    weekday_cursor: u8,
    char_cursor: u16,
    input_buffer: String<INPUT_BUFFER_BYTES>,
    join_request: Option<WifiCredentials>,
    bind_code: Option<String<INPUT_BUFFER_BYTES>>,
    lid_latched: bool,
    pending_redraw: bool,
    local_time: Option<LocalTime>,
    last_clock_frame_ms: Option<u64>,
    last_flash_ms: Option<u64>,
    ring_flash_on: bool,
}

include!("view.rs");
include!("input.rs");
include!("runtime.rs");
include!("navigation.rs");

#[cfg(test)]
mod tests;
