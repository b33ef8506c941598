//! Alarm configuration and the once-per-minute, once-per-day scheduler.

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clock::{LocalTime, MinuteStamp};

pub const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const DEFAULT_HOUR: u8 = 8;

/// Daily alarm. Hour and minute are always in range.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AlarmRecord", into = "AlarmRecord")]
pub struct AlarmConfig {
    hour: u8,
    minute: u8,
    days: [bool; 7],
    enabled: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            hour: DEFAULT_HOUR,
            minute: 0,
            days: [false; 7],
            enabled: false,
        }
    }
}

impl AlarmConfig {
    pub fn new(hour: u8, minute: u8, days: [bool; 7], enabled: bool) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            days,
            enabled,
        })
    }

    pub const fn hour(&self) -> u8 {
        self.hour
    }

    pub const fn minute(&self) -> u8 {
        self.minute
    }

    pub const fn days(&self) -> [bool; 7] {
        self.days
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn day_enabled(&self, weekday: u8) -> bool {
        self.days.get(weekday as usize).copied().unwrap_or(false)
    }

    pub fn step_hour(&mut self, clockwise: bool) {
        self.hour = step_mod(self.hour, 24, clockwise);
    }

    pub fn step_minute(&mut self, clockwise: bool) {
        self.minute = step_mod(self.minute, 60, clockwise);
    }

    pub fn toggle_day(&mut self, weekday: u8) {
        if let Some(day) = self.days.get_mut(weekday as usize) {
            *day = !*day;
        }
    }

    pub fn set_days(&mut self, days: [bool; 7]) {
        self.days = days;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Active days as 1-based weekday digits, e.g. `"135"`, or `"None"`.
    pub fn active_days_label(&self) -> heapless::String<8> {
        let mut label = heapless::String::new();
        for (index, _) in self.days.iter().enumerate().filter(|(_, on)| **on) {
            let _ = label.push(char::from(b'1' + index as u8));
        }
        if label.is_empty() {
            let _ = label.push_str("None");
        }
        label
    }
}

fn step_mod(value: u8, modulus: u8, clockwise: bool) -> u8 {
    if clockwise {
        (value + 1) % modulus
    } else {
        (value + modulus - 1) % modulus
    }
}

#[derive(Serialize, Deserialize)]
struct AlarmRecord {
    hour: u8,
    minute: u8,
    days: [bool; 7],
    enabled: bool,
}

impl TryFrom<AlarmRecord> for AlarmConfig {
    type Error = &'static str;

    fn try_from(record: AlarmRecord) -> Result<Self, Self::Error> {
        AlarmConfig::new(record.hour, record.minute, record.days, record.enabled)
            .ok_or("alarm time out of range")
    }
}

impl From<AlarmConfig> for AlarmRecord {
    fn from(config: AlarmConfig) -> Self {
        Self {
            hour: config.hour,
            minute: config.minute,
            days: config.days,
            enabled: config.enabled,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScheduleOutcome {
    pub day_rolled_over: bool,
    pub fire: bool,
}

/// Minute-edge alarm evaluation with the daily taken latch.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlarmScheduler {
    last_minute: Option<MinuteStamp>,
    last_day: Option<NaiveDate>,
    taken_today: bool,
}

impl AlarmScheduler {
    pub const fn new() -> Self {
        Self {
            last_minute: None,
            last_day: None,
            taken_today: false,
        }
    }

    pub const fn taken_today(&self) -> bool {
        self.taken_today
    }

    pub fn mark_taken(&mut self) {
        self.taken_today = true;
    }

    pub fn observe(&mut self, now: &LocalTime, alarm: &AlarmConfig) -> ScheduleOutcome {
        let mut outcome = ScheduleOutcome::default();

        match self.last_day {
            // First reading adopts the day; a dose taken earlier still counts.
            None => self.last_day = Some(now.date),
            Some(day) if day != now.date => {
                debug!("alarm: day rollover date={}", now.date);
                self.last_day = Some(now.date);
                self.taken_today = false;
                outcome.day_rolled_over = true;
            }
            Some(_) => {}
        }

        let stamp = now.minute_stamp();
        if self.last_minute == Some(stamp) {
            return outcome;
        }
        self.last_minute = Some(stamp);

        outcome.fire = alarm.enabled()
            && alarm.hour() == now.hour
            && alarm.minute() == now.minute
            && alarm.day_enabled(now.weekday)
            && !self.taken_today;

        if outcome.fire {
            info!(
                "alarm: fired hour={} minute={} weekday={}",
                now.hour, now.minute, now.weekday
            );
        }
        outcome
    }
}
