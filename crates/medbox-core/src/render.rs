//! Screen view models and their 128x64 text layouts.
//!
//! The app exposes a [`Screen`] snapshot; [`draw`] turns it into text
//! placements on any [`TextDisplay`]. Layout coordinates are in pixels with
//! the origin at the top-left corner.

use core::fmt::Write;

use heapless::String;

use crate::{
    alarm::WEEKDAY_NAMES,
    charset::{CARET_SLOT, CAROUSEL_SLOTS, Entry},
};

/// Glyph height passed to the display for every line.
pub const TEXT_SIZE: u8 = 8;
/// Characters of the input buffer visible on the entry screens.
pub const BUFFER_TAIL_CHARS: usize = 13;
/// Characters of a scan label visible on the network screen.
pub const SCAN_LABEL_CHARS: usize = 16;

const MENU_FIRST_ROW_Y: i32 = 16;
const MENU_ROW_STEP_Y: i32 = 8;
const CAROUSEL_X: i32 = 10;
const CAROUSEL_STEP_X: i32 = 24;
const CAROUSEL_Y: i32 = 40;
const CARET_Y: i32 = 52;

/// Minimal text-only display surface.
pub trait TextDisplay {
    type Error;

    fn clear(&mut self) -> Result<(), Self::Error>;
    fn text(&mut self, text: &str, x: i32, y: i32, size: u8) -> Result<(), Self::Error>;
    fn show(&mut self) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BannerLine<'a> {
    pub text: &'a str,
    pub y: i32,
}

impl<'a> BannerLine<'a> {
    pub const fn at(y: i32, text: &'a str) -> Self {
        Self { text, y }
    }

    /// Single status line in the usual banner row.
    pub const fn status(text: &'a str) -> Self {
        Self::at(20, text)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeekdaySlot {
    Day { index: u8, enabled: bool },
    SaveAndExit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClockFace {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Screen<'a> {
    NetworkScan {
        label: Option<&'a str>,
    },
    TextEntry {
        title: &'a str,
        buffer: &'a str,
        carousel: [Entry; CAROUSEL_SLOTS],
    },
    Clock {
        /// `None` until the wall clock has been set.
        time: Option<ClockFace>,
        /// Alarm `(hour, minute)` when enabled.
        alarm: Option<(u8, u8)>,
        taken: bool,
    },
    Menu {
        items: &'a [&'a str],
        cursor: usize,
    },
    SetHour {
        hour: u8,
    },
    SetMinute {
        minute: u8,
    },
    SetWeekday {
        slot: WeekdaySlot,
    },
    Ringing {
        flash_on: bool,
    },
    Banner {
        lines: &'a [BannerLine<'a>],
    },
}

/// Render `screen` and present it.
pub fn draw<D>(screen: &Screen<'_>, display: &mut D) -> Result<(), D::Error>
where
    D: TextDisplay,
{
    display.clear()?;

    match *screen {
        Screen::NetworkScan { label } => {
            let label = label.unwrap_or("No WiFi found");
            display.text(head_chars(label, SCAN_LABEL_CHARS), 0, 0, TEXT_SIZE)?;
        }
        Screen::TextEntry {
            title,
            buffer,
            carousel,
        } => {
            display.text(title, 0, 0, TEXT_SIZE)?;
            display.text(tail_chars(buffer, BUFFER_TAIL_CHARS), 0, 16, TEXT_SIZE)?;

            for (slot, entry) in carousel.iter().enumerate() {
                let x = CAROUSEL_X + slot as i32 * CAROUSEL_STEP_X;
                let mut glyph = [0u8; 4];
                let label = match entry {
                    Entry::Char(ch) => &*ch.encode_utf8(&mut glyph),
                    Entry::Control(control) => control.label(),
                };
                display.text(label, x, CAROUSEL_Y, TEXT_SIZE)?;

                if slot == CARET_SLOT {
                    let nudge = if label.len() > 1 { 4 } else { 0 };
                    display.text("^", x + nudge, CARET_Y, TEXT_SIZE)?;
                }
            }
        }
        Screen::Clock { time, alarm, taken } => {
            let mut line: String<24> = String::new();
            match time {
                Some(face) => {
                    let _ = write!(
                        line,
                        "{:02}:{:02}:{:02}",
                        face.hour, face.minute, face.second
                    );
                }
                None => {
                    let _ = line.push_str("--:--:--");
                }
            }
            display.text(&line, 30, 20, TEXT_SIZE)?;

            line.clear();
            match alarm {
                Some((hour, minute)) => {
                    let mark = if taken { "[V]" } else { "[ ]" };
                    let _ = write!(line, "Alarm: {hour:02}:{minute:02} {mark}");
                }
                None => {
                    let _ = line.push_str("Alarm: OFF");
                }
            }
            display.text(&line, 0, 40, TEXT_SIZE)?;
        }
        Screen::Menu { items, cursor } => {
            display.text("--- Menu ---", 0, 0, TEXT_SIZE)?;
            for (row, item) in items.iter().enumerate() {
                let mut line: String<24> = String::new();
                let marker = if row == cursor { "> " } else { "  " };
                let _ = write!(line, "{marker}{item}");
                let y = MENU_FIRST_ROW_Y + row as i32 * MENU_ROW_STEP_Y;
                display.text(&line, 0, y, TEXT_SIZE)?;
            }
        }
        Screen::SetHour { hour } => draw_value(display, "Set Hour", hour)?,
        Screen::SetMinute { minute } => draw_value(display, "Set Minute", minute)?,
        Screen::SetWeekday { slot } => {
            display.text("Set Days", 0, 0, TEXT_SIZE)?;
            match slot {
                WeekdaySlot::Day { index, enabled } => {
                    let mut line: String<16> = String::new();
                    let name = WEEKDAY_NAMES.get(index as usize).copied().unwrap_or("?");
                    let status = if enabled { "ON" } else { "OFF" };
                    let _ = write!(line, "{name}: {status}");
                    display.text(&line, 30, 30, TEXT_SIZE)?;
                }
                WeekdaySlot::SaveAndExit => display.text("Save & Exit", 20, 30, TEXT_SIZE)?,
            }
        }
        Screen::Ringing { flash_on } => {
            if flash_on {
                display.text("Time to Eat!", 20, 30, TEXT_SIZE)?;
            }
        }
        Screen::Banner { lines } => {
            for line in lines {
                display.text(line.text, 0, line.y, TEXT_SIZE)?;
            }
        }
    }

    display.show()
}

fn draw_value<D>(display: &mut D, title: &str, value: u8) -> Result<(), D::Error>
where
    D: TextDisplay,
{
    let mut line: String<4> = String::new();
    let _ = write!(line, "{value:02}");
    display.text(title, 0, 0, TEXT_SIZE)?;
    display.text(&line, 50, 30, TEXT_SIZE)
}

/// Last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let skip = total - max_chars;
    match text.char_indices().nth(skip) {
        Some((offset, _)) => &text[offset..],
        None => "",
    }
}

/// First `max_chars` characters of `text`.
pub fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Display double that records every placed line.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingDisplay {
    pub frame: std::vec::Vec<(std::string::String, i32, i32)>,
    pub shown: std::vec::Vec<std::vec::Vec<std::string::String>>,
}

#[cfg(test)]
impl RecordingDisplay {
    pub fn shown_texts(&self) -> std::vec::Vec<std::string::String> {
        self.shown.iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
impl TextDisplay for RecordingDisplay {
    type Error = core::convert::Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.frame.clear();
        Ok(())
    }

    fn text(&mut self, text: &str, x: i32, y: i32, _size: u8) -> Result<(), Self::Error> {
        self.frame.push((text.into(), x, y));
        Ok(())
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        let frame = self.frame.iter().map(|(text, _, _)| text.clone()).collect();
        self.shown.push(frame);
        Ok(())
    }
}
