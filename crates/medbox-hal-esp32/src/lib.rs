//! ESP32 board support for the medication reminder box: edge interrupts and
//! level sampling, the SSD1306 panel, the flash record store and Wi-Fi
//! station plumbing.

#![no_std]

extern crate alloc;

pub mod input;
pub mod network;
pub mod platform;
pub mod storage;
