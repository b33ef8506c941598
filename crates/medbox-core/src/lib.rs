//! Control core for the medication reminder box.
//!
//! Everything in this crate is hardware independent and runs on the host:
//! the debounced input pipeline, the UI state machine, the alarm scheduler,
//! the pending-effect outbox and the retrying remote sync protocol. Board
//! crates plug in through the collaborator traits in [`input`], [`render`],
//! [`storage`] and [`sync`].

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod alarm;
pub mod app;
pub mod charset;
pub mod clock;
pub mod config;
pub mod input;
pub mod outbox;
pub mod render;
pub mod storage;
pub mod sync;
