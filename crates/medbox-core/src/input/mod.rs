//! Input abstraction layer.
//!
//! Hardware edges are captured into an [`edges::EdgeQueue`] from interrupt
//! context and turned into clean [`InputEvent`]s on the main loop by
//! [`edges::DebouncedInput`].

pub mod debounce;
pub mod edges;
pub mod mock;

/// Logical actions consumed by the app.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputEvent {
    RotateCw,
    RotateCcw,
    Press,
    LidOpened,
    LidClosed,
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error>;
}
