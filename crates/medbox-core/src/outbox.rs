//! Pending side-effect requests raised by the UI state machine.
//!
//! The state machine only records intent here; the main loop drains effects
//! in a fixed priority order and clears each one after its handler ran.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Effect {
    /// Join the Wi-Fi network captured by the password screen and persist
    /// the credentials on success.
    JoinNetwork,
    /// Persist the in-memory alarm configuration.
    SaveAlarm,
    BindCode,
    UploadLog,
    SyncConfig,
    NotifyAlarm,
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::JoinNetwork,
        Effect::SaveAlarm,
        Effect::BindCode,
        Effect::UploadLog,
        Effect::SyncConfig,
        Effect::NotifyAlarm,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::JoinNetwork => "join",
            Self::SaveAlarm => "save_alarm",
            Self::BindCode => "bind",
            Self::UploadLog => "log",
            Self::SyncConfig => "sync",
            Self::NotifyAlarm => "notify",
        }
    }
}

/// Set of pending effects. Raising an already pending effect is a no-op.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Outbox {
    pending: u8,
}

impl Outbox {
    pub const fn new() -> Self {
        Self { pending: 0 }
    }

    pub fn raise(&mut self, effect: Effect) {
        self.pending |= effect.bit();
    }

    pub const fn is_pending(&self, effect: Effect) -> bool {
        self.pending & effect.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Highest-priority pending effect, left pending until [`Self::complete`].
    pub fn next(&self) -> Option<Effect> {
        Effect::ALL
            .into_iter()
            .find(|effect| self.is_pending(*effect))
    }

    pub fn complete(&mut self, effect: Effect) {
        self.pending &= !effect.bit();
    }
}
