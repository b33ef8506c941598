//! Time-injected debouncers for the encoder, push button and lid switches.

use super::InputEvent;

/// Rejects encoder chatter on the primary phase.
#[derive(Clone, Copy, Debug)]
pub struct RotaryDebounce {
    guard_ms: u64,
    last_accepted_ms: Option<u64>,
}

impl RotaryDebounce {
    pub const fn new(guard_ms: u64) -> Self {
        Self {
            guard_ms,
            last_accepted_ms: None,
        }
    }

    /// Edge on the primary phase; `secondary_high` is the other phase's level
    /// at that instant.
    pub fn on_edge(&mut self, at_ms: u64, secondary_high: bool) -> Option<InputEvent> {
        if let Some(last) = self.last_accepted_ms
            && at_ms.saturating_sub(last) < self.guard_ms
        {
            return None;
        }
        self.last_accepted_ms = Some(at_ms);

        Some(if secondary_high {
            InputEvent::RotateCcw
        } else {
            InputEvent::RotateCw
        })
    }
}

/// Press acceptance from timestamped edges: minimum spacing between accepted
/// presses, a re-entrancy guard while an edge is settling, and cancellation
/// when the release lands inside the settle window.
#[derive(Clone, Copy, Debug)]
pub struct ButtonDebounce {
    guard_ms: u64,
    settle_ms: u64,
    last_accepted_ms: Option<u64>,
    settling_since: Option<u64>,
}

impl ButtonDebounce {
    pub const fn new(guard_ms: u64, settle_ms: u64) -> Self {
        Self {
            guard_ms,
            settle_ms,
            last_accepted_ms: None,
            settling_since: None,
        }
    }

    /// Returns `true` when the press edge opened a settle window.
    pub fn on_press_edge(&mut self, at_ms: u64) -> bool {
        if self.settling_since.is_some() {
            return false;
        }
        if let Some(last) = self.last_accepted_ms
            && at_ms.saturating_sub(last) < self.guard_ms
        {
            return false;
        }

        self.settling_since = Some(at_ms);
        true
    }

    /// A release inside the settle window cancels the pending press without
    /// starting the spacing window; a later one confirms it.
    pub fn on_release_edge(&mut self, at_ms: u64) -> Option<InputEvent> {
        let since = self.settling_since.take()?;
        if at_ms.saturating_sub(since) < self.settle_ms {
            return None;
        }
        Some(self.accept(since))
    }

    pub fn is_settling(&self) -> bool {
        self.settling_since.is_some()
    }

    /// Accepts a pending press once the settle window has passed with no
    /// release queued inside it.
    pub fn poll(&mut self, now_ms: u64) -> Option<InputEvent> {
        let since = self.settling_since?;
        if now_ms.saturating_sub(since) < self.settle_ms {
            return None;
        }
        self.settling_since = None;
        Some(self.accept(since))
    }

    fn accept(&mut self, pressed_at_ms: u64) -> InputEvent {
        self.last_accepted_ms = Some(pressed_at_ms);
        InputEvent::Press
    }
}

/// Two-phase lid confirmation. An open reading has to hold for the confirm
/// window; one `LidOpened` per open period, `LidClosed` when it shuts again.
#[derive(Clone, Copy, Debug)]
pub struct LidConfirm {
    confirm_ms: u64,
    open_since: Option<u64>,
    confirmed: bool,
}

impl LidConfirm {
    pub const fn new(confirm_ms: u64) -> Self {
        Self {
            confirm_ms,
            open_since: None,
            confirmed: false,
        }
    }

    pub fn poll(&mut self, now_ms: u64, open: bool) -> Option<InputEvent> {
        if !open {
            self.open_since = None;
            if self.confirmed {
                self.confirmed = false;
                return Some(InputEvent::LidClosed);
            }
            return None;
        }

        if self.confirmed {
            return None;
        }

        match self.open_since {
            None => {
                self.open_since = Some(now_ms);
                None
            }
            Some(since) if now_ms.saturating_sub(since) >= self.confirm_ms => {
                self.open_since = None;
                self.confirmed = true;
                Some(InputEvent::LidOpened)
            }
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotary_rejects_edges_inside_guard() {
        let mut rotary = RotaryDebounce::new(5);
        assert_eq!(rotary.on_edge(100, false), Some(InputEvent::RotateCw));
        assert_eq!(rotary.on_edge(103, false), None);
        assert_eq!(rotary.on_edge(105, true), Some(InputEvent::RotateCcw));
    }

    #[test]
    fn button_needs_settle_and_spacing() {
        let mut button = ButtonDebounce::new(250, 20);
        assert!(button.on_press_edge(1_000));
        // Re-entrant edge while settling is dropped.
        assert!(!button.on_press_edge(1_005));
        assert_eq!(button.poll(1_010), None);
        assert_eq!(button.poll(1_020), Some(InputEvent::Press));
        assert!(!button.is_settling());

        assert!(!button.on_press_edge(1_200));
        assert!(button.on_press_edge(1_270));
    }

    #[test]
    fn release_inside_settle_window_cancels_press() {
        let mut button = ButtonDebounce::new(250, 20);
        assert!(button.on_press_edge(0));
        assert_eq!(button.on_release_edge(12), None);
        assert!(!button.is_settling());
        assert_eq!(button.poll(500), None);
        // Rejected bounce does not start the spacing window.
        assert!(button.on_press_edge(30));
    }

    #[test]
    fn release_after_settle_window_confirms_press() {
        let mut button = ButtonDebounce::new(250, 20);
        assert!(button.on_press_edge(1_000));
        assert_eq!(button.on_release_edge(1_120), Some(InputEvent::Press));
        assert_eq!(button.poll(1_300), None);
        // Spacing counts from the press edge.
        assert!(!button.on_press_edge(1_240));
        assert!(button.on_press_edge(1_250));
    }

    #[test]
    fn release_without_pending_press_is_ignored() {
        let mut button = ButtonDebounce::new(250, 20);
        assert_eq!(button.on_release_edge(40), None);
        assert!(button.on_press_edge(50));
    }

    #[test]
    fn lid_open_must_persist_before_confirming() {
        let mut lid = LidConfirm::new(500);
        assert_eq!(lid.poll(0, true), None);
        assert_eq!(lid.poll(200, false), None);
        assert_eq!(lid.poll(300, true), None);
        assert_eq!(lid.poll(700, true), None);
        assert_eq!(lid.poll(800, true), Some(InputEvent::LidOpened));
        assert_eq!(lid.poll(5_000, true), None);
        assert_eq!(lid.poll(5_020, false), Some(InputEvent::LidClosed));
        assert_eq!(lid.poll(5_040, false), None);
    }
}
