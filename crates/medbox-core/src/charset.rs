//! Character-selection ring used by the password and bind-code screens.
//!
//! The ring is the charset followed by three control entries; the cursor
//! wraps modulo `charset.len() + 3`.

pub const PASSWORD_CHARS: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!@#$%^&*()_+-=[]{};:'\",.<>/?~`";
pub const NUMERIC_CHARS: &str = "0123456789";

/// Entries shown at once on the entry screens.
pub const CAROUSEL_SLOTS: usize = 5;
/// Carousel slot holding the cursor.
pub const CARET_SLOT: usize = CAROUSEL_SLOTS / 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Control {
    Ok,
    Del,
    Back,
}

impl Control {
    pub const ALL: [Control; 3] = [Control::Ok, Control::Del, Control::Back];

    /// Short label that fits one carousel slot.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Del => "<-",
            Self::Back => "RT",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entry {
    Char(char),
    Control(Control),
}

/// Ordered charset + controls. Charsets are ASCII only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CharRing {
    charset: &'static str,
}

impl CharRing {
    pub const PASSWORD: CharRing = CharRing::new(PASSWORD_CHARS);
    pub const NUMERIC: CharRing = CharRing::new(NUMERIC_CHARS);

    pub const fn new(charset: &'static str) -> Self {
        Self { charset }
    }

    pub const fn len(&self) -> u16 {
        self.charset.len() as u16 + Control::ALL.len() as u16
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub fn entry_at(&self, index: u16) -> Entry {
        let index = (index % self.len()) as usize;
        match self.charset.as_bytes().get(index) {
            Some(byte) => Entry::Char(*byte as char),
            None => Entry::Control(Control::ALL[index - self.charset.len()]),
        }
    }

    pub fn step(&self, cursor: u16, clockwise: bool) -> u16 {
        if clockwise {
            rotate_cw(cursor, self.len())
        } else {
            rotate_ccw(cursor, self.len())
        }
    }

    /// Entries around `cursor`, cursor in the middle slot.
    pub fn window<const N: usize>(&self, cursor: u16) -> [Entry; N] {
        let total = self.len();
        let mid = (N / 2) as u16;
        let mut start = cursor % total;
        for _ in 0..mid {
            start = rotate_ccw(start, total);
        }

        let mut slots = [Entry::Control(Control::Ok); N];
        let mut index = start;
        for slot in slots.iter_mut() {
            *slot = self.entry_at(index);
            index = rotate_cw(index, total);
        }
        slots
    }
}

pub fn rotate_cw(cursor: u16, total: u16) -> u16 {
    if total == 0 {
        return 0;
    }
    (cursor % total + 1) % total
}

pub fn rotate_ccw(cursor: u16, total: u16) -> u16 {
    if total == 0 {
        return 0;
    }
    (cursor % total + total - 1) % total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_follow_the_charset() {
        let ring = CharRing::NUMERIC;
        assert_eq!(ring.len(), 13);
        assert_eq!(ring.entry_at(0), Entry::Char('0'));
        assert_eq!(ring.entry_at(9), Entry::Char('9'));
        assert_eq!(ring.entry_at(10), Entry::Control(Control::Ok));
        assert_eq!(ring.entry_at(11), Entry::Control(Control::Del));
        assert_eq!(ring.entry_at(12), Entry::Control(Control::Back));
    }

    #[test]
    fn step_wraps_both_ways() {
        let ring = CharRing::NUMERIC;
        assert_eq!(ring.step(12, true), 0);
        assert_eq!(ring.step(0, false), 12);
    }

    #[test]
    fn interleaved_steps_land_on_net_offset() {
        let ring = CharRing::PASSWORD;
        let total = ring.len() as i32;
        // 7 forward, 19 back, in an arbitrary interleaving.
        let pattern = [
            true, false, false, true, false, false, false, true, false, false, true, false, false,
            false, true, false, false, false, false, true, false, false, true, false, false, false,
        ];
        let mut cursor = 0u16;
        let (mut fwd, mut back) = (0i32, 0i32);
        for clockwise in pattern {
            cursor = ring.step(cursor, clockwise);
            if clockwise {
                fwd += 1;
            } else {
                back += 1;
            }
        }
        assert_eq!(cursor as i32, (fwd - back).rem_euclid(total));
    }

    #[test]
    fn window_centres_on_cursor() {
        let ring = CharRing::NUMERIC;
        let slots = ring.window::<5>(0);
        assert_eq!(
            slots,
            [
                Entry::Control(Control::Del),
                Entry::Control(Control::Back),
                Entry::Char('0'),
                Entry::Char('1'),
                Entry::Char('2'),
            ]
        );
    }
}
