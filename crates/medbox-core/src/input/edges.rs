//! Interrupt-to-loop hand-off for raw input edges.
//!
//! Interrupt handlers only timestamp an edge and enqueue it; all debouncing
//! and event ordering happens when the main loop drains the queue.

use heapless::spsc::{Consumer, Producer, Queue};

use super::{
    InputEvent, InputProvider,
    debounce::{ButtonDebounce, LidConfirm, RotaryDebounce},
};
use crate::config::InputTiming;

pub const EDGE_QUEUE_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RawEdge {
    /// Primary encoder phase edge and the secondary phase level at that instant.
    Rotary { at_ms: u64, secondary_high: bool },
    /// Push button went down (falling edge on the active-low pin).
    ButtonDown { at_ms: u64 },
    /// Push button came back up.
    ButtonUp { at_ms: u64 },
}

pub type EdgeQueue = Queue<RawEdge, EDGE_QUEUE_DEPTH>;
pub type EdgeProducer<'q> = Producer<'q, RawEdge, EDGE_QUEUE_DEPTH>;
pub type EdgeConsumer<'q> = Consumer<'q, RawEdge, EDGE_QUEUE_DEPTH>;

/// Level-sampled inputs and the monotonic clock, read from the main loop.
pub trait InputLevels {
    type Error;

    fn now_ms(&mut self) -> u64;
    /// `true` when either lid switch reads open.
    fn lid_open(&mut self) -> Result<bool, Self::Error>;
}

/// Debounced [`InputProvider`] over queued edges plus polled levels.
pub struct DebouncedInput<'q, L>
where
    L: InputLevels,
{
    edges: EdgeConsumer<'q>,
    levels: L,
    rotary: RotaryDebounce,
    button: ButtonDebounce,
    lid: LidConfirm,
}

impl<'q, L> DebouncedInput<'q, L>
where
    L: InputLevels,
{
    pub fn new(edges: EdgeConsumer<'q>, levels: L, timing: InputTiming) -> Self {
        Self {
            edges,
            levels,
            rotary: RotaryDebounce::new(timing.rotary_guard_ms),
            button: ButtonDebounce::new(timing.press_guard_ms, timing.press_settle_ms),
            lid: LidConfirm::new(timing.lid_confirm_ms),
        }
    }

    pub fn levels_mut(&mut self) -> &mut L {
        &mut self.levels
    }
}

impl<L> InputProvider for DebouncedInput<'_, L>
where
    L: InputLevels,
{
    type Error = L::Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        while let Some(edge) = self.edges.dequeue() {
            match edge {
                RawEdge::Rotary {
                    at_ms,
                    secondary_high,
                } => {
                    if let Some(event) = self.rotary.on_edge(at_ms, secondary_high) {
                        return Ok(Some(event));
                    }
                }
                RawEdge::ButtonDown { at_ms } => {
                    self.button.on_press_edge(at_ms);
                }
                RawEdge::ButtonUp { at_ms } => {
                    if let Some(event) = self.button.on_release_edge(at_ms) {
                        return Ok(Some(event));
                    }
                }
            }
        }

        let now_ms = self.levels.now_ms();
        if let Some(event) = self.button.poll(now_ms) {
            return Ok(Some(event));
        }

        let open = self.levels.lid_open()?;
        Ok(self.lid.poll(now_ms, open))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeLevels {
        now_ms: u64,
        open: bool,
    }

    impl InputLevels for FakeLevels {
        type Error = core::convert::Infallible;

        fn now_ms(&mut self) -> u64 {
            self.now_ms
        }

        fn lid_open(&mut self) -> Result<bool, Self::Error> {
            Ok(self.open)
        }
    }

    fn drain<L: InputLevels<Error = core::convert::Infallible>>(
        input: &mut DebouncedInput<'_, L>,
    ) -> std::vec::Vec<InputEvent> {
        let mut events = std::vec::Vec::new();
        while let Ok(Some(event)) = input.poll_event() {
            events.push(event);
        }
        events
    }

    #[test]
    fn rotary_edges_become_events_in_order() {
        let mut queue = EdgeQueue::new();
        let (mut producer, consumer) = queue.split();
        let mut input = DebouncedInput::new(consumer, FakeLevels::default(), InputTiming::default());

        producer
            .enqueue(RawEdge::Rotary {
                at_ms: 10,
                secondary_high: false,
            })
            .unwrap();
        producer
            .enqueue(RawEdge::Rotary {
                at_ms: 12,
                secondary_high: false,
            })
            .unwrap();
        producer
            .enqueue(RawEdge::Rotary {
                at_ms: 30,
                secondary_high: true,
            })
            .unwrap();

        assert_eq!(
            drain(&mut input),
            [InputEvent::RotateCw, InputEvent::RotateCcw]
        );
    }

    #[test]
    fn button_press_waits_for_settle_window() {
        let mut queue = EdgeQueue::new();
        let (mut producer, consumer) = queue.split();
        let mut input = DebouncedInput::new(consumer, FakeLevels::default(), InputTiming::default());

        input.levels_mut().now_ms = 100;
        producer.enqueue(RawEdge::ButtonDown { at_ms: 100 }).unwrap();
        producer.enqueue(RawEdge::ButtonDown { at_ms: 104 }).unwrap();
        assert!(drain(&mut input).is_empty());

        input.levels_mut().now_ms = 125;
        assert_eq!(drain(&mut input), [InputEvent::Press]);
    }

    #[test]
    fn tap_released_before_a_late_poll_still_counts() {
        let mut queue = EdgeQueue::new();
        let (mut producer, consumer) = queue.split();
        let mut input = DebouncedInput::new(consumer, FakeLevels::default(), InputTiming::default());

        // The loop was busy for the whole tap.
        producer.enqueue(RawEdge::ButtonDown { at_ms: 1_000 }).unwrap();
        producer.enqueue(RawEdge::ButtonUp { at_ms: 1_120 }).unwrap();
        input.levels_mut().now_ms = 1_300;
        assert_eq!(drain(&mut input), [InputEvent::Press]);
        assert!(drain(&mut input).is_empty());
    }

    #[test]
    fn contact_bounce_on_press_yields_one_press() {
        let mut queue = EdgeQueue::new();
        let (mut producer, consumer) = queue.split();
        let mut input = DebouncedInput::new(consumer, FakeLevels::default(), InputTiming::default());

        for edge in [
            RawEdge::ButtonDown { at_ms: 500 },
            RawEdge::ButtonUp { at_ms: 502 },
            RawEdge::ButtonDown { at_ms: 503 },
            RawEdge::ButtonUp { at_ms: 600 },
            // Release chatter inside the spacing window.
            RawEdge::ButtonDown { at_ms: 601 },
            RawEdge::ButtonUp { at_ms: 602 },
        ] {
            producer.enqueue(edge).unwrap();
        }
        input.levels_mut().now_ms = 700;
        assert_eq!(drain(&mut input), [InputEvent::Press]);
    }

    #[test]
    fn glitch_shorter_than_settle_window_is_dropped() {
        let mut queue = EdgeQueue::new();
        let (mut producer, consumer) = queue.split();
        let mut input = DebouncedInput::new(consumer, FakeLevels::default(), InputTiming::default());

        producer.enqueue(RawEdge::ButtonDown { at_ms: 2_000 }).unwrap();
        producer.enqueue(RawEdge::ButtonUp { at_ms: 2_008 }).unwrap();
        input.levels_mut().now_ms = 2_500;
        assert!(drain(&mut input).is_empty());
    }

    #[test]
    fn sustained_lid_open_is_confirmed_once() {
        let mut queue = EdgeQueue::new();
        let (_producer, consumer) = queue.split();
        let mut input = DebouncedInput::new(consumer, FakeLevels::default(), InputTiming::default());

        input.levels_mut().open = true;
        for now_ms in (0..=2_000).step_by(20) {
            input.levels_mut().now_ms = now_ms;
            let events = drain(&mut input);
            if now_ms == 500 {
                assert_eq!(events, [InputEvent::LidOpened]);
            } else {
                assert!(events.is_empty(), "unexpected events at {now_ms}");
            }
        }

        input.levels_mut().open = false;
        assert_eq!(drain(&mut input), [InputEvent::LidClosed]);
    }
}
