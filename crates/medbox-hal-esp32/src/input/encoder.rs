//! GPIO edge capture for the rotary encoder and push button, plus the
//! level-sampled lid switches.
//!
//! The interrupt handler only timestamps edges and pushes them onto the
//! shared edge queue; debouncing happens in
//! [`medbox_core::input::edges::DebouncedInput`] on the main loop.

use core::{
    cell::RefCell,
    sync::atomic::{AtomicU32, Ordering},
};

use critical_section::Mutex;
use esp_hal::{
    gpio::{Event, Input, Io},
    handler, ram,
    time::Instant,
};
use medbox_core::input::edges::{EdgeProducer, InputLevels, RawEdge};

struct EdgePins {
    clk: Input<'static>,
    dt: Input<'static>,
    sw: Input<'static>,
    producer: EdgeProducer<'static>,
}

static EDGE_PINS: Mutex<RefCell<Option<EdgePins>>> = Mutex::new(RefCell::new(None));
static DROPPED_EDGES: AtomicU32 = AtomicU32::new(0);

/// Milliseconds since boot, shared by the handler and the main loop.
pub fn now_ms() -> u64 {
    Instant::now().duration_since_epoch().as_millis()
}

/// Edges lost to a full queue since the last call.
pub fn take_dropped_edges() -> u32 {
    DROPPED_EDGES.swap(0, Ordering::Relaxed)
}

/// Hands the encoder pins to the edge handler and arms interrupts on the
/// CLK falling edge and on both SW edges.
pub fn install(
    io: &mut Io<'_>,
    mut clk: Input<'static>,
    dt: Input<'static>,
    mut sw: Input<'static>,
    producer: EdgeProducer<'static>,
) {
    io.set_interrupt_handler(on_gpio_edge);

    critical_section::with(|cs| {
        clk.listen(Event::FallingEdge);
        sw.listen(Event::AnyEdge);
        EDGE_PINS.borrow_ref_mut(cs).replace(EdgePins {
            clk,
            dt,
            sw,
            producer,
        });
    });
}

#[handler]
#[ram]
fn on_gpio_edge() {
    let at_ms = now_ms();

    critical_section::with(|cs| {
        let mut binding = EDGE_PINS.borrow_ref_mut(cs);
        let Some(pins) = binding.as_mut() else {
            return;
        };

        if pins.clk.is_interrupt_set() {
            pins.clk.clear_interrupt();
            // Ignore the rising half of a bounce that slipped past the edge filter.
            if pins.clk.is_low() {
                let edge = RawEdge::Rotary {
                    at_ms,
                    secondary_high: pins.dt.is_high(),
                };
                push_edge(&mut pins.producer, edge);
            }
        }

        if pins.sw.is_interrupt_set() {
            pins.sw.clear_interrupt();
            // Active-low: the level after the edge tells its direction.
            let edge = if pins.sw.is_low() {
                RawEdge::ButtonDown { at_ms }
            } else {
                RawEdge::ButtonUp { at_ms }
            };
            push_edge(&mut pins.producer, edge);
        }
    });
}

#[ram]
fn push_edge(producer: &mut EdgeProducer<'static>, edge: RawEdge) {
    if producer.enqueue(edge).is_err() {
        DROPPED_EDGES.fetch_add(1, Ordering::Relaxed);
    }
}

/// Pull-up lid switches read low when the lid is open.
pub struct PinLevels {
    lid_a: Input<'static>,
    lid_b: Input<'static>,
}

impl PinLevels {
    pub fn new(lid_a: Input<'static>, lid_b: Input<'static>) -> Self {
        Self { lid_a, lid_b }
    }
}

impl InputLevels for PinLevels {
    type Error = core::convert::Infallible;

    fn now_ms(&mut self) -> u64 {
        now_ms()
    }

    fn lid_open(&mut self) -> Result<bool, Self::Error> {
        Ok(self.lid_a.is_low() || self.lid_b.is_low())
    }
}
