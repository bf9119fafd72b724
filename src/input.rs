// Toastwatch — Button Input
//
// Debounced button handler.  A level change is committed only after the raw
// input has held the new level for the full debounce window.  Time is passed
// in by the caller so the filter runs the same on the bench and in tests.

use embedded_hal::digital::InputPin;

use crate::config::DEBOUNCE_DELAY_MS;

/// Debounce filter over a raw digital level.
pub struct Debouncer {
    delay_ms: u32,

    // Debounce state
    last_raw: bool,
    last_change_ms: u32,
    stable: bool,
}

impl Debouncer {
    pub fn new(initial_level: bool, now_ms: u32) -> Self {
        Self::with_delay(initial_level, now_ms, DEBOUNCE_DELAY_MS)
    }

    pub fn with_delay(initial_level: bool, now_ms: u32, delay_ms: u32) -> Self {
        Self {
            delay_ms,
            last_raw: initial_level,
            last_change_ms: now_ms,
            stable: initial_level,
        }
    }

    pub fn level(&self) -> bool {
        self.stable
    }

    /// Feed one raw sample.  Returns the new stable level on a committed change.
    pub fn update(&mut self, raw: bool, now_ms: u32) -> Option<bool> {
        // ---- debounce filter ----
        if raw != self.last_raw {
            self.last_change_ms = now_ms;
        }
        self.last_raw = raw;

        let stable_ms = now_ms.wrapping_sub(self.last_change_ms);
        if stable_ms < self.delay_ms || raw == self.stable {
            return None;
        }

        self.stable = raw;
        Some(raw)
    }
}

/// Pull-up push button (active LOW) reporting debounced press edges.
pub struct Button<P> {
    pin: P,
    debounce: Debouncer,
}

impl<P: InputPin> Button<P> {
    pub fn new(mut pin: P, now_ms: u32) -> Self {
        // pull-up → idle HIGH; a read error is treated as released
        let level = pin.is_high().unwrap_or(true);
        Self {
            pin,
            debounce: Debouncer::new(level, now_ms),
        }
    }

    /// Poll every loop iteration.  `true` once per debounced press.
    pub fn pressed(&mut self, now_ms: u32) -> bool {
        let raw = match self.pin.is_high() {
            Ok(level) => level,
            Err(_) => {
                log::warn!("Button read failed");
                return false;
            }
        };
        // Active LOW: a committed fall to LOW is a press.
        self.debounce.update(raw, now_ms) == Some(false)
    }
}
