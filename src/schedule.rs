// Toastwatch — Sample Tick Gate
//
// The firmware loop busy-polls; work runs only once `period` has elapsed on
// the monotonic millisecond clock.  Wrapping arithmetic keeps the gate valid
// across the ~49-day rollover of a u32 millisecond counter.

pub struct Ticker {
    period_ms: u32,
    last_ms: u32,
}

impl Ticker {
    pub fn new(period_ms: u32, now_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
        }
    }

    /// `true` (and restart the period) once `now - last >= period`.
    pub fn due(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) >= self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}
