// Toastwatch — Control-loop applications
//
// Exactly one of these runs per build.  Both are driven by the firmware loop
// calling `poll(now_ms)` as often as it likes; work is time-gated inside.

pub mod collect;
pub mod monitor;

pub use collect::Collector;
pub use monitor::{TickOutcome, ToastMonitor};
