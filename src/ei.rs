// Toastwatch — Edge Impulse Inference Interface
//
// The regression model is an opaque artifact: it pulls the window through a
// `get_data(offset, length)` callback and returns per-label scores plus
// timing.  Index 0 of the output is the estimated seconds until burnt.
//
// Architecture:
//   1. STUB back-end (default): estimates time left from the newest frame so
//      the pipeline runs end to end without the C++ SDK compiled in.
//   2. FFI back-end: enable the `edge-impulse` feature; build.rs compiles the
//      exported SDK plus `ffi/ei_shim.cpp`, which exposes a C ABI.

use crate::config::*;
use crate::error::{ClassifierFault, WindowBoundsError};
use crate::window::WindowSource;

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

/// Labels matching the Edge Impulse model output order.
pub const LABELS: [&str; EI_LABEL_COUNT] = ["time_left"];

/// Status code the signal callback returns for an out-of-range request.
pub const SIGNAL_OUT_OF_BOUNDS: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timing {
    pub dsp_ms: i32,
    pub classification_ms: i32,
    pub anomaly_ms: i32,
}

/// Result of a single inference pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceResult {
    pub scores: [f32; EI_LABEL_COUNT],
    pub timing: Timing,
    pub status: i32,
}

impl InferenceResult {
    /// Estimated seconds until the toast burns.
    pub fn time_to_burnt(&self) -> f32 {
        self.scores[0]
    }

    pub fn labelled(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        LABELS.iter().copied().zip(self.scores.iter().copied())
    }
}

/// The external model, consumed as a black box.
pub trait Classifier {
    fn classify(&mut self, signal: &dyn WindowSource) -> Result<InferenceResult, ClassifierFault>;
}

/// Run `classifier` on `signal` and log the outcome.
pub fn infer<C: Classifier + ?Sized>(
    classifier: &mut C,
    signal: &dyn WindowSource,
) -> Result<InferenceResult, ClassifierFault> {
    let result = classifier.classify(signal);

    match &result {
        Ok(r) => {
            for (label, score) in r.labelled() {
                log::debug!("{}: {:.4}", label, score);
            }
            log::debug!(
                "Timing: DSP {} ms, classification {} ms, anomaly {} ms",
                r.timing.dsp_ms,
                r.timing.classification_ms,
                r.timing.anomaly_ms
            );
        }
        Err(ClassifierFault::Bounds(e)) => log::error!("Classifier read outside window: {}", e),
        Err(e) => log::warn!("Inference failed: {}", e),
    }

    result
}

/// The back-end selected at build time.
#[cfg(not(feature = "edge-impulse"))]
pub fn default_classifier() -> StubClassifier {
    StubClassifier
}

#[cfg(feature = "edge-impulse")]
pub fn default_classifier() -> EdgeImpulse {
    EdgeImpulse
}

// ---------------------------------------------------------------------------
// Stub back-end for development and testing without the C++ SDK
// ---------------------------------------------------------------------------

/// Seconds reported when the air looks like the training mean.
const STUB_BASELINE_S: f32 = 120.0;
/// Seconds shaved off per unit of mean standardized deviation.
const STUB_SECONDS_PER_SIGMA: f32 = 30.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct StubClassifier;

impl Classifier for StubClassifier {
    fn classify(&mut self, signal: &dyn WindowSource) -> Result<InferenceResult, ClassifierFault> {
        // Simple heuristic: the further the newest frame drifts above the
        // training mean, the sooner the toast burns.
        let total = signal.total_len();
        let offset = total.checked_sub(NUM_CHANNELS).ok_or(WindowBoundsError {
            offset: 0,
            length: NUM_CHANNELS,
            total,
        })?;
        let newest = signal.get_data(offset, NUM_CHANNELS)?;
        let mean_dev = newest.iter().sum::<f32>() / NUM_CHANNELS as f32;
        let time_left = (STUB_BASELINE_S - mean_dev * STUB_SECONDS_PER_SIGMA).max(0.0);

        log::debug!("STUB inference: mean deviation = {:.2}, time left = {:.1}", mean_dev, time_left);

        Ok(InferenceResult {
            scores: [time_left; EI_LABEL_COUNT],
            timing: Timing::default(),
            status: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Real FFI back-end calling the C ABI shim around the Edge Impulse library
// ---------------------------------------------------------------------------
#[cfg(feature = "edge-impulse")]
mod ffi {
    #[repr(C)]
    pub struct ToastSignal {
        pub get_data: Option<unsafe extern "C" fn(usize, usize, *mut f32) -> i32>,
        pub total_length: usize,
    }

    #[repr(C)]
    pub struct ToastResult {
        pub values: [f32; super::EI_LABEL_COUNT],
        pub dsp_ms: i32,
        pub classification_ms: i32,
        pub anomaly_ms: i32,
    }

    extern "C" {
        pub fn toast_run_classifier(
            signal: *mut ToastSignal,
            result: *mut ToastResult,
            debug: bool,
        ) -> i32;
    }
}

#[cfg(feature = "edge-impulse")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeImpulse;

#[cfg(feature = "edge-impulse")]
impl Classifier for EdgeImpulse {
    fn classify(&mut self, signal: &dyn WindowSource) -> Result<InferenceResult, ClassifierFault> {
        use std::cell::Cell;

        // The callback has no context pointer; the active buffer is parked in
        // a thread-local for the duration of the call.
        thread_local! {
            static ACTIVE: Cell<(*const f32, usize)> = const { Cell::new((core::ptr::null(), 0)) };
            static VIOLATION: Cell<Option<(usize, usize)>> = const { Cell::new(None) };
        }

        unsafe extern "C" fn get_data(offset: usize, length: usize, out: *mut f32) -> i32 {
            let (buf, len) = ACTIVE.with(Cell::get);
            match offset.checked_add(length) {
                Some(end) if !buf.is_null() && end <= len => {
                    // SAFETY: range checked above; `buf` outlives the classifier call.
                    unsafe { core::ptr::copy_nonoverlapping(buf.add(offset), out, length) };
                    0
                }
                _ => {
                    VIOLATION.with(|v| v.set(Some((offset, length))));
                    SIGNAL_OUT_OF_BOUNDS
                }
            }
        }

        let total = signal.total_len();
        let data = signal.get_data(0, total)?;
        ACTIVE.with(|a| a.set((data.as_ptr(), data.len())));
        VIOLATION.with(|v| v.set(None));

        let mut raw = ffi::ToastSignal {
            get_data: Some(get_data),
            total_length: total,
        };
        let mut out = ffi::ToastResult {
            values: [0.0; EI_LABEL_COUNT],
            dsp_ms: 0,
            classification_ms: 0,
            anomaly_ms: 0,
        };

        // SAFETY: both structs are valid for the call; single-task access.
        let status = unsafe { ffi::toast_run_classifier(&mut raw, &mut out, false) };
        ACTIVE.with(|a| a.set((core::ptr::null(), 0)));

        if let Some((offset, length)) = VIOLATION.with(Cell::take) {
            return Err(WindowBoundsError { offset, length, total }.into());
        }
        if status != 0 {
            return Err(ClassifierFault::Status(status));
        }

        Ok(InferenceResult {
            scores: out.values,
            timing: Timing {
                dsp_ms: out.dsp_ms,
                classification_ms: out.classification_ms,
                anomaly_ms: out.anomaly_ms,
            },
            status,
        })
    }
}
