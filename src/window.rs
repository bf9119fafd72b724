// Toastwatch — Rolling Window Buffer
//
// Fixed-capacity FIFO over standardized frames, flattened into the exact
// buffer layout the classifier consumes: oldest frame at index 0, newest in
// the last NUM_CHANNELS slots.  Zero-filled at startup (warm-up period).

use crate::config::{EI_DSP_INPUT_FRAME_SIZE, NUM_CHANNELS, WINDOW_LEN};
use crate::error::WindowBoundsError;
use crate::frame::StandardizedFrame;

/// Pull-style access to classifier input, bounds-checked.
pub trait WindowSource {
    /// Total number of floats available.
    fn total_len(&self) -> usize;

    /// Exactly `length` contiguous floats starting at `offset`.
    fn get_data(&self, offset: usize, length: usize) -> Result<&[f32], WindowBoundsError>;
}

#[derive(Debug, Clone)]
pub struct Window {
    buf: [f32; EI_DSP_INPUT_FRAME_SIZE],
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    pub fn new() -> Self {
        Self {
            buf: [0.0; EI_DSP_INPUT_FRAME_SIZE],
        }
    }

    /// Evict the oldest frame and append `frame` as the newest.
    pub fn push(&mut self, frame: &StandardizedFrame) {
        self.buf.copy_within(NUM_CHANNELS.., 0);
        self.buf[EI_DSP_INPUT_FRAME_SIZE - NUM_CHANNELS..].copy_from_slice(&frame.0);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buf
    }

    /// Frames oldest-first.
    pub fn frames(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.buf.chunks_exact(NUM_CHANNELS)
    }

    pub fn newest(&self) -> &[f32] {
        &self.buf[(WINDOW_LEN - 1) * NUM_CHANNELS..]
    }
}

impl WindowSource for Window {
    fn total_len(&self) -> usize {
        self.buf.len()
    }

    fn get_data(&self, offset: usize, length: usize) -> Result<&[f32], WindowBoundsError> {
        let out_of_bounds = WindowBoundsError {
            offset,
            length,
            total: self.buf.len(),
        };
        let end = offset.checked_add(length).ok_or(out_of_bounds)?;
        self.buf.get(offset..end).ok_or(out_of_bounds)
    }
}
