// Toastwatch — Feature Standardizer
//
// Applies the training-time z-score normalization to each raw frame.  The
// table is a fixed artifact of training and is validated once at startup.

use crate::config::{NUM_CHANNELS, STANDARDIZATION_TABLE};
use crate::error::ParamsError;
use crate::frame::{Channel, Frame, StandardizedFrame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardizationParams {
    mean: [f32; NUM_CHANNELS],
    std_dev: [f32; NUM_CHANNELS],
}

impl StandardizationParams {
    /// Rejects any channel whose standard deviation is not a positive finite number.
    pub fn new(table: &[(f32, f32); NUM_CHANNELS]) -> Result<Self, ParamsError> {
        let mut mean = [0.0; NUM_CHANNELS];
        let mut std_dev = [0.0; NUM_CHANNELS];

        for (i, &(m, s)) in table.iter().enumerate() {
            if !(s.is_finite() && s > 0.0) {
                return Err(ParamsError {
                    channel: Channel::ALL[i].name(),
                    std_dev: s,
                });
            }
            mean[i] = m;
            std_dev[i] = s;
        }

        Ok(Self { mean, std_dev })
    }

    /// The table the deployed model was trained with.
    pub fn training() -> Result<Self, ParamsError> {
        Self::new(&STANDARDIZATION_TABLE)
    }

    pub fn mean(&self, channel: Channel) -> f32 {
        self.mean[channel.index()]
    }

    pub fn std_dev(&self, channel: Channel) -> f32 {
        self.std_dev[channel.index()]
    }
}

/// `out[i] = (frame[i] - mean[i]) / std_dev[i]` for every channel.
pub fn standardize(frame: &Frame, params: &StandardizationParams) -> StandardizedFrame {
    let mut out = [0.0; NUM_CHANNELS];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = (frame.0[i] - params.mean[i]) / params.std_dev[i];
    }
    StandardizedFrame(out)
}
