// Toastwatch — Channels, Frames & Sensor Readings

use crate::config::NUM_CHANNELS;

// ---------------------------------------------------------------------------
// Channels (order must match the training data)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Temperature,
    Humidity,
    Co2,
    Tvoc,
    Voc,
    No2,
    Ethanol,
    Co,
    Nh3,
}

impl Channel {
    pub const ALL: [Channel; NUM_CHANNELS] = [
        Self::Temperature,
        Self::Humidity,
        Self::Co2,
        Self::Tvoc,
        Self::Voc,
        Self::No2,
        Self::Ethanol,
        Self::Co,
        Self::Nh3,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Co2 => "co2",
            Self::Tvoc => "tvoc",
            Self::Voc => "voc",
            Self::No2 => "no2",
            Self::Ethanol => "ethanol",
            Self::Co => "co",
            Self::Nh3 => "nh3",
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One raw sample across all channels, in [`Channel::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame(pub [f32; NUM_CHANNELS]);

/// A frame after per-channel standardization; the unit the window stores.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StandardizedFrame(pub [f32; NUM_CHANNELS]);

impl Frame {
    pub fn get(&self, channel: Channel) -> f32 {
        self.0[channel.index()]
    }
}

impl StandardizedFrame {
    pub fn splat(value: f32) -> Self {
        Self([value; NUM_CHANNELS])
    }
}

// ---------------------------------------------------------------------------
// Sensor Readings (engineering units, one acquisition)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReadings {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_kpa: f32,
    pub co2_ppm: f32,
    pub tvoc_ppb: f32,
    pub voc_v: f32,
    pub no2_v: f32,
    pub ethanol_v: f32,
    pub co_v: f32,
    pub nh3_v: f32,
}

impl SensorReadings {
    /// Model input frame.  Pressure is logged but not a model channel.
    pub fn frame(&self) -> Frame {
        Frame([
            self.temperature_c,
            self.humidity_pct,
            self.co2_ppm,
            self.tvoc_ppb,
            self.voc_v,
            self.no2_v,
            self.ethanol_v,
            self.co_v,
            self.nh3_v,
        ])
    }
}
