// Toastwatch — Fault Types
//
// Sensor and classifier faults are recoverable per tick; bounds violations
// are classifier contract bugs.  Boot-level code wraps these in `anyhow`.

use core::fmt;

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// Physical sensor sources polled each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Bme680,
    Sgp30,
    GasMultichannel,
    Nh3Adc,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bme680 => "BME680",
            Self::Sgp30 => "SGP30",
            Self::GasMultichannel => "multichannel gas",
            Self::Nh3Adc => "NH3 ADC",
        })
    }
}

/// A single sensor read (or init) failed.  The tick is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SensorFault {
    #[error("{sensor}: I2C transfer failed ({kind:?})")]
    Bus { sensor: Sensor, kind: ErrorKind },

    #[error("{sensor}: CRC mismatch in response")]
    Crc { sensor: Sensor },

    #[error("{sensor}: measurement not ready")]
    NotReady { sensor: Sensor },

    #[error("{sensor}: unexpected chip id {id:#04x}")]
    WrongChip { sensor: Sensor, id: u8 },

    #[error("NH3 ADC read failed (esp_err {0})")]
    Adc(i32),
}

impl SensorFault {
    pub fn sensor(&self) -> Sensor {
        match self {
            Self::Bus { sensor, .. }
            | Self::Crc { sensor }
            | Self::NotReady { sensor }
            | Self::WrongChip { sensor, .. } => *sensor,
            Self::Adc(_) => Sensor::Nh3Adc,
        }
    }

    /// Map an embedded-hal I2C error onto a fault for `sensor`.
    pub fn bus<E: embedded_hal::i2c::Error>(sensor: Sensor) -> impl FnOnce(E) -> Self {
        move |e| Self::Bus { sensor, kind: e.kind() }
    }
}

/// The classifier asked for window data outside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("window slice {offset}..{offset}+{length} outside buffer of {total} floats")]
pub struct WindowBoundsError {
    pub offset: usize,
    pub length: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClassifierFault {
    #[error("classifier returned status {0}")]
    Status(i32),

    #[error(transparent)]
    Bounds(#[from] WindowBoundsError),
}

/// Standardization table rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("channel {channel}: standard deviation must be positive and finite, got {std_dev}")]
pub struct ParamsError {
    pub channel: &'static str,
    pub std_dev: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisplayFault {
    #[error("display I2C transfer failed ({0:?})")]
    Bus(ErrorKind),
}
