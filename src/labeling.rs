// Toastwatch — Labeling Mode State Machine (data-collection build)
//
// One debounced button walks IDLE -> BACKGROUND -> TOASTING -> BURNT -> IDLE.
// Entering BACKGROUND restarts the elapsed clock and opens a CSV sample with
// its header; returning to IDLE closes the sample with a blank line, which
// is how the host-side collector splits files.

use std::io::{self, Write};

use crate::config::LINE_ENDING;
use crate::frame::SensorReadings;

pub const CSV_HEADER: &str =
    "elapsed_ms,temperature,humidity,pressure_kpa,co2,tvoc,voc,no2,ethanol,co,mode_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Background,
    Toasting,
    Burnt,
}

impl Mode {
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::Background,
            Self::Background => Self::Toasting,
            Self::Toasting => Self::Burnt,
            Self::Burnt => Self::Idle,
        }
    }

    /// Value written in the `mode_id` column.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Background => "Background",
            Self::Toasting => "Toasting",
            Self::Burnt => "Burnt",
        }
    }
}

/// Owns the current mode and the elapsed-time reference of the open sample.
pub struct Labeler {
    mode: Mode,
    start_ms: u32,
}

impl Default for Labeler {
    fn default() -> Self {
        Self::new()
    }
}

impl Labeler {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            start_ms: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_logging(&self) -> bool {
        self.mode != Mode::Idle
    }

    pub fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.start_ms)
    }

    /// Advance one step on a debounced press, writing sample framing to `sink`.
    pub fn advance<W: Write>(&mut self, now_ms: u32, sink: &mut W) -> io::Result<Mode> {
        self.mode = self.mode.next();
        log::info!("Mode: {}", self.mode.display_name());

        match self.mode {
            Mode::Background => {
                self.start_ms = now_ms;
                write!(sink, "{}{}", CSV_HEADER, LINE_ENDING)?;
            }
            Mode::Idle => write!(sink, "{}", LINE_ENDING)?,
            Mode::Toasting | Mode::Burnt => {}
        }
        sink.flush()?;

        Ok(self.mode)
    }

    /// Write one tagged row; a no-op while idle.
    pub fn log_row<W: Write>(
        &self,
        now_ms: u32,
        readings: &SensorReadings,
        sink: &mut W,
    ) -> io::Result<()> {
        if !self.is_logging() {
            return Ok(());
        }
        write!(
            sink,
            "{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{}{}",
            self.elapsed_ms(now_ms),
            readings.temperature_c,
            readings.humidity_pct,
            readings.pressure_kpa,
            readings.co2_ppm,
            readings.tvoc_ppb,
            readings.voc_v,
            readings.no2_v,
            readings.ethanol_v,
            readings.co_v,
            self.mode.id(),
            LINE_ENDING
        )?;
        sink.flush()
    }
}
