// Toastwatch — Host-side fakes for the hardware seams.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_graphics::prelude::Point;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind as DigitalErrorKind, ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use crate::config::STANDARDIZATION_TABLE;
use crate::drivers::display::Screen;
use crate::ei::{Classifier, InferenceResult, Timing};
use crate::error::{ClassifierFault, DisplayFault, SensorFault};
use crate::frame::SensorReadings;
use crate::sensors::{AnalogInput, SensorSource};
use crate::window::WindowSource;

// ---------------------------------------------------------------------------
// I2C
// ---------------------------------------------------------------------------

/// Answers reads by (address, bytes last written to that address).
#[derive(Default)]
pub struct FakeI2c {
    responses: HashMap<(u8, Vec<u8>), Vec<u8>>,
    last_write: HashMap<u8, Vec<u8>>,
    pub writes: Vec<(u8, Vec<u8>)>,
    pub absent: Vec<u8>,
}

impl FakeI2c {
    pub fn respond(&mut self, address: u8, command: &[u8], response: &[u8]) {
        self.responses.insert((address, command.to_vec()), response.to_vec());
    }

    pub fn writes_to(&self, address: u8) -> Vec<&[u8]> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, bytes)| bytes.as_slice())
            .collect()
    }
}

impl i2c::ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl i2c::I2c for FakeI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.absent.contains(&address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((address, bytes.to_vec()));
                    self.last_write.insert(address, bytes.to_vec());
                }
                Operation::Read(buf) => {
                    let key = (address, self.last_write.get(&address).cloned().unwrap_or_default());
                    let response = self
                        .responses
                        .get(&key)
                        .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))?;
                    let n = buf.len().min(response.len());
                    buf[..n].copy_from_slice(&response[..n]);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Delay & pins
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[derive(Default)]
pub struct FakeOutput {
    pub writes: Vec<bool>,
}

impl FakeOutput {
    pub fn level(&self) -> Option<bool> {
        self.writes.last().copied()
    }
}

impl PinErrorType for FakeOutput {
    type Error = Infallible;
}

impl OutputPin for FakeOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.writes.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.writes.push(true);
        Ok(())
    }
}

/// Input whose level the test flips through a shared cell.
#[derive(Clone)]
pub struct FakeInput {
    level: Rc<Cell<bool>>,
}

impl FakeInput {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
        }
    }

    pub fn set(&self, level: bool) {
        self.level.set(level);
    }
}

impl PinErrorType for FakeInput {
    type Error = Infallible;
}

impl InputPin for FakeInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}

/// Input whose every read fails, like a disconnected sense line on a bad bus.
pub struct FailingInput;

impl PinErrorType for FailingInput {
    type Error = DigitalErrorKind;
}

impl InputPin for FailingInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Err(DigitalErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Err(DigitalErrorKind::Other)
    }
}

/// Input following a `(from_ms, level)` schedule on a shared clock.
pub struct ScriptedInput {
    schedule: Vec<(u32, bool)>,
    clock: Rc<Cell<u32>>,
}

impl ScriptedInput {
    pub fn new(schedule: Vec<(u32, bool)>) -> Self {
        Self {
            schedule,
            clock: Rc::new(Cell::new(0)),
        }
    }

    pub fn clock(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.clock)
    }

    fn level(&self) -> bool {
        let now = self.clock.get();
        self.schedule
            .iter()
            .take_while(|(from, _)| *from <= now)
            .last()
            .map(|(_, level)| *level)
            .unwrap_or(true)
    }
}

impl PinErrorType for ScriptedInput {
    type Error = Infallible;
}

impl InputPin for ScriptedInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

// ---------------------------------------------------------------------------
// Sensors, classifier, screen
// ---------------------------------------------------------------------------

/// Readings sitting exactly on the training mean (standardize to zero).
pub fn readings_at_mean() -> SensorReadings {
    let m = STANDARDIZATION_TABLE.map(|(mean, _)| mean);
    SensorReadings {
        temperature_c: m[0],
        humidity_pct: m[1],
        pressure_kpa: 101.3,
        co2_ppm: m[2],
        tvoc_ppb: m[3],
        voc_v: m[4],
        no2_v: m[5],
        ethanol_v: m[6],
        co_v: m[7],
        nh3_v: m[8],
    }
}

/// Plays back queued results, then repeats `fallback`.
pub struct FakeSensors {
    pub queue: VecDeque<Result<SensorReadings, SensorFault>>,
    pub fallback: SensorReadings,
    pub calls: usize,
}

impl FakeSensors {
    pub fn steady(readings: SensorReadings) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: readings,
            calls: 0,
        }
    }
}

impl SensorSource for FakeSensors {
    fn acquire(&mut self) -> Result<SensorReadings, SensorFault> {
        self.calls += 1;
        self.queue.pop_front().unwrap_or(Ok(self.fallback))
    }
}

pub struct FakeAdc(pub Result<u16, SensorFault>);

impl AnalogInput for FakeAdc {
    fn read_raw(&mut self) -> Result<u16, SensorFault> {
        self.0
    }
}

/// Always predicts `time_left`, or fails with `fault` when set.
pub struct FixedClassifier {
    pub time_left: f32,
    pub fault: Option<ClassifierFault>,
    pub calls: usize,
}

impl FixedClassifier {
    pub fn new(time_left: f32) -> Self {
        Self {
            time_left,
            fault: None,
            calls: 0,
        }
    }
}

impl Classifier for FixedClassifier {
    fn classify(&mut self, signal: &dyn WindowSource) -> Result<InferenceResult, ClassifierFault> {
        self.calls += 1;
        signal.get_data(0, signal.total_len())?;
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        Ok(InferenceResult {
            scores: [self.time_left],
            timing: Timing::default(),
            status: 0,
        })
    }
}

/// Keeps the text drawn since the last clear.
#[derive(Default)]
pub struct RecordingScreen {
    pub lines: Vec<(String, Point)>,
    pub clears: usize,
    pub presents: usize,
}

impl RecordingScreen {
    pub fn shows(&self, text: &str) -> bool {
        self.lines.iter().any(|(line, _)| line == text)
    }
}

impl Screen for RecordingScreen {
    fn clear(&mut self) {
        self.lines.clear();
        self.clears += 1;
    }

    fn render(&mut self, text: &str, at: Point) {
        self.lines.push((text.to_owned(), at));
    }

    fn present(&mut self) -> Result<(), DisplayFault> {
        self.presents += 1;
        Ok(())
    }
}
