// Toastwatch — SGP30 VOC / eCO2 Sensor Driver
//
// Sensirion command protocol: 16-bit big-endian commands, responses as
// 16-bit words each followed by a CRC-8 (poly 0x31, init 0xFF).

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::SharedBus;
use crate::error::{Sensor, SensorFault};

const CMD_IAQ_INIT: [u8; 2] = [0x20, 0x03];
const CMD_MEASURE_IAQ: [u8; 2] = [0x20, 0x08];
const CMD_GET_SERIAL_ID: [u8; 2] = [0x36, 0x82];

const IAQ_INIT_WAIT_MS: u32 = 10;
const MEASURE_WAIT_MS: u32 = 12;
const SERIAL_ID_WAIT_MS: u32 = 1;

/// Sensirion CRC-8 over one data word.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ 0x31;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Split a `[msb, lsb, crc]*` response into checked words.
fn decode_words<const N: usize>(raw: &[u8]) -> Result<[u16; N], SensorFault> {
    let mut words = [0u16; N];
    for (word, chunk) in words.iter_mut().zip(raw.chunks_exact(3)) {
        if crc8(&chunk[..2]) != chunk[2] {
            return Err(SensorFault::Crc { sensor: Sensor::Sgp30 });
        }
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(words)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AirQuality {
    pub co2eq_ppm: u16,
    pub tvoc_ppb: u16,
}

pub struct Sgp30<'a, I> {
    bus: SharedBus<'a, I>,
    address: u8,
}

impl<'a, I: I2c> Sgp30<'a, I> {
    pub fn new(bus: SharedBus<'a, I>, address: u8) -> Self {
        Self { bus, address }
    }

    fn command(&self, cmd: &[u8; 2]) -> Result<(), SensorFault> {
        self.bus
            .borrow_mut()
            .write(self.address, cmd)
            .map_err(SensorFault::bus(Sensor::Sgp30))
    }

    fn read_words<const N: usize>(&self, raw: &mut [u8]) -> Result<[u16; N], SensorFault> {
        self.bus
            .borrow_mut()
            .read(self.address, raw)
            .map_err(SensorFault::bus(Sensor::Sgp30))?;
        decode_words(raw)
    }

    /// 48-bit serial number; a CRC-clean answer proves the part is present.
    pub fn serial_id(&mut self, delay: &mut impl DelayNs) -> Result<u64, SensorFault> {
        self.command(&CMD_GET_SERIAL_ID)?;
        delay.delay_ms(SERIAL_ID_WAIT_MS);
        let mut raw = [0u8; 9];
        let [a, b, c] = self.read_words::<3>(&mut raw)?;
        Ok((u64::from(a) << 32) | (u64::from(b) << 16) | u64::from(c))
    }

    /// Check presence and start the IAQ baseline algorithm.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), SensorFault> {
        let serial = self.serial_id(delay)?;
        self.command(&CMD_IAQ_INIT)?;
        delay.delay_ms(IAQ_INIT_WAIT_MS);
        log::info!("SGP30 initialised (serial {:012x})", serial);
        Ok(())
    }

    /// One IAQ measurement.  Reads 400 ppm / 0 ppb for the first ~15 s.
    pub fn measure(&mut self, delay: &mut impl DelayNs) -> Result<AirQuality, SensorFault> {
        self.command(&CMD_MEASURE_IAQ)?;
        delay.delay_ms(MEASURE_WAIT_MS);
        let mut raw = [0u8; 6];
        let [co2eq_ppm, tvoc_ppb] = self.read_words::<2>(&mut raw)?;
        Ok(AirQuality { co2eq_ppm, tvoc_ppb })
    }
}
