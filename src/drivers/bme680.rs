// Toastwatch — BME680 Environmental Sensor Driver
//
// Custom register-level driver over the shared I2C bus.  Forced-mode
// temperature / pressure / humidity with Bosch floating-point compensation;
// the gas heater is left off (VOCs come from the SGP30 and the gas board).

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::SharedBus;
use crate::error::{Sensor, SensorFault};

// BME680 register addresses
const REG_MEAS_STATUS_0: u8 = 0x1D; // Start of 10-byte status + P/T/H burst
const REG_CTRL_GAS_1: u8 = 0x71;
const REG_CTRL_HUM: u8 = 0x72;
const REG_CTRL_MEAS: u8 = 0x74;
const REG_CONFIG: u8 = 0x75;
const REG_CALIB_0: u8 = 0x89;
const REG_CHIP_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_CALIB_1: u8 = 0xE1;

const CHIP_ID_EXPECTED: u8 = 0x61;
const SOFT_RESET_CMD: u8 = 0xB6;
const NEW_DATA_BIT: u8 = 0x80;

const CALIB_0_LEN: usize = 25;
const CALIB_LEN: usize = CALIB_0_LEN + 16;

// Humidity x1; temperature x2, pressure x4, forced mode.
const CTRL_HUM_OSRS_H1: u8 = 0b001;
const CTRL_MEAS_FORCED: u8 = (0b010 << 5) | (0b011 << 2) | 0b01;
const MEASURE_WAIT_MS: u32 = 20;
const RESET_WAIT_MS: u32 = 10;

/// Factory calibration coefficients (datasheet section 3.11.1).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    pub par_h1: u16,
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
}

impl Calibration {
    /// Decode the two calibration blocks read back to back.
    pub fn from_bytes(b: &[u8; CALIB_LEN]) -> Self {
        let u16_le = |lsb: usize, msb: usize| u16::from_le_bytes([b[lsb], b[msb]]);
        let i16_le = |lsb: usize, msb: usize| i16::from_le_bytes([b[lsb], b[msb]]);

        Self {
            par_t1: u16_le(33, 34),
            par_t2: i16_le(1, 2),
            par_t3: b[3] as i8,
            par_p1: u16_le(5, 6),
            par_p2: i16_le(7, 8),
            par_p3: b[9] as i8,
            par_p4: i16_le(11, 12),
            par_p5: i16_le(13, 14),
            par_p6: b[16] as i8,
            par_p7: b[15] as i8,
            par_p8: i16_le(19, 20),
            par_p9: i16_le(21, 22),
            par_p10: b[23],
            par_h1: (u16::from(b[27]) << 4) | u16::from(b[26] & 0x0F),
            par_h2: (u16::from(b[25]) << 4) | u16::from(b[26] >> 4),
            par_h3: b[28] as i8,
            par_h4: b[29] as i8,
            par_h5: b[30] as i8,
            par_h6: b[31],
            par_h7: b[32] as i8,
        }
    }

    /// Returns `(temperature °C, t_fine)`.
    pub fn temperature(&self, adc: u32) -> (f32, f32) {
        let adc = adc as f32;
        let t1 = f32::from(self.par_t1);
        let var1 = (adc / 16384.0 - t1 / 1024.0) * f32::from(self.par_t2);
        let d = adc / 131072.0 - t1 / 8192.0;
        let var2 = d * d * (f32::from(self.par_t3) * 16.0);
        let t_fine = var1 + var2;
        (t_fine / 5120.0, t_fine)
    }

    /// Pressure in Pa.
    pub fn pressure(&self, adc: u32, t_fine: f32) -> f32 {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * (f32::from(self.par_p6) / 131072.0);
        var2 += var1 * f32::from(self.par_p5) * 2.0;
        var2 = var2 / 4.0 + f32::from(self.par_p4) * 65536.0;
        var1 = (f32::from(self.par_p3) * var1 * var1 / 16384.0 + f32::from(self.par_p2) * var1)
            / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * f32::from(self.par_p1);

        // Avoid a division by zero on an uncalibrated part.
        if var1 == 0.0 {
            return 0.0;
        }

        let mut p = 1048576.0 - adc as f32;
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        let var1 = f32::from(self.par_p9) * p * p / 2147483648.0;
        let var2 = p * (f32::from(self.par_p8) / 32768.0);
        let var3 = (p / 256.0).powi(3) * (f32::from(self.par_p10) / 131072.0);
        p + (var1 + var2 + var3 + f32::from(self.par_p7) * 128.0) / 16.0
    }

    /// Relative humidity in %, clamped to 0..=100.
    pub fn humidity(&self, adc: u16, t_fine: f32) -> f32 {
        let temp = t_fine / 5120.0;
        let var1 = f32::from(adc)
            - (f32::from(self.par_h1) * 16.0 + f32::from(self.par_h3) / 2.0 * temp);
        let var2 = var1
            * (f32::from(self.par_h2) / 262144.0
                * (1.0
                    + f32::from(self.par_h4) / 16384.0 * temp
                    + f32::from(self.par_h5) / 1048576.0 * temp * temp));
        let var3 = f32::from(self.par_h6) / 16384.0;
        let var4 = f32::from(self.par_h7) / 2097152.0;
        (var2 + (var3 + var4 * temp) * var2 * var2).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_kpa: f32,
}

pub struct Bme680<'a, I> {
    bus: SharedBus<'a, I>,
    address: u8,
    calib: Option<Calibration>,
}

impl<'a, I: I2c> Bme680<'a, I> {
    pub fn new(bus: SharedBus<'a, I>, address: u8) -> Self {
        Self {
            bus,
            address,
            calib: None,
        }
    }

    fn fault(e: I::Error) -> SensorFault {
        SensorFault::bus(Sensor::Bme680)(e)
    }

    fn read_into(&self, reg: u8, buf: &mut [u8]) -> Result<(), SensorFault> {
        self.bus
            .borrow_mut()
            .write_read(self.address, &[reg], buf)
            .map_err(Self::fault)
    }

    fn write_reg(&self, reg: u8, value: u8) -> Result<(), SensorFault> {
        self.bus
            .borrow_mut()
            .write(self.address, &[reg, value])
            .map_err(Self::fault)
    }

    /// Verify the chip id, soft-reset, load calibration, and set oversampling.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), SensorFault> {
        let mut id = [0u8; 1];
        self.read_into(REG_CHIP_ID, &mut id)?;
        if id[0] != CHIP_ID_EXPECTED {
            return Err(SensorFault::WrongChip { sensor: Sensor::Bme680, id: id[0] });
        }

        self.write_reg(REG_RESET, SOFT_RESET_CMD)?;
        delay.delay_ms(RESET_WAIT_MS);

        let mut raw = [0u8; CALIB_LEN];
        self.read_into(REG_CALIB_0, &mut raw[..CALIB_0_LEN])?;
        self.read_into(REG_CALIB_1, &mut raw[CALIB_0_LEN..])?;
        let calib = Calibration::from_bytes(&raw);

        self.write_reg(REG_CTRL_HUM, CTRL_HUM_OSRS_H1)?;
        self.write_reg(REG_CONFIG, 0x00)?; // IIR filter off
        self.write_reg(REG_CTRL_GAS_1, 0x00)?; // gas conversion off

        self.calib = Some(calib);
        log::info!("BME680 initialised (T x2, P x4, H x1, forced mode)");
        Ok(())
    }

    /// Trigger one forced measurement and compensate it.
    pub fn read(&mut self, delay: &mut impl DelayNs) -> Result<EnvReading, SensorFault> {
        let calib = self.calib.ok_or(SensorFault::NotReady { sensor: Sensor::Bme680 })?;

        self.write_reg(REG_CTRL_MEAS, CTRL_MEAS_FORCED)?;
        delay.delay_ms(MEASURE_WAIT_MS);

        let mut raw = [0u8; 10];
        self.read_into(REG_MEAS_STATUS_0, &mut raw)?;
        if raw[0] & NEW_DATA_BIT == 0 {
            return Err(SensorFault::NotReady { sensor: Sensor::Bme680 });
        }

        // raw[1] = gas measurement index, unused
        let press_adc = (u32::from(raw[2]) << 12) | (u32::from(raw[3]) << 4) | (u32::from(raw[4]) >> 4);
        let temp_adc = (u32::from(raw[5]) << 12) | (u32::from(raw[6]) << 4) | (u32::from(raw[7]) >> 4);
        let hum_adc = u16::from_be_bytes([raw[8], raw[9]]);

        let (temperature_c, t_fine) = calib.temperature(temp_adc);
        Ok(EnvReading {
            temperature_c,
            humidity_pct: calib.humidity(hum_adc, t_fine),
            pressure_kpa: calib.pressure(press_adc, t_fine) / 1000.0,
        })
    }
}
