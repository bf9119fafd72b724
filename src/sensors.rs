// Toastwatch — Sensor Acquisition
//
// Polls the three I2C sensors plus the NH3 analog channel and converts
// everything to engineering units.  Any single failure aborts the whole
// acquisition; the caller skips the tick and tries again next period.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::*;
use crate::drivers::bme680::Bme680;
use crate::drivers::gas::GasMultichannel;
use crate::drivers::sgp30::Sgp30;
use crate::drivers::SharedBus;
use crate::error::SensorFault;
use crate::frame::SensorReadings;

/// One complete acquisition per call.
pub trait SensorSource {
    fn acquire(&mut self) -> Result<SensorReadings, SensorFault>;
}

/// Single analog channel returning raw ADC codes.
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<u16, SensorFault>;
}

/// `code * V_REF / ADC_MAX`.
pub fn adc_to_volts(code: u16) -> f32 {
    f32::from(code) * ADC_V_REF / f32::from(ADC_MAX)
}

/// Run `attempt` until it succeeds, sleeping `retry_ms` between failures.
///
/// Blocks forever if the part never answers; the device must not enter the
/// control loop with a sensor missing.
pub fn retry_until_ok<D, T>(
    delay: &mut D,
    retry_ms: u32,
    mut attempt: impl FnMut(&mut D) -> Result<T, SensorFault>,
    on_fail: &mut impl FnMut(&SensorFault),
) -> T
where
    D: DelayNs,
{
    loop {
        match attempt(delay) {
            Ok(value) => return value,
            Err(fault) => {
                log::warn!("{} not ready ({}), retrying in {} ms", fault.sensor(), fault, retry_ms);
                on_fail(&fault);
                delay.delay_ms(retry_ms);
            }
        }
    }
}

pub struct SensorSuite<'a, I, A, D> {
    env: Bme680<'a, I>,
    voc: Sgp30<'a, I>,
    gas: GasMultichannel<'a, I>,
    nh3: A,
    delay: D,
}

impl<'a, I, A, D> SensorSuite<'a, I, A, D>
where
    I: I2c,
    A: AnalogInput,
    D: DelayNs,
{
    pub fn new(bus: SharedBus<'a, I>, nh3: A, delay: D) -> Self {
        Self {
            env: Bme680::new(bus, I2C_ADDR_BME680),
            voc: Sgp30::new(bus, I2C_ADDR_SGP30),
            gas: GasMultichannel::new(bus, I2C_ADDR_GAS_MULTICHANNEL),
            nh3,
            delay,
        }
    }

    /// Bring every sensor up, retrying each one until it reports ready.
    /// `on_fail` sees every failed attempt (used for the boot screen).
    pub fn init_blocking(&mut self, mut on_fail: impl FnMut(&SensorFault)) {
        let Self { env, voc, gas, nh3, delay } = self;

        retry_until_ok(delay, SENSOR_INIT_RETRY_MS, |d| env.init(d), &mut on_fail);
        retry_until_ok(delay, SENSOR_INIT_RETRY_MS, |d| voc.init(d), &mut on_fail);
        retry_until_ok(delay, SENSOR_INIT_RETRY_MS, |_| gas.preheat(), &mut on_fail);
        retry_until_ok(delay, SENSOR_INIT_RETRY_MS, |_| nh3.read_raw(), &mut on_fail);

        log::info!("All sensors ready");
    }
}

impl<I, A, D> SensorSource for SensorSuite<'_, I, A, D>
where
    I: I2c,
    A: AnalogInput,
    D: DelayNs,
{
    fn acquire(&mut self) -> Result<SensorReadings, SensorFault> {
        let env = self.env.read(&mut self.delay)?;
        let air = self.voc.measure(&mut self.delay)?;
        let gas = self.gas.read()?;
        let nh3_v = adc_to_volts(self.nh3.read_raw()?);

        Ok(SensorReadings {
            temperature_c: env.temperature_c,
            humidity_pct: env.humidity_pct,
            pressure_kpa: env.pressure_kpa,
            co2_ppm: f32::from(air.co2eq_ppm),
            tvoc_ppb: f32::from(air.tvoc_ppb),
            voc_v: gas.voc_v,
            no2_v: gas.no2_v,
            ethanol_v: gas.ethanol_v,
            co_v: gas.co_v,
            nh3_v,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::bme680;
    use crate::drivers::gas::code_to_volts;
    use crate::drivers::sgp30::crc8;
    use crate::error::Sensor;
    use crate::frame::Channel;
    use crate::testing::{FakeAdc, FakeI2c, NoDelay};
    use core::cell::RefCell;

    fn sgp_words(words: &[u16]) -> Vec<u8> {
        words
            .iter()
            .flat_map(|w| {
                let [msb, lsb] = w.to_be_bytes();
                [msb, lsb, crc8(&[msb, lsb])]
            })
            .collect()
    }

    /// SGP30 reads 450 ppm / 30 ppb; gas board codes NO2 100, ethanol 200,
    /// VOC 300, CO 400.
    fn wire_voc_and_gas(i2c: &mut FakeI2c) {
        i2c.respond(I2C_ADDR_SGP30, &[0x36, 0x82], &sgp_words(&[1, 2, 3]));
        i2c.respond(I2C_ADDR_SGP30, &[0x20, 0x08], &sgp_words(&[450, 30]));
        for (cmd, code) in [(0x01u8, 100u32), (0x03, 200), (0x05, 300), (0x07, 400)] {
            i2c.respond(I2C_ADDR_GAS_MULTICHANNEL, &[cmd], &code.to_le_bytes());
        }
    }

    /// A bus with SGP30 and gas board answering; BME680 is left uninitialised.
    fn bus_without_bme() -> FakeI2c {
        let mut i2c = FakeI2c::default();
        wire_voc_and_gas(&mut i2c);
        i2c
    }

    #[test]
    fn adc_conversion() {
        assert_eq!(adc_to_volts(0), 0.0);
        assert_eq!(adc_to_volts(ADC_MAX), ADC_V_REF);
    }

    #[test]
    fn retry_blocks_until_success() {
        let mut delay = NoDelay::default();
        let mut attempts = 0;
        let mut failures = Vec::new();

        let value = retry_until_ok(
            &mut delay,
            250,
            |_| {
                attempts += 1;
                if attempts < 3 {
                    Err(SensorFault::NotReady { sensor: Sensor::Sgp30 })
                } else {
                    Ok(attempts)
                }
            },
            &mut |f: &SensorFault| failures.push(*f),
        );

        assert_eq!(value, 3);
        assert_eq!(failures.len(), 2);
        assert_eq!(delay.total_ns, 2 * 250 * 1_000_000);
    }

    #[test]
    fn acquires_every_channel_after_init() {
        let mut i2c = bme680::tests::wired(&bme680::tests::reference());
        wire_voc_and_gas(&mut i2c);
        let bus = RefCell::new(i2c);
        let mut suite = SensorSuite::new(&bus, FakeAdc(Ok(2048)), NoDelay::default());

        let mut failures = 0;
        suite.init_blocking(|_| failures += 1);
        assert_eq!(failures, 0);
        assert!(bus.borrow().writes_to(I2C_ADDR_GAS_MULTICHANNEL).contains(&&[0xFE][..]));

        let r = suite.acquire().unwrap();
        assert!((r.temperature_c - 20.7759).abs() < 0.01, "{}", r.temperature_c);
        assert!((r.humidity_pct - 71.084).abs() < 0.1, "{}", r.humidity_pct);
        assert!((r.pressure_kpa - 91.687).abs() < 0.01, "{}", r.pressure_kpa);
        assert_eq!(r.co2_ppm, 450.0);
        assert_eq!(r.tvoc_ppb, 30.0);
        assert_eq!(r.no2_v, code_to_volts(100));
        assert_eq!(r.ethanol_v, code_to_volts(200));
        assert_eq!(r.voc_v, code_to_volts(300));
        assert_eq!(r.co_v, code_to_volts(400));
        assert_eq!(r.nh3_v, adc_to_volts(2048));

        // Model input order: temperature, humidity, co2, tvoc, voc, no2,
        // ethanol, co, nh3.  Pressure is not a model channel.
        let frame = r.frame();
        assert_eq!(
            frame.0,
            [
                r.temperature_c,
                r.humidity_pct,
                450.0,
                30.0,
                code_to_volts(300),
                code_to_volts(100),
                code_to_volts(200),
                code_to_volts(400),
                adc_to_volts(2048),
            ]
        );
        assert_eq!(frame.get(Channel::Nh3), r.nh3_v);
    }

    #[test]
    fn any_sensor_fault_aborts_acquisition() {
        let bus = RefCell::new(bus_without_bme());
        let mut suite = SensorSuite::new(&bus, FakeAdc(Ok(2048)), NoDelay::default());
        let err = suite.acquire().unwrap_err();
        assert_eq!(err.sensor(), Sensor::Bme680);
    }

    #[test]
    fn adc_fault_aborts_acquisition() {
        let bus = RefCell::new(bus_without_bme());
        let delay = NoDelay::default();
        let mut suite = SensorSuite::new(&bus, FakeAdc(Err(SensorFault::Adc(-1))), delay);
        // Skip the BME680 by reading the other parts directly.
        assert!(suite.voc.measure(&mut suite.delay).is_ok());
        assert!(suite.gas.read().is_ok());
        assert_eq!(suite.nh3.read_raw(), Err(SensorFault::Adc(-1)));
    }

    #[test]
    fn non_env_channels_convert_to_engineering_units() {
        let bus = RefCell::new(bus_without_bme());
        let mut suite = SensorSuite::new(&bus, FakeAdc(Ok(ADC_MAX)), NoDelay::default());

        let air = suite.voc.measure(&mut suite.delay).unwrap();
        let gas = suite.gas.read().unwrap();
        assert_eq!((air.co2eq_ppm, air.tvoc_ppb), (450, 30));
        assert_eq!(gas.no2_v, code_to_volts(100));
        assert_eq!(gas.co_v, code_to_volts(400));
        assert_eq!(adc_to_volts(suite.nh3.read_raw().unwrap()), ADC_V_REF);
    }
}
