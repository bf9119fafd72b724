// Toastwatch — Grove Multichannel Gas Sensor v2 Driver
//
// The on-board MCU exposes one 32-bit little-endian ADC code per MOS sensor
// (GM-102B NO2, GM-302B ethanol, GM-502B VOC, GM-702B CO).  Codes are
// converted to volts with the board's fixed 10-bit calibration.

use embedded_hal::i2c::I2c;

use super::SharedBus;
use crate::config::{GAS_RESOLUTION, GAS_V_REF};
use crate::error::{Sensor, SensorFault};

const CMD_GM_102B: u8 = 0x01; // NO2
const CMD_GM_302B: u8 = 0x03; // Ethanol
const CMD_GM_502B: u8 = 0x05; // VOC
const CMD_GM_702B: u8 = 0x07; // CO
const CMD_WARMING_UP: u8 = 0xFE;

/// Raw board code → volts.
pub fn code_to_volts(code: u32) -> f32 {
    code as f32 * GAS_V_REF / GAS_RESOLUTION
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GasVoltages {
    pub no2_v: f32,
    pub ethanol_v: f32,
    pub voc_v: f32,
    pub co_v: f32,
}

pub struct GasMultichannel<'a, I> {
    bus: SharedBus<'a, I>,
    address: u8,
}

impl<'a, I: I2c> GasMultichannel<'a, I> {
    pub fn new(bus: SharedBus<'a, I>, address: u8) -> Self {
        Self { bus, address }
    }

    fn command(&self, cmd: u8) -> Result<(), SensorFault> {
        self.bus
            .borrow_mut()
            .write(self.address, &[cmd])
            .map_err(SensorFault::bus(Sensor::GasMultichannel))
    }

    fn read_code(&self, cmd: u8) -> Result<u32, SensorFault> {
        let mut bus = self.bus.borrow_mut();
        let mut raw = [0u8; 4];
        bus.write(self.address, &[cmd])
            .and_then(|()| bus.read(self.address, &mut raw))
            .map_err(SensorFault::bus(Sensor::GasMultichannel))?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Switch the MOS heaters on; readings settle over the following minutes.
    pub fn preheat(&mut self) -> Result<(), SensorFault> {
        self.command(CMD_WARMING_UP)?;
        log::info!("Multichannel gas sensor preheating");
        Ok(())
    }

    pub fn read(&mut self) -> Result<GasVoltages, SensorFault> {
        Ok(GasVoltages {
            no2_v: code_to_volts(self.read_code(CMD_GM_102B)?),
            ethanol_v: code_to_volts(self.read_code(CMD_GM_302B)?),
            voc_v: code_to_volts(self.read_code(CMD_GM_502B)?),
            co_v: code_to_volts(self.read_code(CMD_GM_702B)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeI2c;
    use core::cell::RefCell;

    const ADDR: u8 = 0x08;

    #[test]
    fn converts_codes_to_volts() {
        assert_eq!(code_to_volts(0), 0.0);
        assert!((code_to_volts(1023) - 3.3).abs() < 1e-6);
    }

    #[test]
    fn reads_each_channel_by_command() {
        let mut i2c = FakeI2c::default();
        i2c.respond(ADDR, &[CMD_GM_102B], &100u32.to_le_bytes());
        i2c.respond(ADDR, &[CMD_GM_302B], &200u32.to_le_bytes());
        i2c.respond(ADDR, &[CMD_GM_502B], &300u32.to_le_bytes());
        i2c.respond(ADDR, &[CMD_GM_702B], &400u32.to_le_bytes());
        let bus = RefCell::new(i2c);

        let mut gas = GasMultichannel::new(&bus, ADDR);
        gas.preheat().unwrap();
        let v = gas.read().unwrap();

        assert_eq!(v.no2_v, code_to_volts(100));
        assert_eq!(v.ethanol_v, code_to_volts(200));
        assert_eq!(v.voc_v, code_to_volts(300));
        assert_eq!(v.co_v, code_to_volts(400));
        assert_eq!(bus.borrow().writes_to(ADDR)[0], &[CMD_WARMING_UP][..]);
    }

    #[test]
    fn missing_board_faults() {
        let mut i2c = FakeI2c::default();
        i2c.absent.push(ADDR);
        let bus = RefCell::new(i2c);
        let err = GasMultichannel::new(&bus, ADDR).read().unwrap_err();
        assert_eq!(err.sensor(), Sensor::GasMultichannel);
    }
}
