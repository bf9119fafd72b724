// Toastwatch — One-shot ADC (NH3 channel)
//
// Raw ESP-IDF one-shot API: ADC1, 11 dB attenuation (0–3.3 V), 12-bit.

use esp_idf_sys::{self as sys, esp, EspError};

use crate::config::ADC_MAX;
use crate::error::SensorFault;
use crate::sensors::AnalogInput;

pub struct OneshotAdc {
    handle: sys::adc_oneshot_unit_handle_t,
    channel: sys::adc_channel_t,
}

impl OneshotAdc {
    /// ADC1 channel `channel` (GPIO2 is ADC1_CH2 on the ESP32-C3).
    pub fn new(channel: sys::adc_channel_t) -> Result<Self, EspError> {
        let mut handle: sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();

        // SAFETY: plain C configuration structs; `handle` is written by the call.
        unsafe {
            let unit_cfg = sys::adc_oneshot_unit_init_cfg_t {
                unit_id: sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            esp!(sys::adc_oneshot_new_unit(&unit_cfg, &mut handle))?;

            let chan_cfg = sys::adc_oneshot_chan_cfg_t {
                atten: sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            if let Err(e) = esp!(sys::adc_oneshot_config_channel(handle, channel, &chan_cfg)) {
                sys::adc_oneshot_del_unit(handle);
                return Err(e);
            }
        }

        Ok(Self { handle, channel })
    }
}

impl AnalogInput for OneshotAdc {
    fn read_raw(&mut self) -> Result<u16, SensorFault> {
        let mut raw: i32 = 0;
        // SAFETY: `handle` stays valid until drop.
        esp!(unsafe { sys::adc_oneshot_read(self.handle, self.channel, &mut raw) })
            .map_err(|e| SensorFault::Adc(e.code()))?;
        Ok(raw.clamp(0, i32::from(ADC_MAX)) as u16)
    }
}

impl Drop for OneshotAdc {
    fn drop(&mut self) {
        // SAFETY: created by `adc_oneshot_new_unit` and not yet deleted.
        unsafe {
            sys::adc_oneshot_del_unit(self.handle);
        }
    }
}
