// Toastwatch Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Map (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
// esp-idf-hal hands out pins as typed singletons, so the map lives in main.rs:
//   GPIO2  D0  NH3 sensor analog output (ADC1_CH2)
//   GPIO3  D1  Labeling button (pull-up, active LOW)
//   GPIO4  D2  Cancel actuator (active HIGH into open-drain stage)
//   GPIO5  D3  Toasting sense, HIGH while the heating element is energized
//   GPIO6  D4  I2C SDA
//   GPIO7  D5  I2C SCL

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const I2C_ADDR_GAS_MULTICHANNEL: u8 = 0x08;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_ADDR_SGP30: u8 = 0x58;
pub const I2C_ADDR_BME680: u8 = 0x76;

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SAMPLE_DELAY_MS: u32 = 500;        // 2 Hz sample tick
pub const DEBOUNCE_DELAY_MS: u32 = 50;
pub const SENSOR_INIT_RETRY_MS: u32 = 1000;  // blocking retry while a sensor is absent
pub const BOOT_SPLASH_MS: u64 = 1000;
pub const LOOP_YIELD_MS: u32 = 1;            // lets the idle task feed the watchdog

// ---------------------------------------------------------------------------
// Serial log (CSV rows in the data-collection build)
// ---------------------------------------------------------------------------
pub const SERIAL_BAUD: u32 = 115_200;
pub const LINE_ENDING: &str = "\r\n";

// ---------------------------------------------------------------------------
// Analog conversions
// ---------------------------------------------------------------------------
pub const ADC_V_REF: f32 = 3.3;
pub const ADC_MAX: u16 = 4095;              // 12-bit one-shot ADC
pub const GAS_V_REF: f32 = 3.3;
pub const GAS_RESOLUTION: f32 = 1023.0;     // multichannel gas board reports 10-bit codes

// ---------------------------------------------------------------------------
// AI / Edge Impulse Model
// ---------------------------------------------------------------------------
pub const NUM_CHANNELS: usize = 9;
pub const WINDOW_LEN: usize = 20;           // 10-second window @ 2 Hz
pub const EI_DSP_INPUT_FRAME_SIZE: usize = WINDOW_LEN * NUM_CHANNELS; // 180
pub const EI_LABEL_COUNT: usize = 1;
pub const CANCEL_THRESHOLD_S: f32 = 40.0;   // cancel once fewer seconds remain until burnt

/// Training-time standardization statistics, `(mean, std_dev)` per channel in
/// [`crate::frame::Channel::ALL`] order.  Must match the table the model was
/// trained with; never recompute on the device.
pub const STANDARDIZATION_TABLE: [(f32, f32); NUM_CHANNELS] = [
    (32.468_5, 9.812_4),      // temperature (°C)
    (38.217_3, 11.402_8),     // humidity (%RH)
    (1_851.337, 2_103.904),   // co2 (ppm eq)
    (4_207.145, 8_911.622),   // tvoc (ppb)
    (1.921_6, 0.610_9),       // voc (V)
    (1.354_2, 0.521_7),       // no2 (V)
    (1.710_8, 0.583_1),       // ethanol (V)
    (1.118_4, 0.472_6),       // co (V)
    (0.842_9, 0.291_3),       // nh3 (V)
];
