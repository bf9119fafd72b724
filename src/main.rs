// Toastwatch — Firmware Entry Point
//
// Boot sequence:
//   1. Logger, cancel line driven LOW, I2C bus.
//   2. OLED init and "Toastwatch" splash.
//   3. Blocking sensor init; the screen names the part being waited on.
//   4. Enter the busy-poll loop of the selected build:
//        default          ToastMonitor (inference + cancel actuator)
//        data-collection  Collector (button labeling + CSV over serial)
//
// Everything runs on the main task; the loop yields 1 ms per iteration so
// the idle task can feed the watchdog.

#[cfg(target_os = "espidf")]
mod firmware {
    use core::cell::RefCell;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::delay::{Delay, FreeRtos};
    use esp_idf_hal::gpio::PinDriver;
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_sys as sys;

    use toastwatch::config::*;
    use toastwatch::drivers::adc::OneshotAdc;
    use toastwatch::drivers::display::OledDisplay;
    use toastwatch::sensors::SensorSuite;
    use toastwatch::standardize::StandardizationParams;

    /// NH3 analog input on GPIO2, which is ADC1 channel 2 on the ESP32-C3.
    const NH3_ADC_CHANNEL: sys::adc_channel_t = sys::adc_channel_t_ADC_CHANNEL_2;

    // -----------------------------------------------------------------------
    // Utility: milliseconds since boot (wraps at ~49 days; Ticker handles it)
    // -----------------------------------------------------------------------
    pub fn now_ms() -> u32 {
        unsafe { (sys::esp_timer_get_time() / 1000) as u32 }
    }

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("Toastwatch firmware starting (serial {} baud)", SERIAL_BAUD);

        // Training statistics are checked before any hardware is touched.
        let params = StandardizationParams::training()?;

        // ---- Peripherals --------------------------------------------------
        let peripherals = Peripherals::take()?;

        // Cancel actuator: never left floating, LOW until the model asks.
        let mut cancel = PinDriver::output(peripherals.pins.gpio4)?; // D2
        cancel.set_low()?;
        let toasting = PinDriver::input(peripherals.pins.gpio5)?; // D3, toasting sense

        // ---- I2C bus (shared by all sensors and the OLED) -----------------
        let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio6, // SDA
            peripherals.pins.gpio7, // SCL
            &i2c_config,
        )?;
        // Lives on the main task's stack; `run` never returns past the loop.
        let bus = RefCell::new(i2c);

        // ---- Boot splash --------------------------------------------------
        let mut display = OledDisplay::new(&bus);
        display.init()?;
        display.show_centered_text("Toastwatch")?;
        thread::sleep(Duration::from_millis(BOOT_SPLASH_MS));

        // ---- Sensors ------------------------------------------------------
        let nh3 = OneshotAdc::new(NH3_ADC_CHANNEL)?;
        let mut sensors = SensorSuite::new(&bus, nh3, Delay::new_default());
        sensors.init_blocking(|fault| {
            if let Err(e) = display.show_centered_text(&format!("Waiting: {}", fault.sensor())) {
                log::warn!("Boot screen not updated: {}", e);
            }
        });
        log::info!("Boot complete, entering control loop");

        #[cfg(not(feature = "data-collection"))]
        {
            use toastwatch::ei;
            use toastwatch::tasks::ToastMonitor;

            let mut monitor = ToastMonitor::new(
                sensors,
                ei::default_classifier(),
                cancel,
                toasting,
                display,
                params,
                now_ms(),
            );
            loop {
                monitor.poll(now_ms());
                FreeRtos::delay_ms(LOOP_YIELD_MS);
            }
        }

        #[cfg(feature = "data-collection")]
        {
            use esp_idf_hal::gpio::Pull;
            use toastwatch::tasks::Collector;

            // The labeling build never actuates; hold the line LOW.
            let _cancel = cancel;
            let _ = (toasting, params);

            let mut button = PinDriver::input(peripherals.pins.gpio3)?; // D1, labeling button
            button.set_pull(Pull::Up)?;

            // Serial carries CSV only from here on.
            log::set_max_level(log::LevelFilter::Warn);

            let mut collector = Collector::new(sensors, button, display, std::io::stdout(), now_ms());
            loop {
                collector.poll(now_ms());
                FreeRtos::delay_ms(LOOP_YIELD_MS);
            }
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("toastwatch runs on the ESP32-C3; use `cargo test --lib` on the host");
}
