// Toastwatch — Register-level drivers over the shared I2C bus.

use core::cell::RefCell;

#[cfg(target_os = "espidf")]
pub mod adc;
pub mod bme680;
pub mod display;
pub mod gas;
pub mod sgp30;

/// Handle to the I2C bus shared by every driver on the single control task.
///
/// Drivers borrow the bus for one transfer at a time and never hold the
/// borrow across calls.
pub type SharedBus<'a, I> = &'a RefCell<I>;
