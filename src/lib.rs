//! Toastwatch: gas-sensing toaster firmware for the Xiao ESP32-C3.
//!
//! Samples environmental and gas sensors every [`config::SAMPLE_DELAY_MS`],
//! standardizes each frame against training-time statistics, keeps a rolling
//! window of the last [`config::WINDOW_LEN`] frames and asks an Edge Impulse
//! regression model how long until the toast burns.  Under
//! [`config::CANCEL_THRESHOLD_S`] the cancel line is asserted until the
//! toaster stops heating.
//!
//! The data-collection build swaps the model for a button-driven labeler that
//! streams tagged CSV rows over serial.
//!
//! Everything here is platform-neutral and runs on the host; the ESP-IDF
//! wiring lives in the binary.

pub mod config;
pub mod controller;
pub mod drivers;
pub mod ei;
pub mod error;
pub mod frame;
pub mod input;
pub mod labeling;
pub mod schedule;
pub mod sensors;
pub mod standardize;
pub mod tasks;
pub mod window;

#[cfg(test)]
mod testing;
