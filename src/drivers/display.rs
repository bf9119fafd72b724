// Toastwatch — SSD1306 OLED Display Driver
//
// 128x64 monochrome frame buffer drawn with embedded-graphics, flushed over
// the shared I2C bus in page-addressing order.  Every redraw starts from a
// cleared buffer so stale text never ghosts.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text};
use embedded_hal::i2c::I2c;

use super::SharedBus;
use crate::config::*;
use crate::error::DisplayFault;

/// Text surface the control loop draws status on.
pub trait Screen {
    /// Blank the off-screen buffer.
    fn clear(&mut self);

    /// Draw `text` with its top-left corner at `at`.
    fn render(&mut self, text: &str, at: Point);

    /// Push the buffer to the panel.
    fn present(&mut self) -> Result<(), DisplayFault>;
}

const CONTROL_CMD: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
const DATA_CHUNK: usize = 32;

const INIT_SEQUENCE: [u8; 25] = [
    0xAE, // display off
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // multiplex 64
    0xD3, 0x00, // display offset
    0x40, // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1, // segment remap
    0xC8, // COM scan descending
    0xDA, 0x12, // COM pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH
    0xA4, // resume from RAM
    0xA6, // normal (not inverted)
    0xAF, // display on
];

pub struct OledDisplay<'a, I> {
    bus: SharedBus<'a, I>,
    frame: [u8; DISPLAY_BUFFER_SIZE],
}

impl<'a, I: I2c> OledDisplay<'a, I> {
    pub fn new(bus: SharedBus<'a, I>) -> Self {
        Self {
            bus,
            frame: [0; DISPLAY_BUFFER_SIZE],
        }
    }

    fn commands(&self, cmds: &[u8]) -> Result<(), DisplayFault> {
        let mut buf = [0u8; INIT_SEQUENCE.len() + 1];
        buf[0] = CONTROL_CMD;
        buf[1..=cmds.len()].copy_from_slice(cmds);
        self.bus
            .borrow_mut()
            .write(I2C_ADDR_OLED, &buf[..=cmds.len()])
            .map_err(|e| DisplayFault::Bus(embedded_hal::i2c::Error::kind(&e)))
    }

    pub fn init(&mut self) -> Result<(), DisplayFault> {
        self.commands(&INIT_SEQUENCE)?;
        Screen::clear(self);
        self.present()
    }

    /// Clear and show a single line in the middle of the panel.
    pub fn show_centered_text(&mut self, text: &str) -> Result<(), DisplayFault> {
        Screen::clear(self);
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let center = Point::new(SCREEN_WIDTH as i32 / 2, SCREEN_HEIGHT as i32 / 2);
        let _ = Text::with_alignment(text, center, style, Alignment::Center).draw(self);
        self.present()
    }

    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        let idx = x as usize + (y as usize / 8) * SCREEN_WIDTH as usize;
        self.frame[idx] & (1 << (y % 8)) != 0
    }
}

impl<I> OriginDimensions for OledDisplay<'_, I> {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl<I> DrawTarget for OledDisplay<'_, I> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<P>(&mut self, pixels: P) -> Result<(), Self::Error>
    where
        P: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
                continue;
            }
            let idx = x as usize + (y as usize / 8) * SCREEN_WIDTH as usize;
            let bit = 1u8 << (y % 8);
            match color {
                BinaryColor::On => self.frame[idx] |= bit,
                BinaryColor::Off => self.frame[idx] &= !bit,
            }
        }
        Ok(())
    }
}

impl<I: I2c> Screen for OledDisplay<'_, I> {
    fn clear(&mut self) {
        self.frame.fill(0);
    }

    fn render(&mut self, text: &str, at: Point) {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let _ = Text::with_baseline(text, at, style, Baseline::Top).draw(self);
    }

    fn present(&mut self) -> Result<(), DisplayFault> {
        // Full-screen window: columns 0..=127, pages 0..=7.
        self.commands(&[0x21, 0, (SCREEN_WIDTH - 1) as u8, 0x22, 0, (SCREEN_HEIGHT / 8 - 1) as u8])?;

        let mut bus = self.bus.borrow_mut();
        let mut buf = [0u8; DATA_CHUNK + 1];
        buf[0] = CONTROL_DATA;
        for chunk in self.frame.chunks(DATA_CHUNK) {
            buf[1..=chunk.len()].copy_from_slice(chunk);
            bus.write(I2C_ADDR_OLED, &buf[..=chunk.len()])
                .map_err(|e| DisplayFault::Bus(embedded_hal::i2c::Error::kind(&e)))?;
        }
        Ok(())
    }
}
