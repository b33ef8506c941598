use embedded_graphics::{
    mono_font::{
        MonoTextStyle, MonoTextStyleBuilder,
        ascii::{FONT_5X8, FONT_6X10},
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use medbox_core::render::TextDisplay;
use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};

pub type Panel<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OledError {
    Init,
    Flush,
}

/// 128x64 SSD1306 behind a frame buffer; text lands in the buffer and
/// reaches the glass on [`TextDisplay::show`].
pub struct OledDisplay<I2C> {
    panel: Panel<I2C>,
}

impl<I2C> OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    pub fn new(i2c: I2C) -> Result<Self, OledError> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        panel.init().map_err(|_| OledError::Init)?;
        panel.clear_buffer();
        panel.flush().map_err(|_| OledError::Flush)?;
        Ok(Self { panel })
    }
}

fn text_style(size: u8) -> MonoTextStyle<'static, BinaryColor> {
    let font = if size <= 8 { &FONT_5X8 } else { &FONT_6X10 };
    MonoTextStyleBuilder::new()
        .font(font)
        .text_color(BinaryColor::On)
        .build()
}

impl<I2C> TextDisplay for OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = OledError;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.panel.clear_buffer();
        Ok(())
    }

    fn text(&mut self, text: &str, x: i32, y: i32, size: u8) -> Result<(), Self::Error> {
        // Drawing into the buffer cannot fail; off-panel pixels are clipped.
        let _ = Text::with_baseline(text, Point::new(x, y), text_style(size), Baseline::Top)
            .draw(&mut self.panel);
        Ok(())
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        self.panel.flush().map_err(|_| OledError::Flush)
    }
}
