//! Text display
//!
//! The labs only ever draw short centred strings and the occasional horizontal line, then flush
//! the frame. [`Display`] captures exactly that contract. Drawing is fire-and-forget: a failed
//! draw leaves a stale frame but never stops the state machine.
//!
//! Two adapters are provided. [`GraphicsDisplay`] renders onto any [`embedded_graphics`]
//! `DrawTarget`, which covers the usual SPI LCD drivers. [`SerialDisplay`] writes every string as a
//! line of text to an [`embedded_io::Write`] sink, useful on a LaunchPad without a screen.

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

/// Screen width of the course LCD. Text centred on `CENTER_X` is horizontally centred.
pub const WIDTH: i32 = 128;
/// Horizontal centre of the screen
pub const CENTER_X: i32 = WIDTH / 2;

/// Minimal text display used by all labs
pub trait Display {
    /// Blank the frame buffer
    fn clear(&mut self);

    /// Draw `text` centred on (`x`, `y`)
    fn draw_centered(&mut self, text: &str, x: i32, y: i32);

    /// Draw a horizontal line from `x1` to `x2` on row `y`
    fn draw_hline(&mut self, x1: i32, x2: i32, y: i32);

    /// Push the frame buffer to the screen
    fn flush(&mut self);

    /// Clear the frame buffer and immediately show the blank screen
    fn clear_and_flush(&mut self) {
        self.clear();
        self.flush();
    }
}

impl<T: Display + ?Sized> Display for &mut T {
    fn clear(&mut self) {
        (**self).clear()
    }

    fn draw_centered(&mut self, text: &str, x: i32, y: i32) {
        (**self).draw_centered(text, x, y)
    }

    fn draw_hline(&mut self, x1: i32, x2: i32, y: i32) {
        (**self).draw_hline(x1, x2, y)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// [`Display`] implementation for an `embedded-graphics` draw target.
///
/// Text uses the 6x10 monospace font. Drawing goes straight to the target, so `flush` is a no-op;
/// drivers with their own frame buffer should be flushed by the caller.
pub struct GraphicsDisplay<D: DrawTarget> {
    target: D,
    foreground: D::Color,
    background: D::Color,
}

impl<D: DrawTarget> GraphicsDisplay<D> {
    /// Wrap a draw target, drawing in `foreground` over `background`
    pub fn new(target: D, foreground: D::Color, background: D::Color) -> Self {
        GraphicsDisplay {
            target,
            foreground,
            background,
        }
    }

    /// Borrow the underlying draw target
    pub fn inner(&self) -> &D {
        &self.target
    }

    /// Mutably borrow the underlying draw target
    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.target
    }

    /// Release the underlying draw target
    pub fn release(self) -> D {
        self.target
    }
}

impl<D: DrawTarget> Display for GraphicsDisplay<D> {
    fn clear(&mut self) {
        self.target.clear(self.background).ok();
    }

    fn draw_centered(&mut self, text: &str, x: i32, y: i32) {
        let character_style = MonoTextStyle::new(&FONT_6X10, self.foreground);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(text, Point::new(x, y), character_style, text_style)
            .draw(&mut self.target)
            .ok();
    }

    fn draw_hline(&mut self, x1: i32, x2: i32, y: i32) {
        Line::new(Point::new(x1, y), Point::new(x2, y))
            .into_styled(PrimitiveStyle::with_stroke(self.foreground, 1))
            .draw(&mut self.target)
            .ok();
    }

    fn flush(&mut self) {}
}

/// Width in pixels of one character cell, used to place text columns on a serial console
const CELL_WIDTH: i32 = 6;

/// [`Display`] implementation writing text lines to a serial port.
///
/// `clear` emits a form feed, each `draw_centered` emits one line, horizontal lines become a row of
/// dashes under the columns they span.
pub struct SerialDisplay<W: embedded_io::Write> {
    tx: W,
}

impl<W: embedded_io::Write> SerialDisplay<W> {
    /// Wrap a serial writer
    pub fn new(tx: W) -> Self {
        SerialDisplay { tx }
    }

    /// Release the underlying writer
    pub fn release(self) -> W {
        self.tx
    }
}

impl<W: embedded_io::Write> Display for SerialDisplay<W> {
    fn clear(&mut self) {
        self.tx.write_all(b"\x0c").ok();
    }

    fn draw_centered(&mut self, text: &str, _x: i32, _y: i32) {
        self.tx.write_all(text.as_bytes()).ok();
        self.tx.write_all(b"\r\n").ok();
    }

    fn draw_hline(&mut self, x1: i32, x2: i32, _y: i32) {
        let start = x1.max(0) / CELL_WIDTH;
        let end = x2.max(x1).max(0) / CELL_WIDTH;
        for _ in 0..start {
            self.tx.write_all(b" ").ok();
        }
        for _ in start..=end {
            self.tx.write_all(b"-").ok();
        }
        self.tx.write_all(b"\r\n").ok();
    }

    fn flush(&mut self) {
        self.tx.flush().ok();
    }
}
