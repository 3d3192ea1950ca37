//! 12-key matrix keypad
//!
//! The board keypad is a 3 column by 4 row matrix. Columns are driven one at a time, rows are
//! read back through pull-ups, so a pressed key pulls its row low while its column is low.

use embedded_hal::digital::{InputPin, OutputPin};

/// Source of key presses, polled by the labs once per loop iteration
pub trait Keypad {
    /// ASCII character of the key currently held down, or `None` when nothing is pressed.
    ///
    /// When several keys are held the first one in scan order wins.
    fn get_key(&mut self) -> Option<u8>;
}

impl<T: Keypad + ?Sized> Keypad for &mut T {
    fn get_key(&mut self) -> Option<u8> {
        (**self).get_key()
    }
}

/// Key layout, indexed by `[row][column]`
pub const LAYOUT: [[u8; 3]; 4] = [
    [b'1', b'2', b'3'],
    [b'4', b'5', b'6'],
    [b'7', b'8', b'9'],
    [b'*', b'0', b'#'],
];

/// Scanned keypad over GPIO pins
pub struct MatrixKeypad<C: OutputPin, R: InputPin> {
    cols: [C; 3],
    rows: [R; 4],
}

impl<C: OutputPin, R: InputPin> MatrixKeypad<C, R> {
    /// Take ownership of the column outputs and pulled-up row inputs. All columns are released
    /// (driven high).
    pub fn new(mut cols: [C; 3], rows: [R; 4]) -> Self {
        for col in cols.iter_mut() {
            col.set_high().ok();
        }
        MatrixKeypad { cols, rows }
    }

    /// Release the pins
    pub fn free(self) -> ([C; 3], [R; 4]) {
        (self.cols, self.rows)
    }

    fn scan_column(&mut self, col: usize) -> Option<u8> {
        self.cols[col].set_low().ok();
        let hit = self
            .rows
            .iter_mut()
            .position(|row| row.is_low().unwrap_or(false));
        self.cols[col].set_high().ok();
        hit.map(|row| LAYOUT[row][col])
    }
}

impl<C: OutputPin, R: InputPin> Keypad for MatrixKeypad<C, R> {
    fn get_key(&mut self) -> Option<u8> {
        (0..self.cols.len()).find_map(|col| self.scan_column(col))
    }
}
