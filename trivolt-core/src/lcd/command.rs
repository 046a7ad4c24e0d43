//! LCD text controller instruction set
//!
//! Only the subset the meter uses. Every byte sent to the controller is
//! preceded by a register-select byte telling it whether the payload is an
//! instruction or character data.

/// Visible columns per row
pub const COLUMNS: u8 = 16;

/// Visible rows
pub const ROWS: u8 = 2;

/// Characters each row holds in display memory, visible or not
pub const LINE_CAPACITY: u8 = 40;

/// Clear display memory and return the cursor home
pub const CLEAR: u8 = 0x01;

/// Return the cursor to the first column of row 0
pub const HOME: u8 = 0x02;

/// Entry mode: cursor moves right, display does not shift
pub const ENTRY_MODE: u8 = 0x06;

/// Display on, cursor off, blink off
pub const DISPLAY_ON: u8 = 0x0C;

/// Function set: 2-line display, 5x8 font
pub const FUNCTION_SET: u8 = 0x28;

/// Set display memory address (OR with the address)
pub const SET_DDRAM: u8 = 0x80;

/// Display memory address of the first column of row 1
pub const LINE2: u8 = 0xC0;

/// Offset between consecutive rows in display memory
const ROW_STRIDE: u8 = 0x40;

/// Register-select byte sent before each payload byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RegisterSelect {
    /// Payload is an instruction
    Command = 0x80,
    /// Payload is a character written at the cursor
    Data = 0x40,
}

impl RegisterSelect {
    /// Value sent on the wire
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Instruction moving the cursor to `col` on `row`
///
/// Returns `None` for positions outside display memory.
pub fn set_cursor(row: u8, col: u8) -> Option<u8> {
    if row >= ROWS || col >= LINE_CAPACITY {
        return None;
    }
    Some(SET_DDRAM | (row * ROW_STRIDE + col))
}
