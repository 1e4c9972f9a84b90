//! Shared visual codec for the colorbar diagnostic overlay.
//!
//! This crate owns the value-to-color representation read by external
//! observers (a camera filming the screen, or a frame-capture pipeline).
//! Both halves live here: the encoders the overlay drives every frame, and
//! the decoders a capture pipeline uses to recover the values from a still.
//!
//! Compatibility is exact-match on color values. Observers recover a value
//! by looking each cell color up in the palette and reassembling bits or
//! nibbles low-to-high, so the palette constants below must never drift.

use std::fmt;
use std::str::FromStr;

/// Number of cells in a binary barcode (one per bit of a `u32`).
pub const BARCODE_CELLS: usize = 32;

/// A packed `0xAARRGGBB` display color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Argb(pub u32);

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

impl fmt::Debug for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Argb(#{:08x})", self.0)
    }
}

/// Error returned when a string is not a parseable ARGB color.
#[derive(Debug, thiserror::Error)]
#[error("invalid ARGB color `{0}`; expected 8 hex digits")]
pub struct ParseArgbError(String);

impl FromStr for Argb {
    type Err = ParseArgbError;

    /// Parse `aarrggbb`, `#aarrggbb`, or `0xaarrggbb` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .or_else(|| s.strip_prefix('#'))
            .unwrap_or(s);

        if digits.len() != 8 {
            return Err(ParseArgbError(s.to_owned()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseArgbError(s.to_owned()))
    }
}

/// Two-entry palette for barcode cells: index = bit value.
pub const BINARY_PALETTE: [Argb; 2] = [
    Argb(0xFF00_0000), // black
    Argb(0xFFFF_FFFF), // white
];

/// Sixteen-entry palette for hex-color cells: index = nibble value.
pub const HEX_PALETTE: [Argb; 16] = [
    Argb(0xFF00_0000), // black
    Argb(0xFF00_FFFF),
    Argb(0xFFFF_00FF),
    Argb(0xFF00_00FF),
    Argb(0xFFFF_FF00),
    Argb(0xFF00_AA00),
    Argb(0xFFFF_0000),
    Argb(0xFFFF_C0C0),
    Argb(0xFF80_8080),
    Argb(0xFF40_80A0),
    Argb(0xFF60_3040),
    Argb(0xFFC0_C080),
    Argb(0xFFD2_691E),
    Argb(0xFFCC_FFCC),
    Argb(0xFF76_5432),
    Argb(0xFFFF_FFFF), // white
];

/// Encoded width of a hex-color value.
///
/// Only these two widths exist: the frame counter is logically 32-bit while
/// timestamps are 64-bit. Keeping the width an enum makes the four-bits-per-
/// cell divisibility requirement unrepresentable to violate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitWidth {
    W32,
    W64,
}

impl BitWidth {
    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Cells needed at four bits (one hex nibble) per cell.
    #[must_use]
    pub const fn cells(self) -> usize {
        (self.bits() / 4) as usize
    }
}

/// Encode a frame counter as a 32-cell black/white barcode.
///
/// Cell `i` carries bit `i` of `value`, least-significant bit first. Total
/// over the full input domain and deterministic: the same value always
/// renders the same cells.
#[must_use]
pub fn encode_barcode(value: u32) -> [Argb; BARCODE_CELLS] {
    let mut cells = [BINARY_PALETTE[0]; BARCODE_CELLS];
    for (i, cell) in cells.iter_mut().enumerate() {
        *cell = BINARY_PALETTE[((value >> i) & 1) as usize];
    }
    cells
}

/// Encode a value as hex-color cells, one nibble per cell.
///
/// Cell `i` carries nibble `i` of `value`, least-significant nibble first.
/// A value wider than `width` truncates to its low bits; that is how the
/// logically 32-bit frame counter shares this encoder with 64-bit
/// timestamps.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // nibble is masked to 0..=15
pub fn encode_colorbars(value: u64, width: BitWidth) -> Vec<Argb> {
    (0..width.cells())
        .map(|i| HEX_PALETTE[((value >> (4 * i)) & 0xF) as usize])
        .collect()
}

/// Error returned by the decoders.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The cell sequence length does not match any encodable width.
    #[error("cannot decode {found} cells (limit {max})")]
    CellCount { found: usize, max: usize },
    /// A cell color has no palette entry; the capture is corrupt.
    #[error("cell {index} holds {color}, which is not in the palette")]
    UnknownColor { index: usize, color: Argb },
}

/// Recover a frame counter from a captured 32-cell barcode.
///
/// # Errors
///
/// Returns [`DecodeError::CellCount`] unless exactly [`BARCODE_CELLS`] cells
/// are supplied, and [`DecodeError::UnknownColor`] for any cell that is
/// neither palette black nor palette white.
pub fn decode_barcode(cells: &[Argb]) -> Result<u32, DecodeError> {
    if cells.len() != BARCODE_CELLS {
        return Err(DecodeError::CellCount {
            found: cells.len(),
            max: BARCODE_CELLS,
        });
    }

    let mut value = 0u32;
    for (index, &color) in cells.iter().enumerate() {
        let bit = palette_index(&BINARY_PALETTE, index, color)?;
        value |= u32::from(bit) << index;
    }
    Ok(value)
}

/// Recover a value from captured hex-color cells, low nibble first.
///
/// Accepts any length from 1 to the 16 cells of a 64-bit value, so both
/// 8-cell counter groups and 16-cell timestamp groups decode here.
///
/// # Errors
///
/// Returns [`DecodeError::CellCount`] for empty or over-long input and
/// [`DecodeError::UnknownColor`] for any color outside [`HEX_PALETTE`].
pub fn decode_colorbars(cells: &[Argb]) -> Result<u64, DecodeError> {
    let max = BitWidth::W64.cells();
    if cells.is_empty() || cells.len() > max {
        return Err(DecodeError::CellCount {
            found: cells.len(),
            max,
        });
    }

    let mut value = 0u64;
    for (index, &color) in cells.iter().enumerate() {
        let nibble = palette_index(&HEX_PALETTE, index, color)?;
        value |= u64::from(nibble) << (4 * index);
    }
    Ok(value)
}

#[allow(clippy::cast_possible_truncation)] // palettes hold at most 16 entries
fn palette_index(palette: &[Argb], index: usize, color: Argb) -> Result<u8, DecodeError> {
    palette
        .iter()
        .position(|&entry| entry == color)
        .map(|entry_index| entry_index as u8)
        .ok_or(DecodeError::UnknownColor { index, color })
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
