//! Terminal display surface: renders the cell grid as colored blocks.
//!
//! Each group occupies two terminal rows: a text label, then one
//! background-colored block per cell. Bindings are resolved once at
//! construction from the static group enumeration; a group that does not
//! fit the terminal is reported and skipped without affecting the others.

use std::io;

use crossterm::style::{Color, ResetColor, SetBackgroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, execute, queue, style};

use colorbars::Argb;
use overlay::driver::CellSurface;
use overlay::group::GroupId;

#[cfg(test)]
#[path = "term_test.rs"]
mod term_test;

/// Terminal columns per cell. Two columns make a roughly square block.
const CELL_COLUMNS: u16 = 2;

/// Rows above the first group (the frame-count header line).
const HEADER_ROWS: u16 = 1;

/// Rows per group: label line plus cell line.
const GROUP_ROWS: u16 = 2;

struct GroupSlot {
    group: GroupId,
    label_row: u16,
    cells_row: u16,
    bound: bool,
    /// Allocated once; cell identity is stable, only colors mutate.
    cells: Vec<Argb>,
}

/// A [`CellSurface`] writing to a terminal through crossterm.
pub struct TermSurface<W: io::Write> {
    out: W,
    slots: Vec<GroupSlot>,
    frame_label: u32,
}

impl<W: io::Write> TermSurface<W> {
    /// Bind all four groups against the given terminal geometry.
    #[allow(clippy::cast_possible_truncation)] // four groups, two rows each
    pub fn new(out: W, columns: u16, rows: u16) -> Self {
        let mut slots = Vec::with_capacity(GroupId::ALL.len());
        for (position, group) in GroupId::ALL.into_iter().enumerate() {
            let label_row = HEADER_ROWS + position as u16 * GROUP_ROWS;
            let cells_row = label_row + 1;
            let needed_columns = cell_columns(group);
            let bound = cells_row < rows && needed_columns <= columns;
            if !bound {
                tracing::warn!(
                    group = group.label(),
                    needed_columns,
                    columns,
                    rows,
                    "cell group does not fit the terminal; it will not render"
                );
            }
            slots.push(GroupSlot {
                group,
                label_row,
                cells_row,
                bound,
                cells: vec![Argb(0xFF00_0000); group.cell_count()],
            });
        }
        Self {
            out,
            slots,
            frame_label: 0,
        }
    }

    /// Groups that resolved against the terminal and will render.
    #[must_use]
    pub fn bound_groups(&self) -> Vec<GroupId> {
        self.slots
            .iter()
            .filter(|slot| slot.bound)
            .map(|slot| slot.group)
            .collect()
    }

    /// Total rows the grid occupies, including the header.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // four groups, two rows each
    pub fn grid_rows(&self) -> u16 {
        HEADER_ROWS + GroupId::ALL.len() as u16 * GROUP_ROWS
    }

    /// Clear the screen and hide the cursor.
    ///
    /// # Errors
    ///
    /// Propagates terminal write failures.
    pub fn enter(&mut self) -> io::Result<()> {
        execute!(self.out, Clear(ClearType::All), cursor::Hide)
    }

    /// Restore the cursor and park it below the grid.
    ///
    /// # Errors
    ///
    /// Propagates terminal write failures.
    pub fn leave(&mut self) -> io::Result<()> {
        let below = self.grid_rows();
        execute!(self.out, cursor::Show, cursor::MoveTo(0, below))
    }

    /// Flush the current cell colors and frame label to the terminal.
    ///
    /// # Errors
    ///
    /// Propagates terminal write failures.
    pub fn present(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(0, 0),
            style::Print(format!("colorbar  frame {:>10}", self.frame_label)),
        )?;
        for slot in &self.slots {
            if !slot.bound {
                continue;
            }
            queue!(
                self.out,
                cursor::MoveTo(0, slot.label_row),
                style::Print(slot.group.label()),
            )?;
            queue!(self.out, cursor::MoveTo(0, slot.cells_row))?;
            for &cell in &slot.cells {
                queue!(
                    self.out,
                    SetBackgroundColor(to_terminal_color(cell)),
                    style::Print("  "),
                )?;
            }
            queue!(self.out, ResetColor)?;
        }
        self.out.flush()
    }
}

impl<W: io::Write> CellSurface for TermSurface<W> {
    fn set_cell_color(&mut self, group: GroupId, index: usize, color: Argb) {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.group == group) else {
            return;
        };
        if let Some(cell) = slot.cells.get_mut(index) {
            *cell = color;
        }
    }

    fn set_frame_label(&mut self, frame_count: u32) {
        self.frame_label = frame_count;
    }
}

#[allow(clippy::cast_possible_truncation)] // group sizes are small constants
fn cell_columns(group: GroupId) -> u16 {
    group.cell_count() as u16 * CELL_COLUMNS
}

#[allow(clippy::cast_possible_truncation)] // channels are masked to one byte
fn to_terminal_color(color: Argb) -> Color {
    // Alpha is dropped: every palette entry is fully opaque.
    Color::Rgb {
        r: ((color.0 >> 16) & 0xFF) as u8,
        g: ((color.0 >> 8) & 0xFF) as u8,
        b: (color.0 & 0xFF) as u8,
    }
}
