//! The four fixed cell groups of the overlay grid.

use colorbars::{BARCODE_CELLS, BitWidth};

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

/// Identifies one cell group on the overlay.
///
/// Groups are allocated once at surface construction and never resized;
/// cell identity is stable, only cell color mutates. Hosts bind every group
/// by iterating [`GroupId::ALL`]; there is no name-based lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupId {
    /// 32 black/white cells: the frame counter, one bit per cell.
    FrameCountBinary,
    /// 8 hex-color cells: the frame counter, one nibble per cell.
    FrameCountColor,
    /// 16 hex-color cells: wall-clock milliseconds at render time.
    TimestampColor,
    /// 16 hex-color cells: the host presentation timestamp in nanoseconds.
    PresentationTimestampColor,
}

impl GroupId {
    /// Every group, in top-to-bottom display order.
    pub const ALL: [Self; 4] = [
        Self::FrameCountBinary,
        Self::FrameCountColor,
        Self::TimestampColor,
        Self::PresentationTimestampColor,
    ];

    /// Fixed number of cells in this group.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        match self {
            Self::FrameCountBinary => BARCODE_CELLS,
            Self::FrameCountColor => BitWidth::W32.cells(),
            Self::TimestampColor | Self::PresentationTimestampColor => BitWidth::W64.cells(),
        }
    }

    /// Label rendered next to the group.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FrameCountBinary => "frame count (binary)",
            Self::FrameCountColor => "frame count (hex)",
            Self::TimestampColor => "wall clock (hex)",
            Self::PresentationTimestampColor => "presentation ts (hex)",
        }
    }
}
