//! Per-frame driver: owns the frame counter and the shutdown flag, and
//! turns vsync callbacks into cell-group updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use colorbars::{Argb, BitWidth, encode_barcode, encode_colorbars};

use crate::group::GroupId;

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;

/// The frame counter is logged whenever it is a multiple of this.
const FRAME_LOG_INTERVAL: u32 = 128;

/// The per-frame scheduling facility.
///
/// One registration buys exactly one future [`FrameDriver::on_frame`]
/// invocation, delivered with a monotonically increasing presentation
/// timestamp and never concurrently with another. The production
/// implementation wraps the host's vsync source; tests step the driver with
/// a manual scheduler.
pub trait Vsync {
    /// Arm the facility to deliver one more frame callback.
    fn register_next_frame(&mut self);
}

/// The display surface the driver paints.
///
/// The driver is the sole writer. Display composition reads on the same
/// thread that wrote, so cell storage needs no synchronization.
pub trait CellSurface {
    /// Assign one cell's color.
    fn set_cell_color(&mut self, group: GroupId, index: usize, color: Argb);

    /// Publish the decimal frame counter alongside the grid.
    fn set_frame_label(&mut self, _frame_count: u32) {}
}

/// Source of the wall-clock timestamp encoded each frame.
pub trait WallClock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Production clock backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    #[allow(clippy::cast_possible_truncation)] // ms since epoch fits u64 for ~584M years
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

/// Driver lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Created, no frame registered yet.
    Idle,
    /// Re-arming and painting every refresh.
    Running,
    /// Terminal; no further frames will be processed.
    Stopped,
}

/// Requests shutdown of a [`FrameDriver`], from any thread.
///
/// Idempotent, and racing an in-flight frame is accepted: at most one extra
/// frame is processed after the request.
#[derive(Clone, Debug)]
pub struct StopHandle {
    active: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the driver to stop re-arming. It reaches
    /// [`DriverState::Stopped`] when the next frame observes the flag.
    pub fn request_stop(&self) {
        // Relaxed suffices: the flag only gates re-arming, and a one-frame
        // overrun on a cross-thread stop is within contract.
        self.active.store(false, Ordering::Relaxed);
    }
}

/// Owns the frame counter and active flag; paints all four cell groups once
/// per vsync callback.
pub struct FrameDriver<S: CellSurface, C: WallClock = SystemWallClock> {
    surface: S,
    clock: C,
    frame_count: u32,
    active: Arc<AtomicBool>,
    state: DriverState,
}

impl<S: CellSurface> FrameDriver<S> {
    /// An idle driver over the given surface, reading the system clock.
    pub fn new(surface: S) -> Self {
        Self::with_clock(surface, SystemWallClock)
    }
}

impl<S: CellSurface, C: WallClock> FrameDriver<S, C> {
    /// An idle driver with an explicit clock.
    pub fn with_clock(surface: S, clock: C) -> Self {
        Self {
            surface,
            clock,
            frame_count: 0,
            active: Arc::new(AtomicBool::new(true)),
            state: DriverState::Idle,
        }
    }

    /// Begin frame processing by registering the first callback.
    ///
    /// A no-op unless the driver is [`DriverState::Idle`]: host visibility
    /// signals repeat, and a stopped driver never resumes.
    pub fn start(&mut self, vsync: &mut dyn Vsync) {
        if self.state != DriverState::Idle {
            return;
        }
        self.state = DriverState::Running;
        vsync.register_next_frame();
    }

    /// Process one frame callback. No-op outside [`DriverState::Running`].
    ///
    /// Re-arms first, so frame N+1 is guaranteed a registration whenever
    /// the active flag held at entry; then paints every group from the
    /// pre-increment counter and the current clock readings; then
    /// increments the counter, wrapping on overflow.
    pub fn on_frame(&mut self, presentation_ts: u64, vsync: &mut dyn Vsync) {
        if self.state != DriverState::Running {
            return;
        }

        if self.active.load(Ordering::Relaxed) {
            vsync.register_next_frame();
        } else {
            self.state = DriverState::Stopped;
        }

        if frame_log_due(self.frame_count) {
            tracing::debug!(frame_count = self.frame_count, "frame count");
        }
        self.surface.set_frame_label(self.frame_count);

        let barcode = encode_barcode(self.frame_count);
        self.paint(GroupId::FrameCountBinary, &barcode);

        let count_cells = encode_colorbars(u64::from(self.frame_count), BitWidth::W32);
        self.paint(GroupId::FrameCountColor, &count_cells);

        let wall_cells = encode_colorbars(self.clock.now_ms(), BitWidth::W64);
        self.paint(GroupId::TimestampColor, &wall_cells);

        let pts_cells = encode_colorbars(presentation_ts, BitWidth::W64);
        self.paint(GroupId::PresentationTimestampColor, &pts_cells);

        self.frame_count = self.frame_count.wrapping_add(1);
    }

    /// Handle for requesting shutdown from other threads.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            active: Arc::clone(&self.active),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The counter the next frame will encode.
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// The surface, for host-side presentation after a frame.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn paint(&mut self, group: GroupId, cells: &[Argb]) {
        debug_assert_eq!(cells.len(), group.cell_count());
        for (index, &color) in cells.iter().enumerate() {
            self.surface.set_cell_color(group, index, color);
        }
    }
}

fn frame_log_due(frame_count: u32) -> bool {
    frame_count % FRAME_LOG_INTERVAL == 0
}
