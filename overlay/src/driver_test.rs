use std::collections::HashMap;

use colorbars::{decode_barcode, decode_colorbars};

use super::*;

/// Manual stepping scheduler: registrations accumulate until the test
/// delivers them.
#[derive(Default)]
struct StepVsync {
    pending: u32,
}

impl Vsync for StepVsync {
    fn register_next_frame(&mut self) {
        self.pending += 1;
    }
}

/// Surface that records every cell write and frame label.
#[derive(Default)]
struct RecordingSurface {
    cells: HashMap<(GroupId, usize), Argb>,
    labels: Vec<u32>,
}

impl RecordingSurface {
    fn group(&self, group: GroupId) -> Vec<Argb> {
        (0..group.cell_count())
            .map(|index| *self.cells.get(&(group, index)).expect("cell written"))
            .collect()
    }
}

impl CellSurface for RecordingSurface {
    fn set_cell_color(&mut self, group: GroupId, index: usize, color: Argb) {
        self.cells.insert((group, index), color);
    }

    fn set_frame_label(&mut self, frame_count: u32) {
        self.labels.push(frame_count);
    }
}

struct FixedClock(u64);

impl WallClock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

fn test_driver(wall_ms: u64) -> FrameDriver<RecordingSurface, FixedClock> {
    FrameDriver::with_clock(RecordingSurface::default(), FixedClock(wall_ms))
}

/// Deliver one registered callback, if any. Returns whether a frame ran.
fn step(
    driver: &mut FrameDriver<RecordingSurface, FixedClock>,
    vsync: &mut StepVsync,
    presentation_ts: u64,
) -> bool {
    if vsync.pending == 0 {
        return false;
    }
    vsync.pending -= 1;
    driver.on_frame(presentation_ts, vsync);
    true
}

// --- lifecycle ---

#[test]
fn start_registers_the_first_frame() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    assert_eq!(driver.state(), DriverState::Idle);
    driver.start(&mut vsync);
    assert_eq!(driver.state(), DriverState::Running);
    assert_eq!(vsync.pending, 1);
}

#[test]
fn reentrant_start_is_a_noop() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    driver.start(&mut vsync);
    assert_eq!(vsync.pending, 1);
}

#[test]
fn on_frame_before_start_is_a_noop() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.on_frame(7, &mut vsync);
    assert_eq!(driver.frame_count(), 0);
    assert_eq!(vsync.pending, 0);
    assert_eq!(driver.state(), DriverState::Idle);
}

#[test]
fn start_after_stop_does_not_resume() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    driver.stop_handle().request_stop();
    assert!(step(&mut driver, &mut vsync, 1));
    assert_eq!(driver.state(), DriverState::Stopped);

    driver.start(&mut vsync);
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(vsync.pending, 0);
}

// --- frame encoding ---

#[test]
fn first_frame_encodes_counter_zero() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    assert!(step(&mut driver, &mut vsync, 0));

    let barcode = driver.surface_mut().group(GroupId::FrameCountBinary);
    assert_eq!(decode_barcode(&barcode).expect("decode"), 0);

    let count = driver.surface_mut().group(GroupId::FrameCountColor);
    assert_eq!(decode_colorbars(&count).expect("decode"), 0);
}

#[test]
fn frame_paints_both_timestamps() {
    let wall_ms = 0x1122_3344_5566_7788u64;
    let presentation_ts = 0xFEDC_BA98_7654_3210u64;
    let mut driver = test_driver(wall_ms);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    assert!(step(&mut driver, &mut vsync, presentation_ts));

    let wall = driver.surface_mut().group(GroupId::TimestampColor);
    assert_eq!(decode_colorbars(&wall).expect("decode"), wall_ms);

    let pts = driver.surface_mut().group(GroupId::PresentationTimestampColor);
    assert_eq!(decode_colorbars(&pts).expect("decode"), presentation_ts);
}

#[test]
fn encoders_observe_the_pre_increment_counter() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    for expected in 0u64..5 {
        assert!(step(&mut driver, &mut vsync, expected));
        let count = driver.surface_mut().group(GroupId::FrameCountColor);
        assert_eq!(decode_colorbars(&count).expect("decode"), expected);
    }
}

// --- frame counter ---

#[test]
fn counter_advances_by_one_for_130_frames() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    for n in 0..130u64 {
        assert!(step(&mut driver, &mut vsync, n));
    }

    assert_eq!(driver.frame_count(), 130);
    assert_eq!(driver.surface_mut().labels, (0..130).collect::<Vec<u32>>());
}

#[test]
fn frame_log_fires_exactly_twice_in_first_130_frames() {
    let fired = (0u32..130).filter(|&n| frame_log_due(n)).collect::<Vec<_>>();
    assert_eq!(fired, vec![0, 128]);
}

#[test]
fn counter_wraps_silently_at_u32_max() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    driver.frame_count = u32::MAX;
    assert!(step(&mut driver, &mut vsync, 0));

    assert_eq!(driver.frame_count(), 0);
    let barcode = driver.surface_mut().group(GroupId::FrameCountBinary);
    assert_eq!(decode_barcode(&barcode).expect("decode"), u32::MAX);
}

// --- shutdown ---

#[test]
fn stop_allows_at_most_one_further_frame() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    assert!(step(&mut driver, &mut vsync, 0));
    assert_eq!(driver.state(), DriverState::Running);

    driver.stop_handle().request_stop();

    // The already-registered frame still runs, but does not re-arm.
    assert!(step(&mut driver, &mut vsync, 1));
    assert_eq!(driver.frame_count(), 2);
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(vsync.pending, 0);

    // A stray callback after the transition is ignored.
    driver.on_frame(2, &mut vsync);
    assert_eq!(driver.frame_count(), 2);
}

#[test]
fn request_stop_is_idempotent() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    let stop = driver.stop_handle();
    stop.request_stop();
    stop.request_stop();

    assert!(step(&mut driver, &mut vsync, 0));
    assert_eq!(driver.state(), DriverState::Stopped);
}

#[test]
fn stop_requested_from_another_thread_is_observed() {
    let mut driver = test_driver(0);
    let mut vsync = StepVsync::default();

    driver.start(&mut vsync);
    let stop = driver.stop_handle();
    std::thread::spawn(move || stop.request_stop())
        .join()
        .expect("stop thread");

    assert!(step(&mut driver, &mut vsync, 0));
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(vsync.pending, 0);
}
