//! Capture to display through the real acquisition thread and slot.

mod common;

use std::sync::Arc;
use std::time::Duration;

use capview::acquisition::spawn_acquisition;
use capview::capture::SyntheticSource;
use capview::core::buffer_pool::BufferPool;
use capview::core::latest_frame::{Consumed, LatestFrame};
use capview::core::run_flag::RunFlag;
use capview::error::EXIT_ACQUISITION_FAILURE;
use capview::render::{DisplayImage, HeadlessSurface};
use capview::session::ViewerSession;

use common::assertions::{assert_display_solid, wait_for};
use common::handlers;
use common::scripted::{ScriptedSource, Step};
use common::test_frames::{TINY_SIZE, grey_frame, solid_frame};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_every_frame_reaches_the_display_in_order() {
    let frames = (1..=5u8).map(|i| grey_frame(TINY_SIZE, i * 10));
    let (source, gate) = ScriptedSource::frames(frames).gated();
    let latest = Arc::new(LatestFrame::new());
    let (handler, codes) = handlers::recording();

    gate.send(()).unwrap();
    let handle = spawn_acquisition(
        source.into_opener(),
        latest.clone(),
        RunFlag::new(),
        Arc::new(BufferPool::default()),
        handler,
    )
    .unwrap();
    assert_eq!(handle.first_frame_size(), TINY_SIZE);

    let mut display = DisplayImage::new(TINY_SIZE).unwrap();
    for i in 1..=5u64 {
        assert!(wait_for(WAIT, || latest.latest_sequence() == i));
        assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Fresh(i));
        let value = i as u8 * 10;
        assert_display_solid(&display, [value, value, value]);
        // Next read: frame i + 1, or end of stream after the fifth
        gate.send(()).unwrap();
    }

    let err = handle.join().unwrap_err();
    assert!(err.is_acquisition_failure());
    assert_eq!(err.exit_code(), EXIT_ACQUISITION_FAILURE);
    assert_eq!(*codes.lock().unwrap(), vec![EXIT_ACQUISITION_FAILURE]);
    assert_eq!(latest.latest_sequence(), 5);
}

#[test]
fn test_colors_and_orientation_survive_the_pipeline() {
    let frames = vec![solid_frame(TINY_SIZE, [200, 100, 50]); 1000];
    let source = SyntheticSource::from_frames(frames)
        .with_frame_interval(Duration::from_millis(1));

    let mut surface = HeadlessSurface::new().with_max_ticks(4);
    let (handler, codes) = handlers::recording_and_closing(surface.closer());
    let report = ViewerSession::builder()
        .with_source(source)
        .with_timer_period(Duration::from_millis(5))
        .with_fatal_handler(handler)
        .build()
        .unwrap()
        .run(&mut surface)
        .unwrap();

    assert_eq!(report.first_frame_size, TINY_SIZE);
    assert_eq!(report.presenter.ticks, 4);
    assert_eq!(surface.redraws(), 4);
    assert_display_solid(surface.display_image().unwrap(), [200, 100, 50]);
    assert!(codes.lock().unwrap().is_empty());
}

#[test]
fn test_source_failure_mid_run_ends_session_with_exit_code() {
    let source = ScriptedSource::new([
        Step::Frame(grey_frame(TINY_SIZE, 1)),
        Step::Frame(grey_frame(TINY_SIZE, 2)),
        Step::Fail("cable pulled".to_string()),
    ]);

    let mut surface = HeadlessSurface::new().with_max_duration(WAIT);
    let (handler, codes) = handlers::recording_and_closing(surface.closer());
    let err = ViewerSession::builder()
        .with_source_opener(source.into_opener())
        .with_timer_period(Duration::from_millis(5))
        .with_fatal_handler(handler)
        .build()
        .unwrap()
        .run(&mut surface)
        .unwrap_err();

    assert_eq!(err.exit_code(), EXIT_ACQUISITION_FAILURE);
    assert!(err.to_string().contains("cable pulled"));
    assert_eq!(*codes.lock().unwrap(), vec![EXIT_ACQUISITION_FAILURE]);
    // The display was created and shown before the failure.
    assert!(surface.display_image().is_some());
}
