//! The latest-frame slot under a real writer and reader thread.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use capview::core::buffer_pool::BufferPool;
use capview::core::latest_frame::{Consumed, LatestFrame, PublishOutcome};
use capview::processing::{convert, convert_into};
use capview::render::DisplayImage;

use common::test_frames::{VGA_SIZE, grey_frame};

#[test]
fn test_reader_never_sees_a_torn_frame() {
    let latest = Arc::new(LatestFrame::new());
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let latest = latest.clone();
        let done = done.clone();
        thread::spawn(move || {
            let pool = BufferPool::new(3);
            let frames: Vec<_> = (0..8u8).map(|v| grey_frame(VGA_SIZE, v * 30)).collect();
            for i in 0..400usize {
                let frame = &frames[i % frames.len()];
                let buffer = pool.get_buffer(VGA_SIZE.pixel_count() * 3);
                let normalized = convert_into(frame, buffer).unwrap();
                if let PublishOutcome::Stored {
                    displaced: Some(old),
                    ..
                } = latest.publish(normalized)
                {
                    pool.return_buffer(old.into_bytes());
                }
            }
            done.store(true, Ordering::Release);
        })
    };

    let mut display = DisplayImage::new(VGA_SIZE).unwrap();
    let mut fresh = 0u64;
    let mut last_sequence = 0u64;
    while !done.load(Ordering::Acquire) {
        match latest.consume_into(&mut display).unwrap() {
            Consumed::Fresh(sequence) => {
                assert!(sequence > last_sequence, "sequence went backwards");
                last_sequence = sequence;
                fresh += 1;
                let first = display.as_bytes()[0];
                assert!(
                    display.as_bytes().iter().all(|&b| b == first),
                    "display mixes two frames at sequence {}",
                    sequence
                );
            }
            Consumed::Repeat(sequence) => assert_eq!(sequence, last_sequence),
            Consumed::Empty => assert_eq!(last_sequence, 0),
        }
    }
    writer.join().unwrap();

    assert!(fresh >= 1);
    assert_eq!(latest.latest_sequence(), 400);
    // The last frame the writer stored is what a final consume shows.
    latest.consume_into(&mut display).unwrap();
    assert!(display.as_bytes().iter().all(|&b| b == (399 % 8) as u8 * 30));
}

#[test]
fn test_slow_reader_only_sees_latest() {
    let latest = LatestFrame::new();
    let mut display = DisplayImage::new(VGA_SIZE).unwrap();

    for v in 1..=10u8 {
        latest.publish(convert(&grey_frame(VGA_SIZE, v)).unwrap());
    }
    assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Fresh(10));
    assert!(display.as_bytes().iter().all(|&b| b == 10));
    assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Repeat(10));
}
