//! End-to-end extraction tests.
//!
//! Inputs are tiny YUV4MPEG2 streams written into a temporary directory, so
//! these run without any checked-in media.

mod support;

use std::{
    fs,
    sync::{Arc, Mutex},
};

use framedump::{
    ExtractOptions, FrameDump, MediaKind, MediaSource, PacketSource, ProgressCallback,
    ProgressInfo,
};
use support::{Y4M_HEIGHT, Y4M_WIDTH, file_names, write_y4m};

const HEADER: &[u8] = b"P6\n4 4\n255\n";
const BODY_LEN: usize = (Y4M_WIDTH * Y4M_HEIGHT * 3) as usize;

#[test]
fn two_frame_stream_writes_two_files() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("clip.y4m");
    write_y4m(&input, &[64, 192]);
    let output = temporary_directory.path().join("frames");
    fs::create_dir(&output).expect("create output dir");

    let dump = FrameDump::open(&input).expect("Failed to open clip");
    let summary = dump
        .run(&ExtractOptions::new().with_output_dir(&output))
        .expect("Extraction failed");

    assert_eq!(summary.frames_decoded, 2);
    assert_eq!(summary.frames_written, 2);
    assert_eq!(summary.write_failures, 0);
    assert_eq!(file_names(&output), vec!["frame-1.ppm", "frame-2.ppm"]);

    for name in ["frame-1.ppm", "frame-2.ppm"] {
        let bytes = fs::read(output.join(name)).expect("read frame");
        assert!(bytes.starts_with(HEADER), "{name} has a bad header");
        assert_eq!(bytes.len(), HEADER.len() + BODY_LEN, "{name} has a bad size");
    }
}

#[test]
fn frames_are_numbered_in_decode_order() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("ramp.y4m");
    write_y4m(&input, &[32, 128, 224]);

    FrameDump::open(&input)
        .expect("open")
        .run(&ExtractOptions::new().with_output_dir(temporary_directory.path()))
        .expect("run");

    let brightness: Vec<u8> = (1..=3)
        .map(|sequence| {
            let path = temporary_directory.path().join(format!("frame-{sequence}.ppm"));
            let image = image::open(&path).expect("decode P6").to_rgb8();
            assert_eq!(image.dimensions(), (Y4M_WIDTH, Y4M_HEIGHT));
            image.get_pixel(0, 0).0[0]
        })
        .collect();

    assert!(
        brightness[0] < brightness[1] && brightness[1] < brightness[2],
        "frames out of order: {brightness:?}",
    );
}

#[test]
fn flat_grey_input_produces_uniform_grey_pixels() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("grey.y4m");
    write_y4m(&input, &[128]);

    FrameDump::open(&input)
        .expect("open")
        .run(&ExtractOptions::new().with_output_dir(temporary_directory.path()))
        .expect("run");

    let image = image::open(temporary_directory.path().join("frame-1.ppm"))
        .expect("decode P6")
        .to_rgb8();
    let first = *image.get_pixel(0, 0);
    for pixel in image.pixels() {
        assert_eq!(*pixel, first, "frame is not uniform");
    }
    let [red, green, blue] = first.0;
    assert!(red.abs_diff(green) <= 2 && green.abs_diff(blue) <= 2, "not grey: {first:?}");
}

#[test]
fn rerun_into_cleared_directory_is_identical() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("clip.y4m");
    write_y4m(&input, &[64, 192]);
    let output = temporary_directory.path().join("out");
    let options = ExtractOptions::new().with_output_dir(&output);
    let read_frames = || {
        file_names(&output)
            .into_iter()
            .map(|name| fs::read(output.join(&name)).expect("read frame"))
            .collect::<Vec<_>>()
    };

    fs::create_dir(&output).expect("create output dir");
    FrameDump::open(&input).expect("open").run(&options).expect("first run");
    let first = read_frames();

    fs::remove_dir_all(&output).expect("clear output dir");
    fs::create_dir(&output).expect("recreate output dir");
    FrameDump::open(&input).expect("open").run(&options).expect("second run");
    let second = read_frames();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn non_utf8_input_path_is_opened_as_is() {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory
        .path()
        .join(OsStr::from_bytes(b"clip-\xff.y4m"));
    // Some file systems only accept UTF-8 names.
    if fs::write(&input, b"").is_err() {
        return;
    }
    write_y4m(&input, &[64]);

    let summary = FrameDump::open(&input)
        .expect("open non-UTF-8 path")
        .run(&ExtractOptions::new().with_output_dir(temporary_directory.path()))
        .expect("run");
    assert_eq!(summary.frames_written, 1);
}

#[test]
fn custom_prefix_names_files() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("clip.y4m");
    write_y4m(&input, &[100]);
    let output = temporary_directory.path().join("shots");
    fs::create_dir(&output).expect("create output dir");

    FrameDump::open(&input)
        .expect("open")
        .run(&ExtractOptions::new().with_output_dir(&output).with_prefix("shot"))
        .expect("run");

    assert_eq!(file_names(&output), vec!["shot-1.ppm"]);
}

#[test]
fn metadata_describes_the_video_stream() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("clip.y4m");
    write_y4m(&input, &[64, 192]);

    let dump = FrameDump::open(&input).expect("open");
    let metadata = dump.metadata();
    assert_eq!(metadata.streams.len(), 1);
    assert_eq!(metadata.video_stream_index, Some(0));

    let video = dump.video_stream();
    assert_eq!(video.kind, MediaKind::Video);
    assert_eq!((video.width, video.height), (Y4M_WIDTH, Y4M_HEIGHT));
    assert!((video.frames_per_second - 25.0).abs() < 0.01);

    assert_eq!(dump.session().width(), Y4M_WIDTH);
    assert_eq!(dump.session().height(), Y4M_HEIGHT);
}

#[test]
fn packet_source_yields_every_packet_then_none() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("clip.y4m");
    write_y4m(&input, &[10, 20, 30]);

    let mut source = MediaSource::open(&input).expect("open");
    let mut packets = 0;
    while let Some(packet) = source.next_packet().expect("read packet") {
        assert_eq!(packet.stream(), 0);
        packets += 1;
    }
    assert_eq!(packets, 3);
    assert!(source.next_packet().expect("read after end").is_none());
}

#[derive(Default)]
struct LastReport {
    info: Mutex<Option<ProgressInfo>>,
}

impl ProgressCallback for LastReport {
    fn on_progress(&self, info: &ProgressInfo) {
        *self.info.lock().unwrap() = Some(info.clone());
    }
}

#[test]
fn progress_reports_final_count() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("clip.y4m");
    write_y4m(&input, &[1, 2, 3, 4]);
    let report = Arc::new(LastReport::default());

    FrameDump::open(&input)
        .expect("open")
        .run(
            &ExtractOptions::new()
                .with_output_dir(temporary_directory.path())
                .with_progress(report.clone()),
        )
        .expect("run");

    let info = report.info.lock().unwrap().clone().expect("no progress reported");
    assert_eq!(info.frames_written, 4);
    assert_eq!(info.current_frame, 4);
}

#[test]
fn sample_video_fixture_writes_one_file_per_frame() {
    let path = "tests/fixtures/sample_video.mp4";
    if !std::path::Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let dump = FrameDump::open(path).expect("Failed to open test video");
    let (width, height) = (dump.session().width(), dump.session().height());

    let summary = dump
        .run(&ExtractOptions::new().with_output_dir(temporary_directory.path()))
        .expect("Extraction failed");

    assert!(summary.frames_written > 0);
    assert_eq!(summary.frames_written, summary.frames_decoded);
    assert_eq!(
        file_names(temporary_directory.path()).len() as u64,
        summary.frames_written
    );

    let last = temporary_directory
        .path()
        .join(format!("frame-{}.ppm", summary.frames_written));
    let image = image::open(&last).expect("decode P6").to_rgb8();
    assert_eq!(image.dimensions(), (width, height));
}
