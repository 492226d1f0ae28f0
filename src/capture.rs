//! The capture loop.
//!
//! [`capture`] reads packets until the source is exhausted, feeds packets of
//! the selected stream to the decoder, drains every frame the decoder
//! produces, converts each one into the shared [`RgbFrame`] and hands it to
//! a [`FrameSink`]. After the last packet the decoder is flushed so frames
//! held back for reordering are written too.
//!
//! Frame numbers come from a counter owned by the loop: the first decoded
//! frame is 1 and each later frame gets the next integer.

use ffmpeg_next::frame::Video as VideoFrame;

use crate::{
    config::ExtractOptions,
    conversion::FrameConverter,
    decoder::{DecodeOutcome, FrameDecoder},
    error::FrameDumpError,
    frame::RgbFrame,
    progress::ProgressTracker,
    source::PacketSource,
    writer::FrameSink,
};

/// Counters describing a finished capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Packets read from the container, all streams included.
    pub packets_read: u64,
    /// Packets discarded because they belong to another stream.
    pub packets_skipped: u64,
    /// Frames produced by the decoder.
    pub frames_decoded: u64,
    /// Frames successfully written.
    pub frames_written: u64,
    /// Frames whose write failed.
    pub write_failures: u64,
}

/// Per-capture state shared by the read and flush phases.
struct FrameEmitter<'a, C, W> {
    converter: &'a mut C,
    sink: &'a mut W,
    target: &'a mut RgbFrame,
    decoded: VideoFrame,
    next_sequence: u64,
    consecutive_failures: u32,
    max_consecutive_failures: Option<u32>,
    tracker: ProgressTracker,
    summary: CaptureSummary,
}

impl<C: FrameConverter, W: FrameSink> FrameEmitter<'_, C, W> {
    /// Receive frames until the decoder wants more input or is finished.
    fn drain<D: FrameDecoder>(&mut self, decoder: &mut D) -> Result<DecodeOutcome, FrameDumpError> {
        loop {
            match decoder.receive(&mut self.decoded)? {
                DecodeOutcome::FrameProduced => self.emit()?,
                outcome => return Ok(outcome),
            }
        }
    }

    fn emit(&mut self) -> Result<(), FrameDumpError> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.summary.frames_decoded += 1;

        self.converter.convert(&self.decoded, self.target)?;

        match self.sink.write_frame(self.target, sequence) {
            Ok(_) => {
                self.consecutive_failures = 0;
                self.summary.frames_written += 1;
                self.tracker.advance(sequence);
            }
            Err(error) => {
                self.consecutive_failures += 1;
                self.summary.write_failures += 1;
                log::error!("Frame {sequence} was not saved: {error}");

                if self
                    .max_consecutive_failures
                    .is_some_and(|limit| self.consecutive_failures >= limit)
                {
                    log::error!(
                        "Giving up after {} consecutive write failures",
                        self.consecutive_failures
                    );
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}

/// Run the capture loop to completion.
///
/// `target` must already be allocated at the decoder's geometry.
/// `expected_frames` only feeds progress percentages.
///
/// # Errors
///
/// - [`FrameDumpError::Decode`] or [`FrameDumpError::Conversion`] abort the
///   loop immediately; frames already written stay on disk.
/// - [`FrameDumpError::FileWrite`] once the configured number of
///   consecutive write failures is reached.
/// - [`FrameDumpError::Cancelled`] if the options' token is cancelled.
pub fn capture<S, D, C, W>(
    source: &mut S,
    decoder: &mut D,
    converter: &mut C,
    sink: &mut W,
    target: &mut RgbFrame,
    options: &ExtractOptions,
    expected_frames: Option<u64>,
) -> Result<CaptureSummary, FrameDumpError>
where
    S: PacketSource,
    D: FrameDecoder,
    C: FrameConverter,
    W: FrameSink,
{
    let stream_index = decoder.stream_index();
    let mut emitter = FrameEmitter {
        converter,
        sink,
        target,
        decoded: VideoFrame::empty(),
        next_sequence: 1,
        consecutive_failures: 0,
        max_consecutive_failures: options.max_consecutive_write_failures,
        tracker: ProgressTracker::new(
            options.progress.clone(),
            expected_frames.filter(|&count| count > 0),
            options.batch_size,
        ),
        summary: CaptureSummary::default(),
    };

    log::debug!("Capturing frames from stream {stream_index}");

    let mut decoder_finished = false;
    loop {
        if options.is_cancelled() {
            log::debug!("Capture cancelled");
            return Err(FrameDumpError::Cancelled);
        }

        // The packet is released at the end of every iteration.
        let Some(packet) = source.next_packet()? else {
            break;
        };
        emitter.summary.packets_read += 1;

        if packet.stream() != stream_index {
            emitter.summary.packets_skipped += 1;
            continue;
        }

        decoder.submit(&packet)?;
        if emitter.drain(decoder)? == DecodeOutcome::EndOfStream {
            decoder_finished = true;
            break;
        }
    }

    if !decoder_finished {
        decoder.finish()?;
        emitter.drain(decoder)?;
    }

    emitter.tracker.finish();

    let summary = emitter.summary;
    log::info!(
        "Captured {} frames ({} written, {} failed) from {} packets",
        summary.frames_decoded,
        summary.frames_written,
        summary.write_failures,
        summary.packets_read,
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        collections::VecDeque,
        io::Error as IoError,
        path::PathBuf,
        rc::Rc,
    };

    use ffmpeg_next::Packet;

    use super::*;
    use crate::progress::CancellationToken;

    const VIDEO: usize = 0;
    const AUDIO: usize = 1;
    const CORRUPT: u8 = 0xFF;

    /// Counts live test doubles so tests can assert everything was released.
    #[derive(Clone, Default)]
    struct Live(Rc<Cell<i32>>);

    struct Held(Rc<Cell<i32>>);

    impl Live {
        fn hold(&self) -> Held {
            self.0.set(self.0.get() + 1);
            Held(self.0.clone())
        }

        fn count(&self) -> i32 {
            self.0.get()
        }
    }

    impl Drop for Held {
        fn drop(&mut self) {
            self.0.set(self.0.get() - 1);
        }
    }

    /// Packets are `(stream, frames the packet decodes to)`.
    struct ScriptedSource {
        packets: VecDeque<(usize, u8)>,
        _held: Held,
    }

    impl PacketSource for ScriptedSource {
        fn next_packet(&mut self) -> Result<Option<Packet>, FrameDumpError> {
            Ok(self.packets.pop_front().map(|(stream, frames)| {
                let mut packet = Packet::copy(&[frames]);
                packet.set_stream(stream);
                packet
            }))
        }
    }

    struct ScriptedDecoder {
        pending: u8,
        delayed: u8,
        flushed: bool,
        end_after_packets: Option<u32>,
        submitted: u32,
        _held: Held,
    }

    impl FrameDecoder for ScriptedDecoder {
        fn stream_index(&self) -> usize {
            VIDEO
        }

        fn submit(&mut self, packet: &Packet) -> Result<(), FrameDumpError> {
            let frames = packet.data().map(|data| data[0]).unwrap_or(0);
            if frames == CORRUPT {
                return Err(FrameDumpError::Decode("corrupt packet".to_string()));
            }
            self.submitted += 1;
            self.pending += frames;
            Ok(())
        }

        fn finish(&mut self) -> Result<(), FrameDumpError> {
            self.flushed = true;
            self.pending += self.delayed;
            self.delayed = 0;
            Ok(())
        }

        fn receive(&mut self, _frame: &mut VideoFrame) -> Result<DecodeOutcome, FrameDumpError> {
            if self.pending > 0 {
                self.pending -= 1;
                Ok(DecodeOutcome::FrameProduced)
            } else if self.flushed || self.end_after_packets == Some(self.submitted) {
                Ok(DecodeOutcome::EndOfStream)
            } else {
                Ok(DecodeOutcome::NoFrameYet)
            }
        }
    }

    struct CountingConverter {
        conversions: u32,
    }

    impl FrameConverter for CountingConverter {
        fn convert(
            &mut self,
            _frame: &VideoFrame,
            target: &mut RgbFrame,
        ) -> Result<(), FrameDumpError> {
            self.conversions += 1;
            let shade = self.conversions as u8;
            target.fill(shade, shade, shade);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        written: Vec<(u64, u8)>,
        fail_on: Vec<u64>,
        always_fail: bool,
    }

    impl FrameSink for RecordingSink {
        fn write_frame(&mut self, frame: &RgbFrame, sequence: u64) -> Result<PathBuf, FrameDumpError> {
            let path = PathBuf::from(format!("frame-{sequence}.ppm"));
            if self.always_fail || self.fail_on.contains(&sequence) {
                return Err(FrameDumpError::FileWrite {
                    path,
                    source: IoError::other("disk full"),
                });
            }
            self.written.push((sequence, frame.row(0)[0]));
            Ok(path)
        }
    }

    struct Harness {
        live: Live,
        source: ScriptedSource,
        decoder: ScriptedDecoder,
        converter: CountingConverter,
        sink: RecordingSink,
        target: RgbFrame,
    }

    impl Harness {
        fn new(packets: &[(usize, u8)], delayed: u8) -> Self {
            let live = Live::default();
            Self {
                source: ScriptedSource {
                    packets: packets.iter().copied().collect(),
                    _held: live.hold(),
                },
                decoder: ScriptedDecoder {
                    pending: 0,
                    delayed,
                    flushed: false,
                    end_after_packets: None,
                    submitted: 0,
                    _held: live.hold(),
                },
                converter: CountingConverter { conversions: 0 },
                sink: RecordingSink::default(),
                target: RgbFrame::allocate(4, 4).unwrap(),
                live,
            }
        }

        fn run(&mut self, options: &ExtractOptions) -> Result<CaptureSummary, FrameDumpError> {
            capture(
                &mut self.source,
                &mut self.decoder,
                &mut self.converter,
                &mut self.sink,
                &mut self.target,
                options,
                None,
            )
        }

        fn sequences(&self) -> Vec<u64> {
            self.sink.written.iter().map(|(sequence, _)| *sequence).collect()
        }
    }

    #[test]
    fn numbers_every_drained_frame_and_skips_other_streams() {
        let mut harness = Harness::new(&[(VIDEO, 1), (AUDIO, 1), (VIDEO, 0), (VIDEO, 2)], 1);
        let summary = harness.run(&ExtractOptions::new()).unwrap();

        assert_eq!(harness.sequences(), vec![1, 2, 3, 4]);
        assert_eq!(
            summary,
            CaptureSummary {
                packets_read: 4,
                packets_skipped: 1,
                frames_decoded: 4,
                frames_written: 4,
                write_failures: 0,
            }
        );
        // Each frame was converted before being written.
        let shades: Vec<u8> = harness.sink.written.iter().map(|(_, shade)| *shade).collect();
        assert_eq!(shades, vec![1, 2, 3, 4]);
    }

    #[test]
    fn non_video_only_input_writes_nothing() {
        let mut harness = Harness::new(&[(AUDIO, 3), (AUDIO, 3)], 0);
        let summary = harness.run(&ExtractOptions::new()).unwrap();
        assert_eq!(summary.frames_written, 0);
        assert_eq!(summary.packets_skipped, 2);
        assert!(harness.sink.written.is_empty());
    }

    #[test]
    fn end_of_stream_stops_reading() {
        let mut harness = Harness::new(&[(VIDEO, 1), (VIDEO, 1), (VIDEO, 1)], 0);
        harness.decoder.end_after_packets = Some(2);
        let summary = harness.run(&ExtractOptions::new()).unwrap();

        assert_eq!(summary.packets_read, 2);
        assert_eq!(harness.sequences(), vec![1, 2]);
        assert!(!harness.decoder.flushed);
    }

    #[test]
    fn decode_error_aborts_and_releases_everything() {
        let mut harness = Harness::new(&[(VIDEO, 1), (VIDEO, CORRUPT), (VIDEO, 1)], 0);
        let result = harness.run(&ExtractOptions::new());

        assert!(matches!(result, Err(FrameDumpError::Decode(_))));
        assert_eq!(harness.sequences(), vec![1]);
        assert_eq!(harness.source.packets.len(), 1);

        let live = harness.live.clone();
        assert_eq!(live.count(), 2);
        drop(harness);
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn write_failure_is_reported_and_loop_continues() {
        let mut harness = Harness::new(&[(VIDEO, 1), (VIDEO, 1), (VIDEO, 1)], 0);
        harness.sink.fail_on = vec![2];
        let summary = harness.run(&ExtractOptions::new()).unwrap();

        assert_eq!(harness.sequences(), vec![1, 3]);
        assert_eq!(summary.frames_decoded, 3);
        assert_eq!(summary.frames_written, 2);
        assert_eq!(summary.write_failures, 1);
    }

    #[test]
    fn consecutive_write_failures_escalate() {
        let mut harness = Harness::new(&[(VIDEO, 1), (VIDEO, 1), (VIDEO, 1), (VIDEO, 1)], 0);
        harness.sink.always_fail = true;
        let options = ExtractOptions::new().with_max_consecutive_write_failures(Some(2));

        let result = harness.run(&options);
        assert!(matches!(result, Err(FrameDumpError::FileWrite { .. })));
        assert_eq!(harness.source.packets.len(), 2);

        let live = harness.live.clone();
        drop(harness);
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn unlimited_write_failures_never_escalate() {
        let mut harness = Harness::new(&[(VIDEO, 1), (VIDEO, 1), (VIDEO, 1)], 0);
        harness.sink.always_fail = true;
        let options = ExtractOptions::new().with_max_consecutive_write_failures(None);

        let summary = harness.run(&options).unwrap();
        assert_eq!(summary.write_failures, 3);
        assert_eq!(summary.frames_written, 0);
    }

    #[test]
    fn cancelled_token_stops_before_reading() {
        let mut harness = Harness::new(&[(VIDEO, 1)], 0);
        let token = CancellationToken::new();
        token.cancel();

        let result = harness.run(&ExtractOptions::new().with_cancellation(token));
        assert!(matches!(result, Err(FrameDumpError::Cancelled)));
        assert_eq!(harness.source.packets.len(), 1);
        assert!(harness.sink.written.is_empty());
    }
}
