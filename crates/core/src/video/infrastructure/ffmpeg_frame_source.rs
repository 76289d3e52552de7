use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameResult, FrameSource};

/// Decodes video via ffmpeg-next and hands out RGB24 frames.
///
/// Anything libavformat can open works: files, streams, capture devices.
pub struct FfmpegFrameSource {
    stream: Option<OpenStream>,
}

struct OpenStream {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

// Safety: the source is driven by one thread at a time and ffmpeg's raw
// pointers never escape it.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = stream.frames().max(0) as usize;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        log::info!(
            "Opened {} ({width}x{height}, {fps:.2} fps, {total_frames} frames)",
            path.display()
        );

        self.stream = Some(OpenStream {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        });

        Ok(VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = FrameResult> + '_> {
        match self.stream.as_mut() {
            Some(stream) => Box::new(FfmpegFrameIter {
                stream,
                frame_index: 0,
                flushing: false,
                done: false,
            }),
            None => Box::new(std::iter::once(Err("FfmpegFrameSource: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

/// Decodes lazily, one frame per `next`.
struct FfmpegFrameIter<'a> {
    stream: &'a mut OpenStream,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn try_receive(&mut self) -> Option<FrameResult> {
        let mut decoded = VideoFrame::empty();
        self.stream.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = VideoFrame::empty();
        if let Err(e) = self.stream.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }
        let (w, h) = (self.stream.width, self.stream.height);
        let frame = Frame::new(packed_rgb(&rgb, w, h), w, h, 3, self.frame_index);
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = FrameResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(result) = self.try_receive() {
            return Some(result);
        }
        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.stream.input.packets().next() else {
                let _ = self.stream.decoder.send_eof();
                self.flushing = true;
                let last = self.try_receive();
                self.done = last.is_none();
                return last;
            };
            if stream.index() != self.stream.stream_index {
                continue;
            }
            if let Err(e) = self.stream.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
                continue;
            }
            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies an RGB24 plane into a tightly packed buffer, dropping row padding.
fn packed_rgb(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes `num_frames` flat gray MPEG-4 frames.
    fn write_test_video(path: &Path, num_frames: usize, width: u32, height: u32) {
        const FPS: i32 = 25;
        ffmpeg_next::init().unwrap();
        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();
        let mut ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        ctx.set_width(width);
        ctx.set_height(height);
        ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        ctx.set_time_base(ffmpeg_next::Rational(1, FPS));
        ctx.set_frame_rate(Some(ffmpeg_next::Rational(FPS, 1)));
        if global_header {
            ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let mut encoder = ctx.open_with(ffmpeg_next::Dictionary::new()).unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let time_base = octx.stream(0).unwrap().time_base();

        let drain = |encoder: &mut ffmpeg_next::encoder::video::Encoder,
                     octx: &mut ffmpeg_next::format::context::Output| {
            let mut packet = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut packet).is_ok() {
                packet.set_stream(0);
                packet.rescale_ts(ffmpeg_next::Rational(1, FPS), time_base);
                packet.write_interleaved(octx).unwrap();
            }
        };

        for i in 0..num_frames {
            let mut yuv = VideoFrame::new(ffmpeg_next::format::Pixel::YUV420P, width, height);
            let luma = (40 + i * 30) as u8;
            yuv.data_mut(0).fill(luma);
            yuv.data_mut(1).fill(128);
            yuv.data_mut(2).fill(128);
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();
            drain(&mut encoder, &mut octx);
        }
        encoder.send_eof().unwrap();
        drain(&mut encoder, &mut octx);
        octx.write_trailer().unwrap();
    }

    #[test]
    fn test_open_reports_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cam.mp4");
        write_test_video(&path, 4, 160, 120);

        let mut source = FfmpegFrameSource::new();
        let meta = source.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));
        assert!(meta.fps > 0.0);
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_frames_are_rgb_and_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cam.mp4");
        write_test_video(&path, 4, 160, 120);

        let mut source = FfmpegFrameSource::new();
        source.open(&path).unwrap();
        let frames: Vec<Frame> = source.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 4);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
        source.close();
    }

    #[test]
    fn test_open_missing_file_fails() {
        let mut source = FfmpegFrameSource::new();
        assert!(source.open(Path::new("/nonexistent/cam.mp4")).is_err());
    }

    #[test]
    fn test_frames_before_open_fail() {
        let mut source = FfmpegFrameSource::new();
        let mut frames = source.frames();
        assert!(frames.next().unwrap().is_err());
        assert!(frames.next().is_none());
    }
}
