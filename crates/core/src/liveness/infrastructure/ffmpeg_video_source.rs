use std::path::Path;
use std::time::Instant;

use crate::liveness::domain::video_source::VideoSource;
use crate::shared::frame::Frame;
use crate::shared::BoxError;

/// Plays a video file as if it were a live camera.
///
/// Each `current_frame` call returns the frame that would be on screen at
/// the wall-clock time elapsed since the first capture, so the pauses
/// between liveness captures skip ahead through the recording the same way
/// they would on a webcam.
pub struct FfmpegVideoSource {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    fps: f64,
    started: Option<Instant>,
    decoded: usize,
    last: Option<Frame>,
    eof: bool,
}

// Safety: FfmpegVideoSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegVideoSource {}

impl FfmpegVideoSource {
    pub fn open(path: &Path) -> Result<Self, BoxError> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGBA,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Opened {} as video source ({width}x{height} @ {fps:.1} fps)",
            path.display()
        );

        Ok(Self {
            ictx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            fps,
            started: None,
            decoded: 0,
            last: None,
            eof: false,
        })
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, BoxError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgba = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgba)?;
        let pixels = extract_rgba_pixels(&rgba, self.width, self.height);
        let frame = Frame::rgba(pixels, self.width, self.height, self.decoded);
        self.decoded += 1;
        Ok(Some(frame))
    }

    /// Decodes the next frame in stream order, or `None` at end of stream.
    fn decode_next(&mut self) -> Result<Option<Frame>, BoxError> {
        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }
        if self.eof {
            return Ok(None);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.eof = true;
                return self.try_receive();
            };
            if stream.index() != self.video_stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }
}

impl VideoSource for FfmpegVideoSource {
    fn current_frame(&mut self) -> Result<Frame, BoxError> {
        let started = *self.started.get_or_insert_with(Instant::now);
        let target = if self.fps > 0.0 {
            (started.elapsed().as_secs_f64() * self.fps) as usize
        } else {
            self.decoded
        };

        while self.last.as_ref().map_or(true, |f| f.index() < target) {
            match self.decode_next()? {
                Some(frame) => self.last = Some(frame),
                None => break,
            }
        }

        self.last.clone().ok_or_else(|| "Video source produced no frames".into())
    }
}

fn extract_rgba_pixels(
    rgba_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgba_frame.stride(0);
    let data = rgba_frame.data(0);
    let row_bytes = width as usize * 4;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
