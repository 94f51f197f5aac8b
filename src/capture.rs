//! Frame capture.
//!
//! A capture session pairs the engine's presented frames with a
//! [`CaptureSink`] that encodes them somewhere: the bundled
//! [`FrameSequenceSink`] writes numbered image files, embeddings can
//! implement the trait for video encoders or network streams. The
//! [`CaptureCoordinator`] owns the session bookkeeping so the engine only
//! has to hand frames over; sink failures are logged and counted rather
//! than aborting the draw that is being recorded.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, error, info, warn};

use crate::error::{CaptureError, SinkError};

/// Encoding parameters handed to a sink when a session starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
    /// Playback rate the captured sequence is meant for.
    pub frames_per_second: f64,
    /// Encoder quality, 0-100. Lossless sinks ignore it.
    pub quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 60.0,
            quality: 90,
        }
    }
}

/// Receives the frames of one capture session.
///
/// Call order is `start`, any number of `capture`, `stop`, `save`. A sink
/// may be handed to a new session again after `save`.
pub trait CaptureSink {
    /// Prepare for an incoming session.
    fn start(&mut self, config: &CaptureConfig) -> Result<(), SinkError>;
    /// Encode one frame.
    fn capture(&mut self, frame: &RgbaImage) -> Result<(), SinkError>;
    /// No more frames will arrive.
    fn stop(&mut self);
    /// Flush whatever the sink produced.
    fn save(&mut self) -> Result<(), SinkError>;
}

struct Session {
    sink: Box<dyn CaptureSink>,
    animate_before: bool,
    frames: u64,
    skipped: u64,
    sink_errors: u64,
}

/// Tracks the active capture session, if any.
pub struct CaptureCoordinator {
    config: CaptureConfig,
    session: Option<Session>,
}

impl CaptureCoordinator {
    pub fn new() -> Self {
        Self::with_config(CaptureConfig::default())
    }

    pub fn with_config(config: CaptureConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// The config handed to sinks at session start.
    #[inline]
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Replace the config. Takes effect at the next session start.
    pub fn set_config(&mut self, config: CaptureConfig) {
        self.config = config;
    }

    /// Whether a session is running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Frames the active session's sink accepted so far. Zero when idle.
    pub fn frames_captured(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frames)
    }

    /// Ticks that produced no frame while the session was running.
    pub fn frames_skipped(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.skipped)
    }

    /// Frames the active session's sink rejected.
    pub fn sink_errors(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.sink_errors)
    }

    /// Begin a session on `sink`.
    ///
    /// `animate_before` is stashed and handed back by [`finish`](Self::finish)
    /// so the caller can restore whatever animation mode the capture
    /// interrupted. A sink that fails to start leaves the coordinator idle.
    pub fn start(
        &mut self,
        mut sink: Box<dyn CaptureSink>,
        animate_before: bool,
    ) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyActive);
        }
        sink.start(&self.config)?;
        self.session = Some(Session {
            sink,
            animate_before,
            frames: 0,
            skipped: 0,
            sink_errors: 0,
        });
        info!(
            "capture started at {} fps, quality {}",
            self.config.frames_per_second, self.config.quality
        );
        Ok(())
    }

    /// Hand one frame to the active session. Idle coordinators ignore it.
    pub fn forward(&mut self, frame: &RgbaImage) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.sink.capture(frame) {
            Ok(()) => session.frames += 1,
            Err(err) => {
                session.sink_errors += 1;
                error!("capture sink rejected frame {}: {}", session.frames, err);
            }
        }
    }

    /// Record that a tick produced no frame to forward.
    pub fn note_skipped(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.skipped += 1;
        if session.skipped == 1 {
            warn!("pipeline produced no frame while capturing");
        }
    }

    /// End the active session: stop the sink, save its output, and return
    /// the stashed `animate_before` flag. Returns `None` when idle.
    pub fn finish(&mut self) -> Option<bool> {
        let mut session = self.session.take()?;
        session.sink.stop();
        match session.sink.save() {
            Ok(()) => info!(
                "capture finished: {} frames ({} skipped, {} rejected)",
                session.frames, session.skipped, session.sink_errors
            ),
            Err(err) => error!("capture sink failed to save: {}", err),
        }
        Some(session.animate_before)
    }
}

impl Default for CaptureCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk image format of a [`FrameSequenceSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Lossless, ignores the quality setting.
    Png,
    /// Lossy, encoded at the session's quality.
    Jpeg,
}

impl FrameFormat {
    fn extension(self) -> &'static str {
        match self {
            FrameFormat::Png => "png",
            FrameFormat::Jpeg => "jpg",
        }
    }
}

/// Writes each captured frame as a numbered image file.
///
/// Frames land as `<prefix>_00000.<ext>` under the sink's directory, which
/// is created on session start. Frames hit the disk as they arrive, so
/// `save` has nothing left to flush.
pub struct FrameSequenceSink {
    directory: PathBuf,
    prefix: String,
    format: FrameFormat,
    quality: u8,
    next_index: u64,
}

impl FrameSequenceSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: "frame".to_string(),
            format: FrameFormat::Png,
            quality: CaptureConfig::default().quality,
            next_index: 0,
        }
    }

    /// Replace the `frame` filename prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Encode frames as `format` instead of PNG.
    pub fn with_format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }

    /// How many frames have been written this session.
    #[inline]
    pub fn frames_written(&self) -> u64 {
        self.next_index
    }

    fn frame_path(&self) -> PathBuf {
        self.directory.join(format!(
            "{}_{:05}.{}",
            self.prefix,
            self.next_index,
            self.format.extension()
        ))
    }
}

impl CaptureSink for FrameSequenceSink {
    fn start(&mut self, config: &CaptureConfig) -> Result<(), SinkError> {
        fs::create_dir_all(&self.directory)?;
        self.quality = config.quality;
        self.next_index = 0;
        debug!("writing capture frames to {}", self.directory.display());
        Ok(())
    }

    fn capture(&mut self, frame: &RgbaImage) -> Result<(), SinkError> {
        let path = self.frame_path();
        match self.format {
            FrameFormat::Png => frame.save_with_format(&path, ImageFormat::Png)?,
            FrameFormat::Jpeg => {
                // The jpeg encoder takes no alpha channel.
                let rgb = DynamicImage::ImageRgba8(frame.clone()).into_rgb8();
                let writer = BufWriter::new(File::create(&path)?);
                let encoder = JpegEncoder::new_with_quality(writer, self.quality);
                rgb.write_with_encoder(encoder)?;
            }
        }
        self.next_index += 1;
        Ok(())
    }

    fn stop(&mut self) {}

    fn save(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
