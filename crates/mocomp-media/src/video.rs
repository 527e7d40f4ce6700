//! Video file source and sink, both backed by an FFmpeg subprocess.

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use mocomp_core::{CodecError, Frame, FrameDims, FrameSequence, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

// ── Source ──────────────────────────────────────────────────────

/// Decode every frame of a video file to 8-bit RGB.
///
/// The whole file is held in memory.
pub fn read_video(path: impl AsRef<Path>) -> Result<FrameSequence> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CodecError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("video file not found: {}", path.display()),
        )));
    }
    info!(path = %path.display(), "Reading video");

    let mut child = FfmpegCommand::new()
        .input(path)
        .rawvideo()
        .spawn()?;
    let events = child
        .iter()
        .map_err(|e| CodecError::Media(e.to_string()))?;

    let mut frames = Vec::new();
    let mut last_error = None;
    for event in events {
        match event {
            FfmpegEvent::OutputFrame(raw) => {
                match frame_from_raw(raw.frame_num, raw.width, raw.height, raw.data) {
                    Ok(frame) => frames.push(frame),
                    Err(e) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(e);
                    }
                }
            }
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, message)
            | FfmpegEvent::Error(message) => {
                warn!(error = %message, "ffmpeg reported an error");
                last_error = Some(message);
            }
            _ => {}
        }
    }
    let status = child.wait()?;

    let sequence = finish_decode(path, frames, status.success(), last_error)?;
    info!(frames = sequence.len(), dims = %sequence.dims(), "Video decoded");
    Ok(sequence)
}

/// Interleaved frame from one raw-video output packet.
fn frame_from_raw(frame_num: u32, width: u32, height: u32, data: Vec<u8>) -> Result<Frame> {
    let pixels = width as usize * height as usize;
    if pixels == 0 || data.len() % pixels != 0 {
        return Err(CodecError::Media(format!(
            "frame {frame_num} has {} bytes for {width}x{height} pixels",
            data.len()
        )));
    }
    let channels = u8::try_from(data.len() / pixels).map_err(|_| {
        CodecError::Media(format!("frame {frame_num} has too many samples per pixel"))
    })?;
    Frame::from_raw(FrameDims::new(width, height, channels), data)
}

/// Turn the decoded frames and ffmpeg's exit into the final result.
///
/// A failed exit with a reported error rejects the whole decode, even when
/// some frames arrived before it.
fn finish_decode(
    path: &Path,
    frames: Vec<Frame>,
    success: bool,
    last_error: Option<String>,
) -> Result<FrameSequence> {
    if !success {
        if let Some(message) = &last_error {
            return Err(CodecError::Media(format!(
                "decoding {} failed after {} frames: {message}",
                path.display(),
                frames.len()
            )));
        }
    }
    if frames.is_empty() {
        return Err(CodecError::Media(match last_error {
            Some(message) => format!("no frames decoded from {}: {message}", path.display()),
            None => format!("no frames decoded from {}", path.display()),
        }));
    }
    FrameSequence::new(frames)
}

// ── Sink ────────────────────────────────────────────────────────

/// Output video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// MPEG-4 Part 2 tagged as XVID.
    Mpeg4,
    H264,
    /// Lossless FFV1.
    Ffv1,
}

impl VideoCodec {
    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::Mpeg4 => "mpeg4",
            Self::H264 => "libx264",
            Self::Ffv1 => "ffv1",
        }
    }

    /// Pick a codec from the output file extension, XVID if unknown.
    pub fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("mp4") => Self::H264,
            Some("mkv") => Self::Ffv1,
            _ => Self::Mpeg4,
        }
    }
}

/// FFmpeg raw input pixel format for a channel count.
fn raw_pixel_format(channels: u8) -> Result<&'static str> {
    match channels {
        1 => Ok("gray"),
        2 => Ok("ya8"),
        3 => Ok("rgb24"),
        4 => Ok("rgba"),
        n => Err(CodecError::InvalidParameter(format!(
            "cannot write {n}-channel frames to video"
        ))),
    }
}

/// Writes frames to a video file by piping raw samples into FFmpeg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSink {
    pub output_path: PathBuf,
    pub fps: u32,
    pub codec: VideoCodec,
}

impl VideoSink {
    pub const DEFAULT_FPS: u32 = 24;

    /// Sink with the default frame rate and a codec chosen from the extension.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        let output_path = output_path.into();
        let codec = VideoCodec::for_path(&output_path);
        Self {
            output_path,
            fps: Self::DEFAULT_FPS,
            codec,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Build the FFmpeg command arguments for frames of `dims`.
    pub fn ffmpeg_args(&self, dims: FrameDims) -> Result<Vec<String>> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            raw_pixel_format(dims.channels)?.into(),
            "-video_size".into(),
            format!("{}x{}", dims.width, dims.height),
            "-framerate".into(),
            self.fps.to_string(),
            "-i".into(),
            "pipe:0".into(),
            "-c:v".into(),
            self.codec.ffmpeg_encoder().into(),
        ];

        match self.codec {
            VideoCodec::Mpeg4 => {
                args.extend(["-vtag", "xvid", "-q:v", "2", "-pix_fmt", "yuv420p"].map(String::from))
            }
            VideoCodec::H264 => {
                args.extend(["-crf", "18", "-pix_fmt", "yuv420p"].map(String::from))
            }
            VideoCodec::Ffv1 => {}
        }

        args.push(self.output_path.to_string_lossy().into_owned());
        Ok(args)
    }

    /// Encode `frames` in order. `on_frame` receives the count written so far.
    pub fn write(&self, frames: &[Frame], mut on_frame: impl FnMut(usize)) -> Result<()> {
        let first = frames.first().ok_or(CodecError::EmptySequence)?;
        let dims = first.dims();
        if self.fps == 0 {
            return Err(CodecError::InvalidParameter(
                "frame rate must be at least 1".into(),
            ));
        }
        let args = self.ffmpeg_args(dims)?;
        info!(
            path = %self.output_path.display(),
            frames = frames.len(),
            codec = self.codec.ffmpeg_encoder(),
            fps = self.fps,
            "Writing video"
        );

        let mut child = Command::new(ffmpeg_sidecar::paths::ffmpeg_path())
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CodecError::Encoder(format!("Failed to spawn ffmpeg: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CodecError::Encoder("Failed to open ffmpeg stdin".into()))?;

        for (index, frame) in frames.iter().enumerate() {
            let piped = if frame.dims() != dims {
                Err(CodecError::DimensionMismatch {
                    index,
                    expected: dims,
                    found: frame.dims(),
                })
            } else {
                stdin.write_all(frame.data()).map_err(|e| {
                    CodecError::Encoder(format!("Failed to write frame {index}: {e}"))
                })
            };
            if let Err(e) = piped {
                drop(stdin);
                abandon(&mut child);
                return Err(e);
            }
            debug!(index, "Frame piped to ffmpeg");
            on_frame(index + 1);
        }

        // Close stdin to signal end-of-stream
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| CodecError::Encoder(format!("Failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(CodecError::Encoder(format!(
                "ffmpeg exited with status: {status}"
            )));
        }
        Ok(())
    }
}

/// Kill an encoder that will not receive the rest of its input and reap it.
fn abandon(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "ffmpeg already exited");
    }
    if let Err(e) = child.wait() {
        warn!(error = %e, "Failed to reap ffmpeg");
    }
}
