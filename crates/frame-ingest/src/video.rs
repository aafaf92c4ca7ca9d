//! Video decode capability.
//!
//! The pipeline only needs "bytes in, frames out", so decoding sits behind
//! the [`VideoDecoder`] trait. [`FfmpegDecoder`] implements it by driving the
//! `ffprobe` and `ffmpeg` executables.

use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FrameError, FrameResult};
use crate::frame::PixelOrder;

/// Bytes of ffmpeg diagnostics kept for the log; the rest is drained and dropped.
const STDERR_LIMIT: u64 = 8 * 1024;

/// One frame as produced by a decoder, before color conversion.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub order: PixelOrder,
    pub data: Vec<u8>,
    /// Presentation time from the start of the stream.
    pub timestamp: Duration,
}

/// An opened video, yielding frames in decode order.
pub trait VideoStream: Send {
    /// Source frame rate, if the container reports one.
    fn fps(&self) -> Option<f64>;

    /// Next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> FrameResult<Option<DecodedFrame>>;
}

/// Opens video files for frame-by-frame decoding.
pub trait VideoDecoder: Send + Sync {
    fn open(&self, path: &Path) -> FrameResult<Box<dyn VideoStream>>;
}

/// Decoder backed by the ffmpeg command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegDecoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn probe(&self, path: &Path) -> FrameResult<ProbeStream> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,avg_frame_rate,r_frame_rate:stream_tags=rotate:stream_side_data=rotation",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| FrameError::VideoOpen(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FrameError::VideoOpen(stderr.trim().to_string()));
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| FrameError::VideoOpen(format!("unreadable ffprobe output: {}", e)))?;

        probe
            .streams
            .into_iter()
            .next()
            .filter(|s| s.width > 0 && s.height > 0)
            .ok_or_else(|| FrameError::VideoOpen("no video stream found".to_string()))
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn open(&self, path: &Path) -> FrameResult<Box<dyn VideoStream>> {
        let stream = self.probe(path)?;
        let fps = stream
            .avg_frame_rate
            .as_deref()
            .and_then(parse_rate)
            .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate));
        let rotation = stream.rotation();
        // ffmpeg applies the display rotation, so quarter turns swap the output size
        let (width, height) = display_size(stream.width, stream.height, rotation);

        debug!(
            path = %path.display(),
            width,
            height,
            rotation = ?rotation,
            fps = ?fps,
            "Probed video stream"
        );

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "bgr24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FrameError::VideoOpen(format!("failed to run ffmpeg: {}", e)))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(FrameError::VideoOpen("ffmpeg pipes unavailable".to_string()));
        };

        Ok(Box::new(FfmpegStream {
            child,
            reader: BufReader::new(stdout),
            stderr: Some(drain_stderr(stderr)),
            finished: false,
            width,
            height,
            fps,
            index: 0,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

impl ProbeStream {
    /// Display rotation in degrees: the display matrix first, then the legacy `rotate` tag.
    fn rotation(&self) -> Option<f64> {
        self.side_data_list
            .iter()
            .find_map(|d| d.rotation)
            .or_else(|| self.tags.rotate.as_deref().and_then(|r| r.trim().parse().ok()))
    }
}

/// Size of decoded frames after ffmpeg's automatic rotation.
fn display_size(width: u32, height: u32, rotation: Option<f64>) -> (u32, u32) {
    let quarter_turns = rotation.map_or(0, |r| (r / 90.0).round() as i64);
    if quarter_turns.rem_euclid(2) == 1 {
        (height, width)
    } else {
        (width, height)
    }
}

/// Collect the head of ffmpeg's stderr on a side thread so the pipe never fills.
fn drain_stderr(mut stderr: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut head = Vec::new();
        let _ = (&mut stderr).take(STDERR_LIMIT).read_to_end(&mut head);
        let _ = std::io::copy(&mut stderr, &mut std::io::sink());
        String::from_utf8_lossy(&head).trim().to_string()
    })
}

/// Parse an ffprobe rational such as `30000/1001`. Zero or malformed rates yield `None`.
pub fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

struct FfmpegStream {
    child: Child,
    reader: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    finished: bool,
    width: u32,
    height: u32,
    fps: Option<f64>,
    index: u64,
}

impl VideoStream for FfmpegStream {
    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn next_frame(&mut self) -> FrameResult<Option<DecodedFrame>> {
        if self.finished {
            return Ok(None);
        }

        let size = self.width as usize * self.height as usize * 3;
        let mut data = vec![0u8; size];

        match self.reader.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.finish();
                return Ok(None);
            }
            Err(e) => return Err(FrameError::VideoDecode(e.to_string())),
        }

        let timestamp = match self.fps {
            Some(fps) => Duration::from_secs_f64(self.index as f64 / fps),
            None => Duration::ZERO,
        };
        self.index += 1;

        Ok(Some(DecodedFrame {
            width: self.width,
            height: self.height,
            order: PixelOrder::Bgr,
            data,
            timestamp,
        }))
    }
}

impl FfmpegStream {
    /// Reap ffmpeg at end of output. A failed exit keeps the frames already
    /// read; the stream is still usable up to the point it broke.
    fn finish(&mut self) {
        self.finished = true;
        let status = self.child.wait();
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        match status {
            Ok(status) if status.success() => {
                debug!(frames = self.index, "ffmpeg finished");
            }
            Ok(status) => warn!(
                status = %status,
                frames = self.index,
                stderr = %stderr,
                "ffmpeg exited with an error, keeping frames decoded so far"
            ),
            Err(e) => warn!(error = %e, "Failed to wait for ffmpeg"),
        }
    }
}

impl Drop for FfmpegStream {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // The sampler may stop before EOF; don't leave ffmpeg blocked on a full pipe
        if let Err(e) = self.child.kill() {
            if e.kind() != ErrorKind::InvalidInput {
                warn!(error = %e, "Failed to stop ffmpeg");
            }
        }
        let _ = self.child.wait();
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30/1"), Some(30.0));
        assert_eq!(parse_rate("25"), Some(25.0));
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("0/1"), None);
        assert_eq!(parse_rate("abc"), None);
    }

    #[test]
    fn test_display_size_swaps_on_quarter_turns() {
        assert_eq!(display_size(1920, 1080, None), (1920, 1080));
        assert_eq!(display_size(1920, 1080, Some(0.0)), (1920, 1080));
        assert_eq!(display_size(1920, 1080, Some(90.0)), (1080, 1920));
        assert_eq!(display_size(1920, 1080, Some(-90.0)), (1080, 1920));
        assert_eq!(display_size(1920, 1080, Some(270.0)), (1080, 1920));
        assert_eq!(display_size(1920, 1080, Some(180.0)), (1920, 1080));
        assert_eq!(display_size(1920, 1080, Some(-180.0)), (1920, 1080));
    }

    #[test]
    fn test_rotation_from_ffprobe_json() {
        let probe: ProbeOutput = serde_json::from_str(
            r#"{"streams":[{"width":1920,"height":1080,"avg_frame_rate":"30/1",
                "side_data_list":[{"rotation":-90}]}]}"#,
        )
        .unwrap();
        assert_eq!(probe.streams[0].rotation(), Some(-90.0));

        let probe: ProbeOutput = serde_json::from_str(
            r#"{"streams":[{"width":1920,"height":1080,"tags":{"rotate":"90"}}]}"#,
        )
        .unwrap();
        assert_eq!(probe.streams[0].rotation(), Some(90.0));

        let probe: ProbeOutput =
            serde_json::from_str(r#"{"streams":[{"width":640,"height":480}]}"#).unwrap();
        assert_eq!(probe.streams[0].rotation(), None);
    }

    #[test]
    fn test_missing_binary_is_open_error() {
        let decoder = FfmpegDecoder::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        let err = decoder.open(Path::new("/tmp/missing.mp4")).err().unwrap();
        assert!(matches!(err, FrameError::VideoOpen(_)));
    }
}
