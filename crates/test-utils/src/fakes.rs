//! In-process fakes for the model and the video decoder.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use frame_ingest::{
    DecodedFrame, FrameError, FrameResult, NormalizedFrame, PixelOrder, VideoDecoder, VideoStream,
};
use prediction::{PredictError, PredictionResult, Predictor, SplatHeadOutput, Tensor};

use crate::generators;

/// What a [`FakePredictor`] returns.
#[derive(Debug, Clone)]
pub enum FakeOutput {
    /// Key/value output.
    Mapping(BTreeMap<String, Tensor>),
    /// Attribute-style output.
    Splat(SplatHeadOutput),
    /// The model endpoint fails with this status.
    Fail { status: u16, body: String },
}

/// A deterministic stand-in for the reconstruction model.
///
/// Records every batch it receives so tests can inspect frame counts and sizes.
#[derive(Debug)]
pub struct FakePredictor {
    output: FakeOutput,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<[usize; 3]>>>,
}

impl FakePredictor {
    pub fn new(output: FakeOutput) -> Self {
        Self {
            output,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Returns `n` lattice points under `pts3d` and nothing else.
    pub fn with_points(n: usize) -> Self {
        Self::new(FakeOutput::Mapping(BTreeMap::from([(
            "pts3d".to_string(),
            Tensor::from_f32(&[n, 3], generators::lattice_positions(n)),
        )])))
    }

    /// Returns a mapping containing only `key`, which no alias table knows.
    pub fn with_unknown_key(key: &str) -> Self {
        Self::new(FakeOutput::Mapping(BTreeMap::from([(
            key.to_string(),
            Tensor::from_f32(&[2, 3], vec![0.0; 6]),
        )])))
    }

    /// Returns an attribute-style splat head with `n` points.
    pub fn with_splat_head(n: usize) -> Self {
        Self::new(FakeOutput::Splat(generators::splat_head(n)))
    }

    /// Fails every call with a server error.
    pub fn failing() -> Self {
        Self::new(FakeOutput::Fail {
            status: 503,
            body: "model unavailable".to_string(),
        })
    }

    /// Number of completed `predict` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Frame shapes of each batch received, in call order.
    pub fn batches(&self) -> Vec<Vec<[usize; 3]>> {
        self.batches.lock().expect("batch log poisoned").clone()
    }
}

#[async_trait]
impl Predictor for FakePredictor {
    fn name(&self) -> &str {
        "fake-model"
    }

    async fn predict(&self, frames: &[NormalizedFrame]) -> Result<PredictionResult, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .expect("batch log poisoned")
            .push(frames.iter().map(NormalizedFrame::shape).collect());

        if frames.is_empty() {
            return Err(PredictError::EmptyBatch);
        }

        match &self.output {
            FakeOutput::Mapping(map) => Ok(PredictionResult::from(map.clone())),
            FakeOutput::Splat(head) => Ok(head.clone().into()),
            FakeOutput::Fail { status, body } => Err(PredictError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// A decoder that ignores file contents and yields solid-color BGR frames.
///
/// Frame `i` has blue = `i % 256`, green = 64, red = 192.
#[derive(Debug, Clone)]
pub struct FakeVideoDecoder {
    pub width: u32,
    pub height: u32,
    pub fps: Option<f64>,
    pub frame_count: usize,
    /// Reject every file as an unreadable container.
    pub corrupt: bool,
}

impl FakeVideoDecoder {
    pub fn new(fps: Option<f64>, frame_count: usize) -> Self {
        Self {
            width: 32,
            height: 24,
            fps,
            frame_count,
            corrupt: false,
        }
    }

    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::new(Some(30.0), 0)
        }
    }
}

struct FakeVideoStream {
    decoder: FakeVideoDecoder,
    next: usize,
}

impl VideoStream for FakeVideoStream {
    fn fps(&self) -> Option<f64> {
        self.decoder.fps
    }

    fn next_frame(&mut self) -> FrameResult<Option<DecodedFrame>> {
        if self.next >= self.decoder.frame_count {
            return Ok(None);
        }
        let i = self.next;
        self.next += 1;

        let pixels = (self.decoder.width * self.decoder.height) as usize;
        let fps = self.decoder.fps.unwrap_or(30.0);
        Ok(Some(DecodedFrame {
            width: self.decoder.width,
            height: self.decoder.height,
            order: PixelOrder::Bgr,
            data: [(i % 256) as u8, 64, 192].repeat(pixels),
            timestamp: Duration::from_secs_f64(i as f64 / fps),
        }))
    }
}

impl VideoDecoder for FakeVideoDecoder {
    fn open(&self, path: &Path) -> FrameResult<Box<dyn VideoStream>> {
        if !path.exists() {
            return Err(FrameError::VideoOpen(format!(
                "{} does not exist",
                path.display()
            )));
        }
        if self.corrupt {
            return Err(FrameError::VideoOpen("moov atom not found".to_string()));
        }
        Ok(Box::new(FakeVideoStream {
            decoder: self.clone(),
            next: 0,
        }))
    }
}
