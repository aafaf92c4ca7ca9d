//! Input decoding for the reconstruction pipeline.
//!
//! Turns request payloads into model-ready frames:
//! - base64 images are decoded directly into [`RasterFrame`]s
//! - base64 video is written to a scoped temp file, decoded through a
//!   [`VideoDecoder`], and sampled at a fixed rate by [`FrameSampler`]
//! - every frame, regardless of source, goes through [`ImageNormalizer`]

pub mod decode;
pub mod error;
pub mod frame;
pub mod normalize;
pub mod sampler;
pub mod video;

pub use decode::{decode_base64, decode_image, decode_base64_image};
pub use error::{FrameError, FrameResult};
pub use frame::{NormalizedFrame, PixelOrder, RasterFrame};
pub use normalize::ImageNormalizer;
pub use sampler::{frame_stride, FrameSampler};
pub use video::{DecodedFrame, FfmpegDecoder, VideoDecoder, VideoStream};
