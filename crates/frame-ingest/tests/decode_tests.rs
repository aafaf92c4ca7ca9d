//! Still-image decoding and normalization tests.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use frame_ingest::{decode_base64_image, FrameError, ImageNormalizer, RasterFrame};
use image::{ImageOutputFormat, Rgb, RgbImage};
use recon_common::PipelineConfig;

fn encode(img: &RgbImage, format: ImageOutputFormat) -> String {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    STANDARD.encode(buf.into_inner())
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 4 % 256) as u8, (y * 4 % 256) as u8, 128])
    })
}

#[test]
fn test_png_roundtrip_is_lossless() {
    let img = gradient(64, 64);
    let frame = decode_base64_image(&encode(&img, ImageOutputFormat::Png)).unwrap();
    assert_eq!((frame.width, frame.height), (64, 64));
    assert_eq!(frame.pixel(10, 20), [40, 80, 128]);
}

#[test]
fn test_jpeg_decodes() {
    let img = gradient(32, 16);
    let frame = decode_base64_image(&encode(&img, ImageOutputFormat::Jpeg(90))).unwrap();
    assert_eq!((frame.width, frame.height), (32, 16));
}

#[test]
fn test_non_image_bytes_rejected() {
    let payload = STANDARD.encode(b"this is plain text");
    assert!(matches!(
        decode_base64_image(&payload),
        Err(FrameError::ImageDecode(_))
    ));
}

#[test]
fn test_image_and_video_frames_normalize_identically() {
    let img = gradient(64, 64);
    let from_image = decode_base64_image(&encode(&img, ImageOutputFormat::Png)).unwrap();
    let from_video = RasterFrame::new(64, 64, img.into_raw()).unwrap();

    let normalizer = ImageNormalizer::new(&PipelineConfig::default());
    assert_eq!(
        normalizer.normalize(from_image).unwrap(),
        normalizer.normalize(from_video).unwrap()
    );
}
