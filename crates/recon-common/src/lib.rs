//! Common types and utilities shared across the scene reconstruction crates.

pub mod bounds;
pub mod config;
pub mod error;
pub mod gaussian;

pub use bounds::PointBounds;
pub use config::PipelineConfig;
pub use error::{ReconError, ReconResult};
pub use gaussian::{
    sh_dc_to_rgb, ColorCoeffs, ColorLayout, GaussianSet, ShapeError, DEFAULT_LOG_SCALE,
    DEFAULT_OPACITY, IDENTITY_ROTATION, SH_C0,
};
