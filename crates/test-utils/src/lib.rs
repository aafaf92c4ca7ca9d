//! Shared test utilities for the reconstruction workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Encoded image payloads and request bodies
//! - Synthetic model outputs for any point count
//! - In-process fakes for the model and the video decoder
//! - Skip macros for tests that need external tools
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, FakePredictor};
//! ```

pub mod fakes;
pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fakes::*;
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if an executable is not installed.
///
/// Tests that drive the real ffmpeg decoder use this so that environments
/// without ffmpeg still pass.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_executable;
///
/// #[test]
/// fn test_real_video() {
///     let ffmpeg = require_executable!("ffmpeg");
///     // Test code using ffmpeg...
/// }
/// ```
#[macro_export]
macro_rules! require_executable {
    ($name:expr) => {{
        match $crate::find_executable($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: '{}' not found on PATH.", $name);
                return;
            }
        }
    }};
}
