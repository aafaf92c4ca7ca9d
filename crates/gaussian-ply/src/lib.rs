//! 3D Gaussian Splatting point-cloud files.
//!
//! Writes the binary little-endian PLY layout understood by common splat
//! viewers:
//!
//! ```text
//! x y z | nx ny nz | f_dc_0..2 | f_rest_0..3(K-1)-1 | opacity | scale_0..2 | rot_0..3
//! ```
//!
//! Every property is a 32-bit float and records are packed with no padding.

pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

pub use error::{PlyError, PlyResult};
pub use header::PlyHeader;
pub use reader::PlyCloud;
pub use writer::{encode_to_vec, write_ply, write_ply_atomic};
