//! Binary splat PLY encoding.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use recon_common::GaussianSet;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{PlyError, PlyResult};
use crate::header::PlyHeader;

/// Minimum points to benefit from parallel record packing
const PARALLEL_THRESHOLD: usize = 16_384;

/// Pack one point into `out` in header order.
fn pack_record(set: &GaussianSet, i: usize, rest_count: usize, out: &mut [u8]) {
    let coeffs = set.colors.channel_row(i);
    let k = rest_count / 3 + 1;
    let mut offset = 0;
    let mut put = |value: f32| {
        out[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        offset += 4;
    };

    for v in set.positions[i] {
        put(v);
    }
    for _ in 0..3 {
        put(0.0);
    }
    for channel in 0..3 {
        put(coeffs[channel * k]);
    }
    // Channel-major: all higher orders of R, then G, then B
    for channel in 0..3 {
        for order in 1..k {
            put(coeffs[channel * k + order]);
        }
    }
    put(set.opacity[i]);
    for v in set.scales[i] {
        put(v);
    }
    for v in set.rotations[i] {
        put(v);
    }
}

/// Pack every record into a contiguous little-endian body.
fn encode_body(set: &GaussianSet, header: &PlyHeader) -> Vec<u8> {
    let record_size = header.record_size();
    let rest_count = set.colors.layout().rest_count();
    let mut body = vec![0u8; record_size * set.len()];

    if set.len() >= PARALLEL_THRESHOLD {
        body.par_chunks_mut(record_size)
            .enumerate()
            .for_each(|(i, record)| pack_record(set, i, rest_count, record));
    } else {
        for (i, record) in body.chunks_mut(record_size).enumerate() {
            pack_record(set, i, rest_count, record);
        }
    }
    body
}

/// Validate `set` and write the full file (header + body) to `writer`.
///
/// Returns the number of bytes written.
pub fn write_ply<W: Write>(set: &GaussianSet, writer: &mut W) -> PlyResult<usize> {
    set.validate()?;

    let header = PlyHeader::for_layout(set.len(), set.colors.layout());
    let text = header.to_ascii();
    let body = encode_body(set, &header);

    writer.write_all(text.as_bytes())?;
    writer.write_all(&body)?;
    writer.flush()?;

    Ok(text.len() + body.len())
}

/// Encode `set` into an in-memory buffer.
pub fn encode_to_vec(set: &GaussianSet) -> PlyResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_ply(set, &mut buf)?;
    Ok(buf)
}

/// Write `set` to `path` without ever exposing a partial file.
///
/// The file is written to a temporary sibling and renamed into place only
/// after every record has been flushed. On error the temporary is removed.
pub fn write_ply_atomic(set: &GaussianSet, path: &Path) -> PlyResult<u64> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    let written = {
        let mut writer = BufWriter::new(tmp.as_file());
        write_ply(set, &mut writer)?
    };
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PlyError::Io(e.error))?;

    debug!(path = %path.display(), bytes = written, points = set.len(), "Published PLY");
    Ok(written as u64)
}
