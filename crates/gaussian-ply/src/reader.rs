//! Minimal reader for binary splat PLY files.
//!
//! Only the subset produced by this crate is accepted: a single `vertex`
//! element of `float` properties in `binary_little_endian 1.0`.

use crate::error::{PlyError, PlyResult};
use crate::header::PlyHeader;

const END_HEADER: &[u8] = b"end_header\n";

/// A decoded point cloud: header plus a flat row-major float table.
#[derive(Debug, Clone)]
pub struct PlyCloud {
    pub header: PlyHeader,
    pub values: Vec<f32>,
}

impl PlyCloud {
    /// Parse a complete file.
    pub fn parse(data: &[u8]) -> PlyResult<Self> {
        let header_end = find_subslice(data, END_HEADER)
            .ok_or_else(|| PlyError::InvalidHeader("missing end_header".to_string()))?
            + END_HEADER.len();

        let text = std::str::from_utf8(&data[..header_end])
            .map_err(|_| PlyError::InvalidHeader("header is not ASCII".to_string()))?;
        let header = parse_header(text)?;

        let body = &data[header_end..];
        let expected = header.vertex_count * header.record_size();
        if body.len() < expected {
            return Err(PlyError::Truncated {
                expected,
                actual: body.len(),
            });
        }

        let values = body[..expected]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self { header, values })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.header.vertex_count
    }

    pub fn is_empty(&self) -> bool {
        self.header.vertex_count == 0
    }

    /// All properties of record `i`.
    pub fn record(&self, i: usize) -> &[f32] {
        let width = self.header.floats_per_record();
        &self.values[i * width..(i + 1) * width]
    }

    /// Every value of a named property, one per record.
    pub fn column(&self, name: &str) -> Option<Vec<f32>> {
        let idx = self.header.property_index(name)?;
        let width = self.header.floats_per_record();
        Some(self.values.iter().skip(idx).step_by(width).copied().collect())
    }
}

fn parse_header(text: &str) -> PlyResult<PlyHeader> {
    let mut lines = text.lines();

    if lines.next() != Some("ply") {
        return Err(PlyError::InvalidHeader("missing ply magic".to_string()));
    }

    let mut vertex_count = None;
    let mut properties = Vec::new();
    let mut saw_format = false;

    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["format", "binary_little_endian", "1.0"] => saw_format = true,
            ["format", other, ..] => {
                return Err(PlyError::InvalidHeader(format!(
                    "unsupported format: {}",
                    other
                )))
            }
            ["element", "vertex", count] => {
                let count = count.parse::<usize>().map_err(|_| {
                    PlyError::InvalidHeader(format!("invalid vertex count: {}", count))
                })?;
                vertex_count = Some(count);
            }
            ["element", other, ..] => {
                return Err(PlyError::InvalidHeader(format!(
                    "unexpected element: {}",
                    other
                )))
            }
            ["property", "float", name] => properties.push(name.to_string()),
            ["property", ty, name] => {
                return Err(PlyError::InvalidHeader(format!(
                    "property {} has unsupported type {}",
                    name, ty
                )))
            }
            ["comment", ..] | ["obj_info", ..] => {}
            ["end_header"] => break,
            _ => {
                return Err(PlyError::InvalidHeader(format!(
                    "unrecognized line: {}",
                    line
                )))
            }
        }
    }

    if !saw_format {
        return Err(PlyError::InvalidHeader("missing format line".to_string()));
    }
    let vertex_count = vertex_count
        .ok_or_else(|| PlyError::InvalidHeader("missing vertex element".to_string()))?;

    Ok(PlyHeader {
        vertex_count,
        properties,
    })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
