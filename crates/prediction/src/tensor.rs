//! Dense numeric arrays as returned by the model.

use serde_json::Value;

use crate::error::TensorError;

/// Element storage. Model outputs arrive in mixed precisions; everything is
/// cast to f32 once it reaches the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I64(Vec<i64>),
}

impl TensorData {
    fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::F64(v) => v.len(),
            TensorData::I64(v) => v.len(),
        }
    }
}

/// A row-major n-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: TensorData,
}

impl Tensor {
    /// Create a tensor, checking the element count against `shape`.
    pub fn new(shape: Vec<usize>, data: TensorData) -> Result<Self, TensorError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(TensorError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Build an f32 tensor. Panics if `data` does not fill `shape`.
    pub fn from_f32(shape: &[usize], data: Vec<f32>) -> Self {
        match Self::new(shape.to_vec(), TensorData::F32(data)) {
            Ok(t) => t,
            Err(e) => panic!("invalid tensor literal: {}", e),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total element count.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Flattened copy cast to f32.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match &self.data {
            TensorData::F32(v) => v.clone(),
            TensorData::F64(v) => v.iter().map(|&x| x as f32).collect(),
            TensorData::I64(v) => v.iter().map(|&x| x as f32).collect(),
        }
    }

    /// Parse a JSON value.
    ///
    /// Accepts a bare number, a (possibly nested) rectangular array of
    /// numbers, or an object `{"shape": [...], "data": [...]}` with flat data.
    pub fn from_json(value: &Value) -> Result<Self, TensorError> {
        match value {
            Value::Object(map) if map.contains_key("data") => {
                let mut values = Vec::new();
                let mut inferred = Vec::new();
                collect_nested(&map["data"], 0, &mut inferred, &mut values)?;
                let shape = match map.get("shape") {
                    Some(Value::Array(dims)) => dims
                        .iter()
                        .map(|d| {
                            d.as_u64()
                                .map(|d| d as usize)
                                .ok_or_else(|| TensorError::NonNumeric(d.to_string()))
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    Some(other) => return Err(TensorError::NonNumeric(other.to_string())),
                    None => inferred,
                };
                Self::new(shape, TensorData::F64(values))
            }
            Value::Number(_) | Value::Array(_) => {
                let mut values = Vec::new();
                let mut shape = Vec::new();
                collect_nested(value, 0, &mut shape, &mut values)?;
                Self::new(shape, TensorData::F64(values))
            }
            other => Err(TensorError::NonNumeric(truncate(other.to_string()))),
        }
    }
}

/// Depth-first flatten, recording the extent of each level on first visit
/// and rejecting ragged siblings.
fn collect_nested(
    value: &Value,
    depth: usize,
    shape: &mut Vec<usize>,
    out: &mut Vec<f64>,
) -> Result<(), TensorError> {
    match value {
        Value::Number(n) => {
            if depth != shape.len() {
                return Err(TensorError::Ragged {
                    depth,
                    expected: shape.get(depth).copied().unwrap_or(0),
                    actual: 0,
                });
            }
            let x = n
                .as_f64()
                .ok_or_else(|| TensorError::NonNumeric(n.to_string()))?;
            out.push(x);
            Ok(())
        }
        Value::Array(items) => {
            if depth == shape.len() {
                if !out.is_empty() {
                    // A scalar sibling was already seen at this depth
                    return Err(TensorError::Ragged {
                        depth,
                        expected: 0,
                        actual: items.len(),
                    });
                }
                shape.push(items.len());
            } else if shape[depth] != items.len() {
                return Err(TensorError::Ragged {
                    depth,
                    expected: shape[depth],
                    actual: items.len(),
                });
            }
            for item in items {
                collect_nested(item, depth + 1, shape, out)?;
            }
            Ok(())
        }
        other => Err(TensorError::NonNumeric(truncate(other.to_string()))),
    }
}

fn truncate(mut s: String) -> String {
    if s.len() > 64 {
        let mut cut = 64;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}
