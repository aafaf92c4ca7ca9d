//! Opaque model output and field access.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::error::TensorError;
use crate::tensor::Tensor;

/// Attribute-style access for structured model outputs.
pub trait AttributeBag: Send + Sync + fmt::Debug {
    /// The attribute called `name`, if this output exposes it.
    fn attribute(&self, name: &str) -> Option<&Tensor>;
}

/// Result of a model call. Read-only once produced.
#[derive(Debug)]
pub enum PredictionResult {
    /// Key/value output (e.g. a JSON object or a tensor dictionary).
    ///
    /// Entries that could not be read as tensors keep their key so they still
    /// take part in alias resolution.
    Mapping(BTreeMap<String, Result<Tensor, TensorError>>),
    /// Structured output exposing named attributes.
    Attributes(Box<dyn AttributeBag>),
}

impl PredictionResult {
    /// Look up one key: membership check for mappings, attribute presence otherwise.
    ///
    /// A present key whose value is not a numeric tensor yields `Some(Err(_))`.
    pub fn get(&self, key: &str) -> Option<Result<&Tensor, &TensorError>> {
        match self {
            PredictionResult::Mapping(map) => map.get(key).map(Result::as_ref),
            PredictionResult::Attributes(bag) => bag.attribute(key).map(Ok),
        }
    }

    /// First alias present, in list order, with the value it names.
    ///
    /// Presence alone decides the winner; a malformed value under an earlier
    /// alias is returned rather than skipped.
    pub fn resolve<'a, S: AsRef<str>>(
        &'a self,
        aliases: &'a [S],
    ) -> Option<(&'a str, Result<&'a Tensor, &'a TensorError>)> {
        aliases
            .iter()
            .map(AsRef::as_ref)
            .find_map(|alias| self.get(alias).map(|entry| (alias, entry)))
    }

    /// Build a mapping result from a JSON object.
    ///
    /// Every key is kept. Values that are not numeric arrays (metadata
    /// strings, arrays holding nulls) are stored as errors and only fail the
    /// request if an alias lookup selects them.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(object) = value else {
            return None;
        };

        let map = object
            .into_iter()
            .map(|(key, value)| {
                let entry = Tensor::from_json(&value);
                if let Err(e) = &entry {
                    debug!(key = %key, error = %e, "Output entry is not a tensor");
                }
                (key, entry)
            })
            .collect();
        Some(PredictionResult::Mapping(map))
    }

    /// Keys visible on a mapping result (empty for attribute results).
    pub fn keys(&self) -> Vec<&str> {
        match self {
            PredictionResult::Mapping(map) => map.keys().map(String::as_str).collect(),
            PredictionResult::Attributes(_) => Vec::new(),
        }
    }
}

impl From<BTreeMap<String, Tensor>> for PredictionResult {
    fn from(map: BTreeMap<String, Tensor>) -> Self {
        PredictionResult::Mapping(map.into_iter().map(|(k, t)| (k, Ok(t))).collect())
    }
}

/// Typed output of a Gaussian splat prediction head.
#[derive(Debug, Clone, Default)]
pub struct SplatHeadOutput {
    pub means: Option<Tensor>,
    pub opacities: Option<Tensor>,
    pub scales: Option<Tensor>,
    pub rotations: Option<Tensor>,
    pub sh: Option<Tensor>,
}

impl AttributeBag for SplatHeadOutput {
    fn attribute(&self, name: &str) -> Option<&Tensor> {
        match name {
            "means" => self.means.as_ref(),
            "opacities" => self.opacities.as_ref(),
            "scales" => self.scales.as_ref(),
            "rotations" => self.rotations.as_ref(),
            "sh" => self.sh.as_ref(),
            _ => None,
        }
    }
}

impl From<SplatHeadOutput> for PredictionResult {
    fn from(output: SplatHeadOutput) -> Self {
        PredictionResult::Attributes(Box::new(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_alias_wins() {
        let result = PredictionResult::from_json(json!({
            "means3D": [[9.0, 9.0, 9.0]],
            "pts3d": [[1.0, 2.0, 3.0]],
        }))
        .unwrap();
        let (alias, tensor) = result.resolve(&["pts3d", "means3D"]).unwrap();
        assert_eq!(alias, "pts3d");
        assert_eq!(tensor.unwrap().to_f32_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_later_alias_used_when_first_absent() {
        let result = PredictionResult::from_json(json!({"xyz": [0, 0, 0]})).unwrap();
        assert_eq!(result.resolve(&["pts3d", "xyz"]).unwrap().0, "xyz");
        assert!(result.resolve(&["conf"]).is_none());
    }

    #[test]
    fn test_non_tensor_entries_kept() {
        let result = PredictionResult::from_json(json!({
            "pts3d": [1, 2, 3],
            "model_version": "v1.2",
            "extra": null,
        }))
        .unwrap();
        assert_eq!(result.keys(), vec!["extra", "model_version", "pts3d"]);
        assert!(result.get("pts3d").unwrap().is_ok());
        assert!(matches!(
            result.get("model_version"),
            Some(Err(TensorError::NonNumeric(_)))
        ));
    }

    #[test]
    fn test_malformed_first_alias_still_wins() {
        let result = PredictionResult::from_json(json!({
            "pts3d": [[1.0, 2.0, null]],
            "means3D": [[9.0, 9.0, 9.0]],
        }))
        .unwrap();
        let (alias, entry) = result.resolve(&["pts3d", "means3D"]).unwrap();
        assert_eq!(alias, "pts3d");
        assert!(entry.is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(PredictionResult::from_json(json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_attribute_access() {
        let result: PredictionResult = SplatHeadOutput {
            means: Some(Tensor::from_f32(&[1, 3], vec![1.0, 2.0, 3.0])),
            ..Default::default()
        }
        .into();
        assert!(result.get("means").unwrap().is_ok());
        assert!(result.get("pts3d").is_none());
        assert!(result.get("sh").is_none());
        assert_eq!(result.resolve(&["pts3d", "means"]).unwrap().0, "means");
    }
}
