//! Reconstruction request body and validation.

use recon_common::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /reconstruct`.
///
/// Every field is optional at the serde level so that missing fields surface
/// as validation messages rather than deserializer errors.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReconstructRequest {
    #[serde(default)]
    pub case_id: Option<String>,

    /// Base64-encoded still images.
    #[serde(default)]
    pub scan_asset_keys: Option<Vec<String>>,

    /// Base64-encoded video. Takes precedence over images when non-empty.
    #[serde(default)]
    pub video_base64: Option<String>,

    /// Accepted for compatibility; not used.
    #[serde(default)]
    pub camera_poses: Option<Value>,

    /// Accepted for compatibility; not used.
    #[serde(default)]
    pub existing_scenegraph: Option<Value>,
}

/// Which modality a request carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Video,
    Images,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Video => "video",
            InputType::Images => "images",
        }
    }
}

/// A validated reconstruction input.
#[derive(Debug, Clone)]
pub enum ReconstructionInput {
    Video(String),
    Images(Vec<String>),
}

impl ReconstructionInput {
    pub fn input_type(&self) -> InputType {
        match self {
            ReconstructionInput::Video(_) => InputType::Video,
            ReconstructionInput::Images(_) => InputType::Images,
        }
    }
}

impl ReconstructRequest {
    /// Check required fields and pick the input modality.
    ///
    /// Returns the case id together with the chosen input.
    pub fn validate(self) -> ReconResult<(String, ReconstructionInput)> {
        let case_id = match self.case_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(ReconError::Input("case_id is required".to_string())),
        };

        if let Some(video) = self.video_base64.filter(|v| !v.is_empty()) {
            return Ok((case_id, ReconstructionInput::Video(video)));
        }

        match self.scan_asset_keys {
            Some(images) if !images.is_empty() => {
                Ok((case_id, ReconstructionInput::Images(images)))
            }
            _ => Err(ReconError::Input(
                "Either video_base64 or scan_asset_keys with at least one base64 image is required"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> ReconstructRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_case_id_required() {
        let err = parse(json!({"scan_asset_keys": ["aGk="]}))
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "case_id is required");

        let err = parse(json!({"case_id": "", "scan_asset_keys": ["aGk="]}))
            .validate()
            .unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_no_input_rejected() {
        for body in [
            json!({"case_id": "c"}),
            json!({"case_id": "c", "scan_asset_keys": []}),
            json!({"case_id": "c", "scan_asset_keys": null, "video_base64": ""}),
        ] {
            let err = parse(body).validate().unwrap_err();
            assert_eq!(err.http_status_code(), 400);
        }
    }

    #[test]
    fn test_video_takes_precedence() {
        let (case_id, input) = parse(json!({
            "case_id": "c-1",
            "video_base64": "AAAA",
            "scan_asset_keys": ["aGk="],
        }))
        .validate()
        .unwrap();
        assert_eq!(case_id, "c-1");
        assert_eq!(input.input_type(), InputType::Video);
    }

    #[test]
    fn test_empty_video_falls_back_to_images() {
        let (_, input) = parse(json!({
            "case_id": "c-1",
            "video_base64": "",
            "scan_asset_keys": ["aGk=", "aGk="],
        }))
        .validate()
        .unwrap();
        assert!(matches!(input, ReconstructionInput::Images(ref v) if v.len() == 2));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let request = parse(json!({
            "case_id": "c",
            "scan_asset_keys": ["aGk="],
            "camera_poses": [[1, 0, 0]],
            "existing_scenegraph": {"objects": []},
            "unknown": true,
        }));
        assert!(request.validate().is_ok());
    }
}
