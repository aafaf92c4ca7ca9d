//! Ordered key aliases for each canonical Gaussian field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The Gaussian parameters the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Positions,
    Opacity,
    Scale,
    Rotation,
    Color,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::Positions,
        CanonicalField::Opacity,
        CanonicalField::Scale,
        CanonicalField::Rotation,
        CanonicalField::Color,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Positions => "positions",
            CanonicalField::Opacity => "opacity",
            CanonicalField::Scale => "scale",
            CanonicalField::Rotation => "rotation",
            CanonicalField::Color => "color",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority-ordered key names per field. The first alias present wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub positions: Vec<String>,
    pub opacity: Vec<String>,
    pub scale: Vec<String>,
    pub rotation: Vec<String>,
    pub color: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for AliasTable {
    /// Key names observed across released model versions.
    fn default() -> Self {
        Self {
            positions: owned(&["pts3d", "means3D", "means", "xyz"]),
            opacity: owned(&["conf", "confidence", "opacity", "opacities"]),
            scale: owned(&["scales", "scaling", "log_scales"]),
            rotation: owned(&["quats", "rotations", "rotation", "rots"]),
            color: owned(&["sh", "shs", "features_dc", "sh_coeffs", "colors_precomp"]),
        }
    }
}

impl AliasTable {
    /// Aliases for `field`, highest priority first.
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Positions => &self.positions,
            CanonicalField::Opacity => &self.opacity,
            CanonicalField::Scale => &self.scale,
            CanonicalField::Rotation => &self.rotation,
            CanonicalField::Color => &self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priority() {
        let table = AliasTable::default();
        assert_eq!(table.aliases(CanonicalField::Positions)[0], "pts3d");
        assert_eq!(table.aliases(CanonicalField::Positions)[1], "means3D");
        assert_eq!(table.aliases(CanonicalField::Color).len(), 5);
    }

    #[test]
    fn test_every_field_has_aliases() {
        let table = AliasTable::default();
        for field in CanonicalField::ALL {
            assert!(!table.aliases(field).is_empty(), "{}", field);
        }
    }
}
