//! PLY header construction.

use recon_common::ColorLayout;

/// Declared vertex element of a splat PLY file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    pub vertex_count: usize,
    pub properties: Vec<String>,
}

impl PlyHeader {
    /// Property list for a cloud with the given color layout.
    pub fn for_layout(vertex_count: usize, layout: ColorLayout) -> Self {
        let mut properties: Vec<String> = ["x", "y", "z", "nx", "ny", "nz"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        properties.extend((0..3).map(|i| format!("f_dc_{}", i)));
        properties.extend((0..layout.rest_count()).map(|i| format!("f_rest_{}", i)));
        properties.push("opacity".to_string());
        properties.extend((0..3).map(|i| format!("scale_{}", i)));
        properties.extend((0..4).map(|i| format!("rot_{}", i)));

        Self {
            vertex_count,
            properties,
        }
    }

    /// Floats per record.
    pub fn floats_per_record(&self) -> usize {
        self.properties.len()
    }

    /// Bytes per record.
    pub fn record_size(&self) -> usize {
        self.properties.len() * 4
    }

    /// Index of a property in record order.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p == name)
    }

    /// ASCII header text, including the trailing `end_header\n`.
    pub fn to_ascii(&self) -> String {
        let mut header = String::with_capacity(64 + self.properties.len() * 24);
        header.push_str("ply\n");
        header.push_str("format binary_little_endian 1.0\n");
        header.push_str(&format!("element vertex {}\n", self.vertex_count));
        for name in &self.properties {
            header.push_str("property float ");
            header.push_str(name);
            header.push('\n');
        }
        header.push_str("end_header\n");
        header
    }
}
