//! Drawing serialization: the version-1 JSON wire format.

use crate::document::Document;
use crate::error::{EngineError, EngineResult};
use crate::grid::GridType;
use crate::stroke::Stroke;
use serde::{Deserialize, Serialize};

/// Current wire format version.
pub const FORMAT_VERSION: u32 = 1;

/// A complete serialized drawing.
///
/// Round-trips preserve every numeric field bit-exactly: loading an
/// exported drawing reproduces the document field for field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedDrawing {
    pub version: u32,
    pub grid_type: GridType,
    pub strokes: Vec<Stroke>,
}

impl SerializedDrawing {
    /// Deep-copy the document into wire form.
    pub fn from_document(document: &Document, grid_type: GridType) -> Self {
        Self {
            version: FORMAT_VERSION,
            grid_type,
            strokes: document.strokes().to_vec(),
        }
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self).map_err(|e| EngineError::InvalidSerialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let drawing: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidSerialization(e.to_string()))?;
        drawing.validate()?;
        Ok(drawing)
    }

    /// Reject drawings this engine cannot represent.
    pub fn validate(&self) -> EngineResult<()> {
        if self.version != FORMAT_VERSION {
            return Err(EngineError::InvalidSerialization(format!(
                "unsupported version {}",
                self.version
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{Color, InkPoint, StrokeConfig};

    fn document() -> Document {
        let mut doc = Document::new();
        let config = StrokeConfig {
            base_stroke_width: 3.25,
            color: Color::new(12, 200, 7, 255),
            opacity: 0.875,
            ..StrokeConfig::default()
        };
        doc.commit_stroke(Stroke::from_points(
            config,
            vec![
                InkPoint::new(0.1, 0.2, 0.3, 1.5).with_tilt(-12.5, 44.0),
                InkPoint::new(10.7, -3.9, 0.55, 17.25),
            ],
        ));
        doc
    }

    #[test]
    fn test_roundtrip_is_bit_exact() {
        let doc = document();
        let drawing = SerializedDrawing::from_document(&doc, GridType::Hex);
        let json = drawing.to_json().unwrap();
        let back = SerializedDrawing::from_json(&json).unwrap();
        assert_eq!(drawing, back);
        assert_eq!(back.strokes[0].points[0].timestamp, 1.5);
        assert_eq!(back.strokes[0].points[0].tilt_x, -12.5);
        assert_eq!(back.strokes[0].config.opacity, 0.875);
    }

    #[test]
    fn test_wire_field_names() {
        let drawing = SerializedDrawing::from_document(&document(), GridType::Square);
        let json = drawing.to_json().unwrap();
        assert!(json.contains("\"version\":1"));
        assert!(json.contains("\"gridType\":\"square\""));
        assert!(json.contains("\"baseStrokeWidth\""));
        assert!(json.contains("\"pressureInfluence\""));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let json = r#"{"version":2,"gridType":"square","strokes":[]}"#;
        assert!(matches!(
            SerializedDrawing::from_json(json),
            Err(EngineError::InvalidSerialization(_))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(SerializedDrawing::from_json("{not json").is_err());
    }
}
