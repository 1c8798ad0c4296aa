//! Image metadata extraction
//!
//! EXIF is read from the uploaded bytes on the server and attached to the
//! image report, replacing anything the model claims about metadata.

use exif::{Field, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Longest rendered value kept per field; maker notes can be kilobytes
const MAX_VALUE_CHARS: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifSummary {
    /// Whether any EXIF block was found
    pub present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<String>,
    #[serde(default)]
    pub has_gps: bool,
    /// Every primary-image field, rendered as text
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl ExifSummary {
    /// Summary for an image without EXIF
    pub fn absent() -> Self {
        Self::default()
    }
}

fn ascii(field: Option<&Field>) -> Option<String> {
    match &field?.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).trim_matches(char::from(0)).trim().to_string())
            .find(|s| !s.is_empty()),
        _ => None,
    }
}

/// Read EXIF from an image; missing or unreadable metadata yields `absent()`
pub fn extract(data: &[u8]) -> ExifSummary {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "No readable EXIF in upload");
            return ExifSummary::absent();
        }
    };

    let mut fields = BTreeMap::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        if field.tag == Tag::MakerNote {
            continue;
        }
        let rendered = field.display_value().with_unit(&exif).to_string();
        let rendered: String = rendered.trim_matches('"').chars().take(MAX_VALUE_CHARS).collect();
        fields.insert(field.tag.to_string(), rendered);
    }

    ExifSummary {
        present: true,
        make: ascii(exif.get_field(Tag::Make, In::PRIMARY)),
        model: ascii(exif.get_field(Tag::Model, In::PRIMARY)),
        software: ascii(exif.get_field(Tag::Software, In::PRIMARY)),
        date_time_original: ascii(exif.get_field(Tag::DateTimeOriginal, In::PRIMARY))
            .or_else(|| ascii(exif.get_field(Tag::DateTime, In::PRIMARY))),
        has_gps: exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_some(),
        fields,
    }
}
