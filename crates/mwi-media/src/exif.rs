//! EXIF extraction with GPS reduced to decimal lat/long and `MakerNote`
//! dropped (spec.md §4.7 step 3).

use std::collections::HashMap;
use std::io::Cursor;

use exif::{In, Reader, Tag, Value};

/// Parse EXIF from a JPEG/TIFF byte buffer into a flat string map. Returns
/// an empty map (never an error) when the image carries no EXIF segment,
/// matching the "optionally extract EXIF" contract.
#[must_use]
pub fn extract(bytes: &[u8]) -> HashMap<String, String> {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif_data) = Reader::new().read_from_container(&mut cursor) else {
        return HashMap::new();
    };

    let mut fields = HashMap::new();
    for field in exif_data.fields() {
        if field.tag == Tag::MakerNote {
            continue;
        }
        fields.insert(field.tag.to_string(), field.display_value().to_string());
    }

    if let Some(lat) = decimal_coordinate(&exif_data, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S") {
        fields.insert("GPSLatitudeDecimal".to_string(), lat.to_string());
    }
    if let Some(lon) = decimal_coordinate(&exif_data, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W") {
        fields.insert("GPSLongitudeDecimal".to_string(), lon.to_string());
    }

    fields
}

fn decimal_coordinate(exif_data: &exif::Exif, value_tag: Tag, ref_tag: Tag, negative_ref: &str) -> Option<f64> {
    let field = exif_data.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(ref rationals) = field.value else {
        return None;
    };
    if rationals.len() < 3 {
        return None;
    }
    let degrees = rationals[0].to_f64();
    let minutes = rationals[1].to_f64();
    let seconds = rationals[2].to_f64();
    let mut decimal = degrees + minutes / 60.0 + seconds / 3600.0;

    if let Some(reference) = exif_data.get_field(ref_tag, In::PRIMARY) {
        if reference.display_value().to_string().contains(negative_ref) {
            decimal = -decimal;
        }
    }
    Some(decimal)
}
