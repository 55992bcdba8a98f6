use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptive camera settings. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CameraMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    pub exposure_time: Option<String>,
    pub f_number: Option<String>,
    pub iso: Option<String>,
    pub focal_length: Option<String>,
    pub lens: Option<String>,
}

impl CameraMetadata {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn get_string(exif: &Value, key: &str) -> Option<String> {
    exif.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn get_f64(exif: &Value, key: &str) -> Option<f64> {
    exif.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Trims trailing zeros so `1.80` renders as `1.8` and `50.0` as `50`.
fn compact(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn format_exposure(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("1/{}", (1.0 / seconds).round())
    } else {
        format!("{}s", compact(seconds))
    }
}

fn text_or_number(exif: &Value, key: &str, render: impl Fn(f64) -> String) -> Option<String> {
    get_f64(exif, key)
        .map(render)
        .or_else(|| get_string(exif, key))
}

/// Builds camera metadata from a numeric tag dictionary.
pub fn camera_from_tags(exif: &Value) -> CameraMetadata {
    CameraMetadata {
        make: get_string(exif, "Make"),
        model: get_string(exif, "Model"),
        exposure_time: text_or_number(exif, "ExposureTime", format_exposure),
        f_number: text_or_number(exif, "FNumber", |f| format!("f/{}", compact(f))),
        iso: text_or_number(exif, "ISO", |iso| format!("{}", iso.round())),
        focal_length: text_or_number(exif, "FocalLength", |mm| format!("{} mm", compact(mm))),
        lens: get_string(exif, "LensModel")
            .or_else(|| get_string(exif, "LensID"))
            .or_else(|| get_string(exif, "Lens")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camera_with_full_data() {
        let exif_data = json!({
            "Make": "FUJIFILM",
            "Model": "X-T4",
            "ExposureTime": 0.004,
            "FNumber": 5.6,
            "ISO": 160,
            "FocalLength": 23.0,
            "LensModel": "XF23mmF2 R WR"
        });

        let camera = camera_from_tags(&exif_data);

        assert_eq!(camera.make.as_deref(), Some("FUJIFILM"));
        assert_eq!(camera.model.as_deref(), Some("X-T4"));
        assert_eq!(camera.exposure_time.as_deref(), Some("1/250"));
        assert_eq!(camera.f_number.as_deref(), Some("f/5.6"));
        assert_eq!(camera.iso.as_deref(), Some("160"));
        assert_eq!(camera.focal_length.as_deref(), Some("23 mm"));
        assert_eq!(camera.lens.as_deref(), Some("XF23mmF2 R WR"));
    }

    #[test]
    fn test_camera_with_no_tags_is_empty() {
        let camera = camera_from_tags(&json!({}));
        assert!(camera.is_empty());
    }

    #[test]
    fn test_long_exposure_and_text_values() {
        let exif_data = json!({
            "ExposureTime": 2.5,
            "FNumber": "f/8",
            "Make": "   "
        });
        let camera = camera_from_tags(&exif_data);
        assert_eq!(camera.exposure_time.as_deref(), Some("2.5s"));
        assert_eq!(camera.f_number.as_deref(), Some("f/8"));
        assert!(camera.make.is_none(), "Blank strings should be dropped");
    }

    #[test]
    fn test_lens_fallback_order() {
        let camera = camera_from_tags(&json!({ "LensID": "EF 24-105mm", "Lens": "24-105" }));
        assert_eq!(camera.lens.as_deref(), Some("EF 24-105mm"));
    }
}
