//! Render output format model.
//!
//! Formats are a closed set: a raster image, a vector document or a
//! paginated document. Content types for delivery are derived from the
//! format (or, for arbitrary artifacts, from the file extension).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Output format of a rendered diagram.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RenderFormat {
    /// Raster image (PNG).
    #[default]
    Png,
    /// Vector document (SVG markup).
    Svg,
    /// Paginated document (PDF).
    Pdf,
}

impl RenderFormat {
    /// File extension for this format, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }

    /// MIME content type for this format.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
        }
    }

    /// Whether this format is a pixel raster.
    pub fn is_raster(self) -> bool {
        matches!(self, Self::Png)
    }
}

/// Visual theme applied by the rendering engine.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiagramTheme {
    /// Engine default theme.
    #[default]
    Default,
    /// Dark theme.
    Dark,
    /// Forest theme.
    Forest,
    /// Neutral theme.
    Neutral,
}

/// Derives a MIME content type from a file extension.
///
/// Falls back to `application/octet-stream` for unknown extensions. The
/// extension may be passed with or without the leading dot.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_format_extension_and_content_type() {
        assert_eq!(RenderFormat::Png.extension(), "png");
        assert_eq!(RenderFormat::Svg.content_type(), "image/svg+xml");
        assert_eq!(RenderFormat::Pdf.content_type(), "application/pdf");
        assert!(RenderFormat::Png.is_raster());
        assert!(!RenderFormat::Svg.is_raster());
    }

    #[test]
    fn test_format_wire_form() {
        let format: RenderFormat = serde_json::from_str("\"svg\"").unwrap();
        assert_eq!(format, RenderFormat::Svg);
        assert_eq!(serde_json::to_string(&RenderFormat::Png).unwrap(), "\"png\"");
    }

    #[test]
    fn test_theme_parsing() {
        assert_eq!(DiagramTheme::from_str("forest").unwrap(), DiagramTheme::Forest);
        assert!(DiagramTheme::from_str("solarized").is_err());
        assert_eq!(DiagramTheme::default(), DiagramTheme::Default);
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension(".png"), "image/png");
        assert_eq!(content_type_for_extension("JPEG"), "image/jpeg");
        assert_eq!(content_type_for_extension("bin"), "application/octet-stream");
    }
}
