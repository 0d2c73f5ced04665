//! Render options: wire form, merging and resolution.
//!
//! Options arrive from the tool surface with every field optional. A batch
//! may carry global options merged underneath each item's own options
//! (item keys win). Defaults are applied in one place, [`RenderOptions::resolve`],
//! which produces the concrete values the pipeline runs with.

use std::path::PathBuf;

use merviz_core::{DiagramTheme, RenderFormat};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{Error, Result};

/// Default raster viewport width in pixels.
pub const DEFAULT_WIDTH: u32 = 1200;

/// Default raster viewport height in pixels.
pub const DEFAULT_HEIGHT: u32 = 800;

/// Default supersampling factor for raster output.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Pixels per inch assumed when a caller specifies `dpi` instead of a
/// scale factor.
const BASE_DPI: f32 = 96.0;

/// How a successfully rendered artifact is exposed to the caller.
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
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeliveryMode {
    /// Leave the artifact on the local filesystem only.
    #[default]
    None,
    /// Serve the artifact from the local static file server.
    LocalServer,
    /// Upload the artifact to the configured remote store.
    RemoteUpload,
}

/// Render options as submitted by the caller.
///
/// Every field is optional on the wire; see [`RenderOptions::resolve`] for
/// the defaults. Historical aliases (`resolutionScale`, `dpi`,
/// `generateOnlineLink`, `uploadRetentionDays`, `minioExpiryDays`) are
/// accepted for compatibility with existing callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Output format; defaults to raster PNG.
    pub format: Option<RenderFormat>,
    /// Explicit destination path; auto-generated under the output
    /// directory when absent.
    pub output_path: Option<PathBuf>,
    /// Target width in pixels.
    pub width: Option<u32>,
    /// Target height in pixels.
    pub height: Option<u32>,
    /// Background color.
    pub background_color: Option<String>,
    /// Diagram theme.
    pub theme: Option<DiagramTheme>,
    /// Supersampling factor for raster output.
    #[serde(alias = "resolutionScale")]
    pub scale: Option<f32>,
    /// Raster quality expressed as dots per inch; converted to a scale
    /// factor relative to 96 dpi.
    pub dpi: Option<f32>,
    /// Delivery mode for the rendered artifact.
    #[serde(alias = "deliveryMode")]
    pub delivery: Option<DeliveryMode>,
    /// Legacy flag equivalent to `delivery: local-server`.
    pub generate_online_link: Option<bool>,
    /// Retention window for uploaded artifacts, in days.
    #[serde(alias = "uploadRetentionDays", alias = "minioExpiryDays")]
    pub retention_days: Option<i64>,
}

impl RenderOptions {
    /// Merges these options over a base set, key by key.
    ///
    /// Present fields of `self` win; absent fields fall back to the base.
    pub fn merged_over(&self, base: &RenderOptions) -> RenderOptions {
        RenderOptions {
            format: self.format.or(base.format),
            output_path: self.output_path.clone().or_else(|| base.output_path.clone()),
            width: self.width.or(base.width),
            height: self.height.or(base.height),
            background_color: self
                .background_color
                .clone()
                .or_else(|| base.background_color.clone()),
            theme: self.theme.or(base.theme),
            scale: self.scale.or(base.scale),
            dpi: self.dpi.or(base.dpi),
            delivery: self.delivery.or(base.delivery),
            generate_online_link: self.generate_online_link.or(base.generate_online_link),
            retention_days: self.retention_days.or(base.retention_days),
        }
    }

    /// Applies defaults and validates, producing the concrete options the
    /// pipeline runs with.
    ///
    /// # Errors
    ///
    /// Returns an invalid-option error for non-positive dimensions or a
    /// blank background color.
    pub fn resolve(&self) -> Result<ResolvedOptions> {
        let width = self.width.unwrap_or(DEFAULT_WIDTH);
        let height = self.height.unwrap_or(DEFAULT_HEIGHT);
        if width == 0 || height == 0 {
            return Err(Error::InvalidOption(
                "width and height must be positive".to_owned(),
            ));
        }

        let background_color = self
            .background_color
            .clone()
            .unwrap_or_else(|| "white".to_owned());
        if background_color.trim().is_empty() {
            return Err(Error::InvalidOption(
                "background color must not be blank".to_owned(),
            ));
        }

        // Explicit scale wins over dpi; either way the factor never drops
        // below 1.0.
        let scale = match (self.scale, self.dpi) {
            (Some(scale), _) => scale,
            (None, Some(dpi)) => dpi / BASE_DPI,
            (None, None) => DEFAULT_SCALE,
        };
        if !scale.is_finite() {
            return Err(Error::InvalidOption("scale must be finite".to_owned()));
        }
        let scale = scale.max(1.0);

        let delivery = match (self.delivery, self.generate_online_link) {
            (Some(mode), _) => mode,
            (None, Some(true)) => DeliveryMode::LocalServer,
            (None, _) => DeliveryMode::None,
        };

        Ok(ResolvedOptions {
            format: self.format.unwrap_or_default(),
            output_path: self.output_path.clone(),
            width,
            height,
            background_color,
            theme: self.theme.unwrap_or_default(),
            scale,
            delivery,
            retention_days: self.retention_days,
        })
    }
}

/// Concrete render options with all defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// Output format.
    pub format: RenderFormat,
    /// Explicit destination path, when given.
    pub output_path: Option<PathBuf>,
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Background color.
    pub background_color: String,
    /// Diagram theme.
    pub theme: DiagramTheme,
    /// Supersampling factor, `>= 1.0`.
    pub scale: f32,
    /// Delivery mode.
    pub delivery: DeliveryMode,
    /// Requested retention window, when given; clamping happens at upload
    /// time.
    pub retention_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let resolved = RenderOptions::default().resolve().unwrap();
        assert_eq!(resolved.format, RenderFormat::Png);
        assert_eq!(resolved.width, DEFAULT_WIDTH);
        assert_eq!(resolved.height, DEFAULT_HEIGHT);
        assert_eq!(resolved.background_color, "white");
        assert_eq!(resolved.theme, DiagramTheme::Default);
        assert_eq!(resolved.scale, DEFAULT_SCALE);
        assert_eq!(resolved.delivery, DeliveryMode::None);
    }

    #[test]
    fn test_resolve_rejects_zero_dimensions() {
        let options = RenderOptions {
            width: Some(0),
            ..RenderOptions::default()
        };
        assert!(options.resolve().is_err());
    }

    #[test]
    fn test_dpi_maps_to_scale() {
        let options = RenderOptions {
            dpi: Some(288.0),
            ..RenderOptions::default()
        };
        assert_eq!(options.resolve().unwrap().scale, 3.0);

        // dpi below the base resolution floors at 1.0
        let options = RenderOptions {
            dpi: Some(48.0),
            ..RenderOptions::default()
        };
        assert_eq!(options.resolve().unwrap().scale, 1.0);
    }

    #[test]
    fn test_explicit_scale_wins_over_dpi() {
        let options = RenderOptions {
            scale: Some(2.5),
            dpi: Some(600.0),
            ..RenderOptions::default()
        };
        assert_eq!(options.resolve().unwrap().scale, 2.5);
    }

    #[test]
    fn test_generate_online_link_maps_to_local_server() {
        let options = RenderOptions {
            generate_online_link: Some(true),
            ..RenderOptions::default()
        };
        assert_eq!(options.resolve().unwrap().delivery, DeliveryMode::LocalServer);

        let options = RenderOptions {
            delivery: Some(DeliveryMode::RemoteUpload),
            generate_online_link: Some(true),
            ..RenderOptions::default()
        };
        // the explicit mode wins over the legacy flag
        assert_eq!(options.resolve().unwrap().delivery, DeliveryMode::RemoteUpload);
    }

    #[test]
    fn test_merged_over_item_wins() {
        let global = RenderOptions {
            width: Some(640),
            theme: Some(merviz_core::DiagramTheme::Dark),
            retention_days: Some(14),
            ..RenderOptions::default()
        };
        let item = RenderOptions {
            width: Some(800),
            ..RenderOptions::default()
        };
        let merged = item.merged_over(&global);
        assert_eq!(merged.width, Some(800));
        assert_eq!(merged.theme, Some(merviz_core::DiagramTheme::Dark));
        assert_eq!(merged.retention_days, Some(14));
    }

    #[test]
    fn test_wire_aliases() {
        let options: RenderOptions = serde_json::from_str(
            r#"{"resolutionScale": 3.0, "uploadRetentionDays": 10, "generateOnlineLink": true}"#,
        )
        .unwrap();
        assert_eq!(options.scale, Some(3.0));
        assert_eq!(options.retention_days, Some(10));
        assert_eq!(options.generate_online_link, Some(true));

        let options: RenderOptions =
            serde_json::from_str(r#"{"minioExpiryDays": 3, "deliveryMode": "remote-upload"}"#)
                .unwrap();
        assert_eq!(options.retention_days, Some(3));
        assert_eq!(options.delivery, Some(DeliveryMode::RemoteUpload));
    }
}
