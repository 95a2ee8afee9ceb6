use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::offsets::{self, ChromeOffsets};
use super::provider::GeometryProvider;
use super::{DeviceProfile, NativePoint, Orientation, Rect, WebPoint};
use crate::config::OffsetConfig;
use crate::error::Result;
use crate::platform::RemoteDebugger;

const VIEWPORT_SCRIPT: &str =
    "(function () { return {width: window.innerWidth, height: window.innerHeight}; })()";

/// Browser viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WebDimensions {
    pub width: f64,
    pub height: f64,
}

impl WebDimensions {
    fn from_value(value: Value) -> Option<Self> {
        let dims: Self = serde_json::from_value(value).ok()?;
        (dims.width > 0.0 && dims.height > 0.0).then_some(dims)
    }
}

/// A corrected web-view rectangle together with what went into it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WebviewGeometry {
    pub raw: Rect,
    pub rect: Rect,
    pub offsets: ChromeOffsets,
    pub profile: DeviceProfile,
}

/// Everything used to map one web point to native space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub rect: Rect,
    pub web_dims: WebDimensions,
    pub x_ratio: f64,
    pub y_ratio: f64,
    /// Static offset applied while in landscape
    pub landscape_offset: OffsetConfig,
    /// Extra top chrome that appeared after the rectangle snapshot
    pub extra_top_delta: f64,
}

impl Translation {
    pub fn to_native(&self, point: WebPoint) -> NativePoint {
        NativePoint {
            x: self.rect.x + (self.x_ratio * point.x).round() + self.landscape_offset.x,
            y: self.rect.y
                + (self.y_ratio * point.y).round()
                + self.landscape_offset.y
                + self.extra_top_delta,
        }
    }

    /// Inverse of [`Translation::to_native`], exact up to its rounding
    pub fn to_web(&self, point: NativePoint) -> WebPoint {
        WebPoint {
            x: (point.x - self.rect.x - self.landscape_offset.x) / self.x_ratio,
            y: (point.y - self.rect.y - self.landscape_offset.y - self.extra_top_delta)
                / self.y_ratio,
        }
    }
}

/// Maps points between the browser's CSS pixels and native pixels
pub struct CoordinateTranslator {
    provider: Arc<GeometryProvider>,
    remote: Arc<dyn RemoteDebugger>,
    landscape_offset: OffsetConfig,
}

impl CoordinateTranslator {
    pub fn new(
        provider: Arc<GeometryProvider>,
        remote: Arc<dyn RemoteDebugger>,
        landscape_offset: OffsetConfig,
    ) -> Self {
        Self {
            provider,
            remote,
            landscape_offset,
        }
    }

    /// The web view's native rectangle minus the browser chrome around it.
    ///
    /// The agent reports the web view as large as the whole app, so the URL
    /// bar, tab strip, banner, bottom toolbar and notch are measured and
    /// removed here.
    pub async fn corrected_webview_geometry(&self) -> Result<WebviewGeometry> {
        let raw = self.provider.raw_webview_rect().await?;
        let profile = self.provider.device_profile().await;
        let offsets = self.provider.chrome_offsets(&profile).await;
        let rect = offsets::apply_offsets(raw, &offsets);
        tracing::debug!(?rect, ?offsets, ?profile, "corrected webview native rect");
        Ok(WebviewGeometry {
            raw,
            rect,
            offsets,
            profile,
        })
    }

    pub async fn get_corrected_webview_rect(&self) -> Result<Rect> {
        Ok(self.corrected_webview_geometry().await?.rect)
    }

    async fn web_dimensions(&self) -> Option<WebDimensions> {
        match self.remote.execute(VIEWPORT_SCRIPT).await {
            Ok(value) => {
                let dims = WebDimensions::from_value(value.clone());
                if dims.is_none() {
                    tracing::warn!(%value, "browser reported unusable viewport dimensions");
                }
                dims
            }
            Err(e) => {
                tracing::warn!(error = %e, "unable to read browser viewport dimensions");
                None
            }
        }
    }

    /// Work out the mapping for the current screen. `None` when the web view
    /// or the browser viewport cannot be measured.
    pub async fn translation(&self) -> Option<Translation> {
        let geometry = match self.corrected_webview_geometry().await {
            Ok(geometry) => geometry,
            Err(e) => {
                tracing::warn!(error = %e, "unable to get webview native rect");
                return None;
            }
        };
        if geometry.rect.width <= 0.0 || geometry.rect.height <= 0.0 {
            // chrome larger than the reported web view
            tracing::warn!(
                rect = ?geometry.rect,
                raw = ?geometry.raw,
                offsets = ?geometry.offsets,
                "corrected webview rect is empty or negative"
            );
            return None;
        }
        let web_dims = self.web_dimensions().await?;

        let x_ratio = geometry.rect.width / web_dims.width;
        let mut y_ratio = geometry.rect.height / web_dims.height;
        if geometry.profile.is_notched_landscape() {
            // the height ratio reported for notched phones in landscape is unreliable
            tracing::debug!(x_ratio, y_ratio, "notched landscape: using x ratio for y");
            y_ratio = x_ratio;
        }

        let landscape_offset = match geometry.profile.orientation {
            Orientation::Landscape => self.landscape_offset,
            Orientation::Portrait => OffsetConfig::default(),
        };

        // chrome can appear after the rectangle snapshot; only the difference is new
        let extra_top_delta = self.provider.extra_top_height().await - geometry.offsets.extra_top;

        let translation = Translation {
            rect: geometry.rect,
            web_dims,
            x_ratio,
            y_ratio,
            landscape_offset,
            extra_top_delta,
        };
        tracing::debug!(
            rect = ?translation.rect,
            web_dims = ?translation.web_dims,
            x_ratio,
            y_ratio,
            landscape_offset = ?translation.landscape_offset,
            extra_top_delta,
            "web to native translation"
        );
        Some(translation)
    }

    /// Same as [`CoordinateTranslator::translate_web_to_native`], also returning the mapping used
    pub async fn translate_web_to_native_detailed(
        &self,
        point: WebPoint,
    ) -> Option<(NativePoint, Translation)> {
        let translation = self.translation().await?;
        let native = translation.to_native(point);
        tracing::debug!(?point, ?native, "converted web coords into native coords");
        Some((native, translation))
    }

    pub async fn translate_web_to_native(&self, point: WebPoint) -> Option<NativePoint> {
        self.translate_web_to_native_detailed(point)
            .await
            .map(|(native, _)| native)
    }
}
