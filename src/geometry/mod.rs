//! Web-view geometry: native rectangles, chrome offsets and point translation
//! between the browser's CSS pixel space and the agent's native pixel space.

pub mod offsets;
pub mod provider;
pub mod translator;

use serde::{Deserialize, Serialize};

pub use offsets::ChromeOffsets;
pub use provider::GeometryProvider;
pub use translator::{CoordinateTranslator, Translation, WebviewGeometry};

/// Rectangle in native pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center, rounded to whole native pixels
    pub fn center(&self) -> NativePoint {
        NativePoint {
            x: (self.x + self.width / 2.0).round(),
            y: (self.y + self.height / 2.0).round(),
        }
    }
}

/// Point in the browser's CSS pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WebPoint {
    pub x: f64,
    pub y: f64,
}

/// Point in the native agent's pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Parse the agent's orientation string. Anything not naming landscape is portrait.
    pub fn from_agent(value: &str) -> Self {
        if value.to_ascii_uppercase().contains("LANDSCAPE") {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceClass {
    Phone,
    Tablet,
}

/// Per-call device classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    pub is_phone: bool,
    pub is_notched_phone: bool,
    pub orientation: Orientation,
}

impl DeviceProfile {
    pub fn device_class(&self) -> DeviceClass {
        if self.is_phone {
            DeviceClass::Phone
        } else {
            DeviceClass::Tablet
        }
    }

    pub fn is_notched_landscape(&self) -> bool {
        self.is_notched_phone && self.orientation == Orientation::Landscape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_agent() {
        assert_eq!(Orientation::from_agent("LANDSCAPE"), Orientation::Landscape);
        assert_eq!(
            Orientation::from_agent("UIA_DEVICE_ORIENTATION_LANDSCAPERIGHT"),
            Orientation::Landscape
        );
        assert_eq!(Orientation::from_agent("PORTRAIT"), Orientation::Portrait);
        assert_eq!(Orientation::from_agent(""), Orientation::Portrait);
    }

    #[test]
    fn test_rect_center_rounds() {
        let rect = Rect::new(10.0, 20.0, 33.0, 15.0);
        assert_eq!(rect.center(), NativePoint { x: 27.0, y: 28.0 });
    }

    #[test]
    fn test_rect_deserializes_from_agent_json() {
        let rect: Rect =
            serde_json::from_value(serde_json::json!({"x": 0, "y": 20, "width": 375, "height": 812}))
                .expect("rect");
        assert_eq!(rect, Rect::new(0.0, 20.0, 375.0, 812.0));
    }
}
