//! Chrome offset calculation.
//!
//! Pure functions turning probe results into pixel corrections. The
//! corrections are summed in a fixed order (URL bar, extra top, bottom) and
//! never clamped: a negative corrected height is the caller's problem.

use serde::Serialize;

use super::{DeviceClass, DeviceProfile, Orientation, Rect};

/// Chrome elements with a fixed, per-device-class size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeKind {
    SmartAppBanner,
    NotchInset,
}

const OFFSET_TABLE: &[(DeviceClass, ChromeKind, f64)] = &[
    (DeviceClass::Phone, ChromeKind::SmartAppBanner, 84.0),
    (DeviceClass::Tablet, ChromeKind::SmartAppBanner, 95.0),
    (DeviceClass::Phone, ChromeKind::NotchInset, 24.0),
];

/// Fixed offset for a chrome element on a device class, zero if it has none
pub fn constant_offset(class: DeviceClass, kind: ChromeKind) -> f64 {
    OFFSET_TABLE
        .iter()
        .find(|(c, k, _)| *c == class && *k == kind)
        .map_or(0.0, |(_, _, px)| *px)
}

/// Corrections measured for one web-view snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChromeOffsets {
    pub url_bar: f64,
    pub extra_top: f64,
    pub bottom: f64,
    /// Horizontal inset on each side
    pub notch_inset: f64,
}

impl ChromeOffsets {
    pub fn top(&self) -> f64 {
        self.url_bar + self.extra_top
    }
}

/// In landscape the element-visible flags of the nav bar cannot be trusted,
/// so visibility follows the presence of its toolbar. Portrait always shows it.
pub fn nav_bar_visible(orientation: Orientation, toolbar_present: bool) -> bool {
    match orientation {
        Orientation::Portrait => true,
        Orientation::Landscape => toolbar_present,
    }
}

pub fn url_bar_offset(nav_bar_visible: bool, first_button_height: f64) -> f64 {
    if nav_bar_visible {
        first_button_height
    } else {
        0.0
    }
}

/// Tab strip plus smart app banner. Both count when both are showing.
pub fn extra_top_offset(tab_bar_height: f64, banner_present: bool, class: DeviceClass) -> f64 {
    let banner = if banner_present {
        constant_offset(class, ChromeKind::SmartAppBanner)
    } else {
        0.0
    };
    tab_bar_height + banner
}

pub fn bottom_bar_offset(toolbar_height: Option<f64>) -> f64 {
    toolbar_height.unwrap_or(0.0)
}

/// The agent does not account for the notch in landscape, so each screen edge loses an inset.
pub fn notch_offset(profile: &DeviceProfile) -> f64 {
    if profile.is_notched_landscape() {
        constant_offset(DeviceClass::Phone, ChromeKind::NotchInset)
    } else {
        0.0
    }
}

/// Apply offsets to the raw web-view rectangle
pub fn apply_offsets(raw: Rect, offsets: &ChromeOffsets) -> Rect {
    let mut rect = raw;
    rect.y += offsets.top();
    rect.height -= offsets.top() + offsets.bottom;
    rect.x += offsets.notch_inset;
    rect.width -= 2.0 * offsets.notch_inset;
    rect
}
