use std::fmt;

use serde::Serialize;

/// Native locator strategies understood by the automation agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LocatorStrategy {
    #[serde(rename = "-ios predicate string")]
    IosPredicate,
    #[serde(rename = "accessibility id")]
    AccessibilityId,
}

impl LocatorStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IosPredicate => "-ios predicate string",
            Self::AccessibilityId => "accessibility id",
        }
    }
}

/// A native lookup: strategy plus selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NativeLocator {
    #[serde(rename = "using")]
    pub strategy: LocatorStrategy,
    pub value: String,
}

impl NativeLocator {
    pub fn new(strategy: LocatorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn predicate(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::IosPredicate, value)
    }

    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::AccessibilityId, value)
    }

    /// The visible web view hosting browser content
    pub fn webview() -> Self {
        Self::predicate("type = 'XCUIElementTypeWebView' AND visible = 1")
    }

    /// First button in the app. It is the tallest element of the URL bar, and
    /// nothing in the bar reports the bar's own height.
    pub fn url_bar_button() -> Self {
        Self::predicate(r#"type = "XCUIElementTypeButton""#)
    }

    /// Toolbar whose presence means the nav bar is shown in landscape
    pub fn landscape_nav_bar() -> Self {
        Self::predicate("name = 'TopBrowserBar' AND visible = 1")
    }

    pub fn tab_bar() -> Self {
        Self::predicate("name LIKE '*, Tab' AND visible = 1")
    }

    pub fn smart_app_banner() -> Self {
        Self::accessibility_id("Close app download offer")
    }

    pub fn bottom_toolbar() -> Self {
        Self::predicate("name = 'BottomBrowserToolbar' AND visible = 1")
    }
}

impl fmt::Display for NativeLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.strategy.as_str(), self.value)
    }
}
