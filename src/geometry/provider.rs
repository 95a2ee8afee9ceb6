use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio::time::{sleep, Instant};

use super::offsets::{self, ChromeOffsets};
use super::{DeviceClass, DeviceProfile, Orientation, Rect};
use crate::config::{ImplicitWaitConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::platform::{HttpMethod, NativeAgent, RemoteDebugger};
use crate::webdriver::locator::NativeLocator;
use crate::webdriver::SessionSettings;

const DEVICE_SCRIPT: &str = "(function () { return {userAgent: navigator.userAgent, \
     screenWidth: window.screen.width, screenHeight: window.screen.height}; })()";

/// Shortest long screen side (CSS px) of the notched phone family
const NOTCHED_PHONE_MIN_LONG_SIDE: f64 = 812.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceInfo {
    user_agent: String,
    #[serde(default)]
    screen_width: f64,
    #[serde(default)]
    screen_height: f64,
}

/// Session-stable part of the device classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeviceKind {
    is_phone: bool,
    is_notched_phone: bool,
}

impl DeviceKind {
    /// Most classification failures come from environments where the browser
    /// round trip fails, which are overwhelmingly phones.
    const ASSUMED: Self = Self {
        is_phone: true,
        is_notched_phone: false,
    };

    fn from_info(info: &DeviceInfo) -> Self {
        let is_phone = info.user_agent.to_lowercase().contains("iphone");
        let long_side = info.screen_width.max(info.screen_height);
        Self {
            is_phone,
            is_notched_phone: is_phone && long_side >= NOTCHED_PHONE_MIN_LONG_SIDE,
        }
    }
}

type HeightKey = (String, String);

/// Best-effort probes of the browser chrome around the web view.
///
/// Absence of a chrome element is a normal outcome: every probe reports zero
/// or false instead of failing, and runs with the session's implicit wait
/// forced to zero.
///
/// Heights are memoized per `(cache key, element)` for the life of the
/// session and never invalidated, so a rotation can leave a stale entry.
pub struct GeometryProvider {
    native: Arc<dyn NativeAgent>,
    remote: Arc<dyn RemoteDebugger>,
    settings: Arc<SessionSettings>,
    implicit_wait: ImplicitWaitConfig,
    webview_lookup: RetryConfig,
    device: OnceCell<DeviceKind>,
    heights: Mutex<HashMap<HeightKey, Arc<OnceCell<f64>>>>,
}

impl GeometryProvider {
    pub fn new(
        native: Arc<dyn NativeAgent>,
        remote: Arc<dyn RemoteDebugger>,
        settings: Arc<SessionSettings>,
        implicit_wait: ImplicitWaitConfig,
        webview_lookup: RetryConfig,
    ) -> Self {
        Self {
            native,
            remote,
            settings,
            implicit_wait,
            webview_lookup,
            device: OnceCell::new(),
            heights: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    // =========================================================================
    // Native Lookup
    // =========================================================================

    /// Look up native elements, polling until something matches or the
    /// session's implicit wait runs out. A single lookup when the wait is zero.
    pub async fn find_native_element_or_elements(
        &self,
        locator: &NativeLocator,
        multiple: bool,
    ) -> Result<Vec<String>> {
        let deadline = Instant::now() + self.settings.implicit_wait();
        loop {
            let found = self.native.find_native_elements(locator).await?;
            if !found.is_empty() {
                return Ok(if multiple {
                    found
                } else {
                    found.into_iter().take(1).collect()
                });
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(self.implicit_wait.poll_interval()).await;
        }

        if multiple {
            Ok(Vec::new())
        } else {
            Err(Error::ElementNotFound(locator.to_string()))
        }
    }

    pub async fn find_native_element(&self, locator: &NativeLocator) -> Result<String> {
        self.find_native_element_or_elements(locator, false)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ElementNotFound(locator.to_string()))
    }

    /// Locate the visible web view, retrying while it is not attached yet
    pub async fn find_webview(&self) -> Result<String> {
        let locator = &NativeLocator::webview();
        retry_interval(
            self.webview_lookup.attempts,
            self.webview_lookup.interval(),
            move || async move {
                let _guard = self.settings.zero_implicit_wait();
                self.find_native_element(locator).await
            },
        )
        .await
    }

    /// Rectangle the agent reports for the web view, which spans the whole app
    pub async fn raw_webview_rect(&self) -> Result<Rect> {
        let webview = self.find_webview().await?;
        let rect = self.native.get_native_rect(&webview).await?;
        tracing::debug!(?rect, "reported webview native rect");
        Ok(rect)
    }

    // =========================================================================
    // Chrome Probes
    // =========================================================================

    /// Height of an element, measured once per `(key, element)`
    pub async fn element_height_memoized(&self, key: &str, element_id: &str) -> Result<f64> {
        let cell = {
            let mut heights = self.heights.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                heights
                    .entry((key.to_string(), element_id.to_string()))
                    .or_default(),
            )
        };
        let height = cell
            .get_or_try_init(|| async {
                let rect = self.native.get_native_rect(element_id).await?;
                Ok::<_, Error>(rect.height)
            })
            .await?;
        Ok(*height)
    }

    async fn element_present(&self, locator: &NativeLocator) -> bool {
        let _guard = self.settings.zero_implicit_wait();
        match self.find_native_element(locator).await {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!(%locator, error = %e, "chrome element absent");
                false
            }
        }
    }

    async fn first_button_height(&self) -> Result<f64> {
        let _guard = self.settings.zero_implicit_wait();
        let button = self
            .find_native_element(&NativeLocator::url_bar_button())
            .await?;
        Ok(self.native.get_native_rect(&button).await?.height)
    }

    /// URL bar height for the given orientation, zero when hidden or not found
    pub async fn url_bar_height(&self, orientation: Orientation) -> f64 {
        let toolbar_present = match orientation {
            Orientation::Portrait => true,
            Orientation::Landscape => self.element_present(&NativeLocator::landscape_nav_bar()).await,
        };
        let visible = offsets::nav_bar_visible(orientation, toolbar_present);
        let button_height = if visible {
            self.first_button_height().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "unable to measure URL bar, assuming no URL bar");
                0.0
            })
        } else {
            0.0
        };
        let height = offsets::url_bar_offset(visible, button_height);
        tracing::debug!(height, visible, "URL bar height");
        height
    }

    async fn tab_bar_height(&self) -> f64 {
        let _guard = self.settings.zero_implicit_wait();
        let tab = match self.find_native_element(&NativeLocator::tab_bar()).await {
            Ok(tab) => tab,
            Err(_) => return 0.0,
        };
        match self.element_height_memoized("TabBar", &tab).await {
            Ok(height) => {
                tracing::debug!(height, "adding height of tab bar");
                height
            }
            Err(e) => {
                tracing::warn!(error = %e, "unable to measure tab bar");
                0.0
            }
        }
    }

    /// Tab strip and smart app banner heights, each zero when absent
    pub async fn extra_top_height(&self) -> f64 {
        let tab_bar = self.tab_bar_height().await;
        let banner_present = self.element_present(&NativeLocator::smart_app_banner()).await;
        let class = if banner_present {
            tracing::debug!("adding height of app banner");
            self.device_class().await
        } else {
            DeviceClass::Phone
        };
        let height = offsets::extra_top_offset(tab_bar, banner_present, class);
        tracing::debug!(height, "extra top elements height");
        height
    }

    /// Bottom browser toolbar height, zero when absent
    pub async fn bottom_bar_height(&self) -> f64 {
        let bars = {
            let _guard = self.settings.zero_implicit_wait();
            self.find_native_element_or_elements(&NativeLocator::bottom_toolbar(), true)
                .await
        };
        let height = match bars.as_deref() {
            Ok([bar, ..]) => match self.element_height_memoized("BottomBrowserToolbar", bar).await {
                Ok(height) => Some(height),
                Err(e) => {
                    tracing::warn!(error = %e, "unable to measure bottom toolbar");
                    None
                }
            },
            Ok([]) => None,
            Err(e) => {
                tracing::warn!(error = %e, "bottom toolbar lookup failed");
                None
            }
        };
        offsets::bottom_bar_offset(height)
    }

    // =========================================================================
    // Device Classification
    // =========================================================================

    async fn device_kind(&self) -> DeviceKind {
        *self
            .device
            .get_or_init(|| async {
                match self.remote.execute(DEVICE_SCRIPT).await.and_then(|value| {
                    serde_json::from_value::<DeviceInfo>(value).map_err(Error::from)
                }) {
                    Ok(info) => DeviceKind::from_info(&info),
                    Err(e) => {
                        tracing::warn!("Unable to find device type from useragent. Assuming iPhone");
                        tracing::debug!(error = %e, "device classification failed");
                        DeviceKind::ASSUMED
                    }
                }
            })
            .await
    }

    async fn device_class(&self) -> DeviceClass {
        let kind = self.device_kind().await;
        if kind.is_phone {
            DeviceClass::Phone
        } else {
            DeviceClass::Tablet
        }
    }

    /// Current orientation, portrait when the agent cannot tell
    pub async fn orientation(&self) -> Orientation {
        match self
            .native
            .proxy_command("/orientation", HttpMethod::Get, None)
            .await
        {
            Ok(value) => Orientation::from_agent(value.as_str().unwrap_or_default()),
            Err(e) => {
                tracing::warn!(error = %e, "unable to read orientation, assuming portrait");
                Orientation::Portrait
            }
        }
    }

    /// Classification is cached; orientation is read fresh on every call
    pub async fn device_profile(&self) -> DeviceProfile {
        let kind = self.device_kind().await;
        DeviceProfile {
            is_phone: kind.is_phone,
            is_notched_phone: kind.is_notched_phone,
            orientation: self.orientation().await,
        }
    }

    /// Measure every correction for the current screen, in application order
    pub async fn chrome_offsets(&self, profile: &DeviceProfile) -> ChromeOffsets {
        let url_bar = self.url_bar_height(profile.orientation).await;
        let extra_top = self.extra_top_height().await;
        let bottom = self.bottom_bar_height().await;
        ChromeOffsets {
            url_bar,
            extra_top,
            bottom,
            notch_inset: offsets::notch_offset(profile),
        }
    }
}

/// Run `op` up to `attempts` times, sleeping `interval` between failures
async fn retry_interval<T, F, Fut>(attempts: u32, interval: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                tracing::debug!(attempt, error = %e, "retrying");
                attempt += 1;
                sleep(interval).await;
            }
        }
    }
}
