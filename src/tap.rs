use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::geometry::{CoordinateTranslator, GeometryProvider, NativePoint, WebPoint};
use crate::platform::{HttpMethod, NativeAgent};
use crate::supervisor::AtomExecutor;
use crate::webdriver::element::use_atoms_element;
use crate::webdriver::locator::NativeLocator;

#[derive(Debug, Deserialize)]
struct WebSize {
    width: f64,
    height: f64,
}

/// Taps web elements through the native agent
pub struct TapDispatcher {
    native: Arc<dyn NativeAgent>,
    atoms: Arc<AtomExecutor>,
    provider: Arc<GeometryProvider>,
    translator: Arc<CoordinateTranslator>,
}

impl TapDispatcher {
    pub fn new(
        native: Arc<dyn NativeAgent>,
        atoms: Arc<AtomExecutor>,
        provider: Arc<GeometryProvider>,
        translator: Arc<CoordinateTranslator>,
    ) -> Self {
        Self {
            native,
            atoms,
            provider,
            translator,
        }
    }

    /// Tap at absolute native coordinates
    pub async fn click_coords(&self, point: NativePoint) -> Result<()> {
        tracing::debug!(?point, "tapping native coordinates");
        self.native
            .proxy_command(
                "/wda/tap/nil",
                HttpMethod::Post,
                Some(json!({ "x": point.x, "y": point.y })),
            )
            .await?;
        Ok(())
    }

    /// Tap a web element natively.
    ///
    /// Taps the native element whose accessibility id matches the element's
    /// text when exactly one exists, otherwise the translated center of the
    /// element. A blocking alert ends the tap instead of falling back.
    pub async fn native_web_tap(&self, element_id: &str) -> Result<()> {
        let element = use_atoms_element(element_id);
        match self.tap_native_twin(&element).await {
            Ok(()) => return Ok(()),
            Err(e @ Error::UnexpectedAlertOpen(_)) => return Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "native tap by text failed, tapping coordinates");
            }
        }

        let center = self.web_center(&element).await?;
        let point = match self.translator.translate_web_to_native(center).await {
            Some(point) => point,
            None => {
                tracing::warn!(?center, "could not translate web coordinates, tapping them as-is");
                NativePoint {
                    x: center.x,
                    y: center.y,
                }
            }
        };
        self.click_coords(point).await
    }

    async fn element_text(&self, element: &Value) -> Result<String> {
        let text = self
            .atoms
            .execute_atom("get_text", std::slice::from_ref(element), false)
            .await?;
        let text = text.as_str().unwrap_or_default().trim().to_string();
        if !text.is_empty() {
            return Ok(text);
        }
        let value = self
            .atoms
            .execute_atom("get_attribute_value", &[element.clone(), json!("value")], false)
            .await?;
        Ok(value.as_str().unwrap_or_default().trim().to_string())
    }

    async fn tap_native_twin(&self, element: &Value) -> Result<()> {
        let text = self.element_text(element).await?;
        if text.is_empty() {
            return Err(Error::InvalidArgument(
                "element has no text to match natively".to_string(),
            ));
        }

        let locator = NativeLocator::accessibility_id(text.as_str());
        let found = {
            let _guard = self.provider.settings().zero_implicit_wait();
            self.provider
                .find_native_element_or_elements(&locator, true)
                .await?
        };
        let [twin] = found.as_slice() else {
            return Err(Error::ElementNotFound(format!(
                "{} native elements match {locator}",
                found.len()
            )));
        };
        let rect = self.native.get_native_rect(twin).await?;
        self.click_coords(rect.center()).await
    }

    /// Center of the element in web coordinates. Each atom is issued twice:
    /// the first read after some state transitions returns stale values.
    async fn web_center(&self, element: &Value) -> Result<WebPoint> {
        let args = std::slice::from_ref(element);
        self.atoms.execute_atom("get_size", args, false).await?;
        let size: WebSize =
            serde_json::from_value(self.atoms.execute_atom("get_size", args, false).await?)?;
        self.atoms
            .execute_atom("get_top_left_coordinates", args, false)
            .await?;
        let top_left: WebPoint = serde_json::from_value(
            self.atoms
                .execute_atom("get_top_left_coordinates", args, false)
                .await?,
        )?;

        Ok(WebPoint {
            x: top_left.x + size.width / 2.0,
            y: top_left.y + size.height / 2.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImplicitWaitConfig, OffsetConfig, RetryConfig, SupervisorConfig};
    use crate::geometry::Rect;
    use crate::platform::AsyncResponseState;
    use crate::supervisor::AtomSupervisor;
    use crate::testing::{AtomReply, FakeNativeAgent, FakeRemote};
    use crate::webdriver::SessionSettings;

    fn dispatcher(native: &Arc<FakeNativeAgent>, remote: &Arc<FakeRemote>) -> TapDispatcher {
        let settings = Arc::new(SessionSettings::new(0));
        native.attach_settings(&settings);
        let provider = Arc::new(GeometryProvider::new(
            native.clone(),
            remote.clone(),
            Arc::clone(&settings),
            ImplicitWaitConfig::default(),
            RetryConfig::default(),
        ));
        let translator = Arc::new(CoordinateTranslator::new(
            Arc::clone(&provider),
            remote.clone(),
            OffsetConfig::default(),
        ));
        let supervisor = AtomSupervisor::new(native.clone(), settings, SupervisorConfig::default());
        let atoms = Arc::new(AtomExecutor::new(
            "s1",
            remote.clone(),
            supervisor,
            Arc::new(AsyncResponseState::new()),
        ));
        TapDispatcher::new(native.clone(), atoms, provider, translator)
    }

    fn taps(native: &FakeNativeAgent) -> Vec<Value> {
        native
            .proxy_calls()
            .into_iter()
            .filter(|(path, method, _)| path == "/wda/tap/nil" && *method == HttpMethod::Post)
            .filter_map(|(_, _, body)| body)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_coords_posts_tap() {
        let native = Arc::new(FakeNativeAgent::new());
        let remote = Arc::new(FakeRemote::new());
        let dispatcher = dispatcher(&native, &remote);

        dispatcher
            .click_coords(NativePoint { x: 12.0, y: 34.0 })
            .await
            .expect("tap");
        assert_eq!(taps(&native), vec![json!({"x": 12.0, "y": 34.0})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_path_taps_native_twin() {
        let native = Arc::new(FakeNativeAgent::new());
        native.add_element(
            NativeLocator::accessibility_id("Sign in"),
            "native-btn",
            Rect::new(100.0, 200.0, 80.0, 40.0),
        );
        let remote = Arc::new(FakeRemote::new());
        remote.set_atom("get_text", AtomReply::Value(json!("Sign in")));
        let dispatcher = dispatcher(&native, &remote);

        dispatcher.native_web_tap("5000").await.expect("tap");
        assert_eq!(taps(&native), vec![json!({"x": 140.0, "y": 220.0})]);
        assert_eq!(remote.atom_call_count("get_size"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_attribute_used_for_text() {
        let native = Arc::new(FakeNativeAgent::new());
        native.add_element(
            NativeLocator::accessibility_id("Search"),
            "native-field",
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        let remote = Arc::new(FakeRemote::new());
        remote.set_atom("get_text", AtomReply::Value(json!("")));
        remote.set_atom("get_attribute_value", AtomReply::Value(json!("Search")));
        let dispatcher = dispatcher(&native, &remote);

        dispatcher.native_web_tap("5000").await.expect("tap");
        assert_eq!(taps(&native), vec![json!({"x": 5.0, "y": 5.0})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_path_double_reads_and_translates() {
        let native = Arc::new(FakeNativeAgent::new());
        native.add_element(NativeLocator::webview(), "wv", Rect::new(0.0, 0.0, 400.0, 800.0));
        native.add_element(NativeLocator::url_bar_button(), "btn", Rect::new(0.0, 0.0, 44.0, 44.0));
        let remote = Arc::new(FakeRemote::new());
        remote.set_viewport(Some((200.0, 378.0)));
        remote.set_atom("get_text", AtomReply::Value(json!("")));
        remote.push_atom("get_size", AtomReply::Value(json!({"width": 0, "height": 0})));
        remote.set_atom("get_size", AtomReply::Value(json!({"width": 20, "height": 10})));
        remote.push_atom("get_top_left_coordinates", AtomReply::Value(json!({"x": 0, "y": 0})));
        remote.set_atom("get_top_left_coordinates", AtomReply::Value(json!({"x": 40, "y": 95})));
        let dispatcher = dispatcher(&native, &remote);

        dispatcher.native_web_tap("5000").await.expect("tap");
        assert_eq!(remote.atom_call_count("get_size"), 2);
        assert_eq!(remote.atom_call_count("get_top_left_coordinates"), 2);
        // web center (50, 100) at ratio 2 below a 44px URL bar
        assert_eq!(taps(&native), vec![json!({"x": 100.0, "y": 244.0})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambiguous_twin_falls_back_to_coordinates() {
        let native = Arc::new(FakeNativeAgent::new());
        native.add_element(NativeLocator::accessibility_id("OK"), "a", Rect::default());
        native.add_element(NativeLocator::accessibility_id("OK"), "b", Rect::default());
        native.add_element(NativeLocator::webview(), "wv", Rect::new(0.0, 0.0, 400.0, 756.0));
        let remote = Arc::new(FakeRemote::new());
        remote.set_atom("get_text", AtomReply::Value(json!("OK")));
        remote.set_atom("get_size", AtomReply::Value(json!({"width": 10, "height": 10})));
        remote.set_atom("get_top_left_coordinates", AtomReply::Value(json!({"x": 10, "y": 10})));
        let dispatcher = dispatcher(&native, &remote);

        dispatcher.native_web_tap("5000").await.expect("tap");
        assert_eq!(taps(&native), vec![json!({"x": 15.0, "y": 15.0})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untranslatable_point_is_tapped_raw() {
        let native = Arc::new(FakeNativeAgent::new());
        native.add_element(NativeLocator::webview(), "wv", Rect::new(0.0, 0.0, 400.0, 800.0));
        let remote = Arc::new(FakeRemote::new());
        remote.set_viewport(None);
        remote.set_atom("get_size", AtomReply::Value(json!({"width": 4, "height": 6})));
        remote.set_atom("get_top_left_coordinates", AtomReply::Value(json!({"x": 8, "y": 9})));
        let dispatcher = dispatcher(&native, &remote);

        dispatcher.native_web_tap("5000").await.expect("tap");
        assert_eq!(taps(&native), vec![json!({"x": 10.0, "y": 12.0})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_during_text_read_is_surfaced() {
        let native = Arc::new(FakeNativeAgent::new());
        native.open_alert_from_check(2);
        let remote = Arc::new(FakeRemote::new());
        remote.set_atom("get_text", AtomReply::Never);
        let dispatcher = dispatcher(&native, &remote);

        let err = dispatcher.native_web_tap("5000").await.expect_err("alert");
        match err {
            Error::UnexpectedAlertOpen(message) => assert!(message.contains("already started")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(remote.atom_call_count("get_size"), 0);
        assert!(taps(&native).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_text_read_falls_back_to_coordinates() {
        let native = Arc::new(FakeNativeAgent::new());
        native.add_element(NativeLocator::webview(), "wv", Rect::new(0.0, 0.0, 400.0, 756.0));
        let remote = Arc::new(FakeRemote::new());
        remote.set_atom("get_text", AtomReply::Error("stale element reference".to_string()));
        remote.set_atom("get_size", AtomReply::Value(json!({"width": 20, "height": 20})));
        remote.set_atom("get_top_left_coordinates", AtomReply::Value(json!({"x": 30, "y": 40})));
        let dispatcher = dispatcher(&native, &remote);

        dispatcher.native_web_tap("5000").await.expect("tap");
        assert_eq!(remote.atom_call_count("get_attribute_value"), 0);
        assert_eq!(taps(&native), vec![json!({"x": 40.0, "y": 50.0})]);
    }
}
