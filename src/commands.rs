use std::sync::Arc;

use serde_json::Value;

use crate::config::DriverConfig;
use crate::error::Result;
use crate::geometry::{
    CoordinateTranslator, GeometryProvider, NativePoint, Rect, Translation, WebPoint,
};
use crate::platform::{AsyncResponseState, NativeAgent, RemoteDebugger};
use crate::supervisor::{AtomExecutor, AtomSupervisor};
use crate::tap::TapDispatcher;
use crate::webdriver::SessionSettings;

/// Web-context commands for one session
pub struct WebCommands {
    translator: Arc<CoordinateTranslator>,
    atoms: Arc<AtomExecutor>,
    tap: TapDispatcher,
}

impl WebCommands {
    pub fn new(
        session_id: &str,
        settings: Arc<SessionSettings>,
        native: Arc<dyn NativeAgent>,
        remote: Arc<dyn RemoteDebugger>,
        async_responses: Arc<AsyncResponseState>,
        config: &DriverConfig,
    ) -> Self {
        let provider = Arc::new(GeometryProvider::new(
            Arc::clone(&native),
            Arc::clone(&remote),
            Arc::clone(&settings),
            config.implicit_wait.clone(),
            config.webview_lookup.clone(),
        ));
        let translator = Arc::new(CoordinateTranslator::new(
            Arc::clone(&provider),
            Arc::clone(&remote),
            config.tap.landscape_offset,
        ));
        let supervisor =
            AtomSupervisor::new(Arc::clone(&native), settings, config.supervisor.clone());
        let atoms = Arc::new(AtomExecutor::new(
            session_id,
            remote,
            supervisor,
            async_responses,
        ));
        let tap = TapDispatcher::new(
            native,
            Arc::clone(&atoms),
            provider,
            Arc::clone(&translator),
        );
        Self {
            translator,
            atoms,
            tap,
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub async fn get_corrected_webview_rect(&self) -> Result<Rect> {
        self.translator.get_corrected_webview_rect().await
    }

    pub async fn translate_web_to_native(&self, point: WebPoint) -> Option<NativePoint> {
        self.translator.translate_web_to_native(point).await
    }

    pub async fn translate_web_to_native_detailed(
        &self,
        point: WebPoint,
    ) -> Option<(NativePoint, Translation)> {
        self.translator.translate_web_to_native_detailed(point).await
    }

    // =========================================================================
    // Taps
    // =========================================================================

    pub async fn native_web_tap(&self, element_id: &str) -> Result<()> {
        self.tap.native_web_tap(element_id).await
    }

    pub async fn click_coords(&self, point: NativePoint) -> Result<()> {
        self.tap.click_coords(point).await
    }

    // =========================================================================
    // Atoms
    // =========================================================================

    pub fn set_frames(&self, frames: Vec<String>) {
        self.atoms.set_frames(frames);
    }

    pub async fn execute_atom(
        &self,
        name: &str,
        args: &[Value],
        always_default_frame: bool,
    ) -> Result<Value> {
        self.atoms
            .execute_atom(name, args, always_default_frame)
            .await
    }

    pub async fn execute_atom_async(
        &self,
        name: &str,
        args: &[Value],
        response_url: &str,
    ) -> Result<Value> {
        self.atoms
            .execute_atom_async(name, args, response_url)
            .await
    }
}
