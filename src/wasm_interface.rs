//! WebAssembly interface for running Weightscope in the browser.
//!
//! This module provides JavaScript-friendly bindings for the visualizer. The
//! page fetches training result documents itself and passes them in as JSON;
//! frames come back as JSON from `tick()` and are drawn by the page.

use wasm_bindgen::prelude::*;

use crate::{
    default_sources, Completion, InMemorySource, SceneBuffer, SceneRenderer, Viewport, VizError,
    Visualizer, VisualizerConfig, VizOptions,
};

fn to_js(e: VizError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-friendly wrapper around [`Visualizer`].
#[wasm_bindgen]
pub struct WasmVisualizer {
    viz: Visualizer<InMemorySource, SceneBuffer>,
}

#[wasm_bindgen]
impl WasmVisualizer {
    /// Create a visualizer for a drawing area of `width` x `height`.
    ///
    /// # Example (JavaScript)
    /// ```javascript
    /// const viz = new WasmVisualizer(svg.clientWidth, svg.clientHeight);
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Result<WasmVisualizer, JsValue> {
        // Enable panic messages in browser console
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let viewport = Viewport::new(width, height).map_err(to_js)?;
        let config = VisualizerConfig {
            viewport,
            ..Default::default()
        };
        Self::build(config)
    }

    /// Create a visualizer from a JSON configuration.
    pub fn with_config(config_json: &str) -> Result<WasmVisualizer, JsValue> {
        let config = VisualizerConfig::from_json(config_json).map_err(to_js)?;
        Self::build(config)
    }

    /// Selectable documents as a JSON array of `{value, view_value}`.
    pub fn sources_json() -> Result<String, JsValue> {
        serde_json::to_string(&default_sources()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Register a fetched document under its filename.
    ///
    /// # Example (JavaScript)
    /// ```javascript
    /// const json = await (await fetch("/assets/MLP[10,10].json")).text();
    /// viz.load_result("MLP[10,10].json", json);
    /// ```
    pub fn load_result(&mut self, filename: &str, json: &str) -> Result<(), JsValue> {
        self.viz.source_mut().insert_json(filename, json).map_err(to_js)
    }

    /// Select a document; returns its layer sizes.
    pub fn set_topology_source(&mut self, filename: &str) -> Result<Vec<u32>, JsValue> {
        self.viz
            .set_topology_source(filename)
            .map(|t| t.layers().iter().map(|&size| size as u32).collect())
            .map_err(to_js)
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.viz.start().map(|_| ()).map_err(|e| {
            if let VizError::Consistency(message) = &e {
                web_sys::console::error_1(&JsValue::from_str(message));
            }
            to_js(e)
        })
    }

    pub fn stop(&mut self) {
        self.viz.stop();
    }

    pub fn reset(&mut self) {
        self.viz.reset();
    }

    /// Apply `{selected_file, is_running}` options from the page.
    pub fn apply_options(&mut self, options_json: &str) -> Result<(), JsValue> {
        let options: VizOptions =
            serde_json::from_str(options_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.viz.apply_options(&options).map_err(to_js)
    }

    /// Call `callback(completion)` when a run ends.
    ///
    /// # Example (JavaScript)
    /// ```javascript
    /// viz.on_complete(c => { running = false; console.log(c); });
    /// ```
    pub fn on_complete(&mut self, callback: js_sys::Function) {
        self.viz.on_complete(move |completion: Completion| {
            let arg = serde_json::to_string(&completion)
                .map(|s| JsValue::from_str(&s))
                .unwrap_or(JsValue::NULL);
            if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
                web_sys::console::error_1(&e);
            }
        });
    }

    /// Advance time by `dt` units; returns the frames drawn as a JSON array.
    ///
    /// # Example (JavaScript)
    /// ```javascript
    /// let last = performance.now();
    /// function loop(now) {
    ///     const frames = JSON.parse(viz.tick((now - last) / 1000));
    ///     frames.forEach(draw);
    ///     last = now;
    ///     requestAnimationFrame(loop);
    /// }
    /// ```
    pub fn tick(&mut self, dt: f64) -> Result<String, JsValue> {
        self.viz.advance(dt).map_err(to_js)?;
        let frames = self.viz.renderer_mut().take_drawn();
        serde_json::to_string(&frames).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Report a new drawing area; the next frame is laid out for it.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        let viewport = Viewport::new(width, height).map_err(to_js)?;
        self.viz.renderer_mut().resize(viewport);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.viz.is_running()
    }

    /// User-visible messages reported on the current surface.
    pub fn messages_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.viz.renderer().messages())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn width(&self) -> f64 {
        self.viz.renderer().viewport().width
    }

    pub fn height(&self) -> f64 {
        self.viz.renderer().viewport().height
    }
}

impl WasmVisualizer {
    fn build(config: VisualizerConfig) -> Result<WasmVisualizer, JsValue> {
        let renderer = SceneBuffer::new(config.viewport);
        let viz = Visualizer::new(config, InMemorySource::new(), renderer).map_err(to_js)?;
        Ok(Self { viz })
    }
}
