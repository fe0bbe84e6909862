use js_sys::{Array, Object, Reflect, Uint8Array};
use log::{info, warn};
use wasm_bindgen::prelude::*;

use crate::annotator::{highlighted_line_with, scroll_offset};
use crate::config::TilingConfig;
use crate::controller::StepController;
use crate::model::{compute_state_with, CellMark, GridPos, SimulationState};
use crate::source::{fetch_source_text, load_source, SourceSlot, SourceText, DEFAULT_SOURCE_URL};

#[wasm_bindgen]
pub struct Visualizer {
    controller: StepController,
    config: TilingConfig,
    source: SourceSlot,
}

#[wasm_bindgen]
impl Visualizer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Visualizer {
        let config = TilingConfig::default();
        Visualizer {
            controller: StepController::new(config.total_steps),
            config,
            source: SourceSlot::default(),
        }
    }

    pub fn step(&self) -> u32 {
        self.controller.step()
    }

    pub fn total_steps(&self) -> u32 {
        self.controller.total_steps()
    }

    pub fn advance(&mut self) -> bool {
        self.controller.advance()
    }

    pub fn retreat(&mut self) -> bool {
        self.controller.retreat()
    }

    /// Slider input. Non-finite values are ignored.
    pub fn set_step(&mut self, n: f64) -> bool {
        if !n.is_finite() {
            return false;
        }
        self.controller.set_step(n.trunc() as i64)
    }

    pub fn reset(&mut self) -> bool {
        self.controller.reset()
    }

    /// Snapshot of the kernel state at the current step as a plain object.
    pub fn state(&self) -> Object {
        state_object(&self.current())
    }

    pub fn cell_progress(&self) -> Uint8Array {
        Uint8Array::from(self.current().progress.as_slice())
    }

    pub fn tile_m_mask(&self) -> Uint8Array {
        Uint8Array::from(self.current().tile_m.to_bytes().as_slice())
    }

    pub fn tile_n_mask(&self) -> Uint8Array {
        Uint8Array::from(self.current().tile_n.to_bytes().as_slice())
    }

    pub fn narration(&self) -> String {
        self.current().narration().to_string()
    }

    pub fn highlighted_line(&self) -> u32 {
        highlighted_line_with(&self.config, self.controller.step())
    }

    pub fn scroll_offset(&self) -> u32 {
        scroll_offset(
            self.highlighted_line(),
            self.config.scroll_context,
            self.config.line_height,
        )
    }

    /// Stores a fetched listing verbatim (last write wins).
    pub fn set_source(&mut self, text: String) {
        self.source.store(SourceText::loaded(text));
    }

    /// Replaces the listing with the fixed fallback text.
    pub fn set_fallback_source(&mut self) {
        self.source.store(SourceText::fallback());
    }

    pub fn source_lines(&self) -> Array {
        let out = Array::new();
        for (_, line) in self.source.listing().numbered() {
            out.push(&JsValue::from_str(line));
        }
        out
    }

    pub fn source_line_count(&self) -> u32 {
        self.source.listing().len() as u32
    }

    pub fn source_is_fallback(&self) -> bool {
        self.source.is_fallback()
    }

    /// Accepts a plain JS object of config overrides; ignores the whole
    /// update if any field is invalid.
    pub fn set_params(&mut self, params: JsValue) -> bool {
        match self.config.with_overrides(&params) {
            Ok(next) => {
                self.config = next;
                self.controller.set_total_steps(next.total_steps);
                info!("config updated: {next:?}");
                true
            }
            Err(err) => {
                warn!("ignoring params: {err}");
                false
            }
        }
    }

    /// Checks overrides without applying them; rejects with a `ConfigError`.
    pub fn validate_params(&self, params: JsValue) -> Result<(), JsValue> {
        self.config.with_overrides(&params)?;
        Ok(())
    }

    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.config).map_err(JsValue::from)
    }
}

impl Visualizer {
    fn current(&self) -> SimulationState {
        compute_state_with(
            &self.config,
            self.controller.step(),
            self.controller.total_steps(),
        )
    }

    pub fn source(&self) -> &SourceSlot {
        &self.source
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless form of [`Visualizer::state`] for the reference configuration.
#[wasm_bindgen(js_name = computeState)]
pub fn compute_state_js(step: u32, total_steps: u32) -> Object {
    state_object(&compute_state_with(&TilingConfig::default(), step, total_steps))
}

#[wasm_bindgen(js_name = highlightedLine)]
pub fn highlighted_line_js(step: u32) -> u32 {
    crate::annotator::highlighted_line(step)
}

#[wasm_bindgen(js_name = defaultSourceUrl)]
pub fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

/// Resolves to `{ isFallback, text }`: the listing at `url` (default
/// [`DEFAULT_SOURCE_URL`]), or the fallback text. Never rejects.
#[wasm_bindgen(js_name = fetchSource)]
pub async fn fetch_source(url: Option<String>) -> Object {
    let url = url.unwrap_or_else(default_source_url);
    let source = load_source(&url).await;
    let o = Object::new();
    let _ = Reflect::set(&o, &JsValue::from_str("isFallback"), &JsValue::from_bool(source.is_fallback()));
    let _ = Reflect::set(&o, &JsValue::from_str("text"), &JsValue::from_str(source.as_str()));
    o
}

/// Like [`fetch_source`] but rejects with a `SourceError` instead of
/// substituting the fallback.
#[wasm_bindgen(js_name = fetchSourceStrict)]
pub async fn fetch_source_strict(url: Option<String>) -> Result<String, JsValue> {
    let url = url.unwrap_or_else(default_source_url);
    Ok(fetch_source_text(&url).await?)
}

fn pos_object(p: GridPos) -> Object {
    let o = Object::new();
    let _ = Reflect::set(&o, &JsValue::from_str("row"), &JsValue::from_f64(p.row as f64));
    let _ = Reflect::set(&o, &JsValue::from_str("col"), &JsValue::from_f64(p.col as f64));
    o
}

fn tile_elements(s: &SimulationState, element: fn(&SimulationState, u32, u32) -> GridPos) -> Array {
    let out = Array::new();
    let t = s.tile_m.size();
    for r in 0..t {
        for c in 0..t {
            out.push(&pos_object(element(s, r, c)));
        }
    }
    out
}

/// Bit 0: loading, bit 1: focus.
pub(crate) fn mark_bytes(s: &SimulationState, mark: fn(&SimulationState, u32, u32) -> CellMark) -> Vec<u8> {
    let n = s.progress.size();
    let mut out = Vec::with_capacity((n * n) as usize);
    for r in 0..n {
        for c in 0..n {
            let m = mark(s, r, c);
            out.push(m.loading as u8 | (m.focus as u8) << 1);
        }
    }
    out
}

fn state_object(s: &SimulationState) -> Object {
    let o = Object::new();
    let _ = Reflect::set(&o, &JsValue::from_str("step"), &JsValue::from_f64(s.step as f64));
    let _ = Reflect::set(&o, &JsValue::from_str("totalSteps"), &JsValue::from_f64(s.total_steps as f64));
    let _ = Reflect::set(&o, &JsValue::from_str("phase"), &JsValue::from_str(s.phase.as_str()));
    let _ = Reflect::set(&o, &JsValue::from_str("phaseIndex"), &JsValue::from_f64(s.phase.index() as f64));
    let _ = Reflect::set(&o, &JsValue::from_str("outputTile"), &pos_object(s.output_tile));
    let _ = Reflect::set(&o, &JsValue::from_str("reductionIndex"), &JsValue::from_f64(s.reduction_index as f64));
    let _ = Reflect::set(
        &o,
        &JsValue::from_str("thread"),
        &pos_object(GridPos::new(s.thread.row, s.thread.col)),
    );
    let _ = Reflect::set(&o, &JsValue::from_str("matrixSize"), &JsValue::from_f64(s.progress.size() as f64));
    let _ = Reflect::set(&o, &JsValue::from_str("cellProgress"), &Uint8Array::from(s.progress.as_slice()));
    let _ = Reflect::set(&o, &JsValue::from_str("tileM"), &Uint8Array::from(s.tile_m.to_bytes().as_slice()));
    let _ = Reflect::set(&o, &JsValue::from_str("tileN"), &Uint8Array::from(s.tile_n.to_bytes().as_slice()));
    let _ = Reflect::set(&o, &JsValue::from_str("tileMElements"), &tile_elements(s, SimulationState::tile_m_element));
    let _ = Reflect::set(&o, &JsValue::from_str("tileNElements"), &tile_elements(s, SimulationState::tile_n_element));
    let _ = Reflect::set(&o, &JsValue::from_str("marksM"), &Uint8Array::from(mark_bytes(s, SimulationState::m_mark).as_slice()));
    let _ = Reflect::set(&o, &JsValue::from_str("marksN"), &Uint8Array::from(mark_bytes(s, SimulationState::n_mark).as_slice()));
    let _ = Reflect::set(&o, &JsValue::from_str("narration"), &JsValue::from_str(&s.narration().to_string()));
    o
}
