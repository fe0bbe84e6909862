#![cfg(target_arch = "wasm32")]
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

use tiling_sim_core::bindings::{compute_state_js, fetch_source};
use tiling_sim_core::{Visualizer, FALLBACK_SOURCE};

// Runs under Node, where there is no `window`; fetches therefore fail and
// must come back as the fallback listing.

fn get(obj: &JsValue, key: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
async fn fetch_without_window_falls_back() {
    let out = fetch_source(Some("/matMulTiling.cu".to_string())).await;
    assert_eq!(get(&out, "isFallback").as_bool(), Some(true));
    assert_eq!(get(&out, "text").as_string().as_deref(), Some(FALLBACK_SOURCE));
}

#[wasm_bindgen_test]
fn state_object_at_step_50() {
    let s: JsValue = compute_state_js(50, 100).into();
    assert_eq!(get(&s, "phase").as_string().as_deref(), Some("COMPUTE"));
    let tile = get(&s, "outputTile");
    assert_eq!(get(&tile, "row").as_f64(), Some(2.0));
    assert_eq!(get(&tile, "col").as_f64(), Some(2.0));
    let progress: Uint8Array = get(&s, "cellProgress").dyn_into().unwrap();
    assert_eq!(progress.length(), 16);
    assert_eq!(progress.get_index(0), 100);
    assert_eq!(progress.get_index(2 * 4 + 2), 0);
}

#[wasm_bindgen_test]
fn set_params_rejects_oversized_tile() {
    let mut v = Visualizer::new();
    let params = js_sys::Object::new();
    Reflect::set(&params, &"tileSize".into(), &JsValue::from_f64(8.0)).unwrap();
    assert!(!v.set_params(params.into()));
    assert_eq!(v.total_steps(), 100);
}

#[wasm_bindgen_test]
fn set_params_shrinks_range() {
    let mut v = Visualizer::new();
    v.set_step(90.0);
    let params = js_sys::Object::new();
    Reflect::set(&params, &"totalSteps".into(), &JsValue::from_f64(60.0)).unwrap();
    assert!(v.set_params(params.into()));
    assert_eq!(v.total_steps(), 60);
    assert_eq!(v.step(), 60);
    assert_eq!(v.tile_m_mask().length(), 4);
}

#[wasm_bindgen_test]
async fn strict_fetch_rejects_with_source_error() {
    let err = tiling_sim_core::bindings::fetch_source_strict(None)
        .await
        .unwrap_err();
    let err: js_sys::Error = err.dyn_into().unwrap();
    assert_eq!(String::from(err.name()), "SourceError");
}

#[wasm_bindgen_test]
fn validate_params_reports_config_error() {
    let v = Visualizer::new();
    let params = js_sys::Object::new();
    Reflect::set(&params, &"blockSteps".into(), &JsValue::from_f64(0.0)).unwrap();
    let err: js_sys::Error = v.validate_params(params.into()).unwrap_err().dyn_into().unwrap();
    assert_eq!(String::from(err.name()), "ConfigError");
}

#[wasm_bindgen_test]
fn set_params_rejects_oversized_matrix() {
    let mut v = Visualizer::new();
    let params = js_sys::Object::new();
    Reflect::set(&params, &"matrixSize".into(), &JsValue::from_f64(70_000.0)).unwrap();
    assert!(!v.set_params(params.into()));
    let progress: Uint8Array = get(&v.state().into(), "cellProgress").dyn_into().unwrap();
    assert_eq!(progress.length(), 16);
}

#[wasm_bindgen_test]
async fn fetch_uses_default_url_when_none_given() {
    let out = fetch_source(None).await;
    assert_eq!(get(&out, "isFallback").as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn config_exports_camel_case_keys() {
    let v = Visualizer::new();
    let cfg = v.config().unwrap();
    assert_eq!(get(&cfg, "matrixSize").as_f64(), Some(4.0));
    assert_eq!(get(&cfg, "blockSteps").as_f64(), Some(25.0));
    assert!(get(&cfg, "matrix_size").is_undefined());
}
