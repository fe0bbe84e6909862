//! Step-driven model of a shared-memory tiled matrix multiplication kernel.
//!
//! A single step index maps onto everything the visualizer draws: the
//! LOAD/COMPUTE phase, the diagonal output tile being accumulated, the
//! reduction index, per-cell progress and the highlighted source line.
//! The model is pure; [`Visualizer`] wraps it for JavaScript together with
//! the step controller and the fetched kernel listing.

use wasm_bindgen::prelude::*;

pub mod annotator;
pub mod bindings;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod source;

pub use annotator::{highlighted_line, scroll_offset, SourceListing};
pub use bindings::Visualizer;
pub use config::TilingConfig;
pub use controller::StepController;
pub use error::{ConfigError, SourceError};
pub use model::{compute_state, compute_state_with, GridPos, Phase, SimulationState, ThreadIndex};
pub use source::{resolve_source, SourceSlot, SourceText, FALLBACK_SOURCE};

#[cfg(feature = "debug")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "debug")]
    set_panic_hook();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("tiling visualizer core initialized");
}
