use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures while fetching the kernel source listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("no window object available")]
    NoWindow,

    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("fetch of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read body of {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Rejected configuration overrides.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("params must be a plain object")]
    NotAnObject,

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} {value} exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("tile size {tile} exceeds matrix size {matrix}")]
    TileLargerThanMatrix { tile: u32, matrix: u32 },

    #[error("line range inverted: first {first} > last {last}")]
    InvertedLineRange { first: u32, last: u32 },
}

/// Converts a Rust error into a JS `Error` carrying its display text.
pub fn to_js_error<E: std::fmt::Display>(name: &str, err: E) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    error.set_name(name);
    error.into()
}

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        to_js_error("ConfigError", err)
    }
}

impl From<SourceError> for JsValue {
    fn from(err: SourceError) -> Self {
        to_js_error("SourceError", err)
    }
}
