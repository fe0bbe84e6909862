use js_sys::Error as JsError;
use log::{error, info};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::annotator::SourceListing;
use crate::error::SourceError;

/// Shown in place of the kernel listing when it cannot be fetched.
pub const FALLBACK_SOURCE: &str = "#include <cuda_runtime.h>\n// Error loading code file";

/// Default location of the kernel listing, relative to the page.
pub const DEFAULT_SOURCE_URL: &str = "/matMulTiling.cu";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    fallback: bool,
}

impl SourceText {
    pub fn loaded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fallback: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_SOURCE.to_string(),
            fallback: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Fetch failures never reach the view: they are logged and replaced by
/// [`FALLBACK_SOURCE`].
pub fn resolve_source(result: Result<String, SourceError>) -> SourceText {
    match result {
        Ok(text) => SourceText::loaded(text),
        Err(err) => {
            error!("error reading kernel source: {err}");
            SourceText::fallback()
        }
    }
}

/// Fetches `url` as text through the window's `fetch`.
pub async fn fetch_source_text(url: &str) -> Result<String, SourceError> {
    let window = web_sys::window().ok_or(SourceError::NoWindow)?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| SourceError::Fetch {
            url: url.to_string(),
            reason: describe_js(&e),
        })?;
    let response: Response = response.dyn_into().map_err(|_| SourceError::Fetch {
        url: url.to_string(),
        reason: "not a Response".to_string(),
    })?;
    if !response.ok() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let body_err = |reason: String| SourceError::Body {
        url: url.to_string(),
        reason,
    };
    let text = response.text().map_err(|e| body_err(describe_js(&e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| body_err(describe_js(&e)))?;
    text.as_string()
        .ok_or_else(|| body_err("body is not text".to_string()))
}

/// Fetches `url` and applies the fallback policy.
pub async fn load_source(url: &str) -> SourceText {
    let source = resolve_source(fetch_source_text(url).await);
    if !source.is_fallback() {
        info!("loaded kernel source from {url} ({} bytes)", source.as_str().len());
    }
    source
}

fn describe_js(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<JsError>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Single slot holding the displayed listing. Each store replaces the
/// previous content; no partial state is ever visible.
#[derive(Clone, Debug, Default)]
pub struct SourceSlot {
    current: Option<SourceText>,
    listing: SourceListing,
}

impl SourceSlot {
    pub fn store(&mut self, source: SourceText) {
        self.listing = SourceListing::parse(source.as_str());
        self.current = Some(source);
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_fallback(&self) -> bool {
        self.current.as_ref().is_some_and(SourceText::is_fallback)
    }

    pub fn text(&self) -> &str {
        self.current.as_ref().map_or("", SourceText::as_str)
    }

    pub fn listing(&self) -> &SourceListing {
        &self.listing
    }
}
