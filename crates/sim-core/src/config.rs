use serde::Serialize;
use wasm_bindgen::JsValue;

use crate::error::ConfigError;

pub const DEFAULT_TOTAL_STEPS: u32 = 100;
pub const DEFAULT_MATRIX_SIZE: u32 = 4;
pub const DEFAULT_TILE_SIZE: u32 = 2;
/// Largest output matrix the model will lay out.
pub const MAX_MATRIX_SIZE: u32 = 64;
const DEFAULT_BLOCK_STEPS: u32 = 25;
const DEFAULT_REDUCTION_STEPS: u32 = 6;
const DEFAULT_THREAD_COLS: u32 = 10;
const DEFAULT_FIRST_LINE: u32 = 10;
const DEFAULT_LAST_LINE: u32 = 40;
const DEFAULT_STEPS_PER_LINE: u32 = 3;
const DEFAULT_LINE_HEIGHT: u32 = 20;
const DEFAULT_SCROLL_CONTEXT: u32 = 5;

/// Constants that shape the step -> state mapping.
///
/// `Default` is the reference configuration: 100 steps over a 4x4 output
/// matrix with 2x2 shared-memory tiles, one diagonal output tile per 25
/// steps and a new reduction index roughly every 6 steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TilingConfig {
    pub total_steps: u32,
    pub matrix_size: u32,
    pub tile_size: u32,
    pub block_steps: u32,     // steps spent on each diagonal output tile
    pub reduction_steps: u32, // steps per reduction index within a block
    pub thread_cols: u32,     // width of the cosmetic thread label grid
    pub first_line: u32,
    pub last_line: u32,
    pub steps_per_line: u32,
    pub line_height: u32, // px, for scroll offsets
    pub scroll_context: u32,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            total_steps: DEFAULT_TOTAL_STEPS,
            matrix_size: DEFAULT_MATRIX_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            block_steps: DEFAULT_BLOCK_STEPS,
            reduction_steps: DEFAULT_REDUCTION_STEPS,
            thread_cols: DEFAULT_THREAD_COLS,
            first_line: DEFAULT_FIRST_LINE,
            last_line: DEFAULT_LAST_LINE,
            steps_per_line: DEFAULT_STEPS_PER_LINE,
            line_height: DEFAULT_LINE_HEIGHT,
            scroll_context: DEFAULT_SCROLL_CONTEXT,
        }
    }
}

impl TilingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("totalSteps", self.total_steps),
            ("matrixSize", self.matrix_size),
            ("tileSize", self.tile_size),
            ("blockSteps", self.block_steps),
            ("reductionSteps", self.reduction_steps),
            ("threadCols", self.thread_cols),
            ("stepsPerLine", self.steps_per_line),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.matrix_size > MAX_MATRIX_SIZE {
            return Err(ConfigError::TooLarge {
                field: "matrixSize",
                value: self.matrix_size,
                max: MAX_MATRIX_SIZE,
            });
        }
        if self.tile_size > self.matrix_size {
            return Err(ConfigError::TileLargerThanMatrix {
                tile: self.tile_size,
                matrix: self.matrix_size,
            });
        }
        if self.first_line > self.last_line {
            return Err(ConfigError::InvertedLineRange {
                first: self.first_line,
                last: self.last_line,
            });
        }
        Ok(())
    }

    /// Number of diagonal output tiles the sweep visits.
    pub fn diagonal_tiles(&self) -> u32 {
        let blocks = self.total_steps.div_ceil(self.block_steps.max(1));
        blocks.clamp(1, self.matrix_size.clamp(1, MAX_MATRIX_SIZE))
    }

    /// Global LOAD/COMPUTE cut. Deliberately independent of the block length.
    pub fn phase_split(&self) -> u32 {
        self.total_steps / 2
    }

    /// Applies overrides from a plain JS object. Missing keys keep their
    /// value; a result that fails validation is rejected as a whole.
    pub fn with_overrides(&self, params: &JsValue) -> Result<Self, ConfigError> {
        let mut next = *self;
        if !params.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        let fields: [(&'static str, &mut u32); 11] = [
            ("totalSteps", &mut next.total_steps),
            ("matrixSize", &mut next.matrix_size),
            ("tileSize", &mut next.tile_size),
            ("blockSteps", &mut next.block_steps),
            ("reductionSteps", &mut next.reduction_steps),
            ("threadCols", &mut next.thread_cols),
            ("firstLine", &mut next.first_line),
            ("lastLine", &mut next.last_line),
            ("stepsPerLine", &mut next.steps_per_line),
            ("lineHeight", &mut next.line_height),
            ("scrollContext", &mut next.scroll_context),
        ];
        for (key, slot) in fields {
            if let Some(v) = get_u32(params, key)? {
                *slot = v;
            }
        }
        next.validate()?;
        Ok(next)
    }
}

fn get_u32(obj: &JsValue, key: &'static str) -> Result<Option<u32>, ConfigError> {
    let v = match js_sys::Reflect::get(obj, &JsValue::from_str(key)) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    if v.is_undefined() || v.is_null() {
        return Ok(None);
    }
    let n = v.as_f64().ok_or(ConfigError::NotANumber { field: key })?;
    if !n.is_finite() || n < 0.0 || n > u32::MAX as f64 {
        return Err(ConfigError::OutOfRange { field: key, value: n });
    }
    Ok(Some(n.floor() as u32))
}
