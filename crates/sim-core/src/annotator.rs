use crate::config::TilingConfig;

/// Line of the kernel listing highlighted at `step`, under the reference
/// configuration: `clamp(10 + step / 3, 10, 40)`.
pub fn highlighted_line(step: u32) -> u32 {
    highlighted_line_with(&TilingConfig::default(), step)
}

pub fn highlighted_line_with(cfg: &TilingConfig, step: u32) -> u32 {
    let advance = step / cfg.steps_per_line.max(1);
    cfg.first_line
        .saturating_add(advance)
        .min(cfg.last_line)
        .max(cfg.first_line)
}

/// Pixel offset that keeps `line` visible with `context` lines above it.
pub fn scroll_offset(line: u32, context: u32, line_height: u32) -> u32 {
    line.saturating_sub(context).saturating_mul(line_height)
}

/// Kernel source split into display lines. Line numbers are 1-based.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceListing {
    lines: Vec<String>,
}

impl SourceListing {
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            lines: text.split('\n').map(str::to_owned).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `None` for line 0 or past the end; highlights may point beyond a
    /// short listing.
    pub fn line(&self, number: u32) -> Option<&str> {
        let idx = (number as usize).checked_sub(1)?;
        self.lines.get(idx).map(String::as_str)
    }

    pub fn contains_line(&self, number: u32) -> bool {
        self.line(number).is_some()
    }

    /// `(line number, text)` pairs in order.
    pub fn numbered(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| (i as u32 + 1, l.as_str()))
    }
}
