//! Text measurement for label wrapping and natural control sizes.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};

use super::Size;

/// Measures text extents. `None` means measurement is unavailable and the
/// caller should fall back to its default size.
pub trait TextMeasurer: Send {
    /// Single-line extent.
    fn measure(&mut self, text: &str) -> Option<Size<f32>>;

    /// Extent when word-wrapped to `max_width`.
    fn measure_wrapped(&mut self, text: &str, max_width: f32) -> Option<Size<f32>>;
}

// =============================================================================
// cosmic-text
// =============================================================================

/// Shaping-based measurement using the system font database.
pub struct CosmicTextMeasurer {
    font_system: FontSystem,
    font_size: f32,
}

impl CosmicTextMeasurer {
    pub const DEFAULT_FONT_SIZE: f32 = 14.0;

    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new(), Self::DEFAULT_FONT_SIZE)
    }

    pub fn with_font_system(font_system: FontSystem, font_size: f32) -> Self {
        Self { font_system, font_size }
    }

    fn layout(&mut self, text: &str, max_width: Option<f32>) -> Option<Size<f32>> {
        if self.font_system.db().faces().next().is_none() {
            log::debug!("CosmicTextMeasurer: no fonts loaded");
            return None;
        }

        let metrics = Metrics::new(self.font_size, self.font_size * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, max_width, None);

        let attrs = Attrs::new().family(Family::SansSerif);
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += metrics.line_height;
        }
        if height == 0.0 && !text.is_empty() {
            height = metrics.line_height;
        }

        Some(Size { width: width.ceil(), height: height.ceil() })
    }
}

impl Default for CosmicTextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for CosmicTextMeasurer {
    fn measure(&mut self, text: &str) -> Option<Size<f32>> {
        self.layout(text, None)
    }

    fn measure_wrapped(&mut self, text: &str, max_width: f32) -> Option<Size<f32>> {
        self.layout(text, Some(max_width.max(1.0)))
    }
}

// =============================================================================
// Fixed advance
// =============================================================================

/// Deterministic measurer: every character has the same advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasurer {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self { advance: 7.0, line_height: 16.0 }
    }
}

impl FixedAdvanceMeasurer {
    fn width_of(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure(&mut self, text: &str) -> Option<Size<f32>> {
        if text.is_empty() {
            return Some(Size { width: 0.0, height: 0.0 });
        }
        let lines: Vec<&str> = text.lines().collect();
        let width = lines.iter().map(|l| self.width_of(l)).fold(0.0, f32::max);
        Some(Size { width, height: lines.len().max(1) as f32 * self.line_height })
    }

    // Greedy word wrap; a word wider than the line gets a line of its own.
    fn measure_wrapped(&mut self, text: &str, max_width: f32) -> Option<Size<f32>> {
        if text.is_empty() {
            return Some(Size { width: 0.0, height: 0.0 });
        }
        let space = self.advance;
        let mut lines = 0usize;
        let mut widest: f32 = 0.0;

        for paragraph in text.lines() {
            let mut line: f32 = 0.0;
            lines += 1;
            for word in paragraph.split_whitespace() {
                let w = self.width_of(word);
                if line > 0.0 && line + space + w > max_width {
                    widest = widest.max(line);
                    lines += 1;
                    line = w;
                } else if line > 0.0 {
                    line += space + w;
                } else {
                    line = w;
                }
            }
            widest = widest.max(line);
        }

        Some(Size { width: widest, height: lines as f32 * self.line_height })
    }
}
