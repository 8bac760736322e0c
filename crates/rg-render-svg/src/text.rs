//! Label measurement and truncation.
//!
//! There are no font metrics available when writing SVG, so widths are
//! estimated from a per-character heuristic.

use unicode_segmentation::UnicodeSegmentation;

/// Character-count based text measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub avg_char_width: f32,
    pub font_size: f32,
    pub line_height: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            avg_char_width: 6.5,
            font_size: 11.0,
            line_height: 1.3,
        }
    }
}

impl TextMetrics {
    #[must_use]
    pub fn with_font_size(font_size: f32) -> Self {
        let base = Self::default();
        Self {
            avg_char_width: base.avg_char_width * font_size / base.font_size,
            font_size,
            line_height: base.line_height,
        }
    }

    /// Estimated width of one line of text.
    #[must_use]
    pub fn estimate_width(&self, text: &str) -> f32 {
        text.graphemes(true)
            .map(|grapheme| {
                let factor = match grapheme {
                    "W" | "M" | "@" | "%" => 1.5,
                    "w" | "m" => 1.2,
                    "i" | "l" | "|" | "!" | "'" | "." | "," | ":" | ";" => 0.4,
                    "I" | "j" | "t" | "f" | "(" | ")" | "[" | "]" => 0.6,
                    " " => 0.5,
                    _ => 1.0,
                };
                self.avg_char_width * factor
            })
            .sum()
    }

    #[must_use]
    pub fn line_height_px(&self) -> f32 {
        self.font_size * self.line_height
    }
}

/// Shorten `label` to at most `max_graphemes` user-perceived characters,
/// ending in `…` when anything was cut. A limit of zero disables truncation.
#[must_use]
pub fn truncate_label(label: &str, max_graphemes: usize) -> String {
    if max_graphemes == 0 {
        return label.to_string();
    }
    let mut graphemes = label.graphemes(true);
    let kept: String = graphemes.by_ref().take(max_graphemes).collect();
    if graphemes.next().is_none() {
        return kept;
    }

    // Make room for the ellipsis.
    let mut shortened: String = kept
        .graphemes(true)
        .take(max_graphemes.saturating_sub(1))
        .collect();
    shortened.truncate(shortened.trim_end().len());
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::{TextMetrics, truncate_label};

    #[test]
    fn short_labels_are_untouched() {
        assert_eq!(truncate_label("COMPANY:Acme", 20), "COMPANY:Acme");
        assert_eq!(truncate_label("COMPANY:Acme", 12), "COMPANY:Acme");
        assert_eq!(truncate_label("anything at all", 0), "anything at all");
    }

    #[test]
    fn long_labels_end_in_ellipsis() {
        assert_eq!(
            truncate_label("Gov:three-letter agency of the US government", 16),
            "Gov:three-lette…"
        );
        assert_eq!(truncate_label("DOC: a b", 6), "DOC:…");
    }

    #[test]
    fn truncation_respects_grapheme_clusters() {
        let label = "T:e\u{301}e\u{301}e\u{301}e\u{301}";
        let cut = truncate_label(label, 4);
        assert_eq!(cut, "T:e\u{301}…");
    }

    #[test]
    fn wide_glyphs_measure_wider() {
        let metrics = TextMetrics::default();
        assert!(metrics.estimate_width("MMMM") > metrics.estimate_width("iiii"));
        assert_eq!(metrics.estimate_width(""), 0.0);
    }

    #[test]
    fn font_size_scales_char_width() {
        let large = TextMetrics::with_font_size(22.0);
        assert!((large.avg_char_width - 13.0).abs() < f32::EPSILON);
        assert!((large.line_height_px() - 28.6).abs() < 1e-4);
    }
}
