//! Degree-driven node coloring and sizing.

/// Spectral four-class palette, low degree to high degree.
pub const SPECTRAL4: [&str; 4] = ["#2b83ba", "#abdda4", "#fdae61", "#d7191c"];

pub const EDGE_COLOR: &str = "#888888";
pub const LABEL_COLOR: &str = "#222222";
pub const NODE_OUTLINE: &str = "#333333";

/// Maps a node's degree onto a color bucket and a radius.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeScale {
    colors: &'static [&'static str],
    min_radius: f32,
    max_radius: f32,
    max_degree: usize,
}

impl DegreeScale {
    #[must_use]
    pub fn new(max_degree: usize) -> Self {
        Self {
            colors: &SPECTRAL4,
            min_radius: 6.0,
            max_radius: 16.0,
            max_degree,
        }
    }

    /// Degree relative to the graph maximum, in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self, degree: usize) -> f32 {
        if self.max_degree == 0 {
            return 0.0;
        }
        (degree.min(self.max_degree) as f32) / (self.max_degree as f32)
    }

    #[must_use]
    pub fn color(&self, degree: usize) -> &'static str {
        let buckets = self.colors.len();
        let bucket = ((self.fraction(degree) * buckets as f32) as usize).min(buckets - 1);
        self.colors[bucket]
    }

    /// Area grows linearly with degree.
    #[must_use]
    pub fn radius(&self, degree: usize) -> f32 {
        let min_area = self.min_radius * self.min_radius;
        let max_area = self.max_radius * self.max_radius;
        (min_area + (max_area - min_area) * self.fraction(degree)).sqrt()
    }
}
