//! SVG document root.

use std::fmt::{self, Write};

use crate::attributes::{Attributes, escape_xml_attr, escape_xml_text};
use crate::element::Element;

/// Builder for a complete `<svg>` document.
#[derive(Debug, Clone, Default)]
pub struct SvgDocument {
    attrs: Attributes,
    viewbox: Option<(f32, f32, f32, f32)>,
    width: Option<String>,
    height: Option<String>,
    title: Option<String>,
    desc: Option<String>,
    style: Option<String>,
    children: Vec<Element>,
}

impl SvgDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn viewbox(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.viewbox = Some((x, y, width, height));
        self
    }

    #[must_use]
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width.to_string());
        self.height = Some(height.to_string());
        self
    }

    /// Width and height of 100% so the drawing scales with its container.
    #[must_use]
    pub fn responsive(mut self) -> Self {
        self.width = Some(String::from("100%"));
        self.height = Some(String::from("100%"));
        self
    }

    /// Document `<title>`/`<desc>` and `role="img"`.
    #[must_use]
    pub fn accessible(mut self, title: impl Into<String>, desc: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self.desc = Some(desc.into());
        self.attrs = self.attrs.set("role", "img");
        self
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.attrs = self.attrs.class(class);
        self
    }

    #[must_use]
    pub fn data(mut self, name: &str, value: &str) -> Self {
        self.attrs = self.attrs.data(name, value);
        self
    }

    #[must_use]
    pub fn style(mut self, css: impl Into<String>) -> Self {
        self.style = Some(css.into());
        self
    }

    #[must_use]
    pub fn child(mut self, elem: Element) -> Self {
        self.children.push(elem);
        self
    }

    pub fn write_to_string(&self, output: &mut String) {
        output.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\"");

        if let Some((x, y, w, h)) = self.viewbox {
            let _ = write!(output, " viewBox=\"{x} {y} {w} {h}\"");
        }
        if let Some(ref w) = self.width {
            let _ = write!(output, " width=\"{}\"", escape_xml_attr(w));
        }
        if let Some(ref h) = self.height {
            let _ = write!(output, " height=\"{}\"", escape_xml_attr(h));
        }
        output.push_str(&self.attrs.render());
        output.push('>');

        if let Some(ref title) = self.title {
            let _ = write!(output, "<title>{}</title>", escape_xml_text(title));
        }
        if let Some(ref desc) = self.desc {
            let _ = write!(output, "<desc>{}</desc>", escape_xml_text(desc));
        }
        if let Some(ref css) = self.style {
            let _ = write!(output, "<style>{}</style>", escape_xml_text(css));
        }
        for child in &self.children {
            child.write_to_string(output);
        }

        output.push_str("</svg>");
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::with_capacity(4096);
        self.write_to_string(&mut output);
        f.write_str(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_namespace_and_viewbox() {
        let svg = SvgDocument::new().viewbox(0.0, 0.0, 800.0, 600.0).to_string();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 800 600\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn title_and_desc_are_escaped() {
        let svg = SvgDocument::new()
            .accessible("Relationship Graph", "3 entities & 2 relationships")
            .to_string();
        assert!(svg.contains("role=\"img\""));
        assert!(svg.contains("<title>Relationship Graph</title>"));
        assert!(svg.contains("<desc>3 entities &amp; 2 relationships</desc>"));
    }

    #[test]
    fn style_cannot_close_itself_early() {
        let svg = SvgDocument::new()
            .style(".rg-node{fill:red} </style><script>x</script>")
            .to_string();
        assert!(!svg.contains("</style><script>"));
    }

    #[test]
    fn responsive_overrides_size() {
        let svg = SvgDocument::new().size(800.0, 600.0).responsive().to_string();
        assert!(svg.contains("width=\"100%\""));
        assert!(!svg.contains("width=\"800\""));
    }
}
