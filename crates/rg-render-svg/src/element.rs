//! SVG elements for the graph drawing, built with chained setters.

use std::fmt::Write;

use crate::attributes::{Attributes, escape_xml_text};
use crate::layout::Point;

/// The element kinds a relationship drawing is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Rect,
    Circle,
    Line,
    Path,
    Text,
    Title,
    Group,
    Marker,
    Defs,
}

impl ElementKind {
    #[must_use]
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Path => "path",
            Self::Text => "text",
            Self::Title => "title",
            Self::Group => "g",
            Self::Marker => "marker",
            Self::Defs => "defs",
        }
    }

    /// Shapes render as `<tag/>` unless they carry a tooltip.
    #[must_use]
    pub const fn is_shape(self) -> bool {
        matches!(self, Self::Rect | Self::Circle | Self::Line | Self::Path)
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    kind: ElementKind,
    attrs: Attributes,
    nested: Vec<Element>,
    text: Option<String>,
}

impl Element {
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attrs: Attributes::new(),
            nested: Vec::new(),
            text: None,
        }
    }

    /// Rectangle with its top-left corner at `corner`.
    #[must_use]
    pub fn rect(corner: Point, width: f32, height: f32) -> Self {
        Self::new(ElementKind::Rect)
            .num("x", corner.x)
            .num("y", corner.y)
            .num("width", width)
            .num("height", height)
    }

    #[must_use]
    pub fn circle(center: Point, radius: f32) -> Self {
        Self::new(ElementKind::Circle)
            .num("cx", center.x)
            .num("cy", center.y)
            .num("r", radius)
    }

    #[must_use]
    pub fn line(from: Point, to: Point) -> Self {
        Self::new(ElementKind::Line)
            .num("x1", from.x)
            .num("y1", from.y)
            .num("x2", to.x)
            .num("y2", to.y)
    }

    /// Path from SVG path data.
    #[must_use]
    pub fn path(data: &str) -> Self {
        Self::new(ElementKind::Path).attr("d", data)
    }

    /// Text anchored by its middle at `at`.
    #[must_use]
    pub fn text(at: Point, content: impl Into<String>) -> Self {
        let mut text = Self::new(ElementKind::Text)
            .num("x", at.x)
            .num("y", at.y)
            .attr("text-anchor", "middle");
        text.text = Some(content.into());
        text
    }

    /// A `<title>` child; browsers show it as the hover tooltip of its parent.
    #[must_use]
    pub fn title(tooltip: impl Into<String>) -> Self {
        let mut title = Self::new(ElementKind::Title);
        title.text = Some(tooltip.into());
        title
    }

    #[must_use]
    pub fn group(class: &str) -> Self {
        Self::new(ElementKind::Group).class(class)
    }

    #[must_use]
    pub fn marker(id: &str) -> Self {
        Self::new(ElementKind::Marker).attr("id", id)
    }

    #[must_use]
    pub fn defs() -> Self {
        Self::new(ElementKind::Defs)
    }

    #[must_use]
    pub fn fill(self, color: &str) -> Self {
        self.attr("fill", color)
    }

    #[must_use]
    pub fn stroke(self, color: &str, width: f32) -> Self {
        self.attr("stroke", color).num("stroke-width", width)
    }

    /// Arrowhead from the `<marker>` with the given id.
    #[must_use]
    pub fn arrow(self, marker_id: &str) -> Self {
        self.attr("marker-end", &format!("url(#{marker_id})"))
    }

    #[must_use]
    pub fn font(self, family: &str, size: f32) -> Self {
        self.attr("font-family", family).num("font-size", size)
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
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs = self.attrs.str(name, value);
        self
    }

    #[must_use]
    pub fn num(mut self, name: &str, value: f32) -> Self {
        self.attrs = self.attrs.num(name, value);
        self
    }

    #[must_use]
    pub fn child(mut self, elem: Element) -> Self {
        self.nested.push(elem);
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::with_capacity(256);
        self.write_to_string(&mut output);
        output
    }

    pub fn write_to_string(&self, output: &mut String) {
        let tag = self.kind.tag_name();
        let _ = write!(output, "<{tag}{}", self.attrs.render());
        if self.kind.is_shape() && self.nested.is_empty() {
            output.push_str("/>");
            return;
        }

        output.push('>');
        if let Some(text) = &self.text {
            output.push_str(&escape_xml_text(text));
        }
        for elem in &self.nested {
            elem.write_to_string(output);
        }
        let _ = write!(output, "</{tag}>");
    }
}
