//! SVG attribute list with escaping.

use std::fmt::{self, Write};

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    value: AttributeValue,
}

/// Value of an SVG attribute.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    String(String),
    Number(f32),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(&escape_xml_attr(s)),
            Self::Number(n) => {
                // Whole numbers print without a fraction; everything else
                // keeps two decimals.
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n:.2}")
                }
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f32> for AttributeValue {
    fn from(n: f32) -> Self {
        Self::Number(n)
    }
}

/// Ordered attribute collection of one element.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    attrs: Vec<Attribute>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set<K: Into<String>, V: Into<AttributeValue>>(mut self, name: K, value: V) -> Self {
        self.attrs.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn str<K: Into<String>>(self, name: K, value: &str) -> Self {
        self.set(name, value)
    }

    #[must_use]
    pub fn num<K: Into<String>>(self, name: K, value: f32) -> Self {
        self.set(name, value)
    }

    /// Add a `data-*` attribute.
    #[must_use]
    pub fn data(self, name: &str, value: &str) -> Self {
        self.set(format!("data-{name}"), value)
    }

    /// Add a class, appending to an existing `class` attribute.
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        for attr in &mut self.attrs {
            if attr.name == "class"
                && let AttributeValue::String(ref mut s) = attr.value
            {
                s.push(' ');
                s.push_str(class);
                return self;
            }
        }
        self.set("class", class)
    }

    /// Render as ` name="value"` pairs.
    #[must_use]
    pub fn render(&self) -> String {
        let mut result = String::new();
        for attr in &self.attrs {
            let _ = write!(result, " {}=\"{}\"", attr.name, attr.value);
        }
        result
    }
}

/// Escape special characters in XML attribute values.
#[must_use]
pub fn escape_xml_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape special characters in XML text content.
#[must_use]
pub fn escape_xml_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_numbers_compactly() {
        let attrs = Attributes::new()
            .num("cx", 120.0)
            .num("cy", 7.126)
            .str("fill", "#2b83ba");
        assert_eq!(attrs.render(), " cx=\"120\" cy=\"7.13\" fill=\"#2b83ba\"");
    }

    #[test]
    fn escapes_entity_labels() {
        let attrs = Attributes::new().data("label", "methods:for(;;) & \"quoted\" <x>");
        let rendered = attrs.render();
        assert!(rendered.contains("data-label=\"methods:for(;;) &amp; &quot;quoted&quot; &lt;x&gt;\""));
    }

    #[test]
    fn appends_classes() {
        let attrs = Attributes::new().class("rg-node").class("rg-self-loop");
        assert_eq!(attrs.render(), " class=\"rg-node rg-self-loop\"");
    }

    #[test]
    fn text_escape_keeps_quotes() {
        assert_eq!(escape_xml_text("a < \"b\" & c"), "a &lt; \"b\" &amp; c");
    }
}
