//! Seam between the graph model and the rendering backends.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{LabelStyle, RelationGraph, RenderError};

/// Kind of artifact a backend produces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Svg,
    Html,
    Json,
    Dot,
    Text,
}

impl ArtifactFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Html => "html",
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options every backend honors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub label_style: LabelStyle,
}

impl RenderOptions {
    #[must_use]
    pub const fn with_label_style(mut self, label_style: LabelStyle) -> Self {
        self.label_style = label_style;
        self
    }
}

/// Rendered output of one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub format: ArtifactFormat,
    pub content: String,
}

impl Artifact {
    #[must_use]
    pub fn new(format: ArtifactFormat, content: impl Into<String>) -> Self {
        Self {
            format,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A backend that turns a finished graph into a visual or textual artifact.
pub trait GraphRenderer {
    fn format(&self) -> ArtifactFormat;

    fn render(&self, graph: &RelationGraph) -> Result<Artifact, RenderError>;
}

impl<R: GraphRenderer + ?Sized> GraphRenderer for Box<R> {
    fn format(&self) -> ArtifactFormat {
        (**self).format()
    }

    fn render(&self, graph: &RelationGraph) -> Result<Artifact, RenderError> {
        (**self).render(graph)
    }
}
