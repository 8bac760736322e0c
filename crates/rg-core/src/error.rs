//! Error taxonomy shared by the parser, the graph builder and the renderers.

use serde::Serialize;
use thiserror::Error;

use crate::{EntityId, Relationship};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MalformedRecord,
    DanglingReference,
    Source,
    Render,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRecord => "relgraph/error/malformed-record",
            Self::DanglingReference => "relgraph/error/dangling-reference",
            Self::Source => "relgraph/error/source",
            Self::Render => "relgraph/error/render",
        }
    }
}

/// A record that matches neither the entity nor the relationship grammar,
/// or whose fields are empty.
#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
#[error("{}: {reason}: `{record}`", self.position())]
pub struct MalformedRecordError {
    /// Zero-based position of the record in the input sequence.
    pub index: usize,
    /// 1-based source line, when the record came from a text source.
    pub line: Option<usize>,
    /// The offending record text, trimmed.
    pub record: String,
    pub reason: String,
}

impl MalformedRecordError {
    #[must_use]
    pub fn new(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            index: 0,
            line: None,
            record: record.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn on_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// `line N` when the source line is known, else the 1-based `record N`.
    #[must_use]
    pub fn position(&self) -> String {
        match self.line {
            Some(line) => format!("line {line}"),
            None => format!("record {}", self.index + 1),
        }
    }
}

/// A relationship whose source or target has no entity declaration anywhere
/// in the input.
#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
#[error("relationship `{relationship}` references undeclared entity [{missing}]")]
pub struct DanglingReferenceError {
    pub relationship: Relationship,
    pub missing: EntityId,
}

/// The input text looked like a list literal but could not be read as one.
#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
#[error("invalid record list at byte {offset}: {message}")]
pub struct SourceError {
    pub offset: usize,
    pub message: String,
}

/// A rendering backend failed to produce its artifact.
#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
#[error("{backend} renderer failed: {message}")]
pub struct RenderError {
    pub backend: String,
    pub message: String,
}

impl RenderError {
    #[must_use]
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
pub enum RelGraphError {
    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecordError),
    #[error(transparent)]
    DanglingReference(#[from] DanglingReferenceError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl RelGraphError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedRecord(_) => ErrorCode::MalformedRecord,
            Self::DanglingReference(_) => ErrorCode::DanglingReference,
            Self::Source(_) => ErrorCode::Source,
            Self::Render(_) => ErrorCode::Render,
        }
    }
}
