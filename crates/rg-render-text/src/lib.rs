#![forbid(unsafe_code)]

//! Text-based renderers: machine-readable JSON, Graphviz DOT and a plain
//! edge listing.

mod dot;
mod json;
mod listing;

pub use dot::{DotRenderer, dot_quote, render_dot};
pub use json::{JsonRenderer, render_json};
pub use listing::{TextRenderer, render_listing};
