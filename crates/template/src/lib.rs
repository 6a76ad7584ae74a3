//! `vulndemo-template`: EJS-style templates with embedded JEXL expressions.
//!
//! Templates are treated as code: every tag body is handed to the expression
//! evaluator with the caller's data object as its variable context.

mod display;
mod error;
mod parse;
mod render;

pub use error::RenderError;
pub use parse::{Segment, parse};
pub use render::render;
