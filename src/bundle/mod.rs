//! Build-time helpers that inline stylesheets into a single rebased file.

pub mod styles;

pub use styles::{inline_stylesheets, stylesheet_url, write_bundle};
