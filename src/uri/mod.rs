//! Path algebra for moving stylesheet references between base locations.
//!
//! A base is a slash-delimited location whose last segment names a file and is ignored, so
//! `/css/site.css` and `/css/` describe the same directory. The functions here are pure string
//! manipulation; nothing touches the filesystem or the network.

mod filters;
mod resolve;

pub use filters::{is_absolute_reference, is_external_url};
pub use resolve::{to_absolute, to_relative};

/// Rewrite `reference` so it points at the same resource when read from `to` instead of `from`.
///
/// Absolute references and empty references are returned unchanged, and so is every
/// reference when both bases name the same directory.
pub fn convert_base(reference: &str, from: &str, to: &str) -> String {
    if reference.is_empty()
        || is_absolute_reference(reference)
        || directory(from) == directory(to)
    {
        return reference.to_string();
    }

    to_relative(&to_absolute(reference, from), to)
}

fn directory(base: &str) -> &str {
    match base.rfind('/') {
        Some(index) => &base[..=index],
        None => "",
    }
}
