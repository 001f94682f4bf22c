//! Stylesheet reference rewriting.
//!
//! A stylesheet is parsed once into literal text and reference tokens. Rebasing maps every
//! token through [`convert_base`](crate::uri::convert_base) and stitches the pieces back
//! together, so literal text is never touched and no scan offsets need adjusting.

mod tokens;

use std::fmt;

pub use tokens::{Quote, ReferenceToken, Segment, TokenKind, tokenize};

use crate::uri::convert_base;

/// Parsed view over stylesheet text.
#[derive(Debug, Clone)]
pub struct Stylesheet<'a> {
  segments: Vec<Segment<'a>>,
}

impl<'a> Stylesheet<'a> {
  /// Split `source` into segments.
  pub fn parse(source: &'a str) -> Self {
    Self {
      segments: tokenize(source),
    }
  }

  /// Reference tokens in source order.
  pub fn references(&self) -> impl Iterator<Item = &ReferenceToken<'a>> {
    self.segments.iter().filter_map(|segment| match segment {
      Segment::Reference(token) => Some(token),
      Segment::Literal(_) => None,
    })
  }

  /// Reassemble the stylesheet, replacing every reference target with the output of `map`.
  pub fn render_with<F>(&self, mut map: F) -> String
  where
    F: FnMut(&ReferenceToken<'a>) -> String,
  {
    let mut output = String::new();
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => output.push_str(text),
        Segment::Reference(token) => output.push_str(&token.render(&map(token))),
      }
    }
    output
  }

  /// Reassemble the stylesheet with every reference moved from `from` to `to`.
  pub fn rebase(&self, from: &str, to: &str) -> String {
    self.render_with(|token| convert_base(token.target, from, to))
  }
}

impl fmt::Display for Stylesheet<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for segment in &self.segments {
      fmt::Display::fmt(segment, f)?;
    }
    Ok(())
  }
}

/// Rewrite every `url(...)` and `@import` reference in `source` from base `from` to base `to`.
pub fn rewrite(source: &str, from: &str, to: &str) -> String {
  let stylesheet = Stylesheet::parse(source);
  tracing::trace!(
    from,
    to,
    references = stylesheet.references().count(),
    "rebasing stylesheet"
  );
  stylesheet.rebase(from, to)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn resolves_one_level_of_backtracking() {
    assert_eq!(
      rewrite("a{background:url('../img/x.png')}", "/css/sub/", "/css/"),
      "a{background:url('img/x.png')}"
    );
  }

  #[test]
  fn leaves_external_imports_untouched() {
    let source = "@import 'http://cdn.example/x.css';";
    assert_eq!(rewrite(source, "/css/sub/", "/"), source);
    assert_eq!(rewrite(source, "/", "/deep/nested/page.html"), source);
  }

  #[test]
  fn preserves_quoting_of_absolute_references() {
    let source = r#"a{b:url("/img/a.png")} c{d:url(data:image/png;base64,AAAA)}"#;
    assert_eq!(rewrite(source, "/css/", "/other/"), source);
  }

  #[test]
  fn rewrites_tokens_of_different_lengths_independently() {
    let source = "a{b:url(x.p)} /* keep */ c{d:url('very/long/relative/path/x.png')} e{}";
    assert_eq!(
      rewrite(source, "/css/", "/"),
      "a{b:url(css/x.p)} /* keep */ c{d:url('css/very/long/relative/path/x.png')} e{}"
    );
  }

  #[test]
  fn rewrites_imports_and_urls_in_one_pass() {
    let source = "@import \"base.css\";\n@import url(theme/dark.css);\nbody{background:url( 'bg.png' )}\n";
    assert_eq!(
      rewrite(source, "/static/css/site.css", "/static/"),
      "@import \"css/base.css\";\n@import url(css/theme/dark.css);\nbody{background:url( 'css/bg.png' )}\n"
    );
  }

  #[test]
  fn same_base_returns_identical_text() {
    let source = "a{b:url('../fonts/a.woff')} @import 'reset.css'; i{c:url(./a/../i.png)}";
    assert_eq!(rewrite(source, "/css/sub/x.css", "/css/sub/x.css"), source);
  }

  #[test]
  fn display_reproduces_source() {
    let source = "a{b:url(x.png)} @import 'y.css';";
    assert_eq!(Stylesheet::parse(source).to_string(), source);
  }

  #[test]
  fn lists_references_in_source_order() {
    let stylesheet = Stylesheet::parse("@import 'a.css'; x{y:url(\"b.png\")}");
    let targets: Vec<_> = stylesheet.references().map(|token| token.target).collect();
    assert_eq!(targets, vec!["a.css", "b.png"]);
  }
}
