//! Split stylesheet text into literal spans and reference tokens.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

fn reference_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    // Alternation order is the match priority: quoted url() forms before the bare one.
    Regex::new(
      r#"(?x)
        url\(\s*"(?P<url_double>[^"\n]*)"\s*\)
      | url\(\s*'(?P<url_single>[^'\n]*)'\s*\)
      | url\(\s*(?P<url_bare>[^\s"')][^\s)]*)\s*\)
      | @import\s*'(?P<import_single>[^'\n]*)'
      | @import\s*"(?P<import_double>[^"\n]*)"
      "#,
    )
    .expect("invalid stylesheet reference regex")
  })
}

/// Syntax a reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
  /// `url(...)`, including `@import url(...)`.
  Url,
  /// `@import '...'` or `@import "..."`.
  Import,
}

/// Quoting used around a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Quote {
  /// `"..."`
  Double,
  /// `'...'`
  Single,
  /// No quotes, only possible inside `url(...)`.
  Bare,
}

/// A reference found in stylesheet text together with the syntax wrapped around it.
///
/// `prefix` and `suffix` hold the exact source text on either side of the target (for example
/// `url( "` and `" )`), so replacing only the target keeps whitespace and quoting intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken<'a> {
  /// Syntax the reference appeared in.
  pub kind: TokenKind,
  /// Quoting style of the reference.
  pub quote: Quote,
  /// Source text preceding the target.
  pub prefix: &'a str,
  /// The reference itself.
  pub target: &'a str,
  /// Source text following the target.
  pub suffix: &'a str,
  /// Byte offset of the token within the source.
  pub offset: usize,
}

impl ReferenceToken<'_> {
  /// Render the token with `target` substituted for the original reference.
  pub fn render(&self, target: &str) -> String {
    format!("{}{}{}", self.prefix, target, self.suffix)
  }
}

impl fmt::Display for ReferenceToken<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}{}", self.prefix, self.target, self.suffix)
  }
}

/// Ordered piece of a parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
  /// Text copied through unchanged.
  Literal(&'a str),
  /// A rewritable reference.
  Reference(ReferenceToken<'a>),
}

impl fmt::Display for Segment<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Literal(text) => f.write_str(text),
      Self::Reference(token) => fmt::Display::fmt(token, f),
    }
  }
}

/// Scan `source` once and return its literal and reference segments in order.
///
/// Concatenating the segments reproduces `source` byte for byte. Text that only resembles a
/// token (an unterminated `url(` for instance) stays inside a literal segment.
pub fn tokenize(source: &str) -> Vec<Segment<'_>> {
  let mut segments = Vec::new();
  let mut cursor = 0;

  for captures in reference_pattern().captures_iter(source) {
    let Some(token) = reference_token(source, &captures) else {
      continue;
    };

    if token.offset > cursor {
      segments.push(Segment::Literal(&source[cursor..token.offset]));
    }
    cursor = token.offset + token.prefix.len() + token.target.len() + token.suffix.len();
    segments.push(Segment::Reference(token));
  }

  if cursor < source.len() {
    segments.push(Segment::Literal(&source[cursor..]));
  }

  segments
}

fn reference_token<'a>(source: &'a str, captures: &Captures<'a>) -> Option<ReferenceToken<'a>> {
  const GROUPS: [(&str, TokenKind, Quote); 5] = [
    ("url_double", TokenKind::Url, Quote::Double),
    ("url_single", TokenKind::Url, Quote::Single),
    ("url_bare", TokenKind::Url, Quote::Bare),
    ("import_single", TokenKind::Import, Quote::Single),
    ("import_double", TokenKind::Import, Quote::Double),
  ];

  let whole = captures.get(0)?;
  let (target, kind, quote) = GROUPS
    .iter()
    .find_map(|(name, kind, quote)| captures.name(name).map(|group| (group, *kind, *quote)))?;

  Some(ReferenceToken {
    kind,
    quote,
    prefix: &source[whole.start()..target.start()],
    target: target.as_str(),
    suffix: &source[target.end()..whole.end()],
    offset: whole.start(),
  })
}
