//! Serializable records printed by the command-line front end.

use serde::Serialize;

use crate::stylesheet::{Quote, ReferenceToken, TokenKind};
use crate::uri::is_absolute_reference;

/// A reference found in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
  /// Syntax the reference appeared in.
  pub kind: TokenKind,
  /// Quoting around the reference.
  pub quote: Quote,
  /// The reference text.
  pub target: String,
  /// Byte offset of the token in the stylesheet.
  pub offset: usize,
  /// Whether rebasing leaves the reference unchanged.
  pub absolute: bool,
}

impl From<&ReferenceToken<'_>> for ReferenceRecord {
  fn from(token: &ReferenceToken<'_>) -> Self {
    Self {
      kind: token.kind,
      quote: token.quote,
      target: token.target.to_string(),
      offset: token.offset,
      absolute: is_absolute_reference(token.target),
    }
  }
}

/// Final state of one requested stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
  /// Name as requested, modifiers included.
  pub name: String,
  /// Canonical id the name normalized to.
  pub id: String,
  /// Whether completion was requested up front.
  pub instant: bool,
  /// Whether the success callback fired.
  pub loaded: bool,
  /// Error reported for the request, if any.
  pub error: Option<String>,
}

/// Outcome of running a batch of stylesheet requests against a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
  /// Location path of the document.
  pub document_path: String,
  /// One record per requested name, in request order.
  pub requests: Vec<RequestRecord>,
  /// External stylesheets handed to the document's link mechanism.
  pub links: Vec<String>,
  /// Injected stylesheet text, in fetch completion order.
  pub injected: String,
}

impl LoadReport {
  /// Whether any request reported an error.
  pub fn has_errors(&self) -> bool {
    self.requests.iter().any(|request| request.error.is_some())
  }
}
