//! Capabilities the loader needs from the rendered document.

use std::cell::RefCell;

/// Accumulates stylesheet text that is applied to the document.
pub trait InjectionSink {
  /// Append stylesheet text.
  fn inject(&self, css: &str);

  /// Everything injected so far, in injection order.
  fn inspect(&self) -> String;
}

/// Document hosting the injected styles.
pub trait Document: InjectionSink {
  /// Current location path of the document, e.g. `/app/index.html`.
  fn pathname(&self) -> String;

  /// Hand an external stylesheet to the document's own link mechanism.
  fn append_link(&self, href: &str);
}

/// Directory the document's relative references resolve against, always ending in `/`.
pub fn document_base(pathname: &str) -> String {
  match pathname.rfind('/') {
    Some(index) => pathname[..=index].to_string(),
    None => "/".to_string(),
  }
}

/// In-memory document collecting injected styles and linked stylesheets.
#[derive(Debug, Default)]
pub struct MemoryDocument {
  pathname: RefCell<String>,
  styles: RefCell<String>,
  links: RefCell<Vec<String>>,
}

impl MemoryDocument {
  /// Create an empty document located at `pathname`.
  pub fn new(pathname: impl Into<String>) -> Self {
    Self {
      pathname: RefCell::new(pathname.into()),
      ..Self::default()
    }
  }

  /// Move the document to a new location.
  pub fn set_pathname(&self, pathname: impl Into<String>) {
    *self.pathname.borrow_mut() = pathname.into();
  }

  /// External stylesheets linked so far.
  pub fn links(&self) -> Vec<String> {
    self.links.borrow().clone()
  }
}

impl InjectionSink for MemoryDocument {
  fn inject(&self, css: &str) {
    self.styles.borrow_mut().push_str(css);
  }

  fn inspect(&self) -> String {
    self.styles.borrow().clone()
  }
}

impl Document for MemoryDocument {
  fn pathname(&self) -> String {
    self.pathname.borrow().clone()
  }

  fn append_link(&self, href: &str) {
    self.links.borrow_mut().push(href.to_string());
  }
}
