/// Suffix modifiers carried by a requested stylesheet name.
///
/// The grammar is `<name>['!'][.css]`, read right to left: a trailing `!` requests instant
/// completion, then an explicit `.css` extension is dropped so that `site`, `site.css` and
/// `site.css!` all resolve to the same canonical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceName<'a> {
  name: &'a str,
  instant: bool,
}

impl<'a> ResourceName<'a> {
  /// Split the modifiers off a requested name.
  pub fn parse(requested: &'a str) -> Self {
    let (name, instant) = match requested.strip_suffix('!') {
      Some(stripped) => (stripped, true),
      None => (requested, false),
    };
    let name = name.strip_suffix(".css").unwrap_or(name);

    Self { name, instant }
  }

  /// Name handed to the host for id resolution.
  pub fn name(&self) -> &'a str {
    self.name
  }

  /// Whether completion should be signalled without waiting for the stylesheet.
  pub fn is_instant(&self) -> bool {
    self.instant
  }
}
