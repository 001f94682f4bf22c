use std::collections::BTreeSet;

/// Canonical ids that asked for instant completion and have not been loaded yet.
///
/// Entries are added while normalizing and removed by the first load of the same id. Each
/// loader owns its own store, so two loaders never observe each other's requests.
#[derive(Debug, Default)]
pub struct PendingInstants {
  ids: BTreeSet<String>,
}

impl PendingInstants {
  /// Record that `id` was requested in instant mode.
  pub fn insert(&mut self, id: impl Into<String>) {
    self.ids.insert(id.into());
  }

  /// Read and forget the instant flag for `id`.
  pub fn take(&mut self, id: &str) -> bool {
    self.ids.remove(id)
  }

  /// Forget `id` without loading it, for requests the host abandoned.
  pub fn discard(&mut self, id: &str) {
    self.ids.remove(id);
  }

  /// Number of ids still waiting for their load.
  pub fn len(&self) -> usize {
    self.ids.len()
  }

  /// Returns true when no ids are waiting.
  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }
}
